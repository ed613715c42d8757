use std::collections::HashMap;

use docserde_core::config::ConfigurationSource;
use docserde_core::error::ConfigError;
use docserde_core::schema::Schema;
use docserde_path::PathSpec;
use serde::Serialize;

use super::{column_options, resolve_bool};
use crate::keys;

/// Path each column reads from (and, when invertible, writes to).
///
/// A column without `ion.<column>.path_extractor` reads the top-level field
/// named after it. When `ion.path_extractor.allow_aliasing=false`, two columns
/// bound to structurally identical paths are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathBindingPolicy {
    paths: Vec<PathSpec>,
    explicit: Vec<bool>,
    case_sensitive: bool,
    allow_aliasing: bool,
}

impl PathBindingPolicy {
    pub fn resolve(
        source: &dyn ConfigurationSource,
        schema: &Schema,
        errors: &mut Vec<ConfigError>,
    ) -> Self {
        let case_sensitive = resolve_bool(source, keys::PATH_CASE_SENSITIVE, false, errors);
        let allow_aliasing = resolve_bool(source, keys::PATH_ALLOW_ALIASING, true, errors);

        let mut paths: Vec<PathSpec> = schema
            .names()
            .map(PathSpec::field)
            .collect();
        let mut explicit = vec![false; schema.len()];

        for (idx, _key, raw) in column_options(source, schema, keys::PATH_EXTRACTOR_SUFFIX, errors)
        {
            match PathSpec::parse(raw) {
                Ok(path) if explicit[idx] && path != paths[idx] => {
                    errors.push(ConfigError::ConflictingOverride {
                        column: schema.fields[idx].name.clone(),
                        option: keys::PATH_EXTRACTOR_SUFFIX.to_string(),
                        first: paths[idx].to_string(),
                        second: path.to_string(),
                    });
                }
                Ok(path) => {
                    paths[idx] = path;
                    explicit[idx] = true;
                }
                Err(e) => errors.push(ConfigError::MalformedPath {
                    column: schema.fields[idx].name.clone(),
                    path: raw.to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        if !allow_aliasing {
            let mut seen: HashMap<PathSpec, usize> = HashMap::new();
            for (idx, path) in paths.iter().enumerate() {
                let key = path.normalized(case_sensitive);
                match seen.get(&key).copied() {
                    Some(first) => errors.push(ConfigError::DuplicatePath {
                        first: schema.fields[first].name.clone(),
                        second: schema.fields[idx].name.clone(),
                        path: path.to_string(),
                    }),
                    None => {
                        seen.insert(key, idx);
                    }
                }
            }
        }

        Self {
            paths,
            explicit,
            case_sensitive,
            allow_aliasing,
        }
    }

    /// # Panics
    ///
    /// If `index` is not a declared column.
    pub fn path_for(&self, index: usize) -> &PathSpec {
        &self.paths[index]
    }

    /// Whether the column's path came from an explicit option.
    pub fn is_explicit(&self, index: usize) -> bool {
        self.explicit[index]
    }

    pub fn paths(&self) -> &[PathSpec] {
        &self.paths
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn allow_aliasing(&self) -> bool {
        self.allow_aliasing
    }
}
