//! Table schema types. Pure data; the host engine's metadata is mapped into these.
//!
//! Column types can be parsed from Hive-style type strings (`int`,
//! `decimal(10,2)`, `array<struct<a:int,b:string>>`), which is how the host
//! hands them over in the `columns.types` option.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::DocType;
use crate::error::{ConfigError, ConfigErrors, Error, Result};

/// Largest decimal precision the table model supports.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: u8, scale: u8 },
    String,
    Char(u32),
    Varchar(u32),
    Binary,
    Date,
    Timestamp,
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Struct(Vec<Field>),
}

impl DataType {
    /// The single document type this table type serializes to absent an override.
    pub fn canonical_doc_type(&self) -> DocType {
        match self {
            DataType::Boolean => DocType::Bool,
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
                DocType::Int
            }
            DataType::Float | DataType::Double => DocType::Float,
            DataType::Decimal { .. } => DocType::Decimal,
            DataType::String | DataType::Char(_) | DataType::Varchar(_) => DocType::String,
            DataType::Binary => DocType::Blob,
            DataType::Date | DataType::Timestamp => DocType::Timestamp,
            DataType::Array(_) => DocType::List,
            DataType::Map(_, _) | DataType::Struct(_) => DocType::Struct,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt
        )
    }

    /// Inclusive value range for integer types.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        match self {
            DataType::TinyInt => Some((i8::MIN as i128, i8::MAX as i128)),
            DataType::SmallInt => Some((i16::MIN as i128, i16::MAX as i128)),
            DataType::Int => Some((i32::MIN as i128, i32::MAX as i128)),
            DataType::BigInt => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => None,
        }
    }

    /// Split a type list on `:` or `,` at nesting depth zero, without parsing.
    pub fn split_list(s: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut depth = 0i32;
        let mut start = 0usize;
        for (i, c) in s.char_indices() {
            match c {
                '<' | '(' => depth += 1,
                '>' | ')' => depth -= 1,
                ':' | ',' if depth == 0 => {
                    out.push(s[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            }
        }
        let tail = s[start..].trim();
        if !tail.is_empty() || !out.is_empty() {
            out.push(tail);
        }
        out
    }

    /// Parse a list of types separated by `:` or `,` at nesting depth zero.
    pub fn parse_list(s: &str) -> std::result::Result<Vec<DataType>, String> {
        Self::split_list(s).into_iter().map(str::parse).collect()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "boolean"),
            DataType::TinyInt => write!(f, "tinyint"),
            DataType::SmallInt => write!(f, "smallint"),
            DataType::Int => write!(f, "int"),
            DataType::BigInt => write!(f, "bigint"),
            DataType::Float => write!(f, "float"),
            DataType::Double => write!(f, "double"),
            DataType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            DataType::String => write!(f, "string"),
            DataType::Char(n) => write!(f, "char({})", n),
            DataType::Varchar(n) => write!(f, "varchar({})", n),
            DataType::Binary => write!(f, "binary"),
            DataType::Date => write!(f, "date"),
            DataType::Timestamp => write!(f, "timestamp"),
            DataType::Array(elem) => write!(f, "array<{}>", elem),
            DataType::Map(k, v) => write!(f, "map<{},{}>", k, v),
            DataType::Struct(fields) => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", field.name, field.data_type)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parser = TypeParser {
            src: s.as_bytes(),
            pos: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.src.len() {
            return Err(format!("trailing input at offset {}", parser.pos));
        }
        Ok(ty)
    }
}

/// Recursive-descent parser over Hive type strings.
struct TypeParser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> std::result::Result<String, String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_alphanumeric() || self.src[self.pos] == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("expected identifier at offset {}", start));
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn eat(&mut self, c: u8) -> bool {
        self.skip_ws();
        if self.src.get(self.pos) == Some(&c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> std::result::Result<(), String> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(format!("expected '{}' at offset {}", c as char, self.pos))
        }
    }

    fn number(&mut self) -> std::result::Result<u32, String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| format!("expected number at offset {}", start))
    }

    fn parse_type(&mut self) -> std::result::Result<DataType, String> {
        let name = self.ident()?.to_ascii_lowercase();
        let ty = match name.as_str() {
            "boolean" => DataType::Boolean,
            "tinyint" => DataType::TinyInt,
            "smallint" => DataType::SmallInt,
            "int" | "integer" => DataType::Int,
            "bigint" => DataType::BigInt,
            "float" => DataType::Float,
            "double" => DataType::Double,
            "string" => DataType::String,
            "binary" => DataType::Binary,
            "date" => DataType::Date,
            "timestamp" => DataType::Timestamp,
            "decimal" | "numeric" => {
                let (mut precision, mut scale) = (10u32, 0u32);
                if self.eat(b'(') {
                    precision = self.number()?;
                    if self.eat(b',') {
                        scale = self.number()?;
                    }
                    self.expect(b')')?;
                }
                if precision == 0 || precision > MAX_DECIMAL_PRECISION as u32 {
                    return Err(format!(
                        "decimal precision {} outside 1..={}",
                        precision, MAX_DECIMAL_PRECISION
                    ));
                }
                if scale > precision {
                    return Err(format!(
                        "decimal scale {} exceeds precision {}",
                        scale, precision
                    ));
                }
                DataType::Decimal {
                    precision: precision as u8,
                    scale: scale as u8,
                }
            }
            "char" | "varchar" => {
                self.expect(b'(')?;
                let len = self.number()?;
                self.expect(b')')?;
                if len == 0 {
                    return Err(format!("{} length must be positive", name));
                }
                if name == "char" {
                    DataType::Char(len)
                } else {
                    DataType::Varchar(len)
                }
            }
            "array" => {
                self.expect(b'<')?;
                let elem = self.parse_type()?;
                self.expect(b'>')?;
                DataType::Array(Box::new(elem))
            }
            "map" => {
                self.expect(b'<')?;
                let key = self.parse_type()?;
                self.expect(b',')?;
                let value = self.parse_type()?;
                self.expect(b'>')?;
                DataType::Map(Box::new(key), Box::new(value))
            }
            "struct" => {
                self.expect(b'<')?;
                let mut fields = Vec::new();
                if !self.eat(b'>') {
                    loop {
                        let field_name = self.ident()?;
                        self.expect(b':')?;
                        let data_type = self.parse_type()?;
                        fields.push(Field::new(field_name, data_type, true));
                        if self.eat(b'>') {
                            break;
                        }
                        self.expect(b',')?;
                    }
                }
                DataType::Struct(fields)
            }
            other => return Err(format!("unknown type '{}'", other)),
        };
        Ok(ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Ordered column list. Order defines the row-buffer layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from parallel name/type lists, rejecting arity mismatches
    /// and duplicate names.
    pub fn from_columns(names: &[String], types: &[DataType]) -> Result<Self> {
        let mut errors = Vec::new();
        if names.len() != types.len() {
            errors.push(ConfigError::SchemaArity {
                names: names.len(),
                types: types.len(),
            });
        }
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                errors.push(ConfigError::DuplicateColumn(name.clone()));
            }
        }
        if !errors.is_empty() {
            return Err(Error::Config(ConfigErrors(errors)));
        }
        Ok(Self::new(
            names
                .iter()
                .zip(types)
                .map(|(n, t)| Field::new(n.clone(), t.clone(), true))
                .collect(),
        ))
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
