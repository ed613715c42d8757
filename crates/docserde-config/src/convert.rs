//! Value coercion between the document and table models.
//!
//! A `Conversion` is scoped to one column: it carries the column name (for
//! labeled errors), the column's overflow policy, and the timestamp offset.
//! Nested values inherit all three.
//!
//! Under a relaxed overflow policy: integers wrap like a narrowing cast,
//! floats cast, strings truncate to the declared length, decimals round to the
//! declared scale and become null when the integral digits do not fit.

use std::fmt::Display;

use docserde_core::document::{DocType, DocValue};
use docserde_core::error::{Error, Result};
use docserde_core::schema::{DataType, Field};
use docserde_core::types::{Decimal, Scalar};

use docserde_path::field_names_eq;

use crate::policy::{NullStrategy, TimestampOffset};

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy)]
pub struct Conversion<'a> {
    pub column: &'a str,
    pub fail_on_overflow: bool,
    pub timestamp_offset: TimestampOffset,
}

impl<'a> Conversion<'a> {
    pub fn new(column: &'a str, fail_on_overflow: bool, timestamp_offset: TimestampOffset) -> Self {
        Self {
            column,
            fail_on_overflow,
            timestamp_offset,
        }
    }

    fn overflow(&self, value: impl Display, target: &DataType) -> Error {
        Error::Overflow {
            column: self.column.to_string(),
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    fn mismatch(&self, expected: &DataType, found: impl Display) -> Error {
        Error::StructuralMismatch {
            column: self.column.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    // ---- document -> table ----

    /// Coerce a matched document value into the declared column type.
    pub fn read(&self, value: &DocValue, ty: &DataType) -> Result<Scalar> {
        if value.is_null() {
            return Ok(Scalar::Null);
        }
        let mismatch = || self.mismatch(ty, value.doc_type());
        match ty {
            DataType::Boolean => match value {
                DocValue::Bool(b) => Ok(Scalar::Bool(*b)),
                _ => Err(mismatch()),
            },
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
                match value {
                    DocValue::Int(i) => self.fit_integer(*i, ty),
                    _ => Err(mismatch()),
                }
            }
            DataType::Float | DataType::Double => {
                let v = match value {
                    DocValue::Float(f) => *f,
                    DocValue::Int(i) => *i as f64,
                    DocValue::Decimal(d) => {
                        let f = d.to_f64();
                        if f.is_infinite() && self.fail_on_overflow {
                            return Err(self.overflow(d, ty));
                        }
                        f
                    }
                    _ => return Err(mismatch()),
                };
                self.fit_float(v, ty)
            }
            DataType::Decimal { precision, scale } => {
                let d = match value {
                    DocValue::Decimal(d) => *d,
                    DocValue::Int(i) => Decimal::from_int(*i),
                    _ => return Err(mismatch()),
                };
                Ok(self
                    .fit_decimal(d, *precision, *scale, ty)?
                    .map(Scalar::Decimal)
                    .unwrap_or(Scalar::Null))
            }
            DataType::String | DataType::Char(_) | DataType::Varchar(_) => match value {
                DocValue::String(s) | DocValue::Symbol(s) => Ok(Scalar::Str(self.fit_text(s, ty)?)),
                _ => Err(mismatch()),
            },
            DataType::Binary => match value {
                DocValue::Blob(b) | DocValue::Clob(b) => Ok(Scalar::Bin(b.clone())),
                _ => Err(mismatch()),
            },
            DataType::Timestamp => match value {
                DocValue::Timestamp(ts) => Ok(Scalar::Timestamp(self.timestamp_offset.normalize(*ts))),
                _ => Err(mismatch()),
            },
            DataType::Date => match value {
                DocValue::Timestamp(ts) => {
                    let local = match ts.offset_minutes {
                        Some(off) => ts.epoch_millis.saturating_add(off as i64 * 60_000),
                        None => ts.epoch_millis,
                    };
                    let days = local.div_euclid(MILLIS_PER_DAY);
                    match i32::try_from(days) {
                        Ok(d) => Ok(Scalar::Date(d)),
                        Err(_) if self.fail_on_overflow => Err(self.overflow(days, ty)),
                        Err(_) => Ok(Scalar::Date(if days < 0 { i32::MIN } else { i32::MAX })),
                    }
                }
                _ => Err(mismatch()),
            },
            DataType::Array(elem) => match value {
                DocValue::List(items) | DocValue::Sexp(items) => Ok(Scalar::List(
                    items
                        .iter()
                        .map(|v| self.read(v, elem))
                        .collect::<Result<_>>()?,
                )),
                _ => Err(mismatch()),
            },
            DataType::Map(key_ty, value_ty) => match value {
                DocValue::Struct(fields) => Ok(Scalar::Map(
                    fields
                        .iter()
                        .map(|(k, v)| {
                            Ok((self.read_map_key(k, key_ty)?, self.read(v, value_ty)?))
                        })
                        .collect::<Result<_>>()?,
                )),
                _ => Err(mismatch()),
            },
            DataType::Struct(decl) => match value {
                DocValue::Struct(fields) => Ok(Scalar::Struct(
                    decl.iter()
                        .map(|f| match find_field(fields, &f.name) {
                            Some(v) => self.read(v, &f.data_type),
                            None => Ok(Scalar::Null),
                        })
                        .collect::<Result<_>>()?,
                )),
                _ => Err(mismatch()),
            },
        }
    }

    /// Struct field names are text; integer key types parse them back, which
    /// inverts `map_key` on write.
    fn read_map_key(&self, name: &str, key_ty: &DataType) -> Result<Scalar> {
        match key_ty {
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
                match name.parse::<i128>() {
                    Ok(i) => self.fit_integer(i, key_ty),
                    Err(_) => Err(self.mismatch(key_ty, format!("field name '{}'", name))),
                }
            }
            DataType::String | DataType::Char(_) | DataType::Varchar(_) => {
                Ok(Scalar::Str(self.fit_text(name, key_ty)?))
            }
            other => Err(self.mismatch(other, format!("field name '{}'", name))),
        }
    }

    fn fit_integer(&self, v: i128, ty: &DataType) -> Result<Scalar> {
        if let Some((lo, hi)) = ty.integer_range() {
            if (v < lo || v > hi) && self.fail_on_overflow {
                return Err(self.overflow(v, ty));
            }
        }
        Ok(match ty {
            DataType::TinyInt => Scalar::I8(v as i8),
            DataType::SmallInt => Scalar::I16(v as i16),
            DataType::Int => Scalar::I32(v as i32),
            _ => Scalar::I64(v as i64),
        })
    }

    fn fit_float(&self, v: f64, ty: &DataType) -> Result<Scalar> {
        match ty {
            DataType::Float => {
                if v.is_finite() && v.abs() > f32::MAX as f64 && self.fail_on_overflow {
                    return Err(self.overflow(v, ty));
                }
                Ok(Scalar::F32(v as f32))
            }
            _ => Ok(Scalar::F64(v)),
        }
    }

    /// `Ok(None)` is the relaxed outcome for a value whose integral part does
    /// not fit the precision.
    fn fit_decimal(&self, d: Decimal, precision: u8, scale: u8, ty: &DataType) -> Result<Option<Decimal>> {
        let scale = scale as i32;
        let rescaled = match d.rescale_exact(scale) {
            Some(exact) => exact,
            None if self.fail_on_overflow => return Err(self.overflow(d, ty)),
            None => d.rescale_rounding(scale),
        };
        if rescaled.digits() > precision as u32 && rescaled.coefficient != 0 {
            if self.fail_on_overflow {
                return Err(self.overflow(d, ty));
            }
            return Ok(None);
        }
        Ok(Some(rescaled))
    }

    fn fit_text(&self, s: &str, ty: &DataType) -> Result<String> {
        let limit = match ty {
            DataType::Char(n) | DataType::Varchar(n) => *n as usize,
            _ => return Ok(s.to_string()),
        };
        if s.chars().count() <= limit {
            return Ok(s.to_string());
        }
        if self.fail_on_overflow {
            return Err(self.overflow(format!("'{}'", s), ty));
        }
        Ok(s.chars().take(limit).collect())
    }

    // ---- table -> document ----

    /// Serialize a table value as `target` (the column's serialization type at
    /// the top level, the canonical mapping below it). `Ok(None)` means the
    /// value is a null the strategy omits.
    pub fn write(
        &self,
        value: &Scalar,
        ty: &DataType,
        target: DocType,
        nulls: NullStrategy,
    ) -> Result<Option<DocValue>> {
        if value.is_null() {
            return Ok(nulls.null_value(target));
        }
        let mismatch = || self.mismatch(ty, value.kind());
        let out = match ty {
            DataType::Boolean => match value {
                Scalar::Bool(b) => DocValue::Bool(*b),
                _ => return Err(mismatch()),
            },
            DataType::TinyInt | DataType::SmallInt | DataType::Int | DataType::BigInt => {
                let v = value.as_integer().ok_or_else(mismatch)?;
                match self.fit_integer(v, ty)?.as_integer() {
                    Some(fitted) => DocValue::Int(fitted),
                    None => return Err(mismatch()),
                }
            }
            DataType::Float | DataType::Double => {
                let v = match value {
                    Scalar::F32(f) => *f as f64,
                    Scalar::F64(f) => *f,
                    other => other.as_integer().ok_or_else(mismatch)? as f64,
                };
                match self.fit_float(v, ty)? {
                    Scalar::F32(f) => DocValue::Float(f as f64),
                    _ => DocValue::Float(v),
                }
            }
            DataType::Decimal { precision, scale } => {
                let d = match value {
                    Scalar::Decimal(d) => *d,
                    other => Decimal::from_int(other.as_integer().ok_or_else(mismatch)?),
                };
                match self.fit_decimal(d, *precision, *scale, ty)? {
                    Some(fitted) => DocValue::Decimal(fitted),
                    None => return Ok(nulls.null_value(target)),
                }
            }
            DataType::String | DataType::Char(_) | DataType::Varchar(_) => match value {
                Scalar::Str(s) => {
                    let s = self.fit_text(s, ty)?;
                    if target == DocType::Symbol {
                        DocValue::Symbol(s)
                    } else {
                        DocValue::String(s)
                    }
                }
                _ => return Err(mismatch()),
            },
            DataType::Binary => match value {
                Scalar::Bin(b) => {
                    if target == DocType::Clob {
                        DocValue::Clob(b.clone())
                    } else {
                        DocValue::Blob(b.clone())
                    }
                }
                _ => return Err(mismatch()),
            },
            DataType::Timestamp => match value {
                Scalar::Timestamp(ms) => DocValue::Timestamp(self.timestamp_offset.attach(*ms)),
                _ => return Err(mismatch()),
            },
            DataType::Date => match value {
                Scalar::Date(days) => DocValue::Timestamp(docserde_core::document::Timestamp::new(
                    *days as i64 * MILLIS_PER_DAY,
                    None,
                )),
                _ => return Err(mismatch()),
            },
            DataType::Array(elem) => match value {
                Scalar::List(items) => {
                    let elem_target = elem.canonical_doc_type();
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(
                            self.write(item, elem, elem_target, nulls)?
                                .unwrap_or_else(DocValue::untyped_null),
                        );
                    }
                    if target == DocType::Sexp {
                        DocValue::Sexp(out)
                    } else {
                        DocValue::List(out)
                    }
                }
                _ => return Err(mismatch()),
            },
            DataType::Map(key_ty, value_ty) => match value {
                Scalar::Map(pairs) => {
                    let mut fields = Vec::with_capacity(pairs.len());
                    for (k, v) in pairs {
                        let name = map_key(k).ok_or_else(|| self.mismatch(key_ty, k.kind()))?;
                        if let Some(doc) =
                            self.write(v, value_ty, value_ty.canonical_doc_type(), nulls)?
                        {
                            fields.push((name, doc));
                        }
                    }
                    DocValue::Struct(fields)
                }
                _ => return Err(mismatch()),
            },
            DataType::Struct(decl) => match value {
                Scalar::Struct(values) if values.len() == decl.len() => {
                    DocValue::Struct(self.write_struct_fields(decl, values, nulls)?)
                }
                _ => return Err(mismatch()),
            },
        };
        Ok(Some(out))
    }

    fn write_struct_fields(
        &self,
        decl: &[Field],
        values: &[Scalar],
        nulls: NullStrategy,
    ) -> Result<Vec<(String, DocValue)>> {
        let mut fields = Vec::with_capacity(decl.len());
        for (f, v) in decl.iter().zip(values) {
            if let Some(doc) = self.write(v, &f.data_type, f.data_type.canonical_doc_type(), nulls)? {
                fields.push((f.name.clone(), doc));
            }
        }
        Ok(fields)
    }
}

/// Struct fields are matched case-insensitively, preferring an exact match.
fn find_field<'v>(fields: &'v [(String, DocValue)], name: &str) -> Option<&'v DocValue> {
    fields
        .iter()
        .find(|(n, _)| n == name)
        .or_else(|| fields.iter().find(|(n, _)| field_names_eq(n, name, false)))
        .map(|(_, v)| v)
}

fn map_key(k: &Scalar) -> Option<String> {
    match k {
        Scalar::Str(s) => Some(s.clone()),
        other => other.as_integer().map(|i| i.to_string()),
    }
}
