//! Table-side values and row containers.
//!
//! `Scalar` is the value of one column in one row as the host engine sees it.
//! `Decimal` is shared with the document model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Exact decimal: `coefficient * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    pub coefficient: i128,
    pub scale: i32,
}

impl Decimal {
    pub fn new(coefficient: i128, scale: i32) -> Self {
        Self { coefficient, scale }
    }

    pub fn from_int(v: i128) -> Self {
        Self::new(v, 0)
    }

    /// Number of decimal digits in the coefficient (zero has one digit).
    pub fn digits(&self) -> u32 {
        let mut n = self.coefficient.unsigned_abs();
        let mut d = 1;
        while n >= 10 {
            n /= 10;
            d += 1;
        }
        d
    }

    /// Digits left of the decimal point, ignoring leading zeros.
    pub fn integral_digits(&self) -> u32 {
        let intpart = self.rescale_truncating(0).coefficient;
        if intpart == 0 {
            0
        } else {
            Decimal::from_int(intpart).digits()
        }
    }

    /// Rescale exactly, returning `None` when digits would be dropped or the
    /// coefficient (or the scale difference) would not fit.
    pub fn rescale_exact(&self, scale: i32) -> Option<Decimal> {
        if self.coefficient == 0 {
            return Some(Decimal::new(0, scale));
        }
        if scale >= self.scale {
            let factor = pow10(scale.checked_sub(self.scale)?)?;
            self.coefficient
                .checked_mul(factor)
                .map(|c| Decimal::new(c, scale))
        } else {
            let factor = pow10(self.scale.checked_sub(scale)?)?;
            if self.coefficient % factor != 0 {
                return None;
            }
            Some(Decimal::new(self.coefficient / factor, scale))
        }
    }

    /// Rescale rounding half away from zero. Saturates on coefficient overflow.
    pub fn rescale_rounding(&self, scale: i32) -> Decimal {
        if scale >= self.scale {
            return self.rescale_exact(scale).unwrap_or(Decimal::new(
                if self.coefficient < 0 { i128::MIN } else { i128::MAX },
                scale,
            ));
        }
        // A divisor beyond i128 exceeds twice any coefficient: rounds to zero.
        let Some(factor) = self.scale.checked_sub(scale).and_then(pow10) else {
            return Decimal::new(0, scale);
        };
        let q = self.coefficient / factor;
        let r = self.coefficient % factor;
        let bump = if r.unsigned_abs() * 2 >= factor.unsigned_abs() {
            self.coefficient.signum()
        } else {
            0
        };
        Decimal::new(q + bump, scale)
    }

    fn rescale_truncating(&self, scale: i32) -> Decimal {
        if scale >= self.scale {
            return self.rescale_exact(scale).unwrap_or(Decimal::new(
                if self.coefficient < 0 { i128::MIN } else { i128::MAX },
                scale,
            ));
        }
        match self.scale.checked_sub(scale).and_then(pow10) {
            Some(factor) => Decimal::new(self.coefficient / factor, scale),
            None => Decimal::new(0, scale),
        }
    }

    /// Nearest `f64`; infinite when the magnitude exceeds the `f64` range.
    pub fn to_f64(&self) -> f64 {
        if self.coefficient == 0 {
            return 0.0;
        }
        let c = self.coefficient as f64;
        if self.scale > 0 {
            c / 10f64.powi(self.scale)
        } else {
            c * 10f64.powi(self.scale.saturating_neg())
        }
    }

    /// Integer value if the decimal has no fractional part.
    pub fn to_integer(&self) -> Option<i128> {
        self.rescale_exact(0).map(|d| d.coefficient)
    }
}

fn pow10(exp: i32) -> Option<i128> {
    if exp < 0 {
        return None;
    }
    10i128.checked_pow(exp as u32)
}

/// Plain notation pads at most this many zeros; beyond it Display switches
/// to `<coefficient>e<exponent>`.
const MAX_PLAIN_ZEROS: i64 = 38;

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient == 0 {
            return write!(f, "0");
        }
        let digits = self.coefficient.unsigned_abs().to_string();
        let scale = self.scale as i64;
        let padding = if scale <= 0 {
            -scale
        } else {
            scale - digits.len() as i64
        };
        if padding > MAX_PLAIN_ZEROS {
            return write!(f, "{}e{}", self.coefficient, -scale);
        }
        if scale <= 0 {
            return write!(f, "{}{}", self.coefficient, "0".repeat(padding as usize));
        }
        let scale = scale as usize;
        let sign = if self.coefficient < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int, frac)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl FromStr for Decimal {
    type Err = String;

    /// Accepts `[-+]digits[.digits][(e|d)[-+]digits]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (mantissa, exponent) = match s.find(|c| matches!(c, 'e' | 'E' | 'd' | 'D')) {
            Some(pos) => {
                let exp: i32 = s[pos + 1..]
                    .parse()
                    .map_err(|_| format!("invalid exponent in '{}'", s))?;
                (&s[..pos], exp)
            }
            None => (s, 0),
        };
        let (negative, body) = match mantissa.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
        };
        let (int, frac) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int.is_empty() && frac.is_empty() {
            return Err(format!("invalid decimal '{}'", s));
        }
        if !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(format!("invalid decimal '{}'", s));
        }
        let joined = format!("{}{}", int, frac);
        let mut coefficient: i128 = if joined.is_empty() {
            0
        } else {
            joined
                .parse()
                .map_err(|_| format!("decimal '{}' exceeds 38 digits", s))?
        };
        if negative {
            coefficient = -coefficient;
        }
        let scale = i32::try_from(frac.len())
            .ok()
            .and_then(|f| f.checked_sub(exponent))
            .ok_or_else(|| format!("exponent out of range in '{}'", s))?;
        Ok(Decimal::new(coefficient, scale))
    }
}

/// Value of one column in one row, as the host engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Str(String),
    Bin(Vec<u8>),
    /// Days since the Unix epoch.
    Date(i32),
    /// Milliseconds since the Unix epoch, UTC.
    Timestamp(i64),
    List(Vec<Scalar>),
    Map(Vec<(Scalar, Scalar)>),
    /// Field values in the declared struct order.
    Struct(Vec<Scalar>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Short kind name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::I8(_) => "i8",
            Scalar::I16(_) => "i16",
            Scalar::I32(_) => "i32",
            Scalar::I64(_) => "i64",
            Scalar::F32(_) => "f32",
            Scalar::F64(_) => "f64",
            Scalar::Decimal(_) => "decimal",
            Scalar::Str(_) => "string",
            Scalar::Bin(_) => "binary",
            Scalar::Date(_) => "date",
            Scalar::Timestamp(_) => "timestamp",
            Scalar::List(_) => "list",
            Scalar::Map(_) => "map",
            Scalar::Struct(_) => "struct",
        }
    }

    /// Integer value for any integer-typed scalar.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Scalar::I8(v) => Some(*v as i128),
            Scalar::I16(v) => Some(*v as i128),
            Scalar::I32(v) => Some(*v as i128),
            Scalar::I64(v) => Some(*v as i128),
            _ => None,
        }
    }
}

/// One materialized row, indexed by column position.
pub type Row = Vec<Scalar>;

/// Minimal column representation for batches handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columnar batch of rows extracted from one or more documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    /// Empty batch with one column per schema field.
    pub fn empty(schema: &Schema) -> Self {
        Self {
            columns: schema
                .fields
                .iter()
                .map(|f| Column {
                    name: f.name.clone(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// Transpose rows into columns. Rows shorter than the schema are padded with nulls.
    pub fn from_rows(schema: &Schema, rows: impl IntoIterator<Item = Row>) -> Self {
        let mut batch = Self::empty(schema);
        for row in rows {
            batch.push_row(row);
        }
        batch
    }

    pub fn push_row(&mut self, row: Row) {
        let mut values = row.into_iter();
        for col in &mut self.columns {
            col.values.push(values.next().unwrap_or(Scalar::Null));
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Copy out row `idx`.
    pub fn row(&self, idx: usize) -> Option<Row> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[idx].clone()).collect())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
