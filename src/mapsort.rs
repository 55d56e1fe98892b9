//! Ordering of key/value entries drawn from a closed set of primitive kinds.
//!
//! Both halves of an [`Entry`] are a [`Value`]. Sorting by key never looks at
//! the value kinds and sorting by value never looks at the key kinds, but every
//! entry taking part in one sort must agree on the kind of the compared half.
//! A disagreement is a caller bug and is reported before anything is moved.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Text,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Text => "text",
        };
        f.write_str(name)
    }
}

/// One sortable key or value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::I8(_) => Kind::I8,
            Value::I16(_) => Kind::I16,
            Value::I32(_) => Kind::I32,
            Value::I64(_) => Kind::I64,
            Value::U8(_) => Kind::U8,
            Value::U16(_) => Kind::U16,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::Text(_) => Kind::Text,
        }
    }

    /// Compare two values of the same kind in that kind's natural order.
    ///
    /// Floats use the IEEE total order, so `NaN` sorts after every number
    /// instead of making the comparison undefined.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering, SortError> {
        let ord = match (self, other) {
            (Value::I8(a), Value::I8(b)) => a.cmp(b),
            (Value::I16(a), Value::I16(b)) => a.cmp(b),
            (Value::I32(a), Value::I32(b)) => a.cmp(b),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::U8(a), Value::U8(b)) => a.cmp(b),
            (Value::U16(a), Value::U16(b)) => a.cmp(b),
            (Value::U32(a), Value::U32(b)) => a.cmp(b),
            (Value::U64(a), Value::U64(b)) => a.cmp(b),
            (Value::F32(a), Value::F32(b)) => a.total_cmp(b),
            (Value::F64(a), Value::F64(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => {
                return Err(SortError::MixedKinds {
                    expected: self.kind(),
                    found: other.kind(),
                })
            }
        };
        Ok(ord)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I8(v) => v.fmt(f),
            Value::I16(v) => v.fmt(f),
            Value::I32(v) => v.fmt(f),
            Value::I64(v) => v.fmt(f),
            Value::U8(v) => v.fmt(f),
            Value::U16(v) => v.fmt(f),
            Value::U32(v) => v.fmt(f),
            Value::U64(v) => v.fmt(f),
            Value::F32(v) => v.fmt(f),
            Value::F64(v) => v.fmt(f),
            Value::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Text,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A single key/value pair of the map being sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Value,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    fn side(&self, by: SortBy) -> &Value {
        match by {
            SortBy::Key => &self.key,
            SortBy::Value => &self.value,
        }
    }
}

/// Which half of each entry drives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Key,
    Value,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("cannot order a {found} entry among {expected} entries")]
    MixedKinds { expected: Kind, found: Kind },
}

/// Sort `entries` in place by key or by value.
///
/// Every entry must carry the same kind on the compared half. If one does not,
/// `SortError::MixedKinds` is returned and `entries` is left as it was.
pub fn sort_entries(entries: &mut [Entry], by: SortBy) -> Result<(), SortError> {
    let Some(first) = entries.first() else {
        return Ok(());
    };
    let expected = first.side(by).kind();
    if let Some(found) = entries
        .iter()
        .map(|e| e.side(by).kind())
        .find(|kind| *kind != expected)
    {
        return Err(SortError::MixedKinds { expected, found });
    }
    // kinds are uniform from here on, so try_cmp cannot fail
    entries.sort_by(|a, b| a.side(by).try_cmp(b.side(by)).unwrap_or(Ordering::Equal));
    Ok(())
}

/// Collect the pairs of a map (or any pair iterator) into sorted entries.
pub fn sorted<I, K, V>(pairs: I, by: SortBy) -> Result<Vec<Entry>, SortError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Value>,
    V: Into<Value>,
{
    let mut entries: Vec<Entry> = pairs.into_iter().map(|(k, v)| Entry::new(k, v)).collect();
    sort_entries(&mut entries, by)?;
    Ok(entries)
}
