//! Column types and column specifications.
//!
//! A [`ColumnSpec`] pairs how a value is read from a remote [`Record`] with
//! how it is read from an external record, plus the [`ColumnType`] both
//! sides are coerced to before comparison.

use crate::coerce::from_wire_by_type;
use crate::error::{Error, Result};
use crate::values::{CellValue, Record, RowSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Semantic type of a remote column, governing coercion.
///
/// A missing type (`Option::None`) behaves like `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Text; null coerces to the empty string
    Text,
    /// Calendar date; stored remotely as a UTC-midnight timestamp
    Date,
    /// Date/time; stored remotely as a timestamp
    DateTime,
    /// Number; coercion is left to the remote store
    Numeric,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Date => write!(f, "Date"),
            Self::DateTime => write!(f, "DateTime"),
            Self::Numeric => write!(f, "Numeric"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            "numeric" => Ok(Self::Numeric),
            _ => Err(Error::Configuration(format!(
                "Invalid column type: '{s}'. Expected Text, Date, DateTime or Numeric"
            ))),
        }
    }
}

/// Function reading a value out of a record.
pub type AccessorFn<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// How a column value is read from a record of type `T`.
pub enum ColumnAccessor<T> {
    /// Read the named field and coerce it to the column type.
    Field(String),
    /// Call the function; its result is used as-is, without coercion.
    Function(AccessorFn<T>),
}

impl<T> ColumnAccessor<T> {
    /// Accessor reading the named field.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Accessor computing the value with a function.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// The field name, if this accessor reads a field.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Function(_) => None,
        }
    }
}

impl<T: RowSource> ColumnAccessor<T> {
    /// Read this column's value from `record`.
    pub fn resolve(&self, record: &T, col_type: Option<ColumnType>) -> Result<CellValue> {
        match self {
            Self::Field(name) => {
                let value = record
                    .field(name)
                    .ok_or_else(|| Error::validation(format!("record has no field '{name}'")))?;
                from_wire_by_type(value, col_type)
            }
            Self::Function(f) => Ok(f(record)),
        }
    }
}

impl<T> Clone for ColumnAccessor<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(name) => Self::Field(name.clone()),
            Self::Function(f) => Self::Function(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for ColumnAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<T> From<&str> for ColumnAccessor<T> {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl<T> From<String> for ColumnAccessor<T> {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

/// One synced column: remote accessor, external accessor and optional type.
///
/// The remote accessor doubles as the write target, so columns that get
/// written (every column on add, changed columns on update) need a
/// field-name remote accessor.
#[derive(Debug)]
pub struct ColumnSpec<R> {
    /// How the value is read from (and written to) the remote table
    pub remote: ColumnAccessor<Record>,

    /// How the value is read from an external record
    pub external: ColumnAccessor<R>,

    /// Coercion applied to field-name accessors on both sides
    pub col_type: Option<ColumnType>,
}

impl<R> ColumnSpec<R> {
    /// Create an untyped column spec.
    pub fn new(
        remote: impl Into<ColumnAccessor<Record>>,
        external: impl Into<ColumnAccessor<R>>,
    ) -> Self {
        Self {
            remote: remote.into(),
            external: external.into(),
            col_type: None,
        }
    }

    /// Create a typed column spec.
    pub fn typed(
        remote: impl Into<ColumnAccessor<Record>>,
        external: impl Into<ColumnAccessor<R>>,
        col_type: ColumnType,
    ) -> Self {
        Self::new(remote, external).with_type(col_type)
    }

    /// Set the column type.
    pub fn with_type(mut self, col_type: ColumnType) -> Self {
        self.col_type = Some(col_type);
        self
    }

    /// Remote column id that values of this column are written to.
    pub fn remote_col_id(&self) -> Result<&str> {
        self.remote.field_name().ok_or_else(|| {
            Error::validation("a column read from the remote table by a function cannot be written")
        })
    }
}

impl<R: RowSource> ColumnSpec<R> {
    /// Coerced value of this column in a remote record.
    pub fn remote_value(&self, record: &Record) -> Result<CellValue> {
        self.remote.resolve(record, self.col_type)
    }

    /// Coerced value of this column in an external record.
    pub fn external_value(&self, record: &R) -> Result<CellValue> {
        self.external.resolve(record, self.col_type)
    }
}

impl<R> Clone for ColumnSpec<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            external: self.external.clone(),
            col_type: self.col_type,
        }
    }
}
