use super::Value;
use std::fmt;

/// Static shape of a mappable property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    Date,
    Uuid,
    List(Box<DataType>),
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::Date, Value::Date(_)) => true,
            (Self::Uuid, Value::Uuid(_)) => true,
            (Self::List(inner), Value::List(items)) => {
                items.iter().all(|item| inner.is_compatible(item))
            }
            _ => false,
        }
    }

    /// Whether a property of type `source` may be assigned into one of this type.
    pub fn accepts(&self, source: &DataType) -> bool {
        match (self, source) {
            (a, b) if a == b => true,
            (Self::Float, Self::Integer) => true,
            (Self::List(a), Self::List(b)) => a.accepts(b),
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Date => write!(f, "DATE"),
            Self::Uuid => write!(f, "UUID"),
            Self::List(inner) => write!(f, "LIST<{}>", inner),
        }
    }
}
