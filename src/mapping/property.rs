use crate::core::{DataType, Result, SeedError, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Conversion and default-detection for a single property type.
///
/// Scalars (integers, floats, `bool`, `char`, `String`, timestamps with or
/// without an offset, dates, UUIDs and `Option`s of those) are *copyable*: same-type mapping copies
/// them when the source holds a non-default value. Anything else
/// (`Vec<_>`) is carried through cross-type and dictionary mapping only.
pub trait MapValue: Clone + Sized {
    const COPYABLE: bool = true;
    const NULLABLE: bool = false;

    fn data_type() -> DataType;

    /// Fails when the value does not fit in a [`Value`], such as a `u64`
    /// above `i64::MAX`.
    fn to_value(&self) -> Result<Value>;

    fn from_value(value: Value) -> Result<Self>;

    /// Returns `true` when the value equals the type's natural zero.
    fn is_default(&self) -> bool;
}

fn mismatch<T: MapValue>(value: &Value) -> SeedError {
    SeedError::TypeMismatch(format!(
        "expected {}, got {}",
        T::data_type(),
        value.type_name()
    ))
}

macro_rules! impl_integer_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl MapValue for $ty {
                fn data_type() -> DataType {
                    DataType::Integer
                }

                fn to_value(&self) -> Result<Value> {
                    i64::try_from(*self).map(Value::Integer).map_err(|_| {
                        SeedError::TypeMismatch(format!(
                            "{} {} does not fit in INTEGER",
                            stringify!($ty),
                            self
                        ))
                    })
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(i).map_err(|_| {
                            SeedError::TypeMismatch(format!(
                                "integer {} out of range for {}",
                                i,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }

                fn is_default(&self) -> bool {
                    *self == 0
                }
            }
        )+
    };
}

impl_integer_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl MapValue for f64 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        *self == 0.0
    }
}

impl MapValue for f32 {
    fn data_type() -> DataType {
        DataType::Float
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(f64::from(*self)))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) if f.is_finite() && f.abs() > f64::from(f32::MAX) => {
                Err(SeedError::TypeMismatch(format!(
                    "float {} out of range for f32",
                    f
                )))
            }
            Value::Float(f) => Ok(f as f32),
            Value::Integer(i) => Ok(i as f32),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        *self == 0.0
    }
}

impl MapValue for bool {
    fn data_type() -> DataType {
        DataType::Boolean
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Boolean(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        !*self
    }
}

impl MapValue for char {
    fn data_type() -> DataType {
        DataType::Text
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.to_string()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(SeedError::TypeMismatch(format!(
                        "expected a single character, got '{}'",
                        s
                    ))),
                }
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        *self == '\0'
    }
}

impl MapValue for String {
    fn data_type() -> DataType {
        DataType::Text
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

impl MapValue for DateTime<Utc> {
    fn data_type() -> DataType {
        DataType::Timestamp
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Timestamp(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }
}

// The offset is not carried through `Value`; values come back in UTC
impl MapValue for DateTime<FixedOffset> {
    fn data_type() -> DataType {
        DataType::Timestamp
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Timestamp(self.with_timezone(&Utc)))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts.fixed_offset()),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }
}

impl MapValue for NaiveDateTime {
    fn data_type() -> DataType {
        DataType::Timestamp
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Timestamp(self.and_utc()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts.naive_utc()),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        *self == NaiveDateTime::default()
    }
}

impl MapValue for NaiveDate {
    fn data_type() -> DataType {
        DataType::Date
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Date(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        *self == NaiveDate::default()
    }
}

impl MapValue for Uuid {
    fn data_type() -> DataType {
        DataType::Uuid
    }

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Uuid(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(u) => Ok(u),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        self.is_nil()
    }
}

impl<T: MapValue> MapValue for Option<T> {
    const COPYABLE: bool = T::COPYABLE;
    const NULLABLE: bool = true;

    fn data_type() -> DataType {
        T::data_type()
    }

    fn to_value(&self) -> Result<Value> {
        match self {
            Some(value) => value.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    // `Some(0)` is a value, only `None` is the default
    fn is_default(&self) -> bool {
        self.is_none()
    }
}

impl<T: MapValue> MapValue for Vec<T> {
    const COPYABLE: bool = false;

    fn data_type() -> DataType {
        DataType::List(Box::new(T::data_type()))
    }

    fn to_value(&self) -> Result<Value> {
        self.iter()
            .map(MapValue::to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn is_default(&self) -> bool {
        self.is_empty()
    }
}

/// Accessor pair for one public property of `T`.
pub struct Property<T> {
    pub name: &'static str,
    pub data_type: DataType,
    pub nullable: bool,
    pub copyable: bool,
    pub get: fn(&T) -> Result<Value>,
    pub set: fn(&mut T, Value) -> Result<()>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            data_type: self.data_type.clone(),
            nullable: self.nullable,
            copyable: self.copyable,
            get: self.get,
            set: self.set,
        }
    }
}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("nullable", &self.nullable)
            .field("copyable", &self.copyable)
            .finish()
    }
}

/// A type whose properties can be copied by the mapper.
///
/// Implemented by `#[derive(Mappable)]`; the derive emits the property table
/// and a straight-line `copy_non_default` for same-type copies.
///
/// Property names must stay distinct when compared case-insensitively:
///
/// ```compile_fail
/// use dataseed::Mappable;
///
/// #[derive(Mappable, Default)]
/// struct Contact {
///     #[mapping(rename = "Name")]
///     display_name: String,
///     name: String,
/// }
/// ```
pub trait Mappable: Sized + 'static {
    /// Short type name used in diagnostics and as the default table name.
    fn type_name() -> &'static str;

    /// Properties in declaration order.
    fn properties() -> Vec<Property<Self>>;

    /// Copies every copyable property whose source value is not the default.
    fn copy_non_default(destination: &mut Self, source: &Self);

    /// Key members declared with `#[mapping(key)]`, in declaration order.
    fn key_members() -> Vec<&'static str> {
        Vec::new()
    }

    fn property(name: &str) -> Option<Property<Self>> {
        Self::properties().into_iter().find(|p| p.name == name)
    }
}
