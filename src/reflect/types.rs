//! Reflection Type System
//!
//! Loosely typed values exchanged between the boundary and a provider, plus
//! the value types used to describe method signatures.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Value types a provider method can declare for its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Absent value
    Null,
    /// Boolean
    Bool,
    /// 32-bit signed integer (every C-ABI enum and count)
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point (C-ABI thresholds)
    F32,
    /// 64-bit floating point
    F64,
    /// Owned UTF-8 string
    Str,
    /// Array of 32-bit integers (shape descriptors)
    I32Array,
    /// Ordered list of values
    List,
    /// Opaque provider object
    Object,
}

impl ValueType {
    /// Whether a `Null` argument is acceptable for a parameter of this type
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            ValueType::Null
                | ValueType::Str
                | ValueType::I32Array
                | ValueType::List
                | ValueType::Object
        )
    }

    /// Exact match used by signature lookup: same type, or `Null` into a nullable slot
    pub fn accepts(&self, value: &Value) -> bool {
        let found = value.value_type();
        found == *self || (found == ValueType::Null && self.is_nullable())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Str => "string",
            ValueType::I32Array => "i32[]",
            ValueType::List => "list",
            ValueType::Object => "object",
        };
        write!(f, "{}", name)
    }
}

/// An opaque object returned by a provider.
///
/// The boundary only ever asks for a size: a direct count when the object
/// knows it, otherwise a single enumeration of its items.
pub trait Opaque: fmt::Debug + Send + Sync {
    /// Direct item count, if the object exposes one
    fn count(&self) -> Option<usize> {
        None
    }

    /// Enumerate the object's items, if it is enumerable
    fn items(&self) -> Option<Box<dyn Iterator<Item = Value> + '_>> {
        None
    }
}

/// A value passed to or returned from a provider method
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    I32Array(Vec<i32>),
    List(Vec<Value>),
    Object(Arc<dyn Opaque>),
}

impl Value {
    /// Get the type of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Str(_) => ValueType::Str,
            Value::I32Array(_) => ValueType::I32Array,
            Value::List(_) => ValueType::List,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap a provider object
    pub fn object(obj: impl Opaque + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    /// Convert into any type implementing [`FromValue`]
    pub fn to<T: FromValue>(&self) -> Result<T, ConversionError> {
        T::from_value(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::I32Array(a), Value::I32Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::I32Array(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Error raised when a provider cannot adapt an argument to its own type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {found} to {expected}")]
    Mismatch {
        expected: &'static str,
        found: ValueType,
    },

    #[error("value {value} is out of range for {expected}")]
    OutOfRange { expected: &'static str, value: String },

    #[error("{value} is not a valid {expected}")]
    InvalidEnum { expected: &'static str, value: i64 },
}

/// Conversion from a loosely typed [`Value`] into a provider's own type.
///
/// Providers implement this for their enums so that plain integers coming
/// through the boundary land in the right variant.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

fn integer_of(value: &Value, expected: &'static str) -> Result<i64, ConversionError> {
    match value {
        Value::I32(v) => Ok(*v as i64),
        Value::I64(v) => Ok(*v),
        Value::Bool(v) => Ok(*v as i64),
        other => Err(ConversionError::Mismatch {
            expected,
            found: other.value_type(),
        }),
    }
}

/// Adapt an integer value into an enum through its `TryFrom<i32>` impl
pub fn enum_from_value<E: TryFrom<i32>>(
    value: &Value,
    expected: &'static str,
) -> Result<E, ConversionError> {
    let raw = integer_of(value, expected)?;
    i32::try_from(raw)
        .ok()
        .and_then(|v| E::try_from(v).ok())
        .ok_or(ConversionError::InvalidEnum {
            expected,
            value: raw,
        })
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::I32(v) => Ok(*v != 0),
            Value::I64(v) => Ok(*v != 0),
            other => Err(ConversionError::Mismatch {
                expected: "bool",
                found: other.value_type(),
            }),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let raw = integer_of(value, "i32")?;
        i32::try_from(raw).map_err(|_| ConversionError::OutOfRange {
            expected: "i32",
            value: raw.to_string(),
        })
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        integer_of(value, "i64")
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let raw = integer_of(value, "u32")?;
        u32::try_from(raw).map_err(|_| ConversionError::OutOfRange {
            expected: "u32",
            value: raw.to_string(),
        })
    }
}

impl FromValue for usize {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        let raw = integer_of(value, "usize")?;
        usize::try_from(raw).map_err(|_| ConversionError::OutOfRange {
            expected: "usize",
            value: raw.to_string(),
        })
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::F32(v) => Ok(*v),
            Value::F64(v) => Ok(*v as f32),
            Value::I32(v) => Ok(*v as f32),
            Value::I64(v) => Ok(*v as f32),
            other => Err(ConversionError::Mismatch {
                expected: "f32",
                found: other.value_type(),
            }),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::F32(v) => Ok(*v as f64),
            Value::F64(v) => Ok(*v),
            Value::I32(v) => Ok(*v as f64),
            Value::I64(v) => Ok(*v as f64),
            other => Err(ConversionError::Mismatch {
                expected: "f64",
                found: other.value_type(),
            }),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(ConversionError::Mismatch {
                expected: "string",
                found: other.value_type(),
            }),
        }
    }
}

impl FromValue for Vec<i32> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::I32Array(v) => Ok(v.clone()),
            Value::List(items) => items.iter().map(i32::from_value).collect(),
            other => Err(ConversionError::Mismatch {
                expected: "i32[]",
                found: other.value_type(),
            }),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Method signature: a name plus declared parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Parameter types
    pub params: Vec<ValueType>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, params: Vec<ValueType>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// True when every argument matches its parameter exactly
    pub fn matches(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args.iter())
                .all(|(param, arg)| param.accepts(arg))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

/// Positional arguments handed to a provider method
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Adapt the argument at `index` into the provider's type
    pub fn get<T: FromValue>(&self, index: usize) -> anyhow::Result<T> {
        let value = self.values.get(index).ok_or_else(|| {
            anyhow::anyhow!(
                "argument {} requested but only {} supplied",
                index,
                self.values.len()
            )
        })?;
        T::from_value(value).map_err(|e| anyhow::anyhow!("argument {}: {}", index, e))
    }
}
