use std::fmt::{self, Debug, Display};
use std::rc::Rc;

use crate::object::Object;
#[cfg(feature = "promise")]
use crate::promise::Promise;

/// A dynamically typed value as seen by the binding layer.
#[derive(Clone, Default)]
pub enum Value {
	#[default]
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(Rc<str>),
	Error(Rc<str>),
	Object(Object),
	#[cfg(feature = "promise")]
	Promise(Promise),
}

impl Value {
	/// Creates a fresh error value. Two errors are never strictly equal
	/// unless they are the same allocation.
	pub fn error(message: impl AsRef<str>) -> Self {
		Value::Error(Rc::from(message.as_ref()))
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_object(&self) -> Option<&Object> {
		match self {
			Value::Object(o) => Some(o),
			_ => None,
		}
	}

	#[cfg(feature = "promise")]
	pub fn as_promise(&self) -> Option<&Promise> {
		match self {
			Value::Promise(p) => Some(p),
			_ => None,
		}
	}

	/// Strict equality: primitives by value, everything with identity by
	/// pointer.
	pub fn strict_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Undefined, Value::Undefined) => true,
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
			(Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
			#[cfg(feature = "promise")]
			(Value::Promise(a), Value::Promise(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Null => f.write_str("null"),
			Value::Bool(b) => Debug::fmt(b, f),
			Value::Number(n) => Debug::fmt(n, f),
			Value::String(s) => Debug::fmt(s, f),
			Value::Error(e) => write!(f, "Error({:?})", e),
			Value::Object(o) => Debug::fmt(o, f),
			#[cfg(feature = "promise")]
			Value::Promise(p) => Debug::fmt(p, f),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::String(s) => f.write_str(s),
			Value::Number(n) => Display::fmt(n, f),
			Value::Bool(b) => Display::fmt(b, f),
			Value::Error(e) => write!(f, "Error: {}", e),
			other => Debug::fmt(other, f),
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(Rc::from(value))
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(Rc::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Number(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Number(value as f64)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<Object> for Value {
	fn from(value: Object) -> Self {
		Value::Object(value)
	}
}

#[cfg(feature = "promise")]
impl From<Promise> for Value {
	fn from(value: Promise) -> Self {
		Value::Promise(value)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Value::Undefined, Into::into)
	}
}
