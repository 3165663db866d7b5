use crate::object::{Object, RESERVED_PREFIX};
use crate::value::Value;

/// Path of the hidden counter that is bumped whenever the asynchronous
/// value behind property `name` settles.
pub fn counter_path(name: &str) -> String {
	format!("{}asb:{}", RESERVED_PREFIX, name)
}

/// Current counter value, `None` before the property was first read.
pub fn counter(object: &Object, name: &str) -> Option<u64> {
	object
		.hidden(&counter_path(name))
		.as_number()
		.map(|n| n as u64)
}

/// Creates the counter without telling anybody.
pub(crate) fn init(object: &Object, name: &str) {
	let path = counter_path(name);
	if object.hidden(&path).is_undefined() {
		object.set_hidden(&path, Value::Number(0.0), false);
	}
}

/// Increments the counter, which observers see as a change of the
/// property's synthetic dependency.
pub(crate) fn bump(object: &Object, name: &str) {
	let path = counter_path(name);
	let next = object.hidden(&path).as_number().unwrap_or(0.0) + 1.0;
	tracing::debug!(property = %name, counter = next, "async value settled");
	object.set_hidden(&path, Value::Number(next), true);
}
