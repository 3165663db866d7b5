use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::descriptor::PropertyDescriptor;
use crate::error::Result;
use crate::value::Value;
use crate::Decorator;

/// What a settled asynchronous value turns into.
#[derive(Clone)]
pub enum Mapping {
	/// Always this value, whatever the settlement carried.
	Value(Value),
	/// The settlement value passed through a function.
	Map(Rc<dyn Fn(Value) -> Value>),
}

impl Mapping {
	pub fn map(func: impl Fn(Value) -> Value + 'static) -> Self {
		Mapping::Map(Rc::new(func))
	}

	pub fn identity() -> Self {
		Mapping::map(|value| value)
	}

	pub fn apply(&self, input: Value) -> Value {
		match self {
			Mapping::Value(value) => value.clone(),
			Mapping::Map(func) => func(input),
		}
	}
}

impl Default for Mapping {
	fn default() -> Self {
		Mapping::identity()
	}
}

impl Debug for Mapping {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Mapping::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Mapping::Map(_) => f.write_str("Map(<fn>)"),
		}
	}
}

macro_rules! mapping_from {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Mapping {
				fn from(value: $ty) -> Self {
					Mapping::Value(value.into())
				}
			}
		)*
	};
}

mapping_from!(Value, &str, String, f64, i32, bool);

/// Substitute values handed to the binding layer.
///
/// Defaults: `Undefined` while pending, the fulfillment value as is, the
/// rejection reason as is.
#[derive(Clone, Debug, Default)]
pub struct Options {
	pend_with: Value,
	resolve_with: Mapping,
	reject_with: Mapping,
}

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pend_with(mut self, value: impl Into<Value>) -> Self {
		self.pend_with = value.into();
		self
	}

	pub fn resolve_with(mut self, mapping: impl Into<Mapping>) -> Self {
		self.resolve_with = mapping.into();
		self
	}

	pub fn reject_with(mut self, mapping: impl Into<Mapping>) -> Self {
		self.reject_with = mapping.into();
		self
	}
}

/// Decorator adapting a virtual getter that may return a [`Promise`]
/// (see [`async_bindable`]).
///
/// [`Promise`]: crate::Promise
#[derive(Clone, Debug)]
pub struct AsyncBindable {
	#[cfg_attr(not(feature = "promise"), allow(unused))]
	options: Rc<Options>,
}

/// Creates the decorator.
///
/// The decorated getter is memoized on its declared dependencies. When the
/// memoized result is a pending promise the getter answers with
/// `pend_with` and, once the promise settles, bumps a hidden counter that
/// is appended to the getter's dependency list, so whatever watches the
/// dependencies reads the property again and gets the mapped settlement.
///
/// Declare dependencies with [`Getter::computed_from`] before decorating.
///
/// [`Getter::computed_from`]: crate::Getter::computed_from
pub fn async_bindable(options: Options) -> AsyncBindable {
	AsyncBindable {
		options: Rc::new(options),
	}
}

#[cfg(feature = "promise")]
impl Decorator for AsyncBindable {
	fn apply(&self, name: &str, descriptor: PropertyDescriptor) -> Result<PropertyDescriptor> {
		use crate::descriptor::{Dependencies, Getter};
		use crate::error::Error;
		use crate::memo::memoize;
		use crate::object::Object;
		use crate::retrigger;

		let PropertyDescriptor::Accessor(getter) = descriptor else {
			return Err(Error::NotAGetter(name.to_owned()));
		};

		let mut dependencies: Dependencies = getter.dependencies().iter().cloned().collect();
		dependencies.push(Rc::from(retrigger::counter_path(name)));

		let memoized = memoize(name, getter);
		let name: Rc<str> = Rc::from(name);
		let options = self.options.clone();

		Ok(PropertyDescriptor::Accessor(Getter::from_parts(
			move |object: &Object| {
				let value = memoized.call(object);
				adapter::adapt(object, &name, &options, value)
			},
			dependencies,
		)))
	}
}

/// Without promise support there is nothing to adapt and the property is
/// left untouched.
#[cfg(not(feature = "promise"))]
impl Decorator for AsyncBindable {
	fn apply(&self, name: &str, descriptor: PropertyDescriptor) -> Result<PropertyDescriptor> {
		tracing::debug!(property = %name, "promise support disabled, leaving property as is");
		Ok(descriptor)
	}
}

#[cfg(feature = "promise")]
mod adapter {
	use std::cell::RefCell;
	use std::rc::Rc;

	use enclose::enclose;
	use fxhash::FxHashMap;
	use smallvec::SmallVec;

	use super::Options;
	use crate::object::Object;
	use crate::promise::{Outcome, Promise, PromiseState};
	use crate::retrigger;
	use crate::value::Value;

	/// Pending promises each property of an instance already has a
	/// continuation on. Settled entries are pruned on the next watch.
	#[derive(Default)]
	struct Watched {
		promises: RefCell<FxHashMap<Rc<str>, SmallVec<[Promise; 2]>>>,
	}

	pub(super) fn adapt(object: &Object, name: &Rc<str>, options: &Options, value: Value) -> Value {
		retrigger::init(object, name);

		let Value::Promise(promise) = value else {
			return value;
		};

		promise.mark_handled();

		match promise.state() {
			PromiseState::Pending => {
				watch(object, name, &promise);
				options.pend_with.clone()
			}
			PromiseState::Fulfilled(value) => options.resolve_with.apply(value),
			PromiseState::Rejected(reason) => options.reject_with.apply(reason),
		}
	}

	fn watch(object: &Object, name: &Rc<str>, promise: &Promise) {
		let watched = object.extension::<Watched>();
		{
			let mut promises = watched.promises.borrow_mut();
			let watching = promises.entry(name.clone()).or_default();
			watching.retain(|p| p.is_pending());
			if watching.iter().any(|p| p.ptr_eq(promise)) {
				return;
			}
			watching.push(promise.clone());
		}

		let object = object.downgrade();
		promise.on_settled(enclose!((name) move |_: &Outcome| {
			if let Some(object) = object.upgrade() {
				retrigger::bump(&object, &name);
			}
		}));
	}
}

#[cfg(all(test, not(feature = "promise")))]
mod tests {
	use super::*;
	use crate::descriptor::Getter;

	#[test]
	fn leaves_properties_untouched_without_promise_support() {
		let decorator = async_bindable(Options::new().pend_with("loading"));

		let field = decorator
			.apply("value", PropertyDescriptor::Field(Value::from(1)))
			.unwrap();
		assert!(matches!(field, PropertyDescriptor::Field(Value::Number(n)) if n == 1.0));

		let getter = Getter::new(|_| Value::Null).computed_from(["query", "page.size"]);
		let accessor = decorator
			.apply("results", PropertyDescriptor::Accessor(getter))
			.unwrap();
		let paths: Vec<&str> = accessor
			.getter()
			.unwrap()
			.dependencies()
			.iter()
			.map(|p| &**p)
			.collect();
		assert_eq!(paths, vec!["query", "page.size"]);
	}
}
