//! Memoized, promise-aware virtual properties for data binding.
#![cfg_attr(
	feature = "promise",
	doc = r##"
```
use bindable::{async_bindable, Class, Getter, Object, Options, Promise, Value};

let (promise, resolver) = Promise::new();
let class = Class::new("Search")
	.field("query", "rust")?
	.getter(
		"results",
		Getter::new(move |_| Value::from(promise.clone())).computed_from(["query"]),
	)?
	.decorate("results", &async_bindable(Options::new().pend_with("loading")))?
	.build();

let search = Object::new(&class);
assert_eq!(search.get("results").as_str(), Some("loading"));

resolver.resolve("3 crates");
assert_eq!(search.get("results").as_str(), Some("3 crates"));
# Ok::<(), bindable::Error>(())
```
"##
)]

mod batch;
mod bindable;
mod binding;
mod descriptor;
mod error;
mod memo;
mod object;
#[cfg(feature = "promise")]
mod promise;
pub mod retrigger;
mod value;

pub use batch::{batch, in_batch};
pub use bindable::{async_bindable, AsyncBindable, Mapping, Options};
pub use binding::{Binding, Reactive};
pub use descriptor::{Dependencies, Getter, PropertyDescriptor};
pub use error::{Error, Result};
pub use memo::memoize;
pub use object::{is_reserved, Class, Object, ObserverId, RESERVED_PREFIX};
#[cfg(feature = "promise")]
pub use promise::{Outcome, Promise, PromiseState, Resolver};
pub use value::Value;

pub trait Decorator {
	/// Transforms the definition of property `name` while its class is
	/// being defined.
	fn apply(&self, name: &str, descriptor: PropertyDescriptor) -> Result<PropertyDescriptor>;
}
