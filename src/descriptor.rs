use std::fmt::{self, Debug};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::object::Object;
use crate::value::Value;

pub type Dependencies = SmallVec<[Rc<str>; 4]>;

/// A virtual getter together with the ordered property paths it is
/// computed from.
#[derive(Clone)]
pub struct Getter {
	func: Rc<dyn Fn(&Object) -> Value>,
	dependencies: Dependencies,
}

impl Getter {
	pub fn new(func: impl Fn(&Object) -> Value + 'static) -> Self {
		Getter {
			func: Rc::new(func),
			dependencies: SmallVec::new(),
		}
	}

	/// Declares the property paths (`"a"`, `"a.b.c"`) this getter reads.
	/// Appends to any paths declared earlier.
	pub fn computed_from<I, S>(mut self, paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.dependencies
			.extend(paths.into_iter().map(|p| Rc::from(p.as_ref())));
		self
	}

	pub fn dependencies(&self) -> &[Rc<str>] {
		&self.dependencies
	}

	#[inline]
	pub fn call(&self, object: &Object) -> Value {
		(self.func)(object)
	}

	/// Builds a getter with a new body and the given dependency list.
	pub(crate) fn from_parts(
		func: impl Fn(&Object) -> Value + 'static,
		dependencies: Dependencies,
	) -> Self {
		Getter {
			func: Rc::new(func),
			dependencies,
		}
	}
}

impl Debug for Getter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Getter")
			.field("dependencies", &self.dependencies)
			.finish()
	}
}

#[derive(Clone, Debug)]
pub enum PropertyDescriptor {
	/// A plain data property with its initial value.
	Field(Value),
	/// A virtual property backed by a getter.
	Accessor(Getter),
}

impl PropertyDescriptor {
	pub fn getter(&self) -> Option<&Getter> {
		match self {
			PropertyDescriptor::Accessor(getter) => Some(getter),
			PropertyDescriptor::Field(_) => None,
		}
	}
}

impl From<Getter> for PropertyDescriptor {
	fn from(getter: Getter) -> Self {
		PropertyDescriptor::Accessor(getter)
	}
}
