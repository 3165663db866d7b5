use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::descriptor::{Getter, PropertyDescriptor};
use crate::error::{Error, Result};
use crate::value::Value;
use crate::Decorator;

/// Names starting with this character live in the hidden namespace of an
/// instance and can never be declared or assigned by user code.
pub const RESERVED_PREFIX: char = '@';

pub fn is_reserved(name: &str) -> bool {
	name.starts_with(RESERVED_PREFIX)
}

/// The property definitions shared by every instance of a kind of object.
pub struct Class {
	name: Rc<str>,
	properties: Vec<(Rc<str>, PropertyDescriptor)>,
}

impl Class {
	pub fn new(name: &str) -> Self {
		Class {
			name: Rc::from(name),
			properties: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn field(self, name: &str, value: impl Into<Value>) -> Result<Self> {
		self.define(name, PropertyDescriptor::Field(value.into()))
	}

	pub fn getter(self, name: &str, getter: Getter) -> Result<Self> {
		self.define(name, PropertyDescriptor::Accessor(getter))
	}

	/// Defines or redefines a property.
	pub fn define(mut self, name: &str, descriptor: PropertyDescriptor) -> Result<Self> {
		if is_reserved(name) {
			return Err(Error::ReservedName(name.to_owned()));
		}

		match self.properties.iter_mut().find(|(n, _)| &**n == name) {
			Some((_, existing)) => *existing = descriptor,
			None => self.properties.push((Rc::from(name), descriptor)),
		}

		Ok(self)
	}

	/// Runs `decorator` over the property definition at class-definition
	/// time, replacing it with whatever the decorator returns.
	pub fn decorate(mut self, name: &str, decorator: &impl Decorator) -> Result<Self> {
		let Some(index) = self.properties.iter().position(|(n, _)| &**n == name) else {
			return Err(Error::UnknownProperty(
				name.to_owned(),
				self.name.to_string(),
			));
		};

		let descriptor = self.properties[index].1.clone();
		self.properties[index].1 = decorator.apply(name, descriptor)?;
		Ok(self)
	}

	pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
		self.properties
			.iter()
			.find(|(n, _)| &**n == name)
			.map(|(_, d)| d)
	}

	pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
		self.properties.iter().map(|(n, d)| (&**n, d))
	}

	#[inline]
	pub fn build(self) -> Rc<Class> {
		Rc::new(self)
	}
}

impl Debug for Class {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Class")
			.field("name", &self.name)
			.field("properties", &self.properties)
			.finish()
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObserverId(u64);

type Observer = Rc<dyn Fn(&Object, &str)>;

/// A bound instance of a [`Class`].
#[derive(Clone)]
pub struct Object {
	body: Rc<ObjectBody>,
}

struct ObjectBody {
	class: Rc<Class>,
	fields: RefCell<FxHashMap<Rc<str>, Value>>,
	hidden: RefCell<FxHashMap<Rc<str>, Value>>,
	extensions: RefCell<FxHashMap<TypeId, Rc<dyn Any>>>,
	observers: RefCell<Vec<(ObserverId, Observer)>>,
	next_observer: Cell<u64>,
}

impl Object {
	pub fn new(class: &Rc<Class>) -> Self {
		let fields = class
			.properties
			.iter()
			.filter_map(|(name, descriptor)| match descriptor {
				PropertyDescriptor::Field(value) => Some((name.clone(), value.clone())),
				PropertyDescriptor::Accessor(_) => None,
			})
			.collect();

		Object {
			body: Rc::new(ObjectBody {
				class: class.clone(),
				fields: RefCell::new(fields),
				hidden: RefCell::new(FxHashMap::default()),
				extensions: RefCell::new(FxHashMap::default()),
				observers: RefCell::new(Vec::new()),
				next_observer: Cell::new(0),
			}),
		}
	}

	pub fn class(&self) -> &Rc<Class> {
		&self.body.class
	}

	#[inline]
	pub fn ptr_eq(&self, other: &Object) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	/// Reads an own property, running the getter for virtual properties.
	pub fn get(&self, name: &str) -> Value {
		if is_reserved(name) {
			return self.hidden(name);
		}

		if let Some(PropertyDescriptor::Accessor(getter)) = self.body.class.property(name) {
			return getter.call(self);
		}

		self.body
			.fields
			.borrow()
			.get(name)
			.cloned()
			.unwrap_or_default()
	}

	/// Resolves a dotted path. Stepping through anything that is not an
	/// object yields `Undefined`.
	pub fn get_path(&self, path: &str) -> Value {
		let mut segments = path.split('.');
		let first = segments.next().unwrap_or_default();
		segments.fold(self.get(first), |current, segment| match current {
			Value::Object(object) => object.get(segment),
			_ => Value::Undefined,
		})
	}

	pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
		if is_reserved(name) {
			return Err(Error::ReservedName(name.to_owned()));
		}

		if let Some(PropertyDescriptor::Accessor(_)) = self.body.class.property(name) {
			return Err(Error::ReadOnly(name.to_owned()));
		}

		let value = value.into();
		let changed = {
			let mut fields = self.body.fields.borrow_mut();
			match fields.get_mut(name) {
				Some(current) if current.strict_eq(&value) => false,
				Some(current) => {
					*current = value;
					true
				}
				None => {
					fields.insert(Rc::from(name), value);
					true
				}
			}
		};

		if changed {
			self.notify(name);
		}

		Ok(())
	}

	pub(crate) fn hidden(&self, name: &str) -> Value {
		self.body
			.hidden
			.borrow()
			.get(name)
			.cloned()
			.unwrap_or_default()
	}

	/// Stores a hidden slot. Observers hear about it only when `notify` is
	/// set.
	pub(crate) fn set_hidden(&self, name: &str, value: Value, notify: bool) {
		self.body
			.hidden
			.borrow_mut()
			.insert(Rc::from(name), value);

		if notify {
			self.notify(name);
		}
	}

	/// Registers a callback that runs after every effective mutation with
	/// the name of the changed property.
	pub fn observe(&self, observer: impl Fn(&Object, &str) + 'static) -> ObserverId {
		let id = ObserverId(self.body.next_observer.get());
		self.body.next_observer.set(id.0 + 1);
		self.body
			.observers
			.borrow_mut()
			.push((id, Rc::new(observer)));
		id
	}

	pub fn unobserve(&self, id: ObserverId) {
		self.body
			.observers
			.borrow_mut()
			.retain(|(existing, _)| *existing != id);
	}

	fn notify(&self, name: &str) {
		let observers: Vec<Observer> = self
			.body
			.observers
			.borrow()
			.iter()
			.map(|(_, o)| o.clone())
			.collect();

		for observer in observers {
			observer(self, name);
		}
	}

	/// Per-instance state container of type `T`, created on first use and
	/// dropped together with the instance.
	pub fn extension<T: Default + 'static>(&self) -> Rc<T> {
		let existing = self
			.body
			.extensions
			.borrow_mut()
			.entry(TypeId::of::<T>())
			.or_insert_with(|| Rc::new(T::default()) as Rc<dyn Any>)
			.clone();

		match Rc::downcast::<T>(existing) {
			Ok(extension) => extension,
			Err(_) => unreachable!("extension table is keyed by TypeId"),
		}
	}

	pub(crate) fn downgrade(&self) -> WeakObject {
		WeakObject {
			body: Rc::downgrade(&self.body),
		}
	}
}

impl Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {{ .. }}", self.body.class.name)
	}
}

#[derive(Clone)]
pub(crate) struct WeakObject {
	body: Weak<ObjectBody>,
}

impl WeakObject {
	pub fn upgrade(&self) -> Option<Object> {
		self.body.upgrade().map(|body| Object { body })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn point() -> Rc<Class> {
		Class::new("Point")
			.field("x", 1)
			.and_then(|c| c.field("y", 2))
			.map(Class::build)
			.unwrap()
	}

	#[test]
	fn nested_paths() {
		let point = point();
		let outer = Class::new("Outer")
			.field("inner", Value::Undefined)
			.unwrap()
			.build();

		let object = Object::new(&outer);
		assert!(object.get_path("inner.x").is_undefined());
		assert!(object.get_path("inner.x.y.z").is_undefined());

		object.set("inner", Object::new(&point)).unwrap();
		assert_eq!(object.get_path("inner.x").as_number(), Some(1.0));
		assert!(object.get_path("inner.x.y").is_undefined());
		assert!(object.get_path("missing").is_undefined());
	}

	#[test]
	fn reserved_names_are_rejected() {
		let object = Object::new(&point());
		assert_eq!(
			object.set("@x", 1),
			Err(Error::ReservedName("@x".to_owned()))
		);
		assert!(Class::new("Bad").field("@y", 1).is_err());
	}

	#[test]
	fn observers_only_hear_effective_changes() {
		let object = Object::new(&point());
		let seen = Rc::new(RefCell::new(Vec::new()));

		let id = object.observe({
			let seen = seen.clone();
			move |_, name| seen.borrow_mut().push(name.to_owned())
		});

		object.set("x", 1).unwrap();
		object.set("x", 5).unwrap();
		object.set_hidden("@counter", Value::from(0), false);
		object.set_hidden("@counter", Value::from(1), true);
		object.unobserve(id);
		object.set("y", 10).unwrap();

		assert_eq!(*seen.borrow(), vec!["x".to_owned(), "@counter".to_owned()]);
	}

	#[test]
	fn extensions_are_per_instance() {
		let class = point();
		let a = Object::new(&class);
		let b = Object::new(&class);

		a.extension::<Cell<u32>>().set(7);
		assert_eq!(a.extension::<Cell<u32>>().get(), 7);
		assert_eq!(b.extension::<Cell<u32>>().get(), 0);
	}
}
