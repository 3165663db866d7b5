use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::batch::schedule;
use crate::object::{Object, ObserverId};
use crate::value::Value;

pub trait Reactive {
	fn update(&self);
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum State {
	Valid,
	Invalid,
}

/// Keeps a handler in sync with one property of an instance, the way a
/// view binding would: it re-reads the property whenever a property named
/// by the first segment of one of the getter's dependency paths changes.
#[derive(Clone)]
pub struct Binding {
	body: Rc<BindingBody>,
}

struct BindingBody {
	inner: RefCell<BindingInner>,
}

struct BindingInner {
	object: Object,
	property: Rc<str>,
	handler: Rc<dyn Fn(&Value)>,
	state: State,
	observer: Option<ObserverId>,
}

impl Drop for BindingInner {
	fn drop(&mut self) {
		if let Some(id) = self.observer.take() {
			self.object.unobserve(id);
		}
	}
}

impl Binding {
	#[must_use]
	pub fn new(object: &Object, property: &str, handler: impl Fn(&Value) + 'static) -> Self {
		let watched: SmallVec<[Rc<str>; 4]> = match object.class().property(property) {
			Some(descriptor) => match descriptor.getter() {
				Some(getter) => getter
					.dependencies()
					.iter()
					.map(|path| Rc::from(path.split('.').next().unwrap_or_default()))
					.collect(),
				None => smallvec::smallvec![Rc::from(property)],
			},
			None => smallvec::smallvec![Rc::from(property)],
		};

		let body = Rc::new_cyclic(|this: &Weak<BindingBody>| {
			let this = this.clone();
			let observer = object.observe(move |_, name| {
				if watched.iter().any(|w| &**w == name) {
					if let Some(body) = this.upgrade() {
						body.invalidate();
					}
				}
			});

			BindingBody {
				inner: RefCell::new(BindingInner {
					object: object.clone(),
					property: Rc::from(property),
					handler: Rc::new(handler),
					state: State::Invalid,
					observer: Some(observer),
				}),
			}
		});

		Binding { body }
	}

	/// Reads the property and hands it to the handler unconditionally.
	pub fn update(&self) {
		self.body.run();
	}
}

impl BindingBody {
	fn run(&self) {
		let (object, property, handler) = {
			let mut inner = self.inner.borrow_mut();
			inner.state = State::Valid;
			(inner.object.clone(), inner.property.clone(), inner.handler.clone())
		};

		let value = object.get(&property);
		handler(&value);
	}

	fn invalidate(self: Rc<Self>) {
		let mut inner = self.inner.borrow_mut();
		if inner.state == State::Valid {
			inner.state = State::Invalid;
			std::mem::drop(inner);
			schedule(Rc::downgrade(&self) as Weak<dyn Reactive>);
		}
	}
}

impl Reactive for BindingBody {
	fn update(&self) {
		if self.inner.borrow().state == State::Invalid {
			self.run();
		}
	}
}
