//! An asynchronous value whose settlement can be inspected synchronously.
//!
//! Rust futures only report readiness to whoever polls them. The binding
//! layer needs to ask "is it done yet, and with what?" from inside a plain
//! getter, so a [`Promise`] records its own state and runs registered
//! continuations the moment it settles.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use smallvec::SmallVec;

use crate::value::Value;

pub type Outcome = Result<Value, Value>;

#[derive(Clone, Debug)]
pub enum PromiseState {
	Pending,
	Fulfilled(Value),
	Rejected(Value),
}

type Continuation = Box<dyn FnOnce(&Outcome)>;

#[derive(Clone)]
pub struct Promise {
	body: Rc<PromiseBody>,
}

struct PromiseBody {
	inner: RefCell<PromiseInner>,
}

struct PromiseInner {
	state: PromiseState,
	continuations: SmallVec<[Continuation; 1]>,
	handled: bool,
}

impl Drop for PromiseInner {
	fn drop(&mut self) {
		if let PromiseState::Rejected(reason) = &self.state {
			if !self.handled {
				tracing::warn!(%reason, "unhandled promise rejection");
			}
		}
	}
}

impl Promise {
	pub fn new() -> (Promise, Resolver) {
		let promise = Promise::with_state(PromiseState::Pending);
		let resolver = Resolver {
			promise: Some(promise.clone()),
		};
		(promise, resolver)
	}

	pub fn resolved(value: impl Into<Value>) -> Promise {
		Promise::with_state(PromiseState::Fulfilled(value.into()))
	}

	pub fn rejected(reason: impl Into<Value>) -> Promise {
		Promise::with_state(PromiseState::Rejected(reason.into()))
	}

	fn with_state(state: PromiseState) -> Promise {
		Promise {
			body: Rc::new(PromiseBody {
				inner: RefCell::new(PromiseInner {
					state,
					continuations: SmallVec::new(),
					handled: false,
				}),
			}),
		}
	}

	/// Tracks `future` as a promise. The returned driver has to be spawned
	/// on the caller's executor; it settles the promise when `future`
	/// completes.
	pub fn from_future<F>(future: F) -> (Promise, impl Future<Output = ()>)
	where
		F: Future<Output = Outcome> + 'static,
	{
		let (promise, resolver) = Promise::new();
		let driver = async move {
			match future.await {
				Ok(value) => resolver.resolve(value),
				Err(reason) => resolver.reject(reason),
			}
		};
		(promise, driver)
	}

	#[inline]
	pub fn ptr_eq(&self, other: &Promise) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}

	pub fn state(&self) -> PromiseState {
		self.body.inner.borrow().state.clone()
	}

	pub fn is_pending(&self) -> bool {
		matches!(self.body.inner.borrow().state, PromiseState::Pending)
	}

	pub fn is_fulfilled(&self) -> bool {
		matches!(self.body.inner.borrow().state, PromiseState::Fulfilled(_))
	}

	pub fn is_rejected(&self) -> bool {
		matches!(self.body.inner.borrow().state, PromiseState::Rejected(_))
	}

	pub fn value(&self) -> Option<Value> {
		match &self.body.inner.borrow().state {
			PromiseState::Fulfilled(value) => Some(value.clone()),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<Value> {
		match &self.body.inner.borrow().state {
			PromiseState::Rejected(reason) => Some(reason.clone()),
			_ => None,
		}
	}

	/// Whether anyone has attached a continuation, which also counts as
	/// handling a rejection.
	pub fn is_handled(&self) -> bool {
		self.body.inner.borrow().handled
	}

	/// Treats a rejection as observed without attaching a continuation.
	pub(crate) fn mark_handled(&self) {
		self.body.inner.borrow_mut().handled = true;
	}

	/// Runs `func` once the promise settles either way, or right away if it
	/// already has.
	pub fn on_settled(&self, func: impl FnOnce(&Outcome) + 'static) {
		let outcome = {
			let mut inner = self.body.inner.borrow_mut();
			inner.handled = true;
			match &inner.state {
				PromiseState::Pending => {
					inner.continuations.push(Box::new(func));
					return;
				}
				PromiseState::Fulfilled(value) => Ok(value.clone()),
				PromiseState::Rejected(reason) => Err(reason.clone()),
			}
		};

		func(&outcome)
	}

	/// Waits for settlement.
	pub fn settled(&self) -> impl Future<Output = Outcome> {
		let (tx, rx) = oneshot::channel();
		self.on_settled(move |outcome| {
			let _ = tx.send(outcome.clone());
		});

		async move {
			rx.await
				.unwrap_or_else(|_| Err(Value::error("promise dropped while pending")))
		}
	}

	fn settle(&self, outcome: Outcome) {
		let continuations = {
			let mut inner = self.body.inner.borrow_mut();
			if !matches!(inner.state, PromiseState::Pending) {
				return;
			}

			inner.state = match &outcome {
				Ok(value) => PromiseState::Fulfilled(value.clone()),
				Err(reason) => PromiseState::Rejected(reason.clone()),
			};

			std::mem::take(&mut inner.continuations)
		};

		for continuation in continuations {
			continuation(&outcome);
		}
	}
}

impl Debug for Promise {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.body.inner.borrow().state {
			PromiseState::Pending => f.write_str("Promise { <pending> }"),
			PromiseState::Fulfilled(value) => write!(f, "Promise {{ {:?} }}", value),
			PromiseState::Rejected(reason) => write!(f, "Promise {{ <rejected> {:?} }}", reason),
		}
	}
}

/// The settling half of a [`Promise`]. Dropping it unsettled rejects the
/// promise.
pub struct Resolver {
	promise: Option<Promise>,
}

impl Resolver {
	pub fn resolve(mut self, value: impl Into<Value>) {
		if let Some(promise) = self.promise.take() {
			promise.settle(Ok(value.into()));
		}
	}

	pub fn reject(mut self, reason: impl Into<Value>) {
		if let Some(promise) = self.promise.take() {
			promise.settle(Err(reason.into()));
		}
	}
}

impl Drop for Resolver {
	fn drop(&mut self) {
		if let Some(promise) = self.promise.take() {
			promise.settle(Err(Value::error("promise resolver dropped")));
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use futures::executor::LocalPool;
	use futures::task::LocalSpawnExt;

	use super::*;

	#[test]
	fn settles_once() {
		let (promise, resolver) = Promise::new();
		assert!(promise.is_pending());

		resolver.resolve("ok");
		assert!(promise.is_fulfilled());
		assert_eq!(promise.value().unwrap().as_str(), Some("ok"));
		assert!(promise.error().is_none());
	}

	#[test]
	fn continuations_run_in_order_after_state_is_recorded() {
		let (promise, resolver) = Promise::new();
		let log = Rc::new(RefCell::new(Vec::new()));

		for i in 0..3 {
			let log = log.clone();
			let seen = promise.clone();
			promise.on_settled(move |outcome| {
				assert!(seen.is_rejected());
				assert!(outcome.is_err());
				log.borrow_mut().push(i);
			});
		}

		resolver.reject(Value::error("x"));
		assert_eq!(*log.borrow(), vec![0, 1, 2]);
	}

	#[test]
	fn late_continuation_runs_immediately() {
		let promise = Promise::resolved(1);
		let ran = Rc::new(Cell::new(false));
		promise.on_settled({
			let ran = ran.clone();
			move |outcome| ran.set(outcome.as_ref().map_or(false, |v| v.as_number() == Some(1.0)))
		});
		assert!(ran.get());
		assert!(promise.is_handled());
	}

	#[test]
	fn dropped_resolver_rejects() {
		let (promise, resolver) = Promise::new();
		drop(resolver);
		assert!(promise.is_rejected());
	}

	#[test]
	fn tracks_future() {
		let mut pool = LocalPool::new();
		let (gate, open) = oneshot::channel::<()>();

		let (promise, driver) = Promise::from_future(async move {
			let _ = open.await;
			Ok(Value::from("done"))
		});
		pool.spawner().spawn_local(driver).unwrap();

		pool.run_until_stalled();
		assert!(promise.is_pending());

		gate.send(()).unwrap();
		pool.run_until_stalled();
		assert_eq!(promise.value().unwrap().as_str(), Some("done"));

		let outcome = pool.run_until(promise.settled());
		assert_eq!(outcome.unwrap().as_str(), Some("done"));
	}
}
