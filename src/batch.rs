use std::cell::{Cell, RefCell};
use std::rc::Weak;

use crate::binding::Reactive;

thread_local! {
	static STARTED: Cell<bool> = const { Cell::new(false) };
	static RUNNING: Cell<bool> = const { Cell::new(false) };
	static CHANGED: RefCell<Vec<Weak<dyn Reactive>>> = const { RefCell::new(Vec::new()) };
}

pub fn in_batch() -> bool {
	STARTED.with(Cell::get)
}

/// Runs `func`, holding back binding updates until the outermost batch
/// finishes.
pub fn batch(func: impl FnOnce()) {
	let is_root = batch_start();
	func();
	if is_root {
		batch_stop();
		batch_run();
	}
}

pub(crate) fn schedule(reactive: Weak<dyn Reactive>) {
	CHANGED.with(|changed| changed.borrow_mut().push(reactive));
	if !in_batch() {
		batch_run();
	}
}

fn batch_start() -> bool {
	STARTED.with(|started| !started.replace(true))
}

fn batch_stop() {
	STARTED.with(|started| started.set(false));
}

fn batch_run() {
	// A binding that changes state while being updated re-enters here; the
	// outer loop picks its work up.
	if RUNNING.with(|running| running.replace(true)) {
		return;
	}

	loop {
		let changed = CHANGED.with(|changed| std::mem::take(&mut *changed.borrow_mut()));
		if changed.is_empty() {
			break;
		}

		tracing::debug!(count = changed.len(), "flushing bindings");
		for reactive in changed {
			if let Some(reactive) = reactive.upgrade() {
				reactive.update();
			}
		}
	}

	RUNNING.with(|running| running.set(false));
}
