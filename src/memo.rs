use std::cell::RefCell;
use std::rc::Rc;

use fxhash::FxHashMap;
use smallvec::SmallVec;

use crate::descriptor::Getter;
use crate::object::Object;
use crate::value::Value;

type Snapshot = SmallVec<[Value; 4]>;

/// Memoization records of one instance, one per memoized property.
#[derive(Default)]
pub(crate) struct MemoTable {
	records: RefCell<FxHashMap<Rc<str>, Rc<RefCell<MemoRecord>>>>,
}

impl MemoTable {
	fn record(&self, name: &Rc<str>) -> Rc<RefCell<MemoRecord>> {
		self.records
			.borrow_mut()
			.entry(name.clone())
			.or_default()
			.clone()
	}
}

#[derive(Default)]
struct MemoRecord {
	/// Dependency values sampled on the last recompute, aligned with the
	/// getter's dependency list.
	snapshot: Snapshot,
	/// `None` until the getter ran once.
	result: Option<Value>,
}

impl MemoRecord {
	fn cached(&self, sampled: &Snapshot) -> Option<Value> {
		let result = self.result.as_ref()?;
		let unchanged = self.snapshot.len() == sampled.len()
			&& self
				.snapshot
				.iter()
				.zip(sampled.iter())
				.all(|(prev, next)| prev.strict_eq(next));

		unchanged.then(|| result.clone())
	}
}

/// Wraps `getter` so that it only runs again when one of its declared
/// dependency paths reads a value that is not strictly equal to the value
/// seen on the previous run. The dependency list is left as is.
pub fn memoize(name: &str, getter: Getter) -> Getter {
	let name: Rc<str> = Rc::from(name);
	let dependencies = getter.dependencies().iter().cloned().collect();
	let paths: SmallVec<[Rc<str>; 4]> = getter.dependencies().iter().cloned().collect();

	Getter::from_parts(
		move |object: &Object| {
			let record = object.extension::<MemoTable>().record(&name);
			let sampled: Snapshot = paths.iter().map(|path| object.get_path(path)).collect();

			let cached = record.borrow().cached(&sampled);
			if let Some(value) = cached {
				tracing::trace!(property = %name, "memoized getter hit");
				return value;
			}

			tracing::trace!(property = %name, "memoized getter recompute");
			let value = getter.call(object);

			let mut record = record.borrow_mut();
			record.snapshot = sampled;
			record.result = Some(value.clone());
			value
		},
		dependencies,
	)
}
