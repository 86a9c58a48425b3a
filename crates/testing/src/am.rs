// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use seqdb_engine::{
	Database, Relation,
	sequence::{NextValue, SequenceAccessMethod, SequenceLimits, local::LocalSequenceAm},
};
use seqdb_type::Persistence;

/// The local engine, counting how often `nextval` reaches it.
pub struct CountingSequenceAm {
	inner: LocalSequenceAm,
	calls: Arc<AtomicUsize>,
}

impl CountingSequenceAm {
	pub fn new(calls: Arc<AtomicUsize>) -> Self {
		Self {
			inner: LocalSequenceAm,
			calls,
		}
	}
}

impl SequenceAccessMethod for CountingSequenceAm {
	fn get_table_am(&self) -> &'static str {
		self.inner.get_table_am()
	}

	fn init(&self, rel: &mut Relation<'_>, last_value: i64, is_called: bool) -> seqdb_type::Result<()> {
		self.inner.init(rel, last_value, is_called)
	}

	fn nextval(&self, rel: &mut Relation<'_>, limits: &SequenceLimits) -> seqdb_type::Result<NextValue> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.nextval(rel, limits)
	}

	fn setval(&self, rel: &mut Relation<'_>, next: i64, is_called: bool) -> seqdb_type::Result<()> {
		self.inner.setval(rel, next, is_called)
	}

	fn reset(&self, rel: &mut Relation<'_>, start: i64, is_called: bool, reset_state: bool) -> seqdb_type::Result<()> {
		self.inner.reset(rel, start, is_called, reset_state)
	}

	fn get_state(&self, rel: &Relation<'_>) -> seqdb_type::Result<(i64, bool)> {
		self.inner.get_state(rel)
	}

	fn change_persistence(&self, rel: &mut Relation<'_>, persistence: Persistence) -> seqdb_type::Result<()> {
		self.inner.change_persistence(rel, persistence)
	}
}

/// Registers a counting handler under `handler` and returns the counter
/// shared by every routine it produces.
pub fn register_counting_am(db: &Database, handler: &str) -> Arc<AtomicUsize> {
	let calls = Arc::new(AtomicUsize::new(0));
	let shared = calls.clone();
	db.register_sequence_am_handler(
		handler,
		Arc::new(move || Some(Arc::new(CountingSequenceAm::new(shared.clone())) as Arc<dyn SequenceAccessMethod>)),
	);
	calls
}
