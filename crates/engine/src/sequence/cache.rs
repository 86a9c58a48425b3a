// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use seqdb_type::{RelFileNumber, RelationId};
use tracing::trace;

/// Per-session state of one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqCacheEntry {
	pub relid: RelationId,
	/// Storage the cached values came from. A different file means the
	/// sequence was reset and the cached values are void.
	pub filenumber: RelFileNumber,
	/// Local transaction that last locked the sequence.
	pub lxid: Option<u64>,
	/// `last` holds a value returned by `nextval` or set by `setval`.
	pub last_valid: bool,
	pub last: i64,
	/// Last value of the fetched batch; `last == cached` means the batch is
	/// used up.
	pub cached: i64,
	pub increment: i64,
}

impl SeqCacheEntry {
	fn new(relid: RelationId) -> Self {
		Self {
			relid,
			filenumber: RelFileNumber(0),
			lxid: None,
			last_valid: false,
			last: 0,
			cached: 0,
			increment: 0,
		}
	}

	pub fn has_cached_values(&self) -> bool {
		self.last != self.cached
	}
}

/// Sequence values a session fetched ahead, plus the sequence `lastval`
/// reports on.
#[derive(Debug, Default)]
pub struct SequenceCache {
	entries: HashMap<RelationId, SeqCacheEntry>,
	last_used: Option<RelationId>,
}

impl SequenceCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, relid: RelationId) -> Option<&SeqCacheEntry> {
		self.entries.get(&relid)
	}

	pub fn entry(&mut self, relid: RelationId) -> &mut SeqCacheEntry {
		self.entries.entry(relid).or_insert_with(|| SeqCacheEntry::new(relid))
	}

	/// Drops cached values fetched from storage the sequence no longer uses.
	pub fn sync_filenumber(&mut self, relid: RelationId, filenumber: RelFileNumber) {
		let entry = self.entry(relid);
		if entry.filenumber != filenumber {
			trace!(%relid, %filenumber, "sequence storage changed, dropping cached values");
			entry.filenumber = filenumber;
			entry.cached = entry.last;
		}
	}

	pub fn last_used(&self) -> Option<RelationId> {
		self.last_used
	}

	pub fn set_last_used(&mut self, relid: RelationId) {
		self.last_used = Some(relid);
	}

	/// Forgets sequences dropped by a committed transaction. `lastval` keeps
	/// pointing at a dropped sequence and reports it as undefined.
	pub fn forget(&mut self, relids: &[RelationId]) {
		for relid in relids {
			self.entries.remove(relid);
		}
	}

	/// `DISCARD SEQUENCES`: forgets every entry and `lastval`.
	pub fn discard(&mut self) {
		self.entries.clear();
		self.last_used = None;
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use seqdb_type::{Oid, RelFileNumber, RelationId};

	use super::SequenceCache;

	#[test]
	fn test_new_storage_voids_cached_values() {
		let relid = RelationId(Oid(16384));
		let mut cache = SequenceCache::new();
		cache.sync_filenumber(relid, RelFileNumber(16384));

		let entry = cache.entry(relid);
		entry.last = 5;
		entry.cached = 10;
		assert!(entry.has_cached_values());

		cache.sync_filenumber(relid, RelFileNumber(16384));
		assert!(cache.get(relid).unwrap().has_cached_values());

		cache.sync_filenumber(relid, RelFileNumber(16400));
		let entry = cache.get(relid).unwrap();
		assert!(!entry.has_cached_values());
		assert_eq!(entry.last, 5);
	}

	#[test]
	fn test_discard() {
		let relid = RelationId(Oid(16384));
		let mut cache = SequenceCache::new();
		cache.entry(relid).last_valid = true;
		cache.set_last_used(relid);
		assert_eq!(cache.len(), 1);

		cache.discard();
		assert!(cache.is_empty());
		assert_eq!(cache.last_used(), None);
	}

	#[test]
	fn test_forget_dropped_sequences() {
		let dropped = RelationId(Oid(16384));
		let kept = RelationId(Oid(16390));
		let mut cache = SequenceCache::new();
		cache.entry(dropped).last = 3;
		cache.entry(kept).last = 7;
		cache.set_last_used(dropped);

		cache.forget(&[dropped]);
		assert_eq!(cache.len(), 1);
		assert!(cache.get(dropped).is_none());
		assert_eq!(cache.get(kept).unwrap().last, 7);
		assert_eq!(cache.last_used(), Some(dropped));
	}
}
