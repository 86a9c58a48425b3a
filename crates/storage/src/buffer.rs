// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use seqdb_type::{BlockNumber, ForkNumber, Lsn, RelFileLocator};
use tracing::{instrument, trace};

use crate::{page::Page, smgr::StorageManager};

/// Flushes the write-ahead log up to a position. Buffers call this before
/// writing a page so that no page reaches disk ahead of the log records
/// describing it.
pub trait WalFlush {
	fn flush_wal(&self, upto: Lsn) -> crate::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferTag {
	pub locator: RelFileLocator,
	pub fork: ForkNumber,
	pub block: BlockNumber,
}

/// A shared page image. The `RwLock` is the content lock: page bytes are
/// only read under the shared mode and only modified under the exclusive
/// mode.
#[derive(Debug)]
pub struct Buffer {
	tag: BufferTag,
	content: RwLock<Page>,
	dirty: AtomicBool,
}

impl Buffer {
	fn new(tag: BufferTag, page: Page) -> Self {
		Self {
			tag,
			content: RwLock::new(page),
			dirty: AtomicBool::new(false),
		}
	}

	pub fn tag(&self) -> BufferTag {
		self.tag
	}

	pub fn block(&self) -> BlockNumber {
		self.tag.block
	}

	pub fn lock_shared(&self) -> RwLockReadGuard<'_, Page> {
		self.content.read()
	}

	pub fn lock_exclusive(&self) -> RwLockWriteGuard<'_, Page> {
		self.content.write()
	}

	pub fn mark_dirty(&self) {
		self.dirty.store(true, Ordering::Release);
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty.load(Ordering::Acquire)
	}
}

/// Shared buffer pool. Buffers stay resident until their relation is
/// dropped; there is no eviction.
pub struct BufferPool {
	smgr: Arc<StorageManager>,
	buffers: DashMap<BufferTag, Arc<Buffer>>,
}

impl BufferPool {
	pub fn new(smgr: Arc<StorageManager>) -> Self {
		Self {
			smgr,
			buffers: DashMap::new(),
		}
	}

	pub fn smgr(&self) -> &Arc<StorageManager> {
		&self.smgr
	}

	pub fn read_buffer(
		&self,
		locator: RelFileLocator,
		fork: ForkNumber,
		block: BlockNumber,
	) -> crate::Result<Arc<Buffer>> {
		let tag = BufferTag {
			locator,
			fork,
			block,
		};

		if let Some(buffer) = self.buffers.get(&tag) {
			return Ok(buffer.value().clone());
		}

		let page = self.smgr.read(locator, fork, block)?;
		trace!(%locator, %fork, block, "loaded page");
		Ok(self.install(tag, page))
	}

	/// Extends the fork by one block and returns the new, zeroed buffer.
	pub fn extend(&self, locator: RelFileLocator, fork: ForkNumber) -> crate::Result<Arc<Buffer>> {
		let block = self.smgr.extend(locator, fork)?;
		let tag = BufferTag {
			locator,
			fork,
			block,
		};
		let buffer = Arc::new(Buffer::new(tag, Page::new()));
		self.buffers.insert(tag, buffer.clone());
		Ok(buffer)
	}

	/// Returns the buffer for a block referenced by a WAL record, creating
	/// the fork and extending it with zeroed blocks as needed. Replay always
	/// overwrites the returned page completely.
	pub fn read_buffer_for_redo(
		&self,
		locator: RelFileLocator,
		fork: ForkNumber,
		block: BlockNumber,
	) -> crate::Result<Arc<Buffer>> {
		self.smgr.create(locator, fork, true)?;
		while self.smgr.nblocks(locator, fork)? <= block {
			self.smgr.extend(locator, fork)?;
		}

		let tag = BufferTag {
			locator,
			fork,
			block,
		};
		if let Some(buffer) = self.buffers.get(&tag) {
			return Ok(buffer.value().clone());
		}

		let page = match self.smgr.read(locator, fork, block) {
			Ok(page) => page,
			Err(_) => Page::new(),
		};
		Ok(self.install(tag, page))
	}

	fn install(&self, tag: BufferTag, page: Page) -> Arc<Buffer> {
		self.buffers.entry(tag).or_insert_with(|| Arc::new(Buffer::new(tag, page))).value().clone()
	}

	pub fn flush_buffer(&self, buffer: &Buffer, wal: &dyn WalFlush) -> crate::Result<()> {
		let page = buffer.lock_shared();
		if !buffer.is_dirty() {
			return Ok(());
		}
		wal.flush_wal(page.lsn())?;
		let tag = buffer.tag();
		self.smgr.write(tag.locator, tag.fork, tag.block, &page)?;
		buffer.dirty.store(false, Ordering::Release);
		Ok(())
	}

	pub fn flush_fork(&self, locator: RelFileLocator, fork: ForkNumber, wal: &dyn WalFlush) -> crate::Result<()> {
		for buffer in self.collect(|tag| tag.locator == locator && tag.fork == fork) {
			self.flush_buffer(&buffer, wal)?;
		}
		Ok(())
	}

	pub fn flush_relation(&self, locator: RelFileLocator, wal: &dyn WalFlush) -> crate::Result<()> {
		for buffer in self.collect(|tag| tag.locator == locator) {
			self.flush_buffer(&buffer, wal)?;
		}
		Ok(())
	}

	/// Writes every dirty buffer. Returns the number of pages written.
	#[instrument(name = "storage::buffer::flush_all", level = "debug", skip_all)]
	pub fn flush_all(&self, wal: &dyn WalFlush) -> crate::Result<usize> {
		let mut written = 0;
		for buffer in self.collect(|_| true) {
			if buffer.is_dirty() {
				self.flush_buffer(&buffer, wal)?;
				written += 1;
			}
		}
		Ok(written)
	}

	/// Forgets every buffer of the relation without writing it.
	pub fn drop_relation(&self, locator: RelFileLocator) {
		self.buffers.retain(|tag, _| tag.locator != locator);
	}

	pub fn drop_fork(&self, locator: RelFileLocator, fork: ForkNumber) {
		self.buffers.retain(|tag, _| !(tag.locator == locator && tag.fork == fork));
	}

	pub fn dirty_count(&self) -> usize {
		self.buffers.iter().filter(|entry| entry.value().is_dirty()).count()
	}

	fn collect(&self, filter: impl Fn(&BufferTag) -> bool) -> Vec<Arc<Buffer>> {
		let mut buffers: Vec<Arc<Buffer>> = self
			.buffers
			.iter()
			.filter(|entry| filter(entry.key()))
			.map(|entry| entry.value().clone())
			.collect();
		buffers.sort_by_key(|buffer| (buffer.tag.locator, buffer.tag.fork, buffer.tag.block));
		buffers
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use parking_lot::Mutex;
	use seqdb_type::{ForkNumber, Lsn, RelFileLocator, RelFileNumber};

	use super::{BufferPool, WalFlush};
	use crate::{
		page::INVALID_OFFSET_NUMBER,
		smgr::StorageManager,
	};

	#[derive(Default)]
	struct RecordingWal {
		flushes: Mutex<Vec<Lsn>>,
	}

	impl WalFlush for RecordingWal {
		fn flush_wal(&self, upto: Lsn) -> crate::Result<()> {
			self.flushes.lock().push(upto);
			Ok(())
		}
	}

	fn locator() -> RelFileLocator {
		RelFileLocator::new(5, RelFileNumber(20000))
	}

	#[test]
	fn test_extend_and_flush_respects_wal() {
		let smgr = Arc::new(StorageManager::new());
		smgr.create(locator(), ForkNumber::Main, false).unwrap();
		let pool = BufferPool::new(smgr.clone());
		let wal = RecordingWal::default();

		let buffer = pool.extend(locator(), ForkNumber::Main).unwrap();
		{
			let mut page = buffer.lock_exclusive();
			page.init(4);
			page.add_item(b"seq", INVALID_OFFSET_NUMBER).unwrap();
			page.set_lsn(Lsn(128));
		}
		buffer.mark_dirty();
		assert_eq!(pool.dirty_count(), 1);

		assert!(smgr.read(locator(), ForkNumber::Main, 0).unwrap().is_new());

		assert_eq!(pool.flush_all(&wal).unwrap(), 1);
		assert_eq!(*wal.flushes.lock(), vec![Lsn(128)]);
		assert_eq!(pool.dirty_count(), 0);
		assert_eq!(smgr.read(locator(), ForkNumber::Main, 0).unwrap().item(1).unwrap(), b"seq");
	}

	#[test]
	fn test_read_buffer_is_shared() {
		let smgr = Arc::new(StorageManager::new());
		smgr.create(locator(), ForkNumber::Main, false).unwrap();
		let pool = BufferPool::new(smgr);

		pool.extend(locator(), ForkNumber::Main).unwrap();
		let first = pool.read_buffer(locator(), ForkNumber::Main, 0).unwrap();
		let second = pool.read_buffer(locator(), ForkNumber::Main, 0).unwrap();
		assert!(Arc::ptr_eq(&first, &second));

		pool.drop_relation(locator());
		let third = pool.read_buffer(locator(), ForkNumber::Main, 0).unwrap();
		assert!(!Arc::ptr_eq(&first, &third));
	}

	#[test]
	fn test_redo_buffer_creates_fork() {
		let smgr = Arc::new(StorageManager::new());
		let pool = BufferPool::new(smgr.clone());

		let buffer = pool.read_buffer_for_redo(locator(), ForkNumber::Init, 0).unwrap();
		assert!(buffer.lock_shared().is_new());
		assert_eq!(smgr.nblocks(locator(), ForkNumber::Init).unwrap(), 1);
	}
}
