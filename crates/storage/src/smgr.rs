// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use seqdb_type::{BlockNumber, ForkNumber, RelFileLocator};
use tracing::{debug, instrument};

use crate::{
	error::StorageError,
	page::{BLCKSZ, Page},
};

type FileKey = (RelFileLocator, ForkNumber);

/// Contents of every fork as last written to disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageImage {
	files: BTreeMap<FileKey, Vec<Box<[u8]>>>,
}

impl StorageImage {
	pub fn contains(&self, locator: RelFileLocator, fork: ForkNumber) -> bool {
		self.files.contains_key(&(locator, fork))
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}
}

/// Storage manager: owns the forks of every relation file. Pages only
/// reach it through buffer writes, so its contents are what survives a
/// crash.
#[derive(Debug, Default)]
pub struct StorageManager {
	files: RwLock<BTreeMap<FileKey, Vec<Box<[u8]>>>>,
}

impl StorageManager {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_image(image: StorageImage) -> Self {
		Self {
			files: RwLock::new(image.files),
		}
	}

	pub fn image(&self) -> StorageImage {
		StorageImage {
			files: self.files.read().clone(),
		}
	}

	/// Creates an empty fork. During redo an existing fork is accepted.
	#[instrument(name = "storage::smgr::create", level = "trace", skip(self))]
	pub fn create(&self, locator: RelFileLocator, fork: ForkNumber, is_redo: bool) -> crate::Result<()> {
		let mut files = self.files.write();
		if files.contains_key(&(locator, fork)) {
			if is_redo {
				return Ok(());
			}
			return Err(StorageError::ForkExists {
				locator,
				fork,
			}
			.into());
		}
		files.insert((locator, fork), Vec::new());
		debug!(%locator, %fork, "created fork");
		Ok(())
	}

	pub fn exists(&self, locator: RelFileLocator, fork: ForkNumber) -> bool {
		self.files.read().contains_key(&(locator, fork))
	}

	pub fn nblocks(&self, locator: RelFileLocator, fork: ForkNumber) -> crate::Result<BlockNumber> {
		match self.files.read().get(&(locator, fork)) {
			Some(blocks) => Ok(blocks.len() as BlockNumber),
			None => Err(StorageError::ForkNotFound {
				locator,
				fork,
			}
			.into()),
		}
	}

	pub fn read(&self, locator: RelFileLocator, fork: ForkNumber, block: BlockNumber) -> crate::Result<Page> {
		let files = self.files.read();
		let blocks = files.get(&(locator, fork)).ok_or(StorageError::ForkNotFound {
			locator,
			fork,
		})?;

		let bytes = blocks.get(block as usize).ok_or(StorageError::BlockOutOfRange {
			locator,
			fork,
			block,
			nblocks: blocks.len() as BlockNumber,
		})?;

		let page = Page::from_bytes(bytes)?;
		if !page.verify_checksum(block) {
			return Err(StorageError::ChecksumMismatch {
				locator,
				fork,
				block,
				expected: page.checksum(),
				actual: page.compute_checksum(block),
			}
			.into());
		}
		Ok(page)
	}

	/// Writes a page at an existing block, or at the block just past the
	/// end of the fork.
	pub fn write(
		&self,
		locator: RelFileLocator,
		fork: ForkNumber,
		block: BlockNumber,
		page: &Page,
	) -> crate::Result<()> {
		let mut stored = page.clone();
		if !stored.is_new() {
			let checksum = stored.compute_checksum(block);
			stored.set_checksum(checksum);
		}

		let mut files = self.files.write();
		let blocks = files.get_mut(&(locator, fork)).ok_or(StorageError::ForkNotFound {
			locator,
			fork,
		})?;

		let index = block as usize;
		if index < blocks.len() {
			blocks[index].copy_from_slice(stored.as_bytes());
		} else if index == blocks.len() {
			blocks.push(stored.as_bytes().to_vec().into_boxed_slice());
		} else {
			return Err(StorageError::BlockOutOfRange {
				locator,
				fork,
				block,
				nblocks: blocks.len() as BlockNumber,
			}
			.into());
		}
		Ok(())
	}

	/// Appends a zeroed block and returns its number.
	pub fn extend(&self, locator: RelFileLocator, fork: ForkNumber) -> crate::Result<BlockNumber> {
		let mut files = self.files.write();
		let blocks = files.get_mut(&(locator, fork)).ok_or(StorageError::ForkNotFound {
			locator,
			fork,
		})?;
		blocks.push(vec![0u8; BLCKSZ].into_boxed_slice());
		Ok((blocks.len() - 1) as BlockNumber)
	}

	/// Replaces `to` with a copy of `from`.
	pub fn copy_fork(&self, locator: RelFileLocator, from: ForkNumber, to: ForkNumber) -> crate::Result<()> {
		let mut files = self.files.write();
		let blocks = files
			.get(&(locator, from))
			.ok_or(StorageError::ForkNotFound {
				locator,
				fork: from,
			})?
			.clone();
		files.insert((locator, to), blocks);
		Ok(())
	}

	#[instrument(name = "storage::smgr::unlink", level = "trace", skip(self))]
	pub fn unlink(&self, locator: RelFileLocator) {
		self.files.write().retain(|(l, _), _| *l != locator);
	}

	pub fn unlink_fork(&self, locator: RelFileLocator, fork: ForkNumber) {
		self.files.write().remove(&(locator, fork));
	}

	pub fn locators(&self) -> BTreeSet<RelFileLocator> {
		self.files.read().keys().map(|(locator, _)| *locator).collect()
	}
}

#[cfg(test)]
mod tests {
	use seqdb_type::{ForkNumber, RelFileLocator, RelFileNumber};

	use super::StorageManager;
	use crate::page::{INVALID_OFFSET_NUMBER, Page};

	fn locator() -> RelFileLocator {
		RelFileLocator::new(5, RelFileNumber(16384))
	}

	#[test]
	fn test_create_twice() {
		let smgr = StorageManager::new();
		smgr.create(locator(), ForkNumber::Main, false).unwrap();
		assert!(smgr.create(locator(), ForkNumber::Main, false).is_err());
		smgr.create(locator(), ForkNumber::Main, true).unwrap();
	}

	#[test]
	fn test_write_read() {
		let smgr = StorageManager::new();
		smgr.create(locator(), ForkNumber::Main, false).unwrap();
		assert_eq!(smgr.extend(locator(), ForkNumber::Main).unwrap(), 0);

		let mut page = Page::new();
		page.init(4);
		page.add_item(b"abc", INVALID_OFFSET_NUMBER).unwrap();
		smgr.write(locator(), ForkNumber::Main, 0, &page).unwrap();

		let read = smgr.read(locator(), ForkNumber::Main, 0).unwrap();
		assert_eq!(read.item(1).unwrap(), b"abc");
		assert!(smgr.read(locator(), ForkNumber::Main, 1).is_err());
		assert!(smgr.read(locator(), ForkNumber::Init, 0).is_err());
	}

	#[test]
	fn test_new_page_reads_back() {
		let smgr = StorageManager::new();
		smgr.create(locator(), ForkNumber::Init, false).unwrap();
		smgr.extend(locator(), ForkNumber::Init).unwrap();
		assert!(smgr.read(locator(), ForkNumber::Init, 0).unwrap().is_new());
	}

	#[test]
	fn test_copy_and_unlink() {
		let smgr = StorageManager::new();
		smgr.create(locator(), ForkNumber::Init, false).unwrap();
		smgr.extend(locator(), ForkNumber::Init).unwrap();

		smgr.copy_fork(locator(), ForkNumber::Init, ForkNumber::Main).unwrap();
		assert_eq!(smgr.nblocks(locator(), ForkNumber::Main).unwrap(), 1);

		let image = smgr.image();
		smgr.unlink(locator());
		assert!(!smgr.exists(locator(), ForkNumber::Main));
		assert!(!smgr.exists(locator(), ForkNumber::Init));
		assert!(image.contains(locator(), ForkNumber::Init));
	}
}
