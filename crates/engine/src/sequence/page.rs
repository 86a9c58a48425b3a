// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Single page layout shared by the sequence engines: one frozen heap tuple
//! at offset 1 and a four byte magic number in the special area.

use seqdb_storage::{
	Buffer, Page,
	page::FIRST_OFFSET_NUMBER,
	tuple::{clear_stale_xmax, tuple_data, tuple_data_mut},
};

use crate::error::SequenceError;

pub const SEQ_SPECIAL_SIZE: usize = 4;

pub fn init_page(page: &mut Page, magic: u32) {
	page.init(SEQ_SPECIAL_SIZE);
	page.special_mut()[..SEQ_SPECIAL_SIZE].copy_from_slice(&magic.to_le_bytes());
}

pub fn page_magic(page: &Page) -> u32 {
	if page.is_new() {
		return 0;
	}
	let special = page.special();
	if special.len() < SEQ_SPECIAL_SIZE {
		return 0;
	}
	u32::from_le_bytes([special[0], special[1], special[2], special[3]])
}

/// Checks the magic number of a locked sequence page and clears a stale
/// xmax on its tuple. Clearing is a hint: the buffer is dirtied but nothing
/// is logged.
pub fn verify_seq_page(name: &str, buffer: &Buffer, page: &mut Page, magic: u32) -> crate::Result<()> {
	let found = page_magic(page);
	if found != magic {
		return Err(SequenceError::BadMagic {
			name: name.to_string(),
			magic: found,
		}
		.into());
	}

	if clear_stale_xmax(page.item_mut(FIRST_OFFSET_NUMBER)?)? {
		buffer.mark_dirty();
	}
	Ok(())
}

pub fn seq_tuple_data(page: &Page) -> crate::Result<&[u8]> {
	tuple_data(page.item(FIRST_OFFSET_NUMBER)?)
}

pub fn seq_tuple_data_mut(page: &mut Page) -> crate::Result<&mut [u8]> {
	tuple_data_mut(page.item_mut(FIRST_OFFSET_NUMBER)?)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use seqdb_storage::{BufferPool, HeapTuple, Page, StorageManager, page::INVALID_OFFSET_NUMBER};
	use seqdb_type::{ForkNumber, RelFileLocator, RelFileNumber, TransactionId};

	use super::*;

	#[test]
	fn test_magic_round_trip() {
		let mut page = Page::new();
		assert_eq!(page_magic(&page), 0);

		init_page(&mut page, 0x1717);
		assert_eq!(page_magic(&page), 0x1717);
		assert_eq!(page.special().len(), 8);
	}

	#[test]
	fn test_verify_rejects_foreign_magic() {
		let pool = BufferPool::new(Arc::new(StorageManager::new()));
		let locator = RelFileLocator::new(5, RelFileNumber(16390));
		pool.smgr().create(locator, ForkNumber::Main, false).unwrap();
		let buffer = pool.extend(locator, ForkNumber::Main).unwrap();

		let mut page = buffer.lock_exclusive();
		init_page(&mut page, 0x01);
		page.add_item(HeapTuple::form(2, &[0, 0, 1]).as_bytes(), INVALID_OFFSET_NUMBER).unwrap();

		let err = verify_seq_page("s", &buffer, &mut page, 0x1717).unwrap_err();
		assert_eq!(err.code, "SEQUENCE_005");
		assert_eq!(err.message, "bad magic number in sequence \"s\": 00000001");
	}

	#[test]
	fn test_verify_clears_stale_xmax() {
		let pool = BufferPool::new(Arc::new(StorageManager::new()));
		let locator = RelFileLocator::new(5, RelFileNumber(16391));
		pool.smgr().create(locator, ForkNumber::Main, false).unwrap();
		let buffer = pool.extend(locator, ForkNumber::Main).unwrap();

		let mut page = buffer.lock_exclusive();
		init_page(&mut page, 0x1717);
		page.add_item(HeapTuple::form(3, &[7; 17]).as_bytes(), INVALID_OFFSET_NUMBER).unwrap();
		page.item_mut(FIRST_OFFSET_NUMBER).unwrap()[4..8].copy_from_slice(&TransactionId(900).0.to_le_bytes());
		assert!(!buffer.is_dirty());

		verify_seq_page("s", &buffer, &mut page, 0x1717).unwrap();
		assert!(buffer.is_dirty());
		assert_eq!(seq_tuple_data(&page).unwrap(), &[7; 17]);
	}
}
