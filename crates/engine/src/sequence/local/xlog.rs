// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_storage::{Page, page::FIRST_OFFSET_NUMBER};
use seqdb_type::{ForkNumber, RelFileLocator};
use seqdb_wal::{
	BlockRef, RedoContext, Record, ResourceManager, RmgrId,
	error::{redo_failed, unknown_op_code},
	record::{LOCATOR_SIZE, decode_locator, encode_locator},
};
use tracing::trace;

use crate::sequence::{local::data::SEQ_LOCAL_MAGIC, page::init_page};

pub const XLOG_SEQ_LOCAL_LOG: u8 = 0x00;

/// Logs the complete tuple of a local sequence. Main data is the locator
/// followed by the tuple bytes; block 0 is rebuilt from scratch on replay.
pub fn seq_local_record(locator: RelFileLocator, fork: ForkNumber, tuple: &[u8]) -> Record {
	Record::new(RmgrId::SEQ_LOCAL, XLOG_SEQ_LOCAL_LOG)
		.with_block(BlockRef::new(locator, fork, 0).will_init())
		.with_data(&encode_locator(&locator))
		.with_data(tuple)
}

pub struct SeqLocalRmgr;

impl ResourceManager for SeqLocalRmgr {
	fn id(&self) -> RmgrId {
		RmgrId::SEQ_LOCAL
	}

	fn name(&self) -> &'static str {
		"SequenceLocal"
	}

	fn redo(&self, ctx: &RedoContext<'_>, record: &Record) -> crate::Result<()> {
		if record.info != XLOG_SEQ_LOCAL_LOG {
			return Err(unknown_op_code("seq_local_redo", record.info).into());
		}

		let block = record.blocks.first().ok_or_else(|| redo_failed("seq_local_redo", "record has no block reference"))?;
		let item = record
			.data
			.get(LOCATOR_SIZE..)
			.filter(|item| !item.is_empty())
			.ok_or_else(|| redo_failed("seq_local_redo", "record carries no tuple"))?;

		// The page is built aside and copied in one go so a concurrent
		// reader never sees it half initialized.
		let mut local = Page::new();
		init_page(&mut local, SEQ_LOCAL_MAGIC);
		if local.add_item(item, FIRST_OFFSET_NUMBER).is_err() {
			return Err(redo_failed("seq_local_redo", "failed to add item to page").into());
		}
		local.set_lsn(ctx.end_lsn);

		let buffer = ctx.buffers.read_buffer_for_redo(block.locator, block.fork, block.block)?;
		buffer.lock_exclusive().copy_from(&local);
		buffer.mark_dirty();
		trace!(locator = %block.locator, fork = %block.fork, "replayed sequence tuple");
		Ok(())
	}

	fn desc(&self, record: &Record) -> String {
		if record.info != XLOG_SEQ_LOCAL_LOG {
			return String::new();
		}
		match decode_locator(&record.data) {
			Ok(locator) => format!("rel {}", locator),
			Err(_) => String::new(),
		}
	}

	fn identify(&self, info: u8) -> Option<&'static str> {
		match info {
			XLOG_SEQ_LOCAL_LOG => Some("SEQ_LOCAL_LOG"),
			_ => None,
		}
	}

	fn mask(&self, page: &mut Page) {
		page.mask_lsn_and_checksum();
		page.mask_unused_space();
	}
}
