// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Resource managers every database carries: checkpoints, transaction
//! outcomes, file creation and generic full page images.

use seqdb_storage::{BLCKSZ, Page};
use seqdb_type::{BlockNumber, ForkNumber, Lsn, RelFileLocator, TransactionId};
use tracing::trace;

use crate::{
	error::{redo_failed, unknown_op_code},
	record::{BlockRef, Cursor, LOCATOR_SIZE, Record, RmgrId, decode_locator, encode_locator},
	rmgr::{RedoContext, ResourceManager},
};

pub const XLOG_CHECKPOINT: u8 = 0x00;

pub const XACT_COMMIT: u8 = 0x00;
pub const XACT_ABORT: u8 = 0x20;

pub const SMGR_CREATE: u8 = 0x10;

pub const GENERIC_PAGE_IMAGE: u8 = 0x00;

pub fn checkpoint_record(redo: Lsn) -> Record {
	Record::new(RmgrId::XLOG, XLOG_CHECKPOINT).with_data(&redo.0.to_le_bytes())
}

pub fn commit_record(xid: TransactionId) -> Record {
	Record::new(RmgrId::XACT, XACT_COMMIT).with_xid(xid)
}

pub fn abort_record(xid: TransactionId) -> Record {
	Record::new(RmgrId::XACT, XACT_ABORT).with_xid(xid)
}

pub fn smgr_create_record(locator: RelFileLocator, fork: ForkNumber) -> Record {
	Record::new(RmgrId::SMGR, SMGR_CREATE).with_data(&encode_locator(&locator)).with_data(&[fork.to_u8()])
}

/// Logs the complete contents of a page; replay restores it verbatim.
pub fn generic_page_image_record(
	xid: TransactionId,
	locator: RelFileLocator,
	fork: ForkNumber,
	block: BlockNumber,
	page: &Page,
) -> Record {
	Record::new(RmgrId::GENERIC, GENERIC_PAGE_IMAGE)
		.with_xid(xid)
		.with_block(BlockRef::new(locator, fork, block).will_init().with_image(page.as_bytes().to_vec()))
}

pub struct XlogRmgr;

impl ResourceManager for XlogRmgr {
	fn id(&self) -> RmgrId {
		RmgrId::XLOG
	}

	fn name(&self) -> &'static str {
		"XLOG"
	}

	fn redo(&self, _ctx: &RedoContext<'_>, record: &Record) -> crate::Result<()> {
		match record.info {
			XLOG_CHECKPOINT => Ok(()),
			info => Err(unknown_op_code("xlog_redo", info).into()),
		}
	}

	fn desc(&self, record: &Record) -> String {
		match Cursor::new(&record.data).u64() {
			Ok(redo) => format!("redo {}", Lsn(redo)),
			Err(_) => String::new(),
		}
	}

	fn identify(&self, info: u8) -> Option<&'static str> {
		match info {
			XLOG_CHECKPOINT => Some("CHECKPOINT"),
			_ => None,
		}
	}
}

pub struct XactRmgr;

impl ResourceManager for XactRmgr {
	fn id(&self) -> RmgrId {
		RmgrId::XACT
	}

	fn name(&self) -> &'static str {
		"Transaction"
	}

	fn redo(&self, _ctx: &RedoContext<'_>, record: &Record) -> crate::Result<()> {
		match record.info {
			XACT_COMMIT | XACT_ABORT => Ok(()),
			info => Err(unknown_op_code("xact_redo", info).into()),
		}
	}

	fn desc(&self, record: &Record) -> String {
		format!("xid {}", record.xid.0)
	}

	fn identify(&self, info: u8) -> Option<&'static str> {
		match info {
			XACT_COMMIT => Some("COMMIT"),
			XACT_ABORT => Some("ABORT"),
			_ => None,
		}
	}
}

pub struct SmgrRmgr;

impl SmgrRmgr {
	fn parse(record: &Record) -> crate::Result<(RelFileLocator, ForkNumber)> {
		let locator = decode_locator(&record.data)?;
		let fork = record
			.data
			.get(LOCATOR_SIZE)
			.copied()
			.and_then(ForkNumber::from_u8)
			.ok_or_else(|| redo_failed("smgr_redo", "invalid fork number"))?;
		Ok((locator, fork))
	}
}

impl ResourceManager for SmgrRmgr {
	fn id(&self) -> RmgrId {
		RmgrId::SMGR
	}

	fn name(&self) -> &'static str {
		"Storage"
	}

	fn redo(&self, ctx: &RedoContext<'_>, record: &Record) -> crate::Result<()> {
		match record.info {
			SMGR_CREATE => {
				let (locator, fork) = Self::parse(record)?;
				trace!(%locator, %fork, "replaying file creation");
				ctx.buffers.smgr().create(locator, fork, true)
			}
			info => Err(unknown_op_code("smgr_redo", info).into()),
		}
	}

	fn desc(&self, record: &Record) -> String {
		match Self::parse(record) {
			Ok((locator, ForkNumber::Main)) => format!("base/{}", locator),
			Ok((locator, fork)) => format!("base/{}_{}", locator, fork),
			Err(_) => String::new(),
		}
	}

	fn identify(&self, info: u8) -> Option<&'static str> {
		match info {
			SMGR_CREATE => Some("CREATE"),
			_ => None,
		}
	}
}

pub struct GenericRmgr;

impl ResourceManager for GenericRmgr {
	fn id(&self) -> RmgrId {
		RmgrId::GENERIC
	}

	fn name(&self) -> &'static str {
		"Generic"
	}

	fn redo(&self, ctx: &RedoContext<'_>, record: &Record) -> crate::Result<()> {
		if record.info != GENERIC_PAGE_IMAGE {
			return Err(unknown_op_code("generic_redo", record.info).into());
		}

		for block in &record.blocks {
			let image = block
				.image
				.as_deref()
				.filter(|image| image.len() == BLCKSZ)
				.ok_or_else(|| redo_failed("generic_redo", "block reference carries no page image"))?;
			let page = Page::from_bytes(image)?;

			let buffer = ctx.buffers.read_buffer_for_redo(block.locator, block.fork, block.block)?;
			let mut content = buffer.lock_exclusive();
			content.copy_from(&page);
			content.set_lsn(ctx.end_lsn);
			buffer.mark_dirty();
		}
		Ok(())
	}

	fn desc(&self, record: &Record) -> String {
		format!("{} page images", record.blocks.len())
	}

	fn identify(&self, info: u8) -> Option<&'static str> {
		match info {
			GENERIC_PAGE_IMAGE => Some("Generic"),
			_ => None,
		}
	}

	fn mask(&self, page: &mut Page) {
		page.mask_lsn_and_checksum();
		page.mask_unused_space();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use seqdb_storage::{BufferPool, Page, StorageManager, page::INVALID_OFFSET_NUMBER};
	use seqdb_type::{ForkNumber, Lsn, RelFileLocator, RelFileNumber, Severity, TransactionId};

	use super::*;

	fn locator() -> RelFileLocator {
		RelFileLocator::new(5, RelFileNumber(16500))
	}

	fn context(buffers: &BufferPool) -> RedoContext<'_> {
		RedoContext {
			buffers,
			start_lsn: Lsn(16),
			end_lsn: Lsn(96),
		}
	}

	#[test]
	fn test_smgr_create_redo() {
		let buffers = BufferPool::new(Arc::new(StorageManager::new()));
		let record = smgr_create_record(locator(), ForkNumber::Init);

		SmgrRmgr.redo(&context(&buffers), &record).unwrap();
		SmgrRmgr.redo(&context(&buffers), &record).unwrap();
		assert!(buffers.smgr().exists(locator(), ForkNumber::Init));
		assert_eq!(SmgrRmgr.desc(&record), "base/1663/5/16500_init");
	}

	#[test]
	fn test_generic_restores_image() {
		let buffers = BufferPool::new(Arc::new(StorageManager::new()));
		let mut page = Page::new();
		page.init(0);
		page.add_item(b"payload", INVALID_OFFSET_NUMBER).unwrap();

		let record = generic_page_image_record(TransactionId(5), locator(), ForkNumber::Main, 0, &page);
		GenericRmgr.redo(&context(&buffers), &record).unwrap();

		let buffer = buffers.read_buffer(locator(), ForkNumber::Main, 0).unwrap();
		let content = buffer.lock_shared();
		assert_eq!(content.item(1).unwrap(), b"payload");
		assert_eq!(content.lsn(), Lsn(96));
		assert!(buffer.is_dirty());
	}

	#[test]
	fn test_unknown_op_code_panics() {
		let buffers = BufferPool::new(Arc::new(StorageManager::new()));
		let err = XactRmgr.redo(&context(&buffers), &Record::new(RmgrId::XACT, 0x70)).unwrap_err();
		assert_eq!(err.severity, Severity::Panic);
		assert_eq!(err.message, "xact_redo: unknown op code 112");
	}

	#[test]
	fn test_checkpoint_desc() {
		assert_eq!(XlogRmgr.desc(&checkpoint_record(Lsn(0x1_0000_0010))), "redo 1/00000010");
	}
}
