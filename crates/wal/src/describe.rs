// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use crate::{reader::DecodedRecord, rmgr::ResourceManagers};

/// Renders one record as a log dump line:
///
/// ```text
/// rmgr: Sequence len: 89 tx: 750 lsn: 0/00000010, desc: SEQ_LOCAL_LOG rel 1663/5/16384; blkref #0: rel 1663/5/16384 fork main blk 0
/// ```
pub fn describe(rmgrs: &ResourceManagers, decoded: &DecodedRecord) -> String {
	let record = &decoded.record;
	let len = decoded.end.0 - decoded.start.0;

	let mut out = String::new();
	match rmgrs.get(record.rmgr) {
		Some(manager) => {
			let ident = match manager.identify(record.info) {
				Some(ident) => ident.to_string(),
				None => format!("UNKNOWN ({:X})", record.info),
			};
			let _ = write!(
				out,
				"rmgr: {} len: {} tx: {} lsn: {}, desc: {} {}",
				manager.name(),
				len,
				record.xid.0,
				decoded.start,
				ident,
				manager.desc(record)
			);
		}
		None => {
			let _ = write!(
				out,
				"rmgr: {} len: {} tx: {} lsn: {}, desc: unknown resource manager",
				record.rmgr, len, record.xid.0, decoded.start
			);
		}
	}

	for (index, block) in record.blocks.iter().enumerate() {
		let _ = write!(
			out,
			"; blkref #{}: rel {} fork {} blk {}",
			index, block.locator, block.fork, block.block
		);
		if block.image.is_some() {
			out.push_str(" (FPW)");
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use seqdb_storage::Page;
	use seqdb_type::{ForkNumber, RelFileLocator, RelFileNumber, TransactionId};

	use super::describe;
	use crate::{
		builtin::{commit_record, generic_page_image_record},
		log::{FIRST_LSN, Wal},
		rmgr::ResourceManagers,
	};

	#[test]
	fn test_describe_lines() {
		let wal = Wal::new(0);
		wal.insert(&commit_record(TransactionId(750)));
		let mut page = Page::new();
		page.init(0);
		wal.insert(&generic_page_image_record(
			TransactionId(751),
			RelFileLocator::new(5, RelFileNumber(16384)),
			ForkNumber::Main,
			0,
			&page,
		));

		let rmgrs = ResourceManagers::with_builtin();
		let lines: Vec<String> = wal.reader(FIRST_LSN).map(|decoded| describe(&rmgrs, &decoded)).collect();

		assert!(lines[0].starts_with("rmgr: Transaction len: "));
		assert!(lines[0].contains("tx: 750 lsn: 0/00000010, desc: COMMIT xid 750"));
		assert!(lines[1].ends_with("; blkref #0: rel 1663/5/16384 fork main blk 0 (FPW)"));
	}
}
