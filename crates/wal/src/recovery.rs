// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_storage::BufferPool;
use seqdb_type::{Lsn, TransactionId};
use tracing::{debug, info, instrument};

use crate::{
	error::WalError,
	log::Wal,
	rmgr::{RedoContext, ResourceManagers},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryStats {
	pub records: usize,
	pub start: Lsn,
	pub end: Lsn,
	/// Highest transaction id seen in the replayed records.
	pub max_xid: TransactionId,
}

/// Replays every record from the checkpoint redo pointer to the end of the
/// log. A record whose resource manager is not registered stops recovery.
#[instrument(name = "wal::recovery::replay", level = "debug", skip_all)]
pub fn replay(wal: &Wal, rmgrs: &ResourceManagers, buffers: &BufferPool) -> crate::Result<RecoveryStats> {
	let start = wal.redo_ptr();
	let mut stats = RecoveryStats {
		records: 0,
		start,
		end: start,
		max_xid: TransactionId::INVALID,
	};

	for decoded in wal.reader(start) {
		let manager = rmgrs.get(decoded.record.rmgr).ok_or(WalError::UnknownResourceManager {
			rmgr: decoded.record.rmgr.0,
			lsn: decoded.start,
		})?;

		debug!(
			lsn = %decoded.start,
			rmgr = manager.name(),
			info = decoded.record.info,
			"redo"
		);

		let ctx = RedoContext {
			buffers,
			start_lsn: decoded.start,
			end_lsn: decoded.end,
		};
		manager.redo(&ctx, &decoded.record)?;

		stats.records += 1;
		stats.end = decoded.end;
		stats.max_xid = stats.max_xid.max(decoded.record.xid);
	}

	info!(records = stats.records, start = %stats.start, end = %stats.end, "redo done");
	Ok(stats)
}
