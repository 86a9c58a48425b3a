// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_catalog::{CatalogTxn, SessionId};
use seqdb_type::{RelFileLocator, RelationId, TransactionId};
use seqdb_wal::builtin::{abort_record, commit_record};
use tracing::{debug, instrument, warn};

use crate::database::DatabaseInner;

/// Storage to remove once the transaction ends: at commit for storage the
/// transaction replaced, at abort for storage it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingDelete {
	locator: RelFileLocator,
	at_commit: bool,
}

/// One transaction of a session.
///
/// The transaction id is assigned lazily, the first time something is
/// WAL-logged on its behalf. Read-only work never consumes one.
#[derive(Debug)]
pub struct Transaction {
	/// Lock owner, unique across the database.
	pub(crate) vxid: u64,
	/// Session local transaction counter.
	pub(crate) lxid: u64,
	xid: TransactionId,
	read_only: bool,
	pub(crate) catalog: CatalogTxn,
	pending: Vec<PendingDelete>,
	/// Sequences dropped so far, forgotten by the session cache on commit.
	pub(crate) dropped_sequences: Vec<RelationId>,
}

impl Transaction {
	pub(crate) fn begin(db: &DatabaseInner, session: SessionId, lxid: u64, read_only: bool) -> Self {
		let vxid = db.next_vxid();
		debug!(vxid, lxid, read_only, "transaction started");
		Self {
			vxid,
			lxid,
			xid: TransactionId::INVALID,
			read_only,
			catalog: CatalogTxn::new(vxid, session),
			pending: Vec::new(),
			dropped_sequences: Vec::new(),
		}
	}

	pub fn xid(&self) -> TransactionId {
		self.xid
	}

	pub fn is_read_only(&self) -> bool {
		self.read_only
	}

	pub(crate) fn assign_xid(&mut self, db: &DatabaseInner) -> TransactionId {
		if !self.xid.is_valid() {
			self.xid = db.next_xid();
			debug!(xid = %self.xid, vxid = self.vxid, "transaction id assigned");
		}
		self.xid
	}

	pub(crate) fn schedule_delete(&mut self, locator: RelFileLocator, at_commit: bool) {
		self.pending.push(PendingDelete {
			locator,
			at_commit,
		});
	}

	/// Makes the transaction durable. The commit record is flushed before
	/// the catalog publishes its changes, so every change visible after a
	/// crash has its log records on disk.
	#[instrument(name = "engine::transaction::commit", level = "debug", skip_all, fields(vxid = self.vxid))]
	pub(crate) fn commit(mut self, db: &DatabaseInner) -> crate::Result<()> {
		if self.catalog.has_changes() {
			self.assign_xid(db);
		}

		if self.xid.is_valid() {
			let end = db.wal.insert(&commit_record(self.xid));
			db.wal.flush(end);
		}

		let result = db.catalog.commit(&mut self.catalog);
		if result.is_ok() {
			self.drop_pending(db, true);
		} else {
			warn!(vxid = self.vxid, "catalog commit failed");
			self.drop_pending(db, false);
		}
		db.locks.release_all(self.vxid);
		result
	}

	#[instrument(name = "engine::transaction::abort", level = "debug", skip_all, fields(vxid = self.vxid))]
	pub(crate) fn abort(mut self, db: &DatabaseInner) {
		db.catalog.abort(&mut self.catalog);
		self.drop_pending(db, false);
		if self.xid.is_valid() {
			db.wal.insert(&abort_record(self.xid));
		}
		db.locks.release_all(self.vxid);
	}

	fn drop_pending(&mut self, db: &DatabaseInner, committed: bool) {
		for pending in self.pending.drain(..).filter(|pending| pending.at_commit == committed) {
			debug!(locator = %pending.locator, "dropping relation storage");
			db.buffers.drop_relation(pending.locator);
			db.buffers.smgr().unlink(pending.locator);
		}
	}
}
