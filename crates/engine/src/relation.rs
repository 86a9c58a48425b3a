// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use seqdb_catalog::RelationDef;
use seqdb_storage::Buffer;
use seqdb_type::{BlockNumber, ForkNumber, Lsn, Persistence, RelFileLocator, RelFileNumber, RelationId, TransactionId};
use seqdb_wal::{Record, builtin::smgr_create_record};
use tracing::{debug, instrument};

use crate::{
	database::DatabaseInner,
	settings::{SessionSettings, SettingValue},
	transaction::Transaction,
};

/// An opened relation within a transaction. Access methods reach storage,
/// the log and session settings through it.
pub struct Relation<'a> {
	db: &'a DatabaseInner,
	txn: &'a mut Transaction,
	settings: &'a SessionSettings,
	def: RelationDef,
}

impl<'a> Relation<'a> {
	pub(crate) fn new(
		db: &'a DatabaseInner,
		txn: &'a mut Transaction,
		settings: &'a SessionSettings,
		def: RelationDef,
	) -> Self {
		Self {
			db,
			txn,
			settings,
			def,
		}
	}

	pub fn def(&self) -> &RelationDef {
		&self.def
	}

	pub fn id(&self) -> RelationId {
		self.def.id
	}

	pub fn name(&self) -> &str {
		&self.def.name
	}

	pub fn persistence(&self) -> Persistence {
		self.def.persistence
	}

	pub fn locator(&self) -> RelFileLocator {
		self.def.locator()
	}

	/// Only permanent relations are WAL-logged.
	pub fn needs_wal(&self) -> bool {
		self.def.persistence == Persistence::Permanent
	}

	pub fn read_buffer(&self, fork: ForkNumber, block: BlockNumber) -> crate::Result<Arc<Buffer>> {
		self.db.buffers.read_buffer(self.locator(), fork, block)
	}

	pub fn extend(&self, fork: ForkNumber) -> crate::Result<Arc<Buffer>> {
		self.db.buffers.extend(self.locator(), fork)
	}

	pub fn nblocks(&self, fork: ForkNumber) -> crate::Result<BlockNumber> {
		self.db.buffers.smgr().nblocks(self.locator(), fork)
	}

	/// Creates the main fork. The file goes away again if the transaction
	/// aborts.
	pub fn create_storage(&mut self) -> crate::Result<()> {
		let locator = self.locator();
		self.db.buffers.smgr().create(locator, ForkNumber::Main, false)?;
		if self.needs_wal() {
			self.insert_wal(smgr_create_record(locator, ForkNumber::Main));
		}
		self.txn.schedule_delete(locator, false);
		Ok(())
	}

	/// Creates the init fork of an unlogged relation. Its creation is
	/// always logged: the fork must exist after a crash to reset the
	/// relation from.
	pub fn create_init_fork(&mut self) -> crate::Result<()> {
		let locator = self.locator();
		self.db.buffers.smgr().create(locator, ForkNumber::Init, false)?;
		self.insert_wal(smgr_create_record(locator, ForkNumber::Init));
		Ok(())
	}

	/// Switches the relation to a fresh, empty file. The old file is
	/// removed at commit, the new one at abort.
	#[instrument(name = "engine::relation::set_new_relfilenumber", level = "debug", skip(self), fields(relation = %self.def.name))]
	pub fn set_new_relfilenumber(&mut self, persistence: Persistence) -> crate::Result<()> {
		let old = self.locator();
		let relfilenumber = RelFileNumber(self.db.catalog.allocate_oid().0);
		self.def = self.db.catalog.set_relfilenumber(&mut self.txn.catalog, self.def.id, relfilenumber, persistence)?;
		self.create_storage()?;
		self.txn.schedule_delete(old, true);
		debug!(old = %old, new = %self.locator(), %persistence, "relation storage replaced");
		Ok(())
	}

	pub fn flush(&self) -> crate::Result<()> {
		self.db.buffers.flush_relation(self.locator(), &self.db.wal)
	}

	pub fn flush_fork(&self, fork: ForkNumber) -> crate::Result<()> {
		self.db.buffers.flush_fork(self.locator(), fork, &self.db.wal)
	}

	/// Appends a record stamped with the transaction id, if one is
	/// assigned, and returns the position just past it.
	pub fn insert_wal(&mut self, record: Record) -> Lsn {
		self.db.wal.insert(&record.with_xid(self.txn.xid()))
	}

	pub fn xid(&self) -> TransactionId {
		self.txn.xid()
	}

	pub fn assign_xid(&mut self) -> TransactionId {
		self.txn.assign_xid(self.db)
	}

	/// Redo pointer of the last checkpoint.
	pub fn redo_ptr(&self) -> Lsn {
		self.db.wal.redo_ptr()
	}

	pub fn in_recovery(&self) -> bool {
		self.db.in_recovery()
	}

	/// Effective value of a setting for the session that opened the
	/// relation.
	pub fn setting(&self, name: &str) -> Option<SettingValue> {
		self.settings.get(&self.db.settings, name)
	}

	pub(crate) fn into_def(self) -> RelationDef {
		self.def
	}
}
