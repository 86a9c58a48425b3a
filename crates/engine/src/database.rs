// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeSet,
	ops::Deref,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
	},
};

use parking_lot::Mutex;
use seqdb_catalog::{AccessMethodKind, AccessMethodToCreate, Catalog, LockManager, RelationDef, SessionId};
use seqdb_storage::{BufferPool, StorageImage, StorageManager};
use seqdb_type::{ForkNumber, Lsn, Persistence, TransactionId};
use seqdb_wal::{ResourceManagers, Wal, WalImage, builtin::checkpoint_record, describe, replay};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
	config::DatabaseConfig,
	sequence::{
		am::{SequenceAmHandler, SequenceAmRegistry, check_default_sequence_access_method},
		local::{LOCAL_SEQUENCE_AM_HANDLER, SeqLocalRmgr, local_sequenceam_handler},
	},
	session::Session,
	settings::{SettingDef, Settings},
	transaction::Transaction,
};

/// Role created at bootstrap. It owns nothing and may do everything.
pub const BOOTSTRAP_ROLE: &str = "admin";

/// Table access method every sequence relation is stored with.
pub const HEAP_TABLE_AM: &str = "heap";
pub const HEAP_TABLE_AM_HANDLER: &str = "heap_tableam_handler";

/// Sequence access method created at bootstrap.
pub const LOCAL_SEQUENCE_AM: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
	InProduction,
	/// Written by a clean shutdown. Unlogged relations keep their contents
	/// on the next start.
	ShutDown,
}

/// Control data as of the last checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlData {
	pub system_identifier: Uuid,
	pub next_xid: TransactionId,
	pub state: DatabaseState,
}

/// Everything a crash leaves behind: written pages, the flushed log, the
/// last committed catalog and the control data.
#[derive(Debug, Clone)]
pub struct DurableImage {
	pub storage: StorageImage,
	pub wal: WalImage,
	pub catalog: Vec<u8>,
	pub control: ControlData,
}

pub struct DatabaseInner {
	pub(crate) config: DatabaseConfig,
	pub(crate) buffers: BufferPool,
	pub(crate) wal: Wal,
	pub(crate) catalog: Catalog,
	pub(crate) locks: LockManager,
	pub(crate) rmgrs: ResourceManagers,
	pub(crate) settings: Settings,
	pub(crate) access_methods: SequenceAmRegistry,
	control: Mutex<ControlData>,
	next_xid: AtomicU32,
	next_vxid: AtomicU64,
	next_session: AtomicU64,
	in_recovery: AtomicBool,
}

impl DatabaseInner {
	pub(crate) fn next_vxid(&self) -> u64 {
		self.next_vxid.fetch_add(1, Ordering::SeqCst)
	}

	pub(crate) fn next_xid(&self) -> TransactionId {
		TransactionId(self.next_xid.fetch_add(1, Ordering::SeqCst))
	}

	pub(crate) fn next_session(&self) -> SessionId {
		self.next_session.fetch_add(1, Ordering::SeqCst)
	}

	pub(crate) fn in_recovery(&self) -> bool {
		self.in_recovery.load(Ordering::Acquire)
	}
}

/// A database: shared buffers, the log, the catalog and the registered
/// sequence access methods. Cheap to clone; sessions hold a clone.
#[derive(Clone)]
pub struct Database(pub(crate) Arc<DatabaseInner>);

impl Deref for Database {
	type Target = DatabaseInner;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl Database {
	fn build(
		config: DatabaseConfig,
		storage: StorageManager,
		wal: Wal,
		catalog: Catalog,
		control: ControlData,
	) -> crate::Result<Self> {
		let mut rmgrs = ResourceManagers::with_builtin();
		rmgrs.register(Arc::new(SeqLocalRmgr))?;

		let settings = Settings::new();
		settings.define(
			SettingDef::string(
				"default_sequence_access_method",
				"Sets the default sequence access method for new sequences.",
				LOCAL_SEQUENCE_AM,
			)
			.with_check(check_default_sequence_access_method),
		)?;
		settings.load("default_sequence_access_method", &config.default_sequence_access_method)?;

		let access_methods = SequenceAmRegistry::new();
		access_methods.register_handler(LOCAL_SEQUENCE_AM_HANDLER, Arc::new(local_sequenceam_handler));

		let lock_timeout = config.lock_timeout();

		Ok(Self(Arc::new(DatabaseInner {
			config,
			buffers: BufferPool::new(Arc::new(storage)),
			wal,
			catalog,
			locks: LockManager::new(lock_timeout),
			rmgrs,
			settings,
			access_methods,
			next_xid: AtomicU32::new(control.next_xid.0.max(TransactionId::FIRST_NORMAL.0)),
			control: Mutex::new(ControlData {
				state: DatabaseState::InProduction,
				..control
			}),
			next_vxid: AtomicU64::new(1),
			next_session: AtomicU64::new(1),
			in_recovery: AtomicBool::new(false),
		})))
	}

	/// Creates a fresh database: the bootstrap role, the `heap` table access
	/// method and the `local` sequence access method.
	#[instrument(name = "engine::database::open", level = "info", skip_all)]
	pub fn open(config: DatabaseConfig) -> crate::Result<Self> {
		let lock_timeout = config.lock_timeout();
		let wal = Wal::new(config.wal_segment_hint);
		let control = ControlData {
			system_identifier: Uuid::now_v7(),
			next_xid: TransactionId::FIRST_NORMAL,
			state: DatabaseState::InProduction,
		};
		let db = Self::build(config, StorageManager::new(), wal, Catalog::new(lock_timeout), control)?;

		let mut txn = Transaction::begin(&db, 0, 0, false);
		if let Err(err) = db.bootstrap_catalog(&mut txn) {
			txn.abort(&db);
			return Err(err);
		}
		txn.commit(&db)?;

		db.checkpoint()?;
		info!(system_identifier = %db.system_identifier(), "database initialized");
		Ok(db)
	}

	fn bootstrap_catalog(&self, txn: &mut Transaction) -> crate::Result<()> {
		self.catalog.create_role(&mut txn.catalog, BOOTSTRAP_ROLE, true)?;
		self.catalog.create_access_method(
			&mut txn.catalog,
			AccessMethodToCreate {
				name: HEAP_TABLE_AM.to_string(),
				kind: AccessMethodKind::Table,
				handler: HEAP_TABLE_AM_HANDLER.to_string(),
			},
		)?;
		self.catalog.create_access_method(
			&mut txn.catalog,
			AccessMethodToCreate {
				name: LOCAL_SEQUENCE_AM.to_string(),
				kind: AccessMethodKind::Sequence,
				handler: LOCAL_SEQUENCE_AM_HANDLER.to_string(),
			},
		)?;
		Ok(())
	}

	/// Restarts from a crash image: replays the log from the last
	/// checkpoint, then resets unlogged relations from their init forks,
	/// drops temporary relations and removes orphaned storage. After a clean
	/// shutdown unlogged relations are left alone.
	#[instrument(name = "engine::database::recover", level = "info", skip_all)]
	pub fn recover(config: DatabaseConfig, image: DurableImage) -> crate::Result<Self> {
		let reset_unlogged = image.control.state != DatabaseState::ShutDown;
		let db = Self::replay_image(config, image)?;
		db.finish_recovery(reset_unlogged)?;
		Ok(db)
	}

	/// Opens a crash image as a hot standby: the log is replayed but
	/// recovery never ends, so every transaction is read only.
	#[instrument(name = "engine::database::standby", level = "info", skip_all)]
	pub fn standby(config: DatabaseConfig, image: DurableImage) -> crate::Result<Self> {
		Self::replay_image(config, image)
	}

	fn replay_image(config: DatabaseConfig, image: DurableImage) -> crate::Result<Self> {
		let catalog = Catalog::from_image(&image.catalog, config.lock_timeout())?;
		let db = Self::build(
			config,
			StorageManager::from_image(image.storage),
			Wal::from_image(image.wal),
			catalog,
			image.control,
		)?;
		db.in_recovery.store(true, Ordering::Release);

		let stats = replay(&db.wal, &db.rmgrs, &db.buffers)?;
		if stats.max_xid.is_valid() {
			db.next_xid.fetch_max(stats.max_xid.0 + 1, Ordering::SeqCst);
		}
		info!(records = stats.records, end = %stats.end, "log replayed");
		Ok(db)
	}

	/// Ends recovery of a standby and opens it for writes.
	pub fn promote(&self) -> crate::Result<()> {
		if !self.in_recovery() {
			return Ok(());
		}
		self.finish_recovery(true)
	}

	fn finish_recovery(&self, reset_unlogged: bool) -> crate::Result<()> {
		self.buffers.flush_all(&self.wal)?;

		let mut txn = Transaction::begin(self, 0, 0, false);
		let cleanup = self.cleanup_after_crash(&mut txn, reset_unlogged);
		match cleanup {
			Ok(()) => txn.commit(self)?,
			Err(err) => {
				txn.abort(self);
				return Err(err);
			}
		}

		self.in_recovery.store(false, Ordering::Release);
		self.checkpoint()?;
		info!("recovery finished");
		Ok(())
	}

	fn cleanup_after_crash(&self, txn: &mut Transaction, reset_unlogged: bool) -> crate::Result<()> {
		let smgr = self.buffers.smgr();

		let relations = self.catalog.list_relations(&txn.catalog);
		for relation in relations.iter().filter(|relation| relation.temp_owner.is_some()) {
			debug!(name = %relation.name, "dropping temporary relation left by crash");
			self.catalog.drop_relation(&mut txn.catalog, relation.id)?;
		}

		let surviving: Vec<RelationDef> = self.catalog.list_relations(&txn.catalog);
		let unlogged = surviving.iter().filter(|relation| reset_unlogged && relation.persistence == Persistence::Unlogged);
		for relation in unlogged {
			let locator = relation.locator();
			if smgr.exists(locator, ForkNumber::Init) {
				debug!(name = %relation.name, %locator, "resetting unlogged relation");
				self.buffers.drop_relation(locator);
				smgr.copy_fork(locator, ForkNumber::Init, ForkNumber::Main)?;
			}
		}

		let referenced: BTreeSet<_> = surviving.iter().map(RelationDef::locator).collect();
		for locator in smgr.locators() {
			if !referenced.contains(&locator) {
				debug!(%locator, "removing orphaned storage");
				self.buffers.drop_relation(locator);
				smgr.unlink(locator);
			}
		}
		Ok(())
	}

	/// Writes every dirty page and moves the redo pointer to the log position
	/// taken before the writes started.
	#[instrument(name = "engine::database::checkpoint", level = "debug", skip_all)]
	pub fn checkpoint(&self) -> crate::Result<()> {
		if self.in_recovery() {
			let written = self.buffers.flush_all(&self.wal)?;
			debug!(written, "restartpoint");
			return Ok(());
		}

		let redo = self.wal.insert_lsn();
		let written = self.buffers.flush_all(&self.wal)?;
		let end = self.wal.insert(&checkpoint_record(redo));
		self.wal.flush(end);
		self.wal.set_redo_ptr(redo);

		let mut control = self.control.lock();
		control.next_xid = TransactionId(self.next_xid.load(Ordering::SeqCst));
		info!(%redo, written, "checkpoint complete");
		Ok(())
	}

	/// What a crash at this instant would leave on disk.
	pub fn crash(&self) -> DurableImage {
		warn!("simulating crash");
		self.image()
	}

	fn image(&self) -> DurableImage {
		DurableImage {
			storage: self.buffers.smgr().image(),
			wal: self.wal.image(),
			catalog: self.catalog.image(),
			control: *self.control.lock(),
		}
	}

	/// Clean shutdown, checkpointing first when configured to.
	#[instrument(name = "engine::database::shutdown", level = "info", skip_all)]
	pub fn shutdown(self) -> crate::Result<DurableImage> {
		if self.config.checkpoint_on_shutdown {
			self.checkpoint()?;
		} else {
			self.buffers.flush_all(&self.wal)?;
			self.wal.flush(self.wal.insert_lsn());
		}
		self.control.lock().state = DatabaseState::ShutDown;
		Ok(self.image())
	}

	/// Opens a session for the named role.
	pub fn connect(&self, role: &str) -> crate::Result<Session> {
		Session::connect(self.clone(), role)
	}

	/// Opens a session as the bootstrap superuser.
	pub fn session(&self) -> crate::Result<Session> {
		self.connect(BOOTSTRAP_ROLE)
	}

	/// Makes a handler function callable by `CREATE ACCESS METHOD`.
	pub fn register_sequence_am_handler(&self, name: &str, handler: SequenceAmHandler) {
		self.access_methods.register_handler(name, handler);
	}

	/// Adds a custom setting, as extensions do when they are loaded.
	pub fn define_setting(&self, def: SettingDef) -> crate::Result<()> {
		self.settings.define(def)
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn config(&self) -> &DatabaseConfig {
		&self.config
	}

	pub fn system_identifier(&self) -> Uuid {
		self.control.lock().system_identifier
	}

	pub fn is_in_recovery(&self) -> bool {
		self.in_recovery()
	}

	pub fn insert_lsn(&self) -> Lsn {
		self.wal.insert_lsn()
	}

	pub fn flushed_lsn(&self) -> Lsn {
		self.wal.flushed_lsn()
	}

	pub fn redo_ptr(&self) -> Lsn {
		self.wal.redo_ptr()
	}

	/// One line per record from `from` on, in the format of a log dump.
	pub fn describe_wal(&self, from: Lsn) -> Vec<String> {
		self.wal.reader(from).map(|decoded| describe(&self.rmgrs, &decoded)).collect()
	}
}
