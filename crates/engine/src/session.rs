// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_catalog::{
	CatalogError, CatalogTxn, LockMode, Privileges, RelationDef, RelationKind, RoleDef, SessionId,
};
use seqdb_type::{Persistence, RelationId, RoleId};
use tracing::{debug, instrument, warn};

use crate::{
	access_method,
	database::{Database, DatabaseInner},
	error::{ConfigError, SequenceError, TransactionError},
	relation::Relation,
	sequence::{
		cache::SequenceCache,
		commands::{self, AlterSequence, CreateSequence},
		functions,
		introspect::{self, SequenceData, SequenceListing, SequenceParameters},
		params::SequenceOption,
	},
	settings::{CheckContext, SessionSettings, SettingContext, SettingValue},
	table::{self, CreateTable},
	transaction::Transaction,
};

/// Everything a command runs against: the database, the current
/// transaction and the state of the session issuing it.
pub struct Context<'a> {
	pub(crate) db: &'a DatabaseInner,
	pub(crate) txn: &'a mut Transaction,
	pub(crate) session: SessionId,
	pub(crate) role: RoleId,
	pub(crate) sequences: &'a mut SequenceCache,
	pub(crate) settings: &'a SessionSettings,
	pub(crate) parallel_mode: bool,
	pub(crate) notices: &'a mut Vec<String>,
}

impl Context<'_> {
	pub(crate) fn relation(&mut self, def: RelationDef) -> Relation<'_> {
		Relation::new(self.db, &mut *self.txn, self.settings, def)
	}

	pub(crate) fn lock(&self, def: &RelationDef, mode: LockMode) -> crate::Result<()> {
		self.db.locks.acquire(self.txn.vxid, def.id, mode, &def.name)
	}

	pub(crate) fn catalog_txn(&self) -> &CatalogTxn {
		&self.txn.catalog
	}

	pub(crate) fn notice(&mut self, message: String) {
		debug!(notice = %message);
		self.notices.push(message);
	}

	pub(crate) fn current_role(&self) -> crate::Result<RoleDef> {
		self.db.catalog.get_role(&self.txn.catalog, self.role)
	}

	pub(crate) fn is_superuser(&self) -> bool {
		self.current_role().is_ok_and(|role| role.superuser)
	}

	pub(crate) fn require_superuser(&self, action: &'static str) -> crate::Result<()> {
		if self.is_superuser() {
			return Ok(());
		}
		Err(TransactionError::SuperuserRequired {
			action,
		}
		.into())
	}

	pub(crate) fn has_privilege(&self, def: &RelationDef, privileges: Privileges) -> bool {
		self.db.catalog.has_privilege(&self.txn.catalog, self.role, def, privileges)
	}

	pub(crate) fn check_privilege(&self, def: &RelationDef, privileges: Privileges) -> crate::Result<()> {
		if self.has_privilege(def, privileges) {
			return Ok(());
		}
		Err(CatalogError::PermissionDenied {
			object: match def.kind {
				RelationKind::Sequence => "sequence",
				RelationKind::Table => "table",
			},
			name: def.name.clone(),
		}
		.into())
	}

	/// Looks a sequence up by name.
	pub(crate) fn resolve_sequence(&self, name: &str) -> crate::Result<RelationDef> {
		let def = self.db.catalog.get_relation_by_name(&self.txn.catalog, name)?;
		if def.kind != RelationKind::Sequence {
			return Err(SequenceError::NotASequence {
				name: def.name,
			}
			.into());
		}
		Ok(def)
	}

	pub(crate) fn prevent_command_if_read_only(&self, command: &'static str) -> crate::Result<()> {
		if self.txn.is_read_only() || self.db.in_recovery() {
			return Err(TransactionError::ReadOnly {
				command,
			}
			.into());
		}
		Ok(())
	}

	pub(crate) fn prevent_command_if_parallel_mode(&self, command: &'static str) -> crate::Result<()> {
		if self.parallel_mode {
			return Err(TransactionError::ParallelMode {
				command,
			}
			.into());
		}
		Ok(())
	}
}

/// A connection to the database, acting as one role.
///
/// Commands outside an explicit transaction block run in a transaction of
/// their own. Inside a block, the first error aborts the block; everything
/// up to `rollback` or `commit` then fails.
pub struct Session {
	db: Database,
	id: SessionId,
	role: RoleId,
	lxid: u64,
	txn: Option<Transaction>,
	failed: bool,
	sequences: SequenceCache,
	settings: SessionSettings,
	parallel_mode: bool,
	notices: Vec<String>,
}

impl Session {
	pub(crate) fn connect(db: Database, role: &str) -> crate::Result<Self> {
		let id = db.next_session();
		let lookup = CatalogTxn::new(0, id);
		let role = db.catalog.find_role_by_name(&lookup, role).ok_or_else(|| CatalogError::RoleNotFound {
			name: role.to_string(),
		})?;
		debug!(session = id, role = %role.name, "session connected");

		Ok(Self {
			db,
			id,
			role: role.id,
			lxid: 0,
			txn: None,
			failed: false,
			sequences: SequenceCache::new(),
			settings: SessionSettings::default(),
			parallel_mode: false,
			notices: Vec::new(),
		})
	}

	pub fn id(&self) -> SessionId {
		self.id
	}

	pub fn database(&self) -> &Database {
		&self.db
	}

	pub fn in_transaction(&self) -> bool {
		self.txn.is_some()
	}

	/// Number of sequences this session holds state for.
	pub fn cached_sequences(&self) -> usize {
		self.sequences.len()
	}

	/// Notices raised since the last call, oldest first.
	pub fn take_notices(&mut self) -> Vec<String> {
		std::mem::take(&mut self.notices)
	}

	/// Marks the session as running inside a parallel operation. Commands
	/// that write sequence state refuse to run while it is set.
	pub fn set_parallel_mode(&mut self, parallel_mode: bool) {
		self.parallel_mode = parallel_mode;
	}

	fn begin_transaction(&mut self, read_only: bool) -> Transaction {
		self.lxid += 1;
		Transaction::begin(&self.db, self.id, self.lxid, read_only || self.db.in_recovery())
	}

	fn run<T>(&mut self, f: impl FnOnce(&mut Context<'_>) -> crate::Result<T>) -> crate::Result<T> {
		if self.failed {
			return Err(TransactionError::Aborted.into());
		}

		let implicit = self.txn.is_none();
		let mut txn = match self.txn.take() {
			Some(txn) => txn,
			None => self.begin_transaction(false),
		};

		let result = {
			let mut ctx = Context {
				db: &self.db,
				txn: &mut txn,
				session: self.id,
				role: self.role,
				sequences: &mut self.sequences,
				settings: &self.settings,
				parallel_mode: self.parallel_mode,
				notices: &mut self.notices,
			};
			f(&mut ctx)
		};

		if implicit {
			return match result {
				Ok(value) => {
					self.commit_transaction(txn)?;
					Ok(value)
				}
				Err(err) => {
					txn.abort(&self.db);
					Err(err)
				}
			};
		}

		if result.is_err() {
			self.failed = true;
		}
		self.txn = Some(txn);
		result
	}

	/// `BEGIN`
	pub fn begin(&mut self) -> crate::Result<()> {
		self.begin_block(false)
	}

	/// `BEGIN READ ONLY`
	pub fn begin_read_only(&mut self) -> crate::Result<()> {
		self.begin_block(true)
	}

	fn begin_block(&mut self, read_only: bool) -> crate::Result<()> {
		if self.txn.is_some() {
			return Err(TransactionError::AlreadyInProgress.into());
		}
		let txn = self.begin_transaction(read_only);
		self.txn = Some(txn);
		Ok(())
	}

	/// `COMMIT`. A block that failed is rolled back instead.
	pub fn commit(&mut self) -> crate::Result<()> {
		let txn = self.txn.take().ok_or(TransactionError::NotInProgress)?;
		if std::mem::take(&mut self.failed) {
			debug!(session = self.id, "commit of failed transaction rolls back");
			txn.abort(&self.db);
			return Ok(());
		}
		self.commit_transaction(txn)
	}

	fn commit_transaction(&mut self, mut txn: Transaction) -> crate::Result<()> {
		let dropped = std::mem::take(&mut txn.dropped_sequences);
		txn.commit(&self.db)?;
		self.sequences.forget(&dropped);
		Ok(())
	}

	/// `ROLLBACK`
	pub fn rollback(&mut self) -> crate::Result<()> {
		let txn = self.txn.take().ok_or(TransactionError::NotInProgress)?;
		self.failed = false;
		txn.abort(&self.db);
		Ok(())
	}

	pub fn nextval(&mut self, name: &str) -> crate::Result<i64> {
		self.run(|ctx| {
			let def = ctx.resolve_sequence(name)?;
			functions::nextval_internal(ctx, def.id, true)
		})
	}

	/// `nextval(regclass)` by relation id.
	pub fn nextval_oid(&mut self, relid: RelationId) -> crate::Result<i64> {
		self.run(|ctx| functions::nextval_internal(ctx, relid, true))
	}

	pub fn currval(&mut self, name: &str) -> crate::Result<i64> {
		self.run(|ctx| {
			let def = ctx.resolve_sequence(name)?;
			functions::currval(ctx, def.id)
		})
	}

	pub fn lastval(&mut self) -> crate::Result<i64> {
		self.run(functions::lastval)
	}

	/// `setval(seq, value)`: the next `nextval` returns `value + increment`.
	pub fn setval(&mut self, name: &str, value: i64) -> crate::Result<i64> {
		self.setval_with_called(name, value, true)
	}

	/// `setval(seq, value, is_called)`
	pub fn setval_with_called(&mut self, name: &str, value: i64, is_called: bool) -> crate::Result<i64> {
		self.run(|ctx| {
			let def = ctx.resolve_sequence(name)?;
			functions::do_setval(ctx, def.id, value, is_called)?;
			Ok(value)
		})
	}

	pub fn create_sequence(&mut self, stmt: CreateSequence) -> crate::Result<Option<RelationId>> {
		self.run(|ctx| commands::define_sequence(ctx, &stmt))
	}

	pub fn alter_sequence(&mut self, stmt: AlterSequence) -> crate::Result<Option<RelationId>> {
		self.run(|ctx| commands::alter_sequence(ctx, &stmt))
	}

	/// `ALTER SEQUENCE ... SET LOGGED | SET UNLOGGED`
	pub fn alter_sequence_set_logged(&mut self, name: &str, logged: bool) -> crate::Result<()> {
		let persistence = if logged {
			Persistence::Permanent
		} else {
			Persistence::Unlogged
		};
		self.run(|ctx| {
			let def = ctx.resolve_sequence(name)?;
			commands::set_sequence_persistence(ctx, def, persistence)
		})
	}

	pub fn drop_sequence(&mut self, name: &str, if_exists: bool) -> crate::Result<()> {
		self.run(|ctx| commands::drop_sequence(ctx, name, if_exists))
	}

	pub fn create_table(&mut self, stmt: CreateTable) -> crate::Result<RelationId> {
		self.run(|ctx| table::create_table(ctx, &stmt))
	}

	pub fn drop_table(&mut self, name: &str, if_exists: bool) -> crate::Result<()> {
		self.run(|ctx| table::drop_table(ctx, name, if_exists))
	}

	/// `ALTER TABLE ... SET LOGGED | SET UNLOGGED`. Sequences owned by the
	/// table's columns follow.
	pub fn alter_table_set_logged(&mut self, name: &str, logged: bool) -> crate::Result<()> {
		let persistence = if logged {
			Persistence::Permanent
		} else {
			Persistence::Unlogged
		};
		self.run(|ctx| table::set_table_persistence(ctx, name, persistence))
	}

	/// `TRUNCATE ... RESTART IDENTITY`
	pub fn truncate_restart_identity(&mut self, name: &str) -> crate::Result<()> {
		self.run(|ctx| table::truncate_restart_identity(ctx, name))
	}

	/// Value an `INSERT` would put into an identity column.
	pub fn next_identity_value(&mut self, table: &str, column: &str) -> crate::Result<i64> {
		self.run(|ctx| table::next_identity_value(ctx, table, column))
	}

	/// `CREATE ACCESS METHOD name TYPE SEQUENCE HANDLER handler`
	pub fn create_access_method(&mut self, stmt: access_method::CreateAccessMethod) -> crate::Result<()> {
		self.run(|ctx| access_method::create_access_method(ctx, &stmt))
	}

	pub fn drop_access_method(&mut self, name: &str, if_exists: bool) -> crate::Result<()> {
		self.run(|ctx| access_method::drop_access_method(ctx, name, if_exists))
	}

	/// `pg_sequence_parameters`
	pub fn sequence_parameters(&mut self, name: &str) -> crate::Result<SequenceParameters> {
		self.run(|ctx| introspect::sequence_parameters(ctx, name))
	}

	/// `pg_get_sequence_data`
	pub fn sequence_data(&mut self, name: &str) -> crate::Result<SequenceData> {
		self.run(|ctx| introspect::sequence_data(ctx, name))
	}

	/// `pg_sequence_last_value`
	pub fn sequence_last_value(&mut self, name: &str) -> crate::Result<Option<i64>> {
		self.run(|ctx| introspect::sequence_last_value(ctx, name))
	}

	/// Current parameters of a sequence as an option list.
	pub fn sequence_options(&mut self, name: &str) -> crate::Result<Vec<SequenceOption>> {
		self.run(|ctx| introspect::sequence_options(ctx, name))
	}

	/// The `pg_sequences` view.
	pub fn list_sequences(&mut self) -> crate::Result<Vec<SequenceListing>> {
		self.run(introspect::list_sequences)
	}

	/// `DISCARD SEQUENCES`
	pub fn discard_sequences(&mut self) {
		debug!(session = self.id, cached = self.sequences.len(), "discarding sequence state");
		self.sequences.discard();
	}

	pub fn create_role(&mut self, name: &str, superuser: bool) -> crate::Result<RoleId> {
		self.run(|ctx| {
			ctx.require_superuser("create roles")?;
			Ok(ctx.db.catalog.create_role(&mut ctx.txn.catalog, name, superuser)?.id)
		})
	}

	/// `GRANT privileges ON relation TO role`
	pub fn grant(&mut self, relation: &str, role: &str, privileges: Privileges) -> crate::Result<()> {
		self.run(|ctx| {
			let def = ctx.db.catalog.get_relation_by_name(ctx.catalog_txn(), relation)?;
			ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;
			let grantee = ctx.db.catalog.find_role_by_name(ctx.catalog_txn(), role).ok_or_else(|| {
				CatalogError::RoleNotFound {
					name: role.to_string(),
				}
			})?;
			ctx.db.catalog.grant(&mut ctx.txn.catalog, def.id, grantee.id, privileges)
		})
	}

	/// `SET name = value`. The value holds until the session ends or the
	/// setting is reset, whatever happens to the transaction.
	#[instrument(name = "engine::session::set_config", level = "debug", skip(self))]
	pub fn set_config(&mut self, name: &str, raw: &str) -> crate::Result<()> {
		let def = self.db.settings.definition(name)?;
		let value = def.parse(raw)?;

		self.run(|ctx| {
			match def.context {
				SettingContext::Startup => {
					return Err(ConfigError::CantChange {
						name: def.name.clone(),
					}
					.into());
				}
				SettingContext::SuperUser if !ctx.is_superuser() => {
					return Err(ConfigError::PermissionDenied {
						name: def.name.clone(),
					}
					.into());
				}
				SettingContext::SuperUser | SettingContext::User => {}
			}
			def.check(
				&value,
				&CheckContext {
					catalog: Some((&ctx.db.catalog, &ctx.txn.catalog)),
				},
			)
		})?;

		self.settings.set(name, value);
		Ok(())
	}

	/// `SHOW name`
	pub fn show_config(&self, name: &str) -> crate::Result<SettingValue> {
		let def = self.db.settings.definition(name)?;
		Ok(self.settings.get(&self.db.settings, name).unwrap_or(def.default))
	}

	/// `RESET name`
	pub fn reset_config(&mut self, name: &str) -> crate::Result<()> {
		self.db.settings.definition(name)?;
		self.settings.reset(name);
		Ok(())
	}

	fn drop_temp_relations(&mut self) -> crate::Result<()> {
		let mut txn = self.begin_transaction(false);
		let temps: Vec<RelationDef> = self
			.db
			.catalog
			.list_relations(&txn.catalog)
			.into_iter()
			.filter(|relation| relation.is_local_temp(self.id))
			.collect();
		if temps.is_empty() {
			txn.abort(&self.db);
			return Ok(());
		}

		for relation in temps {
			debug!(name = %relation.name, "dropping temporary relation");
			if let Err(err) = self.db.catalog.drop_relation(&mut txn.catalog, relation.id) {
				txn.abort(&self.db);
				return Err(err);
			}
			if relation.kind == RelationKind::Sequence {
				txn.schedule_delete(relation.locator(), true);
			}
		}
		txn.commit(&self.db)
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		if let Some(txn) = self.txn.take() {
			txn.abort(&self.db);
		}
		if let Err(err) = self.drop_temp_relations() {
			warn!(session = self.id, error = %err, "failed to drop temporary relations");
		}
	}
}
