// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! `CREATE`, `ALTER` and `DROP SEQUENCE`, plus the sequence side of table
//! commands.

use seqdb_catalog::{
	AccessMethodKind, CatalogError, DependencyDef, DependencyKind, LockMode, RelationDef, RelationKind,
	RelationToCreate, SequenceDef,
};
use seqdb_type::{Oid, Persistence, RelationId, SequenceType, return_internal_error};
use tracing::{debug, info, instrument};

use crate::{
	database::LOCAL_SEQUENCE_AM,
	error::SequenceError,
	sequence::{
		functions::{init_sequence, sequence_routine},
		params::{SequenceOption, init_params},
	},
	session::Context,
};

/// `CREATE [TEMPORARY | UNLOGGED] SEQUENCE [IF NOT EXISTS] name [USING am]
/// options`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSequence {
	pub name: String,
	pub persistence: Persistence,
	pub if_not_exists: bool,
	/// Falls back to `default_sequence_access_method` when absent.
	pub access_method: Option<String>,
	pub options: Vec<SequenceOption>,
	pub(crate) for_identity: bool,
}

impl CreateSequence {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			persistence: Persistence::Permanent,
			if_not_exists: false,
			access_method: None,
			options: Vec::new(),
			for_identity: false,
		}
	}

	pub fn temporary(mut self) -> Self {
		self.persistence = Persistence::Temporary;
		self
	}

	pub fn unlogged(mut self) -> Self {
		self.persistence = Persistence::Unlogged;
		self
	}

	pub fn if_not_exists(mut self) -> Self {
		self.if_not_exists = true;
		self
	}

	pub fn using(mut self, access_method: impl Into<String>) -> Self {
		self.access_method = Some(access_method.into());
		self
	}

	pub fn option(mut self, option: SequenceOption) -> Self {
		self.options.push(option);
		self
	}

	pub fn options(mut self, options: impl IntoIterator<Item = SequenceOption>) -> Self {
		self.options.extend(options);
		self
	}
}

/// `ALTER SEQUENCE [IF EXISTS] name options`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterSequence {
	pub name: String,
	pub if_exists: bool,
	pub options: Vec<SequenceOption>,
	pub(crate) for_identity: bool,
}

impl AlterSequence {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			if_exists: false,
			options: Vec::new(),
			for_identity: false,
		}
	}

	pub fn if_exists(mut self) -> Self {
		self.if_exists = true;
		self
	}

	pub fn option(mut self, option: SequenceOption) -> Self {
		self.options.push(option);
		self
	}

	pub fn options(mut self, options: impl IntoIterator<Item = SequenceOption>) -> Self {
		self.options.extend(options);
		self
	}
}

/// Creates a sequence. Returns `None` when it already existed and
/// `IF NOT EXISTS` was given.
#[instrument(name = "engine::sequence::define", level = "debug", skip_all, fields(name = %stmt.name))]
pub(crate) fn define_sequence(ctx: &mut Context<'_>, stmt: &CreateSequence) -> crate::Result<Option<RelationId>> {
	ctx.prevent_command_if_read_only("CREATE SEQUENCE")?;

	let temp_owner = (stmt.persistence == Persistence::Temporary).then_some(ctx.session);
	if stmt.if_not_exists {
		let exists = ctx
			.db
			.catalog
			.list_relations(ctx.catalog_txn())
			.iter()
			.any(|relation| relation.name == stmt.name && relation.temp_owner == temp_owner);
		if exists {
			ctx.notice(format!("relation \"{}\" already exists, skipping", stmt.name));
			return Ok(None);
		}
	}

	let mut form = SequenceDef {
		relid: RelationId(Oid::INVALID),
		seq_type: SequenceType::Int8,
		start: 0,
		increment: 0,
		max: 0,
		min: 0,
		cache: 0,
		cycle: false,
	};
	let params = init_params(&stmt.options, stmt.for_identity, true, &mut form, 0, false)?;

	let am_name = match &stmt.access_method {
		Some(name) => name.clone(),
		None => ctx
			.settings
			.get(&ctx.db.settings, "default_sequence_access_method")
			.and_then(|value| value.as_str().map(str::to_string))
			.unwrap_or_else(|| LOCAL_SEQUENCE_AM.to_string()),
	};
	let Some(am_oid) = ctx.db.catalog.get_sequence_am_oid(ctx.catalog_txn(), &am_name, false)? else {
		return_internal_error!("sequence access method \"{}\" vanished during lookup", am_name);
	};
	let routine = ctx.db.access_methods.routine(&ctx.db.catalog, ctx.catalog_txn(), am_oid)?;

	let table_am = routine.get_table_am();
	let table_am_exists = ctx
		.db
		.catalog
		.find_access_method_by_name(ctx.catalog_txn(), table_am)
		.is_some_and(|am| am.kind == AccessMethodKind::Table);
	if !table_am_exists {
		return Err(CatalogError::AccessMethodNotFound {
			name: table_am.to_string(),
			kind: "table ",
		}
		.into());
	}

	let def = ctx.db.catalog.create_relation(
		&mut ctx.txn.catalog,
		RelationToCreate {
			name: stmt.name.clone(),
			kind: RelationKind::Sequence,
			persistence: stmt.persistence,
			access_method: Some(am_oid),
			owner: ctx.role,
			temp_owner,
		},
	)?;
	ctx.lock(&def, LockMode::AccessExclusive)?;

	let def = {
		let mut rel = ctx.relation(def);
		rel.create_storage()?;
		routine.init(&mut rel, params.last_value, params.is_called)?;
		rel.into_def()
	};

	if let Some(owned_by) = &params.owned_by {
		process_owned_by(ctx, &def, owned_by, stmt.for_identity)?;
	}

	form.relid = def.id;
	ctx.db.catalog.store_sequence(&mut ctx.txn.catalog, form)?;
	info!(relid = %def.id, access_method = %am_name, persistence = %def.persistence, "sequence created");
	Ok(Some(def.id))
}

/// Changes the parameters of a sequence. Anything but `OWNED BY` rewrites
/// its stored state through the access method.
#[instrument(name = "engine::sequence::alter", level = "debug", skip_all, fields(name = %stmt.name))]
pub(crate) fn alter_sequence(ctx: &mut Context<'_>, stmt: &AlterSequence) -> crate::Result<Option<RelationId>> {
	ctx.prevent_command_if_read_only("ALTER SEQUENCE")?;

	let Some(def) = ctx.db.catalog.find_relation_by_name(ctx.catalog_txn(), &stmt.name) else {
		if stmt.if_exists {
			ctx.notice(format!("relation \"{}\" does not exist, skipping", stmt.name));
			return Ok(None);
		}
		return Err(CatalogError::RelationNotFound {
			name: stmt.name.clone(),
		}
		.into());
	};
	if def.kind != RelationKind::Sequence {
		return Err(SequenceError::NotASequence {
			name: def.name,
		}
		.into());
	}

	ctx.lock(&def, LockMode::ShareRowExclusive)?;
	ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;

	let def = init_sequence(ctx, def.id)?;
	let mut form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), def.id)?;
	let routine = sequence_routine(ctx, &def)?;
	let (last_value, is_called) = {
		let rel = ctx.relation(def.clone());
		routine.get_state(&rel)?
	};

	let params = init_params(&stmt.options, stmt.for_identity, false, &mut form, last_value, is_called)?;

	let def = if params.need_seq_rewrite {
		let mut rel = ctx.relation(def);
		if rel.needs_wal() {
			rel.assign_xid();
		}
		routine.reset(&mut rel, params.last_value, params.is_called, params.reset_state)?;
		rel.into_def()
	} else {
		def
	};

	// Values fetched ahead under the old parameters are void.
	let entry = ctx.sequences.entry(def.id);
	entry.cached = entry.last;

	if let Some(owned_by) = &params.owned_by {
		process_owned_by(ctx, &def, owned_by, stmt.for_identity)?;
	}

	ctx.db.catalog.store_sequence(&mut ctx.txn.catalog, form)?;
	debug!(relid = %def.id, rewritten = params.need_seq_rewrite, "sequence altered");
	Ok(Some(def.id))
}

/// `ALTER SEQUENCE ... SET LOGGED | SET UNLOGGED`
pub(crate) fn set_sequence_persistence(
	ctx: &mut Context<'_>,
	def: RelationDef,
	persistence: Persistence,
) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("ALTER SEQUENCE")?;
	ctx.lock(&def, LockMode::AccessExclusive)?;
	ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;

	if def.persistence == Persistence::Temporary {
		return Err(SequenceError::TemporaryPersistence {
			object: "sequence",
			name: def.name,
		}
		.into());
	}
	if def.persistence == persistence {
		return Ok(());
	}
	sequence_change_persistence(ctx, def.id, persistence)
}

/// Moves a sequence to storage of the new persistence, keeping its state.
#[instrument(name = "engine::sequence::change_persistence", level = "debug", skip(ctx))]
pub(crate) fn sequence_change_persistence(
	ctx: &mut Context<'_>,
	relid: RelationId,
	persistence: Persistence,
) -> crate::Result<()> {
	let def = ctx.db.catalog.get_relation(ctx.catalog_txn(), relid)?;
	ctx.lock(&def, LockMode::AccessExclusive)?;

	let def = init_sequence(ctx, relid)?;
	let routine = sequence_routine(ctx, &def)?;
	let mut rel = ctx.relation(def);
	if rel.needs_wal() {
		rel.assign_xid();
	}
	routine.change_persistence(&mut rel, persistence)
}

/// `DROP SEQUENCE [IF EXISTS] name`. Sequences backing an identity column
/// go away with their column only.
#[instrument(name = "engine::sequence::drop", level = "debug", skip(ctx))]
pub(crate) fn drop_sequence(ctx: &mut Context<'_>, name: &str, if_exists: bool) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("DROP SEQUENCE")?;

	let Some(def) = ctx.db.catalog.find_relation_by_name(ctx.catalog_txn(), name) else {
		if if_exists {
			ctx.notice(format!("sequence \"{}\" does not exist, skipping", name));
			return Ok(());
		}
		return Err(CatalogError::RelationNotFound {
			name: name.to_string(),
		}
		.into());
	};
	if def.kind != RelationKind::Sequence {
		return Err(SequenceError::NotASequence {
			name: def.name,
		}
		.into());
	}
	ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;

	if let Some(owner) = ctx.db.catalog.sequence_owner(ctx.catalog_txn(), def.id, Some(DependencyKind::Internal)) {
		let table = ctx.db.catalog.get_relation(ctx.catalog_txn(), owner.referenced)?;
		return Err(SequenceError::IdentitySequenceRequired {
			name: def.name,
			column: owner.column,
			table: table.name,
		}
		.into());
	}

	ctx.lock(&def, LockMode::AccessExclusive)?;
	remove_sequence(ctx, &def)
}

/// Drops the catalog entries of a sequence. Its storage goes at commit.
pub(crate) fn remove_sequence(ctx: &mut Context<'_>, def: &RelationDef) -> crate::Result<()> {
	ctx.db.catalog.drop_relation(&mut ctx.txn.catalog, def.id)?;
	ctx.txn.schedule_delete(def.locator(), true);
	ctx.txn.dropped_sequences.push(def.id);
	debug!(name = %def.name, relid = %def.id, "sequence dropped");
	Ok(())
}

/// Links a sequence to a table column (`OWNED BY table.column`) or unlinks
/// it (`OWNED BY NONE`).
pub(crate) fn process_owned_by(
	ctx: &mut Context<'_>,
	seq: &RelationDef,
	owned_by: &[String],
	for_identity: bool,
) -> crate::Result<()> {
	let kind = if for_identity {
		DependencyKind::Internal
	} else {
		DependencyKind::Auto
	};

	let owner = match owned_by {
		[] => return Err(SequenceError::InvalidOwnedBy.into()),
		[none] if none.eq_ignore_ascii_case("none") => None,
		[_] => return Err(SequenceError::InvalidOwnedBy.into()),
		[table_name @ .., column] => {
			let table_name = table_name.join(".");
			let table = ctx.db.catalog.get_relation_by_name(ctx.catalog_txn(), &table_name)?;
			ctx.lock(&table, LockMode::AccessShare)?;

			if table.kind != RelationKind::Table {
				return Err(SequenceError::OwnerNotTable {
					name: table.name,
				}
				.into());
			}
			if table.owner != seq.owner {
				return Err(SequenceError::OwnerMismatch.into());
			}

			let column = ctx.db.catalog.get_column(ctx.catalog_txn(), table.id, column)?;
			Some((table.id, column.name))
		}
	};

	// OWNED BY on its own cannot take a sequence away from an identity
	// column.
	if kind == DependencyKind::Auto {
		if let Some(identity) =
			ctx.db.catalog.sequence_owner(ctx.catalog_txn(), seq.id, Some(DependencyKind::Internal))
		{
			let table = ctx.db.catalog.get_relation(ctx.catalog_txn(), identity.referenced)?;
			return Err(SequenceError::IdentityOwnershipChange {
				sequence: seq.name.clone(),
				table: table.name,
			}
			.into());
		}
	}

	ctx.db.catalog.delete_dependencies(&mut ctx.txn.catalog, seq.id, kind)?;
	if let Some((referenced, column)) = owner {
		ctx.db.catalog.record_dependency(
			&mut ctx.txn.catalog,
			DependencyDef {
				object: seq.id,
				referenced,
				column,
				kind,
			},
		)?;
	}
	Ok(())
}

/// Restarts a sequence at its start value on new storage, as
/// `TRUNCATE ... RESTART IDENTITY` does.
pub(crate) fn reset_sequence(ctx: &mut Context<'_>, relid: RelationId) -> crate::Result<()> {
	let def = init_sequence(ctx, relid)?;
	let form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), relid)?;
	let routine = sequence_routine(ctx, &def)?;
	{
		let mut rel = ctx.relation(def);
		routine.reset(&mut rel, form.start, false, true)?;
	}

	let entry = ctx.sequences.entry(relid);
	entry.cached = entry.last;
	Ok(())
}
