// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Tables as far as sequences care about them: columns, identity columns
//! and the commands that reach through to owned sequences. Tables carry no
//! row storage.

use seqdb_catalog::{
	CatalogError, ColumnDef, ColumnType, DependencyKind, IdentityKind, LockMode, RelationDef, RelationKind,
	RelationToCreate, SessionId,
};
use seqdb_type::{Persistence, RelationId};
use tracing::{debug, instrument};

use crate::{
	error::SequenceError,
	sequence::{
		commands::{self, CreateSequence},
		functions,
		params::SequenceOption,
	},
	session::Context,
};

/// One column of `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
	pub name: String,
	pub data_type: ColumnType,
	pub identity: Option<IdentityKind>,
	/// Options of the identity sequence, as in
	/// `GENERATED ALWAYS AS IDENTITY (options)`.
	pub identity_options: Vec<SequenceOption>,
}

impl ColumnSpec {
	pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
		Self {
			name: name.into(),
			data_type,
			identity: None,
			identity_options: Vec::new(),
		}
	}

	pub fn identity(mut self, kind: IdentityKind) -> Self {
		self.identity = Some(kind);
		self
	}

	pub fn identity_options(mut self, options: impl IntoIterator<Item = SequenceOption>) -> Self {
		self.identity_options.extend(options);
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
	pub name: String,
	pub persistence: Persistence,
	pub columns: Vec<ColumnSpec>,
}

impl CreateTable {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			persistence: Persistence::Permanent,
			columns: Vec::new(),
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

	pub fn column(mut self, column: ColumnSpec) -> Self {
		self.columns.push(column);
		self
	}
}

fn type_name(data_type: ColumnType) -> &'static str {
	match data_type {
		ColumnType::Int2 => "smallint",
		ColumnType::Int4 => "integer",
		ColumnType::Int8 => "bigint",
		ColumnType::Text => "text",
	}
}

fn resolve_table(ctx: &Context<'_>, name: &str) -> crate::Result<RelationDef> {
	let def = ctx.db.catalog.get_relation_by_name(ctx.catalog_txn(), name)?;
	if def.kind != RelationKind::Table {
		return Err(SequenceError::NotATable {
			name: def.name,
		}
		.into());
	}
	Ok(def)
}

/// `{table}_{column}_seq`, numbered when taken.
fn choose_sequence_name(ctx: &Context<'_>, table: &str, column: &str, temp_owner: Option<SessionId>) -> String {
	let relations = ctx.db.catalog.list_relations(ctx.catalog_txn());
	let taken = |name: &str| relations.iter().any(|relation| relation.name == name && relation.temp_owner == temp_owner);

	let base = format!("{}_{}_seq", table, column);
	if !taken(&base) {
		return base;
	}
	let mut n = 1;
	loop {
		let name = format!("{}{}", base, n);
		if !taken(&name) {
			return name;
		}
		n += 1;
	}
}

/// Creates a table. Every identity column gets a sequence of its own,
/// owned by the column and of the same persistence as the table.
#[instrument(name = "engine::table::create", level = "debug", skip_all, fields(name = %stmt.name))]
pub(crate) fn create_table(ctx: &mut Context<'_>, stmt: &CreateTable) -> crate::Result<RelationId> {
	ctx.prevent_command_if_read_only("CREATE TABLE")?;

	let temp_owner = (stmt.persistence == Persistence::Temporary).then_some(ctx.session);
	let def = ctx.db.catalog.create_relation(
		&mut ctx.txn.catalog,
		RelationToCreate {
			name: stmt.name.clone(),
			kind: RelationKind::Table,
			persistence: stmt.persistence,
			access_method: None,
			owner: ctx.role,
			temp_owner,
		},
	)?;
	ctx.lock(&def, LockMode::AccessExclusive)?;

	let columns = stmt
		.columns
		.iter()
		.map(|column| ColumnDef {
			name: column.name.clone(),
			data_type: column.data_type,
			identity: column.identity,
		})
		.collect();
	ctx.db.catalog.store_table(&mut ctx.txn.catalog, def.id, columns)?;

	for column in stmt.columns.iter().filter(|column| column.identity.is_some()) {
		let mut sequence_name = None;
		let mut options = vec![SequenceOption::As(type_name(column.data_type).to_string())];
		for option in &column.identity_options {
			match option {
				SequenceOption::SequenceName(name) => sequence_name = Some(name.clone()),
				option => options.push(option.clone()),
			}
		}
		options.push(SequenceOption::OwnedBy(vec![stmt.name.clone(), column.name.clone()]));

		let name = match sequence_name {
			Some(name) => name,
			None => choose_sequence_name(ctx, &stmt.name, &column.name, temp_owner),
		};
		let mut create = CreateSequence::new(name).options(options);
		create.persistence = stmt.persistence;
		create.for_identity = true;
		commands::define_sequence(ctx, &create)?;
	}

	debug!(relid = %def.id, "table created");
	Ok(def.id)
}

/// `DROP TABLE [IF EXISTS] name`, together with the sequences its columns
/// own.
#[instrument(name = "engine::table::drop", level = "debug", skip(ctx))]
pub(crate) fn drop_table(ctx: &mut Context<'_>, name: &str, if_exists: bool) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("DROP TABLE")?;

	let Some(def) = ctx.db.catalog.find_relation_by_name(ctx.catalog_txn(), name) else {
		if if_exists {
			ctx.notice(format!("table \"{}\" does not exist, skipping", name));
			return Ok(());
		}
		return Err(CatalogError::RelationNotFound {
			name: name.to_string(),
		}
		.into());
	};
	if def.kind != RelationKind::Table {
		return Err(SequenceError::NotATable {
			name: def.name,
		}
		.into());
	}
	ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;
	ctx.lock(&def, LockMode::AccessExclusive)?;

	for owned in ctx.db.catalog.owned_sequences(ctx.catalog_txn(), def.id) {
		let Some(seq) = ctx.db.catalog.find_relation(ctx.catalog_txn(), owned.object) else {
			continue;
		};
		ctx.lock(&seq, LockMode::AccessExclusive)?;
		commands::remove_sequence(ctx, &seq)?;
	}

	ctx.db.catalog.drop_relation(&mut ctx.txn.catalog, def.id)?;
	debug!(relid = %def.id, "table dropped");
	Ok(())
}

/// `ALTER TABLE ... SET LOGGED | SET UNLOGGED`
#[instrument(name = "engine::table::set_persistence", level = "debug", skip(ctx))]
pub(crate) fn set_table_persistence(ctx: &mut Context<'_>, name: &str, persistence: Persistence) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("ALTER TABLE")?;

	let def = resolve_table(ctx, name)?;
	ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;
	ctx.lock(&def, LockMode::AccessExclusive)?;

	if def.persistence == Persistence::Temporary {
		return Err(SequenceError::TemporaryPersistence {
			object: "table",
			name: def.name,
		}
		.into());
	}
	if def.persistence == persistence {
		return Ok(());
	}

	ctx.db.catalog.set_relfilenumber(&mut ctx.txn.catalog, def.id, def.relfilenumber, persistence)?;

	for owned in ctx.db.catalog.owned_sequences(ctx.catalog_txn(), def.id) {
		let seq = ctx.db.catalog.get_relation(ctx.catalog_txn(), owned.object)?;
		if seq.persistence != persistence {
			commands::sequence_change_persistence(ctx, seq.id, persistence)?;
		}
	}
	Ok(())
}

/// `TRUNCATE name RESTART IDENTITY`: every sequence owned by a column of
/// the table restarts at its start value.
#[instrument(name = "engine::table::truncate_restart_identity", level = "debug", skip(ctx))]
pub(crate) fn truncate_restart_identity(ctx: &mut Context<'_>, name: &str) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("TRUNCATE TABLE")?;

	let def = resolve_table(ctx, name)?;
	ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &def)?;
	ctx.lock(&def, LockMode::AccessExclusive)?;

	for owned in ctx.db.catalog.owned_sequences(ctx.catalog_txn(), def.id) {
		let seq = ctx.db.catalog.get_relation(ctx.catalog_txn(), owned.object)?;
		ctx.db.catalog.check_owner(ctx.catalog_txn(), ctx.role, &seq)?;
		ctx.lock(&seq, LockMode::AccessExclusive)?;
		commands::reset_sequence(ctx, seq.id)?;
	}
	Ok(())
}

/// Next value of an identity column's sequence, as an `INSERT` omitting
/// the column would use it.
pub(crate) fn next_identity_value(ctx: &mut Context<'_>, table: &str, column: &str) -> crate::Result<i64> {
	let def = resolve_table(ctx, table)?;
	let column = ctx.db.catalog.get_column(ctx.catalog_txn(), def.id, column)?;

	let sequence = ctx
		.db
		.catalog
		.owned_sequences(ctx.catalog_txn(), def.id)
		.into_iter()
		.find(|owned| owned.column == column.name && owned.kind == DependencyKind::Internal);
	let (Some(_), Some(sequence)) = (column.identity, sequence) else {
		return Err(SequenceError::NotAnIdentityColumn {
			column: column.name,
			table: def.name,
		}
		.into());
	};

	functions::nextval_internal(ctx, sequence.object, false)
}
