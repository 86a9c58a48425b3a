// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Read-only views of sequences: `pg_sequence_parameters`,
//! `pg_get_sequence_data`, `pg_sequence_last_value` and `pg_sequences`.

use seqdb_catalog::{Privileges, RelationDef, RelationKind};
use seqdb_type::{Persistence, SequenceType};

use crate::{
	sequence::{
		functions::{init_sequence, sequence_routine},
		params::SequenceOption,
	},
	session::Context,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceParameters {
	pub start: i64,
	pub min: i64,
	pub max: i64,
	pub increment: i64,
	pub cycle: bool,
	pub cache: i64,
	pub seq_type: SequenceType,
}

/// Stored state of a sequence. Both fields are `None` when the caller may
/// not see it or it cannot be read right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceData {
	pub last_value: Option<i64>,
	pub is_called: Option<bool>,
}

/// One row of `pg_sequences`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceListing {
	pub name: String,
	pub owner: String,
	pub data_type: SequenceType,
	pub start: i64,
	pub min: i64,
	pub max: i64,
	pub increment: i64,
	pub cycle: bool,
	pub cache: i64,
	/// `None` without privileges, before the first `nextval`, or while the
	/// state is unreadable.
	pub last_value: Option<i64>,
}

pub(crate) fn sequence_parameters(ctx: &mut Context<'_>, name: &str) -> crate::Result<SequenceParameters> {
	let def = ctx.resolve_sequence(name)?;
	ctx.check_privilege(&def, Privileges::SELECT | Privileges::UPDATE | Privileges::USAGE)?;

	let form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), def.id)?;
	Ok(SequenceParameters {
		start: form.start,
		min: form.min,
		max: form.max,
		increment: form.increment,
		cycle: form.cycle,
		cache: form.cache,
		seq_type: form.seq_type,
	})
}

/// Reads `(last_value, is_called)` unless the state belongs to another
/// session or is unlogged and recovery is still running.
fn read_state(ctx: &mut Context<'_>, def: RelationDef) -> crate::Result<Option<(i64, bool)>> {
	if def.is_other_temp(ctx.session) {
		return Ok(None);
	}
	if def.persistence != Persistence::Permanent && ctx.db.in_recovery() {
		return Ok(None);
	}

	let routine = sequence_routine(ctx, &def)?;
	let rel = ctx.relation(def);
	routine.get_state(&rel).map(Some)
}

pub(crate) fn sequence_data(ctx: &mut Context<'_>, name: &str) -> crate::Result<SequenceData> {
	let def = ctx.resolve_sequence(name)?;
	let def = init_sequence(ctx, def.id)?;

	if !ctx.has_privilege(&def, Privileges::SELECT) {
		return Ok(SequenceData::default());
	}
	Ok(match read_state(ctx, def)? {
		Some((last_value, is_called)) => SequenceData {
			last_value: Some(last_value),
			is_called: Some(is_called),
		},
		None => SequenceData::default(),
	})
}

/// Last value handed out, `None` before the first `nextval`.
pub(crate) fn sequence_last_value(ctx: &mut Context<'_>, name: &str) -> crate::Result<Option<i64>> {
	let def = ctx.resolve_sequence(name)?;
	ctx.check_privilege(&def, Privileges::SELECT | Privileges::USAGE)?;
	last_value(ctx, def)
}

fn last_value(ctx: &mut Context<'_>, def: RelationDef) -> crate::Result<Option<i64>> {
	let def = init_sequence(ctx, def.id)?;
	Ok(read_state(ctx, def)?.and_then(|(last_value, is_called)| is_called.then_some(last_value)))
}

/// Current parameters as the option list that recreates them.
pub(crate) fn sequence_options(ctx: &mut Context<'_>, name: &str) -> crate::Result<Vec<SequenceOption>> {
	let def = ctx.resolve_sequence(name)?;
	let form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), def.id)?;
	Ok(vec![
		SequenceOption::Cache(form.cache),
		SequenceOption::Cycle(form.cycle),
		SequenceOption::Increment(form.increment),
		SequenceOption::MaxValue(Some(form.max)),
		SequenceOption::MinValue(Some(form.min)),
		SequenceOption::Start(form.start),
	])
}

/// Every sequence the session can see, ordered by relation id.
pub(crate) fn list_sequences(ctx: &mut Context<'_>) -> crate::Result<Vec<SequenceListing>> {
	let sequences: Vec<RelationDef> = ctx
		.db
		.catalog
		.list_relations(ctx.catalog_txn())
		.into_iter()
		.filter(|relation| relation.kind == RelationKind::Sequence && !relation.is_other_temp(ctx.session))
		.collect();

	let mut listing = Vec::with_capacity(sequences.len());
	for def in sequences {
		let form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), def.id)?;
		let owner = ctx.db.catalog.get_role(ctx.catalog_txn(), def.owner)?.name;
		let last_value = if ctx.has_privilege(&def, Privileges::SELECT | Privileges::USAGE) {
			last_value(ctx, def.clone())?
		} else {
			None
		};

		listing.push(SequenceListing {
			name: def.name,
			owner,
			data_type: form.seq_type,
			start: form.start,
			min: form.min,
			max: form.max,
			increment: form.increment,
			cycle: form.cycle,
			cache: form.cache,
			last_value,
		});
	}
	Ok(listing)
}
