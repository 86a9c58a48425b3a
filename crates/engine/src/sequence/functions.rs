// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! `nextval`, `currval`, `lastval` and `setval`.

use std::sync::Arc;

use seqdb_catalog::{LockMode, Privileges, RelationDef, RelationKind};
use seqdb_type::{RelationId, return_internal_error};
use tracing::{instrument, trace};

use crate::{
	error::SequenceError,
	sequence::am::{SequenceAccessMethod, SequenceLimits},
	session::Context,
};

/// Routines of the access method a sequence is stored with.
pub(crate) fn sequence_routine(ctx: &Context<'_>, def: &RelationDef) -> crate::Result<Arc<dyn SequenceAccessMethod>> {
	let Some(am_oid) = def.access_method else {
		return_internal_error!("sequence \"{}\" has no access method", def.name);
	};
	ctx.db.access_methods.routine(&ctx.db.catalog, ctx.catalog_txn(), am_oid)
}

/// Opens a sequence for use in the current transaction: the relation is
/// locked once per transaction and cached values are dropped when the
/// sequence got new storage since they were fetched.
pub(crate) fn init_sequence(ctx: &mut Context<'_>, relid: RelationId) -> crate::Result<RelationDef> {
	let def = ctx.db.catalog.get_relation(ctx.catalog_txn(), relid)?;
	if def.kind != RelationKind::Sequence {
		return Err(SequenceError::NotASequence {
			name: def.name,
		}
		.into());
	}
	lock_and_open(ctx, def)
}

fn lock_and_open(ctx: &mut Context<'_>, def: RelationDef) -> crate::Result<RelationDef> {
	let lxid = ctx.txn.lxid;
	let locked = ctx.sequences.get(def.id).is_some_and(|entry| entry.lxid == Some(lxid));
	if !locked {
		ctx.lock(&def, LockMode::RowExclusive)?;
		ctx.sequences.entry(def.id).lxid = Some(lxid);
	}

	// A concurrent reset may have committed while we waited for the lock.
	let def = ctx.db.catalog.get_relation(ctx.catalog_txn(), def.id)?;
	ctx.sequences.sync_filenumber(def.id, def.relfilenumber);
	Ok(def)
}

#[instrument(name = "engine::sequence::nextval", level = "trace", skip(ctx))]
pub(crate) fn nextval_internal(ctx: &mut Context<'_>, relid: RelationId, check_permissions: bool) -> crate::Result<i64> {
	let def = init_sequence(ctx, relid)?;

	if check_permissions {
		ctx.check_privilege(&def, Privileges::USAGE | Privileges::UPDATE)?;
	}

	// Temporary sequences are private to the session, so they may change
	// in a read-only transaction.
	if !def.is_local_temp(ctx.session) {
		ctx.prevent_command_if_read_only("nextval()")?;
	}
	ctx.prevent_command_if_parallel_mode("nextval()")?;

	let entry = ctx.sequences.entry(relid);
	if entry.has_cached_values() {
		entry.last += entry.increment;
		let value = entry.last;
		ctx.sequences.set_last_used(relid);
		trace!(value, "served from session cache");
		return Ok(value);
	}

	let form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), relid)?;
	let routine = sequence_routine(ctx, &def)?;
	let next = {
		let mut rel = ctx.relation(def);
		routine.nextval(&mut rel, &SequenceLimits::from(&form))?
	};

	let entry = ctx.sequences.entry(relid);
	entry.increment = form.increment;
	entry.last = next.value;
	entry.cached = next.last;
	entry.last_valid = true;
	ctx.sequences.set_last_used(relid);
	Ok(next.value)
}

pub(crate) fn currval(ctx: &mut Context<'_>, relid: RelationId) -> crate::Result<i64> {
	let def = init_sequence(ctx, relid)?;
	ctx.check_privilege(&def, Privileges::SELECT | Privileges::USAGE)?;

	match ctx.sequences.get(relid) {
		Some(entry) if entry.last_valid => Ok(entry.last),
		_ => Err(SequenceError::CurrvalNotDefined {
			name: def.name,
		}
		.into()),
	}
}

pub(crate) fn lastval(ctx: &mut Context<'_>) -> crate::Result<i64> {
	let Some(relid) = ctx.sequences.last_used() else {
		return Err(SequenceError::LastvalNotDefined.into());
	};

	// The sequence may have been dropped since.
	let Some(def) = ctx.db.catalog.find_relation(ctx.catalog_txn(), relid) else {
		return Err(SequenceError::LastvalNotDefined.into());
	};

	let def = lock_and_open(ctx, def)?;
	ctx.check_privilege(&def, Privileges::SELECT | Privileges::USAGE)?;

	match ctx.sequences.get(relid) {
		Some(entry) if entry.last_valid => Ok(entry.last),
		_ => Err(SequenceError::LastvalNotDefined.into()),
	}
}

/// With `is_called` set the next `nextval` returns `next + increment`,
/// otherwise `next` itself.
#[instrument(name = "engine::sequence::setval", level = "debug", skip(ctx))]
pub(crate) fn do_setval(ctx: &mut Context<'_>, relid: RelationId, next: i64, is_called: bool) -> crate::Result<()> {
	let def = init_sequence(ctx, relid)?;
	ctx.check_privilege(&def, Privileges::UPDATE)?;

	let form = ctx.db.catalog.get_sequence(ctx.catalog_txn(), relid)?;

	if !def.is_local_temp(ctx.session) {
		ctx.prevent_command_if_read_only("setval()")?;
	}
	ctx.prevent_command_if_parallel_mode("setval()")?;

	if next < form.min || next > form.max {
		return Err(SequenceError::SetvalOutOfBounds {
			name: def.name,
			value: next,
			min: form.min,
			max: form.max,
		}
		.into());
	}

	let entry = ctx.sequences.entry(relid);
	if is_called {
		entry.last = next;
		entry.last_valid = true;
	}
	// Values fetched ahead are void now.
	entry.cached = entry.last;

	let routine = sequence_routine(ctx, &def)?;
	let mut rel = ctx.relation(def);
	if rel.needs_wal() {
		rel.assign_xid();
	}
	routine.setval(&mut rel, next, is_called)
}
