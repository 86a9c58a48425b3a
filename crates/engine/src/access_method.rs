// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_catalog::{AccessMethodKind, AccessMethodToCreate};
use tracing::{info, instrument};

use crate::{database::HEAP_TABLE_AM_HANDLER, error::SequenceError, session::Context};

/// `CREATE ACCESS METHOD name TYPE kind HANDLER handler`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccessMethod {
	pub name: String,
	pub kind: AccessMethodKind,
	pub handler: String,
}

impl CreateAccessMethod {
	pub fn sequence(name: impl Into<String>, handler: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind: AccessMethodKind::Sequence,
			handler: handler.into(),
		}
	}

	pub fn table(name: impl Into<String>, handler: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind: AccessMethodKind::Table,
			handler: handler.into(),
		}
	}
}

/// Sequence handlers are called once up front so a broken one is caught
/// before anything uses it.
#[instrument(name = "engine::access_method::create", level = "debug", skip_all, fields(name = %stmt.name))]
pub(crate) fn create_access_method(ctx: &mut Context<'_>, stmt: &CreateAccessMethod) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("CREATE ACCESS METHOD")?;
	ctx.require_superuser("create access method")?;

	match stmt.kind {
		AccessMethodKind::Sequence => {
			ctx.db.access_methods.call_handler(&stmt.handler)?;
		}
		AccessMethodKind::Table if stmt.handler != HEAP_TABLE_AM_HANDLER => {
			return Err(SequenceError::HandlerNotFound {
				handler: stmt.handler.clone(),
			}
			.into());
		}
		AccessMethodKind::Table => {}
	}

	let am = ctx.db.catalog.create_access_method(
		&mut ctx.txn.catalog,
		AccessMethodToCreate {
			name: stmt.name.clone(),
			kind: stmt.kind,
			handler: stmt.handler.clone(),
		},
	)?;
	info!(oid = %am.oid, kind = am.kind.name(), handler = %am.handler, "access method created");
	Ok(())
}

#[instrument(name = "engine::access_method::drop", level = "debug", skip(ctx))]
pub(crate) fn drop_access_method(ctx: &mut Context<'_>, name: &str, if_exists: bool) -> crate::Result<()> {
	ctx.prevent_command_if_read_only("DROP ACCESS METHOD")?;
	ctx.require_superuser("drop access method")?;

	match ctx.db.catalog.drop_access_method(&mut ctx.txn.catalog, name, if_exists)? {
		Some(am) => {
			ctx.db.access_methods.forget(am.oid);
			info!(oid = %am.oid, "access method dropped");
		}
		None => ctx.notice(format!("access method \"{}\" does not exist, skipping", name)),
	}
	Ok(())
}
