// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use dashmap::DashMap;
use parking_lot::RwLock;
use seqdb_catalog::{AccessMethodKind, Catalog, CatalogTxn, SequenceDef};
use seqdb_type::{Oid, Persistence};
use tracing::{debug, instrument};

use crate::{
	error::{ConfigError, SequenceError},
	relation::Relation,
	settings::{CheckContext, SettingValue},
};

/// Limits a sequence's `nextval` works within, taken from its catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLimits {
	pub increment: i64,
	pub max: i64,
	pub min: i64,
	/// Number of values to hand out per call.
	pub cache: i64,
	pub cycle: bool,
}

impl From<&SequenceDef> for SequenceLimits {
	fn from(def: &SequenceDef) -> Self {
		Self {
			increment: def.increment,
			max: def.max,
			min: def.min,
			cache: def.cache,
			cycle: def.cycle,
		}
	}
}

/// Result of one `nextval` call into an access method: the value to return
/// and the last value of the batch the session may hand out from its cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextValue {
	pub value: i64,
	pub last: i64,
}

/// Storage engine behind a sequence.
///
/// Every callback receives the opened sequence relation. Callers hold the
/// locks the operation needs and have assigned a transaction id when the
/// relation is WAL-logged.
pub trait SequenceAccessMethod: Send + Sync {
	/// Table access method the sequence relation is created with.
	fn get_table_am(&self) -> &'static str;

	/// Fills the freshly created relation with its initial state.
	fn init(&self, rel: &mut Relation<'_>, last_value: i64, is_called: bool) -> crate::Result<()>;

	fn nextval(&self, rel: &mut Relation<'_>, limits: &SequenceLimits) -> crate::Result<NextValue>;

	fn setval(&self, rel: &mut Relation<'_>, next: i64, is_called: bool) -> crate::Result<()>;

	/// Gives the relation new storage holding `start`. With `reset_state`
	/// unset the engine may keep internal state such as its log counter.
	fn reset(&self, rel: &mut Relation<'_>, start: i64, is_called: bool, reset_state: bool) -> crate::Result<()>;

	/// Current `(last_value, is_called)`.
	fn get_state(&self, rel: &Relation<'_>) -> crate::Result<(i64, bool)>;

	fn change_persistence(&self, rel: &mut Relation<'_>, persistence: Persistence) -> crate::Result<()>;
}

/// Registered handler function. Returns the routines of an access method,
/// or nothing when the handler is broken.
pub type SequenceAmHandler = Arc<dyn Fn() -> Option<Arc<dyn SequenceAccessMethod>> + Send + Sync>;

/// Handler functions by name plus the routines already resolved per access
/// method.
#[derive(Default)]
pub struct SequenceAmRegistry {
	handlers: RwLock<HashMap<String, SequenceAmHandler>>,
	routines: DashMap<Oid, Arc<dyn SequenceAccessMethod>>,
}

impl Debug for SequenceAmRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SequenceAmRegistry")
			.field("handlers", &self.handlers.read().keys().collect::<Vec<_>>())
			.field("resolved", &self.routines.len())
			.finish()
	}
}

impl SequenceAmRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_handler(&self, name: &str, handler: SequenceAmHandler) {
		debug!(handler = name, "sequence access method handler registered");
		self.handlers.write().insert(name.to_string(), handler);
	}

	pub fn has_handler(&self, name: &str) -> bool {
		self.handlers.read().contains_key(name)
	}

	/// Calls a handler function and checks that it produced routines.
	pub fn call_handler(&self, name: &str) -> crate::Result<Arc<dyn SequenceAccessMethod>> {
		let handler = self.handlers.read().get(name).cloned().ok_or_else(|| SequenceError::HandlerNotFound {
			handler: name.to_string(),
		})?;

		handler().ok_or_else(|| {
			SequenceError::HandlerReturnedNothing {
				handler: name.to_string(),
			}
			.into()
		})
	}

	/// Routines of the sequence access method `am_oid`, resolved once and
	/// cached afterwards.
	#[instrument(name = "engine::sequence::am::routine", level = "trace", skip(self, catalog, txn))]
	pub fn routine(&self, catalog: &Catalog, txn: &CatalogTxn, am_oid: Oid) -> crate::Result<Arc<dyn SequenceAccessMethod>> {
		if let Some(routine) = self.routines.get(&am_oid) {
			return Ok(routine.value().clone());
		}

		let am = catalog.get_access_method(txn, am_oid)?;
		if am.kind != AccessMethodKind::Sequence {
			return Err(seqdb_catalog::CatalogError::AccessMethodWrongType {
				name: am.name,
				expected: AccessMethodKind::Sequence.name(),
			}
			.into());
		}

		let routine = self.call_handler(&am.handler)?;
		self.routines.insert(am_oid, routine.clone());
		Ok(routine)
	}

	/// Forgets the resolved routines of a dropped access method.
	pub fn forget(&self, am_oid: Oid) {
		self.routines.remove(&am_oid);
	}
}

pub const MAX_ACCESS_METHOD_NAME_LEN: usize = 63;

/// Check hook of `default_sequence_access_method`. The catalog lookup only
/// happens inside a transaction; at startup the name is accepted as is.
pub fn check_default_sequence_access_method(value: &SettingValue, ctx: &CheckContext<'_>) -> crate::Result<()> {
	let name = value.as_str().unwrap_or_default();
	let invalid = |detail: String| ConfigError::InvalidValue {
		name: "default_sequence_access_method".to_string(),
		value: name.to_string(),
		detail: Some(detail),
	};

	if name.is_empty() {
		return Err(invalid("default_sequence_access_method cannot be empty.".to_string()).into());
	}

	if name.len() > MAX_ACCESS_METHOD_NAME_LEN {
		return Err(invalid(format!(
			"default_sequence_access_method is too long (maximum {} characters).",
			MAX_ACCESS_METHOD_NAME_LEN
		))
		.into());
	}

	if let Some((catalog, txn)) = ctx.catalog {
		if catalog.get_sequence_am_oid(txn, name, true)?.is_none() {
			return Err(ConfigError::SequenceAmNotFound {
				name: name.to_string(),
			}
			.into());
		}
	}
	Ok(())
}
