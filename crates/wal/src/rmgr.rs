// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::BTreeMap, sync::Arc};

use seqdb_storage::{BufferPool, Page};
use seqdb_type::Lsn;

use crate::{
	builtin::{GenericRmgr, SmgrRmgr, XactRmgr, XlogRmgr},
	error::WalError,
	record::{Record, RmgrId},
};

pub struct RedoContext<'a> {
	pub buffers: &'a BufferPool,
	pub start_lsn: Lsn,
	/// Position just past the record; replayed pages take this as their LSN.
	pub end_lsn: Lsn,
}

/// Replay and inspection hooks for the records of one resource manager.
pub trait ResourceManager: Send + Sync {
	fn id(&self) -> RmgrId;

	fn name(&self) -> &'static str;

	fn redo(&self, ctx: &RedoContext<'_>, record: &Record) -> crate::Result<()>;

	/// Human readable rendering of the record payload.
	fn desc(&self, record: &Record) -> String;

	/// Name of the record type for an info byte, `None` if unknown.
	fn identify(&self, info: u8) -> Option<&'static str>;

	/// Masks the parts of a page that may legitimately differ between the
	/// primary and a replayed copy.
	fn mask(&self, _page: &mut Page) {}
}

#[derive(Clone, Default)]
pub struct ResourceManagers {
	managers: BTreeMap<RmgrId, Arc<dyn ResourceManager>>,
}

impl ResourceManagers {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding the managers every database needs.
	pub fn with_builtin() -> Self {
		let mut result = Self::new();
		result.managers.insert(RmgrId::XLOG, Arc::new(XlogRmgr));
		result.managers.insert(RmgrId::XACT, Arc::new(XactRmgr));
		result.managers.insert(RmgrId::SMGR, Arc::new(SmgrRmgr));
		result.managers.insert(RmgrId::GENERIC, Arc::new(GenericRmgr));
		result
	}

	pub fn register(&mut self, manager: Arc<dyn ResourceManager>) -> crate::Result<()> {
		let id = manager.id();
		if self.managers.contains_key(&id) {
			return Err(WalError::DuplicateResourceManager {
				rmgr: id.0,
			}
			.into());
		}
		self.managers.insert(id, manager);
		Ok(())
	}

	pub fn get(&self, id: RmgrId) -> Option<&Arc<dyn ResourceManager>> {
		self.managers.get(&id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ResourceManager>> {
		self.managers.values()
	}
}
