// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::RelationId;
use tracing::trace;

use crate::{
	catalog::{Catalog, CatalogTxn},
	state::{DependencyDef, DependencyKind},
};

impl Catalog {
	pub fn record_dependency(&self, txn: &mut CatalogTxn, dependency: DependencyDef) -> crate::Result<()> {
		trace!(object = %dependency.object, referenced = %dependency.referenced, kind = ?dependency.kind, "dependency recorded");
		self.state_mut(txn)?.dependencies.push(dependency);
		Ok(())
	}

	/// Removes the dependencies of `object` of the given kind. Returns how
	/// many were removed.
	pub fn delete_dependencies(
		&self,
		txn: &mut CatalogTxn,
		object: RelationId,
		kind: DependencyKind,
	) -> crate::Result<usize> {
		let state = self.state_mut(txn)?;
		let before = state.dependencies.len();
		state.dependencies.retain(|dependency| !(dependency.object == object && dependency.kind == kind));
		Ok(before - state.dependencies.len())
	}

	/// The column owning a sequence. Without a kind, either kind matches.
	pub fn sequence_owner(
		&self,
		txn: &CatalogTxn,
		sequence: RelationId,
		kind: Option<DependencyKind>,
	) -> Option<DependencyDef> {
		self.state(txn)
			.dependencies
			.iter()
			.find(|dependency| dependency.object == sequence && kind.is_none_or(|kind| dependency.kind == kind))
			.cloned()
	}

	/// Sequences owned by columns of `table`.
	pub fn owned_sequences(&self, txn: &CatalogTxn, table: RelationId) -> Vec<DependencyDef> {
		self.state(txn).dependencies.iter().filter(|dependency| dependency.referenced == table).cloned().collect()
	}
}
