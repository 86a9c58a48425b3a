// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::RelationId;
use tracing::{debug, instrument};

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::RelationDef,
};

impl Catalog {
	/// Removes the relation together with its sequence or table row, its
	/// grants and every dependency it takes part in. Storage is left to the
	/// caller.
	#[instrument(name = "catalog::relation::drop", level = "debug", skip(self, txn))]
	pub fn drop_relation(&self, txn: &mut CatalogTxn, id: RelationId) -> crate::Result<RelationDef> {
		let state = self.state_mut(txn)?;
		let relation = state.relations.remove(&id).ok_or(CatalogError::RelationLookupFailed {
			id,
		})?;
		state.sequences.remove(&id);
		state.tables.remove(&id);
		state.grants.retain(|grant| grant.relation != id);
		state.dependencies.retain(|dependency| dependency.object != id && dependency.referenced != id);
		debug!(name = %relation.name, "relation dropped");
		Ok(relation)
	}
}
