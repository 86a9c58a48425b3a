// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Persistence, RelFileNumber, RelationId};
use tracing::{debug, instrument};

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::RelationDef,
};

impl Catalog {
	/// Points the relation at new storage. The old storage stays untouched,
	/// so aborting the transaction restores it.
	#[instrument(name = "catalog::relation::set_relfilenumber", level = "debug", skip(self, txn))]
	pub fn set_relfilenumber(
		&self,
		txn: &mut CatalogTxn,
		id: RelationId,
		relfilenumber: RelFileNumber,
		persistence: Persistence,
	) -> crate::Result<RelationDef> {
		let relation = self.state_mut(txn)?.relations.get_mut(&id).ok_or(CatalogError::RelationLookupFailed {
			id,
		})?;
		debug!(from = %relation.relfilenumber, to = %relfilenumber, "relfilenumber changed");
		relation.relfilenumber = relfilenumber;
		relation.persistence = persistence;
		Ok(relation.clone())
	}
}
