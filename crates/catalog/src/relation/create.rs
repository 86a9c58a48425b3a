// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Oid, Persistence, RelFileNumber, RelationId, RoleId};
use tracing::{debug, instrument};

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::{RelationDef, RelationKind, SessionId},
};

#[derive(Debug, Clone)]
pub struct RelationToCreate {
	pub name: String,
	pub kind: RelationKind,
	pub persistence: Persistence,
	pub access_method: Option<Oid>,
	pub owner: RoleId,
	/// Must be set for temporary relations.
	pub temp_owner: Option<SessionId>,
}

impl Catalog {
	/// Adds a relation row. The relation's first relfilenumber equals its
	/// id; storage is created by the caller.
	#[instrument(name = "catalog::relation::create", level = "debug", skip(self, txn, to_create), fields(name = %to_create.name))]
	pub fn create_relation(&self, txn: &mut CatalogTxn, to_create: RelationToCreate) -> crate::Result<RelationDef> {
		let conflict = self
			.state(txn)
			.relations
			.values()
			.any(|relation| relation.name == to_create.name && relation.temp_owner == to_create.temp_owner);
		if conflict {
			return Err(CatalogError::RelationAlreadyExists {
				name: to_create.name,
			}
			.into());
		}

		let id = RelationId(self.allocate_oid());
		let relation = RelationDef {
			id,
			name: to_create.name,
			kind: to_create.kind,
			persistence: to_create.persistence,
			relfilenumber: RelFileNumber(id.0.0),
			access_method: to_create.access_method,
			owner: to_create.owner,
			temp_owner: to_create.temp_owner,
		};

		self.state_mut(txn)?.relations.insert(id, relation.clone());
		debug!(%id, kind = %relation.kind, persistence = %relation.persistence, "relation created");
		Ok(relation)
	}
}
