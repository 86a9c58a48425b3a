// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{RelationId, RoleId};
use tracing::{debug, instrument};

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::{GrantDef, Privileges, RelationDef, RelationKind, RoleDef},
};

impl Catalog {
	#[instrument(name = "catalog::role::create", level = "debug", skip(self, txn))]
	pub fn create_role(&self, txn: &mut CatalogTxn, name: &str, superuser: bool) -> crate::Result<RoleDef> {
		if self.find_role_by_name(txn, name).is_some() {
			return Err(CatalogError::RoleAlreadyExists {
				name: name.to_string(),
			}
			.into());
		}
		let role = RoleDef {
			id: RoleId(self.allocate_oid()),
			name: name.to_string(),
			superuser,
		};
		self.state_mut(txn)?.roles.insert(role.id, role.clone());
		Ok(role)
	}

	pub fn find_role_by_name(&self, txn: &CatalogTxn, name: &str) -> Option<RoleDef> {
		self.state(txn).roles.values().find(|role| role.name == name).cloned()
	}

	pub fn get_role(&self, txn: &CatalogTxn, id: RoleId) -> crate::Result<RoleDef> {
		self.state(txn).roles.get(&id).cloned().ok_or_else(|| {
			CatalogError::RoleNotFound {
				name: id.to_string(),
			}
			.into()
		})
	}

	/// Adds privileges on a relation to a role, merging with what the role
	/// already holds.
	#[instrument(name = "catalog::role::grant", level = "debug", skip(self, txn))]
	pub fn grant(
		&self,
		txn: &mut CatalogTxn,
		relation: RelationId,
		role: RoleId,
		privileges: Privileges,
	) -> crate::Result<()> {
		let state = self.state_mut(txn)?;
		if !state.relations.contains_key(&relation) {
			return Err(CatalogError::RelationLookupFailed {
				id: relation,
			}
			.into());
		}
		match state.grants.iter_mut().find(|grant| grant.relation == relation && grant.role == role) {
			Some(grant) => grant.privileges = grant.privileges | privileges,
			None => state.grants.push(GrantDef {
				relation,
				role,
				privileges,
			}),
		}
		debug!("privileges granted");
		Ok(())
	}

	/// True when the role holds at least one of `privileges` on the
	/// relation. Superusers and the owner hold every privilege.
	pub fn has_privilege(&self, txn: &CatalogTxn, role: RoleId, relation: &RelationDef, privileges: Privileges) -> bool {
		let state = self.state(txn);
		if state.roles.get(&role).is_some_and(|role| role.superuser) || relation.owner == role {
			return true;
		}
		state.grants
			.iter()
			.any(|grant| grant.relation == relation.id && grant.role == role && grant.privileges.intersects(privileges))
	}

	pub fn is_owner(&self, txn: &CatalogTxn, role: RoleId, relation: &RelationDef) -> bool {
		relation.owner == role || self.state(txn).roles.get(&role).is_some_and(|role| role.superuser)
	}

	pub fn check_owner(&self, txn: &CatalogTxn, role: RoleId, relation: &RelationDef) -> crate::Result<()> {
		if self.is_owner(txn, role, relation) {
			return Ok(());
		}
		Err(CatalogError::MustBeOwner {
			object: match relation.kind {
				RelationKind::Sequence => "sequence",
				RelationKind::Table => "table",
			},
			name: relation.name.clone(),
		}
		.into())
	}
}
