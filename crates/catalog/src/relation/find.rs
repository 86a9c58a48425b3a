// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::RelationId;

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::RelationDef,
};

impl Catalog {
	pub fn find_relation(&self, txn: &CatalogTxn, id: RelationId) -> Option<RelationDef> {
		self.state(txn).relations.get(&id).cloned()
	}

	/// Like [`Catalog::find_relation`], for ids that must exist.
	pub fn get_relation(&self, txn: &CatalogTxn, id: RelationId) -> crate::Result<RelationDef> {
		self.find_relation(txn, id).ok_or_else(|| {
			CatalogError::RelationLookupFailed {
				id,
			}
			.into()
		})
	}

	/// Resolves a name the way the search path does: the session's own
	/// temporary relations shadow permanent and unlogged ones. Temporary
	/// relations of other sessions are invisible.
	pub fn find_relation_by_name(&self, txn: &CatalogTxn, name: &str) -> Option<RelationDef> {
		let state = self.state(txn);
		let mut found = None;
		for relation in state.relations.values().filter(|relation| relation.name == name) {
			match relation.temp_owner {
				Some(owner) if owner == txn.session() => return Some(relation.clone()),
				Some(_) => {}
				None => found = Some(relation.clone()),
			}
		}
		found
	}

	pub fn get_relation_by_name(&self, txn: &CatalogTxn, name: &str) -> crate::Result<RelationDef> {
		self.find_relation_by_name(txn, name).ok_or_else(|| {
			CatalogError::RelationNotFound {
				name: name.to_string(),
			}
			.into()
		})
	}

	pub fn list_relations(&self, txn: &CatalogTxn) -> Vec<RelationDef> {
		self.state(txn).relations.values().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use seqdb_type::{Oid, Persistence, RelationId};

	use crate::{
		CatalogTxn,
		test_utils::{create_test_relation, test_catalog},
	};

	#[test]
	fn test_own_temp_shadows_permanent() {
		let catalog = test_catalog();
		let mut txn = CatalogTxn::new(1, 7);
		let permanent = create_test_relation(&catalog, &mut txn, "s", Persistence::Permanent);
		let temp = create_test_relation(&catalog, &mut txn, "s", Persistence::Temporary);

		assert_eq!(catalog.find_relation_by_name(&txn, "s").unwrap().id, temp.id);

		let other = CatalogTxn::new(2, 8);
		catalog.commit(&mut txn).unwrap();
		assert_eq!(catalog.find_relation_by_name(&other, "s").unwrap().id, permanent.id);
	}

	#[test]
	fn test_not_found() {
		let catalog = test_catalog();
		let txn = CatalogTxn::new(1, 1);
		assert!(catalog.find_relation_by_name(&txn, "missing").is_none());

		let err = catalog.get_relation_by_name(&txn, "missing").unwrap_err();
		assert_eq!(err.code, "CATALOG_002");
		assert_eq!(err.message, "relation \"missing\" does not exist");

		let err = catalog.get_relation(&txn, RelationId(Oid(99999))).unwrap_err();
		assert_eq!(err.message, "cache lookup failed for relation 99999");
	}
}
