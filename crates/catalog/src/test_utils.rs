// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::time::Duration;

use seqdb_type::Persistence;

use crate::{
	Catalog, CatalogTxn, RelationToCreate,
	state::{RelationDef, RelationKind, RoleDef},
};

pub fn test_catalog() -> Catalog {
	Catalog::new(Duration::from_millis(50))
}

pub fn create_test_role(catalog: &Catalog, txn: &mut CatalogTxn, name: &str) -> RoleDef {
	catalog.create_role(txn, name, false).unwrap()
}

/// Creates a sequence relation owned by a role named `owner`, creating the
/// role on first use.
pub fn create_test_relation(
	catalog: &Catalog,
	txn: &mut CatalogTxn,
	name: &str,
	persistence: Persistence,
) -> RelationDef {
	let owner = match catalog.find_role_by_name(txn, "owner") {
		Some(role) => role,
		None => create_test_role(catalog, txn, "owner"),
	};
	let temp_owner = (persistence == Persistence::Temporary).then(|| txn.session());
	catalog.create_relation(
		txn,
		RelationToCreate {
			name: name.to_string(),
			kind: RelationKind::Sequence,
			persistence,
			access_method: None,
			owner: owner.id,
			temp_owner,
		},
	)
	.unwrap()
}
