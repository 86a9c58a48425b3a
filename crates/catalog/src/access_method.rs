// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::Oid;
use tracing::{debug, instrument};

use crate::{
	catalog::{Catalog, CatalogTxn},
	error::CatalogError,
	state::{AccessMethodDef, AccessMethodKind},
};

#[derive(Debug, Clone)]
pub struct AccessMethodToCreate {
	pub name: String,
	pub kind: AccessMethodKind,
	pub handler: String,
}

impl Catalog {
	#[instrument(name = "catalog::access_method::create", level = "debug", skip(self, txn, to_create), fields(name = %to_create.name))]
	pub fn create_access_method(
		&self,
		txn: &mut CatalogTxn,
		to_create: AccessMethodToCreate,
	) -> crate::Result<AccessMethodDef> {
		if self.find_access_method_by_name(txn, &to_create.name).is_some() {
			return Err(CatalogError::AccessMethodAlreadyExists {
				name: to_create.name,
			}
			.into());
		}

		let access_method = AccessMethodDef {
			oid: self.allocate_oid(),
			name: to_create.name,
			kind: to_create.kind,
			handler: to_create.handler,
		};
		self.state_mut(txn)?.access_methods.insert(access_method.oid, access_method.clone());
		debug!(oid = %access_method.oid, handler = %access_method.handler, "access method created");
		Ok(access_method)
	}

	pub fn find_access_method_by_name(&self, txn: &CatalogTxn, name: &str) -> Option<AccessMethodDef> {
		self.state(txn).access_methods.values().find(|access_method| access_method.name == name).cloned()
	}

	pub fn get_access_method(&self, txn: &CatalogTxn, oid: Oid) -> crate::Result<AccessMethodDef> {
		self.state(txn).access_methods.get(&oid).cloned().ok_or_else(|| {
			CatalogError::AccessMethodLookupFailed {
				oid,
			}
			.into()
		})
	}

	/// Resolves the name of a sequence access method. With `missing_ok` an
	/// unknown name yields `None`; a method of another type is always an
	/// error.
	pub fn get_sequence_am_oid(&self, txn: &CatalogTxn, name: &str, missing_ok: bool) -> crate::Result<Option<Oid>> {
		match self.find_access_method_by_name(txn, name) {
			Some(access_method) if access_method.kind == AccessMethodKind::Sequence => Ok(Some(access_method.oid)),
			Some(access_method) => Err(CatalogError::AccessMethodWrongType {
				name: access_method.name,
				expected: AccessMethodKind::Sequence.name(),
			}
			.into()),
			None if missing_ok => Ok(None),
			None => Err(CatalogError::AccessMethodNotFound {
				name: name.to_string(),
				kind: "",
			}
			.into()),
		}
	}

	/// Drops an access method. Refused while a relation still uses it.
	#[instrument(name = "catalog::access_method::drop", level = "debug", skip(self, txn))]
	pub fn drop_access_method(
		&self,
		txn: &mut CatalogTxn,
		name: &str,
		missing_ok: bool,
	) -> crate::Result<Option<AccessMethodDef>> {
		let Some(access_method) = self.find_access_method_by_name(txn, name) else {
			if missing_ok {
				debug!("access method \"{}\" does not exist, skipping", name);
				return Ok(None);
			}
			return Err(CatalogError::AccessMethodNotFound {
				name: name.to_string(),
				kind: "",
			}
			.into());
		};

		let dependents: Vec<String> = self
			.state(txn)
			.relations
			.values()
			.filter(|relation| relation.access_method == Some(access_method.oid))
			.map(|relation| format!("{} {}", relation.kind, relation.name))
			.collect();
		if !dependents.is_empty() {
			return Err(CatalogError::AccessMethodInUse {
				name: access_method.name,
				dependents,
			}
			.into());
		}

		self.state_mut(txn)?.access_methods.remove(&access_method.oid);
		Ok(Some(access_method))
	}
}

#[cfg(test)]
mod tests {
	use seqdb_type::Persistence;

	use super::AccessMethodToCreate;
	use crate::{
		CatalogTxn, RelationToCreate,
		state::{AccessMethodKind, RelationKind},
		test_utils::{create_test_role, test_catalog},
	};

	fn to_create(name: &str, kind: AccessMethodKind) -> AccessMethodToCreate {
		AccessMethodToCreate {
			name: name.to_string(),
			kind,
			handler: format!("{}_handler", name),
		}
	}

	#[test]
	fn test_lookup_by_type() {
		let catalog = test_catalog();
		let mut txn = CatalogTxn::new(1, 1);
		let local = catalog.create_access_method(&mut txn, to_create("local", AccessMethodKind::Sequence)).unwrap();
		catalog.create_access_method(&mut txn, to_create("heap", AccessMethodKind::Table)).unwrap();

		assert_eq!(catalog.get_sequence_am_oid(&txn, "local", false).unwrap(), Some(local.oid));
		assert_eq!(catalog.get_sequence_am_oid(&txn, "missing", true).unwrap(), None);

		let err = catalog.get_sequence_am_oid(&txn, "missing", false).unwrap_err();
		assert_eq!(err.code, "CATALOG_005");
		assert_eq!(err.message, "access method \"missing\" does not exist");

		let err = catalog.get_sequence_am_oid(&txn, "heap", true).unwrap_err();
		assert_eq!(err.code, "CATALOG_006");
		assert_eq!(err.message, "access method \"heap\" is not of type SEQUENCE");
	}

	#[test]
	fn test_duplicate() {
		let catalog = test_catalog();
		let mut txn = CatalogTxn::new(1, 1);
		catalog.create_access_method(&mut txn, to_create("local", AccessMethodKind::Sequence)).unwrap();
		let err = catalog.create_access_method(&mut txn, to_create("local", AccessMethodKind::Sequence)).unwrap_err();
		assert_eq!(err.code, "CATALOG_004");
	}

	#[test]
	fn test_drop_refused_while_in_use() {
		let catalog = test_catalog();
		let mut txn = CatalogTxn::new(1, 1);
		let role = create_test_role(&catalog, &mut txn, "alice");
		let snowflake =
			catalog.create_access_method(&mut txn, to_create("snowflake", AccessMethodKind::Sequence)).unwrap();
		let relation = catalog
			.create_relation(
				&mut txn,
				RelationToCreate {
					name: "ids".to_string(),
					kind: RelationKind::Sequence,
					persistence: Persistence::Unlogged,
					access_method: Some(snowflake.oid),
					owner: role.id,
					temp_owner: None,
				},
			)
			.unwrap();

		let err = catalog.drop_access_method(&mut txn, "snowflake", false).unwrap_err();
		assert_eq!(err.code, "CATALOG_007");
		assert_eq!(err.notes, vec!["sequence ids depends on the access method".to_string()]);

		catalog.drop_relation(&mut txn, relation.id).unwrap();
		assert!(catalog.drop_access_method(&mut txn, "snowflake", false).unwrap().is_some());
		assert!(catalog.drop_access_method(&mut txn, "snowflake", true).unwrap().is_none());
	}
}
