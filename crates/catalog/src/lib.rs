// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! System catalog: relations, sequence parameters, access methods, roles
//! and grants, ownership dependencies, plus the relation lock manager.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod access_method;
pub mod catalog;
pub mod dependency;
pub mod error;
pub mod lock;
pub mod relation;
pub mod role;
pub mod sequence;
pub mod state;
pub mod table;
pub mod test_utils;

pub use access_method::AccessMethodToCreate;
pub use catalog::{Catalog, CatalogImage, CatalogTxn, StateRef};
pub use error::CatalogError;
pub use lock::{LockManager, LockMode};
pub use relation::RelationToCreate;
pub use state::{
	AccessMethodDef, AccessMethodKind, CatalogState, ColumnDef, ColumnType, DATABASE_OID, DependencyDef,
	DependencyKind, GrantDef, IdentityKind, Privileges, RelationDef, RelationKind, RoleDef, SequenceDef, SessionId,
	TableDef,
};

pub type Result<T> = seqdb_type::Result<T>;
