// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Diagnostic, Error, ErrorKind, IntoDiagnostic, Oid, RelationId, Severity};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
	#[error("relation \"{name}\" already exists")]
	RelationAlreadyExists {
		name: String,
	},

	#[error("relation \"{name}\" does not exist")]
	RelationNotFound {
		name: String,
	},

	#[error("cache lookup failed for relation {id}")]
	RelationLookupFailed {
		id: RelationId,
	},

	#[error("cache lookup failed for sequence {id}")]
	SequenceLookupFailed {
		id: RelationId,
	},

	#[error("cache lookup failed for access method {oid}")]
	AccessMethodLookupFailed {
		oid: Oid,
	},

	#[error("access method \"{name}\" already exists")]
	AccessMethodAlreadyExists {
		name: String,
	},

	#[error("{kind}access method \"{name}\" does not exist")]
	AccessMethodNotFound {
		name: String,
		kind: &'static str,
	},

	#[error("access method \"{name}\" is not of type {expected}")]
	AccessMethodWrongType {
		name: String,
		expected: &'static str,
	},

	#[error("cannot drop access method {name} because other objects depend on it")]
	AccessMethodInUse {
		name: String,
		dependents: Vec<String>,
	},

	#[error("role \"{name}\" already exists")]
	RoleAlreadyExists {
		name: String,
	},

	#[error("role \"{name}\" does not exist")]
	RoleNotFound {
		name: String,
	},

	#[error("column \"{column}\" of relation \"{relation}\" does not exist")]
	ColumnNotFound {
		column: String,
		relation: String,
	},

	#[error("permission denied for {object} {name}")]
	PermissionDenied {
		object: &'static str,
		name: String,
	},

	#[error("must be owner of {object} {name}")]
	MustBeOwner {
		object: &'static str,
		name: String,
	},

	#[error("could not obtain lock on relation \"{name}\"")]
	LockTimeout {
		name: String,
	},

	#[error("could not obtain lock on the system catalog")]
	CatalogLockTimeout,

	#[error("could not {action} catalog image: {reason}")]
	Image {
		action: &'static str,
		reason: String,
	},
}

impl IntoDiagnostic for CatalogError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let (code, kind, label, help, notes) = match &self {
			CatalogError::RelationAlreadyExists {
				..
			} => ("CATALOG_001", ErrorKind::DuplicateTable, None, None, vec![]),
			CatalogError::RelationNotFound {
				..
			} => ("CATALOG_002", ErrorKind::UndefinedTable, None, None, vec![]),
			CatalogError::RelationLookupFailed {
				..
			}
			| CatalogError::SequenceLookupFailed {
				..
			}
			| CatalogError::AccessMethodLookupFailed {
				..
			} => (
				"CATALOG_003",
				ErrorKind::Internal,
				Some("object vanished from the catalog".to_string()),
				None,
				vec![],
			),
			CatalogError::AccessMethodAlreadyExists {
				..
			} => ("CATALOG_004", ErrorKind::DuplicateObject, None, None, vec![]),
			CatalogError::AccessMethodNotFound {
				..
			} => ("CATALOG_005", ErrorKind::UndefinedObject, None, None, vec![]),
			CatalogError::AccessMethodWrongType {
				..
			} => ("CATALOG_006", ErrorKind::WrongObjectType, None, None, vec![]),
			CatalogError::AccessMethodInUse {
				dependents,
				..
			} => (
				"CATALOG_007",
				ErrorKind::DependentObjectsStillExist,
				None,
				Some("drop the dependent objects first".to_string()),
				dependents.iter().map(|name| format!("{} depends on the access method", name)).collect(),
			),
			CatalogError::RoleAlreadyExists {
				..
			} => ("CATALOG_008", ErrorKind::DuplicateObject, None, None, vec![]),
			CatalogError::RoleNotFound {
				..
			} => ("CATALOG_009", ErrorKind::UndefinedObject, None, None, vec![]),
			CatalogError::ColumnNotFound {
				..
			} => ("CATALOG_010", ErrorKind::UndefinedColumn, None, None, vec![]),
			CatalogError::PermissionDenied {
				..
			} => ("CATALOG_011", ErrorKind::InsufficientPrivilege, None, None, vec![]),
			CatalogError::MustBeOwner {
				..
			} => ("CATALOG_012", ErrorKind::InsufficientPrivilege, None, None, vec![]),
			CatalogError::LockTimeout {
				..
			}
			| CatalogError::CatalogLockTimeout => (
				"CATALOG_013",
				ErrorKind::LockNotAvailable,
				Some("lock_timeout expired".to_string()),
				None,
				vec![],
			),
			CatalogError::Image {
				..
			} => ("CATALOG_014", ErrorKind::Internal, None, None, vec![]),
		};

		Diagnostic {
			code: code.to_string(),
			kind,
			severity: Severity::Error,
			message,
			label,
			detail: None,
			help,
			notes,
			cause: None,
		}
	}
}

impl From<CatalogError> for Error {
	fn from(err: CatalogError) -> Self {
		Error(err.into_diagnostic())
	}
}
