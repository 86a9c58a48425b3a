// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeMap,
	fmt::{Display, Formatter},
	ops::BitOr,
};

use seqdb_type::{Oid, Persistence, RelFileLocator, RelFileNumber, RelationId, RoleId, SequenceType};
use serde::{Deserialize, Serialize};

/// Identifies the session that owns a temporary relation.
pub type SessionId = u64;

/// Database the catalog describes. Every locator carries it.
pub const DATABASE_OID: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
	Sequence,
	Table,
}

impl Display for RelationKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			RelationKind::Sequence => f.write_str("sequence"),
			RelationKind::Table => f.write_str("table"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
	pub id: RelationId,
	pub name: String,
	pub kind: RelationKind,
	pub persistence: Persistence,
	pub relfilenumber: RelFileNumber,
	/// Sequence access method; tables use the default table method.
	pub access_method: Option<Oid>,
	pub owner: RoleId,
	/// Session owning a temporary relation.
	pub temp_owner: Option<SessionId>,
}

impl RelationDef {
	pub fn locator(&self) -> RelFileLocator {
		RelFileLocator::new(DATABASE_OID, self.relfilenumber)
	}

	pub fn is_local_temp(&self, session: SessionId) -> bool {
		self.temp_owner == Some(session)
	}

	pub fn is_other_temp(&self, session: SessionId) -> bool {
		matches!(self.temp_owner, Some(owner) if owner != session)
	}
}

/// Parameters of a sequence, the `pg_sequence` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDef {
	pub relid: RelationId,
	pub seq_type: SequenceType,
	pub start: i64,
	pub increment: i64,
	pub max: i64,
	pub min: i64,
	pub cache: i64,
	pub cycle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMethodKind {
	Table,
	Sequence,
}

impl AccessMethodKind {
	pub fn name(&self) -> &'static str {
		match self {
			AccessMethodKind::Table => "TABLE",
			AccessMethodKind::Sequence => "SEQUENCE",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMethodDef {
	pub oid: Oid,
	pub name: String,
	pub kind: AccessMethodKind,
	/// Name of the registered handler function returning the routines.
	pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDef {
	pub id: RoleId,
	pub name: String,
	pub superuser: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Privileges(u8);

impl Privileges {
	pub const NONE: Privileges = Privileges(0);
	pub const SELECT: Privileges = Privileges(0x01);
	pub const UPDATE: Privileges = Privileges(0x02);
	pub const USAGE: Privileges = Privileges(0x04);
	pub const ALL: Privileges = Privileges(0x07);

	pub fn intersects(&self, other: Privileges) -> bool {
		self.0 & other.0 != 0
	}

	pub fn contains(&self, other: Privileges) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn is_empty(&self) -> bool {
		self.0 == 0
	}
}

impl BitOr for Privileges {
	type Output = Privileges;

	fn bitor(self, rhs: Self) -> Self::Output {
		Privileges(self.0 | rhs.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantDef {
	pub relation: RelationId,
	pub role: RoleId,
	pub privileges: Privileges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
	Int2,
	Int4,
	Int8,
	Text,
}

impl ColumnType {
	/// Sequence type backing an identity column of this type.
	pub fn sequence_type(&self) -> Option<SequenceType> {
		match self {
			ColumnType::Int2 => Some(SequenceType::Int2),
			ColumnType::Int4 => Some(SequenceType::Int4),
			ColumnType::Int8 => Some(SequenceType::Int8),
			ColumnType::Text => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKind {
	Always,
	ByDefault,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
	pub name: String,
	pub data_type: ColumnType,
	pub identity: Option<IdentityKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
	pub relid: RelationId,
	pub columns: Vec<ColumnDef>,
}

impl TableDef {
	pub fn column(&self, name: &str) -> Option<&ColumnDef> {
		self.columns.iter().find(|column| column.name == name)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
	/// Dropped together with the referenced object (`OWNED BY`).
	Auto,
	/// Part of the referenced object's implementation (identity columns).
	Internal,
}

/// `object` depends on `column` of `referenced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDef {
	pub object: RelationId,
	pub referenced: RelationId,
	pub column: String,
	pub kind: DependencyKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogState {
	pub relations: BTreeMap<RelationId, RelationDef>,
	pub sequences: BTreeMap<RelationId, SequenceDef>,
	pub access_methods: BTreeMap<Oid, AccessMethodDef>,
	pub roles: BTreeMap<RoleId, RoleDef>,
	pub grants: Vec<GrantDef>,
	pub tables: BTreeMap<RelationId, TableDef>,
	pub dependencies: Vec<DependencyDef>,
}
