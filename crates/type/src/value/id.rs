// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub type BlockNumber = u32;
pub type OffsetNumber = u16;

/// Object identifier shared by every catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Oid(pub u32);

impl Oid {
	pub const INVALID: Oid = Oid(0);
	/// First identifier handed out to user objects.
	pub const FIRST_NORMAL: Oid = Oid(16384);

	pub fn is_valid(&self) -> bool {
		self.0 != 0
	}
}

impl Display for Oid {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationId(pub Oid);

impl Display for RelationId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub Oid);

impl Display for RoleId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// Identity of the physical storage currently backing a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelFileNumber(pub u32);

impl Display for RelFileNumber {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// Fully qualified physical location: tablespace, database, relfilenumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelFileLocator {
	pub spc: u32,
	pub db: u32,
	pub rel: RelFileNumber,
}

impl RelFileLocator {
	pub const DEFAULT_TABLESPACE: u32 = 1663;

	pub fn new(db: u32, rel: RelFileNumber) -> Self {
		Self {
			spc: Self::DEFAULT_TABLESPACE,
			db,
			rel,
		}
	}
}

impl Display for RelFileLocator {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}/{}", self.spc, self.db, self.rel)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForkNumber {
	Main,
	Init,
}

impl ForkNumber {
	pub fn to_u8(self) -> u8 {
		match self {
			ForkNumber::Main => 0,
			ForkNumber::Init => 3,
		}
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(ForkNumber::Main),
			3 => Some(ForkNumber::Init),
			_ => None,
		}
	}
}

impl Display for ForkNumber {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ForkNumber::Main => f.write_str("main"),
			ForkNumber::Init => f.write_str("init"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TransactionId(pub u32);

impl TransactionId {
	pub const INVALID: TransactionId = TransactionId(0);
	pub const FROZEN: TransactionId = TransactionId(2);
	pub const FIRST_NORMAL: TransactionId = TransactionId(3);

	pub fn is_valid(&self) -> bool {
		self.0 != 0
	}
}

impl Display for TransactionId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}
