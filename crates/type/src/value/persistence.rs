// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Durability class of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persistence {
	/// WAL-logged, survives crashes.
	Permanent,
	/// Not WAL-logged. Reset from its init fork after a crash.
	Unlogged,
	/// Private to one session and dropped when it ends.
	Temporary,
}

impl Persistence {
	pub fn code(&self) -> char {
		match self {
			Persistence::Permanent => 'p',
			Persistence::Unlogged => 'u',
			Persistence::Temporary => 't',
		}
	}
}

impl Display for Persistence {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Persistence::Permanent => f.write_str("permanent"),
			Persistence::Unlogged => f.write_str("unlogged"),
			Persistence::Temporary => f.write_str("temporary"),
		}
	}
}
