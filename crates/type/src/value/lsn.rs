// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Byte position in the write-ahead log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Lsn(pub u64);

impl Lsn {
	pub const INVALID: Lsn = Lsn(0);

	pub fn is_valid(&self) -> bool {
		self.0 != 0
	}
}

impl Display for Lsn {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:X}/{:08X}", self.0 >> 32, self.0 as u32)
	}
}

#[cfg(test)]
mod tests {
	use super::Lsn;

	#[test]
	fn test_display() {
		assert_eq!(Lsn(0x16B3748).to_string(), "0/016B3748");
		assert_eq!(Lsn(0x1_0000_0028).to_string(), "1/00000028");
	}
}
