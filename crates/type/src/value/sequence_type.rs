// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Integer width a sequence produces values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceType {
	Int2,
	Int4,
	Int8,
}

impl SequenceType {
	/// Resolves a type name as written in `AS <type>`. Returns `None` for
	/// anything that is not an integer type a sequence can produce.
	pub fn from_name(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"smallint" | "int2" => Some(SequenceType::Int2),
			"integer" | "int" | "int4" => Some(SequenceType::Int4),
			"bigint" | "int8" => Some(SequenceType::Int8),
			_ => None,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			SequenceType::Int2 => "smallint",
			SequenceType::Int4 => "integer",
			SequenceType::Int8 => "bigint",
		}
	}

	pub fn min(&self) -> i64 {
		match self {
			SequenceType::Int2 => i16::MIN as i64,
			SequenceType::Int4 => i32::MIN as i64,
			SequenceType::Int8 => i64::MIN,
		}
	}

	pub fn max(&self) -> i64 {
		match self {
			SequenceType::Int2 => i16::MAX as i64,
			SequenceType::Int4 => i32::MAX as i64,
			SequenceType::Int8 => i64::MAX,
		}
	}

	pub fn contains(&self, value: i64) -> bool {
		value >= self.min() && value <= self.max()
	}
}

impl Display for SequenceType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}
