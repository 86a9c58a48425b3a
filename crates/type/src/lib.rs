// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod error;
pub mod value;

pub use error::{Diagnostic, Error, ErrorKind, IntoDiagnostic, Severity};
pub use value::{
	BlockNumber, ForkNumber, Lsn, Oid, OffsetNumber, Persistence, RelFileLocator, RelFileNumber, RelationId, RoleId,
	SequenceType, TransactionId,
};

pub type Result<T> = std::result::Result<T, Error>;
