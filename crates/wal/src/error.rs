// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Diagnostic, Error, ErrorKind, IntoDiagnostic, Lsn, Severity};

#[derive(Debug, thiserror::Error)]
pub enum WalError {
	#[error("record is truncated: need {needed} bytes, have {available}")]
	Truncated {
		needed: usize,
		available: usize,
	},

	#[error("incorrect record checksum: expected {expected:016X}, found {actual:016X}")]
	ChecksumMismatch {
		expected: u64,
		actual: u64,
	},

	#[error("invalid record: {reason}")]
	InvalidRecord {
		reason: String,
	},

	#[error("resource manager {rmgr} does not exist (record at {lsn})")]
	UnknownResourceManager {
		rmgr: u8,
		lsn: Lsn,
	},

	#[error("resource manager {rmgr} is already registered")]
	DuplicateResourceManager {
		rmgr: u8,
	},
}

impl IntoDiagnostic for WalError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			WalError::Truncated {
				..
			}
			| WalError::ChecksumMismatch {
				..
			}
			| WalError::InvalidRecord {
				..
			} => Diagnostic {
				code: "WAL_001".to_string(),
				kind: ErrorKind::DataCorrupted,
				severity: Severity::Error,
				message,
				label: Some("record could not be decoded".to_string()),
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},

			WalError::UnknownResourceManager {
				..
			} => Diagnostic {
				code: "WAL_002".to_string(),
				kind: ErrorKind::DataCorrupted,
				severity: Severity::Panic,
				message,
				label: Some("recovery cannot interpret this record".to_string()),
				detail: None,
				help: Some("the resource manager must be registered before recovery starts".to_string()),
				notes: vec![],
				cause: None,
			},

			WalError::DuplicateResourceManager {
				..
			} => Diagnostic {
				code: "WAL_003".to_string(),
				kind: ErrorKind::DuplicateObject,
				severity: Severity::Error,
				message,
				label: None,
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},
		}
	}
}

impl From<WalError> for Error {
	fn from(err: WalError) -> Self {
		Error(err.into_diagnostic())
	}
}

/// Replay met an opcode its resource manager does not know. Misreading a
/// binary layout is never safe, so recovery stops.
pub fn unknown_op_code(routine: &str, info: u8) -> Diagnostic {
	Diagnostic {
		code: "WAL_004".to_string(),
		kind: ErrorKind::DataCorrupted,
		severity: Severity::Panic,
		message: format!("{}: unknown op code {}", routine, info),
		label: Some("recovery halted".to_string()),
		detail: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Replay could not apply a well-formed record.
pub fn redo_failed(routine: &str, reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "WAL_005".to_string(),
		kind: ErrorKind::DataCorrupted,
		severity: Severity::Panic,
		message: format!("{}: {}", routine, reason.into()),
		label: Some("recovery halted".to_string()),
		detail: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
