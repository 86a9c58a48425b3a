// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Diagnostic, Error, ErrorKind, ForkNumber, IntoDiagnostic, RelFileLocator, Severity};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("no room on page for item of {needed} bytes")]
	PageFull {
		needed: usize,
		available: usize,
	},

	#[error("invalid item offset {offset}")]
	InvalidItem {
		offset: u16,
	},

	#[error("invalid page size {size}")]
	InvalidPageSize {
		size: usize,
	},

	#[error("heap tuple of {len} bytes is too short")]
	TupleTooShort {
		len: usize,
	},

	#[error("could not open file \"{locator}\" fork {fork}")]
	ForkNotFound {
		locator: RelFileLocator,
		fork: ForkNumber,
	},

	#[error("file \"{locator}\" fork {fork} already exists")]
	ForkExists {
		locator: RelFileLocator,
		fork: ForkNumber,
	},

	#[error("could not read block {block} in file \"{locator}\" fork {fork}")]
	BlockOutOfRange {
		locator: RelFileLocator,
		fork: ForkNumber,
		block: u32,
		nblocks: u32,
	},

	#[error("invalid page checksum in block {block} of \"{locator}\" fork {fork}")]
	ChecksumMismatch {
		locator: RelFileLocator,
		fork: ForkNumber,
		block: u32,
		expected: u16,
		actual: u16,
	},
}

impl IntoDiagnostic for StorageError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			StorageError::PageFull {
				needed,
				available,
			} => Diagnostic {
				code: "STORAGE_001".to_string(),
				kind: ErrorKind::Internal,
				severity: Severity::Error,
				message,
				label: Some(format!("{} bytes available", available)),
				detail: None,
				help: Some(format!("an item of {} bytes does not fit into a single page", needed)),
				notes: vec![],
				cause: None,
			},

			StorageError::InvalidItem {
				..
			} => Diagnostic {
				code: "STORAGE_002".to_string(),
				kind: ErrorKind::DataCorrupted,
				severity: Severity::Error,
				message,
				label: Some("line pointer does not reference a normal item".to_string()),
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},

			StorageError::InvalidPageSize {
				..
			}
			| StorageError::TupleTooShort {
				..
			} => Diagnostic {
				code: "STORAGE_003".to_string(),
				kind: ErrorKind::DataCorrupted,
				severity: Severity::Error,
				message,
				label: None,
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},

			StorageError::ForkNotFound {
				..
			} => Diagnostic {
				code: "STORAGE_004".to_string(),
				kind: ErrorKind::UndefinedObject,
				severity: Severity::Error,
				message,
				label: Some("no such file".to_string()),
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},

			StorageError::ForkExists {
				..
			} => Diagnostic {
				code: "STORAGE_005".to_string(),
				kind: ErrorKind::DuplicateObject,
				severity: Severity::Error,
				message,
				label: None,
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},

			StorageError::BlockOutOfRange {
				nblocks,
				..
			} => Diagnostic {
				code: "STORAGE_006".to_string(),
				kind: ErrorKind::DataCorrupted,
				severity: Severity::Error,
				message,
				label: Some(format!("file has only {} blocks", nblocks)),
				detail: None,
				help: None,
				notes: vec![],
				cause: None,
			},

			StorageError::ChecksumMismatch {
				expected,
				actual,
				..
			} => Diagnostic {
				code: "STORAGE_007".to_string(),
				kind: ErrorKind::DataCorrupted,
				severity: Severity::Error,
				message,
				label: None,
				detail: Some(format!("calculated checksum {} but expected {}", actual, expected)),
				help: None,
				notes: vec![],
				cause: None,
			},
		}
	}
}

impl From<StorageError> for Error {
	fn from(err: StorageError) -> Self {
		Error(err.into_diagnostic())
	}
}
