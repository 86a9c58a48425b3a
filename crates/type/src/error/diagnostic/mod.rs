// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

mod internal;

pub use internal::{Location, internal, internal_at};

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
	/// Stable machine readable code, e.g. `SEQUENCE_001`.
	pub code: String,
	pub kind: ErrorKind,
	pub severity: Severity,
	pub message: String,
	pub label: Option<String>,
	pub detail: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
	pub cause: Option<Box<Diagnostic>>,
}

impl Diagnostic {
	pub fn with_cause(mut self, cause: Diagnostic) -> Self {
		self.cause = Some(Box::new(cause));
		self
	}
}

/// Condition classes surfaced to clients. Each maps onto an SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	InsufficientPrivilege,
	NumericValueOutOfRange,
	ObjectNotInPrerequisiteState,
	SequenceGeneratorLimitExceeded,
	InvalidParameterValue,
	UndefinedObject,
	UndefinedTable,
	UndefinedColumn,
	DuplicateObject,
	DuplicateTable,
	SyntaxError,
	FeatureNotSupported,
	WrongObjectType,
	DependentObjectsStillExist,
	InvalidTableDefinition,
	ReadOnlySqlTransaction,
	InvalidTransactionState,
	InFailedSqlTransaction,
	LockNotAvailable,
	CantChangeRuntimeParam,
	DataCorrupted,
	Internal,
}

impl ErrorKind {
	pub fn sqlstate(&self) -> &'static str {
		match self {
			ErrorKind::InsufficientPrivilege => "42501",
			ErrorKind::NumericValueOutOfRange => "22003",
			ErrorKind::ObjectNotInPrerequisiteState => "55000",
			ErrorKind::SequenceGeneratorLimitExceeded => "2200H",
			ErrorKind::InvalidParameterValue => "22023",
			ErrorKind::UndefinedObject => "42704",
			ErrorKind::UndefinedTable => "42P01",
			ErrorKind::UndefinedColumn => "42703",
			ErrorKind::DuplicateObject => "42710",
			ErrorKind::DuplicateTable => "42P07",
			ErrorKind::SyntaxError => "42601",
			ErrorKind::FeatureNotSupported => "0A000",
			ErrorKind::WrongObjectType => "42809",
			ErrorKind::DependentObjectsStillExist => "2BP01",
			ErrorKind::InvalidTableDefinition => "42P16",
			ErrorKind::ReadOnlySqlTransaction => "25006",
			ErrorKind::InvalidTransactionState => "25000",
			ErrorKind::InFailedSqlTransaction => "25P02",
			ErrorKind::LockNotAvailable => "55P03",
			ErrorKind::CantChangeRuntimeParam => "55P02",
			ErrorKind::DataCorrupted => "XX001",
			ErrorKind::Internal => "XX000",
		}
	}
}

/// How far an error reaches. `Error` aborts the statement, `Fatal` marks a
/// broken internal contract and `Panic` means recovery cannot continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
	Error,
	Fatal,
	Panic,
}

impl Display for Severity {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Severity::Error => f.write_str("ERROR"),
			Severity::Fatal => f.write_str("FATAL"),
			Severity::Panic => f.write_str("PANIC"),
		}
	}
}
