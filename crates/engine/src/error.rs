// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Diagnostic, Error, ErrorKind, IntoDiagnostic, Severity};

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
	#[error("nextval: reached {bound} value of sequence \"{name}\" ({limit})")]
	LimitExceeded {
		name: String,
		bound: &'static str,
		limit: i64,
	},

	#[error("setval: value {value} is out of bounds for sequence \"{name}\" ({min}..{max})")]
	SetvalOutOfBounds {
		name: String,
		value: i64,
		min: i64,
		max: i64,
	},

	#[error("currval of sequence \"{name}\" is not yet defined in this session")]
	CurrvalNotDefined {
		name: String,
	},

	#[error("lastval is not yet defined in this session")]
	LastvalNotDefined,

	#[error("bad magic number in sequence \"{name}\": {magic:08X}")]
	BadMagic {
		name: String,
		magic: u32,
	},

	#[error("failed to add sequence tuple to page")]
	AddTupleFailed,

	#[error("conflicting or redundant options")]
	ConflictingOptions {
		option: &'static str,
	},

	#[error("invalid sequence option SEQUENCE NAME")]
	SequenceNameOption,

	#[error("{object} type must be smallint, integer, or bigint")]
	InvalidType {
		type_name: String,
		object: &'static str,
	},

	#[error("INCREMENT must not be zero")]
	ZeroIncrement,

	#[error("MAXVALUE ({value}) is out of range for sequence data type {type_name}")]
	MaxOutOfRange {
		value: i64,
		type_name: &'static str,
	},

	#[error("MINVALUE ({value}) is out of range for sequence data type {type_name}")]
	MinOutOfRange {
		value: i64,
		type_name: &'static str,
	},

	#[error("MINVALUE ({min}) must be less than MAXVALUE ({max})")]
	MinNotLessThanMax {
		min: i64,
		max: i64,
	},

	#[error("START value ({start}) cannot be less than MINVALUE ({min})")]
	StartBelowMin {
		start: i64,
		min: i64,
	},

	#[error("START value ({start}) cannot be greater than MAXVALUE ({max})")]
	StartAboveMax {
		start: i64,
		max: i64,
	},

	#[error("RESTART value ({value}) cannot be less than MINVALUE ({min})")]
	RestartBelowMin {
		value: i64,
		min: i64,
	},

	#[error("RESTART value ({value}) cannot be greater than MAXVALUE ({max})")]
	RestartAboveMax {
		value: i64,
		max: i64,
	},

	#[error("CACHE ({cache}) must be greater than zero")]
	CacheNotPositive {
		cache: i64,
	},

	#[error("invalid OWNED BY option")]
	InvalidOwnedBy,

	#[error("sequence cannot be owned by relation \"{name}\"")]
	OwnerNotTable {
		name: String,
	},

	#[error("sequence must have same owner as table it is linked to")]
	OwnerMismatch,

	#[error("cannot change ownership of identity sequence")]
	IdentityOwnershipChange {
		sequence: String,
		table: String,
	},

	#[error("\"{name}\" is not a sequence")]
	NotASequence {
		name: String,
	},

	#[error("\"{name}\" is not a table")]
	NotATable {
		name: String,
	},

	#[error("cannot drop sequence {name} because column {column} of table {table} requires it")]
	IdentitySequenceRequired {
		name: String,
		column: String,
		table: String,
	},

	#[error("column \"{column}\" of relation \"{table}\" is not an identity column")]
	NotAnIdentityColumn {
		column: String,
		table: String,
	},

	#[error("function {handler} does not exist")]
	HandlerNotFound {
		handler: String,
	},

	#[error("sequence access method handler {handler} did not return a sequence access method")]
	HandlerReturnedNothing {
		handler: String,
	},

	#[error("cannot change logged status of {object} \"{name}\" because it is temporary")]
	TemporaryPersistence {
		object: &'static str,
		name: String,
	},
}

impl IntoDiagnostic for SequenceError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let mut severity = Severity::Error;
		let mut detail = None;
		let mut help = None;

		let (code, kind) = match &self {
			SequenceError::LimitExceeded {
				..
			} => ("SEQUENCE_001", ErrorKind::SequenceGeneratorLimitExceeded),
			SequenceError::SetvalOutOfBounds {
				..
			} => ("SEQUENCE_002", ErrorKind::NumericValueOutOfRange),
			SequenceError::CurrvalNotDefined {
				..
			} => ("SEQUENCE_003", ErrorKind::ObjectNotInPrerequisiteState),
			SequenceError::LastvalNotDefined => ("SEQUENCE_004", ErrorKind::ObjectNotInPrerequisiteState),
			SequenceError::BadMagic {
				..
			} => ("SEQUENCE_005", ErrorKind::DataCorrupted),
			SequenceError::AddTupleFailed => ("SEQUENCE_006", ErrorKind::Internal),
			SequenceError::ConflictingOptions {
				option,
			} => {
				detail = Some(format!("option \"{}\" given more than once", option));
				("SEQUENCE_007", ErrorKind::SyntaxError)
			}
			SequenceError::SequenceNameOption => ("SEQUENCE_008", ErrorKind::SyntaxError),
			SequenceError::InvalidType {
				type_name,
				..
			} => {
				detail = Some(format!("type \"{}\" cannot back a sequence", type_name));
				("SEQUENCE_009", ErrorKind::InvalidParameterValue)
			}
			SequenceError::ZeroIncrement => ("SEQUENCE_010", ErrorKind::InvalidParameterValue),
			SequenceError::MaxOutOfRange {
				..
			}
			| SequenceError::MinOutOfRange {
				..
			} => ("SEQUENCE_011", ErrorKind::InvalidParameterValue),
			SequenceError::MinNotLessThanMax {
				..
			} => ("SEQUENCE_012", ErrorKind::InvalidParameterValue),
			SequenceError::StartBelowMin {
				..
			}
			| SequenceError::StartAboveMax {
				..
			} => ("SEQUENCE_013", ErrorKind::InvalidParameterValue),
			SequenceError::RestartBelowMin {
				..
			}
			| SequenceError::RestartAboveMax {
				..
			} => ("SEQUENCE_014", ErrorKind::InvalidParameterValue),
			SequenceError::CacheNotPositive {
				..
			} => ("SEQUENCE_015", ErrorKind::InvalidParameterValue),
			SequenceError::InvalidOwnedBy => {
				help = Some("Specify OWNED BY table.column or OWNED BY NONE.".to_string());
				("SEQUENCE_016", ErrorKind::SyntaxError)
			}
			SequenceError::OwnerNotTable {
				..
			} => ("SEQUENCE_017", ErrorKind::WrongObjectType),
			SequenceError::OwnerMismatch => ("SEQUENCE_018", ErrorKind::ObjectNotInPrerequisiteState),
			SequenceError::IdentityOwnershipChange {
				sequence,
				table,
			} => {
				detail = Some(format!("Sequence \"{}\" is linked to table \"{}\".", sequence, table));
				("SEQUENCE_019", ErrorKind::FeatureNotSupported)
			}
			SequenceError::NotASequence {
				..
			}
			| SequenceError::NotATable {
				..
			} => ("SEQUENCE_020", ErrorKind::WrongObjectType),
			SequenceError::IdentitySequenceRequired {
				column,
				table,
				..
			} => {
				help = Some(format!("You can drop column {} of table {} instead.", column, table));
				("SEQUENCE_021", ErrorKind::DependentObjectsStillExist)
			}
			SequenceError::NotAnIdentityColumn {
				..
			} => ("SEQUENCE_022", ErrorKind::ObjectNotInPrerequisiteState),
			SequenceError::HandlerNotFound {
				..
			} => ("SEQUENCE_023", ErrorKind::UndefinedObject),
			SequenceError::HandlerReturnedNothing {
				..
			} => {
				severity = Severity::Fatal;
				("SEQUENCE_024", ErrorKind::Internal)
			}
			SequenceError::TemporaryPersistence {
				..
			} => ("SEQUENCE_025", ErrorKind::InvalidTableDefinition),
		};

		Diagnostic {
			code: code.to_string(),
			kind,
			severity,
			message,
			label: None,
			detail,
			help,
			notes: vec![],
			cause: None,
		}
	}
}

impl From<SequenceError> for Error {
	fn from(err: SequenceError) -> Self {
		Error(err.into_diagnostic())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
	#[error("cannot execute {command} in a read-only transaction")]
	ReadOnly {
		command: &'static str,
	},

	#[error("cannot execute {command} during a parallel operation")]
	ParallelMode {
		command: &'static str,
	},

	#[error("current transaction is aborted, commands ignored until end of transaction block")]
	Aborted,

	#[error("there is already a transaction in progress")]
	AlreadyInProgress,

	#[error("there is no transaction in progress")]
	NotInProgress,

	#[error("must be superuser to {action}")]
	SuperuserRequired {
		action: &'static str,
	},
}

impl IntoDiagnostic for TransactionError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let (code, kind) = match &self {
			TransactionError::ReadOnly {
				..
			} => ("TXN_001", ErrorKind::ReadOnlySqlTransaction),
			TransactionError::ParallelMode {
				..
			} => ("TXN_002", ErrorKind::InvalidTransactionState),
			TransactionError::Aborted => ("TXN_003", ErrorKind::InFailedSqlTransaction),
			TransactionError::AlreadyInProgress => ("TXN_004", ErrorKind::InvalidTransactionState),
			TransactionError::NotInProgress => ("TXN_005", ErrorKind::InvalidTransactionState),
			TransactionError::SuperuserRequired {
				..
			} => ("TXN_006", ErrorKind::InsufficientPrivilege),
		};

		Diagnostic {
			code: code.to_string(),
			kind,
			severity: Severity::Error,
			message,
			label: None,
			detail: None,
			help: None,
			notes: vec![],
			cause: None,
		}
	}
}

impl From<TransactionError> for Error {
	fn from(err: TransactionError) -> Self {
		Error(err.into_diagnostic())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("unrecognized configuration parameter \"{name}\"")]
	UnknownSetting {
		name: String,
	},

	#[error("invalid value for parameter \"{name}\": \"{value}\"")]
	InvalidValue {
		name: String,
		value: String,
		detail: Option<String>,
	},

	#[error("{value} is outside the valid range for parameter \"{name}\" ({min} .. {max})")]
	OutOfRange {
		name: String,
		value: i64,
		min: i64,
		max: i64,
	},

	#[error("permission denied to set parameter \"{name}\"")]
	PermissionDenied {
		name: String,
	},

	#[error("parameter \"{name}\" cannot be changed without restarting the server")]
	CantChange {
		name: String,
	},

	#[error("sequence access method \"{name}\" does not exist")]
	SequenceAmNotFound {
		name: String,
	},

	#[error("setting \"{name}\" is already defined")]
	DuplicateSetting {
		name: String,
	},

	#[error("could not parse configuration: {reason}")]
	Parse {
		reason: String,
	},
}

impl IntoDiagnostic for ConfigError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let mut detail = None;
		let (code, kind) = match &self {
			ConfigError::UnknownSetting {
				..
			} => ("CONFIG_001", ErrorKind::UndefinedObject),
			ConfigError::InvalidValue {
				detail: reason,
				..
			} => {
				detail = reason.clone();
				("CONFIG_002", ErrorKind::InvalidParameterValue)
			}
			ConfigError::OutOfRange {
				..
			} => ("CONFIG_003", ErrorKind::InvalidParameterValue),
			ConfigError::PermissionDenied {
				..
			} => ("CONFIG_004", ErrorKind::InsufficientPrivilege),
			ConfigError::CantChange {
				..
			} => ("CONFIG_005", ErrorKind::CantChangeRuntimeParam),
			ConfigError::SequenceAmNotFound {
				..
			} => ("CONFIG_006", ErrorKind::UndefinedObject),
			ConfigError::DuplicateSetting {
				..
			} => ("CONFIG_007", ErrorKind::Internal),
			ConfigError::Parse {
				..
			} => ("CONFIG_008", ErrorKind::InvalidParameterValue),
		};

		Diagnostic {
			code: code.to_string(),
			kind,
			severity: Severity::Error,
			message,
			label: None,
			detail,
			help: None,
			notes: vec![],
			cause: None,
		}
	}
}

impl From<ConfigError> for Error {
	fn from(err: ConfigError) -> Self {
		Error(err.into_diagnostic())
	}
}
