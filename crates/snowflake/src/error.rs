// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use seqdb_type::{Diagnostic, Error, ErrorKind, IntoDiagnostic, Severity};

#[derive(Debug, thiserror::Error)]
pub enum SnowflakeError {
	#[error("snowflake sequence tuple holds {found} bytes, expected {expected}")]
	TupleTooShort {
		found: usize,
		expected: usize,
	},

	#[error("parameter \"snowflake.machine_id\" is not defined")]
	MachineIdUnset,

	#[error("clock is before the Unix epoch ({now_ms} ms)")]
	ClockBeforeEpoch {
		now_ms: i64,
	},
}

impl IntoDiagnostic for SnowflakeError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let mut help = None;

		let (code, kind) = match &self {
			SnowflakeError::TupleTooShort {
				..
			} => ("SNOWFLAKE_001", ErrorKind::DataCorrupted),
			SnowflakeError::MachineIdUnset => {
				help = Some("load the snowflake module before using its sequences".to_string());
				("SNOWFLAKE_002", ErrorKind::ObjectNotInPrerequisiteState)
			}
			SnowflakeError::ClockBeforeEpoch {
				..
			} => ("SNOWFLAKE_003", ErrorKind::Internal),
		};

		Diagnostic {
			code: code.to_string(),
			kind,
			severity: Severity::Error,
			message,
			label: None,
			detail: None,
			help,
			notes: vec![],
			cause: None,
		}
	}
}

impl From<SnowflakeError> for Error {
	fn from(err: SnowflakeError) -> Self {
		Error(err.into_diagnostic())
	}
}
