// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Sequence engine: sessions, transactions and relations on top of the
//! catalog, the buffer pool and the write-ahead log, with pluggable
//! sequence access methods.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod access_method;
pub mod config;
pub mod database;
pub mod error;
pub mod relation;
pub mod sequence;
pub mod session;
pub mod settings;
pub mod table;
pub mod transaction;

pub use access_method::CreateAccessMethod;
pub use config::DatabaseConfig;
pub use database::{BOOTSTRAP_ROLE, ControlData, Database, DatabaseState, DurableImage, LOCAL_SEQUENCE_AM};
pub use error::{ConfigError, SequenceError, TransactionError};
pub use relation::Relation;
pub use sequence::{
	AlterSequence, CreateSequence, NextValue, SequenceAccessMethod, SequenceAmHandler, SequenceData, SequenceLimits,
	SequenceListing, SequenceOption, SequenceParameters,
};
pub use session::Session;
pub use settings::{CheckContext, SettingContext, SettingDef, SettingValue};
pub use table::{ColumnSpec, CreateTable};

pub type Result<T> = seqdb_type::Result<T>;
