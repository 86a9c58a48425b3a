// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Write-ahead log: record codec, the in-memory log with its flush
//! horizon and checkpoint redo pointer, resource managers and replay.

pub mod builtin;
pub mod describe;
pub mod error;
pub mod log;
pub mod reader;
pub mod record;
pub mod recovery;
pub mod rmgr;

pub use describe::describe;
pub use error::WalError;
pub use log::{FIRST_LSN, Wal, WalImage};
pub use reader::{DecodedRecord, WalReader};
pub use record::{BlockRef, Record, RmgrId};
pub use recovery::{RecoveryStats, replay};
pub use rmgr::{RedoContext, ResourceManager, ResourceManagers};

pub type Result<T> = seqdb_type::Result<T>;
