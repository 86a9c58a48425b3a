// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Sequences: the access method interface, the default `local` engine and
//! the commands and functions built on top.

pub mod am;
pub mod cache;
pub mod commands;
pub(crate) mod functions;
pub mod introspect;
pub mod local;
pub mod page;
pub mod params;

pub use am::{NextValue, SequenceAccessMethod, SequenceAmHandler, SequenceAmRegistry, SequenceLimits};
pub use cache::{SeqCacheEntry, SequenceCache};
pub use commands::{AlterSequence, CreateSequence};
pub use introspect::{SequenceData, SequenceListing, SequenceParameters};
pub use params::{SequenceOption, SequenceParams, init_params};
