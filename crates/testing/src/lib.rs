// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Helpers shared by the integration tests of the workspace.

pub mod am;
pub mod database;

pub use am::{CountingSequenceAm, register_counting_am};
pub use database::{crash_and_recover, init_tracing, standby_of, test_config, test_database, test_session};
