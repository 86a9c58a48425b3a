// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod create;
mod drop;
mod find;
mod update;

pub use create::RelationToCreate;
