// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod id;
mod lsn;
mod persistence;
mod sequence_type;

pub use id::{BlockNumber, ForkNumber, Oid, OffsetNumber, RelFileLocator, RelFileNumber, RelationId, RoleId, TransactionId};
pub use lsn::Lsn;
pub use persistence::Persistence;
pub use sequence_type::SequenceType;
