// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Physical storage: fixed size slotted pages, heap tuple headers, the
//! storage manager holding relation forks and the shared buffer pool.

pub mod buffer;
pub mod error;
pub mod page;
pub mod smgr;
pub mod tuple;

pub use buffer::{Buffer, BufferPool, BufferTag, WalFlush};
pub use error::StorageError;
pub use page::{BLCKSZ, ItemId, Page};
pub use smgr::{StorageImage, StorageManager};
pub use tuple::{HeapTuple, HeapTupleHeader, ItemPointer};

pub type Result<T> = seqdb_type::Result<T>;
