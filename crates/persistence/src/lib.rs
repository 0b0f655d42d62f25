// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod error;
pub mod fixtures;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use record::{ProofRecord, RecordContext, RecordMetadata, RecordMultiProof};
pub use store::{ProofStore, RecordId};
