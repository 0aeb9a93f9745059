// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::WaggleError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for storage and persistence backends.
///
/// Storage adapters manage the lifecycle of database connections and
/// provide the foundation for the response repository and user directory.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, PRAGMAs).
    async fn initialize(&self) -> Result<(), WaggleError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WaggleError>;
}
