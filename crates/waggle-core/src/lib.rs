// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Waggle community check-in bot.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Waggle workspace. All adapter plugins
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WaggleError;
pub use types::{
    ActionEvent, AdapterType, AuditEvent, AuditLogEntry, EventKind, HealthStatus, InboundEvent,
    MessageId, OutboundMessage, ResponseFilter, User, UserId, WeekStart, WeeklyResponse,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    ChannelAdapter, PluginAdapter, ResponseRepository, StorageAdapter, UserDirectory,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waggle_error_has_all_variants() {
        let _config = WaggleError::Config("test".into());
        let _storage = WaggleError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = WaggleError::Channel {
            message: "test".into(),
            source: None,
        };
        let _scheduler = WaggleError::Scheduler("test".into());
        let _health = WaggleError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _internal = WaggleError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every adapter trait is reachable
        // through the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_repository<T: ResponseRepository>() {}
        fn _assert_directory<T: UserDirectory>() {}
    }

    #[test]
    fn user_and_message_ids() {
        let uid = UserId("U123".into());
        let mid = MessageId("1724822400.000100".into());

        let uid2 = uid.clone();
        assert_eq!(uid, uid2);
        assert_eq!(uid.to_string(), "U123");

        let mid2 = mid.clone();
        assert_eq!(mid, mid2);
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }
}
