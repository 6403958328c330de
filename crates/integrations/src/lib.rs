//! Delivery platform integrations.
//!
//! Adapters speak each platform's order API; the registry maps a platform to
//! its adapter; the dispatcher coordinates platform calls with local delivery
//! state and writes the audit log. One audit entry per adapter invocation,
//! and local state only moves after the platform acknowledged.

pub mod adapter;
pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod hanger;
pub mod kita;
pub mod registry;
mod wire;

#[cfg(test)]
mod integration_tests;

pub use adapter::{Acknowledgement, CallFailure, CallOutcome, PlatformAdapter};
pub use audit::{
    AuditWriteError, InMemoryIntegrationLog, IntegrationAction, IntegrationLog,
    IntegrationLogEntry,
};
pub use config::PlatformConfig;
pub use dispatcher::DeliveryDispatcher;
pub use error::{IntegrationError, IntegrationResult};
pub use hanger::HangerAdapter;
pub use kita::KitaAdapter;
pub use registry::AdapterRegistry;
