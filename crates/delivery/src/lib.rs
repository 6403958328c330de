//! Delivery orders and their status lifecycle.
//!
//! A delivery order is cut from a sales invoice and handed to an external
//! delivery platform. Local status changes must walk the lifecycle one step
//! at a time (or cancel); platform-reported changes are trusted and may jump
//! ahead, since webhooks arrive out of order.

pub mod book;
pub mod order;
pub mod platform;
pub mod status;
pub mod tracking;

pub use book::{DeliveryStore, InMemoryDeliveryBook};
pub use order::{DeliveryOrder, DriverInfo};
pub use platform::PlatformKind;
pub use status::{DeliveryStatus, TransitionSource, validate_transition};
pub use tracking::{GeoPoint, TrackingEntry};
