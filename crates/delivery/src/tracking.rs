use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fulfil_core::DeliveryOrderId;

use crate::status::DeliveryStatus;

/// A geographic coordinate, as reported by a driver's device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One row of a delivery's tracking history.
///
/// Appended on every status change; never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub id: Uuid,
    pub delivery_order: DeliveryOrderId,
    pub status: DeliveryStatus,
    pub location: Option<GeoPoint>,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TrackingEntry {
    pub fn new(
        delivery_order: DeliveryOrderId,
        status: DeliveryStatus,
        location: Option<GeoPoint>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            delivery_order,
            status,
            location,
            note,
            recorded_at: Utc::now(),
        }
    }
}
