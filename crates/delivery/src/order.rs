use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fulfil_core::{DeliveryOrderId, InvoiceId};

use crate::platform::PlatformKind;
use crate::status::DeliveryStatus;
use crate::tracking::GeoPoint;

/// Driver assigned by the platform, if it reports one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    pub name: String,
    pub phone: String,
    pub location: Option<GeoPoint>,
}

/// A delivery order handed to an external platform.
///
/// `platform_order_id` is the platform's own identifier, assigned when the
/// platform acknowledges creation. Until then the order is pending and has
/// never left this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub id: DeliveryOrderId,
    pub invoice: InvoiceId,
    pub platform: PlatformKind,
    pub platform_order_id: Option<String>,
    pub status: DeliveryStatus,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub delivery_notes: Option<String>,
    /// Fee in smallest currency unit.
    pub delivery_fee: i64,
    pub driver: Option<DriverInfo>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryOrder {
    pub fn new(
        id: DeliveryOrderId,
        invoice: InvoiceId,
        platform: PlatformKind,
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
        delivery_address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            invoice,
            platform,
            platform_order_id: None,
            status: DeliveryStatus::Pending,
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            delivery_address: delivery_address.into(),
            delivery_notes: None,
            delivery_fee: 0,
            driver: None,
            estimated_delivery_at: None,
            actual_delivery_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.delivery_notes = Some(notes.into());
        self
    }

    pub fn with_fee(mut self, fee: i64) -> Self {
        self.delivery_fee = fee;
        self
    }
}
