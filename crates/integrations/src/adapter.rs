use async_trait::async_trait;
use serde_json::Value;

use fulfil_delivery::{DeliveryOrder, DeliveryStatus, PlatformKind};
use fulfil_orders::SalesInvoice;

/// What the platform acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    /// The platform's identifier for the order. Present on creation; status
    /// updates and cancellations acknowledge without one.
    pub platform_order_id: Option<String>,
}

/// Why a platform call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// No HTTP response at all (connection error, timeout).
    Transport(String),
    /// The platform responded but refused, or the response was unusable.
    Rejected {
        status: Option<u16>,
        message: String,
    },
}

/// Full record of one adapter call, for auditing.
///
/// `response` is `None` only when the call never produced a response body.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub request: Value,
    pub response: Option<Value>,
    pub status_code: Option<u16>,
    pub result: Result<Acknowledgement, CallFailure>,
}

/// Client for one delivery platform's order API.
///
/// Adapters only talk to the wire. They never touch local state; the
/// dispatcher owns auditing and state changes.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> PlatformKind;

    /// Create the order on the platform. A successful acknowledgement
    /// carries the platform's order id.
    async fn create_order(&self, order: &DeliveryOrder, invoice: &SalesInvoice) -> CallOutcome;

    async fn update_status(&self, platform_order_id: &str, status: DeliveryStatus) -> CallOutcome;

    async fn cancel_order(&self, platform_order_id: &str) -> CallOutcome;
}

impl std::fmt::Debug for dyn PlatformAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformAdapter")
            .field("platform", &self.platform())
            .finish()
    }
}
