use async_trait::async_trait;
use serde_json::{Value, json};

use fulfil_delivery::{DeliveryOrder, DeliveryStatus, PlatformKind};
use fulfil_orders::SalesInvoice;

use crate::adapter::{CallOutcome, PlatformAdapter};
use crate::config::PlatformConfig;
use crate::wire::{Expect, execute_call, payload_items};

/// Kita delivery platform client.
///
/// Kita splits credentials: the merchant id travels in the payload while the
/// API secret authenticates the request.
pub struct KitaAdapter {
    config: PlatformConfig,
    client: reqwest::Client,
}

impl KitaAdapter {
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn create_payload(&self, order: &DeliveryOrder, invoice: &SalesInvoice) -> Value {
        json!({
            "merchant_id": self.config.api_key,
            "customer_name": order.customer_name,
            "customer_phone": order.customer_phone,
            "delivery_address": order.delivery_address,
            "items": payload_items(invoice),
            "notes": order.delivery_notes,
            "total_amount": invoice.total_amount(),
        })
    }
}

#[async_trait]
impl PlatformAdapter for KitaAdapter {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Kita
    }

    async fn create_order(&self, order: &DeliveryOrder, invoice: &SalesInvoice) -> CallOutcome {
        let payload = self.create_payload(order, invoice);
        let req = self
            .client
            .post(format!("{}/orders", self.config.base_url))
            .timeout(self.config.timeout)
            .bearer_auth(&self.config.api_secret)
            .json(&payload);
        execute_call(req, payload, Expect::OrderId).await
    }

    async fn update_status(&self, platform_order_id: &str, status: DeliveryStatus) -> CallOutcome {
        let payload = json!({ "status": status.as_str() });
        let req = self
            .client
            .patch(format!(
                "{}/orders/{platform_order_id}",
                self.config.base_url
            ))
            .timeout(self.config.timeout)
            .bearer_auth(&self.config.api_secret)
            .json(&payload);
        execute_call(req, payload, Expect::Ack).await
    }

    async fn cancel_order(&self, platform_order_id: &str) -> CallOutcome {
        let payload = json!({});
        let req = self
            .client
            .post(format!(
                "{}/orders/{platform_order_id}/cancel",
                self.config.base_url
            ))
            .timeout(self.config.timeout)
            .bearer_auth(&self.config.api_secret)
            .json(&payload);
        execute_call(req, payload, Expect::Ack).await
    }
}
