use serde_json::Value;

use crate::adapter::{Acknowledgement, CallFailure, CallOutcome};

/// What a successful response must contain.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Expect {
    /// Creation: the body must carry the platform's `order_id`.
    OrderId,
    /// Update/cancel: a 2xx status is acknowledgement enough.
    Ack,
}

/// Send a prepared request and fold the response into a [`CallOutcome`].
///
/// Transport errors (including timeouts) carry no response. A non-2xx status
/// is a rejection, with the body retained for the audit log. A 2xx body that
/// is not valid JSON is kept as a string; for creation calls, a 2xx body
/// without `order_id` is still a rejection.
pub(crate) async fn execute_call(
    req: reqwest::RequestBuilder,
    request: Value,
    expect: Expect,
) -> CallOutcome {
    let response = match req.send().await {
        Ok(response) => response,
        Err(err) => {
            let message = if err.is_timeout() {
                "request timed out".to_string()
            } else {
                err.to_string()
            };
            return CallOutcome {
                request,
                response: None,
                status_code: None,
                result: Err(CallFailure::Transport(message)),
            };
        }
    };

    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            return CallOutcome {
                request,
                response: None,
                status_code: Some(status.as_u16()),
                result: Err(CallFailure::Transport(err.to_string())),
            };
        }
    };
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));

    if !status.is_success() {
        return CallOutcome {
            request,
            response: Some(body.clone()),
            status_code: Some(status.as_u16()),
            result: Err(CallFailure::Rejected {
                status: Some(status.as_u16()),
                message: body.to_string(),
            }),
        };
    }

    let result = match expect {
        Expect::OrderId => match body.get("order_id").and_then(Value::as_str) {
            Some(order_id) => Ok(Acknowledgement {
                platform_order_id: Some(order_id.to_string()),
            }),
            None => Err(CallFailure::Rejected {
                status: Some(status.as_u16()),
                message: "response missing order_id".to_string(),
            }),
        },
        Expect::Ack => Ok(Acknowledgement {
            platform_order_id: None,
        }),
    };

    CallOutcome {
        request,
        response: Some(body),
        status_code: Some(status.as_u16()),
        result,
    }
}

/// Invoice lines rendered the way both platforms expect them.
pub(crate) fn payload_items(invoice: &fulfil_orders::SalesInvoice) -> Value {
    Value::Array(
        invoice
            .lines()
            .iter()
            .map(|line| {
                serde_json::json!({
                    "name": line.description,
                    "quantity": line.quantity,
                    "price": line.unit_price,
                    "total": line.line_total,
                })
            })
            .collect(),
    )
}
