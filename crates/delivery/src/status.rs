use serde::{Deserialize, Serialize};

use fulfil_core::{DomainError, DomainResult};

/// Lifecycle of a delivery order, in fulfillment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 7] = [
        DeliveryStatus::Pending,
        DeliveryStatus::Confirmed,
        DeliveryStatus::Preparing,
        DeliveryStatus::Ready,
        DeliveryStatus::OnTheWay,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Confirmed => "confirmed",
            DeliveryStatus::Preparing => "preparing",
            DeliveryStatus::Ready => "ready",
            DeliveryStatus::OnTheWay => "on_the_way",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// Position in the forward lifecycle. Cancelled sits outside it.
    fn sequence_index(self) -> Option<usize> {
        match self {
            DeliveryStatus::Pending => Some(0),
            DeliveryStatus::Confirmed => Some(1),
            DeliveryStatus::Preparing => Some(2),
            DeliveryStatus::Ready => Some(3),
            DeliveryStatus::OnTheWay => Some(4),
            DeliveryStatus::Delivered => Some(5),
            DeliveryStatus::Cancelled => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is asserting a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    /// Our own operators or workflows.
    Local,
    /// The external delivery platform, via API response or webhook.
    Platform,
}

/// Check whether `from -> to` is a legal transition for the given source.
///
/// Terminal states never transition, and a no-op transition is rejected for
/// both sources. Local changes must advance exactly one step in the lifecycle
/// or cancel; platform-reported changes may jump to any later (or earlier)
/// state, because webhook delivery order is not guaranteed.
pub fn validate_transition(
    from: DeliveryStatus,
    to: DeliveryStatus,
    source: TransitionSource,
) -> DomainResult<()> {
    if from.is_terminal() {
        return Err(DomainError::invalid_transition(format!(
            "delivery is already {from}"
        )));
    }
    if to == from {
        return Err(DomainError::invalid_transition(format!(
            "delivery is already {to}"
        )));
    }
    match source {
        TransitionSource::Platform => Ok(()),
        TransitionSource::Local => {
            if to == DeliveryStatus::Cancelled {
                return Ok(());
            }
            match (from.sequence_index(), to.sequence_index()) {
                (Some(f), Some(t)) if t == f + 1 => Ok(()),
                _ => Err(DomainError::invalid_transition(format!(
                    "cannot move delivery from {from} to {to}"
                ))),
            }
        }
    }
}
