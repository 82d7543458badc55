use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after a transaction commits. Delivery is
/// best-effort; a dropped event never affects the committed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    MovementRecorded {
        movement_id: Uuid,
        operation: String,
        structure: String,
        quantity: i32,
        stock_one_id: Uuid,
        stock_two_id: Option<Uuid>,
    },
    StockCreated {
        stock_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
    },
    StockDeactivated {
        stock_id: Uuid,
    },
    /// Informational only: the ledger does not enforce thresholds.
    LowStockDetected {
        stock_id: Uuid,
        quantity: i32,
        threshold: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background consumer for domain events. Runs for the lifetime of the
/// process; exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::MovementRecorded {
                movement_id,
                operation,
                structure,
                quantity,
                ..
            } => {
                info!(
                    %movement_id,
                    operation,
                    structure,
                    quantity,
                    "movement recorded"
                );
            }
            Event::LowStockDetected {
                stock_id,
                quantity,
                threshold,
            } => {
                warn!(%stock_id, quantity, threshold, "stock at or below reorder threshold");
            }
            other => {
                info!(event = ?other, "event processed");
            }
        }
    }
    info!("event channel closed, processor shutting down");
}
