//! Hand-off between transaction creation and settlement.
//!
//! The message carries only the transaction id; the consumer re-fetches
//! the transaction, so a redelivered or stale message is harmless.
//! Delivery is at-least-once: the settlement engine is idempotent, and
//! this module only has to get each id to the consumer at least once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::settlement::SettlementEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub transaction_id: Uuid,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("settlement channel closed")]
    ChannelClosed,
}

/// Producer-side contract: fire a settlement request at the consumer.
#[async_trait]
pub trait SettlementPublisher: Send + Sync {
    async fn publish(&self, request: SettlementRequest) -> Result<(), TransportError>;
}

/// In-process transport backed by a bounded tokio channel.
pub fn settlement_channel(
    capacity: usize,
) -> (ChannelPublisher, mpsc::Receiver<SettlementRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelPublisher { sender: tx }, rx)
}

#[derive(Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<SettlementRequest>,
}

#[async_trait]
impl SettlementPublisher for ChannelPublisher {
    async fn publish(&self, request: SettlementRequest) -> Result<(), TransportError> {
        info!(transaction_id = %request.transaction_id, "publishing settlement request");
        self.sender
            .send(request)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Single logical consumer: drains the channel and hands each id to the
/// settlement engine. Runs until every publisher is dropped.
///
/// A missing account leaves the transaction pending; redelivery (or an
/// operator) may retry it later, so it is logged and not escalated.
pub async fn run_consumer(mut receiver: mpsc::Receiver<SettlementRequest>, engine: SettlementEngine) {
    while let Some(request) = receiver.recv().await {
        let id = request.transaction_id;
        info!(transaction_id = %id, "received settlement request");
        match engine.settle(id).await {
            Ok(outcome) => {
                info!(transaction_id = %id, ?outcome, "settlement handled");
            }
            Err(LedgerError::NotFound(reason)) => {
                warn!(transaction_id = %id, %reason, "settlement deferred, transaction stays pending");
            }
            Err(err) => {
                warn!(transaction_id = %id, %err, "settlement failed");
            }
        }
    }
}
