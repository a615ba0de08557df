//! Append-only payment ledger.
//!
//! Records are written once on a successful payment and never mutated.
//! Declined payments leave no trace here.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed payment, keyed by order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: Uuid,
    pub user_id: String,
    pub amount: f64,
    pub status: String,
    pub version: String,
    pub processing_time: f64,
}

/// Aggregate view over the ledger, served by the metrics endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LedgerSummary {
    pub total_payments: usize,
    pub total_amount: f64,
    pub average_processing_time: f64,
}

/// Thread-safe append-only log of completed payments.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    records: DashMap<Uuid, PaymentRecord>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed payment. Records are never overwritten; a
    /// colliding order id would indicate a broken id mint.
    pub fn append(&self, record: PaymentRecord) {
        let order_id = record.order_id;
        if self.records.insert(order_id, record).is_some() {
            tracing::error!(order_id = %order_id, "duplicate order id appended to ledger");
        }
    }

    /// Pure read of one record.
    pub fn get(&self, order_id: &Uuid) -> Option<PaymentRecord> {
        self.records.get(order_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Walk the ledger and aggregate totals.
    pub fn summary(&self) -> LedgerSummary {
        let mut total_payments = 0usize;
        let mut total_amount = 0.0;
        let mut total_processing = 0.0;
        for record in self.records.iter() {
            total_payments += 1;
            total_amount += record.amount;
            total_processing += record.processing_time;
        }
        LedgerSummary {
            total_payments,
            total_amount,
            average_processing_time: total_processing / total_payments.max(1) as f64,
        }
    }
}
