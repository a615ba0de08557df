//! Payment processing simulator.
//!
//! # Algorithm
//! 1. Reject requests missing `user_id` or `amount` before any effect
//! 2. Sleep a delay drawn from the bound profile's latency range
//! 3. Roll the profile's failure rate; declines pick uniformly from a
//!    fixed catalog of kinds and persist nothing
//! 4. Successes mint an order id and append a ledger record
//!
//! The profile and dice are bound once at construction. Requests never
//! change the fault model.

use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::chaos::FaultDice;
use crate::error::ServiceError;
use crate::payment::ledger::{PaymentLedger, PaymentRecord};
use crate::payment::profile::BehaviorProfile;

/// Wire body for `POST /process`. Fields are optional so validation can
/// answer 400 instead of a decode rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    pub user_id: Option<String>,
    pub amount: Option<f64>,
    pub items: Option<u32>,
}

/// Decline kinds, drawn uniformly when the failure roll fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineKind {
    GatewayTimeout,
    InsufficientFunds,
    ServiceUnavailable,
    InvalidPaymentMethod,
}

impl DeclineKind {
    pub const ALL: [DeclineKind; 4] = [
        DeclineKind::GatewayTimeout,
        DeclineKind::InsufficientFunds,
        DeclineKind::ServiceUnavailable,
        DeclineKind::InvalidPaymentMethod,
    ];

    pub fn message(self) -> &'static str {
        match self {
            DeclineKind::GatewayTimeout => "Payment gateway timeout",
            DeclineKind::InsufficientFunds => "Insufficient funds",
            DeclineKind::ServiceUnavailable => "Service temporarily unavailable",
            DeclineKind::InvalidPaymentMethod => "Invalid payment method",
        }
    }

    pub fn http_code(self) -> StatusCode {
        match self {
            DeclineKind::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            DeclineKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            DeclineKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            DeclineKind::InvalidPaymentMethod => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result of a processed payment attempt.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    Approved(PaymentRecord),
    Declined {
        kind: DeclineKind,
        processing_time: f64,
    },
}

/// The simulator itself: a profile, a dice, and the ledger it appends to.
pub struct PaymentSimulator {
    profile: BehaviorProfile,
    dice: Arc<dyn FaultDice>,
    ledger: Arc<PaymentLedger>,
}

impl PaymentSimulator {
    pub fn new(
        profile: BehaviorProfile,
        dice: Arc<dyn FaultDice>,
        ledger: Arc<PaymentLedger>,
    ) -> Self {
        Self {
            profile,
            dice,
            ledger,
        }
    }

    pub fn profile(&self) -> &BehaviorProfile {
        &self.profile
    }

    /// Process one payment attempt. The simulated delay elapses before
    /// any outcome is produced.
    pub async fn process(&self, request: &ProcessRequest) -> Result<PaymentOutcome, ServiceError> {
        let user_id = request
            .user_id
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ServiceError::Validation("Missing user_id or amount".to_string()))?;
        let amount = request
            .amount
            .ok_or_else(|| ServiceError::Validation("Missing user_id or amount".to_string()))?;

        let delay = self
            .dice
            .delay(self.profile.latency_min, self.profile.latency_max);
        tokio::time::sleep(delay).await;
        let processing_time = delay.as_secs_f64();

        if self.dice.roll() < self.profile.failure_rate {
            let kind = DeclineKind::ALL[self.dice.pick(DeclineKind::ALL.len())];
            tracing::warn!(
                user_id = %user_id,
                kind = kind.message(),
                processing_time,
                "payment declined"
            );
            return Ok(PaymentOutcome::Declined {
                kind,
                processing_time,
            });
        }

        let record = PaymentRecord {
            order_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            amount,
            status: "completed".to_string(),
            version: self.profile.version.clone(),
            processing_time,
        };
        self.ledger.append(record.clone());

        tracing::info!(
            order_id = %record.order_id,
            user_id = %user_id,
            amount,
            items = request.items.unwrap_or(0),
            "payment completed"
        );
        Ok(PaymentOutcome::Approved(record))
    }
}
