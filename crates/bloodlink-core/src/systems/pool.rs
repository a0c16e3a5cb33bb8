//! Blood pool - the single resource spent on connectors

use serde::{Deserialize, Serialize};

/// Shared blood reserve (singleton, stored in engine)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BloodPool {
    blood: i64,
}

impl BloodPool {
    pub fn new(blood: i64) -> Self {
        Self {
            blood: blood.max(0),
        }
    }

    pub fn available(&self) -> i64 {
        self.blood
    }

    pub fn can_afford(&self, amount: i64) -> bool {
        amount >= 0 && amount <= self.blood
    }

    /// Take `amount` from the pool.
    ///
    /// Returns false and leaves the pool untouched when the amount is negative
    /// or larger than what is available. This is the authoritative check:
    /// callers must not assume an earlier feasibility test still holds.
    pub fn debit(&mut self, amount: i64) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.blood -= amount;
        true
    }

    /// Top the pool up. Negative amounts are ignored.
    pub fn credit(&mut self, amount: i64) {
        self.blood = self.blood.saturating_add(amount.max(0));
    }
}
