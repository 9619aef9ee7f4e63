//! Per-team money.
//!
//! Balances are unsigned: a purchase the team cannot cover is refused
//! rather than driving the balance negative.

use serde::{Deserialize, Serialize};

/// A team's treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TeamEconomy {
    money: u32,
}

impl TeamEconomy {
    /// Create an economy with a starting balance.
    #[must_use]
    pub const fn new(money: u32) -> Self {
        Self { money }
    }

    /// Current balance.
    #[must_use]
    pub const fn money(&self) -> u32 {
        self.money
    }

    /// Check if the team can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.money >= cost
    }

    /// Spend money if available.
    ///
    /// Returns true if the transaction succeeded.
    pub fn spend(&mut self, amount: u32) -> bool {
        if self.can_afford(amount) {
            self.money -= amount;
            true
        } else {
            false
        }
    }

    /// Add income. Returns the amount actually credited, which is less than
    /// `amount` only when the balance saturates.
    pub fn deposit(&mut self, amount: u32) -> u32 {
        let before = self.money;
        self.money = self.money.saturating_add(amount);
        self.money - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_respects_balance() {
        let mut economy = TeamEconomy::new(100);
        assert!(economy.spend(75));
        assert!(!economy.spend(30));
        assert_eq!(economy.money(), 25);
    }

    #[test]
    fn test_deposit_saturates() {
        let mut economy = TeamEconomy::new(u32::MAX - 5);
        assert_eq!(economy.deposit(20), 5);
        assert_eq!(economy.money(), u32::MAX);
    }
}
