//! Economy
//!
//! Placement costs money. The session asks the economy before committing
//! and surfaces a refusal through the toolbar message channel.

use log::debug;

use crate::game::entity::EntityId;
use crate::game::error::{PlacementError, Result};
use crate::game::scene::Scene;

pub trait Economy {
    fn balance(&self) -> i64;

    fn can_afford(&self, cost: i64) -> bool {
        cost <= 0 || self.balance() >= cost
    }

    /// Take `cost` from the balance, refusing when it is not covered.
    fn debit(&mut self, cost: i64) -> Result<()>;

    fn credit(&mut self, amount: i64);
}

/// Catalog price of an entity; sets cost the sum of their members.
pub fn cost_of(scene: &Scene, id: EntityId) -> i64 {
    let own = scene
        .get(id)
        .and_then(|e| e.piece_id.as_deref())
        .and_then(|piece| scene.catalog().get(piece))
        .map(|piece| piece.price)
        .unwrap_or(0);
    let members: i64 = scene
        .group(id)
        .map(|g| g.members.iter().map(|m| cost_of(scene, *m)).sum())
        .unwrap_or(0);
    own + members
}

/// A single-currency balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wallet {
    balance: i64,
}

impl Wallet {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }
}

impl Economy for Wallet {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn debit(&mut self, cost: i64) -> Result<()> {
        if !self.can_afford(cost) {
            return Err(PlacementError::InsufficientFunds {
                required: cost,
                available: self.balance,
            });
        }
        self.balance -= cost.max(0);
        debug!("[Economy] Debited {}, balance {}", cost, self.balance);
        Ok(())
    }

    fn credit(&mut self, amount: i64) {
        self.balance += amount;
    }
}
