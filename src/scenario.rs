//! The fixed table of spends walked through by a simulation.

use crate::target::{AddressKind, Amount, Target};

/// Average time between blocks, in seconds.
pub const BLOCK_INTERVAL_SECS: f64 = 600.0;

/// A single spend broadcast by a wallet owner, along with the story told
/// about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub owner: String,
    pub title: String,
    pub description: String,
    pub target: Target,
    /// Seconds between broadcast and the next block. When `None` the
    /// simulation's block interval is used.
    pub deadline_secs: Option<f64>,
}

impl Scenario {
    pub fn new<O, T, D>(owner: O, title: T, description: D, target: Target) -> Self
    where
        O: Into<String>,
        T: Into<String>,
        D: Into<String>,
    {
        Scenario {
            owner: owner.into(),
            title: title.into(),
            description: description.into(),
            target,
            deadline_secs: None,
        }
    }

    /// Sets the time between this spend's broadcast and the next block.
    pub fn with_deadline(mut self, secs: f64) -> Self {
        self.deadline_secs = Some(secs);

        self
    }

    /// Deadline of this scenario given the simulation's block interval.
    pub fn deadline(&self, block_interval_secs: f64) -> f64 {
        self.deadline_secs.unwrap_or(block_interval_secs)
    }

    /// Value the recipient of the legitimate spend would receive.
    pub fn payment(&self) -> Amount {
        self.target.value - self.target.fee
    }
}

/// The six spends of the standard walkthrough, in order.
pub fn standard() -> Vec<Scenario> {
    use AddressKind::*;

    vec![
        Scenario::new(
            "Frank",
            "Small Transaction",
            "Frank sends a small amount. Will attackers bother?",
            Target::new(0.05, 0.005, P2PKH),
        ),
        Scenario::new(
            "Bob",
            "Medium Transaction with Replace-by-Fee",
            "Bob's spend signals RBF, a mechanism attackers can use too.",
            Target::new(8.2, 0.1, P2WPKH),
        ),
        Scenario::new(
            "Carol",
            "High-Value Taproot Transaction",
            "Carol sends 22 BTC. Taproot offers no quantum resistance.",
            Target::new(22.0, 0.2, P2TR),
        ),
        Scenario::new(
            "Dave",
            "Multisig Transaction",
            "Dave's 2-of-3 multisig reveals its signers' public keys.",
            Target::new(50.0, 0.5, Multisig { signers: 2, total: 3 }),
        ),
        Scenario::new(
            "Eve",
            "Whale Transaction",
            "Eve sends 100 BTC. Every attacker wants this one.",
            Target::new(100.0, 0.5, P2WPKH),
        ),
        Scenario::new(
            "Alice",
            "Address Reuse",
            "Alice spends from an address she used before. Her public key \
             is already known.",
            Target::new(10.0, 0.1, P2PKH).reused(),
        ),
    ]
}
