//! Simulated spendable outputs which quantum attackers may target.

use std::fmt::Display;

use crate::attacker::{non_negative, ConfigError};

/// Numeric type used to represent amounts of bitcoin.
pub type Amount = f64;

/// Script type of the address holding a [`Target`].
///
/// Every variant exposes its public key(s) once the output is spent, so the
/// address kind never changes how fast a single key can be broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// Legacy pay-to-pubkey-hash.
    P2PKH,
    /// SegWit v0 pay-to-witness-pubkey-hash.
    P2WPKH,
    /// Taproot.
    P2TR,
    /// M-of-N multisig. `signers` is the number of public keys revealed by a
    /// spend.
    Multisig { signers: u32, total: u32 },
}

impl AddressKind {
    /// Number of public keys revealed by a spend from this kind of address.
    /// Breaking any one of them takes the same time as for a single-key
    /// address.
    pub fn exposed_keys(&self) -> u32 {
        match self {
            Self::Multisig { signers, .. } => (*signers).max(1),
            _ => 1,
        }
    }
}

impl Display for AddressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::P2PKH => write!(f, "P2PKH (Legacy)"),
            Self::P2WPKH => write!(f, "P2WPKH (SegWit)"),
            Self::P2TR => write!(f, "P2TR (Taproot)"),
            Self::Multisig { signers, total } => {
                write!(f, "Multisig {}-of-{}", signers, total)
            }
        }
    }
}

/// A spend observed in the mempool, along with the output it consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Value of the spent output.
    pub value: Amount,
    /// Fee paid by the legitimate spend.
    pub fee: Amount,
    pub address_kind: AddressKind,
    /// True if the address was spent from before, meaning its public key was
    /// already public when this spend was broadcast.
    pub reused: bool,
}

impl Target {
    /// Values are not checked here; see [`Target::validate`].
    pub fn new(value: Amount, fee: Amount, address_kind: AddressKind) -> Self {
        Target { value, fee, address_kind, reused: false }
    }

    /// Checks that value and fee are finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("target value", self.value)?;
        non_negative("target fee", self.fee)?;

        Ok(())
    }

    /// Marks this target's address as reused.
    pub fn reused(mut self) -> Self {
        self.reused = true;

        self
    }

    #[inline]
    pub fn exposed_keys(&self) -> u32 {
        self.address_kind.exposed_keys()
    }

    /// Fee of the legitimate spend as a fraction of the spent value.
    pub fn fee_rate(&self) -> f64 {
        if self.value > 0.0 {
            self.fee / self.value
        } else {
            0.0
        }
    }
}
