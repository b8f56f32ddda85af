//! Resolving double-spends when the next block is mined.

use tracing::debug;

use crate::{
    attacker::AttackerId,
    target::{Amount, Target},
};

/// A spend created by an attacker which consumes the same output as the
/// victim's spend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompetingSpend {
    pub attacker: AttackerId,
    pub fee: Amount,
}

/// Which spend of a target's output made it into the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockOutcome {
    /// The legitimate spend was confirmed.
    Confirmed { fee: Amount },
    /// An attacker's competing spend was confirmed instead.
    Stolen { attacker: AttackerId, amount: Amount, fee: Amount },
}

impl BlockOutcome {
    #[inline]
    pub fn is_stolen(&self) -> bool {
        matches!(self, Self::Stolen { .. })
    }

    /// Fee paid by the confirmed spend.
    pub fn fee(&self) -> Amount {
        match self {
            Self::Confirmed { fee } | Self::Stolen { fee, .. } => *fee,
        }
    }
}

/// Picks the spend with the highest fee out of the victim's spend and
/// `competitors`. Spends are ordered by broadcast time with the victim's
/// spend first, and ties go to the earliest broadcast.
pub fn resolve(target: &Target, competitors: &[CompetingSpend]) -> BlockOutcome {
    let winner = competitors
        .iter()
        .fold(None::<&CompetingSpend>, |best, spend| {
            let best_fee = best.map_or(target.fee, |b| b.fee);
            if spend.fee > best_fee {
                Some(spend)
            } else {
                best
            }
        });

    let outcome = match winner {
        None => BlockOutcome::Confirmed { fee: target.fee },
        Some(spend) => BlockOutcome::Stolen {
            attacker: spend.attacker,
            amount: (target.value - spend.fee).max(0.0),
            fee: spend.fee,
        },
    };

    debug!(
        competitors = competitors.len(),
        stolen = outcome.is_stolen(),
        fee = outcome.fee(),
        "resolved block"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::{resolve, BlockOutcome, CompetingSpend};
    use crate::target::{AddressKind, Target};

    fn target() -> Target {
        Target::new(10.0, 0.1, AddressKind::P2PKH)
    }

    #[test]
    fn no_competition_confirms() {
        assert_eq!(resolve(&target(), &[]), BlockOutcome::Confirmed { fee: 0.1 });
    }

    #[test]
    fn highest_fee_wins() {
        let spends = [
            CompetingSpend { attacker: 1.into(), fee: 5.0 },
            CompetingSpend { attacker: 2.into(), fee: 6.0 },
        ];

        match resolve(&target(), &spends) {
            BlockOutcome::Stolen { attacker, amount, fee } => {
                assert_eq!(attacker, 2.into());
                assert_eq!(fee, 6.0);
                assert_eq!(amount, 4.0);
            }
            other => panic!("expected theft, got {:?}", other),
        }
    }

    #[test]
    fn ties_go_to_earliest_broadcast() {
        let spends = [CompetingSpend { attacker: 1.into(), fee: 0.1 }];
        assert!(!resolve(&target(), &spends).is_stolen());

        let spends = [
            CompetingSpend { attacker: 1.into(), fee: 5.0 },
            CompetingSpend { attacker: 2.into(), fee: 5.0 },
        ];
        assert!(matches!(
            resolve(&target(), &spends),
            BlockOutcome::Stolen { attacker, .. } if attacker == 1.into()
        ));
    }

    #[test]
    fn confirmed_fee_is_never_outbid() {
        let spends = [
            CompetingSpend { attacker: 1.into(), fee: 0.05 },
            CompetingSpend { attacker: 2.into(), fee: 12.0 },
            CompetingSpend { attacker: 3.into(), fee: 3.0 },
        ];
        let outcome = resolve(&target(), &spends);

        assert!(spends.iter().all(|s| s.fee <= outcome.fee()));
        // Paying more than the output is worth leaves nothing to steal
        assert!(matches!(outcome, BlockOutcome::Stolen { amount, .. } if amount == 0.0));
    }
}
