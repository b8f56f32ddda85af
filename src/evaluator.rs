//! Deciding the outcome of a single quantum attack

use std::fmt::Display;

use rand::Rng;
use tracing::{debug, trace};

use crate::{
    attacker::{non_negative, AttackerProfile, ConfigError},
    target::{Amount, Target},
};

/// Why an [`AttackDecision`] turned out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reason {
    /// The target was not worth the attacker's time.
    LowValueSkipped,
    /// An opportunistic attacker passed on a profitable target.
    OpportunityDeclined,
    /// The block would close before the private key could be derived.
    InsufficientTime,
    /// The private key was derived and a competing spend was created.
    Success,
    /// The computation finished in time but decohered.
    DecoherenceFailure,
}

impl Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowValueSkipped => write!(f, "low value, skipped"),
            Self::OpportunityDeclined => write!(f, "opportunity declined"),
            Self::InsufficientTime => write!(f, "insufficient time"),
            Self::Success => write!(f, "success"),
            Self::DecoherenceFailure => write!(f, "decoherence failure"),
        }
    }
}

/// Result of evaluating one attacker against one target.
///
/// `fee_offered` is zero unless the attack succeeded, and `elapsed_secs` is
/// zero when no timing draw took place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackDecision {
    pub attempted: bool,
    pub succeeded: bool,
    pub elapsed_secs: f64,
    pub fee_offered: Amount,
    pub reason: Reason,
}

impl AttackDecision {
    fn skipped(reason: Reason) -> Self {
        AttackDecision {
            attempted: false,
            succeeded: false,
            elapsed_secs: 0.0,
            fee_offered: 0.0,
            reason,
        }
    }

    fn failed(reason: Reason, elapsed_secs: f64) -> Self {
        AttackDecision {
            attempted: true,
            succeeded: false,
            elapsed_secs,
            fee_offered: 0.0,
            reason,
        }
    }

    fn success(elapsed_secs: f64, fee_offered: Amount) -> Self {
        AttackDecision {
            attempted: true,
            succeeded: true,
            elapsed_secs,
            fee_offered,
            reason: Reason::Success,
        }
    }

    /// Amount the attacker would walk away with if their competing spend were
    /// confirmed.
    pub fn payout(&self, target: &Target) -> Amount {
        if self.succeeded {
            (target.value - self.fee_offered).max(0.0)
        } else {
            0.0
        }
    }
}

/// Decides whether an attacker attempts an attack, whether it succeeds, how
/// long it takes and what fee the competing spend offers.
///
/// The evaluator holds no state between calls. All randomness comes from the
/// [`Rng`] passed to [`evaluate`](Self::evaluate), so a seeded generator makes
/// every decision reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackOutcomeEvaluator {
    min_value: Option<Amount>,
    fee_multiplier: f64,
    value_share: f64,
}

impl Default for AttackOutcomeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackOutcomeEvaluator {
    /// Default multiple of the victim's fee offered by a competing spend.
    pub const DEFAULT_FEE_MULTIPLIER: f64 = 10.0;
    /// Default share of the target's value offered by a competing spend.
    pub const DEFAULT_VALUE_SHARE: f64 = 0.5;
    /// Chance that an opportunistic attacker goes after a profitable target.
    pub const OPPORTUNISTIC_ATTACK_CHANCE: f64 = 0.5;

    pub fn new() -> Self {
        AttackOutcomeEvaluator {
            min_value: None,
            fee_multiplier: Self::DEFAULT_FEE_MULTIPLIER,
            value_share: Self::DEFAULT_VALUE_SHARE,
        }
    }

    /// Use `value` as the profitability threshold for every attacker instead
    /// of the threshold given by their strategy.
    pub fn with_min_value(mut self, value: Amount) -> Result<Self, ConfigError> {
        self.min_value = Some(non_negative("minimum target value", value)?);

        Ok(self)
    }

    pub fn with_fee_multiplier(
        mut self,
        multiplier: f64,
    ) -> Result<Self, ConfigError> {
        self.fee_multiplier = non_negative("fee multiplier", multiplier)?;

        Ok(self)
    }

    pub fn with_value_share(mut self, share: f64) -> Result<Self, ConfigError> {
        self.value_share = non_negative("value share", share)?;

        Ok(self)
    }

    /// Profitability threshold applied to targets of `profile`.
    pub fn min_value_for(&self, profile: &AttackerProfile) -> Amount {
        self.min_value.unwrap_or_else(|| profile.strategy().min_value())
    }

    pub fn fee_multiplier(&self) -> f64 {
        self.fee_multiplier
    }

    pub fn value_share(&self) -> f64 {
        self.value_share
    }

    /// Fee a successful attacker offers to outbid the spend of `target`.
    pub fn competing_fee(&self, target: &Target) -> Amount {
        (self.fee_multiplier * target.fee).max(self.value_share * target.value)
    }

    /// Evaluates one attack by `profile` on `target`, where the block closes
    /// `deadline_secs` seconds from now.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        target: &Target,
        profile: &AttackerProfile,
        deadline_secs: f64,
        rng: &mut R,
    ) -> AttackDecision {
        let decision = self.decide(target, profile, deadline_secs, rng);

        debug!(
            attacker = profile.name(),
            value = target.value,
            reused = target.reused,
            deadline_secs,
            elapsed_secs = decision.elapsed_secs,
            fee_offered = decision.fee_offered,
            reason = %decision.reason,
            "evaluated attack"
        );

        decision
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        target: &Target,
        profile: &AttackerProfile,
        deadline_secs: f64,
        rng: &mut R,
    ) -> AttackDecision {
        // Also catches a NaN value
        if !(target.value >= self.min_value_for(profile)) {
            return AttackDecision::skipped(Reason::LowValueSkipped);
        }

        // Also catches a NaN deadline
        if !(deadline_secs > 0.0) {
            return AttackDecision::failed(Reason::InsufficientTime, 0.0);
        }

        if profile.strategy().is_random() {
            let coin: f64 = rng.gen();
            trace!(coin, "opportunistic coin flip");

            if coin < 1.0 - Self::OPPORTUNISTIC_ATTACK_CHANCE {
                return AttackDecision::skipped(Reason::OpportunityDeclined);
            }
        }

        // A reused address leaked its public key long ago
        let elapsed_secs = if target.reused {
            0.0
        } else {
            Self::attack_time(profile, rng)
        };

        if elapsed_secs > deadline_secs {
            return AttackDecision::failed(
                Reason::InsufficientTime,
                elapsed_secs,
            );
        }

        let draw: f64 = rng.gen();
        trace!(draw, success_rate = profile.success_rate(), "success draw");

        if draw >= profile.success_rate() {
            return AttackDecision::failed(
                Reason::DecoherenceFailure,
                elapsed_secs,
            );
        }

        AttackDecision::success(elapsed_secs, self.competing_fee(target))
    }

    /// Draws the time needed to derive the private key behind a spend. The
    /// address kind of the target plays no part in it.
    fn attack_time<R: Rng + ?Sized>(
        profile: &AttackerProfile,
        rng: &mut R,
    ) -> f64 {
        let (min, max) = (profile.min_time_secs(), profile.max_time_secs());
        let unit: f64 = rng.gen();
        let draw = min + unit * (max - min);
        trace!(draw, "timing draw");

        draw * profile.parallel_efficiency()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::mock::StepRng, rngs::StdRng, SeedableRng};

    use super::{AttackOutcomeEvaluator, Reason};
    use crate::{
        attacker::{AttackStrategy, AttackerProfile},
        target::{AddressKind, Target},
    };

    const SEEDS: std::ops::Range<u64> = 0..500;

    fn profile(min: f64, max: f64, success_rate: f64) -> AttackerProfile {
        AttackerProfile::builder("Test")
            .time_range(min, max)
            .success_rate(success_rate)
            .build()
            .expect("valid profile")
    }

    fn zero_rng() -> StepRng {
        StepRng::new(0, 0)
    }

    fn max_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn low_value_targets_are_skipped() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(1.0, 2.0, 1.0);

        for value in [0.0, 0.01, 0.05, 0.099] {
            let target = Target::new(value, 0.001, AddressKind::P2PKH);
            for seed in 0..20 {
                let mut rng = StdRng::seed_from_u64(seed);
                let decision = eval.evaluate(&target, &profile, 600.0, &mut rng);

                assert!(!decision.attempted);
                assert!(!decision.succeeded);
                assert_eq!(decision.reason, Reason::LowValueSkipped);
            }
        }
    }

    #[test]
    fn min_value_override() {
        let eval = AttackOutcomeEvaluator::new().with_min_value(20.0).unwrap();
        let profile = profile(1.0, 2.0, 1.0);
        let target = Target::new(10.0, 0.1, AddressKind::P2TR);

        let decision = eval.evaluate(&target, &profile, 600.0, &mut zero_rng());
        assert_eq!(decision.reason, Reason::LowValueSkipped);
        assert_eq!(eval.min_value_for(&profile), 20.0);
    }

    #[test]
    fn reused_addresses_take_no_time() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(500.0, 900.0, 0.5);
        let target = Target::new(10.0, 0.1, AddressKind::P2PKH).reused();

        for seed in SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let decision = eval.evaluate(&target, &profile, 60.0, &mut rng);

            assert!(decision.attempted);
            assert_eq!(decision.elapsed_secs, 0.0);
            assert_ne!(decision.reason, Reason::InsufficientTime);
        }
    }

    #[test]
    fn successful_attacks_beat_deadline_and_overbid() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(100.0, 700.0, 0.8);
        let targets = [
            Target::new(0.5, 0.2, AddressKind::P2WPKH),
            Target::new(8.2, 0.1, AddressKind::P2TR),
            Target::new(50.0, 0.5, AddressKind::Multisig { signers: 2, total: 3 }),
        ];

        let mut successes = 0;
        for target in &targets {
            for seed in SEEDS {
                let mut rng = StdRng::seed_from_u64(seed);
                let decision = eval.evaluate(target, &profile, 600.0, &mut rng);

                if decision.succeeded {
                    successes += 1;
                    assert!(decision.attempted);
                    assert!(decision.elapsed_secs <= 600.0);
                    assert!(decision.fee_offered >= 10.0 * target.fee);
                    assert!(decision.fee_offered >= 0.5 * target.value);
                    assert_eq!(decision.reason, Reason::Success);
                } else {
                    assert_eq!(decision.fee_offered, 0.0);
                }
            }
        }

        assert!(successes > 0);
    }

    #[test]
    fn non_positive_deadline_short_circuits() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(0.0, 0.0, 1.0);
        let target = Target::new(10.0, 0.1, AddressKind::P2WPKH);

        for deadline in [0.0, -1.0, -600.0, f64::NAN] {
            for reused in [false, true] {
                let target = Target { reused, ..target.clone() };
                let decision =
                    eval.evaluate(&target, &profile, deadline, &mut zero_rng());

                assert!(decision.attempted);
                assert!(!decision.succeeded);
                assert_eq!(decision.reason, Reason::InsufficientTime);
                assert_eq!(decision.elapsed_secs, 0.0);
            }
        }
    }

    #[test]
    fn slow_attacks_run_out_of_time() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(700.0, 900.0, 1.0);
        let target = Target::new(10.0, 0.1, AddressKind::P2TR);

        let decision = eval.evaluate(&target, &profile, 600.0, &mut zero_rng());
        assert!(decision.attempted);
        assert!(!decision.succeeded);
        assert_eq!(decision.reason, Reason::InsufficientTime);
        assert_eq!(decision.elapsed_secs, 700.0);
    }

    #[test]
    fn decoherence_failure() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(10.0, 20.0, 0.95);
        let target = Target::new(10.0, 0.1, AddressKind::P2TR);

        // Every draw lands just below 1.0
        let decision = eval.evaluate(&target, &profile, 600.0, &mut max_rng());
        assert!(decision.attempted);
        assert!(!decision.succeeded);
        assert_eq!(decision.reason, Reason::DecoherenceFailure);
        assert!(decision.elapsed_secs <= 20.0);
    }

    #[test]
    fn zero_success_rate_never_succeeds() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(1.0, 2.0, 0.0);
        let target = Target::new(10.0, 0.1, AddressKind::P2TR);

        let decision = eval.evaluate(&target, &profile, 600.0, &mut zero_rng());
        assert_eq!(decision.reason, Reason::DecoherenceFailure);
    }

    #[test]
    fn address_kind_does_not_change_timing() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(120.0, 180.0, 0.9);
        let kinds = [
            AddressKind::P2PKH,
            AddressKind::P2WPKH,
            AddressKind::P2TR,
            AddressKind::Multisig { signers: 2, total: 3 },
            AddressKind::Multisig { signers: 3, total: 5 },
        ];

        for seed in 0..50 {
            let decisions: Vec<_> = kinds
                .into_iter()
                .map(|kind| {
                    let target = Target::new(3.0, 0.01, kind);
                    let mut rng = StdRng::seed_from_u64(seed);
                    eval.evaluate(&target, &profile, 600.0, &mut rng)
                })
                .collect();

            for decision in &decisions[1..] {
                assert_eq!(decision, &decisions[0]);
            }
        }
    }

    #[test]
    fn multisig_takes_as_long_as_single_key() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(120.0, 180.0, 1.0);

        for kind in [
            AddressKind::P2PKH,
            AddressKind::Multisig { signers: 3, total: 5 },
        ] {
            let target = Target::new(50.0, 0.5, kind);
            let decision =
                eval.evaluate(&target, &profile, 200.0, &mut zero_rng());

            assert!(decision.succeeded, "{kind} should be broken in time");
            assert_eq!(decision.reason, Reason::Success);
            assert_eq!(decision.elapsed_secs, 120.0);
        }
    }

    #[test]
    fn elapsed_within_time_range() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(120.0, 180.0, 0.5);
        let target = Target::new(10.0, 0.1, AddressKind::P2TR);

        let mut attempts = 0;
        for seed in SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let decision = eval.evaluate(&target, &profile, 600.0, &mut rng);

            assert!(decision.attempted);
            assert!((120.0..=180.0).contains(&decision.elapsed_secs));
            attempts += 1;
        }

        assert_eq!(attempts, SEEDS.count());
    }

    #[test]
    fn nan_value_is_skipped() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(1.0, 2.0, 1.0);
        let target = Target::new(f64::NAN, 0.1, AddressKind::P2WPKH);

        let decision = eval.evaluate(&target, &profile, 600.0, &mut zero_rng());
        assert!(!decision.attempted);
        assert_eq!(decision.reason, Reason::LowValueSkipped);
        assert_eq!(decision.fee_offered, 0.0);
    }

    #[test]
    fn deterministic_given_seed() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = profile(120.0, 700.0, 0.6);
        let target = Target::new(22.0, 0.2, AddressKind::P2TR);

        for seed in 0..100 {
            let a = eval.evaluate(
                &target,
                &profile,
                600.0,
                &mut StdRng::seed_from_u64(seed),
            );
            let b = eval.evaluate(
                &target,
                &profile,
                600.0,
                &mut StdRng::seed_from_u64(seed),
            );
            assert_eq!(a, b);
        }
    }

    #[test]
    fn medium_segwit_spend_is_stolen() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = AttackerProfile::builder("QuantumPirate")
            .time_range(120.0, 180.0)
            .success_rate(0.95)
            .parallel_efficiency(0.7)
            .build()
            .unwrap();
        let target = Target::new(8.2, 0.1, AddressKind::P2WPKH);

        let decision = eval.evaluate(&target, &profile, 1200.0, &mut zero_rng());

        assert!(decision.attempted);
        assert!(decision.succeeded);
        assert_eq!(decision.reason, Reason::Success);
        assert!((decision.elapsed_secs - 84.0).abs() < 1e-9);
        assert!((decision.fee_offered - f64::max(10.0 * 0.1, 4.1)).abs() < 1e-9);
        assert!((decision.payout(&target) - 4.1).abs() < 1e-9);
    }

    #[test]
    fn small_value_fee_dominates() {
        let eval = AttackOutcomeEvaluator::new();
        let target = Target::new(1.0, 0.2, AddressKind::P2PKH);

        assert!((eval.competing_fee(&target) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn opportunistic_attackers_flip_a_coin() {
        let eval = AttackOutcomeEvaluator::new();
        let profile = AttackerProfile::builder("Opportunist")
            .strategy(AttackStrategy::Opportunistic)
            .time_range(10.0, 20.0)
            .build()
            .unwrap();
        let target = Target::new(2.0, 0.01, AddressKind::P2TR);

        let declined = eval.evaluate(&target, &profile, 600.0, &mut zero_rng());
        assert!(!declined.attempted);
        assert_eq!(declined.reason, Reason::OpportunityDeclined);

        let mut saw_attempt = false;
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            saw_attempt |= eval.evaluate(&target, &profile, 600.0, &mut rng).attempted;
        }
        assert!(saw_attempt);
    }

    #[test]
    fn negative_overrides_rejected() {
        assert!(AttackOutcomeEvaluator::new().with_min_value(-1.0).is_err());
        assert!(AttackOutcomeEvaluator::new().with_fee_multiplier(f64::NAN).is_err());
        assert!(AttackOutcomeEvaluator::new().with_value_share(-0.5).is_err());
    }
}
