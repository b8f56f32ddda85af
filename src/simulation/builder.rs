use std::num::NonZeroUsize;

use crate::{
    attacker::{AttackerId, AttackerProfile, ConfigError},
    evaluator::AttackOutcomeEvaluator,
    scenario::{self, Scenario, BLOCK_INTERVAL_SECS},
    target::Amount,
};

use super::SimulationGroup;

/// Builds a [`SimulationGroup`].
///
/// ```
/// use quantum_sim::prelude::*;
///
/// let results = SimulationBuilder::new()
///     .add_attacker(AttackerProfile::quantum_pirate())
///     .standard_scenarios()
///     .seed(42)
///     .build()
///     .unwrap()
///     .run_all();
///
/// assert_eq!(results.data().trials.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    pub seed: Option<u64>,
    pub trials: Option<usize>,
    pub block_interval_secs: Option<f64>,
    pub min_value: Option<Amount>,
    pub evaluator: Option<AttackOutcomeEvaluator>,
    attackers: Vec<AttackerProfile>,
    scenarios: Vec<Scenario>,
    last_assigned_attacker_id: AttackerId,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationBuildError {
    #[error("no attackers were added")]
    NoAttackersGiven,
    #[error("no scenarios were added")]
    NoScenariosGiven,
    #[error("number of trials must be greater than 0")]
    ZeroTrials,
    #[error("block interval {0}s is not a positive number")]
    BadBlockInterval(f64),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}

impl SimulationBuilder {
    /// Seed used when none is given.
    pub const DEFAULT_SEED: u64 = 42;

    /// Creates a new [`SimulationBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `attacker` to the simulation. Attackers scan each scenario in the
    /// order they were added.
    pub fn add_attacker(mut self, attacker: AttackerProfile) -> Self {
        self.attackers.push(attacker);
        self.last_assigned_attacker_id += 1;

        self
    }

    /// ID which will be given to the next attacker added.
    pub fn next_attacker_id(&self) -> AttackerId {
        self.last_assigned_attacker_id + 1
    }

    /// Add `scenario` after all previously added scenarios.
    pub fn add_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);

        self
    }

    /// Call [`SimulationBuilder::add_scenario`] once for each element of
    /// `scenarios`.
    pub fn scenarios<I>(mut self, scenarios: I) -> Self
    where
        I: IntoIterator<Item = Scenario>,
    {
        self.scenarios.extend(scenarios);

        self
    }

    /// Add the six scenarios of the standard walkthrough.
    pub fn standard_scenarios(self) -> Self {
        self.scenarios(scenario::standard())
    }

    /// Sets the base seed of the simulation (default
    /// [`Self::DEFAULT_SEED`]).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);

        self
    }

    /// Sets the number of seeded trials to run (default 1).
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);

        self
    }

    /// Sets the time between a spend's broadcast and the next block for
    /// scenarios without their own deadline (default 600 seconds).
    pub fn block_interval(mut self, secs: f64) -> Self {
        self.block_interval_secs = Some(secs);

        self
    }

    /// Replace every attacker's strategy threshold with `value`.
    pub fn min_value(mut self, value: Amount) -> Self {
        self.min_value = Some(value);

        self
    }

    /// Sets the [`AttackOutcomeEvaluator`] used to decide attacks
    /// ([`AttackOutcomeEvaluator::default`] used otherwise).
    pub fn evaluator(mut self, evaluator: AttackOutcomeEvaluator) -> Self {
        self.evaluator = Some(evaluator);

        self
    }

    /// Creates a [`SimulationGroup`] from the specified parameters.
    pub fn build(self) -> Result<SimulationGroup, SimulationBuildError> {
        use SimulationBuildError::*;

        let SimulationBuilder {
            seed,
            trials,
            block_interval_secs,
            min_value,
            evaluator,
            attackers,
            scenarios,
            ..
        } = self;

        if attackers.is_empty() {
            return Err(NoAttackersGiven);
        }
        if scenarios.is_empty() {
            return Err(NoScenariosGiven);
        }
        for scenario in scenarios.iter() {
            scenario.target.validate()?;
        }

        let trials = match trials {
            Some(x) => NonZeroUsize::new(x).ok_or(ZeroTrials)?,
            None => NonZeroUsize::MIN,
        };

        let block_interval_secs = match block_interval_secs {
            Some(x) if x.is_finite() && x > 0.0 => x,
            Some(x) => return Err(BadBlockInterval(x)),
            None => BLOCK_INTERVAL_SECS,
        };

        let mut evaluator = evaluator.unwrap_or_default();
        if let Some(value) = min_value {
            evaluator = evaluator.with_min_value(value)?;
        }

        Ok(SimulationGroup {
            attackers,
            scenarios,
            evaluator,
            block_interval_secs,
            seed: seed.unwrap_or(Self::DEFAULT_SEED),
            trials,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        attacker::AttackerProfile,
        attacker::ConfigError,
        scenario::Scenario,
        target::{AddressKind, Target},
    };

    use super::{SimulationBuildError, SimulationBuilder};

    #[test]
    fn example_build() {
        SimulationBuilder::new()
            .add_attacker(AttackerProfile::quantum_pirate())
            .standard_scenarios()
            .build()
            .expect("valid simulation build");
    }

    #[test]
    fn attacker_ids_follow_insertion() {
        let builder = SimulationBuilder::new();
        assert_eq!(builder.next_attacker_id(), 1.into());

        let builder = builder
            .add_attacker(AttackerProfile::quantum_pirate())
            .add_attacker(AttackerProfile::crypto_thief());
        assert_eq!(builder.next_attacker_id(), 3.into());
    }

    #[test]
    fn empty_builds_rejected() {
        let err = SimulationBuilder::new().standard_scenarios().build();
        assert!(matches!(err, Err(SimulationBuildError::NoAttackersGiven)));

        let err = SimulationBuilder::new()
            .add_attacker(AttackerProfile::quantum_pirate())
            .build();
        assert!(matches!(err, Err(SimulationBuildError::NoScenariosGiven)));
    }

    #[test]
    fn zero_values_rejected() {
        let base = || {
            SimulationBuilder::new()
                .add_attacker(AttackerProfile::quantum_pirate())
                .standard_scenarios()
        };

        assert!(matches!(
            base().trials(0).build(),
            Err(SimulationBuildError::ZeroTrials)
        ));
        assert!(matches!(
            base().block_interval(0.0).build(),
            Err(SimulationBuildError::BadBlockInterval(_))
        ));
        assert!(matches!(
            base().block_interval(f64::INFINITY).build(),
            Err(SimulationBuildError::BadBlockInterval(_))
        ));
        assert!(matches!(
            base().min_value(-3.0).build(),
            Err(SimulationBuildError::ConfigError(ConfigError::Negative { .. }))
        ));
    }

    #[test]
    fn bad_scenario_target_rejected() {
        let target = Target::new(f64::NAN, 0.1, AddressKind::P2PKH);
        let err = SimulationBuilder::new()
            .add_attacker(AttackerProfile::quantum_pirate())
            .add_scenario(Scenario::new("Mallory", "Broken", "", target))
            .build();

        assert!(matches!(
            err,
            Err(SimulationBuildError::ConfigError(ConfigError::Negative {
                field: "target value",
                ..
            }))
        ));
    }
}
