//! Building/running simulations and collecting what happened in them

use std::num::NonZeroUsize;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::{
    attacker::{AttackerId, AttackerProfile},
    block::{self, BlockOutcome, CompetingSpend},
    evaluator::{AttackDecision, AttackOutcomeEvaluator},
    results::ResultsBuilder,
    scenario::Scenario,
    target::Amount,
};

pub mod builder;

pub use builder::{SimulationBuildError, SimulationBuilder};

/// Container for a group of seeded trials which run the same scenarios
/// against the same attackers. Created with [`SimulationBuilder`] and run
/// with [`SimulationGroup::run_all`].
#[derive(Debug, Clone)]
pub struct SimulationGroup {
    attackers: Vec<AttackerProfile>,
    scenarios: Vec<Scenario>,
    evaluator: AttackOutcomeEvaluator,
    block_interval_secs: f64,
    seed: u64,
    trials: NonZeroUsize,
}

/// One attacker's evaluation of one scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub attacker: AttackerId,
    pub decision: AttackDecision,
}

/// Everything that happened to a single scenario during a trial.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioLog {
    /// Index of the scenario in [`SimulationOutput::scenarios`].
    pub scenario: usize,
    pub deadline_secs: f64,
    /// Attackers which evaluated the scenario, in scan order. Attackers that
    /// found the spend already under attack are left out.
    pub attempts: Vec<Attempt>,
    pub outcome: BlockOutcome,
}

/// Running totals for one attacker over a trial.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Tally {
    /// Competing spends which were confirmed.
    pub won: usize,
    /// Attempts which ran out of time, decohered or were outbid.
    pub failed: usize,
    /// Targets which were not attempted.
    pub skipped: usize,
    pub stolen: Amount,
}

impl Tally {
    pub fn attempted(&self) -> usize {
        self.won + self.failed
    }

    /// Fraction of attempts that ended in theft, if any were made.
    pub fn success_rate(&self) -> Option<f64> {
        match self.attempted() {
            0 => None,
            n => Some(self.won as f64 / n as f64),
        }
    }
}

/// One seeded pass over every scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialLog {
    pub trial: usize,
    pub seed: u64,
    pub scenarios: Vec<ScenarioLog>,
    /// Indexed by attacker, in the order attackers were added.
    pub tallies: Vec<Tally>,
}

impl TrialLog {
    pub fn tally(&self, attacker: AttackerId) -> &Tally {
        &self.tallies[attacker.0 - 1]
    }

    /// Total value stolen by all attackers.
    pub fn total_stolen(&self) -> Amount {
        self.tallies.iter().map(|t| t.stolen).sum()
    }
}

/// Contains the output data from a [`SimulationGroup`].
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub attackers: Vec<AttackerProfile>,
    pub scenarios: Vec<Scenario>,
    pub evaluator: AttackOutcomeEvaluator,
    pub block_interval_secs: f64,
    pub trials: Vec<TrialLog>,
}

impl SimulationOutput {
    pub fn attacker(&self, id: AttackerId) -> &AttackerProfile {
        &self.attackers[id.0 - 1]
    }

    /// Fraction of trials in which the given scenario's output was stolen.
    pub fn theft_rate(&self, scenario: usize) -> f64 {
        let stolen = self
            .trials
            .iter()
            .filter(|trial| trial.scenarios[scenario].outcome.is_stolen())
            .count();

        stolen as f64 / self.trials.len() as f64
    }
}

impl SimulationGroup {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Runs every trial in order. Trial `i` draws from a generator seeded
    /// with `seed + i`.
    pub fn run_all(self) -> ResultsBuilder {
        info!(
            attackers = self.attackers.len(),
            scenarios = self.scenarios.len(),
            trials = self.trials.get(),
            seed = self.seed,
            "running simulation"
        );

        let trials: Vec<_> =
            (0..self.trials.get()).map(|i| self.run_trial(i)).collect();

        let total: Amount = trials.iter().map(TrialLog::total_stolen).sum();
        info!(
            mean_stolen = total / trials.len() as f64,
            "simulation finished"
        );

        let SimulationGroup {
            attackers,
            scenarios,
            evaluator,
            block_interval_secs,
            trials: repeated,
            ..
        } = self;

        let output = SimulationOutput {
            attackers,
            scenarios,
            evaluator,
            block_interval_secs,
            trials,
        };

        ResultsBuilder::new(output, repeated)
    }

    fn run_trial(&self, trial: usize) -> TrialLog {
        let seed = self.seed.wrapping_add(trial as u64);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tallies = vec![Tally::default(); self.attackers.len()];

        let mut scenarios = Vec::with_capacity(self.scenarios.len());
        for (index, scenario) in self.scenarios.iter().enumerate() {
            let target = &scenario.target;
            let deadline_secs = scenario.deadline(self.block_interval_secs);

            let mut attempts = vec![];
            let mut competitors: Vec<CompetingSpend> = vec![];
            for (i, profile) in self.attackers.iter().enumerate() {
                // Spend is already under attack
                if !competitors.is_empty() {
                    break;
                }

                let attacker = AttackerId(i + 1);
                let decision = self.evaluator.evaluate(
                    target,
                    profile,
                    deadline_secs,
                    &mut rng,
                );
                if decision.succeeded {
                    competitors.push(CompetingSpend {
                        attacker,
                        fee: decision.fee_offered,
                    });
                }

                attempts.push(Attempt { attacker, decision });
            }

            let outcome = block::resolve(target, &competitors);
            for attempt in attempts.iter() {
                let tally = &mut tallies[attempt.attacker.0 - 1];

                match outcome {
                    _ if !attempt.decision.attempted => tally.skipped += 1,
                    BlockOutcome::Stolen { attacker, amount, .. }
                        if attacker == attempt.attacker =>
                    {
                        tally.won += 1;
                        tally.stolen += amount;
                    }
                    _ => tally.failed += 1,
                }
            }

            scenarios.push(ScenarioLog {
                scenario: index,
                deadline_secs,
                attempts,
                outcome,
            });
        }

        TrialLog { trial, seed, scenarios, tallies }
    }
}
