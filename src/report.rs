//! Human-readable walkthrough of a simulation.
//!
//! The text produced here is meant to be read, not parsed, and may change
//! between versions.

use std::fmt::{self, Display, Formatter};

use crate::{
    attacker::{AttackerId, AttackerProfile},
    block::BlockOutcome,
    evaluator::{AttackDecision, Reason},
    scenario::Scenario,
    simulation::{ScenarioLog, SimulationOutput, TrialLog},
    utils::percent_of,
};

const WIDTH: usize = 75;

/// Narrative account of a single trial, followed by per-scenario theft rates
/// over every trial of the simulation.
#[derive(Debug, Clone, Copy)]
pub struct Narrative<'a> {
    output: &'a SimulationOutput,
    trial: usize,
}

impl<'a> Narrative<'a> {
    /// Narrates the first trial of `output`.
    pub fn new(output: &'a SimulationOutput) -> Self {
        Narrative { output, trial: 0 }
    }

    /// Narrates trial `trial` instead of the first one. Out-of-range trials
    /// fall back to the last trial.
    pub fn trial(mut self, trial: usize) -> Self {
        self.trial = trial.min(self.output.trials.len().saturating_sub(1));

        self
    }

    fn log(&self) -> &'a TrialLog {
        &self.output.trials[self.trial]
    }

    fn name(&self, id: AttackerId) -> &'a str {
        self.output.attacker(id).name()
    }

    fn write_attackers(&self, f: &mut Formatter<'_>) -> fmt::Result {
        step(f, 1, "QUANTUM ATTACKERS", "Adversaries watching the mempool")?;

        for (i, profile) in self.output.attackers.iter().enumerate() {
            let computer = profile.computer();
            let min_value = self.output.evaluator.min_value_for(profile);

            writeln!(f)?;
            writeln!(f, "  Attacker #{}: {}", i + 1, profile.name())?;
            writeln!(f, "  |- Quantum computer: {}", computer.name)?;
            writeln!(f, "  |- Qubits: {}", computer.qubits)?;
            writeln!(
                f,
                "  |- Can break secp256k1: {}",
                if computer.can_break_secp256k1() { "YES" } else { "NO" }
            )?;
            writeln!(
                f,
                "  |- Success rate: {:.1}%",
                profile.success_rate() * 100.0
            )?;
            writeln!(f, "  |- Time to break a key: {}", time_range(profile))?;
            writeln!(
                f,
                "  `- Strategy: {} (targets worth at least {} BTC)",
                profile.strategy(),
                min_value
            )?;
        }

        Ok(())
    }

    fn write_scenario(
        &self,
        f: &mut Formatter<'_>,
        number: usize,
        log: &ScenarioLog,
    ) -> fmt::Result {
        let scenario = &self.output.scenarios[log.scenario];
        let target = &scenario.target;

        step(
            f,
            number,
            &format!("SCENARIO {}: {}", log.scenario + 1, scenario.title),
            &scenario.description,
        )?;

        writeln!(f)?;
        writeln!(f, "  {} broadcasts a spend", scenario.owner)?;
        writeln!(f, "  |- Address: {}", target.address_kind)?;
        writeln!(f, "  |- Input: {:.4} BTC", target.value)?;
        writeln!(f, "  |- Payment: {:.4} BTC", scenario.payment())?;
        writeln!(
            f,
            "  |- Fee: {:.4} BTC ({:.2}% of input)",
            target.fee,
            target.fee_rate() * 100.0
        )?;
        writeln!(f, "  |- Public keys exposed: {}", target.exposed_keys())?;
        if target.reused {
            writeln!(f, "  |- Address reused: public key known in advance")?;
        }
        writeln!(f, "  `- Time until next block: ~{:.0}s", log.deadline_secs)?;

        writeln!(f)?;
        if log.attempts.is_empty() {
            writeln!(f, "  No attacker looked at this spend.")?;
        }
        for attempt in log.attempts.iter() {
            let name = self.name(attempt.attacker);
            write_decision(f, name, &attempt.decision, scenario)?;
        }
        for id in self.preempted(log) {
            writeln!(
                f,
                "  {}: spend already under attack, moving on",
                self.name(id)
            )?;
        }

        writeln!(f)?;
        match log.outcome {
            BlockOutcome::Confirmed { fee } => writeln!(
                f,
                "  Block mined: legitimate spend confirmed (fee {:.4} BTC)",
                fee
            ),
            BlockOutcome::Stolen { attacker, amount, fee } => {
                write!(
                    f,
                    "  Block mined: DOUBLE-SPEND won by {} with fee {:.4} BTC",
                    self.name(attacker),
                    fee
                )?;
                match fee_multiple(fee, target.fee) {
                    Some(multiple) => {
                        writeln!(f, " ({:.1}x the victim's fee)", multiple)?
                    }
                    None => writeln!(f, " (the victim paid no fee)")?,
                }
                writeln!(
                    f,
                    "  `- {:.4} BTC stolen from {}",
                    amount, scenario.owner
                )
            }
        }
    }

    /// Attackers who never evaluated the spend because an earlier attacker
    /// had already broken it.
    fn preempted(&self, log: &ScenarioLog) -> Vec<AttackerId> {
        let evaluated = log.attempts.len();
        if log.attempts.iter().any(|a| a.decision.succeeded) {
            (evaluated + 1..=self.output.attackers.len())
                .map(AttackerId::from)
                .collect()
        } else {
            vec![]
        }
    }

    fn write_tallies(&self, f: &mut Formatter<'_>) -> fmt::Result {
        section(f, "ATTACKER RESULTS")?;

        let log = self.log();
        for (i, profile) in self.output.attackers.iter().enumerate() {
            let tally = log.tally(AttackerId::from(i + 1));

            writeln!(f)?;
            writeln!(f, "  {}", profile.name())?;
            writeln!(f, "  |- Successful attacks: {}", tally.won)?;
            writeln!(f, "  |- Failed attacks: {}", tally.failed)?;
            writeln!(f, "  |- Targets skipped: {}", tally.skipped)?;
            match tally.success_rate() {
                Some(rate) => {
                    writeln!(f, "  |- Success rate: {:.1}%", rate * 100.0)?
                }
                None => writeln!(f, "  |- Success rate: N/A")?,
            }
            writeln!(f, "  `- Total stolen: {:.4} BTC", tally.stolen)?;
        }

        let total: f64 =
            self.output.scenarios.iter().map(|s| s.target.value).sum();
        let stolen = log.total_stolen();
        writeln!(f)?;
        writeln!(
            f,
            "  {:.4} of {:.4} BTC stolen ({:.1}%)",
            stolen,
            total,
            percent_of(stolen, total)
        )
    }

    fn write_theft_rates(&self, f: &mut Formatter<'_>) -> fmt::Result {
        section(
            f,
            &format!("THEFT RATE OVER {} TRIALS", self.output.trials.len()),
        )?;

        for (i, scenario) in self.output.scenarios.iter().enumerate() {
            writeln!(
                f,
                "  {:>6.1}%  {} ({:.4} BTC, {})",
                self.output.theft_rate(i) * 100.0,
                scenario.title,
                scenario.target.value,
                scenario.target.address_kind
            )?;
        }

        Ok(())
    }
}

impl Display for Narrative<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        section(f, "BITCOIN QUANTUM ATTACK SIMULATOR")?;
        writeln!(f, "Educational walkthrough of public key exposure")?;
        writeln!(f, "SIMULATION ONLY: no real keys, coins or networks")?;
        writeln!(f, "Trial {} (seed {})", self.trial, self.log().seed)?;

        self.write_attackers(f)?;

        for (i, log) in self.log().scenarios.iter().enumerate() {
            self.write_scenario(f, i + 2, log)?;
        }

        self.write_tallies(f)?;

        if self.output.trials.len() > 1 {
            self.write_theft_rates(f)?;
        }

        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(WIDTH))?;
        writeln!(f, "Current quantum computers cannot break secp256k1.")?;
        writeln!(f, "Every spend reveals its public key; reused addresses")?;
        writeln!(f, "reveal it before the spend is even broadcast.")?;
        write!(f, "{}", "=".repeat(WIDTH))
    }
}

fn write_decision(
    f: &mut Formatter<'_>,
    attacker: &str,
    decision: &AttackDecision,
    scenario: &Scenario,
) -> fmt::Result {
    match decision.reason {
        Reason::LowValueSkipped => {
            writeln!(f, "  {}: not worth attacking, skipped", attacker)
        }
        Reason::OpportunityDeclined => {
            writeln!(f, "  {}: decided to sit this one out", attacker)
        }
        Reason::InsufficientTime if decision.elapsed_secs == 0.0 => {
            writeln!(f, "  {}: block already closing, too late", attacker)
        }
        Reason::InsufficientTime => writeln!(
            f,
            "  {}: ATTACK TOO SLOW, needs {:.1}s",
            attacker, decision.elapsed_secs
        ),
        Reason::DecoherenceFailure => writeln!(
            f,
            "  {}: ran Shor's algorithm for {:.1}s, ATTACK FAILED (decoherence)",
            attacker, decision.elapsed_secs
        ),
        Reason::Success => writeln!(
            f,
            "  {}: private key derived in {:.1}s, competing spend sends \
             {:.4} BTC to the attacker with fee {:.4} BTC",
            attacker,
            decision.elapsed_secs,
            decision.payout(&scenario.target),
            decision.fee_offered
        ),
    }
}

/// How many times `victim_fee` the attacker paid, if the victim paid any.
fn fee_multiple(fee: f64, victim_fee: f64) -> Option<f64> {
    (victim_fee > 0.0).then(|| fee / victim_fee)
}

fn time_range(profile: &AttackerProfile) -> String {
    if profile.min_time_secs() == profile.max_time_secs() {
        format!("{:.0}s", profile.min_time_secs())
    } else {
        format!(
            "{:.0}-{:.0}s",
            profile.min_time_secs(),
            profile.max_time_secs()
        )
    }
}

fn section(f: &mut Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", "=".repeat(WIDTH))?;
    writeln!(f, "{:^1$}", title, WIDTH)?;
    writeln!(f, "{}", "=".repeat(WIDTH))
}

fn step(
    f: &mut Formatter<'_>,
    number: usize,
    title: &str,
    description: &str,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", "=".repeat(WIDTH))?;
    writeln!(f, "STEP {}: {}", number, title)?;
    if !description.is_empty() {
        writeln!(f, "{}", "-".repeat(WIDTH))?;
        writeln!(f, "{}", description)?;
    }
    writeln!(f, "{}", "=".repeat(WIDTH))
}
