//! Describing simulated quantum adversaries

use std::fmt::Display;

use crate::target::Amount;

/// A unique identifier assigned to each attacker added to a
/// [`SimulationBuilder`](crate::simulation::SimulationBuilder). Identifiers
/// start at 1 and follow the order of addition.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct AttackerId(pub(crate) usize);

impl From<usize> for AttackerId {
    fn from(value: usize) -> Self {
        AttackerId(value)
    }
}

impl Display for AttackerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<usize> for AttackerId {
    type Output = AttackerId;

    fn add(self, rhs: usize) -> Self::Output {
        AttackerId(self.0 + rhs)
    }
}

impl std::ops::AddAssign<usize> for AttackerId {
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}

/// Out-of-range configuration of an attacker, evaluator or target.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("success rate {0} is not in the range 0.0..=1.0")]
    SuccessRate(f64),
    #[error("minimum attack time {min}s exceeds maximum attack time {max}s")]
    TimeRange { min: f64, max: f64 },
    #[error("{field} must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("parallel efficiency {0} is not in the range (0.0, 1.0]")]
    ParallelEfficiency(f64),
    #[error("error rate {0} is not in the range 0.0..=1.0")]
    ErrorRate(f64),
}

/// Rejects NaN, infinite and negative values.
pub(crate) fn non_negative(
    field: &'static str,
    value: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Hardware a simulated adversary runs Shor's algorithm on.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumComputer {
    pub name: String,
    pub qubits: u32,
    /// Physical error rate per gate.
    pub error_rate: f64,
}

impl QuantumComputer {
    /// Logical qubits needed to run Shor's algorithm against secp256k1.
    pub const SECP256K1_QUBITS: u32 = 2000;
    /// Largest error rate which still allows the computation to finish.
    pub const SECP256K1_ERROR_RATE: f64 = 0.001;

    pub fn new<N: Into<String>>(name: N, qubits: u32, error_rate: f64) -> Self {
        QuantumComputer { name: name.into(), qubits, error_rate }
    }

    /// Rough estimate of whether this machine could derive a secp256k1
    /// private key at all. Informational only.
    pub fn can_break_secp256k1(&self) -> bool {
        self.qubits >= Self::SECP256K1_QUBITS
            && self.error_rate < Self::SECP256K1_ERROR_RATE
    }
}

/// Determines which targets an attacker considers worth the effort.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum AttackStrategy {
    /// Attack anything worth at least 0.1.
    #[default]
    Aggressive,
    /// Only attack high-value targets worth at least 5.0.
    Selective,
    /// Attack targets worth at least 1.0, but only on a coin flip.
    Opportunistic,
    /// Attack anything worth at least the given value.
    Threshold(Amount),
}

impl AttackStrategy {
    /// Smallest target value this strategy will consider.
    pub fn min_value(&self) -> Amount {
        match self {
            Self::Aggressive => 0.1,
            Self::Selective => 5.0,
            Self::Opportunistic => 1.0,
            Self::Threshold(value) => *value,
        }
    }

    /// True if profitable targets are only attacked some of the time.
    pub fn is_random(&self) -> bool {
        matches!(self, Self::Opportunistic)
    }
}

impl Display for AttackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aggressive => write!(f, "AGGRESSIVE"),
            Self::Selective => write!(f, "SELECTIVE"),
            Self::Opportunistic => write!(f, "OPPORTUNISTIC"),
            Self::Threshold(value) => write!(f, "THRESHOLD({})", value),
        }
    }
}

/// Validated description of a simulated quantum adversary's speed and
/// reliability. Created with [`AttackerProfile::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttackerProfile {
    name: String,
    computer: QuantumComputer,
    strategy: AttackStrategy,
    success_rate: f64,
    min_time_secs: f64,
    max_time_secs: f64,
    parallel_efficiency: f64,
}

impl AttackerProfile {
    pub fn builder<N: Into<String>>(name: N) -> AttackerProfileBuilder {
        AttackerProfileBuilder::new(name)
    }

    /// "QuantumPirate": a fast, reliable, aggressive adversary.
    pub fn quantum_pirate() -> Self {
        Self {
            name: "QuantumPirate".into(),
            computer: QuantumComputer::new("IBM Quantum-X", 4000, 0.0005),
            strategy: AttackStrategy::Aggressive,
            success_rate: 0.95,
            min_time_secs: 120.0,
            max_time_secs: 180.0,
            parallel_efficiency: 0.7,
        }
    }

    /// "CryptoThief": a slower adversary which only goes after large targets.
    pub fn crypto_thief() -> Self {
        Self {
            name: "CryptoThief".into(),
            computer: QuantumComputer::new("Google Sycamore-II", 3000, 0.001),
            strategy: AttackStrategy::Selective,
            success_rate: 0.85,
            min_time_secs: 180.0,
            max_time_secs: 240.0,
            parallel_efficiency: 0.7,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn computer(&self) -> &QuantumComputer {
        &self.computer
    }

    #[inline]
    pub fn qubits(&self) -> u32 {
        self.computer.qubits
    }

    pub fn strategy(&self) -> AttackStrategy {
        self.strategy
    }

    /// Probability that a key derivation survives decoherence.
    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn min_time_secs(&self) -> f64 {
        self.min_time_secs
    }

    pub fn max_time_secs(&self) -> f64 {
        self.max_time_secs
    }

    /// Multiplier applied to the combined time of breaking several keys at
    /// once.
    pub fn parallel_efficiency(&self) -> f64 {
        self.parallel_efficiency
    }
}

/// Builds an [`AttackerProfile`].
#[derive(Debug, Clone)]
pub struct AttackerProfileBuilder {
    name: String,
    computer: Option<QuantumComputer>,
    strategy: AttackStrategy,
    success_rate: f64,
    time_secs: (f64, f64),
    parallel_efficiency: f64,
}

impl AttackerProfileBuilder {
    fn new<N: Into<String>>(name: N) -> Self {
        AttackerProfileBuilder {
            name: name.into(),
            computer: None,
            strategy: AttackStrategy::default(),
            success_rate: 1.0,
            time_secs: (0.0, 0.0),
            parallel_efficiency: 1.0,
        }
    }

    /// Sets the attacker's hardware (a 4000 qubit machine with error rate
    /// 0.0005 otherwise).
    pub fn computer(mut self, computer: QuantumComputer) -> Self {
        self.computer = Some(computer);

        self
    }

    pub fn strategy(mut self, strategy: AttackStrategy) -> Self {
        self.strategy = strategy;

        self
    }

    /// Sets the probability that an attack survives decoherence (default 1.0).
    pub fn success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate;

        self
    }

    /// Sets the range that the time needed to break one key is drawn from.
    pub fn time_range(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.time_secs = (min_secs, max_secs);

        self
    }

    /// Sets the multiplier applied when several keys must be broken
    /// (default 1.0).
    pub fn parallel_efficiency(mut self, efficiency: f64) -> Self {
        self.parallel_efficiency = efficiency;

        self
    }

    /// Creates an [`AttackerProfile`], checking that every field is in range.
    pub fn build(self) -> Result<AttackerProfile, ConfigError> {
        let AttackerProfileBuilder {
            name,
            computer,
            strategy,
            success_rate,
            time_secs: (min_time_secs, max_time_secs),
            parallel_efficiency,
        } = self;

        if success_rate.is_nan() || !(0.0..=1.0).contains(&success_rate) {
            return Err(ConfigError::SuccessRate(success_rate));
        }

        let min_time_secs = non_negative("min_time_seconds", min_time_secs)?;
        let max_time_secs = non_negative("max_time_seconds", max_time_secs)?;
        if min_time_secs > max_time_secs {
            return Err(ConfigError::TimeRange {
                min: min_time_secs,
                max: max_time_secs,
            });
        }

        if parallel_efficiency.is_nan()
            || parallel_efficiency <= 0.0
            || parallel_efficiency > 1.0
        {
            return Err(ConfigError::ParallelEfficiency(parallel_efficiency));
        }

        if let AttackStrategy::Threshold(value) = strategy {
            non_negative("strategy threshold", value)?;
        }

        let computer = computer.unwrap_or_else(|| {
            QuantumComputer::new("Generic fault-tolerant QPU", 4000, 0.0005)
        });
        if computer.error_rate.is_nan()
            || !(0.0..=1.0).contains(&computer.error_rate)
        {
            return Err(ConfigError::ErrorRate(computer.error_rate));
        }

        Ok(AttackerProfile {
            name,
            computer,
            strategy,
            success_rate,
            min_time_secs,
            max_time_secs,
            parallel_efficiency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AttackStrategy, AttackerProfile, ConfigError, QuantumComputer};

    #[test]
    fn success_rate_out_of_range() {
        let err = AttackerProfile::builder("bad")
            .success_rate(1.5)
            .time_range(120.0, 180.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::SuccessRate(1.5));

        let err = AttackerProfile::builder("bad")
            .success_rate(-0.1)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::SuccessRate(-0.1));
    }

    #[test]
    fn inverted_time_range() {
        let err = AttackerProfile::builder("bad")
            .time_range(200.0, 100.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::TimeRange { min: 200.0, max: 100.0 });
    }

    #[test]
    fn negative_values() {
        let err = AttackerProfile::builder("bad")
            .time_range(-1.0, 100.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Negative { value, .. } if value == -1.0));

        let err = AttackerProfile::builder("bad")
            .strategy(AttackStrategy::Threshold(-2.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Negative { .. }));
    }

    #[test]
    fn parallel_efficiency_bounds() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            let result = AttackerProfile::builder("bad")
                .parallel_efficiency(bad)
                .build();
            assert!(matches!(result, Err(ConfigError::ParallelEfficiency(_))));
        }
    }

    #[test]
    fn builder_keeps_fields() {
        let profile = AttackerProfile::builder("Tester")
            .computer(QuantumComputer::new("Lab QPU", 1500, 0.01))
            .strategy(AttackStrategy::Opportunistic)
            .success_rate(0.5)
            .time_range(10.0, 20.0)
            .parallel_efficiency(0.9)
            .build()
            .expect("valid profile");

        assert_eq!(profile.name(), "Tester");
        assert_eq!(profile.qubits(), 1500);
        assert!(!profile.computer().can_break_secp256k1());
        assert_eq!(profile.strategy().min_value(), 1.0);
        assert_eq!(profile.min_time_secs(), 10.0);
        assert_eq!(profile.max_time_secs(), 20.0);
        assert_eq!(profile.parallel_efficiency(), 0.9);
    }

    #[test]
    fn built_in_attackers() {
        let pirate = AttackerProfile::quantum_pirate();
        assert!(pirate.computer().can_break_secp256k1());
        assert_eq!(pirate.strategy(), AttackStrategy::Aggressive);

        // Error rate of exactly 0.001 is not good enough
        let thief = AttackerProfile::crypto_thief();
        assert!(!thief.computer().can_break_secp256k1());
        assert_eq!(thief.strategy().min_value(), 5.0);
    }
}
