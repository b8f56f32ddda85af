/*!
Re-export of common values and datatypes used for running and analyzing
simulations. Must be imported manually.

```
use quantum_sim::prelude::*;

let profile = AttackerProfile::builder("Example")
    .time_range(120.0, 180.0)
    .success_rate(0.95)
    .build()
    .unwrap();
let target = Target::new(8.2, 0.1, AddressKind::P2WPKH);
let mut rng = StdRng::seed_from_u64(7);

let decision =
    AttackOutcomeEvaluator::new().evaluate(&target, &profile, 600.0, &mut rng);
assert!(decision.attempted);
```
*/

use crate::{
    attacker, block, evaluator, report, results, scenario, simulation, target,
};

pub use attacker::{
    AttackStrategy, AttackerId, AttackerProfile, AttackerProfileBuilder,
    ConfigError, QuantumComputer,
};

pub use block::{BlockOutcome, CompetingSpend};

pub use evaluator::{AttackDecision, AttackOutcomeEvaluator, Reason};

pub use report::Narrative;

pub use results::{Average, Format, ResultsBuilder, ResultsTable};

pub use scenario::{Scenario, BLOCK_INTERVAL_SECS};

pub use simulation::{
    Attempt, ScenarioLog, SimulationBuildError, SimulationBuilder,
    SimulationGroup, SimulationOutput, Tally, TrialLog,
};

pub use target::{AddressKind, Amount, Target};

pub use rand::{rngs::StdRng, SeedableRng};
