/*!
Narrative simulator of quantum attacks on exposed Bitcoin public keys.

A hypothetical quantum adversary watches the mempool, derives private keys
from the public keys revealed by spends, and races the next block with a
higher-fee double-spend. Nothing here touches real cryptography or a real
network: every outcome comes from seeded probability draws and fixed timing
parameters.

The core of the crate is [`AttackOutcomeEvaluator`](evaluator::AttackOutcomeEvaluator),
which decides a single attack. [`SimulationBuilder`](simulation::SimulationBuilder)
runs a table of [`Scenario`](scenario::Scenario)s against a set of attackers,
and [`results`] and [`report`] present what happened.
*/

pub mod attacker;
pub mod block;
pub mod evaluator;
pub mod prelude;
pub mod report;
pub mod results;
pub mod scenario;
pub mod simulation;
pub mod target;

pub(crate) mod utils;
