pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::{PolicyKind, parse_policy_list};
pub use reports::summarize;
pub use seeds::resolve_seed_inputs;
pub use simulation::{RunReport, SimulationConfig, run_simulation};
