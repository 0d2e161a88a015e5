pub mod aquifer;
pub mod config;
pub mod context;
pub mod daily_inputs;
pub mod error;
pub mod expr;
pub mod flux;
pub mod groundwater;
pub mod hotstart;
pub mod massbal;
pub mod node;
pub mod odesolve;
pub mod pattern;
pub mod project;
pub mod simulation;
pub mod stats;
pub mod step;
pub mod subcatch;
pub mod units;
pub mod variables;

pub use error::{ConfigError, SimError};
pub use hotstart::HotStart;
pub use project::Project;
pub use simulation::Simulation;
pub use step::{StepEnv, StepReport, get_groundwater};
