use crate::expr::ExprError;
use crate::odesolve::SolverError;

/// Errors found while loading or validating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid parameter values for aquifer {0}")]
    AquiferParams(String),
    #[error("ground elevation is below water table elevation for subcatchment {0}")]
    GroundElevation(String),
    #[error("undefined {kind} '{name}'")]
    UndefinedObject { kind: &'static str, name: String },
    #[error("duplicate {kind} id '{name}'")]
    DuplicateObject { kind: &'static str, name: String },
    #[error("invalid {which} flow expression for subcatchment {subcatch}: {source}")]
    FlowExpression {
        subcatch: String,
        which: &'static str,
        #[source]
        source: ExprError,
    },
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Top level error for running a scenario.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scenario failed validation with {} error(s)", .0.len())]
    Validation(Vec<ConfigError>),
    #[error("groundwater integration failed for subcatchment {subcatch}: {source}")]
    Solver {
        subcatch: String,
        #[source]
        source: SolverError,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("toml write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
