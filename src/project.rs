use std::path::Path;

use log::{debug, error};

use crate::aquifer::Aquifer;
use crate::config::ScenarioConfig;
use crate::daily_inputs::Climate;
use crate::error::{ConfigError, SimError};
use crate::node::DrainageNode;
use crate::pattern::TimePattern;
use crate::subcatch::Subcatchment;
use crate::units::UnitSystem;

/// A validated scenario, with every value in internal units (ft, s).
#[derive(Debug, Clone)]
pub struct Project {
    pub units: UnitSystem,
    pub climate: Climate,
    pub step: f64,     // Step length [s]
    pub duration: f64, // Simulated time [s]
    pub patterns: Vec<TimePattern>,
    pub aquifers: Vec<Aquifer>,
    pub nodes: Vec<DrainageNode>,
    pub subcatchments: Vec<Subcatchment>,
}

impl Project {
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        Self::from_config(ScenarioConfig::from_toml_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        Self::from_config(ScenarioConfig::from_file(path)?)
    }

    fn from_config(config: ScenarioConfig) -> Result<Self, SimError> {
        config.build().map_err(|errors| {
            for e in &errors {
                error!("{e}");
            }
            SimError::Validation(errors)
        })
    }

    // Check aquifer parameters and ground elevations
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors: Vec<ConfigError> = self
            .aquifers
            .iter()
            .filter_map(|a| a.validate(&self.patterns).err())
            .collect();
        for s in &self.subcatchments {
            if let Some(gw) = &s.groundwater {
                if let Err(e) = gw.validate(&s.id) {
                    errors.push(e);
                }
            }
        }
        errors
    }

    // Set every groundwater zone to its starting state
    pub fn init_state(&mut self) {
        for s in &mut self.subcatchments {
            let frac_perv = s.frac_perv;
            if let Some(gw) = s.groundwater.as_mut() {
                if let Some(a) = self.aquifers.get(gw.aquifer) {
                    gw.init_state(a, frac_perv);
                    debug!(
                        "subcatchment {}: theta {:.4}, water table {:.3} ft",
                        s.id,
                        gw.theta,
                        gw.water_table()
                    );
                    for (which, expr) in [("lateral", &gw.lat_flow_expr), ("deep", &gw.deep_flow_expr)] {
                        if let Some(expr) = expr {
                            debug!("subcatchment {}: {which} flow = {}", s.id, expr.source());
                        }
                    }
                }
            }
        }
    }

    // Groundwater stored under all subcatchments [ft3]
    pub fn gw_storage(&self) -> f64 {
        self.subcatchments
            .iter()
            .map(|s| s.gw_volume(&self.aquifers) * s.area)
            .sum()
    }

    pub fn subcatch_index(&self, id: &str) -> Option<usize> {
        self.subcatchments.iter().position(|s| s.id == id)
    }
}
