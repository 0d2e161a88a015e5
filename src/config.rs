use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::aquifer::Aquifer;
use crate::daily_inputs::{Climate, DailySeries, SurfaceInputs};
use crate::error::{ConfigError, SimError};
use crate::expr::MathExpr;
use crate::groundwater::{FlowCoeffs, Groundwater, GroundwaterSpec};
use crate::node::DrainageNode;
use crate::pattern::TimePattern;
use crate::project::Project;
use crate::subcatch::Subcatchment;
use crate::units::{Quantity, UnitSystem};
use crate::variables::GwVariable;

// Scenario file layout. All values are in the units selected by `units`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub units: UnitSystem,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub climate: ClimateConfig,
    #[serde(default)]
    pub patterns: Vec<TimePattern>,
    #[serde(default)]
    pub aquifers: Vec<AquiferConfig>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub subcatchments: Vec<SubcatchConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub start: NaiveDateTime, // e.g. "2024-05-01T00:00:00"
    pub step: f64,            // Step length [s]
    pub duration: f64,        // Simulated time [hr]
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClimateConfig {
    #[serde(default)]
    pub evaporation: DailySeries, // in/day or mm/day
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AquiferConfig {
    pub id: String,
    pub porosity: f64,
    pub wilting_point: f64,
    pub field_capacity: f64,
    pub conductivity: f64,     // in/hr or mm/hr
    pub conduct_slope: f64,
    pub tension_slope: f64,    // ft or m
    pub upper_evap_frac: f64,
    pub lower_evap_depth: f64, // ft or m
    pub lower_loss_coeff: f64, // in/hr or mm/hr
    pub bottom_elev: f64,      // ft or m
    pub water_table_elev: f64, // ft or m
    pub upper_moisture: f64,
    pub evap_pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub id: String,
    pub invert_elev: f64, // ft or m
    #[serde(default)]
    pub depth: f64,       // ft or m
    #[serde(default)]
    pub inflow: f64,      // cfs or cms
    #[serde(default)]
    pub volume: f64,      // ft3 or m3
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubcatchConfig {
    pub id: String,
    pub area: f64, // ac or ha
    #[serde(default = "default_frac_perv")]
    pub frac_perv: f64,
    #[serde(default)]
    pub infiltration: DailySeries, // in/hr or mm/hr over the pervious area
    #[serde(default)]
    pub surface_evap: DailySeries, // in/day or mm/day over the pervious area
    pub groundwater: Option<GroundwaterConfig>,
}

fn default_frac_perv() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroundwaterConfig {
    pub aquifer: String,
    pub node: String,
    pub surface_elev: f64, // ft or m
    #[serde(default)]
    pub a1: f64,
    #[serde(default)]
    pub b1: f64,
    #[serde(default)]
    pub a2: f64,
    #[serde(default)]
    pub b2: f64,
    #[serde(default)]
    pub a3: f64,
    #[serde(default)]
    pub fixed_depth: f64, // ft or m
    pub node_elev: Option<f64>,
    pub bottom_elev: Option<f64>,
    pub water_table_elev: Option<f64>,
    pub upper_moisture: Option<f64>,
    pub lateral_flow: Option<String>,
    pub deep_flow: Option<String>,
}

impl ScenarioConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Convert to internal units and link objects by id.
    ///
    /// Every problem found is collected and returned together so they can
    /// all be reported; a project is returned only when there are none.
    pub fn build(self) -> Result<Project, Vec<ConfigError>> {
        let units = self.units;
        let len = |v: f64| units.to_internal(Quantity::Length, v);
        let mut errors = Vec::new();

        if !(self.simulation.step > 0.0) {
            errors.push(ConfigError::InvalidValue {
                field: "simulation.step",
                value: self.simulation.step.to_string(),
            });
        }
        if !(self.simulation.duration >= 0.0) {
            errors.push(ConfigError::InvalidValue {
                field: "simulation.duration",
                value: self.simulation.duration.to_string(),
            });
        }

        let pattern_ids = index_ids("pattern", self.patterns.iter().map(|p| p.id.as_str()), &mut errors);
        let node_ids = index_ids("node", self.nodes.iter().map(|n| n.id.as_str()), &mut errors);
        let aquifer_ids = index_ids("aquifer", self.aquifers.iter().map(|a| a.id.as_str()), &mut errors);
        index_ids("subcatchment", self.subcatchments.iter().map(|s| s.id.as_str()), &mut errors);

        for p in &self.patterns {
            if p.factors.len() != p.kind.factor_count() {
                errors.push(ConfigError::InvalidValue {
                    field: "pattern factors",
                    value: format!("{} given, {} expected ({})", p.factors.len(), p.kind.factor_count(), p.id),
                });
            }
        }

        let mut aquifers = Vec::with_capacity(self.aquifers.len());
        for a in &self.aquifers {
            let upper_evap_pattern = match &a.evap_pattern {
                Some(name) => lookup(&pattern_ids, "pattern", name, &mut errors),
                None => None,
            };
            aquifers.push(Aquifer {
                id: a.id.clone(),
                porosity: a.porosity,
                wilting_point: a.wilting_point,
                field_capacity: a.field_capacity,
                conductivity: units.to_internal(Quantity::Rainfall, a.conductivity),
                conduct_slope: a.conduct_slope,
                tension_slope: len(a.tension_slope),
                upper_evap_frac: a.upper_evap_frac,
                lower_evap_depth: len(a.lower_evap_depth),
                lower_loss_coeff: units.to_internal(Quantity::Rainfall, a.lower_loss_coeff),
                bottom_elev: len(a.bottom_elev),
                water_table_elev: len(a.water_table_elev),
                upper_moisture: a.upper_moisture,
                upper_evap_pattern,
            });
        }

        let nodes: Vec<DrainageNode> = self
            .nodes
            .iter()
            .map(|n| DrainageNode {
                id: n.id.clone(),
                invert_elev: len(n.invert_elev),
                depth: len(n.depth),
                inflow: units.to_internal(Quantity::Flow, n.inflow),
                volume: units.to_internal(Quantity::Volume, n.volume),
            })
            .collect();

        let mut subcatchments = Vec::with_capacity(self.subcatchments.len());
        for s in &self.subcatchments {
            if !(s.area > 0.0) {
                errors.push(ConfigError::InvalidValue {
                    field: "subcatchment area",
                    value: format!("{} ({})", s.area, s.id),
                });
            }
            if !(0.0..=1.0).contains(&s.frac_perv) {
                errors.push(ConfigError::InvalidValue {
                    field: "subcatchment frac_perv",
                    value: format!("{} ({})", s.frac_perv, s.id),
                });
            }

            let mut subcatch = Subcatchment::new(&s.id, units.to_internal(Quantity::LandArea, s.area), s.frac_perv);
            subcatch.inputs = SurfaceInputs {
                infiltration: s.infiltration.scaled(1.0 / units.ucf(Quantity::Rainfall)),
                surface_evap: s.surface_evap.scaled(1.0 / units.ucf(Quantity::EvapRate)),
            };

            if let Some(g) = &s.groundwater {
                let aquifer = lookup(&aquifer_ids, "aquifer", &g.aquifer, &mut errors);
                let node = lookup(&node_ids, "node", &g.node, &mut errors);
                let lat_flow_expr = compile_flow(&s.id, "lateral", g.lateral_flow.as_deref(), &mut errors);
                let deep_flow_expr = compile_flow(&s.id, "deep", g.deep_flow.as_deref(), &mut errors);
                if let (Some(ai), Some(ni)) = (aquifer, node) {
                    let spec = GroundwaterSpec {
                        aquifer: ai,
                        node: ni,
                        surf_elev: len(g.surface_elev),
                        coeffs: FlowCoeffs {
                            a1: g.a1,
                            b1: g.b1,
                            a2: g.a2,
                            b2: g.b2,
                            a3: g.a3,
                        },
                        fixed_depth: len(g.fixed_depth),
                        node_elev: g.node_elev.map(len),
                        bottom_elev: g.bottom_elev.map(len),
                        water_table_elev: g.water_table_elev.map(len),
                        upper_moisture: g.upper_moisture,
                    };
                    let mut gw = Groundwater::resolve(spec, &aquifers[ai]);
                    gw.lat_flow_expr = lat_flow_expr;
                    gw.deep_flow_expr = deep_flow_expr;
                    subcatch.groundwater = Some(gw);
                }
            }
            subcatchments.push(subcatch);
        }

        let project = Project {
            units,
            step: self.simulation.step,
            duration: self.simulation.duration * 3600.0,
            climate: Climate {
                start: self.simulation.start,
                evaporation: self
                    .climate
                    .evaporation
                    .scaled(1.0 / units.ucf(Quantity::EvapRate)),
            },
            patterns: self.patterns,
            aquifers,
            nodes,
            subcatchments,
        };

        errors.extend(project.validate());
        if errors.is_empty() {
            Ok(project)
        } else {
            Err(errors)
        }
    }
}

fn index_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ConfigError>,
) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (i, id) in ids.enumerate() {
        if map.insert(id.to_string(), i).is_some() {
            errors.push(ConfigError::DuplicateObject {
                kind,
                name: id.to_string(),
            });
        }
    }
    map
}

fn lookup(
    ids: &HashMap<String, usize>,
    kind: &'static str,
    name: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<usize> {
    let found = ids.get(name).copied();
    if found.is_none() {
        errors.push(ConfigError::UndefinedObject {
            kind,
            name: name.to_string(),
        });
    }
    found
}

fn compile_flow(
    subcatch: &str,
    which: &'static str,
    formula: Option<&str>,
    errors: &mut Vec<ConfigError>,
) -> Option<MathExpr<GwVariable>> {
    match MathExpr::compile(formula?, GwVariable::from_name) {
        Ok(expr) => Some(expr),
        Err(source) => {
            errors.push(ConfigError::FlowExpression {
                subcatch: subcatch.to_string(),
                which,
                source,
            });
            None
        }
    }
}
