use serde::{Deserialize, Serialize};

use crate::aquifer::Aquifer;
use crate::error::ConfigError;
use crate::expr::MathExpr;
use crate::variables::GwVariable;

// Tolerance used to keep moisture and depth strictly inside their bounds
pub const XTOL: f64 = 0.001;

// Marks a missing value in the flat array form of a snapshot
pub const MISSING: f64 = -1.0e10;

// Coefficients of the lateral flow equation
//   Q = a1 (Hgw - Hstar)^b1 - a2 (Hsw - Hstar)^b2 + a3 Hgw Hsw
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowCoeffs {
    pub a1: f64,
    pub b1: f64,
    pub a2: f64,
    pub b2: f64,
    pub a3: f64,
}

// Groundwater definition for a subcatchment as given by the user. Elevations in ft.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundwaterSpec {
    pub aquifer: usize,
    pub node: usize,
    pub surf_elev: f64,
    pub coeffs: FlowCoeffs,
    pub fixed_depth: f64,
    pub node_elev: Option<f64>,
    pub bottom_elev: Option<f64>,
    pub water_table_elev: Option<f64>,
    pub upper_moisture: Option<f64>,
}

/// Saved groundwater state of one subcatchment, used for hot starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundwaterSnapshot {
    pub theta: f64,
    pub water_table_elev: f64,
    pub lateral_flow: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_infil_vol: Option<f64>,
}

impl GroundwaterSnapshot {
    pub fn to_array(&self) -> [f64; 4] {
        [
            self.theta,
            self.water_table_elev,
            self.lateral_flow,
            self.max_infil_vol.unwrap_or(MISSING),
        ]
    }

    pub fn from_array(x: [f64; 4]) -> Self {
        GroundwaterSnapshot {
            theta: x[0],
            water_table_elev: x[1],
            lateral_flow: x[2],
            max_infil_vol: (x[3] != MISSING).then_some(x[3]),
        }
    }
}

// Groundwater attached to a subcatchment: resolved parameters plus dynamic state
#[derive(Debug, Clone)]
pub struct Groundwater {
    pub aquifer: usize,
    pub node: usize,
    pub surf_elev: f64,        // Ground surface elevation [ft]
    pub coeffs: FlowCoeffs,
    pub fixed_depth: f64,      // Fixed surface water depth, used when > 0 [ft]
    pub node_elev: Option<f64>, // Override of the node's invert elevation [ft]
    pub bottom_elev: f64,      // Aquifer bottom elevation [ft]
    pub water_table_elev: f64, // Initial water table elevation [ft]
    pub upper_moisture: f64,   // Initial upper zone moisture content [-]
    pub lat_flow_expr: Option<MathExpr<GwVariable>>,
    pub deep_flow_expr: Option<MathExpr<GwVariable>>,

    pub theta: f64,         // Upper zone moisture content [-]
    pub lower_depth: f64,   // Depth of saturated lower zone [ft]
    pub old_flow: f64,      // Lateral flow at start of step [ft/s]
    pub new_flow: f64,      // Lateral flow at end of step [ft/s]
    pub evap_loss: f64,     // Combined upper + lower zone evaporation [ft/s]
    pub max_infil_vol: f64, // Infiltration the upper zone can hold next step [ft]
}

impl Groundwater {
    // Fill in unspecified values from the aquifer's defaults
    pub fn resolve(spec: GroundwaterSpec, aquifer: &Aquifer) -> Self {
        Groundwater {
            aquifer: spec.aquifer,
            node: spec.node,
            surf_elev: spec.surf_elev,
            coeffs: spec.coeffs,
            fixed_depth: spec.fixed_depth,
            node_elev: spec.node_elev,
            bottom_elev: spec.bottom_elev.unwrap_or(aquifer.bottom_elev),
            water_table_elev: spec.water_table_elev.unwrap_or(aquifer.water_table_elev),
            upper_moisture: spec.upper_moisture.unwrap_or(aquifer.upper_moisture),
            lat_flow_expr: None,
            deep_flow_expr: None,
            theta: 0.0,
            lower_depth: 0.0,
            old_flow: 0.0,
            new_flow: 0.0,
            evap_loss: 0.0,
            max_infil_vol: 0.0,
        }
    }

    pub fn validate(&self, subcatch_id: &str) -> Result<(), ConfigError> {
        if self.surf_elev < self.water_table_elev {
            return Err(ConfigError::GroundElevation(subcatch_id.to_string()));
        }
        Ok(())
    }

    pub fn total_depth(&self) -> f64 {
        self.surf_elev - self.bottom_elev
    }

    // Current elevation of the water table [ft]
    pub fn water_table(&self) -> f64 {
        self.bottom_elev + self.lower_depth
    }

    pub fn init_state(&mut self, aquifer: &Aquifer, frac_perv: f64) {
        self.theta = self.upper_moisture;
        if self.theta >= aquifer.porosity {
            self.theta = aquifer.porosity - XTOL;
        }

        self.lower_depth = self.water_table_elev - self.bottom_elev;
        if self.lower_depth >= self.total_depth() {
            self.lower_depth = self.total_depth() - XTOL;
        }

        self.old_flow = 0.0;
        self.new_flow = 0.0;
        self.evap_loss = 0.0;

        self.max_infil_vol = if frac_perv > 0.0 {
            (self.surf_elev - self.water_table_elev) * (aquifer.porosity - self.theta) / frac_perv
        } else {
            0.0
        };
    }

    pub fn snapshot(&self) -> GroundwaterSnapshot {
        GroundwaterSnapshot {
            theta: self.theta,
            water_table_elev: self.water_table(),
            lateral_flow: self.new_flow,
            max_infil_vol: Some(self.max_infil_vol),
        }
    }

    pub fn restore(&mut self, s: &GroundwaterSnapshot) {
        self.theta = s.theta;
        self.lower_depth = s.water_table_elev - self.bottom_elev;
        self.old_flow = s.lateral_flow;
        self.new_flow = s.lateral_flow;
        if let Some(v) = s.max_infil_vol {
            self.max_infil_vol = v;
        }
    }

    // Water stored in both zones, as depth over the subcatchment [ft]
    pub fn volume(&self, aquifer: &Aquifer) -> f64 {
        let upper_depth = self.total_depth() - self.lower_depth;
        upper_depth * self.theta + self.lower_depth * aquifer.porosity
    }
}

#[cfg(test)]
pub(crate) fn sample_spec() -> GroundwaterSpec {
    GroundwaterSpec {
        aquifer: 0,
        node: 0,
        surf_elev: 6.0,
        coeffs: FlowCoeffs::default(),
        fixed_depth: 0.0,
        node_elev: None,
        bottom_elev: None,
        water_table_elev: None,
        upper_moisture: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aquifer::sample_aquifer;
    use approx::assert_relative_eq;

    #[test]
    fn missing_values_come_from_aquifer() {
        let a = sample_aquifer();
        let mut spec = sample_spec();
        spec.bottom_elev = Some(-1.0);
        let gw = Groundwater::resolve(spec, &a);
        assert_eq!(gw.bottom_elev, -1.0);
        assert_eq!(gw.water_table_elev, a.water_table_elev);
        assert_eq!(gw.upper_moisture, a.upper_moisture);
        assert_eq!(gw.total_depth(), 7.0);
    }

    #[test]
    fn surface_below_water_table_is_rejected() {
        let a = sample_aquifer();
        let mut spec = sample_spec();
        spec.surf_elev = 1.0;
        let gw = Groundwater::resolve(spec, &a);
        assert!(matches!(
            gw.validate("S1"),
            Err(ConfigError::GroundElevation(id)) if id == "S1"
        ));
    }

    #[test]
    fn init_state_sets_depths_and_capacity() {
        let a = sample_aquifer();
        let mut gw = Groundwater::resolve(sample_spec(), &a);
        gw.new_flow = 5.0;
        gw.init_state(&a, 0.5);
        assert_eq!(gw.theta, 0.25);
        assert_eq!(gw.lower_depth, 2.0);
        assert_eq!(gw.new_flow, 0.0);
        assert_relative_eq!(gw.max_infil_vol, 4.0 * (0.43 - 0.25) / 0.5);
    }

    #[test]
    fn init_state_nudges_inside_bounds() {
        let a = sample_aquifer();
        let mut spec = sample_spec();
        spec.upper_moisture = Some(0.43);
        spec.water_table_elev = Some(6.0);
        let mut gw = Groundwater::resolve(spec, &a);
        gw.init_state(&a, 1.0);
        assert_relative_eq!(gw.theta, 0.43 - XTOL);
        assert_relative_eq!(gw.lower_depth, 6.0 - XTOL);
        assert!(gw.theta < a.porosity);
        assert!(gw.lower_depth < gw.total_depth());
    }

    #[test]
    fn snapshot_round_trip_is_idempotent() {
        let a = sample_aquifer();
        let mut gw = Groundwater::resolve(sample_spec(), &a);
        gw.init_state(&a, 1.0);
        gw.theta = 0.3;
        gw.lower_depth = 2.5;
        gw.new_flow = 1.0e-6;
        let snap = gw.snapshot();
        gw.restore(&snap);
        assert_eq!(gw.snapshot(), snap);
    }

    #[test]
    fn missing_capacity_leaves_value_unchanged() {
        let a = sample_aquifer();
        let mut gw = Groundwater::resolve(sample_spec(), &a);
        gw.init_state(&a, 1.0);
        let before = gw.max_infil_vol;
        let snap = GroundwaterSnapshot::from_array([0.3, 3.0, 0.0, MISSING]);
        assert_eq!(snap.max_infil_vol, None);
        gw.restore(&snap);
        assert_eq!(gw.max_infil_vol, before);
        assert_eq!(gw.lower_depth, 3.0);
        assert_eq!(snap.to_array()[3], MISSING);
    }

    #[test]
    fn volume_increases_with_moisture_and_depth() {
        let a = sample_aquifer();
        let mut gw = Groundwater::resolve(sample_spec(), &a);
        gw.init_state(&a, 1.0);
        let mut last = gw.volume(&a);
        for i in 1..10 {
            gw.theta = 0.25 + 0.01 * i as f64;
            let v = gw.volume(&a);
            assert!(v >= last);
            last = v;
        }
        let mut last = gw.volume(&a);
        for i in 1..10 {
            gw.lower_depth = 2.0 + 0.3 * i as f64;
            let v = gw.volume(&a);
            assert!(v >= last);
            last = v;
        }
    }
}
