use crate::error::ConfigError;
use crate::pattern::{PatternKind, TimePattern};

// Aquifer hydraulic parameters, shared by every subcatchment that uses them.
// All lengths in ft, all rates in ft/s.
#[derive(Debug, Clone, PartialEq)]
pub struct Aquifer {
    pub id: String,
    pub porosity: f64,         // Soil porosity [-]
    pub wilting_point: f64,    // Wilting point moisture content [-]
    pub field_capacity: f64,   // Field capacity moisture content [-]
    pub conductivity: f64,     // Saturated hydraulic conductivity [ft/s]
    pub conduct_slope: f64,    // Slope of ln(K) vs. moisture content [-]
    pub tension_slope: f64,    // Slope of soil tension vs. moisture content [ft]
    pub upper_evap_frac: f64,  // Fraction of total evap available to upper zone [-]
    pub lower_evap_depth: f64, // Depth below surface over which lower zone evap occurs [ft]
    pub lower_loss_coeff: f64, // Coefficient for deep seepage loss [ft/s]
    pub bottom_elev: f64,      // Elevation of aquifer bottom [ft]
    pub water_table_elev: f64, // Initial water table elevation [ft]
    pub upper_moisture: f64,   // Initial upper zone moisture content [-]
    pub upper_evap_pattern: Option<usize>, // Monthly pattern adjusting upper evap
}

impl Aquifer {
    // Check physical ordering of the parameters. Nothing is corrected here.
    pub fn validate(&self, patterns: &[TimePattern]) -> Result<(), ConfigError> {
        let invalid = self.porosity <= 0.0
            || self.field_capacity >= self.porosity
            || self.wilting_point >= self.field_capacity
            || self.conductivity <= 0.0
            || self.conduct_slope < 0.0
            || self.tension_slope < 0.0
            || self.upper_evap_frac < 0.0
            || self.lower_evap_depth < 0.0
            || self.water_table_elev < self.bottom_elev
            || self.upper_moisture > self.porosity
            || self.upper_moisture < self.wilting_point;
        if invalid {
            return Err(ConfigError::AquiferParams(self.id.clone()));
        }

        if let Some(p) = self.upper_evap_pattern {
            let monthly = patterns
                .get(p)
                .is_some_and(|pat| pat.kind == PatternKind::Monthly);
            if !monthly {
                return Err(ConfigError::AquiferParams(self.id.clone()));
            }
        }
        Ok(())
    }

    // Upper zone evaporation fraction adjusted for the calendar month
    pub fn upper_evap_frac_for(&self, month: u32, patterns: &[TimePattern]) -> f64 {
        let factor = self
            .upper_evap_pattern
            .and_then(|p| patterns.get(p))
            .map(|pat| pat.monthly_factor(month))
            .unwrap_or(1.0);
        self.upper_evap_frac * factor
    }

    // Unsaturated hydraulic conductivity as a function of moisture content [ft/s]
    pub fn k(&self, theta: f64) -> f64 {
        self.conductivity * ((theta - self.porosity) * self.conduct_slope).exp()
    }
}

#[cfg(test)]
pub(crate) fn sample_aquifer() -> Aquifer {
    Aquifer {
        id: "A1".to_string(),
        porosity: 0.43,
        wilting_point: 0.09,
        field_capacity: 0.20,
        conductivity: 0.5 / 43200.0,
        conduct_slope: 10.0,
        tension_slope: 15.0,
        upper_evap_frac: 0.35,
        lower_evap_depth: 14.0,
        lower_loss_coeff: 0.0,
        bottom_elev: 0.0,
        water_table_elev: 2.0,
        upper_moisture: 0.25,
        upper_evap_pattern: None,
    }
}
