use log::info;

// Volumes of water moved by groundwater in one step [ft3]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GwaterVolumes {
    pub infil: f64,      // Infiltration into upper zone
    pub upper_evap: f64, // Upper zone evaporation
    pub lower_evap: f64, // Lower zone evaporation
    pub lower_perc: f64, // Deep percolation out of lower zone
    pub gwater: f64,     // Lateral flow exchanged with the drainage system
}

/// Receiver of groundwater volumes reported by the step driver.
pub trait MassBalanceSink {
    fn add_gwater_volumes(&mut self, v: &GwaterVolumes);
}

// Run totals for the groundwater continuity check
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GwaterTotals {
    pub totals: GwaterVolumes,
    pub init_storage: f64,  // [ft3]
    pub final_storage: f64, // [ft3]
}

impl MassBalanceSink for GwaterTotals {
    fn add_gwater_volumes(&mut self, v: &GwaterVolumes) {
        self.totals.infil += v.infil;
        self.totals.upper_evap += v.upper_evap;
        self.totals.lower_evap += v.lower_evap;
        self.totals.lower_perc += v.lower_perc;
        self.totals.gwater += v.gwater;
    }
}

impl GwaterTotals {
    pub fn new(init_storage: f64) -> Self {
        GwaterTotals {
            init_storage,
            ..GwaterTotals::default()
        }
    }

    // Percent continuity error once the final storage is known
    pub fn continuity_error(&mut self, final_storage: f64) -> f64 {
        self.final_storage = final_storage;
        let t = &self.totals;
        let inflow = t.infil + self.init_storage;
        let outflow = t.upper_evap + t.lower_evap + t.lower_perc + t.gwater + final_storage;

        let err = if (inflow - outflow).abs() < 1.0 {
            0.0
        } else if inflow > 0.0 {
            100.0 * (1.0 - outflow / inflow)
        } else if outflow > 0.0 {
            100.0 * (inflow / outflow - 1.0)
        } else {
            0.0
        };
        info!(
            "groundwater continuity: inflow {:.3} ft3, outflow {:.3} ft3, error {:.3} %",
            inflow, outflow, err
        );
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn totals_accumulate() {
        let mut t = GwaterTotals::new(100.0);
        let v = GwaterVolumes {
            infil: 10.0,
            upper_evap: 1.0,
            lower_evap: 2.0,
            lower_perc: 3.0,
            gwater: 4.0,
        };
        t.add_gwater_volumes(&v);
        t.add_gwater_volumes(&v);
        assert_eq!(t.totals.infil, 20.0);
        assert_eq!(t.totals.gwater, 8.0);
    }

    #[test]
    fn balanced_run_has_no_error() {
        let mut t = GwaterTotals::new(100.0);
        t.add_gwater_volumes(&GwaterVolumes {
            infil: 50.0,
            gwater: 20.0,
            ..GwaterVolumes::default()
        });
        assert_eq!(t.continuity_error(130.0), 0.0);
        assert_eq!(t.final_storage, 130.0);
    }

    #[test]
    fn missing_water_shows_as_positive_error() {
        let mut t = GwaterTotals::new(100.0);
        t.add_gwater_volumes(&GwaterVolumes {
            infil: 100.0,
            ..GwaterVolumes::default()
        });
        assert_relative_eq!(t.continuity_error(190.0), 5.0, max_relative = 1e-9);
    }
}
