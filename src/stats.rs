// End of step groundwater values reported for statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GwaterSample {
    pub infil: f64,       // Infiltration rate [ft/s]
    pub evap: f64,        // Combined evaporation loss rate [ft/s]
    pub lat_flow: f64,    // Lateral flow rate [ft/s]
    pub deep_flow: f64,   // Deep seepage rate [ft/s]
    pub theta: f64,       // Upper zone moisture [-]
    pub water_table: f64, // Water table elevation [ft]
}

/// Receiver of per-step groundwater samples.
pub trait StatisticsSink {
    fn update_gwater(&mut self, subcatch: usize, sample: &GwaterSample, tstep: f64);
}

// Accumulated groundwater statistics of one subcatchment
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GwaterStats {
    pub infil: f64,     // Total infiltration depth [ft]
    pub evap: f64,      // Total evaporation depth [ft]
    pub lat_flow: f64,  // Total lateral flow depth [ft]
    pub deep_flow: f64, // Total deep seepage depth [ft]
    pub max_flow: f64,  // Lateral flow of largest magnitude [ft/s]
    pub final_upper_moist: f64,
    pub final_water_table: f64,
    sum_upper_moist: f64,
    sum_water_table: f64,
    steps: usize,
}

impl GwaterStats {
    pub fn avg_upper_moist(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.sum_upper_moist / self.steps as f64
    }

    pub fn avg_water_table(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.sum_water_table / self.steps as f64
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn add(&mut self, s: &GwaterSample, tstep: f64) {
        self.infil += s.infil * tstep;
        self.evap += s.evap * tstep;
        self.lat_flow += s.lat_flow * tstep;
        self.deep_flow += s.deep_flow * tstep;
        self.sum_upper_moist += s.theta;
        self.sum_water_table += s.water_table;
        self.final_upper_moist = s.theta;
        self.final_water_table = s.water_table;
        if s.lat_flow.abs() > self.max_flow.abs() {
            self.max_flow = s.lat_flow;
        }
        self.steps += 1;
    }
}

// Statistics for every subcatchment, indexed like the project's subcatchments
#[derive(Debug, Clone, Default)]
pub struct SubcatchStats {
    pub gw: Vec<GwaterStats>,
}

impl SubcatchStats {
    pub fn new(count: usize) -> Self {
        SubcatchStats {
            gw: vec![GwaterStats::default(); count],
        }
    }
}

impl StatisticsSink for SubcatchStats {
    fn update_gwater(&mut self, subcatch: usize, sample: &GwaterSample, tstep: f64) {
        if subcatch >= self.gw.len() {
            self.gw.resize(subcatch + 1, GwaterStats::default());
        }
        self.gw[subcatch].add(sample, tstep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accumulates_depths_and_averages() {
        let mut stats = SubcatchStats::new(2);
        let s1 = GwaterSample {
            infil: 1.0e-6,
            lat_flow: 2.0e-6,
            theta: 0.2,
            water_table: 3.0,
            ..GwaterSample::default()
        };
        let s2 = GwaterSample {
            lat_flow: -5.0e-6,
            theta: 0.3,
            water_table: 4.0,
            ..s1
        };
        stats.update_gwater(1, &s1, 100.0);
        stats.update_gwater(1, &s2, 100.0);

        let gw = &stats.gw[1];
        assert_eq!(gw.steps(), 2);
        assert_relative_eq!(gw.infil, 2.0e-4, max_relative = 1e-9);
        assert_relative_eq!(gw.lat_flow, -3.0e-4, max_relative = 1e-9);
        assert_relative_eq!(gw.avg_upper_moist(), 0.25, max_relative = 1e-9);
        assert_relative_eq!(gw.avg_water_table(), 3.5, max_relative = 1e-9);
        assert_eq!(gw.final_water_table, 4.0);
        assert_eq!(gw.max_flow, -5.0e-6);
        assert_eq!(stats.gw[0].steps(), 0);
    }
}
