// Drainage node that exchanges water with an aquifer. The groundwater
// computation only reads it as a boundary condition.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainageNode {
    pub id: String,
    pub invert_elev: f64, // Invert elevation [ft]
    pub depth: f64,       // Current water depth [ft]
    pub inflow: f64,      // Current total inflow [cfs]
    pub volume: f64,      // Current stored volume [ft3]
}

impl DrainageNode {
    pub fn new(id: &str, invert_elev: f64) -> Self {
        DrainageNode {
            id: id.to_string(),
            invert_elev,
            depth: 0.0,
            inflow: 0.0,
            volume: 0.0,
        }
    }

    // Flow the node could supply to an aquifer over a step [cfs]
    pub fn available_flow(&self, tstep: f64) -> f64 {
        self.inflow + self.volume / tstep
    }
}
