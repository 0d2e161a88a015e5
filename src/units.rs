use serde::{Deserialize, Serialize};

// Physical quantities that cross the user-facing boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Rainfall, // in/hr or mm/hr
    EvapRate, // in/day or mm/day
    Length,   // ft or m
    LandArea, // ac or ha
    Volume,   // ft3 or m3
    GwFlow,   // cfs/ac or cms/ha
    Flow,     // cfs or cms
}

// Unit system used for input and reporting. Internal computation is always
// in feet and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    US,
    SI,
}

impl UnitSystem {
    // Factor that converts an internal value (ft, ft/s, ft2, ...) into user units
    pub fn ucf(self, quantity: Quantity) -> f64 {
        let (us, si) = match quantity {
            Quantity::Rainfall => (43200.0, 1097280.0),
            Quantity::EvapRate => (1036800.0, 26334720.0),
            Quantity::Length => (1.0, 0.3048),
            Quantity::LandArea => (2.2956e-5, 0.92903e-5),
            Quantity::Volume => (1.0, 0.02832),
            Quantity::GwFlow => (43560.0, 3048.0),
            Quantity::Flow => (1.0, 0.02832),
        };
        match self {
            UnitSystem::US => us,
            UnitSystem::SI => si,
        }
    }

    // User units -> internal units
    pub fn to_internal(self, quantity: Quantity, value: f64) -> f64 {
        value / self.ucf(quantity)
    }

    // Internal units -> user units
    pub fn to_user(self, quantity: Quantity, value: f64) -> f64 {
        value * self.ucf(quantity)
    }
}
