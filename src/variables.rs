use crate::context::{Fluxes, StepContext};
use crate::units::Quantity;

/// Live groundwater quantities that user flow formulas may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GwVariable {
    Hgw,   // water table height above aquifer bottom
    Hsw,   // surface water height above aquifer bottom
    Hcb,   // channel bottom height (Hstar)
    Hgs,   // ground surface height (total depth)
    Ks,    // saturated hydraulic conductivity
    K,     // unsaturated hydraulic conductivity
    Theta, // upper zone moisture content
    Phi,   // porosity
    Fi,    // surface infiltration rate
    Fu,    // upper zone percolation rate
    A,     // subcatchment area
}

impl GwVariable {
    pub const ALL: [GwVariable; 11] = [
        GwVariable::Hgw,
        GwVariable::Hsw,
        GwVariable::Hcb,
        GwVariable::Hgs,
        GwVariable::Ks,
        GwVariable::K,
        GwVariable::Theta,
        GwVariable::Phi,
        GwVariable::Fi,
        GwVariable::Fu,
        GwVariable::A,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GwVariable::Hgw => "HGW",
            GwVariable::Hsw => "HSW",
            GwVariable::Hcb => "HCB",
            GwVariable::Hgs => "HGS",
            GwVariable::Ks => "KS",
            GwVariable::K => "K",
            GwVariable::Theta => "THETA",
            GwVariable::Phi => "PHI",
            GwVariable::Fi => "FI",
            GwVariable::Fu => "FU",
            GwVariable::A => "A",
        }
    }

    // Case-insensitive lookup; used as the resolver when compiling formulas
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }

    // Current value in user units
    pub fn value(self, ctx: &StepContext<'_>, fluxes: &Fluxes) -> f64 {
        let u = ctx.units;
        match self {
            GwVariable::Hgw => u.to_user(Quantity::Length, fluxes.hgw),
            GwVariable::Hsw => u.to_user(Quantity::Length, ctx.hsw),
            GwVariable::Hcb => u.to_user(Quantity::Length, ctx.hstar),
            GwVariable::Hgs => u.to_user(Quantity::Length, ctx.total_depth),
            GwVariable::Ks => u.to_user(Quantity::Rainfall, ctx.aquifer.conductivity),
            GwVariable::K => u.to_user(Quantity::Rainfall, fluxes.hyd_con),
            GwVariable::Theta => fluxes.theta,
            GwVariable::Phi => ctx.aquifer.porosity,
            GwVariable::Fi => u.to_user(Quantity::Rainfall, ctx.infil),
            GwVariable::Fu => u.to_user(Quantity::Rainfall, fluxes.upper_perc),
            GwVariable::A => u.to_user(Quantity::LandArea, ctx.area),
        }
    }
}
