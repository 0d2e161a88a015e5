use crate::aquifer::Aquifer;
use crate::groundwater::Groundwater;
use crate::units::UnitSystem;

// Flux rates computed at one evaluation of the zone equations. Rates in ft/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fluxes {
    pub hgw: f64,        // Water table height above aquifer bottom [ft]
    pub theta: f64,      // Upper zone moisture content [-]
    pub upper_evap: f64, // Evaporation from upper zone
    pub lower_evap: f64, // Evaporation from lower zone
    pub upper_perc: f64, // Percolation from upper to lower zone
    pub lower_loss: f64, // Deep seepage out of the lower zone
    pub gw_flow: f64,    // Lateral flow to the drainage node (negative = inflow)
    pub hyd_con: f64,    // Unsaturated hydraulic conductivity
}

/// Working values for one groundwater step of one subcatchment.
///
/// Built fresh by the step driver before integration and passed by reference
/// through the flux calculator and the derivative function. Limits on
/// percolation and lateral flow are fixed from the state at the start of the
/// step.
#[derive(Debug, Clone)]
pub struct StepContext<'a> {
    pub gw: &'a Groundwater,
    pub aquifer: &'a Aquifer,
    pub units: UnitSystem,
    pub frac_perv: f64,       // Pervious fraction of subcatchment area
    pub area: f64,            // Subcatchment area [ft2]
    pub infil: f64,           // Surface infiltration rate [ft/s]
    pub max_evap: f64,        // Max. evaporation through pervious surface [ft/s]
    pub avail_evap: f64,      // Evaporation left after surface evaporation [ft/s]
    pub upper_evap_frac: f64, // Monthly adjusted upper zone evap fraction
    pub total_depth: f64,     // Surface elevation minus aquifer bottom [ft]
    pub hstar: f64,           // Height above bottom below which no lateral flow [ft]
    pub hsw: f64,             // Height of node's water surface above bottom [ft]
    pub tstep: f64,           // Step length [s]
    pub max_upper_perc: f64,  // Ceiling on percolation [ft/s]
    pub max_gw_flow_pos: f64, // Ceiling on lateral outflow [ft/s]
    pub max_gw_flow_neg: f64, // Floor on lateral inflow (<= 0) [ft/s]
    pub fluxes: Fluxes,       // Most recently computed fluxes
}
