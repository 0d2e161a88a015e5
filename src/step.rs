use log::trace;
use nalgebra::Vector2;

use crate::aquifer::Aquifer;
use crate::context::{Fluxes, StepContext};
use crate::flux::{LOWER_DEPTH, THETA};
use crate::groundwater::XTOL;
use crate::massbal::{GwaterVolumes, MassBalanceSink};
use crate::node::DrainageNode;
use crate::odesolve::{OdeSolver, SolverError};
use crate::pattern::TimePattern;
use crate::stats::{GwaterSample, StatisticsSink};
use crate::subcatch::Subcatchment;
use crate::units::UnitSystem;

// Shared, read-only surroundings of a groundwater step
#[derive(Debug, Clone, Copy)]
pub struct StepEnv<'a> {
    pub aquifers: &'a [Aquifer],
    pub patterns: &'a [TimePattern],
    pub nodes: &'a [DrainageNode],
    pub units: UnitSystem,
    pub solver: OdeSolver,
    pub evap_rate: f64, // Potential evaporation rate [ft/s]
    pub month: u32,     // Calendar month of the step (1 = January)
}

/// End of step results for one subcatchment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub infil: f64,       // Infiltration rate over the subcatchment [ft/s]
    pub fluxes: Fluxes,   // Fluxes at the final state
    pub theta: f64,       // Upper zone moisture content [-]
    pub lower_depth: f64, // Lower zone depth [ft]
    pub water_table: f64, // Water table elevation [ft]
    pub volumes: GwaterVolumes,
}

/// Advance the groundwater of one subcatchment by `tstep` seconds.
///
/// `evap_vol` is the pervious surface evaporation already taken this step
/// and `infil_vol` the volume infiltrated into the upper zone, both in ft3.
/// Returns `Ok(None)` and leaves the state untouched when the subcatchment
/// has no groundwater or its geometry allows no exchange.
#[allow(clippy::too_many_arguments)]
pub fn get_groundwater(
    index: usize,
    subcatch: &mut Subcatchment,
    env: &StepEnv<'_>,
    evap_vol: f64,
    infil_vol: f64,
    tstep: f64,
    massbal: &mut dyn MassBalanceSink,
    stats: &mut dyn StatisticsSink,
) -> Result<Option<StepReport>, SolverError> {
    let area = subcatch.area;
    let frac_perv = subcatch.frac_perv;
    let Some(gw) = subcatch.groundwater.as_mut() else {
        return Ok(None);
    };
    let total_depth = gw.total_depth();
    if frac_perv <= 0.0 || total_depth <= 0.0 || area <= 0.0 {
        trace!("skipping groundwater step for subcatchment {}", subcatch.id);
        return Ok(None);
    }
    let aquifer = &env.aquifers[gw.aquifer];
    let node = &env.nodes[gw.node];

    // volumes -> rates over the whole subcatchment
    let infil = infil_vol / area / tstep;
    let evap_used = evap_vol / area / tstep;

    // groundwater evaporation can only occur through the pervious surface
    let max_evap = env.evap_rate * frac_perv;
    let avail_evap = (max_evap - evap_used).max(0.0);

    let hstar = gw.node_elev.unwrap_or(node.invert_elev) - gw.bottom_elev;
    let surface_depth = if gw.fixed_depth > 0.0 {
        gw.fixed_depth
    } else {
        node.depth
    };
    let hsw = surface_depth + node.invert_elev - gw.bottom_elev;

    let mut x = Vector2::new(gw.theta, gw.lower_depth);
    let upper_depth = total_depth - x[LOWER_DEPTH];
    let max_upper_perc = (upper_depth * (x[THETA] - aquifer.field_capacity)).max(0.0) / tstep;
    let max_gw_flow_pos = x[LOWER_DEPTH] * aquifer.porosity / tstep;
    let node_flow = node.available_flow(tstep) / area;
    let max_gw_flow_neg = -(upper_depth * (aquifer.porosity - x[THETA]) / tstep).min(node_flow);

    let fluxes = {
        let mut ctx = StepContext {
            gw: &*gw,
            aquifer,
            units: env.units,
            frac_perv,
            area,
            infil,
            max_evap,
            avail_evap,
            upper_evap_frac: aquifer.upper_evap_frac_for(env.month, env.patterns),
            total_depth,
            hstar,
            hsw,
            tstep,
            max_upper_perc,
            max_gw_flow_pos,
            max_gw_flow_neg,
            fluxes: Fluxes::default(),
        };
        env.solver
            .integrate(&mut x, 0.0, tstep, tstep, |_, y| ctx.derivatives(y))?;
        clamp_state(&mut x, aquifer, total_depth);
        ctx.update_fluxes(x[THETA], x[LOWER_DEPTH])
    };

    gw.theta = x[THETA];
    gw.lower_depth = x[LOWER_DEPTH];
    gw.old_flow = gw.new_flow;
    gw.new_flow = fluxes.gw_flow;
    gw.evap_loss = fluxes.upper_evap + fluxes.lower_evap;
    gw.max_infil_vol =
        (total_depth - gw.lower_depth) * (aquifer.porosity - gw.theta) / frac_perv;

    let ft2sec = area * tstep;
    let volumes = GwaterVolumes {
        infil: infil * ft2sec,
        upper_evap: fluxes.upper_evap * ft2sec,
        lower_evap: fluxes.lower_evap * ft2sec,
        lower_perc: fluxes.lower_loss * ft2sec,
        gwater: 0.5 * (gw.old_flow + gw.new_flow) * ft2sec,
    };
    massbal.add_gwater_volumes(&volumes);

    let sample = GwaterSample {
        infil,
        evap: gw.evap_loss,
        lat_flow: fluxes.gw_flow,
        deep_flow: fluxes.lower_loss,
        theta: gw.theta,
        water_table: gw.water_table(),
    };
    stats.update_gwater(index, &sample, tstep);

    Ok(Some(StepReport {
        infil,
        fluxes,
        theta: gw.theta,
        lower_depth: gw.lower_depth,
        water_table: sample.water_table,
        volumes,
    }))
}

// Keep moisture and depth within their physical limits
fn clamp_state(x: &mut Vector2<f64>, aquifer: &Aquifer, total_depth: f64) {
    x[THETA] = x[THETA].max(aquifer.wilting_point);
    if x[THETA] >= aquifer.porosity {
        x[THETA] = aquifer.porosity - XTOL;
        x[LOWER_DEPTH] = total_depth - XTOL;
    }
    x[LOWER_DEPTH] = x[LOWER_DEPTH].max(0.0);
    if x[LOWER_DEPTH] >= total_depth {
        x[LOWER_DEPTH] = total_depth - XTOL;
    }
}
