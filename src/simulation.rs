use std::io::Write;

use log::{debug, info};

use crate::error::SimError;
use crate::massbal::GwaterTotals;
use crate::odesolve::OdeSolver;
use crate::project::Project;
use crate::stats::SubcatchStats;
use crate::step::{StepEnv, StepReport, get_groundwater};
use crate::units::Quantity;

// Results of one subcatchment at the end of a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRow {
    pub time: f64, // Elapsed time at end of step [s]
    pub subcatch: usize,
    pub report: StepReport,
}

// Steps the groundwater of every subcatchment through the simulation period
pub struct Simulation {
    pub project: Project,
    pub totals: GwaterTotals,
    pub stats: SubcatchStats,
    pub solver: OdeSolver,
    elapsed: f64, // [s]
}

impl Simulation {
    pub fn new(mut project: Project) -> Self {
        project.init_state();
        let totals = GwaterTotals::new(project.gw_storage());
        let stats = SubcatchStats::new(project.subcatchments.len());
        Simulation {
            project,
            totals,
            stats,
            solver: OdeSolver::default(),
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_done(&self) -> bool {
        self.project.duration - self.elapsed < 1.0e-6
    }

    // Storage changed outside of stepping (e.g. a hot start), so restart the totals
    pub fn reset_totals(&mut self) {
        self.totals = GwaterTotals::new(self.project.gw_storage());
    }

    // Advance every subcatchment by one step; the last step is shortened to end on time
    pub fn step(&mut self) -> Result<Vec<StepRow>, SimError> {
        let p = &mut self.project;
        let tstep = p.step.min(p.duration - self.elapsed);
        let day = self.elapsed / 86400.0;
        let env = StepEnv {
            aquifers: &p.aquifers,
            patterns: &p.patterns,
            nodes: &p.nodes,
            units: p.units,
            solver: self.solver,
            evap_rate: p.climate.evap_rate(self.elapsed),
            month: p.climate.month(self.elapsed),
        };

        let mut rows = Vec::new();
        for (i, s) in p.subcatchments.iter_mut().enumerate() {
            let perv_area = s.area * s.frac_perv;
            let surf_evap = s.inputs.surface_evap.value(day).min(env.evap_rate);
            let evap_vol = surf_evap * perv_area * tstep;

            let mut infil_depth = s.inputs.infiltration.value(day) * tstep;
            if let Some(gw) = &s.groundwater {
                infil_depth = infil_depth.min(gw.max_infil_vol.max(0.0));
            }
            let infil_vol = infil_depth * perv_area;

            let report = get_groundwater(
                i,
                s,
                &env,
                evap_vol,
                infil_vol,
                tstep,
                &mut self.totals,
                &mut self.stats,
            )
            .map_err(|source| SimError::Solver {
                subcatch: s.id.clone(),
                source,
            })?;

            if let Some(report) = report {
                rows.push(StepRow {
                    time: self.elapsed + tstep,
                    subcatch: i,
                    report,
                });
            }
        }

        self.elapsed += tstep;
        Ok(rows)
    }

    /// Run to the end of the simulation, writing a CSV time series to `out`.
    ///
    /// Values are reported in the project's unit system. Returns the
    /// groundwater continuity error in percent.
    pub fn run<W: Write>(&mut self, mut out: W) -> Result<f64, SimError> {
        info!(
            "simulating {} subcatchment(s) for {:.2} hr with a {} s step",
            self.project.subcatchments.len(),
            self.project.duration / 3600.0,
            self.project.step
        );
        if !(self.project.step > 0.0) {
            return Ok(0.0);
        }

        writeln!(
            out,
            "datetime,subcatchment,theta,water_table,infil,upper_evap,lower_evap,upper_perc,deep_loss,lateral_flow"
        )?;
        while !self.is_done() {
            let rows = self.step()?;
            debug!("t = {:.0} s, {} row(s)", self.elapsed, rows.len());
            for row in &rows {
                self.write_row(&mut out, row)?;
            }
        }
        out.flush()?;

        let err = self.totals.continuity_error(self.project.gw_storage());
        info!("simulation finished at {}", self.project.climate.datetime(self.elapsed));
        for line in self.summary() {
            info!("{line}");
        }
        Ok(err)
    }

    // One line of groundwater statistics per subcatchment, in user units
    pub fn summary(&self) -> Vec<String> {
        let units = self.project.units;
        let len = |v: f64| units.to_user(Quantity::Length, v);
        self.project
            .subcatchments
            .iter()
            .zip(&self.stats.gw)
            .filter(|(s, st)| s.groundwater.is_some() && st.steps() > 0)
            .map(|(s, st)| {
                format!(
                    "{}: infil {:.4}, evap {:.4}, lateral {:.4}, deep {:.4}, \
                     avg theta {:.4}, avg water table {:.3}, final water table {:.3}, max lateral {:.6}",
                    s.id,
                    len(st.infil),
                    len(st.evap),
                    len(st.lat_flow),
                    len(st.deep_flow),
                    st.avg_upper_moist(),
                    len(st.avg_water_table()),
                    len(st.final_water_table),
                    units.to_user(Quantity::GwFlow, st.max_flow),
                )
            })
            .collect()
    }

    fn write_row<W: Write>(&self, out: &mut W, row: &StepRow) -> Result<(), SimError> {
        let units = self.project.units;
        let rate = |v: f64| units.to_user(Quantity::Rainfall, v);
        let r = &row.report;
        writeln!(
            out,
            "{},{},{:.4},{:.3},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            self.project.climate.datetime(row.time).format("%Y-%m-%d %H:%M:%S"),
            self.project.subcatchments[row.subcatch].id,
            r.theta,
            units.to_user(Quantity::Length, r.water_table),
            rate(r.infil),
            rate(r.fluxes.upper_evap),
            rate(r.fluxes.lower_evap),
            rate(r.fluxes.upper_perc),
            rate(r.fluxes.lower_loss),
            units.to_user(Quantity::GwFlow, r.fluxes.gw_flow),
        )?;
        Ok(())
    }
}
