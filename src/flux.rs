use nalgebra::Vector2;

use crate::context::{Fluxes, StepContext};
use crate::units::Quantity;

// Positions of the state variables in the integrator's state vector
pub const THETA: usize = 0;
pub const LOWER_DEPTH: usize = 1;

impl StepContext<'_> {
    // Compute all fluxes at a given upper zone moisture and lower zone depth
    pub fn fluxes_at(&self, theta: f64, lower_depth: f64) -> Fluxes {
        let lower_depth = lower_depth.max(0.0).min(self.total_depth);
        let upper_depth = self.total_depth - lower_depth;

        let mut f = Fluxes {
            hgw: lower_depth,
            theta,
            hyd_con: self.aquifer.k(theta),
            ..Fluxes::default()
        };

        (f.upper_evap, f.lower_evap) = self.evap_rates(theta, upper_depth);
        f.upper_perc = self.upper_perc(theta, upper_depth).min(self.max_upper_perc);

        f.lower_loss = match &self.gw.deep_flow_expr {
            Some(expr) => {
                let q = expr.eval(|v| v.value(self, &f));
                self.units.to_internal(Quantity::Rainfall, q)
            }
            None => self.aquifer.lower_loss_coeff * lower_depth / self.total_depth,
        };
        f.lower_loss = f.lower_loss.min(lower_depth / self.tstep);

        let mut q = self.gw_flow(lower_depth);
        if let Some(expr) = &self.gw.lat_flow_expr {
            q += self
                .units
                .to_internal(Quantity::GwFlow, expr.eval(|v| v.value(self, &f)));
        }
        f.gw_flow = if q >= 0.0 {
            q.min(self.max_gw_flow_pos)
        } else {
            q.max(self.max_gw_flow_neg)
        };
        f
    }

    // Recompute fluxes and keep them as the context's latest values
    pub fn update_fluxes(&mut self, theta: f64, lower_depth: f64) -> Fluxes {
        self.fluxes = self.fluxes_at(theta, lower_depth);
        self.fluxes
    }

    // Time derivatives of upper zone moisture and lower zone depth
    pub fn derivatives(&mut self, x: &Vector2<f64>) -> Vector2<f64> {
        let f = self.update_fluxes(x[THETA], x[LOWER_DEPTH]);
        let q_upper = self.infil - f.upper_evap - f.upper_perc;
        let q_lower = f.upper_perc - f.lower_loss - f.lower_evap - f.gw_flow;

        let mut dxdt = Vector2::zeros();
        let denom = self.total_depth - x[LOWER_DEPTH];
        if denom > 0.0 {
            dxdt[THETA] = q_upper / denom;
        }
        let denom = self.aquifer.porosity - x[THETA];
        if denom > 0.0 {
            dxdt[LOWER_DEPTH] = q_lower / denom;
        }
        dxdt
    }

    // Evaporation out of the upper and lower zones [ft/s]
    fn evap_rates(&self, theta: f64, upper_depth: f64) -> (f64, f64) {
        // no subsurface evaporation while infiltration is occurring
        if self.infil > 0.0 {
            return (0.0, 0.0);
        }

        let upper_frac = self.upper_evap_frac;
        let mut upper_evap = 0.0;
        if theta > self.aquifer.wilting_point {
            upper_evap = (upper_frac * self.max_evap).min(self.avail_evap);
        }

        let mut lower_evap = 0.0;
        let evap_depth = self.aquifer.lower_evap_depth;
        if evap_depth > 0.0 {
            // part of the evaporation depth lying inside the saturated zone
            let lower_frac = ((evap_depth - upper_depth) / evap_depth).clamp(0.0, 1.0);
            lower_evap = (lower_frac * (1.0 - upper_frac) * self.max_evap)
                .min(self.avail_evap - upper_evap);
        }
        (upper_evap, lower_evap)
    }

    // Percolation from upper to lower zone before the per-step ceiling [ft/s]
    fn upper_perc(&self, theta: f64, upper_depth: f64) -> f64 {
        let a = self.aquifer;
        if upper_depth <= 0.0 || theta <= a.field_capacity {
            return 0.0;
        }
        let dhdz = 1.0 + a.tension_slope * 2.0 * (theta - a.field_capacity) / upper_depth;
        a.k(theta) * dhdz
    }

    // Lateral flow from the built-in equation [ft/s]
    fn gw_flow(&self, lower_depth: f64) -> f64 {
        if lower_depth <= self.hstar {
            return 0.0;
        }
        let c = &self.gw.coeffs;
        let ucf_len = self.units.ucf(Quantity::Length);

        let t1 = if c.b1 == 0.0 {
            c.a1
        } else {
            c.a1 * ((lower_depth - self.hstar) * ucf_len).powf(c.b1)
        };

        let t2 = if c.b2 == 0.0 {
            c.a2
        } else if self.hsw > self.hstar {
            c.a2 * ((self.hsw - self.hstar) * ucf_len).powf(c.b2)
        } else {
            0.0
        };

        let t3 = c.a3 * lower_depth * self.hsw * ucf_len * ucf_len;

        let q = self.units.to_internal(Quantity::GwFlow, t1 - t2 + t3);
        if q < 0.0 && c.a3 != 0.0 {
            return 0.0;
        }
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::Fixture;
    use crate::expr::MathExpr;
    use crate::groundwater::FlowCoeffs;
    use crate::units::UnitSystem;
    use crate::variables::GwVariable;
    use approx::assert_relative_eq;

    #[test]
    fn percolation_moves_water_down() {
        let fx = Fixture::new();
        let mut ctx = fx.context();
        let f = ctx.update_fluxes(0.25, 2.0);
        assert!(f.upper_perc > 0.0);
        assert_eq!(f.gw_flow, 0.0);

        let d = ctx.derivatives(&Vector2::new(0.25, 2.0));
        assert!(d[THETA] < 0.0);
        assert!(d[LOWER_DEPTH] > 0.0);
    }

    #[test]
    fn percolation_matches_formula() {
        let fx = Fixture::new();
        let ctx = fx.context();
        let a = &fx.aquifer;
        let f = ctx.fluxes_at(0.25, 2.0);
        let k = a.conductivity * ((0.25 - 0.43) * a.conduct_slope).exp();
        let expected = k * (1.0 + a.tension_slope * 2.0 * 0.05 / 4.0);
        assert_relative_eq!(f.upper_perc, expected.min(ctx.max_upper_perc));
        assert_relative_eq!(f.hyd_con, k);
    }

    #[test]
    fn no_percolation_at_field_capacity() {
        let fx = Fixture::new();
        let ctx = fx.context();
        let f = ctx.fluxes_at(fx.aquifer.field_capacity, 2.0);
        assert_eq!(f.upper_perc, 0.0);
    }

    #[test]
    fn infiltration_shuts_off_evaporation() {
        let fx = Fixture::new();
        let mut ctx = fx.context();
        ctx.max_evap = 1.0e-6;
        ctx.avail_evap = 1.0e-6;
        let dry = ctx.fluxes_at(0.25, 5.0);
        assert!(dry.upper_evap > 0.0);
        assert!(dry.lower_evap > 0.0);

        ctx.infil = 1.0e-7;
        let wet = ctx.fluxes_at(0.25, 5.0);
        assert_eq!(wet.upper_evap, 0.0);
        assert_eq!(wet.lower_evap, 0.0);
    }

    #[test]
    fn evaporation_split_follows_fractions() {
        let fx = Fixture::new();
        let mut ctx = fx.context();
        ctx.max_evap = 1.0e-6;
        ctx.avail_evap = 1.0e-6;
        // upper depth 1 ft, lower evap depth 14 ft: 13/14 of reach is saturated
        let f = ctx.fluxes_at(0.25, 5.0);
        assert_relative_eq!(f.upper_evap, 0.35e-6);
        assert_relative_eq!(f.lower_evap, (13.0 / 14.0) * 0.65e-6);
        assert!(f.upper_evap + f.lower_evap <= ctx.avail_evap);
    }

    #[test]
    fn evaporation_limited_by_available_rate() {
        let fx = Fixture::new();
        let mut ctx = fx.context();
        ctx.max_evap = 1.0e-6;
        ctx.avail_evap = 0.5e-6;
        let f = ctx.fluxes_at(0.25, 5.0);
        assert_relative_eq!(f.upper_evap, 0.35e-6);
        assert_relative_eq!(f.lower_evap, 0.15e-6);
    }

    #[test]
    fn no_upper_evaporation_at_wilting_point() {
        let fx = Fixture::new();
        let mut ctx = fx.context();
        ctx.max_evap = 1.0e-6;
        ctx.avail_evap = 1.0e-6;
        let f = ctx.fluxes_at(fx.aquifer.wilting_point, 2.0);
        assert_eq!(f.upper_evap, 0.0);
    }

    #[test]
    fn lateral_flow_heights_use_user_length_units() {
        let mut fx = Fixture::new();
        fx.gw.coeffs = FlowCoeffs {
            a1: 0.1,
            b1: 1.0,
            a2: 0.05,
            b2: 1.0,
            ..FlowCoeffs::default()
        };
        let mut ctx = fx.context();
        ctx.units = UnitSystem::SI;
        ctx.hstar = 1.0;
        // 1 ft above Hstar in the aquifer, 0.5 ft in the channel
        ctx.hsw = 1.5;
        let f = ctx.fluxes_at(0.25, 2.0);
        assert_relative_eq!(
            f.gw_flow,
            (0.1 * 0.3048 - 0.05 * 0.5 * 0.3048) / 3048.0,
            max_relative = 1e-12
        );

        ctx.hsw = 0.0;
        let f = ctx.fluxes_at(0.25, 2.0);
        assert_relative_eq!(f.gw_flow, 0.1 * 0.3048 / 3048.0, max_relative = 1e-12);
    }

    #[test]
    fn interaction_term_scales_both_heights() {
        let mut fx = Fixture::new();
        fx.gw.coeffs = FlowCoeffs {
            a3: 0.01,
            ..FlowCoeffs::default()
        };
        let mut ctx = fx.context();
        ctx.units = UnitSystem::SI;
        ctx.hstar = 1.0;
        ctx.hsw = 1.5;
        let f = ctx.fluxes_at(0.25, 2.0);
        let expected = 0.01 * (2.0 * 0.3048) * (1.5 * 0.3048) / 3048.0;
        assert_relative_eq!(f.gw_flow, expected, max_relative = 1e-12);
    }

    #[test]
    fn no_lateral_flow_below_hstar() {
        let mut fx = Fixture::new();
        fx.gw.coeffs = FlowCoeffs {
            a1: 0.1,
            b1: 1.0,
            ..FlowCoeffs::default()
        };
        let mut ctx = fx.context();
        ctx.hstar = 3.0;
        assert_eq!(ctx.fluxes_at(0.25, 2.0).gw_flow, 0.0);
        assert_eq!(ctx.fluxes_at(0.25, 3.0).gw_flow, 0.0);
    }

    #[test]
    fn lateral_flow_above_hstar_is_bounded() {
        let mut fx = Fixture::new();
        fx.gw.coeffs = FlowCoeffs {
            a1: 0.1,
            b1: 1.0,
            ..FlowCoeffs::default()
        };
        let mut ctx = fx.context();
        ctx.hstar = 1.0;
        let f = ctx.fluxes_at(0.25, 2.0);
        assert_relative_eq!(f.gw_flow, 0.1 / 43560.0);
        assert!(f.gw_flow <= ctx.max_gw_flow_pos);

        fx.gw.coeffs.a1 = 1.0e4;
        let ctx = fx.context();
        let f = ctx.fluxes_at(0.25, 2.0);
        assert_relative_eq!(f.gw_flow, ctx.max_gw_flow_pos);
    }

    #[test]
    fn negative_flow_clamped_only_with_interaction_term() {
        let mut fx = Fixture::new();
        fx.gw.coeffs = FlowCoeffs {
            a1: 0.1,
            b1: 1.0,
            a2: 1.0,
            b2: 1.0,
            a3: 0.0,
        };
        let mut ctx = fx.context();
        ctx.hstar = 1.0;
        ctx.hsw = 3.0;
        let f = ctx.fluxes_at(0.25, 2.0);
        assert!(f.gw_flow < 0.0);
        assert!(f.gw_flow >= ctx.max_gw_flow_neg);

        fx.gw.coeffs.a3 = 1.0e-6;
        let mut ctx = fx.context();
        ctx.hstar = 1.0;
        ctx.hsw = 3.0;
        assert_eq!(ctx.fluxes_at(0.25, 2.0).gw_flow, 0.0);
    }

    #[test]
    fn deep_flow_expression_overrides_coefficient() {
        let mut fx = Fixture::new();
        fx.aquifer.lower_loss_coeff = 1.0e-3;
        fx.gw.deep_flow_expr = Some(MathExpr::compile("2 * THETA", GwVariable::from_name).unwrap());
        let ctx = fx.context();
        let f = ctx.fluxes_at(0.3, 2.0);
        assert_relative_eq!(f.lower_loss, 0.6 / 43200.0);
    }

    #[test]
    fn deep_loss_capped_by_lower_depth() {
        let mut fx = Fixture::new();
        fx.aquifer.lower_loss_coeff = 1.0;
        let ctx = fx.context();
        let f = ctx.fluxes_at(0.25, 0.5);
        assert_relative_eq!(f.lower_loss, 0.5 / ctx.tstep);
    }

    #[test]
    fn lateral_expression_adds_to_builtin() {
        let mut fx = Fixture::new();
        fx.gw.lat_flow_expr = Some(MathExpr::compile("0.001 * (HGW - HCB)", GwVariable::from_name).unwrap());
        let mut ctx = fx.context();
        ctx.hstar = 1.0;
        let f = ctx.fluxes_at(0.25, 2.0);
        assert_relative_eq!(f.gw_flow, 0.001 / 43560.0);
    }

    #[test]
    fn lower_depth_is_clamped_to_total() {
        let fx = Fixture::new();
        let ctx = fx.context();
        assert_eq!(ctx.fluxes_at(0.25, 10.0).hgw, 6.0);
        assert_eq!(ctx.fluxes_at(0.25, -1.0).hgw, 0.0);
    }
}
