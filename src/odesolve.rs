//! Adaptive step Runge-Kutta integrator (Cash-Karp embedded 4th/5th order).

use nalgebra::SVector;

const MAX_STEPS: usize = 10000;
const TINY: f64 = 1.0e-30;
const SAFETY: f64 = 0.9;
const PGROW: f64 = -0.2;
const PSHRNK: f64 = -0.25;
const ERRCON: f64 = 1.89e-4; // (5 / SAFETY)^(1 / PGROW)

/// Failures of the integrator. These are fatal for a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("step size underflow at t = {t}")]
    StepUnderflow { t: f64 },
    #[error("too many steps ({max}) required to reach t = {t_end}")]
    TooManySteps { max: usize, t_end: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdeSolver {
    pub tolerance: f64, // relative error tolerance
    pub max_steps: usize,
}

impl Default for OdeSolver {
    fn default() -> Self {
        OdeSolver {
            tolerance: 1.0e-4,
            max_steps: MAX_STEPS,
        }
    }
}

impl OdeSolver {
    pub fn new(tolerance: f64) -> Self {
        OdeSolver {
            tolerance,
            ..OdeSolver::default()
        }
    }

    /// Integrate `y` from `t1` to `t2` starting with trial step `h1`.
    ///
    /// `derivs(t, y)` returns dy/dt. On success `y` holds the solution at `t2`
    /// and the number of accepted steps is returned.
    pub fn integrate<const N: usize, F>(
        &self,
        y: &mut SVector<f64, N>,
        t1: f64,
        t2: f64,
        h1: f64,
        mut derivs: F,
    ) -> Result<usize, SolverError>
    where
        F: FnMut(f64, &SVector<f64, N>) -> SVector<f64, N>,
    {
        let mut t = t1;
        let mut h = h1.abs().copysign(t2 - t1);
        if t2 == t1 {
            return Ok(0);
        }

        for nstp in 1..=self.max_steps {
            let dydt = derivs(t, y);
            let yscal = y.abs() + (dydt * h).abs() + SVector::repeat(TINY);

            // don't step past the end of the interval
            if (t + h - t2) * (t + h - t1) > 0.0 {
                h = t2 - t;
            }

            let (h_did, h_next) = self.quality_step(y, &dydt, &mut t, h, &yscal, &mut derivs)?;
            debug_assert!(h_did != 0.0);

            if (t - t2) * (t2 - t1) >= 0.0 {
                return Ok(nstp);
            }
            h = h_next;
        }
        Err(SolverError::TooManySteps {
            max: self.max_steps,
            t_end: t2,
        })
    }

    // One step with error control; returns (step taken, suggested next step)
    fn quality_step<const N: usize, F>(
        &self,
        y: &mut SVector<f64, N>,
        dydt: &SVector<f64, N>,
        t: &mut f64,
        h_try: f64,
        yscal: &SVector<f64, N>,
        derivs: &mut F,
    ) -> Result<(f64, f64), SolverError>
    where
        F: FnMut(f64, &SVector<f64, N>) -> SVector<f64, N>,
    {
        let mut h = h_try;
        loop {
            let (ytemp, yerr) = cash_karp(y, dydt, *t, h, derivs);
            let errmax = yerr.component_div(yscal).amax() / self.tolerance;
            if errmax <= 1.0 {
                let h_next = if errmax > ERRCON {
                    SAFETY * h * errmax.powf(PGROW)
                } else {
                    5.0 * h
                };
                *t += h;
                *y = ytemp;
                return Ok((h, h_next));
            }

            // truncation error too large, shrink the step
            let h_shrunk = SAFETY * h * errmax.powf(PSHRNK);
            h = if h >= 0.0 {
                h_shrunk.max(0.1 * h)
            } else {
                h_shrunk.min(0.1 * h)
            };
            if *t + h == *t {
                return Err(SolverError::StepUnderflow { t: *t });
            }
        }
    }
}

// Cash-Karp Runge-Kutta step; returns the 5th order solution and error estimate
fn cash_karp<const N: usize, F>(
    y: &SVector<f64, N>,
    dydt: &SVector<f64, N>,
    t: f64,
    h: f64,
    derivs: &mut F,
) -> (SVector<f64, N>, SVector<f64, N>)
where
    F: FnMut(f64, &SVector<f64, N>) -> SVector<f64, N>,
{
    const A2: f64 = 0.2;
    const A3: f64 = 0.3;
    const A4: f64 = 0.6;
    const A5: f64 = 1.0;
    const A6: f64 = 0.875;
    const B21: f64 = 0.2;
    const B31: f64 = 3.0 / 40.0;
    const B32: f64 = 9.0 / 40.0;
    const B41: f64 = 0.3;
    const B42: f64 = -0.9;
    const B43: f64 = 1.2;
    const B51: f64 = -11.0 / 54.0;
    const B52: f64 = 2.5;
    const B53: f64 = -70.0 / 27.0;
    const B54: f64 = 35.0 / 27.0;
    const B61: f64 = 1631.0 / 55296.0;
    const B62: f64 = 175.0 / 512.0;
    const B63: f64 = 575.0 / 13824.0;
    const B64: f64 = 44275.0 / 110592.0;
    const B65: f64 = 253.0 / 4096.0;
    const C1: f64 = 37.0 / 378.0;
    const C3: f64 = 250.0 / 621.0;
    const C4: f64 = 125.0 / 594.0;
    const C6: f64 = 512.0 / 1771.0;
    const DC1: f64 = C1 - 2825.0 / 27648.0;
    const DC3: f64 = C3 - 18575.0 / 48384.0;
    const DC4: f64 = C4 - 13525.0 / 55296.0;
    const DC5: f64 = -277.0 / 14336.0;
    const DC6: f64 = C6 - 0.25;

    let k1 = dydt;
    let k2 = derivs(t + A2 * h, &(y + k1 * (B21 * h)));
    let k3 = derivs(t + A3 * h, &(y + (k1 * B31 + k2 * B32) * h));
    let k4 = derivs(t + A4 * h, &(y + (k1 * B41 + k2 * B42 + k3 * B43) * h));
    let k5 = derivs(
        t + A5 * h,
        &(y + (k1 * B51 + k2 * B52 + k3 * B53 + k4 * B54) * h),
    );
    let k6 = derivs(
        t + A6 * h,
        &(y + (k1 * B61 + k2 * B62 + k3 * B63 + k4 * B64 + k5 * B65) * h),
    );

    let yout = y + (k1 * C1 + k3 * C3 + k4 * C4 + k6 * C6) * h;
    let yerr = (k1 * DC1 + k3 * DC3 + k4 * DC4 + k5 * DC5 + k6 * DC6) * h;
    (yout, yerr)
}
