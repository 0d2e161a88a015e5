use crate::aquifer::Aquifer;
use crate::daily_inputs::SurfaceInputs;
use crate::groundwater::Groundwater;

// Land area draining to the conveyance network
#[derive(Debug, Clone)]
pub struct Subcatchment {
    pub id: String,
    pub area: f64,      // Area [ft2]
    pub frac_perv: f64, // Fraction of area that is pervious [-]
    pub inputs: SurfaceInputs,
    pub groundwater: Option<Groundwater>,
}

impl Subcatchment {
    pub fn new(id: &str, area: f64, frac_perv: f64) -> Self {
        Subcatchment {
            id: id.to_string(),
            area,
            frac_perv,
            inputs: SurfaceInputs::default(),
            groundwater: None,
        }
    }

    // Groundwater stored beneath the subcatchment per unit area [ft]
    pub fn gw_volume(&self, aquifers: &[Aquifer]) -> f64 {
        self.groundwater
            .as_ref()
            .and_then(|gw| aquifers.get(gw.aquifer).map(|a| gw.volume(a)))
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aquifer::sample_aquifer;
    use crate::groundwater::sample_spec;
    use approx::assert_relative_eq;

    #[test]
    fn no_groundwater_means_no_volume() {
        let s = Subcatchment::new("S1", 43560.0, 1.0);
        assert_eq!(s.gw_volume(&[sample_aquifer()]), 0.0);
    }

    #[test]
    fn volume_sums_both_zones() {
        let a = sample_aquifer();
        let mut s = Subcatchment::new("S1", 43560.0, 1.0);
        let mut gw = Groundwater::resolve(sample_spec(), &a);
        gw.init_state(&a, 1.0);
        s.groundwater = Some(gw);
        assert_relative_eq!(s.gw_volume(&[a]), 4.0 * 0.25 + 2.0 * 0.43);
    }
}
