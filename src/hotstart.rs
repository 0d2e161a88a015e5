use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::groundwater::GroundwaterSnapshot;
use crate::project::Project;

/// Groundwater state of every subcatchment, saved as TOML keyed by subcatchment id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotStart {
    #[serde(default)]
    pub subcatchments: BTreeMap<String, GroundwaterSnapshot>,
}

impl HotStart {
    pub fn capture(project: &Project) -> Self {
        let subcatchments = project
            .subcatchments
            .iter()
            .filter_map(|s| s.groundwater.as_ref().map(|gw| (s.id.clone(), gw.snapshot())))
            .collect();
        HotStart { subcatchments }
    }

    // Restore saved states; returns how many subcatchments were updated
    pub fn apply(&self, project: &mut Project) -> usize {
        let mut applied = 0;
        for (id, snapshot) in &self.subcatchments {
            let gw = project
                .subcatch_index(id)
                .and_then(|i| project.subcatchments[i].groundwater.as_mut());
            match gw {
                Some(gw) => {
                    gw.restore(snapshot);
                    applied += 1;
                }
                None => warn!("hot start names subcatchment {id} which has no groundwater"),
            }
        }
        info!("restored groundwater state for {applied} subcatchment(s)");
        applied
    }

    pub fn to_toml_string(&self) -> Result<String, SimError> {
        Ok(toml::to_string(self)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}
