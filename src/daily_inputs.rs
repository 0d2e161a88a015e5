use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// Series of daily rates; the value for a day is held over the whole day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailySeries(pub Vec<f64>);

impl DailySeries {
    // Value for the current day (floor of time in days). The last value is
    // used once time runs past the end of the series.
    pub fn value(&self, day: f64) -> f64 {
        let i = day.max(0.0).floor() as usize;
        self.0
            .get(i)
            .or_else(|| self.0.last())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        DailySeries(self.0.iter().map(|v| v * factor).collect())
    }
}

// Surface inputs of a subcatchment over its pervious area, rates in ft/s
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceInputs {
    pub infiltration: DailySeries,
    pub surface_evap: DailySeries,
}

// Climate forcing shared by all subcatchments
#[derive(Debug, Clone, PartialEq)]
pub struct Climate {
    pub start: NaiveDateTime,
    pub evaporation: DailySeries, // Potential evaporation [ft/s]
}

impl Climate {
    pub fn datetime(&self, elapsed_secs: f64) -> NaiveDateTime {
        self.start + Duration::milliseconds((elapsed_secs * 1000.0).round() as i64)
    }

    pub fn month(&self, elapsed_secs: f64) -> u32 {
        self.datetime(elapsed_secs).month()
    }

    pub fn evap_rate(&self, elapsed_secs: f64) -> f64 {
        self.evaporation.value(elapsed_secs / 86400.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn daily_value_holds_last_entry() {
        let s = DailySeries(vec![1.0, 2.0, 3.0]);
        assert_eq!(s.value(0.0), 1.0);
        assert_eq!(s.value(1.99), 2.0);
        assert_eq!(s.value(10.0), 3.0);
        assert_eq!(DailySeries::default().value(4.0), 0.0);
    }

    #[test]
    fn climate_month_advances_with_time() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let c = Climate {
            start,
            evaporation: DailySeries(vec![0.0, 1.0]),
        };
        assert_eq!(c.month(0.0), 1);
        assert_eq!(c.month(86400.0), 2);
        assert_eq!(c.evap_rate(90000.0), 1.0);
    }
}
