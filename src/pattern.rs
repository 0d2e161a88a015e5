use serde::{Deserialize, Serialize};

// Kind of time pattern; only monthly patterns may adjust aquifer evaporation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Monthly, // 12 factors, Jan..Dec
    Daily,   // 7 factors, Sun..Sat
    Hourly,  // 24 factors
    Weekend, // 24 factors
}

impl PatternKind {
    pub fn factor_count(self) -> usize {
        match self {
            PatternKind::Monthly => 12,
            PatternKind::Daily => 7,
            PatternKind::Hourly | PatternKind::Weekend => 24,
        }
    }
}

// A named set of multiplicative adjustment factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePattern {
    pub id: String,
    pub kind: PatternKind,
    #[serde(default)]
    pub factors: Vec<f64>,
}

impl TimePattern {
    pub fn monthly(id: &str, factors: [f64; 12]) -> Self {
        TimePattern {
            id: id.to_string(),
            kind: PatternKind::Monthly,
            factors: factors.to_vec(),
        }
    }

    // Factor for a calendar month (1 = January). Missing factors default to 1.
    pub fn monthly_factor(&self, month: u32) -> f64 {
        if self.kind != PatternKind::Monthly || month == 0 {
            return 1.0;
        }
        self.factors
            .get(month as usize - 1)
            .copied()
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_factor_indexes_from_january() {
        let mut f = [1.0; 12];
        f[0] = 0.5;
        f[11] = 2.0;
        let p = TimePattern::monthly("evap", f);
        assert_eq!(p.monthly_factor(1), 0.5);
        assert_eq!(p.monthly_factor(12), 2.0);
        assert_eq!(p.monthly_factor(6), 1.0);
    }

    #[test]
    fn non_monthly_pattern_is_neutral() {
        let p = TimePattern {
            id: "d".into(),
            kind: PatternKind::Daily,
            factors: vec![3.0; 7],
        };
        assert_eq!(p.monthly_factor(3), 1.0);
        assert_eq!(PatternKind::Daily.factor_count(), 7);
    }
}
