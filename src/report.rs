// src/report.rs
//! Advisory text and rendering of assessment results.

use itertools::Itertools;
use serde::Serialize;

use crate::processing::estimator::{AssessmentResult, RiskLevel};

/// Fixed decision-support text for one risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub headline: &'static str,
    pub actions: &'static [&'static str],
}

const HIGH_ADVISORY: Advisory = Advisory {
    headline: "HIGH GLOF RISK",
    actions: &[
        "Prepare downstream evacuation",
        "Move livestock to higher ground",
        "Restrict river-side activities",
    ],
};

const MEDIUM_ADVISORY: Advisory = Advisory {
    headline: "MEDIUM GLOF RISK",
    actions: &["Increase monitoring", "Alert local authorities"],
};

const LOW_ADVISORY: Advisory = Advisory {
    headline: "LOW RISK",
    actions: &["Normal monitoring recommended"],
};

pub fn advisory(risk: RiskLevel) -> Advisory {
    match risk {
        RiskLevel::High => HIGH_ADVISORY,
        RiskLevel::Medium => MEDIUM_ADVISORY,
        RiskLevel::Low => LOW_ADVISORY,
    }
}

/// Flat, serialisable view of one assessment
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub lake: Option<String>,
    pub area_t1_km2: f64,
    pub area_t2_km2: f64,
    pub change_pct: f64,
    pub pixels_t1: usize,
    pub pixels_t2: usize,
    pub risk_level: RiskLevel,
    pub advisory: Advisory,
}

impl Report {
    pub fn new(lake: Option<String>, result: &AssessmentResult) -> Self {
        Self {
            lake,
            area_t1_km2: result.area_t1_km2,
            area_t2_km2: result.area_t2_km2,
            change_pct: result.change_pct,
            pixels_t1: result.pixels_t1,
            pixels_t2: result.pixels_t2,
            risk_level: result.risk_level,
            advisory: advisory(result.risk_level),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(lake) = &self.lake {
            out.push_str(&format!("Lake: {lake}\n"));
        }
        out.push_str(&format!("Lake Area T1 (km²): {:.3}\n", self.area_t1_km2));
        out.push_str(&format!("Lake Area T2 (km²): {:.3}\n", self.area_t2_km2));
        out.push_str(&format!("Change (%): {:.2}\n", self.change_pct));
        out.push_str(&format!("Risk: {}\n\n", self.risk_level));
        out.push_str(self.advisory.headline);
        out.push('\n');
        out.push_str(
            &self
                .advisory
                .actions
                .iter()
                .map(|action| format!("  • {action}"))
                .join("\n"),
        );
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(change_pct: f64, risk_level: RiskLevel) -> AssessmentResult {
        AssessmentResult {
            pixels_t1: 1000,
            pixels_t2: 1080,
            area_t1_km2: 0.1,
            area_t2_km2: 0.108,
            change_pct,
            risk_level,
        }
    }

    #[test]
    fn high_risk_lists_evacuation_steps() {
        let text = Report::new(Some("Chamoli".into()), &result(8.0, RiskLevel::High)).render_text();
        assert!(text.contains("Lake: Chamoli"));
        assert!(text.contains("Lake Area T1 (km²): 0.100"));
        assert!(text.contains("Lake Area T2 (km²): 0.108"));
        assert!(text.contains("Change (%): 8.00"));
        assert!(text.contains("HIGH GLOF RISK"));
        assert!(text.contains("Prepare downstream evacuation"));
        assert!(text.contains("Move livestock to higher ground"));
        assert!(text.contains("Restrict river-side activities"));
    }

    #[test]
    fn each_level_has_its_own_advisory() {
        assert_eq!(advisory(RiskLevel::Medium).actions.len(), 2);
        assert_eq!(advisory(RiskLevel::Low).headline, "LOW RISK");
        assert_ne!(advisory(RiskLevel::High), advisory(RiskLevel::Medium));
    }

    #[test]
    fn json_uses_uppercase_risk() {
        let json = Report::new(None, &result(5.0, RiskLevel::Medium)).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["risk_level"], "MEDIUM");
        assert_eq!(value["advisory"]["headline"], "MEDIUM GLOF RISK");
        assert_eq!(value["pixels_t2"], 1080);
        assert!(value["lake"].is_null());
    }
}
