//! A/B test results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Running,
    Completed,
}

impl FromStr for ExperimentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(ExperimentStatus::Running),
            "completed" => Ok(ExperimentStatus::Completed),
            _ => Err(format!("Invalid experiment status: {}", s)),
        }
    }
}

/// Rates observed for one variant, in percent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub name: String,
    pub opens: u32,
    pub clicks: u32,
    pub conversions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub status: ExperimentStatus,
    pub started_on: NaiveDate,
    pub duration_days: u32,
    pub results: Vec<Variant>,
}

impl Experiment {
    /// Variant with the most conversions; a later variant wins a tie
    pub fn leader(&self) -> Option<&Variant> {
        self.results
            .iter()
            .reduce(|best, v| if best.conversions > v.conversions { best } else { v })
    }

    /// Declared winner, only once the test has completed
    pub fn winner(&self) -> Option<&Variant> {
        match self.status {
            ExperimentStatus::Completed => self.leader(),
            ExperimentStatus::Running => None,
        }
    }

    /// Relative conversion lift of the leader over the best other variant, in percent
    pub fn lift(&self) -> Option<f64> {
        let leader = self.leader()?;
        let runner_up = self
            .results
            .iter()
            .filter(|v| !std::ptr::eq(*v, leader))
            .map(|v| v.conversions)
            .max()?;
        if runner_up == 0 {
            return None;
        }
        Some((leader.conversions as f64 - runner_up as f64) / runner_up as f64 * 100.0)
    }
}

/// Experiment plus its derived figures, as served to dashboards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentSummary {
    #[serde(flatten)]
    pub experiment: Experiment,
    pub variants: usize,
    pub leader: Option<String>,
    pub winner: Option<String>,
    pub lift: Option<f64>,
}

impl From<Experiment> for ExperimentSummary {
    fn from(experiment: Experiment) -> Self {
        Self {
            variants: experiment.results.len(),
            leader: experiment.leader().map(|v| v.name.clone()),
            winner: experiment.winner().map(|v| v.name.clone()),
            lift: experiment.lift().map(|l| (l * 10.0).round() / 10.0),
            experiment,
        }
    }
}

fn variant(name: &str, opens: u32, clicks: u32, conversions: u32) -> Variant {
    Variant {
        name: name.to_string(),
        opens,
        clicks,
        conversions,
    }
}

fn experiment(
    id: &str,
    name: &str,
    status: ExperimentStatus,
    started_on: (i32, u32, u32),
    duration_days: u32,
    results: Vec<Variant>,
) -> Experiment {
    let (y, m, d) = started_on;
    Experiment {
        id: id.to_string(),
        name: name.to_string(),
        status,
        started_on: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        duration_days,
        results,
    }
}

pub fn experiments() -> Vec<Experiment> {
    vec![
        experiment(
            "1",
            "Subject Line Test",
            ExperimentStatus::Running,
            (2023, 5, 5),
            14,
            vec![variant("Variant A", 38, 12, 8), variant("Variant B", 42, 15, 11)],
        ),
        experiment(
            "2",
            "Discount Amount Test",
            ExperimentStatus::Completed,
            (2023, 4, 1),
            30,
            vec![variant("10% off", 40, 14, 9), variant("Free shipping", 43, 18, 12)],
        ),
        experiment(
            "3",
            "Send Time Test",
            ExperimentStatus::Running,
            (2023, 4, 28),
            21,
            vec![
                variant("Morning", 36, 10, 7),
                variant("Afternoon", 41, 14, 10),
                variant("Evening", 39, 12, 8),
            ],
        ),
    ]
}

/// Experiments, optionally narrowed to one status
pub fn list_experiments(status: Option<ExperimentStatus>) -> Vec<ExperimentSummary> {
    experiments()
        .into_iter()
        .filter(|e| status.map_or(true, |s| e.status == s))
        .map(ExperimentSummary::from)
        .collect()
}
