// Process and phase data models
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow stage a phase belongs to. At most one phase per type exists in a process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PhaseType {
    ProblemUnderstanding,
    DataCollection,
    Modeling,
    Optimization,
    Realtime,
    Evaluation,
    Production,
}

impl PhaseType {
    pub const ALL: [PhaseType; 7] = [
        PhaseType::ProblemUnderstanding,
        PhaseType::DataCollection,
        PhaseType::Modeling,
        PhaseType::Optimization,
        PhaseType::Realtime,
        PhaseType::Evaluation,
        PhaseType::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseType::ProblemUnderstanding => "problem_understanding",
            PhaseType::DataCollection => "data_collection",
            PhaseType::Modeling => "modeling",
            PhaseType::Optimization => "optimization",
            PhaseType::Realtime => "realtime",
            PhaseType::Evaluation => "evaluation",
            PhaseType::Production => "production",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PhaseType::ProblemUnderstanding => "Problem Understanding",
            PhaseType::DataCollection => "Data Collection",
            PhaseType::Modeling => "Modeling",
            PhaseType::Optimization => "Optimization",
            PhaseType::Realtime => "Realtime",
            PhaseType::Evaluation => "Evaluation",
            PhaseType::Production => "Production",
        }
    }
}

impl fmt::Display for PhaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown phase type: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
    pub enabled: bool,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub status: PhaseStatus,
}

/// A named unit of project work. `previous_process_id` only orders processes for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub previous_process_id: Option<String>,
    pub phases: Vec<Phase>,
}

impl Process {
    pub fn phase(&self, phase_type: PhaseType) -> Option<&Phase> {
        self.phases.iter().find(|p| p.phase_type == phase_type)
    }

    /// Returns the first phase type that appears more than once, if any.
    pub fn duplicate_phase_type(&self) -> Option<PhaseType> {
        let mut seen = Vec::with_capacity(self.phases.len());
        for phase in &self.phases {
            if seen.contains(&phase.phase_type) {
                return Some(phase.phase_type);
            }
            seen.push(phase.phase_type);
        }
        None
    }
}
