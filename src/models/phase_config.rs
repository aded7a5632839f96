// Tagged phase configuration payloads
use super::dataset::DataCollectionConfig;
use super::evaluation::EvaluationConfig;
use super::modeling::ModelingConfig;
use super::optimization::OptimizationConfig;
use super::phase::PhaseType;
use super::production::ProductionConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form payload for phases without a dedicated schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GenericPhaseConfig {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "phaseType", rename_all = "snake_case")]
pub enum PhaseConfig {
    ProblemUnderstanding(GenericPhaseConfig),
    DataCollection(DataCollectionConfig),
    Modeling(ModelingConfig),
    Optimization(OptimizationConfig),
    Realtime(GenericPhaseConfig),
    Evaluation(EvaluationConfig),
    Production(ProductionConfig),
}

impl PhaseConfig {
    /// Empty payload of the right shape for a phase type.
    pub fn empty(phase_type: PhaseType) -> Self {
        match phase_type {
            PhaseType::ProblemUnderstanding => {
                PhaseConfig::ProblemUnderstanding(GenericPhaseConfig::default())
            }
            PhaseType::DataCollection => PhaseConfig::DataCollection(DataCollectionConfig::default()),
            PhaseType::Modeling => PhaseConfig::Modeling(ModelingConfig::default()),
            PhaseType::Optimization => PhaseConfig::Optimization(OptimizationConfig::default()),
            PhaseType::Realtime => PhaseConfig::Realtime(GenericPhaseConfig::default()),
            PhaseType::Evaluation => PhaseConfig::Evaluation(EvaluationConfig::default()),
            PhaseType::Production => PhaseConfig::Production(ProductionConfig::default()),
        }
    }

    pub fn phase_type(&self) -> PhaseType {
        match self {
            PhaseConfig::ProblemUnderstanding(_) => PhaseType::ProblemUnderstanding,
            PhaseConfig::DataCollection(_) => PhaseType::DataCollection,
            PhaseConfig::Modeling(_) => PhaseType::Modeling,
            PhaseConfig::Optimization(_) => PhaseType::Optimization,
            PhaseConfig::Realtime(_) => PhaseType::Realtime,
            PhaseConfig::Evaluation(_) => PhaseType::Evaluation,
            PhaseConfig::Production(_) => PhaseType::Production,
        }
    }
}

/// Typed access to one variant of `PhaseConfig`.
pub trait PhasePayload: Sized {
    const PHASE_TYPE: PhaseType;

    fn from_config(config: &PhaseConfig) -> Option<&Self>;
    fn from_config_mut(config: &mut PhaseConfig) -> Option<&mut Self>;
}

macro_rules! phase_payload {
    ($payload:ty, $variant:ident, $phase_type:expr) => {
        impl PhasePayload for $payload {
            const PHASE_TYPE: PhaseType = $phase_type;

            fn from_config(config: &PhaseConfig) -> Option<&Self> {
                match config {
                    PhaseConfig::$variant(c) => Some(c),
                    _ => None,
                }
            }

            fn from_config_mut(config: &mut PhaseConfig) -> Option<&mut Self> {
                match config {
                    PhaseConfig::$variant(c) => Some(c),
                    _ => None,
                }
            }
        }
    };
}

phase_payload!(DataCollectionConfig, DataCollection, PhaseType::DataCollection);
phase_payload!(ModelingConfig, Modeling, PhaseType::Modeling);
phase_payload!(EvaluationConfig, Evaluation, PhaseType::Evaluation);
phase_payload!(ProductionConfig, Production, PhaseType::Production);
phase_payload!(OptimizationConfig, Optimization, PhaseType::Optimization);
