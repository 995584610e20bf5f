//! EEG-Processing: spectral feature extraction and condition scoring
//!
//! Direct frequency transform, band aggregation, biomarkers, feature sets,
//! rule-based scorers and the one-shot analysis facade.

pub mod analysis;
pub mod bands;
pub mod biomarkers;
pub mod config;
pub mod features;
pub mod scoring;
pub mod spectrum;

pub use analysis::{
    AnalysisKind, Analyzer, BatchResult, DepressionResult, EpilepsyResult, Laterality, RatioLevel,
};
pub use bands::{band_power, band_powers, channel_band_powers};
pub use biomarkers::{HfoResult, PairCoherence, Spike};
pub use config::{AnalysisConfig, DepressionThresholds, EpilepsyThresholds};
pub use features::{EegFeatures, FeatureExtractor, NeuroFeatures};
pub use scoring::{ConditionScore, Marker, NeurodegenerativeReport, ScreeningReport, Severity};
pub use spectrum::{transform, Spectrum};
