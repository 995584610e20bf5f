//! EEG-Streaming: live acquisition, alerting and periodic analysis
//!
//! A synthetic multichannel source feeds a rolling buffer through the
//! [`StreamScheduler`], which raises alerts and publishes spectral and
//! integrated results. [`EegStream`] drives the scheduler on tokio.

pub mod alerts;
pub mod buffer;
pub mod config;
pub mod runtime;
pub mod scheduler;
pub mod signal_patterns;
pub mod simulator;

pub use alerts::{Alert, AlertQueue, AlertSeverity, ALERT_CAPACITY};
pub use buffer::StreamBuffer;
pub use config::{IntegratedConfig, Limits, StreamConfig, INTEGRATED_MIN_CHANNELS};
pub use runtime::{start_eeg_stream, EegStream, StreamCommand};
pub use scheduler::{
    ChannelSnapshot, IntegratedReport, SpectralSnapshot, StreamOutput, StreamScheduler,
};
pub use signal_patterns::{ChannelPattern, ChannelPreset};
pub use simulator::{EegSimulator, InjectedAnomaly, Sample, SampleSource, SimulatorConfig};
