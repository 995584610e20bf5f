//! Streaming scheduler
//!
//! [`StreamScheduler`] owns the sample source, rolling buffer and alert
//! queue of a session and drives two cadences on a single timeline: the
//! per-sample tick and the integrated whole-buffer analysis. It never reads
//! a clock: the host passes the current session time to every call and
//! waits for [`StreamScheduler::next_deadline`] itself (see
//! [`crate::runtime`]).

use crate::alerts::{Alert, AlertQueue, AlertSeverity};
use crate::buffer::StreamBuffer;
use crate::config::{StreamConfig, INTEGRATED_MIN_CHANNELS};
use crate::simulator::{InjectedAnomaly, Sample, SampleSource};
use eeg_core::{config_error, ChannelStats, EegError, EegResult, Recording};
use eeg_processing::{
    transform, Analyzer, DepressionResult, EpilepsyResult, NeurodegenerativeReport,
    ScreeningReport,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-channel view published by the spectral analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Statistics over the whole buffer
    pub statistics: ChannelStats,
    /// Dominant frequency of the trailing spectral window (Hz)
    pub dominant_frequency: f64,
    pub latest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralSnapshot {
    pub session_id: Uuid,
    /// Samples acquired so far in the session
    pub sample_count: u64,
    pub timestamp: Duration,
    pub channels: BTreeMap<String, ChannelSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedReport {
    pub session_id: Uuid,
    pub timestamp: Duration,
    pub buffered_samples: usize,
    pub depression: DepressionResult,
    pub epilepsy: EpilepsyResult,
    pub screening: Option<ScreeningReport>,
    pub neurodegenerative: Option<NeurodegenerativeReport>,
}

/// Result published by the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamOutput {
    Spectral(SpectralSnapshot),
    Integrated(Box<IntegratedReport>),
}

pub type AlertCallback = Box<dyn FnMut(&Alert) + Send>;
pub type ResultCallback = Box<dyn FnMut(&StreamOutput) + Send>;

#[derive(Debug, Clone)]
struct Session {
    id: Uuid,
    sample_count: u64,
    next_tick: Duration,
    last_tick: Option<Duration>,
    started_at: Duration,
    next_integrated: Option<Duration>,
}

#[derive(Debug, Clone)]
enum SessionState {
    Idle,
    Running(Session),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    Sample,
    Integrated,
}

pub struct StreamScheduler {
    config: StreamConfig,
    source: Box<dyn SampleSource>,
    buffer: StreamBuffer,
    alerts: AlertQueue,
    analyzer: Analyzer,
    rng: StdRng,
    state: SessionState,
    alert_callback: Option<AlertCallback>,
    result_callback: Option<ResultCallback>,
}

impl StreamScheduler {
    pub fn new(config: StreamConfig, source: Box<dyn SampleSource>) -> EegResult<Self> {
        Self::check(&config, source.as_ref())?;
        let buffer = StreamBuffer::new(source.channel_names(), config.buffer_size)?;
        Ok(Self {
            analyzer: Analyzer::new(config.analysis.clone(), config.montage.clone()),
            rng: Self::scoring_rng(&config),
            config,
            source,
            buffer,
            alerts: AlertQueue::default(),
            state: SessionState::Idle,
            alert_callback: None,
            result_callback: None,
        })
    }

    fn check(config: &StreamConfig, source: &dyn SampleSource) -> EegResult<()> {
        config.validate()?;
        let names = source.channel_names();
        for channel in &config.channels {
            if !names.contains(channel) {
                return Err(EegError::UnknownChannel {
                    channel: channel.clone(),
                });
            }
        }
        Ok(())
    }

    fn scoring_rng(config: &StreamConfig) -> StdRng {
        let seed = config.simulator.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default()
        });
        StdRng::seed_from_u64(seed)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running(_))
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match &self.state {
            SessionState::Running(session) => Some(session.id),
            SessionState::Idle => None,
        }
    }

    pub fn sample_count(&self) -> u64 {
        match &self.state {
            SessionState::Running(session) => session.sample_count,
            SessionState::Idle => 0,
        }
    }

    /// Register the alert callback, replacing any previous one
    pub fn on_alert(&mut self, callback: impl FnMut(&Alert) + Send + 'static) {
        self.alert_callback = Some(Box::new(callback));
    }

    /// Register the result callback, replacing any previous one
    pub fn on_result(&mut self, callback: impl FnMut(&StreamOutput) + Send + 'static) {
        self.result_callback = Some(Box::new(callback));
    }

    /// Start a new session, stopping the current one first.
    ///
    /// The buffer, alert queue and sample counter start empty and the
    /// first tick is due one interval after `now`.
    pub fn start(&mut self, config: StreamConfig, now: Duration) -> EegResult<Uuid> {
        Self::check(&config, self.source.as_ref())?;
        self.stop();

        self.buffer.set_capacity(config.buffer_size)?;
        self.analyzer = Analyzer::new(config.analysis.clone(), config.montage.clone());
        self.rng = Self::scoring_rng(&config);
        self.source.reset();

        let session = Session {
            id: Uuid::new_v4(),
            sample_count: 0,
            next_tick: now + config.tick_interval(),
            last_tick: None,
            started_at: now,
            next_integrated: config
                .integrated
                .enabled
                .then(|| now + config.integrated_interval()),
        };
        let id = session.id;
        info!(
            "Starting EEG stream {} ({} ms tick, {} sample buffer)",
            id, config.tick_interval_ms, config.buffer_size
        );
        self.config = config;
        self.state = SessionState::Running(session);
        Ok(id)
    }

    /// Stop the session. Cadences are cancelled before state is cleared.
    pub fn stop(&mut self) -> bool {
        let state = std::mem::replace(&mut self.state, SessionState::Idle);
        let SessionState::Running(session) = state else {
            return false;
        };
        self.buffer.clear();
        self.alerts.clear();
        info!(
            "Stopped EEG stream {} after {} samples",
            session.id, session.sample_count
        );
        true
    }

    /// Earliest time at which [`advance`](Self::advance) has work to do
    pub fn next_deadline(&self) -> Option<Duration> {
        let SessionState::Running(session) = &self.state else {
            return None;
        };
        [
            Some(session.next_tick),
            session.next_integrated,
            self.alerts.next_expiry(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn next_due(&self, now: Duration) -> Option<(Cadence, Duration)> {
        let SessionState::Running(session) = &self.state else {
            return None;
        };
        let mut due = None;
        if session.next_tick <= now {
            due = Some((Cadence::Sample, session.next_tick));
        }
        if let Some(at) = session.next_integrated {
            if at <= now && due.map_or(true, |(_, tick)| at < tick) {
                due = Some((Cadence::Integrated, at));
            }
        }
        due
    }

    /// Fire every tick due at or before `now`, in time order, and drop
    /// expired alerts. Returns the number of sample ticks fired.
    pub fn advance(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some((cadence, at)) = self.next_due(now) {
            self.alerts.expire(at);
            match cadence {
                Cadence::Sample => {
                    let interval = self.config.tick_interval();
                    if let SessionState::Running(session) = &mut self.state {
                        session.last_tick = Some(at);
                        session.next_tick = at + interval;
                    }
                    self.sample_tick(at);
                    fired += 1;
                }
                Cadence::Integrated => {
                    let interval = self.config.integrated_interval();
                    if let SessionState::Running(session) = &mut self.state {
                        session.next_integrated = Some(at + interval);
                    }
                    self.integrated_tick(at);
                }
            }
        }
        for alert in self.alerts.expire(now) {
            debug!("Alert {} expired", alert.id);
        }
        fired
    }

    /// Change the sample tick interval. The pending tick is re-timed to one
    /// new interval after the last tick, but never earlier than `now`.
    pub fn set_tick_interval(&mut self, interval_ms: u64, now: Duration) -> EegResult<()> {
        if interval_ms == 0 {
            return Err(config_error!("Tick interval must be positive"));
        }
        self.config.tick_interval_ms = interval_ms;
        let interval = self.config.tick_interval();
        if let SessionState::Running(session) = &mut self.state {
            let anchor = session.last_tick.unwrap_or(session.started_at);
            session.next_tick = (anchor + interval).max(now);
        }
        debug!("Tick interval set to {} ms", interval_ms);
        Ok(())
    }

    pub fn set_buffer_size(&mut self, size: usize) -> EegResult<()> {
        self.buffer.set_capacity(size)?;
        self.config.buffer_size = size;
        Ok(())
    }

    /// Change the integrated interval. When the analysis is armed it fires
    /// once at `now` and re-arms from there.
    pub fn set_integrated_interval(&mut self, interval_ms: u64, now: Duration) -> EegResult<()> {
        if interval_ms == 0 {
            return Err(config_error!("Integrated interval must be positive"));
        }
        self.config.integrated.interval_ms = interval_ms;
        let interval = self.config.integrated_interval();
        let fire = match &mut self.state {
            SessionState::Running(session) if session.next_integrated.is_some() => {
                session.next_integrated = Some(now + interval);
                true
            }
            _ => false,
        };
        if fire {
            self.integrated_tick(now);
        }
        Ok(())
    }

    /// Toggle the integrated analysis. Enabling a running session fires it
    /// once at `now`.
    pub fn set_integrated_enabled(&mut self, enabled: bool, now: Duration) -> EegResult<()> {
        if enabled && self.config.channels.len() < INTEGRATED_MIN_CHANNELS {
            return Err(config_error!(
                "Integrated analysis needs at least {} channels, {} selected",
                INTEGRATED_MIN_CHANNELS,
                self.config.channels.len()
            ));
        }
        let was_enabled = self.config.integrated.enabled;
        self.config.integrated.enabled = enabled;
        let interval = self.config.integrated_interval();

        let fire = match &mut self.state {
            SessionState::Running(session) if enabled => {
                let fire = !was_enabled || session.next_integrated.is_none();
                if fire {
                    session.next_integrated = Some(now + interval);
                }
                fire
            }
            SessionState::Running(session) => {
                session.next_integrated = None;
                false
            }
            SessionState::Idle => false,
        };
        if fire {
            self.integrated_tick(now);
        }
        Ok(())
    }

    /// Remove an alert before it expires
    pub fn dismiss_alert(&mut self, id: u64) -> Option<Alert> {
        self.alerts.remove(id)
    }

    fn raise(&mut self, message: String, severity: AlertSeverity, at: Duration) {
        match severity {
            AlertSeverity::Info => info!("{}", message),
            AlertSeverity::Warning | AlertSeverity::Critical => warn!("{}", message),
        }
        let alert = self.alerts.push(message, severity, at);
        if let Some(callback) = self.alert_callback.as_mut() {
            callback(&alert);
        }
    }

    fn publish(&mut self, output: StreamOutput) {
        if let Some(callback) = self.result_callback.as_mut() {
            callback(&output);
        }
    }

    fn sample_tick(&mut self, at: Duration) {
        let SessionState::Running(session) = &mut self.state else {
            return;
        };
        let index = session.sample_count;
        session.sample_count += 1;
        let count = session.sample_count;
        let session_id = session.id;

        let sample = match self.source.next_sample(index) {
            Ok(sample) => sample,
            Err(e) => {
                self.raise(format!("Sample acquisition error: {}", e), AlertSeverity::Warning, at);
                return;
            }
        };

        if let Some(anomaly) = &sample.anomaly {
            let message = match anomaly {
                InjectedAnomaly::Spike { channel, value } => {
                    format!("Abnormal high amplitude on {} ({:.2})", channel, value)
                }
                InjectedAnomaly::Flatline { channel } => format!("Flat signal on {}", channel),
            };
            self.raise(message, AlertSeverity::Critical, at);
        }

        if let Err(e) = self.buffer.push(&sample) {
            self.raise(format!("Buffer error: {}", e), AlertSeverity::Warning, at);
            return;
        }

        if sample.anomaly.is_none() && count % self.config.anomaly_check_every == 0 {
            self.check_amplitudes(&sample, at);
        }

        if count % self.config.analysis_every == 0 {
            match self.spectral_analysis(session_id, count, at) {
                Ok(snapshot) => self.publish(StreamOutput::Spectral(snapshot)),
                Err(e) => {
                    self.raise(format!("Spectral analysis error: {}", e), AlertSeverity::Warning, at)
                }
            }
        }
    }

    fn check_amplitudes(&mut self, sample: &Sample, at: Duration) {
        let limits = self.config.amplitude_limits;
        let names = self.buffer.channel_names();
        let mut breaches = Vec::new();
        for channel in &self.config.channels {
            let Some(position) = names.iter().position(|n| n == channel) else {
                continue;
            };
            let value = sample.values[position];
            if limits.contains(value) {
                continue;
            }
            if value > limits.max {
                breaches.push(format!(
                    "{} amplitude above upper limit ({:.2} > {:.2})",
                    channel, value, limits.max
                ));
            } else {
                breaches.push(format!(
                    "{} amplitude below lower limit ({:.2} < {:.2})",
                    channel, value, limits.min
                ));
            }
        }
        for message in breaches {
            self.raise(message, AlertSeverity::Warning, at);
        }
    }

    fn spectral_analysis(
        &mut self,
        session_id: Uuid,
        sample_count: u64,
        at: Duration,
    ) -> EegResult<SpectralSnapshot> {
        let limits = self.config.frequency_limits;
        let mut channels = BTreeMap::new();
        let mut breaches = Vec::new();

        for channel in &self.config.channels {
            let history = self.buffer.tail(channel, self.buffer.len())?;
            let window_start = history.len().saturating_sub(self.config.spectral_window);
            let spectrum = transform(&history[window_start..], self.config.sample_rate)?;
            let dominant = spectrum.dominant_frequency();

            if dominant > limits.max {
                breaches.push(format!(
                    "{} dominant frequency above limit ({:.1} Hz > {:.1} Hz)",
                    channel, dominant, limits.max
                ));
            } else if !limits.contains(dominant) && dominant > self.config.low_frequency_floor {
                breaches.push(format!(
                    "{} dominant frequency below limit ({:.1} Hz < {:.1} Hz)",
                    channel, dominant, limits.min
                ));
            }

            channels.insert(
                channel.clone(),
                ChannelSnapshot {
                    statistics: ChannelStats::calculate(&history),
                    dominant_frequency: dominant,
                    latest: history.last().copied().unwrap_or_default(),
                },
            );
        }

        for message in breaches {
            self.raise(message, AlertSeverity::Warning, at);
        }
        Ok(SpectralSnapshot {
            session_id,
            sample_count,
            timestamp: at,
            channels,
        })
    }

    fn integrated_tick(&mut self, at: Duration) {
        let Some(session_id) = self.session_id() else {
            return;
        };
        if self.buffer.is_empty() {
            debug!("Integrated analysis skipped: buffer is empty");
            return;
        }

        let recording = match self.buffer.snapshot(self.config.sample_rate) {
            Ok(recording) => recording,
            Err(e) => {
                self.raise(format!("Integrated analysis error: {}", e), AlertSeverity::Warning, at);
                return;
            }
        };
        let channels = &self.config.channels;

        let primary = clinical_analyses(
            &self.analyzer,
            &recording,
            channels,
            self.config.integrated.screening,
            &mut self.rng,
        );
        let (depression, epilepsy, screening) = match primary {
            Ok(results) => results,
            Err(e) => {
                self.raise(format!("Integrated analysis error: {}", e), AlertSeverity::Warning, at);
                return;
            }
        };

        let neurodegenerative = if self.config.integrated.neurodegenerative {
            match self
                .analyzer
                .analyze_neurodegenerative_features(&recording, channels, &mut self.rng)
            {
                Ok(report) => Some(report),
                Err(e) => {
                    self.raise(
                        format!("Neurodegenerative analysis error: {}", e),
                        AlertSeverity::Warning,
                        at,
                    );
                    None
                }
            }
        } else {
            None
        };

        let report = IntegratedReport {
            session_id,
            timestamp: at,
            buffered_samples: self.buffer.len(),
            depression,
            epilepsy,
            screening,
            neurodegenerative,
        };
        self.publish(StreamOutput::Integrated(Box::new(report)));
        self.raise(
            "Integrated analysis performed".to_string(),
            AlertSeverity::Info,
            at,
        );
    }
}

fn clinical_analyses(
    analyzer: &Analyzer,
    recording: &Recording,
    channels: &[String],
    screening: bool,
    rng: &mut StdRng,
) -> EegResult<(DepressionResult, EpilepsyResult, Option<ScreeningReport>)> {
    let depression = analyzer.analyze_depression_features(recording, channels)?;
    let epilepsy = analyzer.analyze_epilepsy_features(recording, channels)?;
    let screening = if screening {
        Some(analyzer.screen_conditions(recording, channels, rng)?)
    } else {
        None
    };
    Ok((depression, epilepsy, screening))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use eeg_core::invalid_input;
    use std::f64::consts::PI;
    use std::sync::{Arc, Mutex};

    /// Two 10 Hz channels with optional offset, fault and anomaly
    struct ScriptedSource {
        offset: f64,
        fail_at: Option<u64>,
        anomaly_at: Option<u64>,
    }

    impl ScriptedSource {
        fn boxed(offset: f64, fail_at: Option<u64>, anomaly_at: Option<u64>) -> Box<Self> {
            Box::new(Self {
                offset,
                fail_at,
                anomaly_at,
            })
        }
    }

    impl SampleSource for ScriptedSource {
        fn channel_names(&self) -> Vec<String> {
            vec!["Channel1".to_string(), "Channel2".to_string()]
        }

        fn next_sample(&mut self, index: u64) -> EegResult<Sample> {
            if self.fail_at == Some(index) {
                return Err(invalid_input!("sensor dropout"));
            }
            let time = index as f64 / 100.0;
            let base = 0.5 * (2.0 * PI * 10.0 * time).sin() + self.offset;
            let mut values = vec![base, 0.8 * base];
            let anomaly = (self.anomaly_at == Some(index)).then(|| {
                values[0] = 3.0;
                InjectedAnomaly::Spike {
                    channel: "Channel1".to_string(),
                    value: 3.0,
                }
            });
            Ok(Sample {
                time,
                values,
                anomaly,
            })
        }

        fn reset(&mut self) {}
    }

    fn config() -> StreamConfig {
        StreamConfig {
            channels: vec!["Channel1".to_string(), "Channel2".to_string()],
            ..Default::default()
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn scheduler(source: Box<ScriptedSource>) -> StreamScheduler {
        StreamScheduler::new(config(), source).unwrap()
    }

    fn collect_results(scheduler: &mut StreamScheduler) -> Arc<Mutex<Vec<StreamOutput>>> {
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        scheduler.on_result(move |output| sink.lock().unwrap().push(output.clone()));
        results
    }

    #[test]
    fn test_start_then_stop_leaves_clean_state() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, Some(1)));
        scheduler.start(config(), ms(0)).unwrap();
        assert_eq!(scheduler.advance(ms(350)), 3);
        assert_eq!(scheduler.buffer().len(), 3);
        assert_eq!(scheduler.alerts().len(), 1);

        assert!(scheduler.stop());
        assert!(!scheduler.is_running());
        assert!(scheduler.buffer().is_empty());
        assert!(scheduler.alerts().is_empty());
        assert_eq!(scheduler.next_deadline(), None);

        // no late tick revives the stopped session
        assert_eq!(scheduler.advance(ms(10_000)), 0);
        assert!(scheduler.buffer().is_empty());
        assert!(!scheduler.stop());
    }

    #[test]
    fn test_restart_gives_fresh_session() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        let first = scheduler.start(config(), ms(0)).unwrap();
        scheduler.advance(ms(1000));
        assert_eq!(scheduler.sample_count(), 10);

        let second = scheduler.start(config(), ms(1000)).unwrap();
        assert_ne!(first, second);
        assert_eq!(scheduler.session_id(), Some(second));
        assert_eq!(scheduler.sample_count(), 0);
        assert!(scheduler.buffer().is_empty());
        assert_eq!(scheduler.next_deadline(), Some(ms(1100)));
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let mut config = config();
        config.channels.push("Channel7".to_string());
        let result = StreamScheduler::new(config, ScriptedSource::boxed(0.0, None, None));
        assert!(matches!(result, Err(EegError::UnknownChannel { .. })));
    }

    #[test]
    fn test_spectral_snapshot_every_hundred_samples() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        let results = collect_results(&mut scheduler);
        scheduler.start(config(), ms(0)).unwrap();

        scheduler.advance(ms(9_900));
        assert!(results.lock().unwrap().is_empty());

        scheduler.advance(ms(10_000));
        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        let StreamOutput::Spectral(snapshot) = &results[0] else {
            panic!("expected a spectral snapshot");
        };
        assert_eq!(snapshot.sample_count, 100);
        assert_eq!(snapshot.timestamp, ms(10_000));
        let channel = &snapshot.channels["Channel1"];
        assert!((channel.dominant_frequency - 10.0).abs() < 1e-9);
        assert!(channel.statistics.max <= 0.5 + 1e-9);
        assert!(scheduler.alerts().is_empty());
    }

    #[test]
    fn test_dominant_frequency_above_limit() {
        let mut config = config();
        config.frequency_limits = Limits::new(0.0, 8.0);
        let mut scheduler =
            StreamScheduler::new(config.clone(), ScriptedSource::boxed(0.0, None, None)).unwrap();
        scheduler.start(config, ms(0)).unwrap();
        scheduler.advance(ms(10_000));

        let warnings: Vec<_> = scheduler.alerts().iter().collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings
            .iter()
            .all(|a| a.severity == AlertSeverity::Warning && a.message.contains("above limit")));
    }

    #[test]
    fn test_injected_anomaly_raises_critical_alert() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, Some(19)));
        let alerts = Arc::new(Mutex::new(Vec::new()));
        let sink = alerts.clone();
        scheduler.on_alert(move |alert| sink.lock().unwrap().push(alert.clone()));
        scheduler.start(config(), ms(0)).unwrap();

        // sample 20 is anomalous, so its amplitude check is skipped
        scheduler.advance(ms(2_000));
        let alerts = alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert!(alerts[0].message.contains("Channel1"));
        assert_eq!(alerts[0].expires_at, Some(ms(12_000)));
    }

    #[test]
    fn test_amplitude_checks_and_queue_cap() {
        let mut scheduler = scheduler(ScriptedSource::boxed(5.0, None, None));
        scheduler.start(config(), ms(0)).unwrap();

        scheduler.advance(ms(1_900));
        assert!(scheduler.alerts().is_empty());

        scheduler.advance(ms(2_000));
        assert_eq!(scheduler.alerts().len(), 2);
        assert!(scheduler
            .alerts()
            .iter()
            .all(|a| a.message.contains("above upper limit")));

        scheduler.advance(ms(8_000));
        assert_eq!(scheduler.alerts().len(), 5);
        // warnings persist
        scheduler.advance(ms(60_000));
        assert_eq!(scheduler.alerts().len(), 5);
    }

    #[test]
    fn test_fault_yields_one_warning_and_ticks_continue() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, Some(2), None));
        scheduler.start(config(), ms(0)).unwrap();
        assert_eq!(scheduler.advance(ms(500)), 5);

        assert_eq!(scheduler.sample_count(), 5);
        assert_eq!(scheduler.buffer().len(), 4);
        let alerts: Vec<_> = scheduler.alerts().iter().collect();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert!(alerts[0].message.contains("sensor dropout"));
    }

    #[test]
    fn test_tick_interval_change_neither_drops_nor_duplicates() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        scheduler.start(config(), ms(0)).unwrap();
        assert_eq!(scheduler.advance(ms(250)), 2);

        // shorter: due at 200 + 50, exactly now
        scheduler.set_tick_interval(50, ms(250)).unwrap();
        assert_eq!(scheduler.next_deadline(), Some(ms(250)));
        assert_eq!(scheduler.advance(ms(250)), 1);
        assert_eq!(scheduler.advance(ms(250)), 0);
        assert_eq!(scheduler.advance(ms(300)), 1);

        // longer: due one new interval after the last tick
        scheduler.set_tick_interval(1_000, ms(320)).unwrap();
        assert_eq!(scheduler.next_deadline(), Some(ms(1_300)));
        assert_eq!(scheduler.advance(ms(1_299)), 0);
        assert_eq!(scheduler.advance(ms(1_300)), 1);
        assert_eq!(scheduler.sample_count(), 5);

        // shorter again, but the anchor is already in the past
        scheduler.set_tick_interval(100, ms(2_000)).unwrap();
        assert_eq!(scheduler.next_deadline(), Some(ms(2_000)));
        assert_eq!(scheduler.advance(ms(2_000)), 1);
        assert_eq!(scheduler.sample_count(), 6);
    }

    #[test]
    fn test_set_buffer_size_trims() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        scheduler.start(config(), ms(0)).unwrap();
        scheduler.advance(ms(3_000));
        assert_eq!(scheduler.buffer().len(), 30);

        scheduler.set_buffer_size(10).unwrap();
        assert_eq!(scheduler.buffer().len(), 10);
        scheduler.advance(ms(4_000));
        assert_eq!(scheduler.buffer().len(), 10);
        assert!(scheduler.set_buffer_size(0).is_err());
    }

    #[test]
    fn test_integrated_analysis() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        let results = collect_results(&mut scheduler);
        scheduler.start(config(), ms(0)).unwrap();

        // enabling with an empty buffer fires once and is skipped
        scheduler.set_integrated_enabled(true, ms(0)).unwrap();
        assert!(results.lock().unwrap().is_empty());

        scheduler.advance(ms(3_000));
        scheduler.set_integrated_enabled(false, ms(3_000)).unwrap();
        scheduler.advance(ms(6_000));
        assert!(results.lock().unwrap().is_empty());

        scheduler.set_integrated_enabled(true, ms(6_000)).unwrap();
        {
            let results = results.lock().unwrap();
            assert_eq!(results.len(), 1);
            let StreamOutput::Integrated(report) = &results[0] else {
                panic!("expected an integrated report");
            };
            assert_eq!(report.buffered_samples, 60);
            assert!(report.screening.is_some());
            assert!(report.neurodegenerative.is_some());
            assert_eq!(report.epilepsy.channels.len(), 2);
        }
        assert!(scheduler
            .alerts()
            .iter()
            .any(|a| a.severity == AlertSeverity::Info));

        // an interval change fires at once and re-arms from there
        scheduler.set_integrated_interval(1_000, ms(6_500)).unwrap();
        assert_eq!(results.lock().unwrap().len(), 2);
        scheduler.advance(ms(7_499));
        assert_eq!(results.lock().unwrap().len(), 2);
        scheduler.advance(ms(7_500));
        let integrated = results
            .lock()
            .unwrap()
            .iter()
            .filter(|o| matches!(o, StreamOutput::Integrated(_)))
            .count();
        assert_eq!(integrated, 3);
    }

    #[test]
    fn test_interval_change_while_disabled_does_not_fire() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        let results = collect_results(&mut scheduler);
        scheduler.start(config(), ms(0)).unwrap();
        scheduler.advance(ms(1_000));

        scheduler.set_integrated_interval(2_000, ms(1_000)).unwrap();
        assert!(results.lock().unwrap().is_empty());
        assert_eq!(scheduler.config().integrated.interval_ms, 2_000);
        assert!(scheduler.set_integrated_interval(0, ms(1_000)).is_err());
    }

    #[test]
    fn test_integrated_needs_two_channels() {
        let mut single = config();
        single.channels.truncate(1);
        let mut scheduler =
            StreamScheduler::new(single.clone(), ScriptedSource::boxed(0.0, None, None)).unwrap();
        scheduler.start(single.clone(), ms(0)).unwrap();
        scheduler.advance(ms(1_000));

        assert!(matches!(
            scheduler.set_integrated_enabled(true, ms(1_000)),
            Err(EegError::ConfigurationError { .. })
        ));
        assert!(!scheduler.config().integrated.enabled);
        assert!(scheduler.alerts().is_empty());

        single.integrated.enabled = true;
        assert!(scheduler.start(single, ms(1_000)).is_err());
    }

    #[test]
    fn test_amplitude_below_lower_limit() {
        let mut scheduler = scheduler(ScriptedSource::boxed(-5.0, None, None));
        scheduler.start(config(), ms(0)).unwrap();
        scheduler.advance(ms(2_000));

        assert_eq!(scheduler.alerts().len(), 2);
        assert!(scheduler
            .alerts()
            .iter()
            .all(|a| a.message.contains("below lower limit")));
    }

    #[test]
    fn test_info_alert_expires() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, None));
        scheduler.start(config(), ms(0)).unwrap();
        scheduler.advance(ms(1_000));
        scheduler.set_integrated_enabled(true, ms(1_000)).unwrap();
        assert_eq!(scheduler.alerts().len(), 1);
        assert_eq!(scheduler.next_deadline(), Some(ms(1_100)));

        scheduler.set_integrated_enabled(false, ms(1_000)).unwrap();
        scheduler.advance(ms(6_000));
        assert!(scheduler.alerts().is_empty());
    }

    #[test]
    fn test_dismissed_alert_does_not_expire_later() {
        let mut scheduler = scheduler(ScriptedSource::boxed(0.0, None, Some(0)));
        scheduler.start(config(), ms(0)).unwrap();
        scheduler.advance(ms(100));
        let id = scheduler.alerts().iter().next().map(|a| a.id).unwrap();
        assert!(scheduler.dismiss_alert(id).is_some());
        assert_eq!(scheduler.next_deadline(), Some(ms(200)));
        assert!(scheduler.dismiss_alert(id).is_none());
    }
}
