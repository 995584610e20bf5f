//! Async session driver for live EEG monitoring

use crate::alerts::Alert;
use crate::config::StreamConfig;
use crate::scheduler::{StreamOutput, StreamScheduler};
use crate::simulator::{EegSimulator, SampleSource};
use eeg_core::EegResult;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{error, info, warn};

/// Commands for controlling the stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamCommand {
    Start,
    Stop,
    SetTickInterval(u64),
    SetBufferSize(usize),
    SetIntegratedInterval(u64),
    SetIntegratedEnabled(bool),
    DismissAlert(u64),
    Shutdown,
}

/// Drives a [`StreamScheduler`] against the tokio clock
pub struct EegStream {
    scheduler: Arc<Mutex<StreamScheduler>>,
    alert_sender: broadcast::Sender<Alert>,
    output_sender: broadcast::Sender<StreamOutput>,
    control_receiver: mpsc::Receiver<StreamCommand>,
    control_sender: mpsc::Sender<StreamCommand>,
    origin: Instant,
}

impl EegStream {
    /// Create a stream fed by the EEG simulator
    pub fn new(config: StreamConfig) -> EegResult<Self> {
        let simulator = EegSimulator::new(config.simulator.clone())?;
        Self::with_source(config, Box::new(simulator))
    }

    pub fn with_source(config: StreamConfig, source: Box<dyn SampleSource>) -> EegResult<Self> {
        let mut scheduler = StreamScheduler::new(config, source)?;
        let (alert_sender, _) = broadcast::channel(64);
        let (output_sender, _) = broadcast::channel(64);
        let (control_sender, control_receiver) = mpsc::channel(32);

        let alerts = alert_sender.clone();
        scheduler.on_alert(move |alert| {
            // no subscribers is fine
            let _ = alerts.send(alert.clone());
        });
        let outputs = output_sender.clone();
        scheduler.on_result(move |output| {
            let _ = outputs.send(output.clone());
        });

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            alert_sender,
            output_sender,
            control_receiver,
            control_sender,
            origin: Instant::now(),
        })
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_sender.subscribe()
    }

    pub fn subscribe_results(&self) -> broadcast::Receiver<StreamOutput> {
        self.output_sender.subscribe()
    }

    /// Get control sender for sending commands
    pub fn control_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.control_sender.clone()
    }

    /// Shared handle to the scheduler
    pub fn scheduler(&self) -> Arc<Mutex<StreamScheduler>> {
        self.scheduler.clone()
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Run until [`StreamCommand::Shutdown`]
    pub async fn run(&mut self) -> EegResult<()> {
        info!("EEG stream driver started");

        loop {
            let deadline = self.scheduler.lock().await.next_deadline();
            let origin = self.origin;
            let wake = async move {
                match deadline {
                    Some(at) => sleep_until(origin + at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = wake => {
                    let started = Instant::now();
                    let (fired, tick) = {
                        let mut scheduler = self.scheduler.lock().await;
                        let fired = scheduler.advance(self.now());
                        (fired, scheduler.config().tick_interval())
                    };

                    let elapsed = started.elapsed();
                    if fired > 0 && elapsed > tick {
                        warn!(
                            "Tick processing took {:.1}ms, longer than the {}ms interval",
                            elapsed.as_secs_f64() * 1000.0,
                            tick.as_millis()
                        );
                    }
                }

                command = self.control_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Shutdown) | None => {
                            self.scheduler.lock().await.stop();
                            info!("EEG stream driver shut down");
                            break;
                        }
                        Some(command) => self.handle(command).await,
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle(&mut self, command: StreamCommand) {
        let now = self.now();
        let mut scheduler = self.scheduler.lock().await;

        let result = match command {
            StreamCommand::Start => {
                let config = scheduler.config().clone();
                scheduler.start(config, now).map(|_| ())
            }
            StreamCommand::Stop => {
                scheduler.stop();
                Ok(())
            }
            StreamCommand::SetTickInterval(ms) => scheduler.set_tick_interval(ms, now),
            StreamCommand::SetBufferSize(size) => scheduler.set_buffer_size(size),
            StreamCommand::SetIntegratedInterval(ms) => scheduler.set_integrated_interval(ms, now),
            StreamCommand::SetIntegratedEnabled(enabled) => {
                scheduler.set_integrated_enabled(enabled, now)
            }
            StreamCommand::DismissAlert(id) => {
                scheduler.dismiss_alert(id);
                Ok(())
            }
            StreamCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            warn!("Stream command rejected: {}", e);
        }
    }
}

/// Helper function to create and start a simulated stream in the background
pub async fn start_eeg_stream(
    config: StreamConfig,
) -> EegResult<(
    broadcast::Receiver<Alert>,
    broadcast::Receiver<StreamOutput>,
    mpsc::Sender<StreamCommand>,
)> {
    let mut stream = EegStream::new(config)?;
    let alerts = stream.subscribe_alerts();
    let results = stream.subscribe_results();
    let control = stream.control_handle();

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            error!("EEG stream error: {}", e);
        }
    });

    Ok((alerts, results, control))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertSeverity;
    use tokio::time::sleep;

    fn quiet_config() -> StreamConfig {
        let mut config = StreamConfig::default();
        config.simulator.anomaly_probability = 0.0;
        config.simulator.seed = Some(7);
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_spectral_results_streamed() {
        let (_alerts, mut results, control) = start_eeg_stream(quiet_config()).await.unwrap();
        control.send(StreamCommand::Start).await.unwrap();

        sleep(Duration::from_millis(10_050)).await;

        let output = results.try_recv().unwrap();
        let StreamOutput::Spectral(snapshot) = output else {
            panic!("expected a spectral snapshot");
        };
        assert_eq!(snapshot.sample_count, 100);
        assert_eq!(snapshot.channels.len(), 4);
        assert!((snapshot.channels["Channel1"].dominant_frequency - 10.0).abs() < 1e-9);
        assert!(results.try_recv().is_err());

        control.send(StreamCommand::Shutdown).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_session() {
        let mut stream = EegStream::new(quiet_config()).unwrap();
        let scheduler = stream.scheduler();
        let control = stream.control_handle();
        let handle = tokio::spawn(async move { stream.run().await });

        control.send(StreamCommand::Start).await.unwrap();
        sleep(Duration::from_millis(550)).await;
        assert_eq!(scheduler.lock().await.buffer().len(), 5);

        control.send(StreamCommand::Stop).await.unwrap();
        sleep(Duration::from_millis(10)).await;
        {
            let scheduler = scheduler.lock().await;
            assert!(!scheduler.is_running());
            assert!(scheduler.buffer().is_empty());
        }

        sleep(Duration::from_millis(1_000)).await;
        assert!(scheduler.lock().await.buffer().is_empty());

        control.send(StreamCommand::Shutdown).await.unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_retime_session() {
        let mut stream = EegStream::new(quiet_config()).unwrap();
        let scheduler = stream.scheduler();
        let control = stream.control_handle();
        let mut alerts = stream.subscribe_alerts();
        tokio::spawn(async move { stream.run().await });

        control.send(StreamCommand::Start).await.unwrap();
        control.send(StreamCommand::SetTickInterval(10)).await.unwrap();
        control.send(StreamCommand::SetBufferSize(50)).await.unwrap();
        sleep(Duration::from_millis(1_005)).await;
        {
            let scheduler = scheduler.lock().await;
            assert_eq!(scheduler.sample_count(), 100);
            assert_eq!(scheduler.buffer().len(), 50);
        }

        control.send(StreamCommand::SetIntegratedEnabled(true)).await.unwrap();
        sleep(Duration::from_millis(1)).await;
        let alert = alerts.try_recv().unwrap();
        assert_eq!(alert.severity, AlertSeverity::Info);

        // invalid commands are rejected without stopping the driver
        control.send(StreamCommand::SetBufferSize(0)).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        assert!(scheduler.lock().await.is_running());

        control.send(StreamCommand::Shutdown).await.unwrap();
    }
}
