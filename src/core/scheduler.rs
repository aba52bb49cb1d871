//! Fixed-interval transmission loop.
//!
//! A run owns one background worker. Every tick the worker reads the clock,
//! samples the GPU, passes each digit through the [`ResyncTracker`] and sends
//! what the tracker lets through, then posts the chat message if one is set.
//! The run flag is only checked at the top of a tick and after the sleep, so
//! a tick that has started always finishes.

use super::gpu::GpuProvider;
use super::params::{AvatarParameter, DigitFrame, GpuSample, CHATBOX_INPUT_ADDRESS};
use super::tracker::{sync_count_for, ResyncTracker};
use crate::error::{Result, WatchError};
use crate::osc::{OscArg, OscSender};
use chrono::{Local, NaiveDateTime, Timelike};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;

/// Endpoint and timing for one run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub host: String,
    pub port: u16,
    pub interval_secs: f64,
    /// Unchanged values are resent at least this often
    pub sync_interval_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            interval_secs: DEFAULT_INTERVAL_SECS,
            sync_interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl SchedulerConfig {
    /// Validate already-typed values. The sync interval defaults to the tick interval.
    pub fn new<S: Into<String>>(host: S, port: u16, interval_secs: f64) -> Result<Self> {
        let config = Self {
            host: host.into(),
            port,
            interval_secs,
            sync_interval_secs: interval_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate raw user input, as typed into the console or passed on the command line.
    pub fn parse(
        host: &str,
        port: &str,
        interval: &str,
        sync_interval: Option<&str>,
    ) -> Result<Self> {
        let port: u16 = port.trim().parse().map_err(|_| {
            WatchError::config(format!(
                "Port must be an integer in 1-65535, got '{}'",
                port.trim()
            ))
        })?;

        let interval_secs = parse_seconds("Interval", interval)?;
        let mut config = Self::new(host.trim(), port, interval_secs)?;

        if let Some(sync) = sync_interval {
            config.sync_interval_secs = parse_seconds("Sync interval", sync)?;
        }

        Ok(config)
    }

    pub fn with_sync_interval(mut self, sync_interval_secs: f64) -> Result<Self> {
        self.sync_interval_secs = sync_interval_secs;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(WatchError::config("Host must not be empty"));
        }
        if self.port == 0 {
            return Err(WatchError::config("Port must be a positive integer"));
        }
        check_seconds("Interval", self.interval_secs)?;
        check_seconds("Sync interval", self.sync_interval_secs)?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    /// Ticks between forced resends of an unchanged value
    pub fn sync_count(&self) -> u32 {
        sync_count_for(self.sync_interval_secs, self.interval_secs)
    }
}

fn parse_seconds(label: &str, raw: &str) -> Result<f64> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        WatchError::config(format!(
            "{} must be a number of seconds, got '{}'",
            label,
            raw.trim()
        ))
    })?;
    check_seconds(label, secs)?;
    Ok(secs)
}

fn check_seconds(label: &str, secs: f64) -> Result<()> {
    // Upper bound keeps Duration::from_secs_f64 from panicking
    if !secs.is_finite() || secs <= 0.0 || secs > u32::MAX as f64 {
        return Err(WatchError::config(format!(
            "{} must be a positive number of seconds, got {}",
            label, secs
        )));
    }
    Ok(())
}

/// Source of wall-clock time
pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}

/// The machine's local time
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub sent: Vec<(AvatarParameter, u32)>,
    pub gpu: GpuSample,
    pub chat_sent: bool,
}

/// Collaborators a run needs, injected so the loop can be driven in tests.
pub struct TickSources {
    pub clock: Box<dyn Clock>,
    pub gpu: Box<dyn GpuProvider>,
    pub sender: Box<dyn OscSender>,
}

/// One tick's worth of work, without threads or sleeping.
pub struct TickEngine {
    tracker: ResyncTracker,
    sources: TickSources,
}

impl TickEngine {
    pub fn new(sync_count: u32, sources: TickSources) -> Self {
        Self {
            tracker: ResyncTracker::new(sync_count),
            sources,
        }
    }

    pub fn tracker(&self) -> &ResyncTracker {
        &self.tracker
    }

    /// Run one tick.
    ///
    /// `chat` is `None` when chat is disabled. Only a fatal GPU error is
    /// returned; it aborts the tick before anything is sent.
    pub fn tick(&mut self, chat: Option<&str>) -> Result<TickReport> {
        let now = self.sources.clock.now();

        let gpu = match self.sources.gpu.sample() {
            Ok(sample) => GpuSample::clamped(sample.usage_percent, sample.memory_percent),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("GPU sample failed, sending 0%: {}", e);
                GpuSample::zero()
            }
        };

        let frame = DigitFrame::new(now.hour(), now.minute(), gpu);
        let mut report = TickReport {
            gpu,
            ..Default::default()
        };

        log::info!("Sent: {}", now.format("%Y-%m-%d %H:%M:%S"));
        log::info!("gpu:{}% vram:{}%", gpu.usage_percent, gpu.memory_percent);

        for (param, value) in frame.iter() {
            if !self.tracker.observe(param, value) {
                continue;
            }

            let args = [OscArg::Int(value as i32)];
            match self.sources.sender.send(param.address(), &args) {
                Ok(()) => log::info!(
                    "Param: {}, Address:{} Value: {}",
                    param,
                    param.address(),
                    value
                ),
                Err(e) => log::error!("Failed to send {}: {}", param, e),
            }
            report.sent.push((param, value));
        }

        if let Some(message) = chat {
            report.chat_sent = self.send_chat(message);
        }

        Ok(report)
    }

    fn send_chat(&mut self, message: &str) -> bool {
        let message = message.trim();
        if message.is_empty() {
            log::info!("Chat message is empty, skipping send");
            return false;
        }

        let args = [
            OscArg::Str(message.to_string()),
            OscArg::Bool(true),
            OscArg::Bool(false),
        ];
        match self.sources.sender.send(CHATBOX_INPUT_ADDRESS, &args) {
            Ok(()) => {
                log::info!("Chat sent: {}", message);
                true
            }
            Err(e) => {
                log::error!("Chat send error: {}", e);
                false
            }
        }
    }

    fn into_gpu(self) -> Box<dyn GpuProvider> {
        self.sources.gpu
    }
}

/// Notifications from the worker to the foreground
#[derive(Debug)]
pub enum RunEvent {
    TickCompleted { tick: u64, sent: usize, chat_sent: bool },
    /// The run ended on an unrecoverable error
    Fatal(WatchError),
    Stopped,
}

/// Handle to an active run. Dropping it stops the worker.
pub struct RunHandle {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<Box<dyn GpuProvider>>>,
    chat_tx: Sender<Option<String>>,
    events_rx: Receiver<RunEvent>,
    config: SchedulerConfig,
}

/// Spawn the worker for a validated config. `chat` is the initial chat snapshot.
pub fn start(
    config: SchedulerConfig,
    sources: TickSources,
    chat: Option<String>,
) -> Result<RunHandle> {
    config.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    let (chat_tx, chat_rx) = mpsc::channel();
    let (events_tx, events_rx) = mpsc::channel();

    let engine = TickEngine::new(config.sync_count(), sources);
    let worker_running = Arc::clone(&running);
    let interval = config.interval();

    log::info!(
        "Starting transmission to {}:{} every {}s (resync every {} ticks)",
        config.host,
        config.port,
        config.interval_secs,
        config.sync_count()
    );

    let worker = thread::Builder::new()
        .name("osc-watch-worker".to_string())
        .spawn(move || run_worker(engine, worker_running, interval, chat, chat_rx, events_tx))?;

    Ok(RunHandle {
        running,
        worker: Some(worker),
        chat_tx,
        events_rx,
        config,
    })
}

fn run_worker(
    mut engine: TickEngine,
    running: Arc<AtomicBool>,
    interval: Duration,
    mut chat: Option<String>,
    chat_rx: Receiver<Option<String>>,
    events_tx: Sender<RunEvent>,
) -> Box<dyn GpuProvider> {
    let mut tick: u64 = 0;

    while running.load(Ordering::Acquire) {
        // Latest snapshot wins
        while let Ok(update) = chat_rx.try_recv() {
            chat = update;
        }

        match engine.tick(chat.as_deref()) {
            Ok(report) => {
                // Foreground may have stopped listening; that's fine
                let _ = events_tx.send(RunEvent::TickCompleted {
                    tick,
                    sent: report.sent.len(),
                    chat_sent: report.chat_sent,
                });
            }
            Err(e) => {
                log::error!("Transmission stopped: {}", e);
                running.store(false, Ordering::Release);
                let _ = events_tx.send(RunEvent::Fatal(e));
                break;
            }
        }

        tick += 1;
        sleep_while_running(interval, &running);
    }

    log::info!("Transmission stopped after {} ticks", tick);
    let _ = events_tx.send(RunEvent::Stopped);
    engine.into_gpu()
}

/// Park until the interval elapses or the run is stopped (which unparks us).
fn sleep_while_running(interval: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

impl RunHandle {
    /// False once stopped, or once the worker ended on a fatal error
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Post a new chat snapshot; the worker picks it up at its next tick.
    /// `None` disables chat.
    pub fn set_chat(&self, chat: Option<String>) {
        if self.chat_tx.send(chat).is_err() {
            log::debug!("Chat update dropped, worker already finished");
        }
    }

    pub fn try_event(&self) -> Option<RunEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<RunEvent> {
        self.events_rx.recv_timeout(timeout).ok()
    }

    /// Stop the worker and wait for it. Returns the GPU provider for reuse,
    /// or `None` if the worker panicked.
    pub fn stop(mut self) -> Option<Box<dyn GpuProvider>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Box<dyn GpuProvider>> {
        self.running.store(false, Ordering::Release);
        let worker = self.worker.take()?;
        worker.thread().unpark();
        match worker.join() {
            Ok(gpu) => Some(gpu),
            Err(_) => {
                log::error!("Transmission worker panicked");
                None
            }
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
