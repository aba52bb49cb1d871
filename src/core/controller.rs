//! Foreground state machine: Idle <-> Running.
//!
//! Owns the GPU provider between runs and the chat state the user edits.
//! Transmission state itself lives on the worker; the controller only posts
//! chat snapshots to it.

use super::gpu::{GpuProvider, GpuVendor};
use super::scheduler::{self, LocalClock, RunEvent, RunHandle, SchedulerConfig, TickSources};
use crate::error::{Result, WatchError};
use crate::osc::UdpOscClient;

/// What the status line should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub running: bool,
    pub sending_chat: bool,
}

pub struct WatchController {
    gpu: Option<Box<dyn GpuProvider>>,
    gpu_vendor: GpuVendor,
    gpu_name: String,
    run: Option<RunHandle>,
    chat_enabled: bool,
    chat_text: String,
}

impl WatchController {
    /// `gpu` is the provider resolved once at startup.
    pub fn new(gpu: Box<dyn GpuProvider>) -> Self {
        Self {
            gpu_vendor: gpu.vendor(),
            gpu_name: gpu.name(),
            gpu: Some(gpu),
            run: None,
            chat_enabled: false,
            chat_text: String::new(),
        }
    }

    pub fn gpu_vendor(&self) -> GpuVendor {
        self.gpu_vendor
    }

    pub fn gpu_name(&self) -> &str {
        &self.gpu_name
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(RunHandle::is_running)
    }

    pub fn active_config(&self) -> Option<&SchedulerConfig> {
        self.run.as_ref().map(RunHandle::config)
    }

    /// Start sending. Returns `Ok(false)` if a run is already active.
    pub fn start(&mut self, config: SchedulerConfig) -> Result<bool> {
        if self.is_running() {
            log::info!("Already running, ignoring start");
            return Ok(false);
        }
        // A run that ended on its own still holds the provider
        self.reap();

        config.validate()?;
        let sender = UdpOscClient::connect(&config.host, config.port)?;

        let gpu = self
            .gpu
            .take()
            .ok_or_else(|| WatchError::other("GPU provider was lost by a previous run"))?;

        let sources = TickSources {
            clock: Box::new(LocalClock),
            gpu,
            sender: Box::new(sender),
        };

        self.run = Some(scheduler::start(config, sources, self.chat_snapshot())?);
        Ok(true)
    }

    /// Stop sending. Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.reap();
        was_running
    }

    fn reap(&mut self) {
        if let Some(run) = self.run.take() {
            if let Some(gpu) = run.stop() {
                self.gpu = Some(gpu);
            }
        }
    }

    /// Drain worker notifications. A fatal error is returned once and the
    /// finished run is cleaned up.
    pub fn poll_fatal(&mut self) -> Option<WatchError> {
        let mut fatal = None;
        if let Some(run) = &self.run {
            while let Some(event) = run.try_event() {
                match event {
                    RunEvent::Fatal(e) => fatal = Some(e),
                    RunEvent::TickCompleted { tick, sent, chat_sent } => {
                        log::debug!("Tick {}: {} parameters, chat: {}", tick, sent, chat_sent)
                    }
                    RunEvent::Stopped => {}
                }
            }
        }
        if fatal.is_some() {
            self.reap();
        }
        fatal
    }

    pub fn chat_enabled(&self) -> bool {
        self.chat_enabled
    }

    pub fn chat_text(&self) -> &str {
        &self.chat_text
    }

    pub fn set_chat_enabled(&mut self, enabled: bool) {
        self.chat_enabled = enabled;
        self.publish_chat();
    }

    /// Replace the chat text (typing, or inserting a preset)
    pub fn set_chat_text<S: Into<String>>(&mut self, text: S) {
        self.chat_text = text.into();
        self.publish_chat();
    }

    /// What the worker should send: `None` when chat is off
    pub fn chat_snapshot(&self) -> Option<String> {
        self.chat_enabled.then(|| self.chat_text.trim().to_string())
    }

    fn publish_chat(&self) {
        if let Some(run) = &self.run {
            run.set_chat(self.chat_snapshot());
        }
    }

    pub fn status(&self) -> StatusSummary {
        let running = self.is_running();
        StatusSummary {
            running,
            sending_chat: running && self.chat_snapshot().is_some_and(|c| !c.is_empty()),
        }
    }
}

impl Drop for WatchController {
    fn drop(&mut self) {
        self.reap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu::UnknownProvider;

    fn controller() -> WatchController {
        WatchController::new(Box::new(UnknownProvider::default()))
    }

    #[test]
    fn test_chat_snapshot() {
        let mut c = controller();
        c.set_chat_text("  hi  ");
        assert_eq!(c.chat_snapshot(), None);
        c.set_chat_enabled(true);
        assert_eq!(c.chat_snapshot(), Some("hi".to_string()));
    }

    #[test]
    fn test_invalid_config_stays_idle() {
        let mut c = controller();
        let config = SchedulerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(c.start(config), Err(WatchError::Config(_))));
        assert!(!c.is_running());
        assert!(!c.stop());
    }

    #[test]
    fn test_idle_status() {
        let mut c = controller();
        c.set_chat_enabled(true);
        c.set_chat_text("hello");
        assert_eq!(
            c.status(),
            StatusSummary {
                running: false,
                sending_chat: false
            }
        );
    }
}
