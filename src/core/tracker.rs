//! Change detection with forced periodic resync.
//!
//! A parameter is transmitted when its value changed since the last send, or
//! when `sync_count` ticks have passed since the last send. The first tick
//! always transmits. This keeps late-joining receivers and dropped datagrams
//! from leaving the avatar stale.

use super::params::AvatarParameter;

/// Per-parameter transmission state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterState {
    /// `None` until the first send
    pub last_sent_value: Option<u32>,
    /// Ticks left before an unchanged value is sent again
    pub ticks_until_forced_resend: u32,
}

/// Derive the resync period in ticks. Never less than one.
pub fn sync_count_for(sync_interval_secs: f64, tick_interval_secs: f64) -> u32 {
    if tick_interval_secs.is_nan() || tick_interval_secs <= 0.0 || !sync_interval_secs.is_finite() {
        return 1;
    }
    let ticks = (sync_interval_secs / tick_interval_secs).floor();
    if ticks < 1.0 {
        1
    } else if ticks >= u32::MAX as f64 {
        u32::MAX
    } else {
        ticks as u32
    }
}

/// Tracker for all eight parameters, indexed by [`AvatarParameter::index`].
#[derive(Debug, Clone)]
pub struct ResyncTracker {
    sync_count: u32,
    states: [ParameterState; AvatarParameter::COUNT],
}

impl ResyncTracker {
    pub fn new(sync_count: u32) -> Self {
        Self {
            sync_count: sync_count.max(1),
            states: [ParameterState::default(); AvatarParameter::COUNT],
        }
    }

    pub fn sync_count(&self) -> u32 {
        self.sync_count
    }

    pub fn state(&self, param: AvatarParameter) -> ParameterState {
        self.states[param.index()]
    }

    /// Decide whether `value` goes out this tick, updating the state.
    ///
    /// Returns `true` when the caller must transmit. The caller sends
    /// regardless of transport outcome; a lost datagram is covered by the
    /// next forced resync.
    pub fn observe(&mut self, param: AvatarParameter, value: u32) -> bool {
        let sync_count = self.sync_count;
        let state = &mut self.states[param.index()];

        if state.ticks_until_forced_resend == 0 || state.last_sent_value != Some(value) {
            state.last_sent_value = Some(value);
            // Counting down from sync_count - 1 puts the next forced send
            // exactly sync_count ticks after this one.
            state.ticks_until_forced_resend = sync_count - 1;
            true
        } else {
            state.ticks_until_forced_resend -= 1;
            false
        }
    }

    /// Forget everything; the next tick transmits every parameter.
    pub fn reset(&mut self) {
        self.states = [ParameterState::default(); AvatarParameter::COUNT];
    }
}
