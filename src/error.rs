use std::io;
use thiserror::Error;

/// Custom error type for OSC Watch
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("GPU metric not supported: {0}")]
    MetricsUnsupported(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("GPU driver missing: {0}")]
    DriverMissing(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed OSC packet: {0}")]
    Protocol(String),

    #[error("Preset error: {0}")]
    Preset(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for OSC Watch
pub type Result<T> = std::result::Result<T, WatchError>;

impl WatchError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        WatchError::Config(msg.into())
    }

    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        WatchError::GpuNotAvailable(msg.into())
    }

    pub fn metrics_unsupported<S: Into<String>>(msg: S) -> Self {
        WatchError::MetricsUnsupported(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        WatchError::MetricCollection(msg.into())
    }

    pub fn driver_missing<S: Into<String>>(msg: S) -> Self {
        WatchError::DriverMissing(msg.into())
    }

    pub fn transport<S: Into<String>>(msg: S) -> Self {
        WatchError::Transport(msg.into())
    }

    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        WatchError::Protocol(msg.into())
    }

    pub fn preset<S: Into<String>>(msg: S) -> Self {
        WatchError::Preset(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        WatchError::Other(msg.into())
    }

    /// Only a missing NVIDIA driver ends the run; everything else is logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::DriverMissing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_driver_missing_is_fatal() {
        assert!(WatchError::driver_missing("nvml.dll").is_fatal());
        assert!(!WatchError::metrics_unsupported("vram").is_fatal());
        assert!(!WatchError::transport("send").is_fatal());
        assert!(!WatchError::config("port").is_fatal());
    }

    #[test]
    fn test_display_messages() {
        let err = WatchError::config("Port must be a positive integer");
        assert_eq!(
            err.to_string(),
            "Configuration error: Port must be a positive integer"
        );
    }
}
