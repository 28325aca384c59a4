use std::time::Duration;
use thiserror::Error;
use vault_monitor_chain::FetchError;

/// Errors that stop the monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("monitoring cycle did not finish within {0:?}")]
    CycleTimeout(Duration),
    #[error("{failures} consecutive monitoring cycles failed, last error: {last}")]
    TooManyFailures {
        failures: u32,
        #[source]
        last: Box<MonitorError>,
    },
}

impl MonitorError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}
