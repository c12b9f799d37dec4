use log::{debug, info, warn};

/// Channel-labelled front end over the `log` facade.
#[derive(Debug, Clone)]
pub struct LogManager {
    label: String,
}

impl LogManager {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.label, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.label, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.label, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("spotcounter")
    }
}
