/// Hosted-store quota on writes committed in one batch
pub const DEFAULT_MAX_WRITES_PER_BATCH: usize = 500;

/// Default capacity of the change fan-out channel
pub const DEFAULT_CHANGE_BUFFER: usize = 256;

/// Largest change buffer the fan-out channel can allocate
pub const MAX_CHANGE_BUFFER: usize = usize::MAX >> 1;

/// Driver configuration for quotas and listener buffering
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Maximum number of writes accepted in one batch commit
    pub max_writes_per_batch: usize,

    /// Number of change sets buffered per listener before it lags.
    /// A lagging listener re-reads current state instead of failing.
    pub change_buffer: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_writes_per_batch: DEFAULT_MAX_WRITES_PER_BATCH,
            change_buffer: DEFAULT_CHANGE_BUFFER,
        }
    }
}

impl DriverConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-batch write quota
    pub fn with_max_writes_per_batch(mut self, writes: usize) -> Self {
        self.max_writes_per_batch = writes;
        self
    }

    /// Set the change buffer capacity
    pub fn with_change_buffer(mut self, capacity: usize) -> Self {
        self.change_buffer = capacity;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_writes_per_batch == 0 {
            return Err("max_writes_per_batch must be greater than 0".to_string());
        }

        if self.change_buffer == 0 {
            return Err("change_buffer must be greater than 0".to_string());
        }

        if self.change_buffer > MAX_CHANGE_BUFFER {
            return Err(format!("change_buffer must be at most {}", MAX_CHANGE_BUFFER));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DriverConfig::default();
        assert_eq!(config.max_writes_per_batch, 500);
        assert_eq!(config.change_buffer, 256);
    }

    #[test]
    fn test_builder_methods() {
        let config = DriverConfig::new()
            .with_max_writes_per_batch(10)
            .with_change_buffer(4);

        assert_eq!(config.max_writes_per_batch, 10);
        assert_eq!(config.change_buffer, 4);
    }

    #[test]
    fn test_validate_success() {
        assert!(DriverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_quota() {
        let config = DriverConfig::new().with_max_writes_per_batch(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_buffer() {
        let config = DriverConfig::new().with_change_buffer(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_oversized_buffer() {
        assert!(DriverConfig::new().with_change_buffer(usize::MAX).validate().is_err());
        assert!(DriverConfig::new()
            .with_change_buffer(MAX_CHANGE_BUFFER + 1)
            .validate()
            .is_err());
        assert!(DriverConfig::new().with_change_buffer(MAX_CHANGE_BUFFER).validate().is_ok());
    }
}
