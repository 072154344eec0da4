use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Knobs of a single run. Read-only once built.
///
/// - `batch_size`: attempts launched together; the next batch waits for all of them.
/// - `pause`: sleep after every batch so sockets and descriptors can settle.
/// - `timeout`: per-attempt deadline. `Duration::ZERO` means no deadline.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
pub struct RunConfig {
    pub users: usize,
    #[builder(default = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    #[builder(default = DEFAULT_PAUSE)]
    pub pause: Duration,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    pub fn deadline(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    /// Number of batches a run with this config goes through.
    pub fn batch_count(&self) -> usize {
        self.users.div_ceil(self.batch_size.max(1))
    }
}
