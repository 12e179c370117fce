//! Digital output abstraction.
//!
//! The LED is a single binary pin. Writes are a single scalar store with
//! last-write-wins semantics, so implementations only need interior
//! mutability, not ordering between concurrent callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

/// Output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn as_u8(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Failure to drive the pin.
#[derive(Debug, Error)]
#[error("failed to set output level: {0}")]
pub struct OutputError(pub String);

/// A pin configured as output.
pub trait DigitalOutput: Send + Sync {
    /// Drive the pin to `level`.
    fn set_level(&self, level: Level) -> Result<(), OutputError>;

    /// Last level written.
    fn level(&self) -> Level;
}

/// Output shared between the dispatcher and request handlers.
pub type SharedOutput = Arc<dyn DigitalOutput>;

impl<T: DigitalOutput + ?Sized> DigitalOutput for Arc<T> {
    fn set_level(&self, level: Level) -> Result<(), OutputError> {
        (**self).set_level(level)
    }

    fn level(&self) -> Level {
        (**self).level()
    }
}

/// In-memory output used on hosts without GPIO.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    pin: u8,
    high: AtomicBool,
}

impl MemoryOutput {
    /// A low output standing in for `pin`.
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            high: AtomicBool::new(false),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl DigitalOutput for MemoryOutput {
    fn set_level(&self, level: Level) -> Result<(), OutputError> {
        self.high.store(level == Level::High, Ordering::SeqCst);
        info!("GPIO{} set to {}", self.pin, level.as_u8());
        Ok(())
    }

    fn level(&self) -> Level {
        Level::from(self.high.load(Ordering::SeqCst))
    }
}
