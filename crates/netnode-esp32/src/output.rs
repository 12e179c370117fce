//! LED output on an ESP32 GPIO pin.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use esp_idf_svc::hal::gpio::{self, AnyOutputPin, Output, PinDriver};
use log::info;

use netnode_core::{DigitalOutput, Level, OutputError};

/// Push-pull output driving an LED.
pub struct GpioOutput {
    pin: u8,
    driver: Mutex<PinDriver<'static, AnyOutputPin, Output>>,
    high: AtomicBool,
}

impl GpioOutput {
    /// Configure `pin` as an output, initially low.
    pub fn new(pin_number: u8, pin: AnyOutputPin) -> anyhow::Result<Self> {
        let mut driver = PinDriver::output(pin)?;
        driver.set_low()?;
        Ok(Self {
            pin: pin_number,
            driver: Mutex::new(driver),
            high: AtomicBool::new(false),
        })
    }
}

impl DigitalOutput for GpioOutput {
    fn set_level(&self, level: Level) -> Result<(), OutputError> {
        let mut driver = self
            .driver
            .lock()
            .map_err(|_| OutputError("GPIO driver lock poisoned".to_string()))?;
        let esp_level = match level {
            Level::High => gpio::Level::High,
            Level::Low => gpio::Level::Low,
        };
        driver
            .set_level(esp_level)
            .map_err(|e| OutputError(e.to_string()))?;
        self.high.store(level == Level::High, Ordering::SeqCst);
        info!("GPIO{} set to {}", self.pin, level.as_u8());
        Ok(())
    }

    fn level(&self) -> Level {
        Level::from(self.high.load(Ordering::SeqCst))
    }
}
