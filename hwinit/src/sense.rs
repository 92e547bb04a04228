//! Boot-source hardware sensing
//!
//! Implements the detector's hardware seam: direct strap reads, and the
//! indirect path used when the recovery configuration is strapped — an
//! EEPROM on a bus named by the handoff data holds the encoded source.

use cinder_core::source::{BootSense, SenseError};
use cinder_core::{log_info, log_notice};

use crate::config::HandoffConfig;
use crate::i2c::I2cRegistry;
use crate::mmio;

// Configuration EEPROM address and layout.
const EEPROM_CHIP_ADDR: u8 = 0x50;
const EEPROM_BOOT_CFG_OFF: u8 = 0x0;

/// Alias naming the bus that reaches the configuration EEPROM.
const EEPROM_BUS_ALIAS: &str = "i2c0";

/// Live hardware behind the boot-source detector.
pub struct HardwareSense {
    config: HandoffConfig,
    buses: I2cRegistry,
}

impl HardwareSense {
    pub const fn new(config: HandoffConfig) -> Self {
        Self {
            config,
            buses: I2cRegistry::new(),
        }
    }

    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }
}

impl BootSense for HardwareSense {
    fn strap_register(&self) -> u32 {
        // The strap report address is always provided; only the alias
        // table needs the validity check, and only on recovery boots.
        unsafe { mmio::read32(self.config.boot_status_addr) }
    }

    fn recovery_boot_config(&mut self) -> Result<u8, SenseError> {
        if !self.config.is_valid() {
            log_info!("sense: handoff data missing or corrupt");
            return Err(SenseError::ConfigUnavailable);
        }

        let Some(alias) = self.config.find_alias(EEPROM_BUS_ALIAS) else {
            log_info!("sense: no i2c0 alias in handoff data");
            return Err(SenseError::MissingBusAlias);
        };
        let base = alias.base;

        let Some(bus) = self.buses.register(base) else {
            log_notice!("sense: failed to register the i2c0 instance");
            return Err(SenseError::BusRegistration);
        };

        match bus.read_byte(EEPROM_CHIP_ADDR, EEPROM_BOOT_CFG_OFF) {
            Ok(byte) => Ok(byte),
            Err(_) => {
                log_notice!("sense: boot-config EEPROM read failed");
                Err(SenseError::TransferFailed)
            }
        }
    }
}
