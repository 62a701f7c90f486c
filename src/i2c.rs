//! I2C bus addressing for the expander and ADC chips.

use crate::error::{Error, Result};
use std::fmt;

/// Represents a 7-bit I2C slave address (0x00 - 0x7F).
/// Use `I2cAddress::new(addr)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// Creates a 7-bit address, checking validity (0-127).
    pub fn new(addr: u8) -> Result<Self> {
        if addr <= 0x7F {
            Ok(I2cAddress(addr))
        } else {
            Err(Error::ArgumentOutOfRange(format!(
                "7-bit I2C address 0x{:02X} out of range (0x00-0x7F)",
                addr
            )))
        }
    }

    /// Creates an address from a constant known to be valid.
    pub(crate) const fn from_const(addr: u8) -> Self {
        assert!(addr <= 0x7F);
        I2cAddress(addr)
    }

    #[inline]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
