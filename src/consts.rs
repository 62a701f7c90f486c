//! Hardware constants: pin bases, bus addresses, interrupt lines and switch blocks.
//!
//! These values follow the wiring of the Zynthian V4 (Z2) control boards and are
//! not derived from one another; change them together with the hardware.

use crate::adc::{AdcGain, AdcRate};
use crate::i2c::I2cAddress;

// --- GPIO Expanders (MCP23017) ---
pub const NUM_EXPANDERS: usize = 2;
pub const BANKS_PER_CHIP: usize = 2;
pub const PINS_PER_BANK: u8 = 8;
pub const PINS_PER_CHIP: u8 = 16;

pub mod expander_1 {
    use super::I2cAddress;

    pub const BASE_PIN: u16 = 100;
    pub const I2C_ADDRESS: I2cAddress = I2cAddress::from_const(0x20);
    pub const INTA_PIN: u8 = 5;
    pub const INTB_PIN: u8 = 6;
}

pub mod expander_2 {
    use super::I2cAddress;

    pub const BASE_PIN: u16 = 200;
    pub const I2C_ADDRESS: I2cAddress = I2cAddress::from_const(0x21);
    // Revision 1 boards route the second expander's interrupts to GPIO 7/8.
    pub const INTA_PIN_V1: u8 = 7;
    pub const INTB_PIN_V1: u8 = 8;
    pub const INTA_PIN: u8 = 17;
    pub const INTB_PIN: u8 = 27;
}

// --- Switches ---
/// First logical switch index; 0-3 belong to the encoder push buttons wired elsewhere.
pub const FIRST_SWITCH_INDEX: usize = 4;
/// Switches on the first expander (all 16 pins).
pub const SWITCHES_ON_EXPANDER_1: u8 = 16;
/// Switches on the second expander (pins 14/15 are kept free for the quadrature encoder).
pub const SWITCHES_ON_EXPANDER_2: u8 = 14;

// --- Analog encoders (RV112 over ADS1115) ---
/// Capacity of the ADC node pool.
pub const MAX_NUM_ADS1115: usize = 4;
/// Encoder channels per ADS1115: each RV112 uses two of its four inputs.
pub const ENCODER_CHANNELS_PER_ADS1115: u8 = 2;
pub const RV112_ADS1115_I2C_ADDRESS_1: I2cAddress = I2cAddress::from_const(0x48);
pub const RV112_ADS1115_I2C_ADDRESS_2: I2cAddress = I2cAddress::from_const(0x49);
pub const RV112_ADS1115_GAIN: AdcGain = AdcGain::Fsr4_096;
pub const RV112_ADS1115_RATE: AdcRate = AdcRate::Sps860;

// --- Digital encoder (PEC11) on revision 3+ ---
pub const DIGITAL_ENCODER_PIN_A: u8 = 14;
pub const DIGITAL_ENCODER_PIN_B: u8 = 15;

// --- Unified encoders ---
pub const NUM_ZYNPOTS: usize = 4;
