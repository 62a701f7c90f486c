//! # zyncontrol
//!
//! Bring-up and teardown of the control surface of Zynthian V4 (Z2) kits: two
//! MCP23017 GPIO expanders, 30 debounced switches, RV112 analog encoders sampled
//! through ADS1115 converters and, on later board revisions, a PEC11 quadrature
//! encoder.
//!
//! The register-level drivers are not part of this crate. They plug in through the
//! traits in [`hal`], and [`ZynControl`] sequences them.
//!
//! ## Features
//!
//! *   Expander interrupt wiring: one handler per (chip, bank) interrupt line,
//!     each scanning only its own bank, with per-bank counters (`bank_stats`).
//! *   Switch table: logical switch indices 4-33 mapped onto expander pins.
//! *   ADC node pool: ADS1115 nodes shared by reference between analog encoders,
//!     with reads serialized per node.
//! *   Unified encoders ("zynpots"): four slots, each backed by an analog or a
//!     digital encoder, polled through one call (`poll_zynpot`), with optional
//!     range/step scaling (`setup_zynpot_range`, `update_zynpot`, `take_zynpot_value`).
//! *   Lifecycle: `init_control` / `end_control` with a fixed bring-up order;
//!     interrupt delivery starts only after every pin is bound.
//! *   Headphone volume passthrough (`set_volume`, `volume`, `volume_max`).
//!
//! ## Hardware Revisions
//!
//! | Revision | Chip 2 INTA/INTB | Encoders                        |
//! |----------|------------------|---------------------------------|
//! | 1        | GPIO 7 / 8       | 4 x RV112                       |
//! | 2        | GPIO 17 / 27     | 4 x RV112                       |
//! | 3+       | GPIO 17 / 27     | 3 x RV112, 1 x PEC11 (slot 3)   |
//!
//! The revision is fixed at build time with the `z2-v1` or `z2-v2` cargo feature
//! (revision 3 without either), or passed explicitly to [`ZynControl::new`].
//!
//! ## Basic Usage
//!
//! ```no_run
//! use zyncontrol::{hal::Drivers, Result, ZynControl};
//!
//! fn run(drivers: Drivers) -> Result<()> {
//!     let mut control = ZynControl::from_build(drivers)?;
//!     control.init_control()?;
//!
//!     control.setup_zynpot_range(0, 0, 127, 1)?;
//!     if control.update_zynpot(0)? {
//!         println!("Zynpot 0 -> {:?}", control.take_zynpot_value(0)?);
//!     }
//!
//!     control.end_control()
//! }
//! ```
//!
//! ## Pin Mapping
//!
//! *   Expander 1 (0x20) pins map to extended pins 100-115; switches 4-19.
//! *   Expander 2 (0x21) pins map to extended pins 200-215; switches 20-33 on
//!     200-213, PEC11 on 214/215 (revision 3+).

pub mod adc;
mod consts;
pub mod control;
mod error;
pub mod expander;
pub mod gpio;
pub mod hal;
pub mod i2c;
pub mod interrupt;
pub mod layout;
pub mod revision;
pub mod switch;
pub mod zynpot;

pub use control::{ControlState, ZynControl};
pub use error::{Error, Result};
pub use gpio::{ActiveLevel, Bank, ChipIndex, ExpanderPin, ExtendedPin, HostPin};
pub use i2c::I2cAddress;
pub use layout::ControlLayout;
pub use revision::{HardwareRevision, Topology};
pub use zynpot::{ZynpotKind, ZynpotSource};

// Re-export only the constants callers need to size their tables
pub use consts::{MAX_NUM_ADS1115, NUM_ZYNPOTS};
