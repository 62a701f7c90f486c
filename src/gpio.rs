use crate::consts;
use crate::error::{Error, Result};
use std::fmt;

/// Level at which a switch input reads as "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveLevel {
    Low,
    High,
}

impl ActiveLevel {
    /// Numeric form used by switch drivers (0 or 1).
    #[inline]
    pub fn as_u8(&self) -> u8 {
        match self {
            ActiveLevel::Low => 0,
            ActiveLevel::High => 1,
        }
    }
}

/// One of the two interrupt banks of an expander chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    A,
    B,
}

impl Bank {
    /// Both banks, in interrupt-line order.
    pub const ALL: [Bank; 2] = [Bank::A, Bank::B];

    /// Returns 0 for bank A, 1 for bank B.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Bank::A => 0,
            Bank::B => 1,
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bank::A => write!(f, "A"),
            Bank::B => write!(f, "B"),
        }
    }
}

/// Identifies one of the expander chips (0 or 1).
/// Use `ChipIndex::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChipIndex(u8);

impl ChipIndex {
    /// First expander chip.
    pub const FIRST: ChipIndex = ChipIndex(0);
    /// Second expander chip.
    pub const SECOND: ChipIndex = ChipIndex(1);
    /// Both chips, in configuration order.
    pub const ALL: [ChipIndex; consts::NUM_EXPANDERS] = [ChipIndex::FIRST, ChipIndex::SECOND];

    /// Creates a new ChipIndex, returning an error if there is no such chip.
    pub fn new(index: u8) -> Result<Self> {
        if (index as usize) < consts::NUM_EXPANDERS {
            Ok(ChipIndex(index))
        } else {
            Err(Error::ArgumentOutOfRange(format!(
                "Expander chip index {} out of range (0-{})",
                index,
                consts::NUM_EXPANDERS - 1
            )))
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChipIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a valid pin offset within one expander chip (0-15).
/// Use `ExpanderPin::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpanderPin(u8);

impl ExpanderPin {
    /// Creates a new ExpanderPin, returning an error if the offset is out of range (0-15).
    pub fn new(offset: u8) -> Result<Self> {
        if offset < consts::PINS_PER_CHIP {
            Ok(ExpanderPin(offset))
        } else {
            Err(Error::ArgumentOutOfRange(format!(
                "Expander pin offset {} out of range (0-{})",
                offset,
                consts::PINS_PER_CHIP - 1
            )))
        }
    }

    /// Returns the underlying offset (0-15).
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the bank the pin belongs to.
    #[inline]
    pub fn bank(&self) -> Bank {
        if self.0 < consts::PINS_PER_BANK {
            Bank::A
        } else {
            Bank::B
        }
    }

    /// Returns the bit index (0-7) within the bank's register.
    #[inline]
    pub fn bit_index(&self) -> u8 {
        self.0 % consts::PINS_PER_BANK
    }

    /// Returns the bit mask (1 << bit_index) for bank register operations.
    #[inline]
    pub fn mask(&self) -> u8 {
        1u8 << self.bit_index()
    }
}

/// Pin number in the extended (base offset + pin) numbering shared by all drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtendedPin(pub u16);

impl ExtendedPin {
    /// Builds the extended pin number for `pin` on a chip mapped at `base`.
    #[inline]
    pub fn from_base(base: u16, pin: ExpanderPin) -> Self {
        ExtendedPin(base + pin.number() as u16)
    }

    #[inline]
    pub fn number(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ExtendedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host GPIO line number carrying an expander interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPin(pub u8);

impl fmt::Display for HostPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}
