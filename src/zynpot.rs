//! Unified encoders ("zynpots").
//!
//! A zynpot is the caller-facing encoder slot. Its backing hardware is either an
//! RV112 analog encoder or a PEC11 quadrature encoder; the variant is fixed when
//! the slot is bound and callers poll every slot the same way.

use crate::adc::AnalogEncoderBinding;
use crate::consts;
use crate::error::{Error, Result};
use crate::gpio::ExtendedPin;
use crate::hal::{AdcDriver, DigitalEncoderDriver};
use log::{debug, trace};

/// Which encoder technology backs a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZynpotKind {
    Analog,
    Digital,
}

/// Slot description used by layouts: the variant and the index in that
/// variant's own index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZynpotSource {
    Analog(usize),
    Digital(usize),
}

impl ZynpotSource {
    pub fn kind(&self) -> ZynpotKind {
        match self {
            ZynpotSource::Analog(_) => ZynpotKind::Analog,
            ZynpotSource::Digital(_) => ZynpotKind::Digital,
        }
    }
}

/// A quadrature encoder wired to two expander pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitalEncoderBinding {
    pub index: usize,
    pub pin_a: ExtendedPin,
    pub pin_b: ExtendedPin,
}

/// The binding behind a zynpot.
#[derive(Debug, Clone)]
pub enum ZynpotBackend {
    Analog(AnalogEncoderBinding),
    Digital(DigitalEncoderBinding),
}

impl ZynpotBackend {
    pub fn kind(&self) -> ZynpotKind {
        match self {
            ZynpotBackend::Analog(_) => ZynpotKind::Analog,
            ZynpotBackend::Digital(_) => ZynpotKind::Digital,
        }
    }

    /// Index of the backing binding in its own index space.
    pub fn binding_index(&self) -> usize {
        match self {
            ZynpotBackend::Analog(b) => b.index(),
            ZynpotBackend::Digital(b) => b.index,
        }
    }
}

/// Value range a zynpot's rotation is folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeScale {
    pub min: i32,
    pub max: i32,
    /// Value change per encoder step; negative inverts the direction.
    pub step: i32,
}

impl RangeScale {
    pub fn new(min: i32, max: i32, step: i32) -> Result<Self> {
        if min > max || step == 0 {
            return Err(Error::InvalidRange { min, max, step });
        }
        Ok(RangeScale { min, max, step })
    }

    fn apply(&self, value: i32, delta: i32) -> i32 {
        value
            .saturating_add(delta.saturating_mul(self.step))
            .clamp(self.min, self.max)
    }
}

/// One unified encoder slot.
#[derive(Debug, Clone)]
pub struct Zynpot {
    index: usize,
    backend: ZynpotBackend,
    range: Option<RangeScale>,
    value: i32,
    changed: bool,
}

impl Zynpot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> ZynpotKind {
        self.backend.kind()
    }

    pub fn backend(&self) -> &ZynpotBackend {
        &self.backend
    }

    /// Reads the rotation accumulated since the last poll from whichever driver
    /// backs this slot.
    pub fn poll_delta(
        &self,
        adc: &dyn AdcDriver,
        digital: &dyn DigitalEncoderDriver,
    ) -> Result<i32> {
        match &self.backend {
            ZynpotBackend::Analog(binding) => binding.read_delta(adc),
            ZynpotBackend::Digital(binding) => digital.read_delta(binding.index),
        }
    }

    /// Polls and folds the delta into the value. Returns true if the value moved.
    pub fn update(
        &mut self,
        adc: &dyn AdcDriver,
        digital: &dyn DigitalEncoderDriver,
    ) -> Result<bool> {
        let delta = self.poll_delta(adc, digital)?;
        if delta == 0 {
            return Ok(false);
        }
        let next = match &self.range {
            Some(range) => range.apply(self.value, delta),
            None => self.value.saturating_add(delta),
        };
        trace!("Zynpot {}: delta {} -> value {}", self.index, delta, next);
        if next == self.value {
            return Ok(false);
        }
        self.value = next;
        self.changed = true;
        Ok(true)
    }

    /// Sets the range and clamps the current value into it.
    pub fn setup_range(&mut self, range: RangeScale) {
        self.range = Some(range);
        self.value = self.value.clamp(range.min, range.max);
        self.changed = false;
    }

    pub fn range(&self) -> Option<RangeScale> {
        self.range
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = match &self.range {
            Some(range) => value.clamp(range.min, range.max),
            None => value,
        };
        self.changed = false;
    }

    /// Returns the value if it changed since the last call, clearing the flag.
    pub fn take_value(&mut self) -> Option<i32> {
        if self.changed {
            self.changed = false;
            Some(self.value)
        } else {
            None
        }
    }
}

/// The fixed table of unified encoder slots.
#[derive(Debug, Default)]
pub struct ZynpotTable {
    slots: [Option<Zynpot>; consts::NUM_ZYNPOTS],
}

impl ZynpotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds slot `index` to `backend`. A slot can be bound once per reset.
    pub fn setup(&mut self, index: usize, backend: ZynpotBackend) -> Result<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(Error::EncoderIndexOutOfRange {
                index,
                max: consts::NUM_ZYNPOTS - 1,
            })?;
        if slot.is_some() {
            return Err(Error::EncoderSlotConflict { index });
        }
        debug!(
            "Zynpot {} -> {:?} {}",
            index,
            backend.kind(),
            backend.binding_index()
        );
        *slot = Some(Zynpot {
            index,
            backend,
            range: None,
            value: 0,
            changed: false,
        });
        Ok(())
    }

    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    pub fn get(&self, index: usize) -> Result<&Zynpot> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(Error::EncoderIndexOutOfRange {
                index,
                max: consts::NUM_ZYNPOTS - 1,
            })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Zynpot> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(Error::EncoderIndexOutOfRange {
                index,
                max: consts::NUM_ZYNPOTS - 1,
            })
    }

    pub fn kind(&self, index: usize) -> Result<ZynpotKind> {
        self.get(index).map(Zynpot::kind)
    }

    /// Bound slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Zynpot> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every slot is bound.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
