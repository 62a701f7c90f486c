//! Control surface lifecycle.

use crate::adc::{AnalogEncoderBinding, AnalogEncoders};
use crate::error::{Error, Result};
use crate::expander::ExpanderSet;
use crate::gpio::{Bank, ChipIndex};
use crate::hal::Drivers;
use crate::interrupt::BankStats;
use crate::layout::ControlLayout;
use crate::revision::HardwareRevision;
use crate::switch::{SwitchBinding, SwitchTable};
use crate::zynpot::{RangeScale, ZynpotBackend, ZynpotKind, ZynpotSource, ZynpotTable};
use log::{debug, info, warn};

/// Lifecycle state of a [`ZynControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Nothing configured yet.
    Uninitialized,
    /// All hardware configured and interrupt delivery running.
    Running,
    /// `init_control` failed part way; drivers may be partially configured.
    Faulted,
    /// Torn down. Terminal.
    Stopped,
}

/// Owns the control-surface state and sequences its drivers.
///
/// `init_control` brings up, in order: the interrupt registry, the volume chip, the
/// expanders, the switches and the encoders, and only then starts interrupt
/// delivery. `end_control` tears down in reverse.
pub struct ZynControl {
    layout: ControlLayout,
    drivers: Drivers,
    state: ControlState,
    expanders: ExpanderSet,
    switches: SwitchTable,
    analog: AnalogEncoders,
    zynpots: ZynpotTable,
}

impl ZynControl {
    /// Creates an uninitialized control surface for `revision`.
    pub fn new(drivers: Drivers, revision: HardwareRevision) -> Result<Self> {
        Self::with_layout(drivers, ControlLayout::for_revision(revision)?)
    }

    /// Creates an uninitialized control surface for the build's revision.
    pub fn from_build(drivers: Drivers) -> Result<Self> {
        Self::new(drivers, HardwareRevision::from_build())
    }

    /// Creates an uninitialized control surface for a custom layout.
    pub fn with_layout(drivers: Drivers, layout: ControlLayout) -> Result<Self> {
        layout.validate()?;
        Ok(ZynControl {
            layout,
            drivers,
            state: ControlState::Uninitialized,
            expanders: ExpanderSet::new(),
            switches: SwitchTable::new(),
            analog: AnalogEncoders::new(),
            zynpots: ZynpotTable::new(),
        })
    }

    // --- Lifecycle ---

    /// Brings up the whole control surface.
    ///
    /// On failure the state becomes [`ControlState::Faulted`] and nothing is rolled
    /// back; call `init_control` again to retry or `end_control` to tear down.
    pub fn init_control(&mut self) -> Result<()> {
        match self.state {
            ControlState::Running => return Err(Error::AlreadyRunning),
            ControlState::Stopped => return Err(Error::Stopped),
            ControlState::Uninitialized | ControlState::Faulted => {}
        }
        info!("Initializing control surface ({})", self.layout.revision);
        match self.bring_up() {
            Ok(()) => {
                self.state = ControlState::Running;
                Ok(())
            }
            Err(e) => {
                warn!("Control surface initialization failed: {}", e);
                self.state = ControlState::Faulted;
                Err(e)
            }
        }
    }

    fn bring_up(&mut self) -> Result<()> {
        self.drivers.interrupts.init()?;
        self.drivers.volume.init()?;
        self.init_expanders()?;
        self.init_switches()?;
        self.init_zynpots()?;
        self.drivers.interrupts.start()
    }

    /// Tears down the control surface. Every step runs even if an earlier one fails;
    /// the first failure is returned afterwards.
    pub fn end_control(&mut self) -> Result<()> {
        match self.state {
            ControlState::Running | ControlState::Faulted => {}
            ControlState::Uninitialized | ControlState::Stopped => return Err(Error::NotRunning),
        }
        info!("Stopping control surface");

        let mut first_error = None;
        let mut step = |what: &str, result: Result<()>| {
            if let Err(e) = result {
                warn!("Teardown step '{}' failed: {}", what, e);
                first_error.get_or_insert(e);
            }
        };
        step("stop interrupts", self.drivers.interrupts.stop());
        step("end zynpots", self.end_zynpots());
        step("reset zyncoders", self.drivers.encoders.reset_all());
        step(
            "reset switches",
            self.switches.reset(self.drivers.switches.as_ref()),
        );
        step(
            "reset expanders",
            self.expanders.reset(self.drivers.expanders.as_ref()),
        );
        step("end volume", self.drivers.volume.end());

        self.state = ControlState::Stopped;
        first_error.map_or(Ok(()), Err)
    }

    fn init_expanders(&mut self) -> Result<()> {
        self.expanders
            .initialize(&self.drivers.expanders, &self.layout.expanders)
    }

    fn init_switches(&mut self) -> Result<()> {
        self.switches.initialize(
            self.drivers.switches.as_ref(),
            self.expanders.chips(),
            &self.layout.switch_blocks,
            &self.layout.reserved_pins(),
        )
    }

    fn init_zynpots(&mut self) -> Result<()> {
        self.drivers.encoders.reset_all()?;
        self.zynpots.reset();
        self.analog.initialize(
            self.drivers.adc.as_ref(),
            &self.layout.adc_nodes,
            &self.layout.analog_channels,
        )?;

        for encoder in &self.layout.digital_encoders {
            debug!(
                "PEC11 {} -> pins {}/{}",
                encoder.index, encoder.pin_a, encoder.pin_b
            );
            self.drivers
                .encoders
                .configure(encoder.index, encoder.pin_a, encoder.pin_b)?;
        }

        for (slot, source) in self.layout.zynpots.iter().enumerate() {
            let backend = match *source {
                ZynpotSource::Analog(i) => self
                    .analog
                    .binding(i)
                    .cloned()
                    .map(ZynpotBackend::Analog),
                ZynpotSource::Digital(i) => self
                    .layout
                    .digital_encoders
                    .iter()
                    .find(|e| e.index == i)
                    .copied()
                    .map(ZynpotBackend::Digital),
            }
            .ok_or_else(|| {
                Error::ArgumentOutOfRange(format!("Zynpot {} backing {:?} missing", slot, source))
            })?;
            self.zynpots.setup(slot, backend)?;
        }
        Ok(())
    }

    /// Stops sampling, releases the analog driver layer and empties the zynpot table.
    fn end_zynpots(&mut self) -> Result<()> {
        let stopped = self.analog.stop_sampling(self.drivers.adc.as_ref());
        let released = self.drivers.adc.reset_all();
        self.analog.clear();
        self.zynpots.reset();
        stopped.and(released)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.state == ControlState::Running {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }

    // --- Zynpots ---

    /// Rotation of zynpot `index` since its previous poll.
    pub fn poll_zynpot(&self, index: usize) -> Result<i32> {
        self.ensure_running()?;
        self.zynpots.get(index)?.poll_delta(
            self.drivers.adc.as_ref(),
            self.drivers.encoders.as_ref(),
        )
    }

    /// Polls zynpot `index` and folds the rotation into its value.
    /// Returns true if the value changed.
    pub fn update_zynpot(&mut self, index: usize) -> Result<bool> {
        self.ensure_running()?;
        self.zynpots.get_mut(index)?.update(
            self.drivers.adc.as_ref(),
            self.drivers.encoders.as_ref(),
        )
    }

    /// Sets the value range of zynpot `index`.
    pub fn setup_zynpot_range(
        &mut self,
        index: usize,
        min: i32,
        max: i32,
        step: i32,
    ) -> Result<()> {
        self.ensure_running()?;
        let range = RangeScale::new(min, max, step)?;
        self.zynpots.get_mut(index)?.setup_range(range);
        Ok(())
    }

    /// Value of zynpot `index` if it changed since the last call.
    pub fn take_zynpot_value(&mut self, index: usize) -> Result<Option<i32>> {
        self.ensure_running()?;
        Ok(self.zynpots.get_mut(index)?.take_value())
    }

    pub fn set_zynpot_value(&mut self, index: usize, value: i32) -> Result<()> {
        self.ensure_running()?;
        self.zynpots.get_mut(index)?.set_value(value);
        Ok(())
    }

    pub fn zynpot_kind(&self, index: usize) -> Result<ZynpotKind> {
        self.zynpots.kind(index)
    }

    pub fn zynpots(&self) -> &ZynpotTable {
        &self.zynpots
    }

    // --- Volume ---

    /// Sets the headphone volume and returns the level actually applied.
    pub fn set_volume(&self, level: u8) -> Result<u8> {
        self.ensure_running()?;
        self.drivers.volume.set(level)
    }

    pub fn volume(&self) -> Result<u8> {
        self.ensure_running()?;
        self.drivers.volume.get()
    }

    pub fn volume_max(&self) -> Result<u8> {
        self.ensure_running()?;
        self.drivers.volume.get_max()
    }

    // --- Inspection ---

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn revision(&self) -> HardwareRevision {
        self.layout.revision
    }

    pub fn layout(&self) -> &ControlLayout {
        &self.layout
    }

    pub fn switch(&self, index: usize) -> Option<&SwitchBinding> {
        self.switches.get(index)
    }

    pub fn switches(&self) -> &SwitchTable {
        &self.switches
    }

    pub fn expanders(&self) -> &ExpanderSet {
        &self.expanders
    }

    pub fn analog_bindings(&self) -> &[AnalogEncoderBinding] {
        self.analog.bindings()
    }

    pub fn is_sampling(&self) -> bool {
        self.analog.is_sampling()
    }

    /// Interrupt counters of one expander bank.
    pub fn bank_stats(&self, chip: ChipIndex, bank: Bank) -> BankStats {
        self.expanders.stats().bank(chip, bank).snapshot()
    }
}

impl Drop for ZynControl {
    fn drop(&mut self) {
        if matches!(self.state, ControlState::Running | ControlState::Faulted) {
            if let Err(e) = self.end_control() {
                warn!("Teardown on drop failed: {}", e);
            }
        }
    }
}
