//! Recording test double for every driver interface.
//!
//! One `FakeHardware` stands in for all six drivers. It logs each call in order,
//! keeps enough state to tell whether the hardware is configured, and lets tests
//! raise expander interrupts and inject failures.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use zyncontrol::adc::AdcNodeConfig;
use zyncontrol::expander::ExpanderConfig;
use zyncontrol::hal::{
    AdcDriver, AnalogHandle, DigitalEncoderDriver, Drivers, ExpanderDriver, InterruptRegistry,
    NodeHandle, SwitchDriver, VolumeDriver,
};
use zyncontrol::interrupt::BankIsrs;
use zyncontrol::{ActiveLevel, Bank, ChipIndex, Error, ExtendedPin, I2cAddress, Result};

pub const VOLUME_MAX: u8 = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IrqInit,
    IrqStart,
    IrqStop,
    ExpanderReset,
    ExpanderConfigure(ExpanderConfig),
    ExpanderScan(ChipIndex, Bank),
    SwitchReset,
    SwitchConfigure(usize, ExtendedPin, ActiveLevel),
    AdcReset,
    AdcNode(I2cAddress),
    AdcChannel(NodeHandle, u8, usize),
    AdcStart,
    AdcStop,
    AdcRead(AnalogHandle),
    EncoderReset,
    EncoderConfigure(usize, ExtendedPin, ExtendedPin),
    EncoderRead(usize),
    VolumeInit,
    VolumeEnd,
    VolumeSet(u8),
}

impl Call {
    /// True for calls that configure hardware (as opposed to resets, reads and
    /// delivery control).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Call::ExpanderConfigure(_)
                | Call::SwitchConfigure(..)
                | Call::AdcNode(_)
                | Call::AdcChannel(..)
                | Call::AdcStart
                | Call::EncoderConfigure(..)
        )
    }
}

/// Observable hardware state, for comparing "before" and "after".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HwSnapshot {
    pub delivering: bool,
    pub expanders: usize,
    pub switches: usize,
    pub adc_nodes: usize,
    pub adc_channels: usize,
    pub sampling: bool,
    pub digital_encoders: usize,
    pub volume_on: bool,
}

#[derive(Default)]
struct HwState {
    calls: Vec<Call>,
    delivering: bool,
    isrs: BTreeMap<ChipIndex, BankIsrs>,
    pending: HashMap<(ChipIndex, Bank), u8>,
    switches: BTreeMap<usize, (ExtendedPin, ActiveLevel)>,
    adc_nodes: Vec<AdcNodeConfig>,
    adc_channels: Vec<(NodeHandle, u8, usize)>,
    sampling: bool,
    analog_deltas: HashMap<usize, i32>,
    digital: BTreeMap<usize, (ExtendedPin, ExtendedPin)>,
    digital_deltas: HashMap<usize, i32>,
    volume_on: bool,
    volume: u8,
    fail_on: Option<&'static str>,
}

#[derive(Default)]
pub struct FakeHardware {
    state: Mutex<HwState>,
    in_flight: [AtomicUsize; 4],
    overlap: AtomicBool,
    read_delay_ms: AtomicUsize,
}

impl FakeHardware {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeHardware::default())
    }

    fn lock(&self) -> MutexGuard<'_, HwState> {
        self.state.lock().unwrap()
    }

    fn enter(&self, name: &'static str, call: Call) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.fail_on == Some(name) {
            return Err(Error::bus(name, "injected failure"));
        }
        Ok(())
    }

    // --- Test controls ---

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Makes the method named `name` (e.g. "switch.configure") fail.
    pub fn fail_on(&self, name: &'static str) {
        self.lock().fail_on = Some(name);
    }

    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    pub fn snapshot(&self) -> HwSnapshot {
        let state = self.lock();
        HwSnapshot {
            delivering: state.delivering,
            expanders: state.isrs.len(),
            switches: state.switches.len(),
            adc_nodes: state.adc_nodes.len(),
            adc_channels: state.adc_channels.len(),
            sampling: state.sampling,
            digital_encoders: state.digital.len(),
            volume_on: state.volume_on,
        }
    }

    pub fn switches(&self) -> BTreeMap<usize, (ExtendedPin, ActiveLevel)> {
        self.lock().switches.clone()
    }

    pub fn adc_channels(&self) -> Vec<(NodeHandle, u8, usize)> {
        self.lock().adc_channels.clone()
    }

    pub fn digital_encoders(&self) -> BTreeMap<usize, (ExtendedPin, ExtendedPin)> {
        self.lock().digital.clone()
    }

    /// Bank handlers the expander driver received for `chip`.
    pub fn isrs(&self, chip: ChipIndex) -> Option<BankIsrs> {
        self.lock().isrs.get(&chip).cloned()
    }

    /// Queues `changed` for the next scan of (chip, bank) and, if delivery is on,
    /// runs the bank's handler as the interrupt dispatcher would.
    pub fn raise(&self, chip: ChipIndex, bank: Bank, changed: u8) {
        let isrs = {
            let mut state = self.lock();
            *state.pending.entry((chip, bank)).or_default() |= changed;
            if !state.delivering {
                return;
            }
            state.isrs.get(&chip).cloned()
        };
        if let Some(isrs) = isrs {
            isrs.fire(bank);
        }
    }

    pub fn turn_analog(&self, handle: AnalogHandle, delta: i32) {
        *self.lock().analog_deltas.entry(handle.0).or_default() += delta;
    }

    pub fn turn_digital(&self, index: usize, delta: i32) {
        *self.lock().digital_deltas.entry(index).or_default() += delta;
    }

    /// Makes analog reads take `ms` milliseconds, to expose overlapping reads.
    pub fn set_read_delay_ms(&self, ms: usize) {
        self.read_delay_ms.store(ms, Ordering::Relaxed);
    }

    /// True if two reads on one ADC node ever overlapped.
    pub fn saw_overlapping_reads(&self) -> bool {
        self.overlap.load(Ordering::Relaxed)
    }
}

/// Wires one fake into every driver slot.
pub fn drivers(hw: &Arc<FakeHardware>) -> Drivers {
    Drivers {
        interrupts: hw.clone(),
        expanders: hw.clone(),
        switches: hw.clone(),
        adc: hw.clone(),
        encoders: hw.clone(),
        volume: hw.clone(),
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

impl InterruptRegistry for FakeHardware {
    fn init(&self) -> Result<()> {
        self.enter("irq.init", Call::IrqInit)
    }

    fn start(&self) -> Result<()> {
        self.enter("irq.start", Call::IrqStart)?;
        self.lock().delivering = true;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.lock().delivering = false;
        self.enter("irq.stop", Call::IrqStop)
    }
}

impl ExpanderDriver for FakeHardware {
    fn reset_all(&self) -> Result<()> {
        let mut state = self.lock();
        state.isrs.clear();
        state.pending.clear();
        drop(state);
        self.enter("expander.reset", Call::ExpanderReset)
    }

    fn configure(&self, config: &ExpanderConfig, isrs: BankIsrs) -> Result<()> {
        self.enter("expander.configure", Call::ExpanderConfigure(config.clone()))?;
        self.lock().isrs.insert(config.chip, isrs);
        Ok(())
    }

    fn scan(&self, chip: ChipIndex, bank: Bank) -> Result<u8> {
        self.enter("expander.scan", Call::ExpanderScan(chip, bank))?;
        Ok(self.lock().pending.remove(&(chip, bank)).unwrap_or(0))
    }
}

impl SwitchDriver for FakeHardware {
    fn reset_all(&self) -> Result<()> {
        self.lock().switches.clear();
        self.enter("switch.reset", Call::SwitchReset)
    }

    fn configure(&self, index: usize, pin: ExtendedPin, active: ActiveLevel) -> Result<()> {
        self.enter("switch.configure", Call::SwitchConfigure(index, pin, active))?;
        self.lock().switches.insert(index, (pin, active));
        Ok(())
    }
}

impl AdcDriver for FakeHardware {
    fn reset_all(&self) -> Result<()> {
        let mut state = self.lock();
        state.adc_nodes.clear();
        state.adc_channels.clear();
        state.sampling = false;
        drop(state);
        self.enter("adc.reset", Call::AdcReset)
    }

    fn configure_node(&self, config: &AdcNodeConfig) -> Result<NodeHandle> {
        self.enter("adc.node", Call::AdcNode(config.address))?;
        let mut state = self.lock();
        state.adc_nodes.push(*config);
        Ok(NodeHandle(state.adc_nodes.len() - 1))
    }

    fn configure_channel(
        &self,
        node: NodeHandle,
        channel: u8,
        index: usize,
    ) -> Result<AnalogHandle> {
        self.enter("adc.channel", Call::AdcChannel(node, channel, index))?;
        let mut state = self.lock();
        state.adc_channels.push((node, channel, index));
        Ok(AnalogHandle(state.adc_channels.len() - 1))
    }

    fn start_sampling(&self) -> Result<()> {
        self.enter("adc.start", Call::AdcStart)?;
        self.lock().sampling = true;
        Ok(())
    }

    fn stop_sampling(&self) -> Result<()> {
        self.lock().sampling = false;
        self.enter("adc.stop", Call::AdcStop)
    }

    fn read_delta(&self, encoder: AnalogHandle) -> Result<i32> {
        self.enter("adc.read", Call::AdcRead(encoder))?;
        let node = {
            let state = self.lock();
            state
                .adc_channels
                .get(encoder.0)
                .map(|(node, _, _)| node.0)
                .ok_or_else(|| Error::bus("adc", "unknown encoder handle"))?
        };

        if self.in_flight[node].fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlap.store(true, Ordering::SeqCst);
        }
        let delay = self.read_delay_ms.load(Ordering::Relaxed);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay as u64));
        }
        self.in_flight[node].fetch_sub(1, Ordering::SeqCst);

        Ok(self
            .lock()
            .analog_deltas
            .remove(&encoder.0)
            .unwrap_or(0))
    }
}

impl DigitalEncoderDriver for FakeHardware {
    fn reset_all(&self) -> Result<()> {
        let mut state = self.lock();
        state.digital.clear();
        state.digital_deltas.clear();
        drop(state);
        self.enter("encoder.reset", Call::EncoderReset)
    }

    fn configure(&self, index: usize, pin_a: ExtendedPin, pin_b: ExtendedPin) -> Result<()> {
        self.enter("encoder.configure", Call::EncoderConfigure(index, pin_a, pin_b))?;
        self.lock().digital.insert(index, (pin_a, pin_b));
        Ok(())
    }

    fn read_delta(&self, index: usize) -> Result<i32> {
        self.enter("encoder.read", Call::EncoderRead(index))?;
        Ok(self.lock().digital_deltas.remove(&index).unwrap_or(0))
    }
}

impl VolumeDriver for FakeHardware {
    fn init(&self) -> Result<()> {
        self.enter("volume.init", Call::VolumeInit)?;
        self.lock().volume_on = true;
        Ok(())
    }

    fn end(&self) -> Result<()> {
        self.lock().volume_on = false;
        self.enter("volume.end", Call::VolumeEnd)
    }

    fn set(&self, level: u8) -> Result<u8> {
        self.enter("volume.set", Call::VolumeSet(level))?;
        let mut state = self.lock();
        state.volume = level.min(VOLUME_MAX);
        Ok(state.volume)
    }

    fn get(&self) -> Result<u8> {
        Ok(self.lock().volume)
    }

    fn get_max(&self) -> Result<u8> {
        Ok(VOLUME_MAX)
    }
}
