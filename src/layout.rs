//! Hardware layout for one board revision.
//!
//! A [`ControlLayout`] is plain configuration data: the expanders, switch blocks,
//! ADC nodes, encoder placements and zynpot slots of a board. Build one with
//! [`ControlLayout::for_revision`] or assemble it by hand and call
//! [`ControlLayout::validate`].

use crate::adc::{AdcNodeConfig, AnalogChannel};
use crate::consts;
use crate::error::{pin_claimed_twice, Error, Result};
use crate::expander::{validate_expanders, ExpanderConfig};
use crate::gpio::{ActiveLevel, ChipIndex, ExpanderPin, ExtendedPin, HostPin};
use crate::revision::{HardwareRevision, Topology};
use crate::switch::{plan_switches, SwitchBlock, SwitchBinding};
use crate::zynpot::{DigitalEncoderBinding, ZynpotSource};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLayout {
    pub revision: HardwareRevision,
    /// Expanders in configuration order (chip 0 first).
    pub expanders: Vec<ExpanderConfig>,
    pub switch_blocks: Vec<SwitchBlock>,
    pub adc_nodes: Vec<AdcNodeConfig>,
    pub analog_channels: Vec<AnalogChannel>,
    pub digital_encoders: Vec<DigitalEncoderBinding>,
    /// Backing of each zynpot slot, indexed by slot.
    pub zynpots: Vec<ZynpotSource>,
}

impl ControlLayout {
    /// The layout of the Z2 control board for `revision`.
    pub fn for_revision(revision: HardwareRevision) -> Result<Self> {
        let (int_a_2, int_b_2) = revision.expander_2_interrupt_pins();
        let expanders = vec![
            ExpanderConfig {
                chip: ChipIndex::FIRST,
                base_pin: consts::expander_1::BASE_PIN,
                address: consts::expander_1::I2C_ADDRESS,
                int_a: HostPin(consts::expander_1::INTA_PIN),
                int_b: HostPin(consts::expander_1::INTB_PIN),
            },
            ExpanderConfig {
                chip: ChipIndex::SECOND,
                base_pin: consts::expander_2::BASE_PIN,
                address: consts::expander_2::I2C_ADDRESS,
                int_a: int_a_2,
                int_b: int_b_2,
            },
        ];

        let switch_blocks = vec![
            SwitchBlock {
                chip: ChipIndex::FIRST,
                first_index: consts::FIRST_SWITCH_INDEX,
                first_pin: ExpanderPin::new(0)?,
                count: consts::SWITCHES_ON_EXPANDER_1,
                active: ActiveLevel::High,
            },
            SwitchBlock {
                chip: ChipIndex::SECOND,
                first_index: consts::FIRST_SWITCH_INDEX
                    + consts::SWITCHES_ON_EXPANDER_1 as usize,
                first_pin: ExpanderPin::new(0)?,
                count: consts::SWITCHES_ON_EXPANDER_2,
                active: ActiveLevel::High,
            },
        ];

        let adc_nodes = vec![
            AdcNodeConfig {
                address: consts::RV112_ADS1115_I2C_ADDRESS_1,
                gain: consts::RV112_ADS1115_GAIN,
                rate: consts::RV112_ADS1115_RATE,
            },
            AdcNodeConfig {
                address: consts::RV112_ADS1115_I2C_ADDRESS_2,
                gain: consts::RV112_ADS1115_GAIN,
                rate: consts::RV112_ADS1115_RATE,
            },
        ];

        let place = |index: usize, node: usize, channel: u8| AnalogChannel {
            index,
            node,
            channel,
        };
        let (analog_channels, digital_encoders, zynpots): (
            Vec<AnalogChannel>,
            Vec<DigitalEncoderBinding>,
            Vec<ZynpotSource>,
        ) = match revision.topology() {
            Topology::FourAnalog => (
                vec![place(0, 0, 0), place(1, 0, 1), place(2, 1, 0), place(3, 1, 1)],
                Vec::new(),
                (0..consts::NUM_ZYNPOTS).map(ZynpotSource::Analog).collect(),
            ),
            Topology::ThreeAnalogOneDigital => {
                let chip = &expanders[ChipIndex::SECOND.index()];
                let pec11 = DigitalEncoderBinding {
                    index: 0,
                    pin_a: chip.pin(ExpanderPin::new(consts::DIGITAL_ENCODER_PIN_A)?),
                    pin_b: chip.pin(ExpanderPin::new(consts::DIGITAL_ENCODER_PIN_B)?),
                };
                (
                    vec![place(0, 0, 0), place(1, 0, 1), place(2, 1, 0)],
                    vec![pec11],
                    vec![
                        ZynpotSource::Analog(0),
                        ZynpotSource::Analog(1),
                        ZynpotSource::Analog(2),
                        ZynpotSource::Digital(0),
                    ],
                )
            }
        };

        let layout = ControlLayout {
            revision,
            expanders,
            switch_blocks,
            adc_nodes,
            analog_channels,
            digital_encoders,
            zynpots,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// The layout selected by the build's revision features.
    pub fn from_build() -> Result<Self> {
        Self::for_revision(HardwareRevision::from_build())
    }

    /// Pins held by digital encoders, paired with the encoder index.
    pub fn reserved_pins(&self) -> Vec<(ExtendedPin, usize)> {
        self.digital_encoders
            .iter()
            .flat_map(|e| [(e.pin_a, e.index), (e.pin_b, e.index)])
            .collect()
    }

    /// The switch bindings this layout produces.
    pub fn switch_plan(&self) -> Result<Vec<SwitchBinding>> {
        plan_switches(&self.expanders, &self.switch_blocks, &self.reserved_pins())
    }

    /// Checks every cross-component invariant of the layout.
    pub fn validate(&self) -> Result<()> {
        validate_expanders(&self.expanders)?;
        self.validate_digital_encoders()?;
        self.switch_plan()?;
        self.validate_adc()?;
        self.validate_zynpots()
    }

    fn validate_digital_encoders(&self) -> Result<()> {
        let mut pins: HashSet<ExtendedPin> = HashSet::new();
        let mut indices = HashSet::new();
        for encoder in &self.digital_encoders {
            if !indices.insert(encoder.index) {
                return Err(Error::EncoderSlotConflict {
                    index: encoder.index,
                });
            }
            for pin in [encoder.pin_a, encoder.pin_b] {
                if !self.expanders.iter().any(|c| c.contains(pin)) {
                    return Err(Error::ArgumentOutOfRange(format!(
                        "Digital encoder {} pin {} is not on any expander",
                        encoder.index, pin
                    )));
                }
                if !pins.insert(pin) {
                    return Err(pin_claimed_twice(
                        pin,
                        "a digital encoder",
                        &format!("digital encoder {}", encoder.index),
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_adc(&self) -> Result<()> {
        if self.adc_nodes.len() > consts::MAX_NUM_ADS1115 {
            return Err(Error::PoolExhausted {
                max: consts::MAX_NUM_ADS1115,
            });
        }
        let mut addresses: HashSet<_> = self.expanders.iter().map(|c| c.address).collect();
        for node in &self.adc_nodes {
            if !addresses.insert(node.address) {
                return Err(Error::BusAddressConflict {
                    address: node.address,
                });
            }
        }

        let mut used = HashSet::new();
        let mut indices = HashSet::new();
        for placement in &self.analog_channels {
            let node = self.adc_nodes.get(placement.node).ok_or_else(|| {
                Error::ArgumentOutOfRange(format!(
                    "Analog encoder {} names ADC node slot {} ({} nodes)",
                    placement.index,
                    placement.node,
                    self.adc_nodes.len()
                ))
            })?;
            if placement.channel >= consts::ENCODER_CHANNELS_PER_ADS1115 {
                return Err(Error::ChannelOutOfRange {
                    channel: placement.channel,
                    count: consts::ENCODER_CHANNELS_PER_ADS1115,
                });
            }
            if !indices.insert(placement.index) {
                return Err(Error::EncoderSlotConflict {
                    index: placement.index,
                });
            }
            if !used.insert((placement.node, placement.channel)) {
                let existing = self
                    .analog_channels
                    .iter()
                    .find(|p| p.node == placement.node && p.channel == placement.channel)
                    .map_or(placement.index, |p| p.index);
                return Err(Error::ChannelConflict {
                    address: node.address,
                    channel: placement.channel,
                    existing,
                });
            }
        }
        Ok(())
    }

    fn validate_zynpots(&self) -> Result<()> {
        if self.zynpots.len() != consts::NUM_ZYNPOTS {
            return Err(Error::ArgumentOutOfRange(format!(
                "Layout defines {} zynpots, expected {}",
                self.zynpots.len(),
                consts::NUM_ZYNPOTS
            )));
        }
        let mut used = HashSet::new();
        for (slot, source) in self.zynpots.iter().enumerate() {
            let exists = match *source {
                ZynpotSource::Analog(i) => self.analog_channels.iter().any(|p| p.index == i),
                ZynpotSource::Digital(i) => self.digital_encoders.iter().any(|e| e.index == i),
            };
            if !exists {
                return Err(Error::ArgumentOutOfRange(format!(
                    "Zynpot {} is backed by missing {:?}",
                    slot, source
                )));
            }
            if !used.insert(*source) {
                return Err(Error::EncoderSlotConflict { index: slot });
            }
        }
        Ok(())
    }
}
