//! Per-revision topology tests: switch map, encoder bindings and zynpot kinds.

mod common;

use common::{drivers, Call, FakeHardware};
use std::collections::HashSet;
use zyncontrol::hal::NodeHandle;
use zyncontrol::{
    ActiveLevel, ChipIndex, ExpanderPin, ExtendedPin, HardwareRevision, HostPin, ZynControl,
    ZynpotKind, NUM_ZYNPOTS,
};

fn running(revision: HardwareRevision) -> (std::sync::Arc<FakeHardware>, ZynControl) {
    let hw = FakeHardware::new();
    let mut control = ZynControl::new(drivers(&hw), revision).unwrap();
    control.init_control().unwrap();
    (hw, control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_slots_for_every_revision() {
        for rev in 1..=6 {
            let (_hw, control) = running(HardwareRevision::new(rev).unwrap());
            assert_eq!(control.zynpots().len(), NUM_ZYNPOTS);
            assert!(control.zynpots().is_complete());

            let indices: Vec<_> = control.zynpots().iter().map(|z| z.index()).collect();
            assert_eq!(indices, vec![0, 1, 2, 3]);

            let expected_digital = if rev > 2 { vec![3] } else { vec![] };
            let digital: Vec<_> = (0..NUM_ZYNPOTS)
                .filter(|&i| control.zynpot_kind(i).unwrap() == ZynpotKind::Digital)
                .collect();
            assert_eq!(digital, expected_digital, "revision {}", rev);
        }
    }

    #[test]
    fn test_no_shared_adc_channels() {
        for rev in 1..=4 {
            let (hw, control) = running(HardwareRevision::new(rev).unwrap());
            let pairs: HashSet<_> = control
                .analog_bindings()
                .iter()
                .map(|b| (b.node().handle(), b.channel()))
                .collect();
            assert_eq!(pairs.len(), control.analog_bindings().len());

            let driver_pairs: HashSet<_> = hw
                .adc_channels()
                .iter()
                .map(|&(node, channel, _)| (node, channel))
                .collect();
            assert_eq!(driver_pairs, pairs);
        }
    }

    #[test]
    fn test_switch_blocks_do_not_overlap() {
        for rev in 1..=4 {
            let (_hw, control) = running(HardwareRevision::new(rev).unwrap());
            let block = |chip: ChipIndex| -> Vec<usize> {
                control
                    .switches()
                    .iter()
                    .filter(|s| s.chip == chip)
                    .map(|s| s.index)
                    .collect()
            };
            let first = block(ChipIndex::FIRST);
            let second = block(ChipIndex::SECOND);

            assert!(first.iter().all(|i| !second.contains(i)));
            for run in [&first, &second] {
                assert!(
                    run.windows(2).all(|w| w[1] == w[0] + 1),
                    "gap in switch block {:?}",
                    run
                );
            }
        }
    }

    #[test]
    fn test_revision_1_scenario() {
        let (hw, control) = running(HardwareRevision::V1);

        // 16 switches on chip 0, 14 on chip 1, all active high.
        let switches = hw.switches();
        assert_eq!(switches.len(), 30);
        assert_eq!(switches.keys().copied().min(), Some(4));
        assert_eq!(switches.keys().copied().max(), Some(33));
        for i in 0..16u16 {
            assert_eq!(
                switches[&(4 + i as usize)],
                (ExtendedPin(100 + i), ActiveLevel::High)
            );
        }
        for i in 0..14u16 {
            assert_eq!(
                switches[&(20 + i as usize)],
                (ExtendedPin(200 + i), ActiveLevel::High)
            );
        }

        // Four analog encoders, 2 + 2.
        assert_eq!(
            hw.adc_channels(),
            vec![
                (NodeHandle(0), 0, 0),
                (NodeHandle(0), 1, 1),
                (NodeHandle(1), 0, 2),
                (NodeHandle(1), 1, 3),
            ]
        );
        assert!(hw.digital_encoders().is_empty());
        assert!((0..4).all(|i| control.zynpot_kind(i).unwrap() == ZynpotKind::Analog));

        // Revision 1 routes chip 1's interrupts to GPIO 7/8.
        let chip_1 = hw
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::ExpanderConfigure(config) if config.chip == ChipIndex::SECOND => Some(config),
                _ => None,
            })
            .unwrap();
        assert_eq!((chip_1.int_a, chip_1.int_b), (HostPin(7), HostPin(8)));
    }

    #[test]
    fn test_revision_3_scenario() {
        let (hw, control) = running(HardwareRevision::V3);

        assert_eq!(
            hw.adc_channels(),
            vec![
                (NodeHandle(0), 0, 0),
                (NodeHandle(0), 1, 1),
                (NodeHandle(1), 0, 2),
            ]
        );

        let last_switch_pin = hw
            .switches()
            .values()
            .map(|(pin, _)| *pin)
            .filter(|pin| pin.number() >= 200)
            .max()
            .unwrap();
        let encoders = hw.digital_encoders();
        assert_eq!(encoders.len(), 1);
        let (pin_a, pin_b) = encoders[&0];
        assert_eq!(pin_a.number(), last_switch_pin.number() + 1);
        assert_eq!(pin_b.number(), last_switch_pin.number() + 2);
        assert_eq!((pin_a, pin_b), (ExtendedPin(214), ExtendedPin(215)));

        // No pin serves both a switch and the encoder.
        assert!(hw
            .switches()
            .values()
            .all(|(pin, _)| *pin != pin_a && *pin != pin_b));

        assert_eq!(control.zynpot_kind(3).unwrap(), ZynpotKind::Digital);
        for i in 0..3 {
            assert_eq!(control.zynpot_kind(i).unwrap(), ZynpotKind::Analog);
        }

        let chip_1 = &control.expanders().chips()[1];
        assert_eq!((chip_1.int_a, chip_1.int_b), (HostPin(17), HostPin(27)));
    }

    #[test]
    fn test_locate_extended_pins() {
        let (_hw, control) = running(HardwareRevision::V3);
        let expanders = control.expanders();

        assert_eq!(
            expanders.locate(ExtendedPin(100)),
            Some((ChipIndex::FIRST, ExpanderPin::new(0).unwrap()))
        );
        assert_eq!(
            expanders.locate(ExtendedPin(214)),
            Some((ChipIndex::SECOND, ExpanderPin::new(14).unwrap()))
        );
        assert_eq!(expanders.locate(ExtendedPin(116)), None);
        assert_eq!(expanders.locate(ExtendedPin(42)), None);
    }

    #[test]
    fn test_adc_nodes_share_configuration() {
        let (_hw, control) = running(HardwareRevision::V2);
        let nodes: Vec<_> = control
            .analog_bindings()
            .iter()
            .map(|b| *b.node().config())
            .collect();
        assert!(nodes
            .iter()
            .all(|n| n.gain == nodes[0].gain && n.rate == nodes[0].rate));
        let addresses: HashSet<_> = nodes.iter().map(|n| n.address.value()).collect();
        assert_eq!(addresses, HashSet::from([0x48, 0x49]));
    }
}
