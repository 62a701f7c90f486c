//! Expander bank interrupt handlers.
//!
//! Every expander chip has two interrupt lines, one per bank. Each line gets a
//! zero-argument handler that scans exactly that (chip, bank) pair. Handlers only
//! call the driver's scan routine and bump that bank's own counters, so handlers of
//! different banks never contend on shared state.

use crate::consts;
use crate::gpio::{Bank, ChipIndex};
use crate::hal::ExpanderDriver;
use log::{trace, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Handler attached to one interrupt line.
pub type BankIsr = Arc<dyn Fn() + Send + Sync>;

/// The two bank handlers of one chip, indexed by [`Bank`].
#[derive(Clone)]
pub struct BankIsrs {
    handlers: [BankIsr; consts::BANKS_PER_CHIP],
}

impl BankIsrs {
    pub fn new(bank_a: BankIsr, bank_b: BankIsr) -> Self {
        BankIsrs {
            handlers: [bank_a, bank_b],
        }
    }

    /// Returns the handler for `bank`.
    pub fn get(&self, bank: Bank) -> &BankIsr {
        &self.handlers[bank.index()]
    }

    /// Runs the handler for `bank`, as the interrupt dispatcher would.
    pub fn fire(&self, bank: Bank) {
        let handler = &self.handlers[bank.index()];
        handler()
    }
}

impl fmt::Debug for BankIsrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankIsrs").finish_non_exhaustive()
    }
}

/// Snapshot of one bank's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankStats {
    /// Handler invocations.
    pub interrupts: u64,
    /// Invocations whose scan found no changed pin.
    pub spurious: u64,
    /// Total changed pins reported by scans.
    pub pin_events: u64,
    /// Scans that failed on the bus.
    pub scan_errors: u64,
}

/// Counters owned by a single (chip, bank) pair.
#[derive(Debug, Default)]
pub struct BankCounters {
    interrupts: AtomicU64,
    spurious: AtomicU64,
    pin_events: AtomicU64,
    scan_errors: AtomicU64,
}

impl BankCounters {
    pub fn snapshot(&self) -> BankStats {
        BankStats {
            interrupts: self.interrupts.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            pin_events: self.pin_events.load(Ordering::Relaxed),
            scan_errors: self.scan_errors.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.interrupts.store(0, Ordering::Relaxed);
        self.spurious.store(0, Ordering::Relaxed);
        self.pin_events.store(0, Ordering::Relaxed);
        self.scan_errors.store(0, Ordering::Relaxed);
    }
}

/// Interrupt counters for every (chip, bank) pair.
#[derive(Debug, Default)]
pub struct InterruptStats {
    banks: [[BankCounters; consts::BANKS_PER_CHIP]; consts::NUM_EXPANDERS],
}

impl InterruptStats {
    pub fn bank(&self, chip: ChipIndex, bank: Bank) -> &BankCounters {
        &self.banks[chip.index()][bank.index()]
    }

    pub fn reset(&self) {
        self.banks.iter().flatten().for_each(BankCounters::reset);
    }
}

/// Builds the bank A/B handlers for `chip`.
///
/// Handlers keep only a weak reference to the driver: once the driver is dropped
/// a late interrupt is ignored.
pub(crate) fn bank_isrs(
    chip: ChipIndex,
    driver: Weak<dyn ExpanderDriver>,
    stats: Arc<InterruptStats>,
) -> BankIsrs {
    let make = |bank: Bank| -> BankIsr {
        let driver = driver.clone();
        let stats = Arc::clone(&stats);
        Arc::new(move || service_bank(chip, bank, &driver, &stats))
    };
    BankIsrs::new(make(Bank::A), make(Bank::B))
}

fn service_bank(
    chip: ChipIndex,
    bank: Bank,
    driver: &Weak<dyn ExpanderDriver>,
    stats: &InterruptStats,
) {
    let Some(driver) = driver.upgrade() else {
        trace!(
            "Interrupt on expander {} bank {} after driver release, ignored",
            chip,
            bank
        );
        return;
    };
    let counters = stats.bank(chip, bank);
    counters.interrupts.fetch_add(1, Ordering::Relaxed);

    match driver.scan(chip, bank) {
        Ok(0) => {
            counters.spurious.fetch_add(1, Ordering::Relaxed);
            trace!("Spurious interrupt on expander {} bank {}", chip, bank);
        }
        Ok(changed) => {
            counters
                .pin_events
                .fetch_add(changed.count_ones() as u64, Ordering::Relaxed);
            trace!(
                "Expander {} bank {} changed pins: {:08b}",
                chip,
                bank,
                changed
            );
        }
        Err(e) => {
            counters.scan_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Scan of expander {} bank {} failed: {}", chip, bank, e);
        }
    }
}
