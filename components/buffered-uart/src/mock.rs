//! In-memory UART for host tests and simulation
//!
//! Records everything the driver does to the "registers" and lets a test
//! script what the receive register returns. Shared with a simulated
//! interrupt thread through `&MockUart`.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use critical_section::Mutex;

use crate::config::{InterruptLevel, UartConfig};
use crate::peripheral::{RxFrame, SerialPeripheral, UartControl};
use crate::ConfigError;

/// Scriptable UART peripheral
pub struct MockUart {
    transmit_empty: AtomicBool,
    // Set by every data register write, consumed by the simulated interrupt source
    transmit_irq: AtomicBool,
    written: Mutex<RefCell<Vec<u8>>>,
    rx_script: Mutex<RefCell<VecDeque<RxFrame>>>,
    tx_acks: AtomicUsize,
    rx_acks: AtomicUsize,
    latch_clears: AtomicUsize,
    applied: Mutex<Cell<Option<UartConfig>>>,
    tx_level: Mutex<Cell<Option<InterruptLevel>>>,
    rx_level: Mutex<Cell<Option<InterruptLevel>>>,
    reject_config: Option<ConfigError>,
}

impl MockUart {
    /// Idle peripheral with an empty transmit register
    pub const fn new() -> Self {
        Self {
            transmit_empty: AtomicBool::new(true),
            transmit_irq: AtomicBool::new(false),
            written: Mutex::new(RefCell::new(Vec::new())),
            rx_script: Mutex::new(RefCell::new(VecDeque::new())),
            tx_acks: AtomicUsize::new(0),
            rx_acks: AtomicUsize::new(0),
            latch_clears: AtomicUsize::new(0),
            applied: Mutex::new(Cell::new(None)),
            tx_level: Mutex::new(Cell::new(None)),
            rx_level: Mutex::new(Cell::new(None)),
            reject_config: None,
        }
    }

    /// Peripheral whose `configure` fails with `error`
    pub fn rejecting(error: ConfigError) -> Self {
        Self {
            reject_config: Some(error),
            ..Self::new()
        }
    }

    /// Force the transmit-empty flag; `false` models a wedged transmitter
    pub fn set_transmit_empty(&self, empty: bool) {
        self.transmit_empty.store(empty, Ordering::SeqCst);
    }

    /// Queue a frame for the next `read_status_and_data`
    pub fn push_frame(&self, frame: RxFrame) {
        critical_section::with(|cs| self.rx_script.borrow_ref_mut(cs).push_back(frame));
    }

    /// Frames still waiting to be read by the driver
    pub fn frames_pending(&self) -> usize {
        critical_section::with(|cs| self.rx_script.borrow_ref(cs).len())
    }

    /// Every byte written to the data register so far
    pub fn written(&self) -> Vec<u8> {
        critical_section::with(|cs| self.written.borrow_ref(cs).clone())
    }

    /// Take and clear the recorded data register writes
    pub fn take_written(&self) -> Vec<u8> {
        critical_section::with(|cs| core::mem::take(&mut *self.written.borrow_ref_mut(cs)))
    }

    /// True once per data register write, like a transmit interrupt request
    pub fn take_transmit_irq(&self) -> bool {
        self.transmit_irq.swap(false, Ordering::SeqCst)
    }

    pub fn tx_acks(&self) -> usize {
        self.tx_acks.load(Ordering::SeqCst)
    }

    pub fn rx_acks(&self) -> usize {
        self.rx_acks.load(Ordering::SeqCst)
    }

    pub fn latch_clears(&self) -> usize {
        self.latch_clears.load(Ordering::SeqCst)
    }

    /// Configuration applied through `UartControl::configure`
    pub fn applied_config(&self) -> Option<UartConfig> {
        critical_section::with(|cs| self.applied.borrow(cs).get())
    }

    /// Levels passed to the interrupt enables, `(tx, rx)`
    pub fn interrupt_levels(&self) -> (Option<InterruptLevel>, Option<InterruptLevel>) {
        critical_section::with(|cs| {
            (self.tx_level.borrow(cs).get(), self.rx_level.borrow(cs).get())
        })
    }
}

impl Default for MockUart {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPeripheral for MockUart {
    fn write_data(&self, byte: u8) {
        critical_section::with(|cs| self.written.borrow_ref_mut(cs).push(byte));
        self.transmit_irq.store(true, Ordering::SeqCst);
    }

    fn read_status_and_data(&self) -> RxFrame {
        critical_section::with(|cs| self.rx_script.borrow_ref_mut(cs).pop_front())
            .unwrap_or_default()
    }

    fn is_transmit_empty(&self) -> bool {
        self.transmit_empty.load(Ordering::SeqCst)
    }

    fn acknowledge_transmit_interrupt(&self) {
        self.tx_acks.fetch_add(1, Ordering::SeqCst);
    }

    fn acknowledge_receive_interrupt(&self) {
        self.rx_acks.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_receive_error_latch(&self) {
        self.latch_clears.fetch_add(1, Ordering::SeqCst);
    }
}

impl UartControl for MockUart {
    fn configure(&mut self, config: &UartConfig) -> Result<(), ConfigError> {
        if let Some(error) = self.reject_config {
            return Err(error);
        }
        critical_section::with(|cs| self.applied.borrow(cs).set(Some(*config)));
        Ok(())
    }

    fn enable_transmit_interrupt(&mut self, level: InterruptLevel) {
        critical_section::with(|cs| self.tx_level.borrow(cs).set(Some(level)));
    }

    fn enable_receive_interrupt(&mut self, level: InterruptLevel) {
        critical_section::with(|cs| self.rx_level.borrow(cs).set(Some(level)));
    }
}
