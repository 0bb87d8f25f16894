//! Buffered serial port
//!
//! Owns the transmit and receive queues and implements the stall/resume
//! transmit protocol.
//!
//! # Concurrency
//! Foreground code and the two interrupt handlers share the port through
//! `&self`. Every queue access happens inside one short
//! `critical_section::with` scope. The stall flag is an `AtomicBool` with
//! load/store only, so targets without compare-and-swap are fine. Busy-waits
//! run outside any critical section so the interrupt handlers can make
//! progress while foreground code spins.

use core::cell::{Cell, RefCell};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use tinyuart_fifo::RingBuffer;

use crate::config::{PortConfig, UartConfig, WaitPolicy};
use crate::peripheral::{RxErrors, SerialPeripheral, UartControl};
use crate::stats::{SerialStats, StatsSnapshot};
use crate::{ConfigError, Result, SerialError, WaitTarget};

/// Transmit side state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitState {
    /// Interrupt-driven draining is in progress
    Active,
    /// No drain pending; the next write must prime the data register
    Stalled,
}

/// Interrupt-driven full-duplex serial port
///
/// # Type Parameters
/// * `P` - Peripheral register access
/// * `TX` - Outbound queue capacity in bytes
/// * `RX` - Inbound queue capacity in bytes
///
/// # Example
/// ```ignore
/// static PORT: BufferedSerialPort<Uart0, 16, 16> =
///     BufferedSerialPort::new(Uart0::new(), PortConfig::new());
///
/// PORT.write(b'A')?;
/// while PORT.available() > 0 {
///     let byte = PORT.read();
/// }
/// ```
pub struct BufferedSerialPort<P, const TX: usize, const RX: usize> {
    peripheral: P,
    tx: Mutex<RefCell<RingBuffer<u8, TX>>>,
    rx: Mutex<RefCell<RingBuffer<u8, RX>>>,
    transmit_stalled: AtomicBool,
    rx_errors: Mutex<Cell<RxErrors>>,
    stats: SerialStats,
    config: PortConfig,
}

impl<P: SerialPeripheral, const TX: usize, const RX: usize> BufferedSerialPort<P, TX, RX> {
    /// Outbound occupancy at which `write` stops queueing and waits for a full drain
    pub const WATERMARK: usize = TX * 7 / 8;

    /// Create a port over an already configured peripheral
    ///
    /// The port starts stalled: nothing is in flight until the first write.
    pub const fn new(peripheral: P, config: PortConfig) -> Self {
        Self {
            peripheral,
            tx: Mutex::new(RefCell::new(RingBuffer::new())),
            rx: Mutex::new(RefCell::new(RingBuffer::new())),
            transmit_stalled: AtomicBool::new(true),
            rx_errors: Mutex::new(Cell::new(RxErrors::empty())),
            stats: SerialStats::new(),
            config,
        }
    }

    /// Configure the peripheral, enable both interrupts, and build the port
    ///
    /// # Errors
    /// Whatever the chip layer reports for `uart`
    pub fn init(
        mut peripheral: P,
        uart: &UartConfig,
        config: PortConfig,
    ) -> core::result::Result<Self, ConfigError>
    where
        P: UartControl,
    {
        peripheral.configure(uart)?;
        peripheral.enable_transmit_interrupt(uart.tx_level);
        peripheral.enable_receive_interrupt(uart.rx_level);

        log::info!(
            "UART ready: {:?}/{:?}/{:?}, divisor {} ({:?}), levels tx={} rx={}",
            uart.data_bits,
            uart.parity,
            uart.stop_bits,
            uart.baud_divisor,
            uart.prescaler,
            uart.tx_level.get(),
            uart.rx_level.get(),
        );

        Ok(Self::new(peripheral, config))
    }

    /// Underlying peripheral
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Queue one byte for transmission
    ///
    /// Blocks while the outbound queue is at or above the watermark, until it
    /// has drained completely, then queues the byte and kicks the transmitter
    /// if it is stalled.
    ///
    /// # Errors
    /// `SerialError::Timeout` only with `WaitPolicy::Spins`; with
    /// `WaitPolicy::Forever` this never fails.
    pub fn write(&self, byte: u8) -> Result<()> {
        if self.pending() >= Self::WATERMARK {
            self.resume_if_stalled()?;
            self.wait_until(WaitTarget::Drain, || self.pending() == 0)?;
        }

        let outcome = critical_section::with(|cs| self.tx.borrow_ref_mut(cs).put(byte));
        if outcome.overwrote() {
            // Only reachable when several writers race past the watermark
            log::warn!("outbound queue overflowed, oldest byte lost");
        }

        self.resume_if_stalled()
    }

    /// Queue every byte of `bytes`, in order
    pub fn write_all(&self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.write(byte)?;
        }
        Ok(())
    }

    /// Restart a stalled transmitter if there is something to send
    ///
    /// No-op when the transmitter is active or the outbound queue is empty.
    /// Otherwise waits for the data register to empty, then loads the oldest
    /// queued byte into it and clears the stall flag.
    pub fn resume_if_stalled(&self) -> Result<()> {
        if !self.is_stalled() || self.pending() == 0 {
            return Ok(());
        }

        self.wait_until(WaitTarget::TransmitEmpty, || self.peripheral.is_transmit_empty())?;

        critical_section::with(|cs| {
            // Re-check: another context may have resumed while we waited
            if !self.transmit_stalled.load(Ordering::Acquire) {
                return;
            }
            if let Some(byte) = self.tx.borrow_ref_mut(cs).get() {
                self.transmit_stalled.store(false, Ordering::Release);
                self.peripheral.write_data(byte);
                self.stats.record(cs, |s| {
                    s.transmitted = s.transmitted.wrapping_add(1);
                    s.resumes = s.resumes.wrapping_add(1);
                });
                log::trace!("transmit resumed");
            }
        });

        Ok(())
    }

    /// Transmit-ready interrupt handler
    ///
    /// Feeds the next queued byte to the peripheral, or marks the port
    /// stalled when the queue is empty. Always acknowledges the interrupt.
    pub fn on_transmit_ready(&self) {
        critical_section::with(|cs| match self.tx.borrow_ref_mut(cs).get() {
            Some(byte) => {
                // A byte is in flight again, whoever queued it
                self.transmit_stalled.store(false, Ordering::Release);
                self.peripheral.write_data(byte);
                self.stats.record(cs, |s| s.transmitted = s.transmitted.wrapping_add(1));
            }
            None => {
                self.transmit_stalled.store(true, Ordering::Release);
                self.stats.record(cs, |s| s.stalls = s.stalls.wrapping_add(1));
                log::trace!("transmit stalled");
            }
        });

        self.peripheral.acknowledge_transmit_interrupt();
    }

    /// Receive-ready interrupt handler
    ///
    /// Frames with any error flag are dropped after clearing the error latch.
    /// Good frames are queued; a full inbound queue loses its oldest byte.
    /// Always acknowledges the interrupt.
    pub fn on_receive_ready(&self) {
        let frame = self.peripheral.read_status_and_data();

        if frame.errors.is_empty() {
            let overwrote = critical_section::with(|cs| {
                let overwrote = self.rx.borrow_ref_mut(cs).put(frame.data).overwrote();
                self.stats.record(cs, |s| {
                    s.received = s.received.wrapping_add(1);
                    if overwrote {
                        s.overwritten = s.overwritten.wrapping_add(1);
                    }
                });
                overwrote
            });
            if overwrote {
                log::debug!("inbound queue full, oldest byte overwritten");
            }
        } else {
            self.peripheral.clear_receive_error_latch();
            critical_section::with(|cs| {
                let latched = self.rx_errors.borrow(cs);
                latched.set(latched.get() | frame.errors);
                self.stats.record(cs, |s| s.dropped_frames = s.dropped_frames.wrapping_add(1));
            });
            log::debug!("receive error {:?}, frame dropped", frame.errors);
        }

        self.peripheral.acknowledge_receive_interrupt();
    }

    /// Take the oldest received byte, or `None` if nothing is queued
    pub fn read(&self) -> Option<u8> {
        critical_section::with(|cs| self.rx.borrow_ref_mut(cs).get())
    }

    /// Move queued bytes into `buf`, returning how many were copied
    pub fn read_into(&self, buf: &mut [u8]) -> usize {
        critical_section::with(|cs| {
            let mut rx = self.rx.borrow_ref_mut(cs);
            let mut count = 0;
            for slot in buf.iter_mut() {
                match rx.get() {
                    Some(byte) => {
                        *slot = byte;
                        count += 1;
                    }
                    None => break,
                }
            }
            count
        })
    }

    /// Bytes waiting to be read
    pub fn available(&self) -> usize {
        critical_section::with(|cs| self.rx.borrow_ref(cs).length())
    }

    /// Bytes queued for transmission
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.tx.borrow_ref(cs).length())
    }

    /// Discard unread inbound bytes
    pub fn clear_receive(&self) {
        critical_section::with(|cs| self.rx.borrow_ref_mut(cs).clear());
    }

    pub fn is_stalled(&self) -> bool {
        self.transmit_stalled.load(Ordering::Acquire)
    }

    pub fn state(&self) -> TransmitState {
        if self.is_stalled() {
            TransmitState::Stalled
        } else {
            TransmitState::Active
        }
    }

    /// Block until every queued byte has been handed to the peripheral
    pub fn flush(&self) -> Result<()> {
        self.resume_if_stalled()?;
        self.wait_until(WaitTarget::Drain, || self.pending() == 0)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Receive error flags seen since the last call, then clear them
    pub fn take_receive_errors(&self) -> RxErrors {
        critical_section::with(|cs| self.rx_errors.borrow(cs).replace(RxErrors::empty()))
    }

    fn wait_until(&self, target: WaitTarget, mut ready: impl FnMut() -> bool) -> Result<()> {
        match self.config.wait {
            WaitPolicy::Forever => {
                while !ready() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            WaitPolicy::Spins(limit) => {
                for _ in 0..limit {
                    if ready() {
                        return Ok(());
                    }
                    core::hint::spin_loop();
                }
                if ready() {
                    return Ok(());
                }
                log::debug!("gave up after {} spins waiting for {}", limit, target);
                Err(SerialError::Timeout { waiting_for: target })
            }
        }
    }
}

impl<P: SerialPeripheral, const TX: usize, const RX: usize> fmt::Write
    for &BufferedSerialPort<P, TX, RX>
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if self.config.crlf && byte == b'\n' {
                self.write(b'\r').map_err(|_| fmt::Error)?;
            }
            self.write(byte).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

impl<P, const TX: usize, const RX: usize> fmt::Debug for BufferedSerialPort<P, TX, RX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedSerialPort")
            .field("tx_capacity", &TX)
            .field("rx_capacity", &RX)
            .field("stalled", &self.transmit_stalled.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
