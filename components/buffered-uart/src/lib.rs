//! Buffered UART - interrupt-driven full-duplex serial driver
//!
//! # Purpose
//! Lets foreground code write and read bytes without waiting on the wire.
//! Outbound bytes are queued and drained one per transmit interrupt;
//! inbound bytes are queued by the receive interrupt until foreground code
//! collects them.
//!
//! # Integration Points
//! - Depends on: `tinyuart-fifo` (queues), a chip layer implementing
//!   [`SerialPeripheral`] and [`UartControl`]
//! - Provides to: application code ([`BufferedSerialPort`]) and the
//!   interrupt vector table ([`InterruptBridge`], [`bind_interrupts!`])
//!
//! # Architecture
//! Two `RingBuffer<u8, _>` instances, each behind a `critical_section`
//! mutex, plus an atomic "transmit stalled" flag:
//!
//! ```text
//!   write() ──► [ tx ring ] ──► on_transmit_ready() ──► data register
//!   read()  ◄── [ rx ring ] ◄── on_receive_ready()  ◄── data register
//! ```
//!
//! When the transmit interrupt finds the outbound queue empty it marks the
//! port stalled. The next foreground `write` primes the data register
//! directly, which restarts the interrupt chain.
//!
//! # Testing Strategy
//! - Unit tests: port state machine and config arithmetic against [`mock::MockUart`]
//! - Integration tests: threaded foreground/interrupt interleaving, vector binding
//! - Hardware tests: N/A (chip layer lives outside this crate)

#![no_std]

#[cfg(any(test, feature = "mock"))]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod config;
mod interrupt;
mod peripheral;
mod port;
mod stats;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{
    ClockPrescaler, DataBits, InterruptLevel, Parity, PortConfig, StopBits, UartConfig,
    WaitPolicy, DEFAULT_BAUD_DIVISOR, DEFAULT_CLOCK_HZ, DEFAULT_LEVEL, MAX_LEVEL,
};
pub use interrupt::{dispatch, InterruptBridge, Vector};
pub use peripheral::{RxErrors, RxFrame, SerialPeripheral, UartControl};
pub use port::{BufferedSerialPort, TransmitState};
pub use stats::StatsSnapshot;

use core::fmt;
use thiserror::Error;

/// Condition a bounded wait was polling for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    /// Peripheral transmit data register to become empty
    TransmitEmpty,
    /// Outbound queue to drain completely
    Drain,
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitTarget::TransmitEmpty => f.write_str("transmit register empty"),
            WaitTarget::Drain => f.write_str("outbound queue drain"),
        }
    }
}

/// Errors surfaced by port operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SerialError {
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: WaitTarget },
}

/// Errors from UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("baud rate {baud} unreachable from a {clock_hz} Hz clock")]
    BaudUnreachable { baud: u32, clock_hz: u32 },

    #[error("interrupt level {level} out of range (1-7)")]
    InvalidLevel { level: u8 },

    #[error("baud rate must be non-zero")]
    ZeroBaud,

    #[error("peripheral clock must be non-zero")]
    ZeroClock,
}

pub type Result<T> = core::result::Result<T, SerialError>;
