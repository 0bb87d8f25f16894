//! Peripheral control surface
//!
//! The chip layer implements these traits over its UART registers. The
//! driver never touches registers directly.

use bitflags::bitflags;

use crate::config::{InterruptLevel, UartConfig};
use crate::ConfigError;

bitflags! {
    /// Receive error flags latched by the peripheral for one frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RxErrors: u8 {
        /// A new frame arrived before the previous one was read
        const OVERRUN = 1 << 0;
        /// Stop bit missing
        const FRAMING = 1 << 1;
        /// Parity mismatch
        const PARITY = 1 << 2;
        /// Cumulative error sum flag
        const SUM = 1 << 3;
    }
}

/// One read of the receive status/data register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxFrame {
    pub data: u8,
    pub errors: RxErrors,
}

impl RxFrame {
    /// Error-free frame carrying `data`
    pub const fn data(data: u8) -> Self {
        Self {
            data,
            errors: RxErrors::empty(),
        }
    }

    /// Frame with the given error flags set
    pub const fn errored(data: u8, errors: RxErrors) -> Self {
        Self { data, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runtime register access used from foreground and interrupt context
///
/// All methods take `&self`: register access is interior-mutable by nature,
/// and one peripheral is shared by both execution contexts.
pub trait SerialPeripheral {
    /// Load one byte into the transmit data register
    fn write_data(&self, byte: u8);

    /// Read receive status and data in a single access
    fn read_status_and_data(&self) -> RxFrame;

    /// True when the transmit data register can accept another byte
    fn is_transmit_empty(&self) -> bool;

    /// Clear the pending transmit-ready interrupt request
    fn acknowledge_transmit_interrupt(&self);

    /// Clear the pending receive-ready interrupt request
    fn acknowledge_receive_interrupt(&self);

    /// Reset the receive error latch so later frames are accepted
    fn clear_receive_error_latch(&self);
}

/// One-time setup performed before the port goes live
pub trait UartControl {
    /// Program framing and baud rate
    fn configure(&mut self, config: &UartConfig) -> Result<(), ConfigError>;

    fn enable_transmit_interrupt(&mut self, level: InterruptLevel);

    fn enable_receive_interrupt(&mut self, level: InterruptLevel);
}

impl<P: SerialPeripheral + ?Sized> SerialPeripheral for &P {
    fn write_data(&self, byte: u8) {
        (**self).write_data(byte)
    }

    fn read_status_and_data(&self) -> RxFrame {
        (**self).read_status_and_data()
    }

    fn is_transmit_empty(&self) -> bool {
        (**self).is_transmit_empty()
    }

    fn acknowledge_transmit_interrupt(&self) {
        (**self).acknowledge_transmit_interrupt()
    }

    fn acknowledge_receive_interrupt(&self) {
        (**self).acknowledge_receive_interrupt()
    }

    fn clear_receive_error_latch(&self) {
        (**self).clear_receive_error_latch()
    }
}
