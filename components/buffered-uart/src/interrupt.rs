//! Interrupt entry points
//!
//! The chip's vector table calls into the port through [`InterruptBridge`].
//! [`bind_interrupts!`](crate::bind_interrupts) generates the `extern "C"`
//! symbols for a port stored in a `static`.

use crate::peripheral::SerialPeripheral;
use crate::port::BufferedSerialPort;

/// UART interrupt sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vector {
    Transmit,
    Receive,
}

/// Handlers invoked from interrupt context
///
/// # Concurrency Contract
/// - The two handlers never preempt each other (same priority level, or a
///   controller that does not nest UART interrupts).
/// - Either handler may preempt foreground code at any instruction. The
///   port keeps every shared access either atomic or inside a critical
///   section, so foreground calls need no extra masking.
/// - Handlers never block: they touch each queue once and return.
pub trait InterruptBridge {
    /// Transmit data register is ready for another byte
    fn on_transmit_ready(&self);

    /// A frame is waiting in the receive register
    fn on_receive_ready(&self);
}

impl<P: SerialPeripheral, const TX: usize, const RX: usize> InterruptBridge
    for BufferedSerialPort<P, TX, RX>
{
    fn on_transmit_ready(&self) {
        BufferedSerialPort::on_transmit_ready(self)
    }

    fn on_receive_ready(&self) {
        BufferedSerialPort::on_receive_ready(self)
    }
}

/// Route one vector to its handler
///
/// For chips that share a single vector between both directions, or for
/// vector-table shims that look the source up from a status register.
pub fn dispatch<B: InterruptBridge + ?Sized>(bridge: &B, vector: Vector) {
    match vector {
        Vector::Transmit => bridge.on_transmit_ready(),
        Vector::Receive => bridge.on_receive_ready(),
    }
}

/// Export `extern "C"` interrupt entry points for a `static` port
///
/// ```ignore
/// static UART0: BufferedSerialPort<Uart0, 16, 16> =
///     BufferedSerialPort::new(Uart0::new(), PortConfig::new());
///
/// tinyuart_driver::bind_interrupts!(UART0 => transmit: UART0_TX_intr, receive: UART0_RX_intr);
/// ```
#[macro_export]
macro_rules! bind_interrupts {
    ($port:path => transmit: $tx:ident, receive: $rx:ident $(,)?) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn $tx() {
            $crate::InterruptBridge::on_transmit_ready(&$port);
        }

        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn $rx() {
            $crate::InterruptBridge::on_receive_ready(&$port);
        }
    };
}
