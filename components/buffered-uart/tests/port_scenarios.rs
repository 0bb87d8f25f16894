//! End-to-end scenarios for the buffered serial port
//!
//! These drive the port the way firmware does: a `static` port, interrupt
//! entry points exported through `bind_interrupts!`, and foreground calls
//! interleaved with simulated interrupts.

use static_assertions::assert_impl_all;
use tinyuart_driver::mock::MockUart;
use tinyuart_driver::*;

assert_impl_all!(BufferedSerialPort<MockUart, 16, 16>: Sync, Send);
assert_impl_all!(MockUart: Sync);

type Port = BufferedSerialPort<MockUart, 16, 16>;

static UART0: Port = BufferedSerialPort::new(MockUart::new(), PortConfig::new());

bind_interrupts!(UART0 => transmit: uart0_tx_intr, receive: uart0_rx_intr);

fn spinning_port() -> Port {
    BufferedSerialPort::new(MockUart::new(), PortConfig::new().with_wait(WaitPolicy::Spins(10_000)))
}

/// Port starts stalled; the first write primes the data register exactly once
#[test]
fn test_first_write_goes_active() {
    let port = spinning_port();
    assert_eq!(port.state(), TransmitState::Stalled);

    port.write(0x41).unwrap();

    assert_eq!(port.state(), TransmitState::Active);
    assert_eq!(port.peripheral().written(), [0x41]);
}

/// Transmit interrupt with nothing queued stalls without touching the register
#[test]
fn test_transmit_ready_with_empty_queue() {
    let port = spinning_port();
    port.write(0x41).unwrap();
    port.peripheral().take_written();

    port.on_transmit_ready();

    assert_eq!(port.state(), TransmitState::Stalled);
    assert!(port.peripheral().written().is_empty());
    assert_eq!(port.peripheral().tx_acks(), 1);
}

/// Overrun frame is discarded and the latch cleared exactly once
#[test]
fn test_overrun_frame_dropped() {
    let port = spinning_port();
    port.peripheral().push_frame(RxFrame::errored(0x7A, RxErrors::OVERRUN));

    port.on_receive_ready();

    assert_eq!(port.available(), 0);
    assert_eq!(port.read(), None);
    assert_eq!(port.peripheral().latch_clears(), 1);
    assert_eq!(port.peripheral().rx_acks(), 1);
}

/// Clean frame lands in the inbound queue
#[test]
fn test_clean_frame_received() {
    let port = spinning_port();
    port.peripheral().push_frame(RxFrame::data(0x7A));

    port.on_receive_ready();

    assert_eq!(port.available(), 1);
    assert_eq!(port.read(), Some(0x7A));
    assert_eq!(port.available(), 0);
}

/// Resume is a no-op when active and when there is nothing to send
#[test]
fn test_resume_idempotent() {
    let port = spinning_port();

    // Stalled, empty
    port.resume_if_stalled().unwrap();
    assert!(port.peripheral().written().is_empty());
    assert_eq!(port.state(), TransmitState::Stalled);

    // Active, with data
    port.write_all(b"xy").unwrap();
    port.peripheral().take_written();
    port.resume_if_stalled().unwrap();
    port.resume_if_stalled().unwrap();
    assert!(port.peripheral().written().is_empty());
    assert_eq!(port.state(), TransmitState::Active);
    assert_eq!(port.pending(), 1);
}

/// Mixed good and bad frames keep the good ones in order
#[test]
fn test_receive_mixed_frames_in_order() {
    let port = spinning_port();
    let uart = port.peripheral();

    uart.push_frame(RxFrame::data(b'o'));
    uart.push_frame(RxFrame::errored(b'X', RxErrors::FRAMING));
    uart.push_frame(RxFrame::data(b'k'));
    uart.push_frame(RxFrame::errored(b'Y', RxErrors::PARITY | RxErrors::SUM));
    uart.push_frame(RxFrame::data(b'!'));
    while uart.frames_pending() > 0 {
        port.on_receive_ready();
    }

    let mut buf = [0u8; 8];
    let n = port.read_into(&mut buf);
    assert_eq!(&buf[..n], b"ok!");

    let stats = port.stats();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.dropped_frames, 2);
    assert_eq!(
        port.take_receive_errors(),
        RxErrors::FRAMING | RxErrors::PARITY | RxErrors::SUM
    );
}

/// Writing a whole message through interrupts preserves byte order
#[test]
fn test_transmit_order_through_interrupts() {
    let port = spinning_port();
    let message = b"00042\r\n";

    port.write_all(message).unwrap();
    assert_eq!(port.pending(), message.len() - 1);

    // Each register write raises the next transmit interrupt
    while port.peripheral().take_transmit_irq() {
        port.on_transmit_ready();
    }

    assert_eq!(port.peripheral().written(), message);
    assert_eq!(port.state(), TransmitState::Stalled);
    assert_eq!(port.stats().transmitted, message.len() as u32);
}

/// Init applies framing and levels, and the port starts stalled
#[test]
fn test_init_configures_peripheral() {
    let levels = (InterruptLevel::new(3).unwrap(), InterruptLevel::new(2).unwrap());
    let uart_config = UartConfig::for_baud(DEFAULT_CLOCK_HZ, 9600)
        .unwrap()
        .with_levels(levels.0, levels.1);

    let port: Port =
        BufferedSerialPort::init(MockUart::new(), &uart_config, PortConfig::new()).unwrap();

    assert_eq!(port.peripheral().applied_config(), Some(uart_config));
    assert_eq!(port.peripheral().interrupt_levels(), (Some(levels.0), Some(levels.1)));
    assert!(port.is_stalled());
}

#[test]
fn test_init_propagates_config_error() {
    let result: std::result::Result<Port, ConfigError> = BufferedSerialPort::init(
        MockUart::rejecting(ConfigError::ZeroClock),
        &UartConfig::new(),
        PortConfig::new(),
    );
    assert!(matches!(result, Err(ConfigError::ZeroClock)));
}

/// Exported entry points reach the static port
#[test]
fn test_bound_vector_symbols() {
    UART0.peripheral().push_frame(RxFrame::data(b'r'));
    uart0_rx_intr();
    assert_eq!(UART0.read(), Some(b'r'));

    UART0.write(b't').unwrap();
    assert_eq!(UART0.state(), TransmitState::Active);
    uart0_tx_intr();
    assert_eq!(UART0.state(), TransmitState::Stalled);
    assert_eq!(UART0.peripheral().written(), b"t");
}
