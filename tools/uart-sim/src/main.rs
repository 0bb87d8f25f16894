//! tinyuart simulator
//!
//! Runs the buffered UART driver on the host against the mock peripheral,
//! with a second thread playing the interrupt controller. The foreground
//! loop is the firmware demo: print a five-digit counter line per tick.
//!
//! Usage:
//!   tinyuart-sim --count 1000 --tx-delay-us 87 \
//!     --input "hello" --inject-errors 4 --echo

mod counter;
mod sim;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tinyuart_driver::mock::MockUart;
use tinyuart_driver::{BufferedSerialPort, PortConfig, UartConfig, WaitPolicy, DEFAULT_CLOCK_HZ};

use crate::sim::LineScript;

/// Queue sizes used by the firmware
pub type Port = BufferedSerialPort<MockUart, 16, 16>;

#[derive(Parser, Debug)]
#[command(name = "tinyuart-sim")]
#[command(about = "Simulate the interrupt-driven buffered UART on the host")]
struct Args {
    /// Number of counter lines to print
    #[arg(long, default_value_t = 100)]
    count: u32,

    /// Simulated wire time per transmitted byte, in microseconds
    #[arg(long, default_value_t = 0)]
    tx_delay_us: u64,

    /// Bytes arriving on the receive line during the run
    #[arg(long, default_value = "")]
    input: String,

    /// Flag every Nth received frame with a framing error
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    inject_errors: Option<u32>,

    /// Write received bytes back out
    #[arg(long)]
    echo: bool,

    /// Give up on a hardware wait after this many polls instead of spinning forever
    #[arg(long)]
    spin_limit: Option<u32>,

    /// Requested baud rate
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Peripheral clock in Hz
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    clock_hz: u32,
}

/// Foreground loop; returns how many bytes were echoed
fn run_counter(port: &Port, args: &Args, out: &mut impl Write) -> Result<u32> {
    let mut echoed = 0;

    for i in 0..args.count {
        port.write_all(&counter::format_line(i))
            .with_context(|| format!("Transmit stuck at line {}", i))?;

        while let Some(byte) = port.read() {
            if args.echo {
                port.write(byte).context("Transmit stuck while echoing")?;
                echoed += 1;
            }
        }

        out.write_all(&port.peripheral().take_written())?;
    }

    port.flush().context("Transmit stuck while flushing")?;
    out.write_all(&port.peripheral().take_written())?;
    out.flush()?;
    Ok(echoed)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let uart_config = UartConfig::for_baud(args.clock_hz, args.baud)
        .with_context(|| format!("Cannot derive divisor for {} baud", args.baud))?;
    log::info!(
        "Baud rate: requested {}, actual {} (divisor {}, {:?})",
        args.baud,
        uart_config.actual_baud(args.clock_hz),
        uart_config.baud_divisor,
        uart_config.prescaler,
    );

    let wait = args.spin_limit.map_or(WaitPolicy::Forever, WaitPolicy::Spins);
    let port: Port = BufferedSerialPort::init(
        MockUart::new(),
        &uart_config,
        PortConfig::new().with_wait(wait),
    )
    .context("Failed to configure UART")?;

    let script = LineScript {
        input: args.input.as_bytes(),
        error_every: args.inject_errors,
        tx_delay: Duration::from_micros(args.tx_delay_us),
    };
    let done = AtomicBool::new(false);

    let echoed = thread::scope(|s| {
        s.spawn(|| sim::run_interrupts(&port, &script, &done));

        let result = run_counter(&port, &args, &mut io::stdout().lock());
        // Always release the interrupt thread, even on failure
        done.store(true, Ordering::Release);
        result
    })?;

    // Input that arrived after the last line
    let leftover = port.available();

    let stats = port.stats();
    log::info!("");
    log::info!("Summary:");
    log::info!("  Lines:          {}", args.count);
    log::info!("  Transmitted:    {} bytes", stats.transmitted);
    log::info!("  Received:       {} bytes ({} unread)", stats.received, leftover);
    log::info!("  Echoed:         {} bytes", echoed);
    log::info!("  Dropped frames: {}", stats.dropped_frames);
    log::info!("  Overwritten:    {}", stats.overwritten);
    log::info!("  Stalls/resumes: {}/{}", stats.stalls, stats.resumes);

    let errors = port.take_receive_errors();
    if !errors.is_empty() {
        log::warn!("Receive errors seen: {:?}", errors);
    }

    Ok(())
}
