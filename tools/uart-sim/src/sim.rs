//! Simulated interrupt controller
//!
//! Runs on its own thread and stands in for the hardware: each data
//! register write raises a transmit-ready interrupt after the configured
//! wire time, and scripted input bytes arrive one receive interrupt at a
//! time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tinyuart_driver::mock::MockUart;
use tinyuart_driver::{dispatch, RxErrors, RxFrame, Vector};

use crate::Port;

/// What the simulated line delivers
pub struct LineScript<'a> {
    /// Bytes arriving on the receive line
    pub input: &'a [u8],
    /// Flag every Nth received frame with a framing error
    pub error_every: Option<u32>,
    /// Time one byte spends on the wire
    pub tx_delay: Duration,
}

impl LineScript<'_> {
    fn frame(&self, index: usize, byte: u8) -> RxFrame {
        match self.error_every {
            Some(every) if (index as u64 + 1) % u64::from(every) == 0 => {
                RxFrame::errored(byte, RxErrors::FRAMING)
            }
            _ => RxFrame::data(byte),
        }
    }
}

/// Fire interrupts until `done` is set and nothing is left to deliver
pub fn run_interrupts(port: &Port, script: &LineScript<'_>, done: &AtomicBool) {
    let uart: &MockUart = port.peripheral();
    let mut input = script.input.iter().copied().enumerate();
    let mut delivered = 0usize;

    loop {
        let finished = done.load(Ordering::Acquire);
        let mut idle = true;

        if uart.take_transmit_irq() {
            if !script.tx_delay.is_zero() {
                thread::sleep(script.tx_delay);
            }
            dispatch(port, Vector::Transmit);
            idle = false;
        }

        if let Some((index, byte)) = input.next() {
            uart.push_frame(script.frame(index, byte));
            dispatch(port, Vector::Receive);
            delivered += 1;
            idle = false;
        }

        if idle {
            if finished {
                break;
            }
            thread::yield_now();
        }
    }

    log::debug!("interrupt thread done, {} input frames delivered", delivered);
}
