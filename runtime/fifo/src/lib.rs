//! Fixed-capacity FIFO for interrupt-driven peripherals
//!
//! # Purpose
//! Decouples a byte-oriented peripheral from the code that produces or
//! consumes its data. One buffer sits between foreground code and the
//! transmit interrupt, another between the receive interrupt and
//! foreground code.
//!
//! # Integration Points
//! - Depends on: nothing (`no_std`, no allocation)
//! - Provides to: `tinyuart-driver` (transmit and receive queues)
//!
//! # Architecture
//! Storage is a plain `[T; N]` array. Read and write indices run over
//! `[0, 2N)` so a full buffer never aliases an empty one, and occupancy is
//! always derived from the two indices instead of being stored.
//!
//! The container itself is not synchronised: every mutating operation takes
//! `&mut self`. Owners that share a buffer between execution contexts wrap
//! it in a critical-section mutex (see `tinyuart-driver`).

#![no_std]

#[cfg(test)]
extern crate std;

mod ring_buffer;

pub use ring_buffer::{Drain, Put, RingBuffer};

use thiserror::Error;

/// Error types for FIFO operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FifoError {
    #[error("FIFO full (capacity: {capacity})")]
    Full { capacity: usize },
}

pub type Result<T> = core::result::Result<T, FifoError>;
