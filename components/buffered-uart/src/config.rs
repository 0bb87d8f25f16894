//! UART and port configuration
//!
//! `UartConfig` describes what the chip layer programs into the peripheral;
//! `PortConfig` tunes the driver itself.

use crate::ConfigError;

/// Peripheral clock the defaults are computed for (20 MHz on-chip oscillator)
pub const DEFAULT_CLOCK_HZ: u32 = 20_000_000;

/// Baud divisor giving ~115200 baud at [`DEFAULT_CLOCK_HZ`] with no prescaler
pub const DEFAULT_BAUD_DIVISOR: u8 = 10;

/// Interrupt level used for both UART vectors unless overridden
pub const DEFAULT_LEVEL: InterruptLevel = InterruptLevel(1);

/// Highest interrupt level the controller accepts
pub const MAX_LEVEL: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
    Nine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Divider between the peripheral clock and the baud rate generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPrescaler {
    Div1,
    Div8,
    Div32,
}

impl ClockPrescaler {
    /// Prescalers in the order `for_baud` tries them
    pub const ALL: [ClockPrescaler; 3] = [Self::Div1, Self::Div8, Self::Div32];

    pub const fn divide_by(self) -> u32 {
        match self {
            ClockPrescaler::Div1 => 1,
            ClockPrescaler::Div8 => 8,
            ClockPrescaler::Div32 => 32,
        }
    }
}

/// Interrupt priority level, 1 (lowest enabled) to 7
///
/// Level 0 means "disabled" on the interrupt controller, so it is not
/// representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterruptLevel(u8);

impl InterruptLevel {
    pub const fn new(level: u8) -> Result<Self, ConfigError> {
        if level == 0 || level > MAX_LEVEL {
            return Err(ConfigError::InvalidLevel { level });
        }
        Ok(Self(level))
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Line settings for the UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub prescaler: ClockPrescaler,
    /// Baud rate register value `n`; baud = clock / (16 * prescale * (n + 1))
    pub baud_divisor: u8,
    pub tx_level: InterruptLevel,
    pub rx_level: InterruptLevel,
}

impl UartConfig {
    /// 8 data bits, 1 stop bit, no parity, ~115200 baud at 20 MHz
    pub const fn new() -> Self {
        Self {
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            prescaler: ClockPrescaler::Div1,
            baud_divisor: DEFAULT_BAUD_DIVISOR,
            tx_level: DEFAULT_LEVEL,
            rx_level: DEFAULT_LEVEL,
        }
    }

    /// 8N1 at the closest reachable rate to `baud`
    ///
    /// Tries prescalers from the smallest up, since a smaller prescaler
    /// leaves a larger divisor and finer rate resolution.
    ///
    /// # Errors
    /// `ZeroClock`/`ZeroBaud` for zero inputs, `BaudUnreachable` when no
    /// prescaler yields a divisor in `0..=255`
    pub fn for_baud(clock_hz: u32, baud: u32) -> Result<Self, ConfigError> {
        if clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }
        if baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }

        for prescaler in ClockPrescaler::ALL {
            let step = 16 * u64::from(prescaler.divide_by()) * u64::from(baud);
            // Round to nearest
            let n = (u64::from(clock_hz) + step / 2) / step;
            if n == 0 {
                // Bigger prescalers only make this worse
                break;
            }
            if let Ok(divisor) = u8::try_from(n - 1) {
                return Ok(Self {
                    prescaler,
                    baud_divisor: divisor,
                    ..Self::new()
                });
            }
        }

        Err(ConfigError::BaudUnreachable { baud, clock_hz })
    }

    /// Baud rate these settings produce from `clock_hz`
    pub fn actual_baud(&self, clock_hz: u32) -> u32 {
        let step = 16 * self.prescaler.divide_by() as u64 * (u64::from(self.baud_divisor) + 1);
        (u64::from(clock_hz) / step) as u32
    }

    pub const fn with_levels(mut self, tx_level: InterruptLevel, rx_level: InterruptLevel) -> Self {
        self.tx_level = tx_level;
        self.rx_level = rx_level;
        self
    }

    /// Bits on the wire per character, including start bit
    pub fn frame_bits(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        };
        let parity = if self.parity == Parity::None { 0 } else { 1 };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// How the port waits on a hardware condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Spin until the condition holds, however long that takes
    Forever,
    /// Give up with `SerialError::Timeout` after this many polls
    Spins(u32),
}

/// Driver-side settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    /// Applies to the transmit-empty wait and the watermark drain
    pub wait: WaitPolicy,
    /// Emit `\r\n` for `\n` when writing through `core::fmt::Write`
    pub crlf: bool,
}

impl PortConfig {
    pub const fn new() -> Self {
        Self {
            wait: WaitPolicy::Forever,
            crlf: false,
        }
    }

    pub const fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub const fn with_crlf(mut self, crlf: bool) -> Self {
        self.crlf = crlf;
        self
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::new()
    }
}
