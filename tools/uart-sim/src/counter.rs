//! Counter line formatting
//!
//! Five decimal digits followed by CR LF, the output the firmware demo
//! prints every half second.

/// Bytes per counter line
pub const LINE_LEN: usize = 7;

/// Values wrap at this bound to stay five digits wide
pub const WRAP: u32 = 100_000;

/// Format `value` (mod 100000) as `ddddd\r\n`
pub fn format_line(value: u32) -> [u8; LINE_LEN] {
    let mut line = [b'0', b'0', b'0', b'0', b'0', b'\r', b'\n'];
    let mut rest = value % WRAP;
    for digit in line[..5].iter_mut().rev() {
        *digit = b'0' + (rest % 10) as u8;
        rest /= 10;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded() {
        assert_eq!(&format_line(0), b"00000\r\n");
        assert_eq!(&format_line(42), b"00042\r\n");
        assert_eq!(&format_line(99_999), b"99999\r\n");
    }

    #[test]
    fn test_wraps() {
        assert_eq!(format_line(100_000), format_line(0));
        assert_eq!(&format_line(123_456), b"23456\r\n");
    }
}
