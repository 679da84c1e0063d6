//! Quaternary digit helpers
//!
//! A quaternary digit carries exactly two bits. Byte streams are laid out
//! most-significant bit first, so byte `0b10_01_11_00` becomes the digits
//! `[2, 1, 3, 0]`.

/// Number of quaternary digits per byte
pub const DIGITS_PER_BYTE: usize = 4;

/// Smallest `t` with `2^t >= x` (0 for `x <= 1`)
pub fn ceil_log2(x: usize) -> usize {
    if x <= 1 {
        0
    } else {
        (usize::BITS - (x - 1).leading_zeros()) as usize
    }
}

/// Round a bit width up to the next even number
pub fn round_up_even(bits: usize) -> usize {
    bits + (bits % 2)
}

/// Integer ceiling division
pub fn div_ceil(a: usize, b: usize) -> usize {
    a / b + usize::from(a % b != 0)
}

/// Split bytes into quaternary digits, MSB first
pub fn bytes_to_digits(bytes: &[u8]) -> Vec<u8> {
    let mut digits = Vec::with_capacity(bytes.len() * DIGITS_PER_BYTE);
    for &byte in bytes {
        digits.push(byte >> 6);
        digits.push((byte >> 4) & 0b11);
        digits.push((byte >> 2) & 0b11);
        digits.push(byte & 0b11);
    }
    digits
}

/// Pack quaternary digits back into bytes
///
/// A trailing group shorter than four digits is zero-filled on the right.
pub fn digits_to_bytes(digits: &[u8]) -> Vec<u8> {
    digits
        .chunks(DIGITS_PER_BYTE)
        .map(|group| {
            let mut byte = 0u8;
            for i in 0..DIGITS_PER_BYTE {
                byte = (byte << 2) | group.get(i).map_or(0, |d| d & 0b11);
            }
            byte
        })
        .collect()
}

/// Write `value` as `width` quaternary digits, most significant first
///
/// Digits above `width` are dropped.
pub fn int_to_digits(value: u64, width: usize) -> Vec<u8> {
    (0..width)
        .rev()
        .map(|i| {
            let shift = 2 * i as u32;
            if shift >= u64::BITS {
                0
            } else {
                ((value >> shift) & 0b11) as u8
            }
        })
        .collect()
}

/// Read quaternary digits (most significant first) as an integer
pub fn digits_to_int(digits: &[u8]) -> u64 {
    digits
        .iter()
        .fold(0u64, |acc, &d| acc.wrapping_shl(2) | u64::from(d & 0b11))
}
