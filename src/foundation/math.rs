/// `round(num / den)` with halves rounded up, in exact integer arithmetic.
///
/// `den` must be non-zero.
pub(crate) fn div_round_half_up(num: u64, den: u64) -> u64 {
    (2 * num + den) / (2 * den)
}

/// Reverse premultiplication for one channel: `min(255, round(c * 255 / a))`.
///
/// `a == 0` maps to 0 (fully transparent pixels are black).
pub(crate) fn unpremul_channel(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    div_round_half_up(u64::from(c) * 255, u64::from(a)).min(255) as u8
}

/// Power-of-two size class for `size`, never below `min`.
///
/// Returns `None` when the class would overflow `usize`.
pub(crate) fn size_class(size: usize, min: usize) -> Option<usize> {
    size.max(min).checked_next_power_of_two()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
