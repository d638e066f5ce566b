/// Round `ms` to the nearest multiple of `modulus`.
///
/// The midpoint rounds up: a remainder of at least `modulus / 2` lands on
/// the next boundary. Every segment key and caption due time goes through
/// this function, so all consumers agree on the same boundaries.
pub fn round_to_boundary(ms: u64, modulus: u64) -> u64 {
    debug_assert!(modulus > 0);
    let quotient = ms / modulus;
    let remainder = ms % modulus;
    if remainder < modulus / 2 {
        quotient * modulus
    } else {
        (quotient + 1) * modulus
    }
}

/// Format a millisecond position as `HH:MM:SS`.
pub fn format_timestamp(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, 3500, 0)]
    #[case::just_below_half(1749, 3500, 0)]
    #[case::exact_half_rounds_up(1750, 3500, 3500)]
    #[case::just_above_boundary(3600, 3500, 3500)]
    #[case::upper_half(5300, 3500, 7000)]
    #[case::exact_multiple(7000, 3500, 7000)]
    #[case::other_modulus(5900, 4000, 4000)]
    #[case::other_modulus_up(6100, 4000, 8000)]
    fn test_round_to_boundary(#[case] ms: u64, #[case] modulus: u64, #[case] expected: u64) {
        assert_eq!(round_to_boundary(ms, modulus), expected);
    }

    #[test]
    fn test_round_to_boundary_always_multiple() {
        for ms in (0..20_000).step_by(137) {
            assert_eq!(round_to_boundary(ms, 3500) % 3500, 0);
        }
    }

    #[test]
    fn test_round_to_boundary_delta_bounded() {
        for ms in (0..20_000).step_by(59) {
            let rounded = round_to_boundary(ms, 3500) as i64;
            assert!((rounded - ms as i64).unsigned_abs() <= 1750);
        }
    }

    #[rstest]
    #[case::zero(0, "00:00:00")]
    #[case::seconds(4000, "00:00:04")]
    #[case::minutes(61_000, "00:01:01")]
    #[case::hours(3_661_000, "01:01:01")]
    #[case::truncates_sub_second(3999, "00:00:03")]
    fn test_format_timestamp(#[case] ms: u64, #[case] expected: &str) {
        assert_eq!(format_timestamp(ms), expected);
    }
}
