pub mod pipeline;

/// Mix a stereo pair of 16 bit samples down to one signed 8 bit sample.
///
/// Each channel is first truncated to its high byte, then the two are averaged in 16 bit. Averaging
/// before truncation rounds differently, and the sink expects this order.
pub const fn downmix(left: i16, right: i16) -> i8 {
    let left_8bit = (left >> 8) as i8;
    let right_8bit = (right >> 8) as i8;

    ((left_8bit as i16 + right_8bit as i16) >> 1) as i8
}

/// Convert a signed 8 bit sample to unsigned (offset binary) PCM.
pub const fn to_unsigned(sample: i8) -> u8 {
    (sample as u8) ^ 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_of_equal_channels_is_the_high_byte() {
        assert_eq!(downmix(0x7F00, 0x7F00), 0x7F);
        assert_eq!(downmix(i16::MIN, i16::MIN), -0x80);
        assert_eq!(downmix(i16::MAX, i16::MAX), 0x7F);
        assert_eq!(downmix(0, 0), 0);
    }

    #[test]
    fn downmix_truncates_before_averaging() {
        // High bytes -1 and 0 mix to -1. Averaging first would give 0.
        assert_eq!(downmix(-1, 1), -1);

        // High bytes 1 and 0 mix to 0. Averaging first would give 1.
        assert_eq!(downmix(0x0180, 0x0080), 0);
    }

    #[test]
    fn downmix_floors_towards_negative_infinity() {
        assert_eq!(downmix(0x0100, 0x0000), 0);
        assert_eq!(downmix(-0x0100, 0x0000), -1);
        assert_eq!(downmix(i16::MIN, i16::MAX), -1);
    }

    #[test]
    fn downmix_is_deterministic() {
        let pairs = [(0x1234, -0x4321), (i16::MIN, 0x00FF), (0x7FFF, -0x7FFF)];

        for (left, right) in pairs {
            assert_eq!(downmix(left, right), downmix(left, right));
        }
    }

    #[test]
    fn bias_conversion() {
        assert_eq!(to_unsigned(0), 0x80);
        assert_eq!(to_unsigned(-128), 0x00);
        assert_eq!(to_unsigned(127), 0xFF);
        assert_eq!(to_unsigned(-1), 0x7F);
    }
}
