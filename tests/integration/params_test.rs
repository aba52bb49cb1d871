use osc_watch::core::params::{split_digits, DigitFrame, GpuSample};
use osc_watch::core::AvatarParameter;

#[test]
fn test_frame_for_late_evening() {
    let frame = DigitFrame::new(23, 59, GpuSample::clamped(42, 17));
    let values: Vec<u32> = frame.iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![2, 3, 5, 9, 4, 2, 1, 7]);
}

#[test]
fn test_frame_for_midnight() {
    let frame = DigitFrame::new(0, 5, GpuSample::zero());
    assert_eq!(frame.get(AvatarParameter::HourTenPlace), 0);
    assert_eq!(frame.get(AvatarParameter::HourZeroPlace), 0);
    assert_eq!(frame.get(AvatarParameter::MinuteTenPlace), 0);
    assert_eq!(frame.get(AvatarParameter::MinuteZeroPlace), 5);
}

#[test]
fn test_full_load_clamps_to_99() {
    let frame = DigitFrame::new(12, 0, GpuSample::clamped(100, 250));
    assert_eq!(frame.get(AvatarParameter::GpuTenPlace), 9);
    assert_eq!(frame.get(AvatarParameter::GpuZeroPlace), 9);
    assert_eq!(frame.get(AvatarParameter::VramTenPlace), 9);
    assert_eq!(frame.get(AvatarParameter::VramZeroPlace), 9);
}

#[test]
fn test_every_digit_is_single() {
    for value in 0..=99 {
        let (tens, ones) = split_digits(value);
        assert!(tens <= 9 && ones <= 9);
        assert_eq!(tens * 10 + ones, value);
    }
}

#[test]
fn test_addresses_are_under_avatar_parameters() {
    for param in AvatarParameter::ALL {
        assert_eq!(
            param.address(),
            format!("/avatar/parameters/{}", param.name())
        );
    }
    assert_eq!(
        AvatarParameter::VramZeroPlace.address(),
        "/avatar/parameters/VRAMZeroPlace"
    );
}
