//! Avatar parameter model.
//!
//! The watch publishes eight single-digit parameters: the tens and ones
//! places of the hour, minute, GPU usage and VRAM usage. Each one maps to a
//! fixed address under `/avatar/parameters/`.

use std::fmt;

/// Address prefix for avatar parameters.
pub const AVATAR_PARAMETER_PREFIX: &str = "/avatar/parameters/";

/// Chatbox input address. Carries `[message, show, notify]`.
pub const CHATBOX_INPUT_ADDRESS: &str = "/chatbox/input";

/// Largest value that fits the two-digit wire encoding.
pub const MAX_TWO_DIGIT: u32 = 99;

/// One of the eight digit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarParameter {
    HourTenPlace,
    HourZeroPlace,
    MinuteTenPlace,
    MinuteZeroPlace,
    GpuTenPlace,
    GpuZeroPlace,
    VramTenPlace,
    VramZeroPlace,
}

impl AvatarParameter {
    /// Number of declared parameters
    pub const COUNT: usize = 8;

    /// All parameters in transmission order
    pub const ALL: [AvatarParameter; Self::COUNT] = [
        AvatarParameter::HourTenPlace,
        AvatarParameter::HourZeroPlace,
        AvatarParameter::MinuteTenPlace,
        AvatarParameter::MinuteZeroPlace,
        AvatarParameter::GpuTenPlace,
        AvatarParameter::GpuZeroPlace,
        AvatarParameter::VramTenPlace,
        AvatarParameter::VramZeroPlace,
    ];

    /// Parameter name as the avatar declares it
    pub fn name(self) -> &'static str {
        match self {
            AvatarParameter::HourTenPlace => "HourTenPlace",
            AvatarParameter::HourZeroPlace => "HourZeroPlace",
            AvatarParameter::MinuteTenPlace => "MinuteTenPlace",
            AvatarParameter::MinuteZeroPlace => "MinuteZeroPlace",
            AvatarParameter::GpuTenPlace => "GPUTenPlace",
            AvatarParameter::GpuZeroPlace => "GPUZeroPlace",
            AvatarParameter::VramTenPlace => "VRAMTenPlace",
            AvatarParameter::VramZeroPlace => "VRAMZeroPlace",
        }
    }

    /// Full wire address, e.g. `/avatar/parameters/HourTenPlace`
    pub fn address(self) -> &'static str {
        match self {
            AvatarParameter::HourTenPlace => "/avatar/parameters/HourTenPlace",
            AvatarParameter::HourZeroPlace => "/avatar/parameters/HourZeroPlace",
            AvatarParameter::MinuteTenPlace => "/avatar/parameters/MinuteTenPlace",
            AvatarParameter::MinuteZeroPlace => "/avatar/parameters/MinuteZeroPlace",
            AvatarParameter::GpuTenPlace => "/avatar/parameters/GPUTenPlace",
            AvatarParameter::GpuZeroPlace => "/avatar/parameters/GPUZeroPlace",
            AvatarParameter::VramTenPlace => "/avatar/parameters/VRAMTenPlace",
            AvatarParameter::VramZeroPlace => "/avatar/parameters/VRAMZeroPlace",
        }
    }

    /// Position inside [`AvatarParameter::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AvatarParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized GPU reading, both fields already in `0..=99`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuSample {
    pub usage_percent: u32,
    pub memory_percent: u32,
}

impl GpuSample {
    /// Build a sample, clamping anything above 99.
    pub fn clamped(usage_percent: u32, memory_percent: u32) -> Self {
        Self {
            usage_percent: clamp_two_digit(usage_percent),
            memory_percent: clamp_two_digit(memory_percent),
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Busiest reading across several GPUs: the max of each field taken
    /// independently. `None` when there are no readings.
    pub fn max_of<I: IntoIterator<Item = GpuSample>>(samples: I) -> Option<Self> {
        samples.into_iter().reduce(|a, b| Self {
            usage_percent: a.usage_percent.max(b.usage_percent),
            memory_percent: a.memory_percent.max(b.memory_percent),
        })
    }
}

/// Clamp (never wrap) a value into the two-digit range.
pub fn clamp_two_digit(value: u32) -> u32 {
    value.min(MAX_TWO_DIGIT)
}

/// Split a value in `0..=99` into `(tens, ones)`. Values above 99 are clamped first.
pub fn split_digits(value: u32) -> (u32, u32) {
    let value = clamp_two_digit(value);
    (value / 10, value % 10)
}

/// `used * 100 / total`, truncated. A zero total reports 0.
pub fn percent_of(used: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let percent = (used as u128 * 100) / total as u128;
    percent.min(u32::MAX as u128) as u32
}

/// Values for all eight parameters, computed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitFrame {
    values: [u32; AvatarParameter::COUNT],
}

impl DigitFrame {
    /// Decompose a clock reading and a GPU sample into digits.
    pub fn new(hour: u32, minute: u32, gpu: GpuSample) -> Self {
        let (hour_ten, hour_one) = split_digits(hour);
        let (minute_ten, minute_one) = split_digits(minute);
        let (gpu_ten, gpu_one) = split_digits(gpu.usage_percent);
        let (vram_ten, vram_one) = split_digits(gpu.memory_percent);

        Self {
            values: [
                hour_ten, hour_one, minute_ten, minute_one, gpu_ten, gpu_one, vram_ten, vram_one,
            ],
        }
    }

    pub fn get(&self, param: AvatarParameter) -> u32 {
        self.values[param.index()]
    }

    /// Iterate `(parameter, value)` in transmission order
    pub fn iter(&self) -> impl Iterator<Item = (AvatarParameter, u32)> + '_ {
        AvatarParameter::ALL
            .iter()
            .map(move |param| (*param, self.values[param.index()]))
    }
}
