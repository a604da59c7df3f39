use std::time::Duration;

/// Direction of a relative seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    Backward,
    Forward,
}

/// Clamp a requested position in seconds to `[0, duration]`.
///
/// Negative and NaN requests land on zero; anything past the end lands on the end.
pub fn clamp_position(requested_secs: f64, duration: Duration) -> Duration {
    if requested_secs.is_nan() || requested_secs <= 0.0 {
        return Duration::ZERO;
    }
    if requested_secs >= duration.as_secs_f64() {
        return duration;
    }
    Duration::from_secs_f64(requested_secs)
}

/// Target of a relative seek from `current`, clamped to `[0, duration]`.
///
/// The amount applies to both directions. Negative or NaN amounts count as zero.
pub fn relative_target(
    current: Duration,
    direction: SeekDirection,
    amount_secs: f64,
    duration: Duration,
) -> Duration {
    let amount = if amount_secs.is_nan() {
        0.0
    } else {
        amount_secs.max(0.0)
    };

    let current = current.as_secs_f64();
    let target = match direction {
        SeekDirection::Backward => current - amount,
        SeekDirection::Forward => current + amount,
    };
    clamp_position(target, duration)
}
