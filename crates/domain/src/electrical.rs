//! Electrical helpers shared by the linker and the assignment engine.

/// Supply voltage used to turn declared power into current draw.
pub const NOMINAL_VOLTAGE: f64 = 120.0;

/// Slack for floating-point sums of currents (well under a milliamp).
const CURRENT_TOLERANCE: f64 = 1e-9;

/// Current in amperes drawn by a load of `power` watts at `voltage` volts.
///
/// Missing, zero or negative power draws nothing.
#[must_use]
pub fn current_draw(power: f64, voltage: f64) -> f64 {
    if power.is_finite() && power > 0.0 && voltage > 0.0 {
        power / voltage
    } else {
        0.0
    }
}

/// Whether `amps` is strictly above `limit`.
#[must_use]
pub fn exceeds(amps: f64, limit: f64) -> bool {
    amps > limit + CURRENT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_half_amp_for_sixty_watts_at_nominal_voltage() {
        assert!((current_draw(60.0, NOMINAL_VOLTAGE) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn should_draw_nothing_when_power_is_not_positive() {
        assert!(current_draw(0.0, NOMINAL_VOLTAGE).abs() < f64::EPSILON);
        assert!(current_draw(-10.0, NOMINAL_VOLTAGE).abs() < f64::EPSILON);
        assert!(current_draw(f64::NAN, NOMINAL_VOLTAGE).abs() < f64::EPSILON);
    }

    #[test]
    fn should_accept_current_exactly_at_limit() {
        assert!(!exceeds(0.1 + 0.2 + 7.7, 8.0));
        assert!(exceeds(8.3, 8.0));
    }
}
