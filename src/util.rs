use uom::si::angle::radian;
use uom::si::f64::Angle;

/// Returns `radians` wrapped into [0°, 360°).
pub(crate) fn into_bounds(radians: f64) -> f64 {
    let full_turn = Angle::FULL_TURN.get::<radian>();
    let bounded = radians.rem_euclid(full_turn);
    // rem_euclid may round up to exactly one full turn for tiny negative inputs
    if bounded >= full_turn {
        0.
    } else {
        bounded
    }
}

/// Returns `radians` wrapped into [-180°, 180°).
pub(crate) fn to_signed_range(radians: f64) -> f64 {
    let angle = into_bounds(radians);
    if angle < Angle::HALF_TURN.get::<radian>() {
        angle
    } else {
        angle - Angle::FULL_TURN.get::<radian>()
    }
}
