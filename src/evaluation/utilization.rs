//! Room utilization scoring shared by evaluation, search and repair.
//!
//! Utilization is enrollment over capacity. The ideal band is 75-90%:
//! full enough not to waste seats, with headroom for late enrollment.

use crate::models::Room;

/// Lower edge of the ideal band.
pub const IDEAL_LOW: f64 = 0.75;
/// Upper edge of the ideal band.
pub const IDEAL_HIGH: f64 = 0.90;
/// Below this, under-utilization is penalized quadratically.
const ACCEPTABLE_LOW: f64 = 0.60;
/// Enrollments below this count as small classes.
const SMALL_CLASS: u32 = 30;

/// Ratio of enrollment to capacity, `None` for a zero-capacity room.
#[inline]
pub fn utilization(enrollment: u32, capacity: u32) -> Option<f64> {
    (capacity > 0).then(|| enrollment as f64 / capacity as f64)
}

/// Fit score of a room for an enrollment; lower is better.
///
/// Used to rank candidate rooms in placement, mutation and repair, so
/// that all three prefer the same room.
///
/// | Utilization | Score |
/// |-------------|-------|
/// | [0.75, 0.90] | \|0.825 − u\| |
/// | [0.60, 0.75) | 0.15 + \|0.675 − u\| |
/// | (0.90, 1.00] | 0.10 + \|0.95 − u\| |
/// | otherwise | 1.0 + \|0.80 − u\| |
pub fn room_fit_score(enrollment: u32, capacity: u32) -> f64 {
    let Some(u) = utilization(enrollment, capacity) else {
        return f64::INFINITY;
    };
    if (IDEAL_LOW..=IDEAL_HIGH).contains(&u) {
        (0.825 - u).abs()
    } else if (ACCEPTABLE_LOW..IDEAL_LOW).contains(&u) {
        0.15 + (0.675 - u).abs()
    } else if u > IDEAL_HIGH && u <= 1.0 {
        0.10 + (0.95 - u).abs()
    } else {
        1.0 + (0.80 - u).abs()
    }
}

/// Best-fitting room for an enrollment.
///
/// Candidates are expected in id order; among equally good rooms the first
/// wins, so ties go to the lowest id.
pub fn best_fit_room<'a>(
    rooms: impl IntoIterator<Item = &'a Room>,
    enrollment: u32,
) -> Option<&'a Room> {
    rooms.into_iter().min_by(|a, b| {
        room_fit_score(enrollment, a.capacity).total_cmp(&room_fit_score(enrollment, b.capacity))
    })
}

/// Distance from the ideal band (0 inside it).
pub fn band_distance(u: f64) -> f64 {
    if u < IDEAL_LOW {
        IDEAL_LOW - u
    } else if u > IDEAL_HIGH {
        u - IDEAL_HIGH
    } else {
        0.0
    }
}

/// Share of empty seats, 0 for a zero-capacity room.
pub fn waste_ratio(enrollment: u32, capacity: u32) -> f64 {
    utilization(enrollment, capacity).map_or(0.0, |u| (1.0 - u).max(0.0))
}

/// Waste ratio above which a placement counts as severe waste.
///
/// Small classes tolerate more empty seats.
pub fn waste_threshold(enrollment: u32) -> f64 {
    if enrollment < SMALL_CLASS {
        0.5
    } else {
        0.3
    }
}

/// Soft penalty of one placement, scaled by `weight`.
///
/// Zero inside the ideal band, linear just outside it, and quadratic
/// below 60%. The curve is continuous and keeps rising as the room
/// empties.
pub fn utilization_penalty(enrollment: u32, capacity: u32, weight: f64) -> f64 {
    let Some(u) = utilization(enrollment, capacity) else {
        return 0.0;
    };
    if (IDEAL_LOW..=IDEAL_HIGH).contains(&u) {
        0.0
    } else if (ACCEPTABLE_LOW..IDEAL_LOW).contains(&u) {
        (IDEAL_LOW - u) * 100.0 * weight
    } else if u > IDEAL_HIGH {
        // Over capacity is a hard violation; the soft curve stays linear.
        (u - IDEAL_HIGH) * 50.0 * weight
    } else {
        let gap = ACCEPTABLE_LOW - u;
        let at_edge = (IDEAL_LOW - ACCEPTABLE_LOW) * 100.0;
        (at_edge + gap * gap * 500.0) * weight
    }
}
