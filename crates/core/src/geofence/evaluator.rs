//! Membership evaluation against the active perimeter.

use shiftfence_domain::{
    LocationSample, MembershipState, MembershipTransition, Perimeter,
};

use super::distance::haversine_distance;

/// Outcome of evaluating one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub new_state: MembershipState,
    /// Distance to the perimeter center; `None` when no perimeter applies.
    pub distance_meters: Option<f64>,
    /// Present only on a resolved-to-resolved edge.
    pub transition: Option<MembershipTransition>,
}

/// Evaluate a sample against the active perimeter and the prior state.
///
/// Rules:
/// - No perimeter, or an inactive one, means geofencing is not enforced:
///   the state is `Unknown` and no transition is emitted regardless of
///   the prior state.
/// - Distance exactly equal to the radius counts as inside (boundary
///   inclusive).
/// - A transition is emitted only when the prior state was resolved and
///   differs from the new state. The first resolution from `Unknown`
///   never emits one, so reopening the app cannot fire a spurious
///   "left the area" notification.
pub fn evaluate(
    sample: &LocationSample,
    perimeter: Option<&Perimeter>,
    prior: MembershipState,
) -> Evaluation {
    let Some(perimeter) = perimeter.filter(|p| p.active) else {
        return Evaluation {
            new_state: MembershipState::Unknown,
            distance_meters: None,
            transition: None,
        };
    };

    let distance = haversine_distance(sample.coordinate, perimeter.center);
    let new_state = if distance <= perimeter.radius_meters {
        MembershipState::Inside
    } else {
        MembershipState::Outside
    };

    let transition = (prior.is_resolved() && prior != new_state).then(|| MembershipTransition {
        from: prior,
        to: new_state,
        at: sample.captured_at,
        distance_meters: distance,
    });

    Evaluation { new_state, distance_meters: Some(distance), transition }
}
