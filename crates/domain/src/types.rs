//! Domain types and models

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, ShiftFenceError};

// ============================================================================
// Location Types
// ============================================================================

/// Immutable geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate.
    ///
    /// # Errors
    /// Returns `InvalidInput` when either component is non-finite or outside
    /// the valid range (latitude [-90, 90], longitude [-180, 180]).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ShiftFenceError::InvalidInput(format!("invalid latitude: {latitude}")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ShiftFenceError::InvalidInput(format!("invalid longitude: {longitude}")));
        }
        Ok(Self { latitude, longitude })
    }
}

/// A single device fix. Ephemeral: only the most recent sample is ever held
/// in memory, nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    /// Reported horizontal accuracy in meters, >= 0.
    pub accuracy_meters: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(coordinate: Coordinate, accuracy_meters: f64, captured_at: DateTime<Utc>) -> Self {
        Self { coordinate, accuracy_meters, captured_at }
    }

    /// True when the fix is older than `max_age` relative to `now`. Stale
    /// fixes may still be displayed but must not silently resolve an
    /// `Unknown` membership state.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let age = now.signed_duration_since(self.captured_at);
        age.to_std().map(|age| age > max_age).unwrap_or(false)
    }
}

/// Circular geographic boundary gating clock-in eligibility. At most one
/// perimeter is active at a time; activation is enforced by the owning
/// collaborator, not by this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perimeter {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub center: Coordinate,
    #[serde(rename = "radius")]
    pub radius_meters: f64,
    #[serde(rename = "isActive")]
    pub active: bool,
    #[serde(rename = "createdBy")]
    pub owner_id: String,
}

// ============================================================================
// Membership
// ============================================================================

/// Whether the device is inside or outside the active perimeter. `Unknown`
/// is the initial state before any sample has been evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipState {
    Inside,
    Outside,
    #[default]
    Unknown,
}

impl MembershipState {
    /// True for `Inside` and `Outside`; transitions are only detected
    /// between resolved states.
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for MembershipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for MembershipState {
    type Err = ShiftFenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            "unknown" => Ok(Self::Unknown),
            other => {
                Err(ShiftFenceError::InvalidInput(format!("unknown membership state: {other}")))
            }
        }
    }
}

/// An edge between two resolved membership states. Never constructed with
/// `from == to` or `from == Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembershipTransition {
    pub from: MembershipState,
    pub to: MembershipState,
    pub at: DateTime<Utc>,
    pub distance_meters: f64,
}

// ============================================================================
// Clock Actions & Shifts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockActionKind {
    ClockIn,
    ClockOut,
}

impl fmt::Display for ClockActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockIn => f.write_str("clockin"),
            Self::ClockOut => f.write_str("clockout"),
        }
    }
}

impl FromStr for ClockActionKind {
    type Err = ShiftFenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clockin" => Ok(Self::ClockIn),
            "clockout" => Ok(Self::ClockOut),
            other => Err(ShiftFenceError::InvalidInput(format!("unknown clock action: {other}"))),
        }
    }
}

/// Body of a clock-in/out request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockPayload {
    pub coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Durable offline queue entry. Survives until successfully replayed or
/// explicitly discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingClockAction {
    pub id: String,
    /// Deterministic key derived from the request so a rapid double-submit
    /// of the same action collapses to one queue entry.
    pub idempotency_key: String,
    pub kind: ClockActionKind,
    pub payload: ClockPayload,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl PendingClockAction {
    pub fn new(kind: ClockActionKind, payload: ClockPayload, created_at: DateTime<Utc>) -> Self {
        let idempotency_key = idempotency_key(kind, &payload);
        Self {
            id: Uuid::new_v4().to_string(),
            idempotency_key,
            kind,
            payload,
            created_at,
            attempts: 0,
            last_error: None,
        }
    }
}

/// Derive the dedup key for a clock request. Coordinates are rounded to six
/// decimal places (~0.1 m) so GPS noise between two taps of the same button
/// still maps to the same key.
pub fn idempotency_key(kind: ClockActionKind, payload: &ClockPayload) -> String {
    format!(
        "{kind}:{:.6}:{:.6}:{}",
        payload.coordinate.latitude,
        payload.coordinate.longitude,
        payload.note.as_deref().unwrap_or_default()
    )
}

/// A worked shift. At most one shift per user has `clock_out_time == None`
/// (the "active shift" invariant, owned by the server-side lifecycle guard).
///
/// The server stores clock locations as four flat latitude/longitude columns,
/// so the wire shape is flattened through [`ShiftWire`] and rebuilt into
/// validated coordinates on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ShiftWire", into = "ShiftWire")]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    pub clock_in_time: DateTime<Utc>,
    pub clock_out_time: Option<DateTime<Utc>>,
    pub clock_in_coordinate: Coordinate,
    pub clock_out_coordinate: Option<Coordinate>,
    pub clock_in_note: Option<String>,
    pub clock_out_note: Option<String>,
}

impl Shift {
    pub fn is_active(&self) -> bool {
        self.clock_out_time.is_none()
    }
}

/// On-the-wire shape of a shift as the server returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShiftWire {
    id: String,
    user_id: String,
    clock_in_time: DateTime<Utc>,
    #[serde(default)]
    clock_out_time: Option<DateTime<Utc>>,
    clock_in_latitude: f64,
    clock_in_longitude: f64,
    #[serde(default)]
    clock_out_latitude: Option<f64>,
    #[serde(default)]
    clock_out_longitude: Option<f64>,
    #[serde(default)]
    clock_in_note: Option<String>,
    #[serde(default)]
    clock_out_note: Option<String>,
}

impl TryFrom<ShiftWire> for Shift {
    type Error = ShiftFenceError;

    fn try_from(wire: ShiftWire) -> Result<Self> {
        let clock_in_coordinate =
            Coordinate::new(wire.clock_in_latitude, wire.clock_in_longitude)?;
        let clock_out_coordinate = match (wire.clock_out_latitude, wire.clock_out_longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
            _ => None,
        };
        Ok(Self {
            id: wire.id,
            user_id: wire.user_id,
            clock_in_time: wire.clock_in_time,
            clock_out_time: wire.clock_out_time,
            clock_in_coordinate,
            clock_out_coordinate,
            clock_in_note: wire.clock_in_note,
            clock_out_note: wire.clock_out_note,
        })
    }
}

impl From<Shift> for ShiftWire {
    fn from(shift: Shift) -> Self {
        Self {
            id: shift.id,
            user_id: shift.user_id,
            clock_in_time: shift.clock_in_time,
            clock_out_time: shift.clock_out_time,
            clock_in_latitude: shift.clock_in_coordinate.latitude,
            clock_in_longitude: shift.clock_in_coordinate.longitude,
            clock_out_latitude: shift.clock_out_coordinate.map(|c| c.latitude),
            clock_out_longitude: shift.clock_out_coordinate.map(|c| c.longitude),
            clock_in_note: shift.clock_in_note,
            clock_out_note: shift.clock_out_note,
        }
    }
}

// ============================================================================
// Worker Messaging
// ============================================================================

/// Message protocol between the main context and the background notification
/// worker. No shared memory: everything travels through this tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    LocationUpdate {
        location: LocationSample,
        perimeter: Option<Perimeter>,
    },
    RequestPermission,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn membership_state_round_trips_through_text() {
        for state in [MembershipState::Inside, MembershipState::Outside, MembershipState::Unknown]
        {
            let parsed: MembershipState =
                state.to_string().parse().expect("state parses back");
            assert_eq!(parsed, state);
        }
        assert!("insideout".parse::<MembershipState>().is_err());
    }

    #[test]
    fn sample_staleness_uses_capture_age() {
        let captured = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("timestamp");
        let sample = LocationSample::new(coord(18.4777, 73.8037), 10.0, captured);

        let now = captured + chrono::Duration::seconds(299);
        assert!(!sample.is_stale(now, Duration::from_secs(300)));

        let now = captured + chrono::Duration::seconds(301);
        assert!(sample.is_stale(now, Duration::from_secs(300)));
    }

    #[test]
    fn identical_requests_share_an_idempotency_key() {
        let payload = ClockPayload { coordinate: coord(18.4777, 73.8037), note: None };
        let a = PendingClockAction::new(ClockActionKind::ClockIn, payload.clone(), Utc::now());
        let b = PendingClockAction::new(ClockActionKind::ClockIn, payload, Utc::now());

        assert_ne!(a.id, b.id);
        assert_eq!(a.idempotency_key, b.idempotency_key);
    }

    #[test]
    fn clock_kinds_get_distinct_keys() {
        let payload = ClockPayload { coordinate: coord(18.4777, 73.8037), note: None };
        assert_ne!(
            idempotency_key(ClockActionKind::ClockIn, &payload),
            idempotency_key(ClockActionKind::ClockOut, &payload)
        );
    }

    #[test]
    fn worker_message_serializes_with_wire_tags() {
        let json = serde_json::to_value(WorkerMessage::RequestPermission).expect("serializes");
        assert_eq!(json["type"], "REQUEST_PERMISSION");

        let sample = LocationSample::new(coord(1.0, 2.0), 15.0, Utc::now());
        let json = serde_json::to_value(WorkerMessage::LocationUpdate {
            location: sample,
            perimeter: None,
        })
        .expect("serializes");
        assert_eq!(json["type"], "LOCATION_UPDATE");
    }

    #[test]
    fn shift_active_when_clock_out_missing() {
        let shift = Shift {
            id: "shift-1".to_string(),
            user_id: "user-1".to_string(),
            clock_in_time: Utc::now(),
            clock_out_time: None,
            clock_in_coordinate: coord(0.0, 0.0),
            clock_out_coordinate: None,
            clock_in_note: None,
            clock_out_note: None,
        };
        assert!(shift.is_active());
        assert!(!Shift { clock_out_time: Some(Utc::now()), ..shift }.is_active());
    }

    #[test]
    fn shift_decodes_the_flat_server_shape() {
        let shift: Shift = serde_json::from_value(serde_json::json!({
            "id": "shift-1",
            "userId": "user-1",
            "clockInTime": "2025-06-01T09:00:00Z",
            "clockOutTime": null,
            "clockInLatitude": 18.4777,
            "clockInLongitude": 73.8037,
            "clockOutLatitude": null,
            "clockOutLongitude": null,
            "clockInNote": "starting rounds",
            "clockOutNote": null
        }))
        .expect("flat shift decodes");

        assert_eq!(shift.clock_in_coordinate, coord(18.4777, 73.8037));
        assert!(shift.clock_out_coordinate.is_none());
        assert!(shift.is_active());

        let json = serde_json::to_value(&shift).expect("serializes");
        assert_eq!(json["clockInLatitude"], 18.4777);
        assert!(json.get("clockInCoordinate").is_none());
    }

    #[test]
    fn shift_decode_rejects_out_of_range_coordinates() {
        let result: std::result::Result<Shift, _> = serde_json::from_value(serde_json::json!({
            "id": "shift-1",
            "userId": "user-1",
            "clockInTime": "2025-06-01T09:00:00Z",
            "clockInLatitude": 95.0,
            "clockInLongitude": 73.8037
        }));
        assert!(result.is_err());
    }
}
