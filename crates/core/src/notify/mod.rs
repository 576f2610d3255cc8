//! Notification content and the platform sink port.

use async_trait::async_trait;
use shiftfence_domain::constants::{
    CLOCK_IN_BODY, CLOCK_IN_TITLE, CLOCK_OUT_BODY, CLOCK_OUT_TITLE, NOTIFICATION_TAG_PREFIX,
};
use shiftfence_domain::{ClockActionKind, MembershipState, MembershipTransition, Result};

/// Platform notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Never asked; a single prompt per install is allowed.
    Undetermined,
}

/// Action button attached to a perimeter notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    ClockIn,
    ClockOut,
    Dismiss,
}

impl NotificationAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::ClockIn => "Clock In",
            Self::ClockOut => "Clock Out",
            Self::Dismiss => "Dismiss",
        }
    }

    /// The clock action this button routes to, `None` for dismiss.
    pub fn clock_kind(self) -> Option<ClockActionKind> {
        match self {
            Self::ClockIn => Some(ClockActionKind::ClockIn),
            Self::ClockOut => Some(ClockActionKind::ClockOut),
            Self::Dismiss => None,
        }
    }
}

/// A user-facing actionable prompt derived from a membership transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PerimeterNotification {
    pub title: String,
    pub body: String,
    /// Derived from the transition direction so a repeated identical
    /// transition replaces the prior notification instead of stacking.
    pub tag: String,
    pub actions: Vec<NotificationAction>,
}

impl PerimeterNotification {
    /// Build the prompt for a transition. Returns `None` for edges that do
    /// not prompt (a transition never targets `Unknown`, but the type does
    /// not forbid constructing one).
    pub fn from_transition(transition: &MembershipTransition) -> Option<Self> {
        match transition.to {
            MembershipState::Inside => Some(Self {
                title: CLOCK_IN_TITLE.to_string(),
                body: CLOCK_IN_BODY.to_string(),
                tag: format!("{NOTIFICATION_TAG_PREFIX}clockin"),
                actions: vec![NotificationAction::ClockIn, NotificationAction::Dismiss],
            }),
            MembershipState::Outside => Some(Self {
                title: CLOCK_OUT_TITLE.to_string(),
                body: CLOCK_OUT_BODY.to_string(),
                tag: format!("{NOTIFICATION_TAG_PREFIX}clockout"),
                actions: vec![NotificationAction::ClockOut, NotificationAction::Dismiss],
            }),
            MembershipState::Unknown => None,
        }
    }
}

/// Platform notification delivery.
///
/// Implementations must treat an identical `tag` as replace-not-stack, and
/// must tolerate being called without permission (the worker already
/// no-ops, but a sink must not crash either).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Current permission state.
    async fn permission(&self) -> PermissionState;

    /// Prompt the user once. Only called when the state is `Undetermined`.
    async fn request_permission(&self) -> Result<PermissionState>;

    /// Deliver a notification, replacing any prior one with the same tag.
    async fn show(&self, notification: &PerimeterNotification) -> Result<()>;
}
