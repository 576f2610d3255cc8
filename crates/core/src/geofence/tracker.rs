//! Serialized membership tracking over the durable state store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use shiftfence_domain::{LocationSample, MembershipState, Perimeter, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::evaluator::{evaluate, Evaluation};
use super::ports::MembershipStateStore;

/// One observed sample, as seen through the durable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub evaluation: Evaluation,
    /// The fix was older than the configured maximum age. Stale fixes are
    /// evaluated for display but never advance the stored state or emit a
    /// transition.
    pub stale: bool,
}

/// Detects membership edges against the single durable state value.
///
/// Concurrent evaluations (a one-shot and a watch-mode sample resolving
/// close together) serialize their read-modify-write through one async
/// mutex, so a transition cannot be lost or double-emitted.
pub struct MembershipTracker {
    store: Arc<dyn MembershipStateStore>,
    gate: Mutex<()>,
    max_sample_age: Duration,
}

impl MembershipTracker {
    pub fn new(store: Arc<dyn MembershipStateStore>, max_sample_age: Duration) -> Self {
        Self { store, gate: Mutex::new(()), max_sample_age }
    }

    /// Evaluate one sample and persist the resulting state.
    ///
    /// The store write happens before the observation is returned, so a
    /// repeated evaluation of the same sample settles on the new state
    /// instead of emitting the transition twice.
    pub async fn observe(
        &self,
        sample: &LocationSample,
        perimeter: Option<&Perimeter>,
    ) -> Result<Observation> {
        let _guard = self.gate.lock().await;

        let prior = self.store.get().await?;
        let stale = sample.is_stale(Utc::now(), self.max_sample_age);
        let evaluation = evaluate(sample, perimeter, prior);

        if stale {
            debug!(
                captured_at = %sample.captured_at,
                state = %evaluation.new_state,
                "stale fix evaluated for display only"
            );
            // Surface the distance but leave the stored state untouched.
            return Ok(Observation { evaluation: Evaluation { transition: None, ..evaluation }, stale });
        }

        if evaluation.new_state != prior {
            self.store.set(evaluation.new_state).await?;
        }

        Ok(Observation { evaluation, stale })
    }

    /// Last persisted state.
    pub async fn current(&self) -> Result<MembershipState> {
        self.store.get().await
    }
}

/// Volatile state store for tests and single-run tooling.
#[derive(Default)]
pub struct InMemoryStateStore {
    state: RwLock<MembershipState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self { state: RwLock::new(MembershipState::Unknown) }
    }
}

#[async_trait]
impl MembershipStateStore for InMemoryStateStore {
    async fn get(&self) -> Result<MembershipState> {
        Ok(*self.state.read().await)
    }

    async fn set(&self, state: MembershipState) -> Result<()> {
        *self.state.write().await = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use shiftfence_domain::Coordinate;

    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid coordinate")
    }

    fn perimeter() -> Perimeter {
        Perimeter {
            id: "per-1".to_string(),
            name: "Clinic".to_string(),
            center: coord(18.4777, 73.8037),
            radius_meters: 2_000.0,
            active: true,
            owner_id: "mgr-1".to_string(),
        }
    }

    fn fresh_sample(lat: f64, lon: f64) -> LocationSample {
        LocationSample::new(coord(lat, lon), 10.0, Utc::now())
    }

    fn tracker() -> MembershipTracker {
        MembershipTracker::new(Arc::new(InMemoryStateStore::new()), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn first_observation_resolves_without_transition() {
        let tracker = tracker();
        let obs = tracker
            .observe(&fresh_sample(18.4777, 73.8037), Some(&perimeter()))
            .await
            .expect("observation");

        assert_eq!(obs.evaluation.new_state, MembershipState::Inside);
        assert!(obs.evaluation.transition.is_none());
        assert_eq!(tracker.current().await.expect("state"), MembershipState::Inside);
    }

    #[tokio::test]
    async fn leaving_the_perimeter_emits_one_transition() {
        let tracker = tracker();
        let p = perimeter();

        tracker.observe(&fresh_sample(18.4777, 73.8037), Some(&p)).await.expect("inside");

        let obs = tracker.observe(&fresh_sample(18.50, 73.83), Some(&p)).await.expect("outside");
        let transition = obs.evaluation.transition.expect("transition emitted");
        assert_eq!(transition.from, MembershipState::Inside);
        assert_eq!(transition.to, MembershipState::Outside);

        // Re-observing the same position settles with no further edge.
        let obs = tracker.observe(&fresh_sample(18.50, 73.83), Some(&p)).await.expect("settled");
        assert!(obs.evaluation.transition.is_none());
    }

    #[tokio::test]
    async fn stale_fix_never_resolves_unknown() {
        let tracker = tracker();
        let old = Utc::now() - ChronoDuration::seconds(600);
        let sample = LocationSample::new(coord(18.4777, 73.8037), 10.0, old);

        let obs = tracker.observe(&sample, Some(&perimeter())).await.expect("observation");
        assert!(obs.stale);
        assert!(obs.evaluation.distance_meters.is_some());
        assert_eq!(tracker.current().await.expect("state"), MembershipState::Unknown);
    }

    #[tokio::test]
    async fn stored_state_survives_tracker_recreation() {
        let store = Arc::new(InMemoryStateStore::new());
        let p = perimeter();

        let tracker = MembershipTracker::new(store.clone(), Duration::from_secs(300));
        tracker.observe(&fresh_sample(18.4777, 73.8037), Some(&p)).await.expect("inside");
        drop(tracker);

        // Same store, fresh tracker: still-inside sample must not re-fire.
        let tracker = MembershipTracker::new(store, Duration::from_secs(300));
        let obs =
            tracker.observe(&fresh_sample(18.4778, 73.8038), Some(&p)).await.expect("still inside");
        assert_eq!(obs.evaluation.new_state, MembershipState::Inside);
        assert!(obs.evaluation.transition.is_none());
    }

    #[tokio::test]
    async fn concurrent_observations_serialize() {
        let tracker = Arc::new(tracker());
        let p = perimeter();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let tracker = Arc::clone(&tracker);
            let p = p.clone();
            let sample = fresh_sample(18.50, 73.83);
            handles.push(tokio::spawn(async move { tracker.observe(&sample, Some(&p)).await }));
        }

        let mut transitions = 0;
        for handle in handles {
            let obs = handle.await.expect("task joined").expect("observation");
            if obs.evaluation.transition.is_some() {
                transitions += 1;
            }
        }
        // All tasks started from Unknown; none may claim an edge.
        assert_eq!(transitions, 0);
        assert_eq!(tracker.current().await.expect("state"), MembershipState::Outside);
    }
}
