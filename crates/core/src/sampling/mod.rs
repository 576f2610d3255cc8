//! Continuous device-location acquisition.
//!
//! The sampler owns two acquisition modes: a one-shot fix for immediate
//! display and a heavily debounced watch feed for geofence tracking.

pub mod debounce;
pub mod ports;
pub mod sampler;

pub use debounce::Debouncer;
pub use ports::{LocationFeed, LocationProvider};
pub use sampler::{LocationSampler, SamplerEvent};
