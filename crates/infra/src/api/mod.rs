//! Client for the collaborator shift API.

pub mod client;

pub use client::{ShiftApiClient, ShiftApiConfig};
