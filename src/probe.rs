//! Availability probing: the `AvailabilityProbe` seam consumed by workers,
//! the HTTP implementation that posts to a signup-check endpoint, and the
//! signup-session bootstrap that captures the anti-CSRF token and cookies.

pub mod client;
pub mod session;

pub use client::{AvailabilityProbe, HttpProbe, ProbeError, ProbeVerdict};
pub use session::SignupSession;
