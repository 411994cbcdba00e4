//! wayfarer — an asynchronous long-running-job client for an AI
//! itinerary backend.
//!
//! One call to [`job::JobClient::submit_and_await`] turns a trip request
//! into a durable, cancellable, retry-safe submit-then-poll flow against
//! a backend that processes it out-of-band.

pub mod banner;
pub mod cancel;
pub mod consts;
pub mod endpoint;
pub mod error;
pub mod job;
pub mod ratelimit;
pub mod sanitize;
pub mod spinner;
pub mod transport;
