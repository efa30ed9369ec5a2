//! apicheck - manual verification harness for a multi-backend AI client
//!
//! Fires one probe per backend (Gemini REST, Gemini Live socket, Vertex AI,
//! multimodal), classifies each into an `Outcome`, and renders a report with
//! findings and recommendations.

pub mod asset;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod harness;
pub mod outcome;
pub mod probe;
pub mod report;
pub mod token;

pub use error::{ApicheckError, ProbeError, Result};
pub use outcome::{Outcome, ProbeResult, WarningReason};
