//! Endpoint probes
//!
//! This module provides:
//! - Probe descriptors (what to call and how to judge it)
//! - Wire types for the generation and Live endpoints
//! - The Transport trait and its reqwest/tungstenite implementation
//! - ProbeRunner, which turns one call into exactly one ProbeResult

pub mod descriptor;
pub mod request;
pub mod runner;
pub mod transport;

pub use descriptor::{
    ProbeDescriptor, ProbeName, RequestTemplate, SecondaryPredicate, SuccessPredicate, TargetKind, build, declared,
};
pub use request::{GenerateContentRequest, GenerationConfig, Part, SetupFrame, candidate_text};
pub use runner::{ProbeRunner, classify};
pub use transport::{HttpReply, HttpRequest, HttpTransport, SocketRequest, Transport};
