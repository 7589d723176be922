//! # Grabkit Core
//!
//! Capture-session negotiation library: closest-capability format matching
//! and a capture-graph state machine over pluggable device enumerators and
//! graph engines.

// ============================================================================
// Data model
// ============================================================================
pub mod caps;
pub mod config;
pub mod media_type;

// ============================================================================
// Negotiation
// ============================================================================
pub mod select;

// ============================================================================
// Consumed interfaces (platform backends live behind these)
// ============================================================================
pub mod enumerate;
pub mod graph;

// ============================================================================
// Session
// ============================================================================
pub mod error;
pub mod session;
pub mod sink;
pub mod subsystem;

// ============================================================================
// In-process backend
// ============================================================================
pub mod loopback;

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
