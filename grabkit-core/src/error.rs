//! Error taxonomy for capture-session operations.
//!
//! Every public operation returns an explicit result; failures are local to
//! the failing call and leave the session in its last stable state.

use thiserror::Error;

use crate::graph::StreamCategory;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Operation requires an initialized session (graph not created yet).
    #[error("{op}: context not initialized")]
    NotInitialized { op: &'static str },

    /// Operation called in the wrong activity state.
    #[error("{op}: cannot be used while {actual}")]
    WrongState {
        op: &'static str,
        actual: &'static str,
    },

    /// `create_graph` called on an already-initialized session.
    #[error("graph already created")]
    AlreadyInitialized,

    /// Named device could not be resolved by the enumerator.
    #[error("{class} device '{name}': '{path}' not found")]
    DeviceNotFound {
        class: &'static str,
        name: String,
        path: String,
    },

    /// A required pin or interface on the device was unavailable.
    #[error("could not get {0} pin")]
    PinNotFound(&'static str),

    /// Asked for the video device's built-in audio with no video attached.
    #[error("tried to use video device's built-in audio, but no video device is present")]
    VideoDeviceMissing,

    /// No capability descriptor was compatible with the requested format.
    #[error("no compatible {stream:?} format among device capabilities")]
    NoCompatibleFormat { stream: StreamCategory },

    /// The device is already claimed by another consumer.
    #[error("device already in use")]
    DeviceInUse,

    /// Underlying graph/enumeration call failed; carries the engine code.
    #[error("{context} (engine code {code})")]
    Engine { code: i32, context: String },

    /// Accepted at the type level but not implemented at runtime.
    #[error("{what} not supported")]
    Unsupported { what: &'static str },

    /// The supplied configuration is unusable as given.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Outcome of [`crate::session::CaptureSession::start`].
///
/// Exclusive-access conflicts are a distinct outcome from generic failure so
/// callers can present a specific message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResult {
    Success,
    DeviceInUse,
    Error,
}
