use thiserror::Error;

use crate::shared::rect::Rect;

/// Failures raised by the geometry, compositing and workflow layers.
///
/// Soft outcomes (no faces, no matches) are never reported through this
/// type; they surface as empty collections.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RedactionError {
    #[error("invalid region {rect:?} for a {width}x{height} image")]
    InvalidRegion { rect: Rect, width: u32, height: u32 },

    #[error("region {width}x{height} exceeds every allowed square size {allowed:?}")]
    RegionTooLarge {
        width: u32,
        height: u32,
        allowed: Vec<u32>,
    },

    #[error("cannot position a {size}px square around {rect:?} in a {width}x{height} image")]
    CannotPosition {
        rect: Rect,
        size: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid workflow transition: {operation} while {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: String,
    },

    #[error("no reference face has been provided")]
    MissingReference,

    #[error("no candidate has been confirmed for redaction")]
    NoTarget,
}
