/// Failure taxonomy of clipboard operations.
use thiserror::Error;

use crate::surface::ClipboardOp;

/// Failures that cross a component boundary. Everything else (empty
/// transfers, vetoed hooks, unresolvable drop positions, capture-buffer
/// losses) is a silent no-op by design and never becomes an error value.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The platform refused a native command. The only user-visible
    /// failure; surfaced as a single alert and not retried.
    #[error("the {0} operation is not supported by this platform")]
    UnsupportedOperation(ClipboardOp),
}
