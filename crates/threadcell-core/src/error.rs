use thiserror::Error;

/// Errors surfaced by handle operations.
///
/// The taxonomy is deliberately narrow: stale or absent bindings are normal
/// control-flow outcomes resolved to the cell default, and double disposal is
/// idempotent. The only error condition is a programmer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CellError {
    /// A write was attempted through a handle that was constructed without
    /// write support (a weak observer or a read-only strong slot).
    #[error("handle does not support assignment")]
    UnsupportedOperation,
}
