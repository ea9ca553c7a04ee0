use thiserror::Error;

/// Contract violations rejected at the mutating call.
///
/// The structure that was being changed is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("index {index} is out of bounds for a form of {len} widgets")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("widget is already owned by a form")]
    AlreadyOwned,
    #[error("size lock must not be negative, got {0}")]
    NegativeSize(i32),
    #[error("unknown layout directive bits {0:#06x}")]
    InvalidLayout(u32),
}
