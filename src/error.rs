// error.rs — 几何与视图变换的错误类型

use thiserror::Error;

/// Errors raised by the mesh generator and the view model.
///
/// Both variants signal a caller contract violation; nothing in the core
/// retries or recovers from them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanoError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("mesh with {vertex_count} vertices cannot be indexed with u16")]
    IndexOverflow { vertex_count: usize },
}

pub type Result<T> = std::result::Result<T, PanoError>;
