// lib.rs — 全景球体查看器核心：球体网格生成 + 视图/投影矩阵

pub mod backend;
pub mod error;
pub mod mesh;
pub mod panorama;

pub use backend::{Frame, RenderBackend};
pub use error::{PanoError, Result};
pub use mesh::{IndexFormat, Mesh};
pub use panorama::{CameraPreset, RotationState, ViewMode, ViewModel};
