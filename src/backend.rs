// backend.rs — 渲染后端接口：网格只上传一次，每帧绑定矩阵

use crate::error::Result;
use crate::mesh::Mesh;
use crate::panorama::{ViewMode, ViewModel};
use glam::Mat4;

/// Per-frame camera state handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub mode: ViewMode,
    pub view: Mat4,
    pub projection: Mat4,
    /// Back-face culling on/off; depth testing is always on.
    pub cull_back_faces: bool,
}

impl Frame {
    /// Snapshot the view model for a drawable of `width x height` pixels.
    pub fn capture(view_model: &ViewModel, width: u32, height: u32) -> Result<Self> {
        let aspect = width as f32 / height as f32;
        Ok(Self {
            mode: view_model.mode(),
            view: view_model.view_matrix(),
            projection: view_model.projection_matrix(aspect)?,
            cull_back_faces: view_model.mode().culls_back_faces(),
        })
    }

    pub fn mvp(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Column-major, ready for a uniform upload.
    pub fn mvp_cols(&self) -> [f32; 16] {
        self.mvp().to_cols_array()
    }
}

/// A graphics binding of the sphere viewer.
pub trait RenderBackend {
    type Error;

    /// Called once at startup and again whenever the tessellation changes.
    fn upload_mesh(&mut self, mesh: &Mesh) -> std::result::Result<(), Self::Error>;

    /// Called every frame before the draw call is issued.
    fn bind_frame(&mut self, frame: &Frame) -> std::result::Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanoError;

    #[test]
    fn test_capture_matches_view_model() {
        let mut vm = ViewModel::new(ViewMode::Pano);
        vm.apply_drag(20.0, 10.0);
        let frame = Frame::capture(&vm, 1920, 1080).unwrap();
        assert_eq!(frame.mode, ViewMode::Pano);
        assert!(!frame.cull_back_faces);
        assert_eq!(frame.mvp(), vm.mvp_matrix(1920.0 / 1080.0).unwrap());
        assert_eq!(frame.mvp_cols(), frame.mvp().to_cols_array());
    }

    #[test]
    fn test_capture_rejects_zero_height() {
        let vm = ViewModel::default();
        assert!(matches!(
            Frame::capture(&vm, 800, 0),
            Err(PanoError::InvalidParameter(_))
        ));
        assert!(Frame::capture(&vm, 0, 600).is_err());
    }
}
