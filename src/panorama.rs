// panorama.rs — 视角模式、相机预设与拖拽旋转状态

use crate::error::{PanoError, Result};
use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::str::FromStr;

/// 每移动一个像素旋转 0.006 弧度
pub const DRAG_RADIANS_PER_PIXEL: f32 = 0.006;

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// 球体：相机在球外
    #[default]
    Sphere,
    /// 全景：相机在球内
    Pano,
    /// 小行星：相机贴在球面上，超广角
    Asteroid,
}

impl ViewMode {
    /// Selector order.
    pub const ALL: [ViewMode; 3] = [ViewMode::Sphere, ViewMode::Pano, ViewMode::Asteroid];

    /// Unknown indices fall back to [`ViewMode::Sphere`].
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    pub fn index(self) -> usize {
        match self {
            ViewMode::Sphere => 0,
            ViewMode::Pano => 1,
            ViewMode::Asteroid => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewMode::Sphere => "sphere",
            ViewMode::Pano => "pano",
            ViewMode::Asteroid => "asteroid",
        }
    }

    pub fn preset(self) -> &'static CameraPreset {
        match self {
            ViewMode::Sphere => &SPHERE_PRESET,
            ViewMode::Pano => &PANO_PRESET,
            ViewMode::Asteroid => &ASTEROID_PRESET,
        }
    }

    /// Only the outside view culls back faces; from inside the sphere the
    /// visible faces are the back faces.
    pub fn culls_back_faces(self) -> bool {
        self == ViewMode::Sphere
    }

    // 视角在球内时，拖动方向相反
    fn inverts_drag(self) -> bool {
        self != ViewMode::Sphere
    }

    fn clamps_pitch(self) -> bool {
        matches!(self, ViewMode::Sphere | ViewMode::Pano)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewMode {
    type Err = PanoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PanoError::InvalidParameter(format!(
                    "unknown view mode '{s}' (expected sphere, pano or asteroid)"
                ))
            })
    }
}

/// Fixed rotation applied to the model before the look-at transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreRotation {
    pub x: f32,
    pub y: f32,
}

impl PreRotation {
    /// `rotateY(y) · rotateX(x)`: X is applied to a vector first.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.y) * Mat4::from_rotation_x(self.x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPreset {
    pub fov_degrees: f32,
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub pre_rotation: Option<PreRotation>,
}

impl CameraPreset {
    pub fn look_at(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }
}

// 相机 Z 大于球半径 1，才能看到完整球体
pub const SPHERE_PRESET: CameraPreset = CameraPreset {
    fov_degrees: 65.0,
    eye: Vec3::new(0.0, 0.0, 4.0),
    center: Vec3::ZERO,
    up: Vec3::Y,
    pre_rotation: None,
};

// 相机 Z 小于球半径，位于球内
pub const PANO_PRESET: CameraPreset = CameraPreset {
    fov_degrees: 65.0,
    eye: Vec3::new(0.0, 0.0, 0.5),
    center: Vec3::ZERO,
    up: Vec3::Y,
    pre_rotation: None,
};

// 相机放在球面上；预旋转角度是调出来的，让小行星效果更明显
pub const ASTEROID_PRESET: CameraPreset = CameraPreset {
    fov_degrees: 140.0,
    eye: Vec3::new(0.0, 0.0, 1.0),
    center: Vec3::ZERO,
    up: Vec3::Y,
    pre_rotation: Some(PreRotation {
        x: 1.269,
        y: -0.138,
    }),
};

/// Accumulated drag rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    /// 绕 X 轴 (上下拖动)
    pub x_axis_rotate: f32,
    /// 绕 Y 轴 (左右拖动)
    pub y_axis_rotate: f32,
}

impl RotationState {
    /// Rotation after one drag event of `(dx, dy)` pixels in `mode`.
    ///
    /// Horizontal drag turns around Y, vertical drag around X. For `Sphere`
    /// and `Pano` the X angle is held within ±90° after reduction modulo a
    /// full turn; `Y` spins freely.
    pub fn dragged(self, mode: ViewMode, dx: f32, dy: f32) -> Self {
        let k = if mode.inverts_drag() {
            -DRAG_RADIANS_PER_PIXEL
        } else {
            DRAG_RADIANS_PER_PIXEL
        };

        let mut x = self.x_axis_rotate + k * dy;
        let y = self.y_axis_rotate + k * dx;

        if mode.clamps_pitch() {
            let r = x % TAU;
            if r > FRAC_PI_2 {
                x = FRAC_PI_2;
            }
            if r < -FRAC_PI_2 {
                x = -FRAC_PI_2;
            }
        }

        Self {
            x_axis_rotate: x,
            y_axis_rotate: y,
        }
    }

    /// `rotateY(y) · rotateX(x)`
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.y_axis_rotate) * Mat4::from_rotation_x(self.x_axis_rotate)
    }
}

/// Camera state for the active view mode.
///
/// Not synchronized: drag updates and matrix queries are expected on one
/// timeline (the render loop).
#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    mode: ViewMode,
    rotation: RotationState,
}

impl ViewModel {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            rotation: RotationState::default(),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn preset(&self) -> &'static CameraPreset {
        self.mode.preset()
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    /// Switch preset and reset the rotation, also when `mode` is unchanged.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
        self.rotation = RotationState::default();
    }

    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.rotation = self.rotation.dragged(self.mode, dx, dy);
    }

    /// Look-at of the active preset composed with the model rotation.
    ///
    /// `Asteroid` uses its fixed pre-rotation in place of the drag rotation:
    /// drags still accumulate in [`RotationState`] but do not move the view.
    pub fn view_matrix(&self) -> Mat4 {
        let preset = self.preset();
        match preset.pre_rotation {
            Some(pre) => preset.look_at() * pre.matrix(),
            None => preset.look_at() * self.rotation.matrix(),
        }
    }

    /// Perspective projection (OpenGL clip space) with near 0.1, far 100.
    pub fn projection_matrix(&self, aspect: f32) -> Result<Mat4> {
        self.projection_matrix_with(aspect, DEFAULT_NEAR, DEFAULT_FAR)
    }

    pub fn projection_matrix_with(&self, aspect: f32, near: f32, far: f32) -> Result<Mat4> {
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(PanoError::InvalidParameter(format!(
                "aspect ratio must be positive, got {aspect}"
            )));
        }
        if !(near > 0.0 && far > near && far.is_finite()) {
            return Err(PanoError::InvalidParameter(format!(
                "clip planes must satisfy 0 < near < far, got near={near} far={far}"
            )));
        }
        Ok(Mat4::perspective_rh_gl(
            self.preset().fov_degrees.to_radians(),
            aspect,
            near,
            far,
        ))
    }

    /// `projection · view`
    pub fn mvp_matrix(&self, aspect: f32) -> Result<Mat4> {
        Ok(self.projection_matrix(aspect)? * self.view_matrix())
    }
}
