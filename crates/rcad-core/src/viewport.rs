//! 视口与投影
//!
//! 视口定义了世界坐标中可见的矩形区域，并负责生成世界坐标到
//! 屏幕坐标的变换矩阵。提供两种约定：
//! - 笛卡尔风格：Y 轴向上（数学坐标系）
//! - 窗口风格：Y 轴向下（大多数窗口系统的像素坐标）

use crate::math::{BoundingBox3, Matrix4, Point3, Vector3, EPSILON};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 视口参数错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewPortError {
    #[error("sight vector must be non-zero")]
    ZeroSight,
    #[error("up vector must be non-zero")]
    ZeroUp,
    #[error("view height {0} must be positive and finite")]
    InvalidViewHeight(f64),
}

/// 视口
///
/// `view_height` 是视口在世界坐标中的高度，宽度由输出表面的
/// 宽高比推算。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewPort {
    bottom_left: Point3,
    sight: Vector3,
    up: Vector3,
    view_height: f64,
}

impl ViewPort {
    /// 创建视口，校验参数有效性
    pub fn new(
        bottom_left: Point3,
        sight: Vector3,
        up: Vector3,
        view_height: f64,
    ) -> Result<Self, ViewPortError> {
        if sight.norm() < EPSILON {
            return Err(ViewPortError::ZeroSight);
        }
        if up.norm() < EPSILON {
            return Err(ViewPortError::ZeroUp);
        }
        if !view_height.is_finite() || view_height <= 0.0 {
            return Err(ViewPortError::InvalidViewHeight(view_height));
        }
        Ok(Self {
            bottom_left,
            sight,
            up,
            view_height,
        })
    }

    /// 默认视口：原点、视线 +Z、上方向 +Y、高度 100
    pub fn default_view() -> Self {
        Self {
            bottom_left: Point3::origin(),
            sight: Vector3::z(),
            up: Vector3::y(),
            view_height: 100.0,
        }
    }

    pub fn bottom_left(&self) -> Point3 {
        self.bottom_left
    }

    pub fn sight(&self) -> Vector3 {
        self.sight
    }

    pub fn up(&self) -> Vector3 {
        self.up
    }

    pub fn view_height(&self) -> f64 {
        self.view_height
    }

    /// 世界坐标到屏幕坐标的变换（笛卡尔风格，Y 向上）
    ///
    /// 先把视口左下角平移到原点，再按 `像素高度 / 视口高度`
    /// 等比缩放，Z 不参与缩放。
    pub fn transformation_matrix_cartesian(&self, pixel_height: f64) -> Matrix4 {
        let scale = pixel_height / self.view_height;
        Matrix4::new_nonuniform_scaling(&Vector3::new(scale, scale, 1.0))
            * Matrix4::new_translation(&Vector3::new(
                -self.bottom_left.x,
                -self.bottom_left.y,
                0.0,
            ))
    }

    /// 世界坐标到屏幕坐标的变换（窗口风格，Y 向下）
    ///
    /// 在笛卡尔变换的基础上翻转 Y 并把原点移到左上角。
    pub fn transformation_matrix_windows(&self, pixel_height: f64) -> Matrix4 {
        let scale = pixel_height / self.view_height;
        Matrix4::new_translation(&Vector3::new(0.0, pixel_height, 0.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(scale, -scale, 1.0))
            * Matrix4::new_translation(&Vector3::new(
                -self.bottom_left.x,
                -self.bottom_left.y,
                0.0,
            ))
    }

    /// 生成刚好容纳指定包围盒的视口
    ///
    /// `aspect_ratio` 是输出表面的宽高比，四周留 10% 边距。
    pub fn fit_to_bounds(bounds: &BoundingBox3, aspect_ratio: f64) -> Self {
        let margin = 1.1;
        let width = bounds.width().max(EPSILON);
        let height = bounds.height().max(EPSILON);
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };

        // 取两个方向中约束更紧的一个
        let view_height = (height.max(width / aspect)) * margin;
        let view_width = view_height * aspect;
        let center = bounds.center();

        Self {
            bottom_left: Point3::new(
                center.x - view_width / 2.0,
                center.y - view_height / 2.0,
                0.0,
            ),
            sight: Vector3::z(),
            up: Vector3::y(),
            view_height,
        }
    }
}

impl Default for ViewPort {
    fn default() -> Self {
        Self::default_view()
    }
}
