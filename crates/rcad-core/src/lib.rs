//! RCAD 核心引擎
//!
//! 提供3D几何图元、实体模型、视口投影和对象捕捉功能。
//!
//! # 架构设计
//!
//! 数据按职责分层：
//! - `Geometry`: 几何数据（点、线、圆、弧、椭圆、多段线）
//! - `Entity`: 几何数据 + 视觉属性，并实现 `SnapSource` 捕捉能力
//! - `Drawing`: 聚合根，按图层组织实体，供编解码器只读遍历
//! - `ViewPort`: 世界坐标与屏幕坐标之间的投影
//!
//! # 示例
//!
//! ```rust
//! use rcad_core::prelude::*;
//!
//! // 创建一条线段并列出它的端点捕捉候选
//! let line = Line::new(Point3::origin(), Point3::new(100.0, 50.0, 0.0));
//! let candidates = Geometry::Line(line).snap_points(SnapKind::END_POINT).unwrap();
//! assert_eq!(candidates.len(), 2);
//! ```

pub mod drawing;
pub mod entity;
pub mod geometry;
pub mod math;
pub mod properties;
pub mod snap;
pub mod viewport;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::drawing::{Drawing, DrawingSettings, Layer, UnitFormat};
    pub use crate::entity::{Entity, EntityId, SnapSource};
    pub use crate::geometry::{Arc, Circle, Ellipse, Geometry, GeometryError, Line, Point, Polyline};
    pub use crate::math::{BoundingBox3, Matrix4, Point3, Vector3};
    pub use crate::properties::{Color, LineType};
    pub use crate::snap::{resolve_snap, SnapError, SnapKind, SnapPoint};
    pub use crate::viewport::ViewPort;
}
