//! 实体定义
//!
//! 实体 = 几何数据 + 视觉属性。捕捉能力通过 [`SnapSource`]
//! trait 暴露，捕捉引擎只依赖该 trait，不关心实体的具体形态。

use crate::geometry::{Geometry, GeometryError};
use crate::math::BoundingBox3;
use crate::properties::{Color, LineType};
use crate::snap::{SnapKind, SnapPoint};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 实体ID生成器
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// 实体唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// 生成新的唯一ID
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 捕捉数据源
///
/// 凡是能产生捕捉候选点的对象都实现此 trait。候选点生成可能
/// 失败（如退化椭圆），调用方负责隔离失败的数据源。
pub trait SnapSource {
    /// 按掩码生成捕捉候选点
    fn snap_points(&self, mask: SnapKind) -> Result<Vec<SnapPoint>, GeometryError>;

    /// 包围盒
    fn bounding_box(&self) -> BoundingBox3;
}

/// 图形实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub geometry: Geometry,
    /// 实体颜色，`None` 表示跟随图层
    pub color: Option<Color>,
    pub line_type: LineType,
    /// 线宽（绘图单位）
    pub thickness: f64,
}

impl Entity {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: EntityId::next(),
            geometry,
            color: None,
            line_type: LineType::Continuous,
            thickness: 0.0,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }
}

impl SnapSource for Entity {
    fn snap_points(&self, mask: SnapKind) -> Result<Vec<SnapPoint>, GeometryError> {
        self.geometry.snap_points(mask)
    }

    fn bounding_box(&self) -> BoundingBox3 {
        self.geometry.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Line;
    use crate::math::Point3;

    #[test]
    fn test_entity_ids_are_unique() {
        let a = Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        )));
        let b = a.clone();
        let c = Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        )));

        // 克隆保留ID，新建分配新ID
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_entity_builder() {
        let entity = Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(1.0, 1.0, 0.0),
        )))
        .with_color(Color::RED)
        .with_thickness(0.5);

        assert_eq!(entity.color, Some(Color::RED));
        assert_eq!(entity.thickness, 0.5);
        assert_eq!(entity.line_type, LineType::Continuous);
    }

    #[test]
    fn test_entity_delegates_snap_points() {
        let entity = Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(10.0, 0.0, 0.0),
        )));

        let points = entity.snap_points(SnapKind::END_POINT).unwrap();
        assert_eq!(points.len(), 2);

        let bbox = entity.bounding_box();
        assert_eq!(bbox.max.x, 10.0);
    }
}
