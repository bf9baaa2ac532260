//! 图纸文档模型
//!
//! 图纸是聚合根：实体按图层组织，图层按名称有序存放，
//! 遍历顺序稳定，便于编解码器产出确定性的输出。

use crate::entity::{Entity, SnapSource};
use crate::math::BoundingBox3;
use crate::properties::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 默认图层名
pub const DEFAULT_LAYER_NAME: &str = "0";

/// 单位制式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnitFormat {
    /// 公制（十进制）
    #[default]
    Metric,
    /// 英制（建筑格式）
    Architectural,
}

/// 图纸设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSettings {
    /// 关联的文件名（未保存时为空）
    pub file_name: Option<String>,
    pub unit_format: UnitFormat,
    /// 单位显示精度（小数位数）
    pub unit_precision: i16,
    pub author: Option<String>,
    /// 当前活动图层
    pub current_layer_name: String,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            file_name: None,
            unit_format: UnitFormat::default(),
            unit_precision: 4,
            author: None,
            current_layer_name: DEFAULT_LAYER_NAME.to_string(),
        }
    }
}

/// 图层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// 图层颜色，`None` 表示使用默认颜色
    pub color: Option<Color>,
    pub visible: bool,
    pub entities: Vec<Entity>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            visible: true,
            entities: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }
}

/// 图纸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub settings: DrawingSettings,
    layers: BTreeMap<String, Layer>,
}

impl Drawing {
    /// 创建带默认图层 "0" 的空图纸
    pub fn new() -> Self {
        let mut layers = BTreeMap::new();
        layers.insert(
            DEFAULT_LAYER_NAME.to_string(),
            Layer::new(DEFAULT_LAYER_NAME),
        );
        Self {
            settings: DrawingSettings::default(),
            layers,
        }
    }

    /// 添加图层（同名覆盖）
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.insert(layer.name.clone(), layer);
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.get_mut(name)
    }

    /// 所有图层，按名称排序
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// 把实体加入当前活动图层，图层不存在时回落到默认图层
    pub fn add_entity(&mut self, entity: Entity) {
        let name = if self.layers.contains_key(&self.settings.current_layer_name) {
            self.settings.current_layer_name.clone()
        } else {
            DEFAULT_LAYER_NAME.to_string()
        };
        self.add_entity_to_layer(&name, entity);
    }

    /// 把实体加入指定图层，图层不存在时自动创建
    pub fn add_entity_to_layer(&mut self, layer_name: &str, entity: Entity) {
        self.layers
            .entry(layer_name.to_string())
            .or_insert_with(|| Layer::new(layer_name))
            .add_entity(entity);
    }

    /// 遍历所有实体（按图层名称顺序）
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.layers.values().flat_map(|l| l.entities.iter())
    }

    pub fn entity_count(&self) -> usize {
        self.layers.values().map(|l| l.entities.len()).sum()
    }

    /// 可见图层中的实体作为捕捉数据源
    pub fn snap_sources(&self) -> Vec<&dyn SnapSource> {
        self.layers
            .values()
            .filter(|l| l.visible)
            .flat_map(|l| l.entities.iter())
            .map(|e| e as &dyn SnapSource)
            .collect()
    }

    /// 所有实体的总包围盒，空图纸返回 `None`
    pub fn bounds(&self) -> Option<BoundingBox3> {
        let mut iter = self.all_entities();
        let first = iter.next()?.bounding_box();
        Some(iter.fold(first, |acc, e| acc.union(&e.bounding_box())))
    }
}

impl Default for Drawing {
    fn default() -> Self {
        Self::new()
    }
}
