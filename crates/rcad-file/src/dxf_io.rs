//! DXF 编解码器
//!
//! 基于 dxf crate 的文档模型读写 AutoCAD DXF 文件，包括：
//! - 模型空间实体（线、圆、弧、椭圆、多段线、点）
//! - 图层及 ACI 颜色
//! - 活动视口（`*ACTIVE`）
//! - 外部引用块（通过内容解析回调加载）

use crate::codec::{
    CancelFlag, CodecSettings, ContentResolver, DrawingCodec, DrawingFile, DxfFileVersion,
    ReadDrawingResult,
};
use crate::error::FileError;
use rcad_core::drawing::{Drawing, Layer};
use rcad_core::entity::Entity;
use rcad_core::geometry::{Arc, Circle, Ellipse, Geometry, Line, Point, Polyline};
use rcad_core::math::{Point3, Vector3};
use rcad_core::properties::Color;
use rcad_core::viewport::ViewPort;
use std::io::{Cursor, Read, Write};
use tracing::{debug, warn};

/// DXF 活动视口的表项名
const ACTIVE_VIEW_PORT_NAME: &str = "*ACTIVE";

/// DXF 编解码器
#[derive(Debug, Default)]
pub struct DxfCodec;

impl DrawingCodec for DxfCodec {
    fn display_name(&self) -> &'static str {
        "AutoCAD DXF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".dxf"]
    }

    fn read_drawing(
        &self,
        file_name: &str,
        mut reader: &mut dyn Read,
        resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<ReadDrawingResult, FileError> {
        let dxf_drawing =
            dxf::Drawing::load(&mut reader).map_err(|e| FileError::Dxf(e.to_string()))?;
        let drawing = convert_from_dxf(&dxf_drawing, resolver, cancel)?;
        let view_port = read_active_view_port(&dxf_drawing);

        let mut drawing = drawing;
        drawing.settings.file_name = Some(file_name.to_string());

        Ok(ReadDrawingResult { drawing, view_port })
    }

    fn write_drawing(
        &self,
        _file_name: &str,
        mut writer: &mut dyn Write,
        drawing: &Drawing,
        view_port: Option<&ViewPort>,
        settings: &CodecSettings,
    ) -> Result<(), FileError> {
        let dxf_drawing = convert_to_dxf(drawing, view_port, settings);
        dxf_drawing
            .save(&mut writer)
            .map_err(|e| FileError::Dxf(e.to_string()))
    }

    fn open_drawing_file(
        &self,
        file_name: &str,
        mut reader: &mut dyn Read,
        resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<Box<dyn DrawingFile>, FileError> {
        let dxf_drawing =
            dxf::Drawing::load(&mut reader).map_err(|e| FileError::Dxf(e.to_string()))?;
        let mut drawing = convert_from_dxf(&dxf_drawing, resolver, cancel)?;
        drawing.settings.file_name = Some(file_name.to_string());
        let view_port = read_active_view_port(&dxf_drawing);

        Ok(Box::new(DxfDrawingFile {
            inner: dxf_drawing,
            drawing,
            view_port,
        }))
    }
}

/// 已打开的 DXF 文件
///
/// 持有 dxf crate 的原生文档，`save` 时未转换的内容
/// （块定义、字典等）原样保留。
pub struct DxfDrawingFile {
    inner: dxf::Drawing,
    drawing: Drawing,
    view_port: Option<ViewPort>,
}

impl DrawingFile for DxfDrawingFile {
    fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    fn view_port(&self) -> Option<&ViewPort> {
        self.view_port.as_ref()
    }

    fn save(&self, mut writer: &mut dyn Write) -> Result<(), FileError> {
        self.inner
            .save(&mut writer)
            .map_err(|e| FileError::Dxf(e.to_string()))
    }
}

fn convert_from_dxf(
    dxf_drawing: &dxf::Drawing,
    resolver: Option<&ContentResolver>,
    cancel: &CancelFlag,
) -> Result<Drawing, FileError> {
    let mut drawing = Drawing::new();

    // 导入图层
    for layer in dxf_drawing.layers() {
        cancel.check()?;
        let color = aci_to_color(layer.color.index().unwrap_or(7) as u8);
        drawing.add_layer(Layer::new(&layer.name).with_color(color));
    }

    // 导入模型空间实体
    for entity in dxf_drawing.entities() {
        cancel.check()?;
        if let Some(converted) = convert_dxf_entity(entity) {
            drawing.add_entity_to_layer(&entity.common.layer, converted);
        }
    }

    // 外部引用块通过回调解析，解析出的实体并入当前图纸
    for block in dxf_drawing.blocks() {
        cancel.check()?;
        if block.xref_path_name.is_empty() {
            continue;
        }
        match resolver {
            Some(resolve) => {
                let bytes =
                    resolve(&block.xref_path_name).map_err(|e| FileError::ContentResolution {
                        name: block.xref_path_name.clone(),
                        message: e.to_string(),
                    })?;
                let xref = dxf::Drawing::load(&mut Cursor::new(bytes))
                    .map_err(|e| FileError::ContentResolution {
                        name: block.xref_path_name.clone(),
                        message: e.to_string(),
                    })?;
                for entity in xref.entities() {
                    cancel.check()?;
                    if let Some(converted) = convert_dxf_entity(entity) {
                        drawing.add_entity_to_layer(&entity.common.layer, converted);
                    }
                }
            }
            None => {
                warn!(name = %block.xref_path_name, "no content resolver; skipping external reference");
            }
        }
    }

    debug!(
        layers = drawing.layer_count(),
        entities = drawing.entity_count(),
        "imported DXF drawing"
    );
    Ok(drawing)
}

/// 读取活动视口，优先 `*ACTIVE` 表项
fn read_active_view_port(dxf_drawing: &dxf::Drawing) -> Option<ViewPort> {
    let dxf_vp = dxf_drawing
        .view_ports()
        .find(|vp| vp.name.eq_ignore_ascii_case(ACTIVE_VIEW_PORT_NAME))
        .or_else(|| dxf_drawing.view_ports().next())?;

    let bottom_left = Point3::new(dxf_vp.lower_left.x, dxf_vp.lower_left.y, 0.0);
    let sight = Vector3::new(
        dxf_vp.view_direction.x,
        dxf_vp.view_direction.y,
        dxf_vp.view_direction.z,
    );

    match ViewPort::new(bottom_left, sight, Vector3::y(), dxf_vp.view_height) {
        Ok(vp) => Some(vp),
        Err(e) => {
            warn!(error = %e, "ignoring invalid view port from file");
            None
        }
    }
}

fn convert_dxf_entity(entity: &dxf::entities::Entity) -> Option<Entity> {
    let geometry = match &entity.specific {
        dxf::entities::EntityType::Line(line) => {
            let start = Point3::new(line.p1.x, line.p1.y, line.p1.z);
            let end = Point3::new(line.p2.x, line.p2.y, line.p2.z);
            Geometry::Line(Line::new(start, end))
        }

        dxf::entities::EntityType::Circle(circle) => {
            let center = Point3::new(circle.center.x, circle.center.y, circle.center.z);
            Geometry::Circle(Circle::new(center, circle.radius))
        }

        dxf::entities::EntityType::Arc(arc) => {
            let center = Point3::new(arc.center.x, arc.center.y, arc.center.z);
            Geometry::Arc(Arc::new(
                center,
                arc.radius,
                arc.start_angle.to_radians(),
                arc.end_angle.to_radians(),
            ))
        }

        dxf::entities::EntityType::Ellipse(ellipse) => {
            let center = Point3::new(ellipse.center.x, ellipse.center.y, ellipse.center.z);
            let major_axis = Vector3::new(ellipse.major_axis.x, ellipse.major_axis.y, 0.0);
            Geometry::Ellipse(Ellipse::new(center, major_axis, ellipse.minor_axis_ratio))
        }

        dxf::entities::EntityType::LwPolyline(lwpoly) => {
            let vertices: Vec<Point3> = lwpoly
                .vertices
                .iter()
                .map(|v| Point3::new(v.x, v.y, 0.0))
                .collect();
            Geometry::Polyline(Polyline::new(vertices, lwpoly.is_closed()))
        }

        dxf::entities::EntityType::Polyline(poly) => {
            let vertices: Vec<Point3> = poly
                .vertices()
                .map(|v| Point3::new(v.location.x, v.location.y, v.location.z))
                .collect();
            Geometry::Polyline(Polyline::new(vertices, poly.is_closed()))
        }

        dxf::entities::EntityType::ModelPoint(point) => {
            let position = Point3::new(point.location.x, point.location.y, point.location.z);
            Geometry::Point(Point::new(position))
        }

        _ => return None,
    };

    let color = entity.common.color.index().map(|i| aci_to_color(i as u8));
    let mut converted = Entity::new(geometry);
    converted.color = color;
    Some(converted)
}

fn convert_to_dxf(
    drawing: &Drawing,
    view_port: Option<&ViewPort>,
    settings: &CodecSettings,
) -> dxf::Drawing {
    let mut dxf_drawing = dxf::Drawing::new();

    if let CodecSettings::Dxf { version } = settings {
        dxf_drawing.header.version = match version {
            DxfFileVersion::R12 => dxf::enums::AcadVersion::R12,
            DxfFileVersion::R2000 => dxf::enums::AcadVersion::R2000,
            DxfFileVersion::R2004 => dxf::enums::AcadVersion::R2004,
            DxfFileVersion::R2007 => dxf::enums::AcadVersion::R2007,
            DxfFileVersion::R2010 => dxf::enums::AcadVersion::R2010,
            DxfFileVersion::R2013 => dxf::enums::AcadVersion::R2013,
        };
    }

    // 导出图层
    for layer in drawing.layers() {
        let mut dxf_layer = dxf::tables::Layer::default();
        dxf_layer.name = layer.name.clone();
        if let Some(color) = layer.color {
            dxf_layer.color = dxf::Color::from_index(color_to_aci(&color));
        }
        dxf_drawing.add_layer(dxf_layer);
    }

    // 导出模型空间实体
    for layer in drawing.layers() {
        for entity in &layer.entities {
            if let Some(mut dxf_entity) = convert_to_dxf_entity(entity) {
                dxf_entity.common.layer = layer.name.clone();
                dxf_drawing.add_entity(dxf_entity);
            }
        }
    }

    // 回写活动视口
    if let Some(vp) = view_port {
        let mut dxf_vp = dxf::tables::ViewPort::default();
        dxf_vp.name = ACTIVE_VIEW_PORT_NAME.to_string();
        dxf_vp.lower_left = dxf::Point::new(vp.bottom_left().x, vp.bottom_left().y, 0.0);
        dxf_vp.view_direction = dxf::Vector::new(vp.sight().x, vp.sight().y, vp.sight().z);
        dxf_vp.view_height = vp.view_height();
        dxf_drawing.add_view_port(dxf_vp);
    }

    dxf_drawing
}

fn convert_to_dxf_entity(entity: &Entity) -> Option<dxf::entities::Entity> {
    let specific = match &entity.geometry {
        Geometry::Line(line) => {
            let mut dxf_line = dxf::entities::Line::default();
            dxf_line.p1 = dxf::Point::new(line.start.x, line.start.y, line.start.z);
            dxf_line.p2 = dxf::Point::new(line.end.x, line.end.y, line.end.z);
            dxf::entities::EntityType::Line(dxf_line)
        }

        Geometry::Circle(circle) => {
            let mut dxf_circle = dxf::entities::Circle::default();
            dxf_circle.center = dxf::Point::new(circle.center.x, circle.center.y, circle.center.z);
            dxf_circle.radius = circle.radius;
            dxf::entities::EntityType::Circle(dxf_circle)
        }

        Geometry::Arc(arc) => {
            let mut dxf_arc = dxf::entities::Arc::default();
            dxf_arc.center = dxf::Point::new(arc.center.x, arc.center.y, arc.center.z);
            dxf_arc.radius = arc.radius;
            dxf_arc.start_angle = arc.start_angle.to_degrees();
            dxf_arc.end_angle = arc.end_angle.to_degrees();
            dxf::entities::EntityType::Arc(dxf_arc)
        }

        Geometry::Ellipse(ellipse) => {
            let mut dxf_ellipse = dxf::entities::Ellipse::default();
            dxf_ellipse.center =
                dxf::Point::new(ellipse.center.x, ellipse.center.y, ellipse.center.z);
            dxf_ellipse.major_axis =
                dxf::Vector::new(ellipse.major_axis.x, ellipse.major_axis.y, 0.0);
            dxf_ellipse.minor_axis_ratio = ellipse.ratio;
            dxf_ellipse.start_parameter = 0.0;
            dxf_ellipse.end_parameter = std::f64::consts::TAU;
            dxf::entities::EntityType::Ellipse(dxf_ellipse)
        }

        Geometry::Polyline(polyline) => {
            let mut lwpoly = dxf::entities::LwPolyline::default();
            lwpoly.set_is_closed(polyline.closed);
            lwpoly.vertices = polyline
                .vertices
                .iter()
                .map(|v| {
                    let mut vertex = dxf::LwPolylineVertex::default();
                    vertex.x = v.x;
                    vertex.y = v.y;
                    vertex
                })
                .collect();
            dxf::entities::EntityType::LwPolyline(lwpoly)
        }

        Geometry::Point(point) => {
            let mut dxf_point = dxf::entities::ModelPoint::default();
            dxf_point.location =
                dxf::Point::new(point.position.x, point.position.y, point.position.z);
            dxf::entities::EntityType::ModelPoint(dxf_point)
        }
    };

    let mut dxf_entity = dxf::entities::Entity::new(specific);
    if let Some(color) = entity.color {
        dxf_entity.common.color = dxf::Color::from_index(color_to_aci(&color));
    }
    Some(dxf_entity)
}

/// AutoCAD颜色索引(ACI)转颜色
fn aci_to_color(aci: u8) -> Color {
    match aci {
        1 => Color::RED,
        2 => Color::YELLOW,
        3 => Color::GREEN,
        4 => Color::CYAN,
        5 => Color::BLUE,
        6 => Color::MAGENTA,
        7 => Color::WHITE,
        8 => Color::GRAY,
        _ => Color::WHITE,
    }
}

/// 颜色转AutoCAD颜色索引
fn color_to_aci(color: &Color) -> u8 {
    match (color.r, color.g, color.b) {
        (255, 0, 0) => 1,
        (255, 255, 0) => 2,
        (0, 255, 0) => 3,
        (0, 255, 255) => 4,
        (0, 0, 255) => 5,
        (255, 0, 255) => 6,
        (255, 255, 255) => 7,
        (128, 128, 128) => 8,
        _ => 7,
    }
}
