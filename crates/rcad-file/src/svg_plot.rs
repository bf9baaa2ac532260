//! SVG 绘图仪
//!
//! 输出结构：
//! - 根元素带 `viewBox`，尺寸即请求的像素尺寸
//! - 最外层 `<g>` 承载视口投影（窗口风格，Y 向下）
//! - 每个可见图层一个 `<g>`，携带图层描边色和名称注释
//! - 实体以世界坐标写出，线宽换算回世界单位以抵消投影缩放

use crate::codec::ContentResolver;
use crate::error::FileError;
use crate::plot::{apply_scale_to_thickness, Plotter};
use rcad_core::drawing::{Drawing, Layer};
use rcad_core::entity::Entity;
use rcad_core::geometry::Geometry;
use rcad_core::viewport::ViewPort;
use std::io::Write;

/// 无图层颜色时的缺省描边色
const DEFAULT_STROKE: &str = "#000000";

/// SVG 绘图仪
#[derive(Debug, Default)]
pub struct SvgPlotter;

impl Plotter for SvgPlotter {
    fn display_name(&self) -> &'static str {
        "SVG"
    }

    fn plot(
        &self,
        drawing: &Drawing,
        view_port: &ViewPort,
        width: f64,
        height: f64,
        out: &mut dyn Write,
        _resolver: Option<&ContentResolver>,
    ) -> Result<(), FileError> {
        let scale = height / view_port.view_height();
        let bottom_left = view_port.bottom_left();

        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{width:.2}" height="{height:.2}" viewBox="0 0 {width:.2} {height:.2}">
"#
        ));

        // 窗口风格投影：平移到左上角、翻转 Y、对齐视口左下角
        svg.push_str(&format!(
            "  <g transform=\"translate(0,{:.4}) scale({:.6},-{:.6}) translate({:.4},{:.4})\">\n",
            height, scale, scale, -bottom_left.x, -bottom_left.y
        ));

        for layer in drawing.layers() {
            if !layer.visible || layer.entities.is_empty() {
                continue;
            }
            self.plot_layer(&mut svg, layer, scale);
        }

        svg.push_str("  </g>\n</svg>\n");
        out.write_all(svg.as_bytes())?;
        Ok(())
    }
}

impl SvgPlotter {
    fn plot_layer(&self, svg: &mut String, layer: &Layer, scale: f64) {
        let stroke = layer
            .color
            .map(|c| c.to_rgb_string())
            .unwrap_or_else(|| DEFAULT_STROKE.to_string());

        svg.push_str(&format!("    <!-- layer: {} -->\n", layer.name));
        svg.push_str(&format!(
            "    <g stroke=\"{stroke}\" fill=\"none\">\n"
        ));
        for entity in &layer.entities {
            if let Some(element) = entity_to_svg(entity, scale) {
                svg.push_str("      ");
                svg.push_str(&element);
                svg.push('\n');
            }
        }
        svg.push_str("    </g>\n");
    }
}

fn entity_to_svg(entity: &Entity, scale: f64) -> Option<String> {
    // 线宽先换算到像素并保证至少 1 像素，再除回世界单位
    // 以抵消外层投影的缩放
    let display_width = apply_scale_to_thickness(entity.thickness, scale).max(1.0);
    let stroke_width = display_width / scale;

    let mut style = format!("stroke-width=\"{stroke_width:.4}\"");
    if let Some(color) = entity.color {
        style.push_str(&format!(" stroke=\"{}\"", color.to_rgb_string()));
    }
    let pattern = entity.line_type.pattern();
    if !pattern.is_empty() {
        let dashes: Vec<String> = pattern.iter().map(|v| format!("{:.2}", v.abs())).collect();
        style.push_str(&format!(" stroke-dasharray=\"{}\"", dashes.join(",")));
    }

    let element = match &entity.geometry {
        Geometry::Line(line) => format!(
            r#"<line x1="{:.4}" y1="{:.4}" x2="{:.4}" y2="{:.4}" {style}/>"#,
            line.start.x, line.start.y, line.end.x, line.end.y
        ),

        Geometry::Circle(circle) => format!(
            r#"<circle cx="{:.4}" cy="{:.4}" r="{:.4}" {style}/>"#,
            circle.center.x, circle.center.y, circle.radius
        ),

        Geometry::Arc(arc) => {
            let start = arc.start_point();
            let end = arc.end_point();
            let large_arc = i32::from(arc.sweep() > std::f64::consts::PI);
            format!(
                r#"<path d="M {:.4} {:.4} A {:.4} {:.4} 0 {large_arc} 1 {:.4} {:.4}" {style}/>"#,
                start.x, start.y, arc.radius, arc.radius, end.x, end.y
            )
        }

        Geometry::Ellipse(ellipse) => {
            let rx = ellipse.major_axis.norm();
            let ry = rx * ellipse.ratio;
            let rotation = ellipse.major_axis.y.atan2(ellipse.major_axis.x).to_degrees();
            format!(
                r#"<ellipse cx="{:.4}" cy="{:.4}" rx="{rx:.4}" ry="{ry:.4}" transform="rotate({rotation:.4} {:.4} {:.4})" {style}/>"#,
                ellipse.center.x, ellipse.center.y, ellipse.center.x, ellipse.center.y
            )
        }

        Geometry::Polyline(polyline) => {
            if polyline.vertices.is_empty() {
                return None;
            }
            let mut path = String::new();
            for (i, vertex) in polyline.vertices.iter().enumerate() {
                let command = if i == 0 { 'M' } else { 'L' };
                path.push_str(&format!("{command} {:.4} {:.4} ", vertex.x, vertex.y));
            }
            if polyline.closed {
                path.push('Z');
            }
            format!(r#"<path d="{}" {style}/>"#, path.trim_end())
        }

        // 点画成实心小圆，半径固定为 1 像素
        Geometry::Point(point) => {
            let fill = entity
                .color
                .map(|c| c.to_rgb_string())
                .unwrap_or_else(|| DEFAULT_STROKE.to_string());
            format!(
                r#"<circle cx="{:.4}" cy="{:.4}" r="{:.4}" fill="{fill}" stroke="none"/>"#,
                point.position.x,
                point.position.y,
                1.0 / scale
            )
        }
    };

    Some(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcad_core::geometry::{Circle, Line};
    use rcad_core::math::Point3;
    use rcad_core::properties::{Color, LineType};

    fn plot_to_string(drawing: &Drawing) -> String {
        let plotter = SvgPlotter;
        let mut out = Vec::new();
        plotter
            .plot(
                drawing,
                &ViewPort::default_view(),
                640.0,
                480.0,
                &mut out,
                None,
            )
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_svg_structure() {
        let mut drawing = Drawing::new();
        drawing.layer_mut("0").unwrap().color = Some(Color::RED);
        drawing.add_entity(Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(10.0, 5.0, 0.0),
        ))));

        let svg = plot_to_string(&drawing);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="0 0 640.00 480.00""#));
        assert!(svg.contains("<!-- layer: 0 -->"));
        assert!(svg.contains(r##"stroke="#FF0000""##));
        assert!(svg.contains("<line"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_hidden_layer_is_skipped() {
        let mut drawing = Drawing::new();
        drawing.add_entity_to_layer(
            "hidden",
            Entity::new(Geometry::Circle(Circle::new(Point3::origin(), 5.0))),
        );
        drawing.layer_mut("hidden").unwrap().visible = false;

        let svg = plot_to_string(&drawing);
        assert!(!svg.contains("hidden"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_stroke_width_has_a_floor() {
        // 线宽为零的实体仍要可见：显示宽度至少 1 像素，
        // 除以缩放比例 480/100 = 4.8 后是 0.2083 世界单位
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        ))));

        let svg = plot_to_string(&drawing);
        assert!(svg.contains(r#"stroke-width="0.2083""#));
    }

    #[test]
    fn test_dashed_line_type() {
        let mut drawing = Drawing::new();
        drawing.add_entity(
            Entity::new(Geometry::Line(Line::new(
                Point3::origin(),
                Point3::new(10.0, 0.0, 0.0),
            )))
            .with_line_type(LineType::Dashed),
        );

        let svg = plot_to_string(&drawing);
        assert!(svg.contains(r#"stroke-dasharray="12.00,6.00""#));
    }
}
