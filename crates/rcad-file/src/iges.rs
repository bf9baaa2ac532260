//! IGES 编解码器
//!
//! IGES 是 80 列定长记录格式：第 1-72 列是数据，第 73 列是
//! 分区字母，第 74-80 列是分区内的序号。分区依次为：
//! - S (Start): 人类可读的说明
//! - G (Global): 全局参数，含分隔符声明和单位
//! - D (Directory): 实体目录，每个实体占两行，每行 9 个 8 列字段
//! - P (Parameter): 实体参数数据，第 65-72 列回指目录行号
//! - T (Terminate): 各分区行数汇总
//!
//! 读取时对结构做严格校验：序号连续性、汇总行数、目录到参数
//! 区的指针范围和回指一致性，任何不符即报告文件损坏。
//!
//! 支持的实体类型：
//! - 100 圆弧（起止点重合时视为整圆）
//! - 110 直线
//! - 116 点

use crate::codec::{
    CancelFlag, CodecSettings, ContentResolver, DrawingCodec, DrawingFile, ReadDrawingResult,
};
use crate::error::FileError;
use rcad_core::drawing::{Drawing, UnitFormat};
use rcad_core::entity::Entity;
use rcad_core::geometry::{Arc, Circle, Geometry, Line, Point};
use rcad_core::math::{points_approx_eq, Point3};
use rcad_core::properties::Color;
use rcad_core::viewport::ViewPort;
use std::io::{Read, Write};
use tracing::{debug, warn};

/// 数据区宽度（第 1-72 列）
const DATA_WIDTH: usize = 72;
/// 参数区数据宽度（第 1-64 列，其后是目录回指）
const PARAMETER_DATA_WIDTH: usize = 64;

/// IGES 编解码器
#[derive(Debug, Default)]
pub struct IgesCodec;

impl DrawingCodec for IgesCodec {
    fn display_name(&self) -> &'static str {
        "IGES"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".igs", ".iges"]
    }

    fn read_drawing(
        &self,
        file_name: &str,
        reader: &mut dyn Read,
        _resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<ReadDrawingResult, FileError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let mut drawing = parse_iges(&text, cancel)?;
        drawing.settings.file_name = Some(file_name.to_string());

        // IGES 没有视口概念
        Ok(ReadDrawingResult {
            drawing,
            view_port: None,
        })
    }

    fn write_drawing(
        &self,
        file_name: &str,
        writer: &mut dyn Write,
        drawing: &Drawing,
        _view_port: Option<&ViewPort>,
        _settings: &CodecSettings,
    ) -> Result<(), FileError> {
        let text = format_iges(file_name, drawing);
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn open_drawing_file(
        &self,
        file_name: &str,
        reader: &mut dyn Read,
        _resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<Box<dyn DrawingFile>, FileError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let mut drawing = parse_iges(&text, cancel)?;
        drawing.settings.file_name = Some(file_name.to_string());

        Ok(Box::new(IgesDrawingFile { text, drawing }))
    }
}

/// 已打开的 IGES 文件
///
/// 保留原始记录文本，`save` 时逐字节回写，未识别的实体类型
/// 不会丢失。
pub struct IgesDrawingFile {
    text: String,
    drawing: Drawing,
}

impl DrawingFile for IgesDrawingFile {
    fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    fn view_port(&self) -> Option<&ViewPort> {
        None
    }

    fn save(&self, writer: &mut dyn Write) -> Result<(), FileError> {
        writer.write_all(self.text.as_bytes())?;
        Ok(())
    }
}

/// 目录条目（两行记录解析后的结果）
struct DirectoryEntry {
    entity_type: i32,
    /// 指向参数区的行号（1 起始）
    parameter_pointer: usize,
    parameter_line_count: usize,
    color_number: i32,
}

fn parse_iges(text: &str, cancel: &CancelFlag) -> Result<Drawing, FileError> {
    let mut global_text = String::new();
    let mut directory_lines: Vec<String> = Vec::new();
    let mut parameter_lines: Vec<String> = Vec::new();
    let mut terminate_line: Option<String> = None;

    let mut section_counts = [0usize; 5]; // S G D P T

    for (index, raw) in text.lines().enumerate() {
        cancel.check()?;
        if raw.trim().is_empty() {
            continue;
        }
        if !raw.is_ascii() {
            return Err(FileError::Corrupt(format!(
                "record {} contains non-ASCII data",
                index + 1
            )));
        }
        if raw.len() < DATA_WIDTH + 1 {
            return Err(FileError::Corrupt(format!(
                "record {} is shorter than 73 columns",
                index + 1
            )));
        }

        let data = &raw[..DATA_WIDTH];
        let section = raw.as_bytes()[DATA_WIDTH] as char;
        let sequence: usize = raw[DATA_WIDTH + 1..]
            .trim()
            .parse()
            .map_err(|_| {
                FileError::Corrupt(format!("record {} has an invalid sequence number", index + 1))
            })?;

        let slot = match section {
            'S' => 0,
            'G' => 1,
            'D' => 2,
            'P' => 3,
            'T' => 4,
            other => {
                return Err(FileError::Corrupt(format!(
                    "record {} has unknown section letter '{other}'",
                    index + 1
                )))
            }
        };
        section_counts[slot] += 1;
        if sequence != section_counts[slot] {
            return Err(FileError::Corrupt(format!(
                "section {section} sequence numbers are not contiguous at record {}",
                index + 1
            )));
        }

        match section {
            'S' => {}
            'G' => global_text.push_str(data.trim_end()),
            'D' => directory_lines.push(data.to_string()),
            'P' => parameter_lines.push(data.to_string()),
            'T' => terminate_line = Some(data.to_string()),
            _ => unreachable!(),
        }
    }

    let terminate =
        terminate_line.ok_or_else(|| FileError::Corrupt("missing terminate record".into()))?;
    validate_terminate(
        &terminate,
        section_counts[0],
        section_counts[1],
        directory_lines.len(),
        parameter_lines.len(),
    )?;

    if directory_lines.len() % 2 != 0 {
        return Err(FileError::Corrupt(
            "directory section must contain an even number of records".into(),
        ));
    }

    let (param_delim, record_delim, global_fields) = parse_global(&global_text)?;
    let unit_format = match global_fields.get(13).map(String::as_str) {
        Some("1") => UnitFormat::Architectural,
        _ => UnitFormat::Metric,
    };

    let mut drawing = Drawing::new();
    drawing.settings.unit_format = unit_format;

    for (entry_index, pair) in directory_lines.chunks(2).enumerate() {
        cancel.check()?;
        let entry = parse_directory_entry(entry_index, &pair[0], &pair[1])?;

        // 指针必须完整落在参数区内
        let first = entry.parameter_pointer;
        if first == 0
            || entry.parameter_line_count == 0
            || first + entry.parameter_line_count - 1 > parameter_lines.len()
        {
            return Err(FileError::Corrupt(format!(
                "directory entry {} points outside the parameter section",
                entry_index + 1
            )));
        }

        // 参数行必须回指这个目录条目
        let directory_sequence = entry_index * 2 + 1;
        let mut parameter_text = String::new();
        for line in &parameter_lines[first - 1..first - 1 + entry.parameter_line_count] {
            let back_pointer: usize = line[PARAMETER_DATA_WIDTH..]
                .trim()
                .parse()
                .map_err(|_| {
                    FileError::Corrupt(format!(
                        "parameter record for directory entry {} has an invalid back pointer",
                        entry_index + 1
                    ))
                })?;
            if back_pointer != directory_sequence {
                return Err(FileError::Corrupt(format!(
                    "parameter record back pointer {back_pointer} does not match directory entry {}",
                    entry_index + 1
                )));
            }
            parameter_text.push_str(line[..PARAMETER_DATA_WIDTH].trim_end());
        }

        let fields = split_fields(&parameter_text, param_delim, record_delim);
        if let Some(entity) = convert_iges_entity(&entry, &fields)? {
            drawing.add_entity(entity);
        }
    }

    debug!(
        directory_entries = directory_lines.len() / 2,
        parameter_records = parameter_lines.len(),
        entities = drawing.entity_count(),
        "parsed IGES sections"
    );
    Ok(drawing)
}

/// 校验汇总记录的各分区行数
fn validate_terminate(
    terminate: &str,
    start: usize,
    global: usize,
    directory: usize,
    parameter: usize,
) -> Result<(), FileError> {
    for (letter, expected) in [('S', start), ('G', global), ('D', directory), ('P', parameter)] {
        let declared = terminate
            .find(letter)
            .and_then(|pos| terminate.get(pos + 1..pos + 8))
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                FileError::Corrupt(format!("terminate record is missing the {letter} count"))
            })?;
        if declared != expected {
            return Err(FileError::Corrupt(format!(
                "terminate record declares {declared} {letter} records but {expected} were present"
            )));
        }
    }
    Ok(())
}

/// 解析全局区：返回参数分隔符、记录分隔符和字段列表
///
/// 前两个字段以 Hollerith 形式声明分隔符本身，缺省为 `,` 和 `;`。
fn parse_global(text: &str) -> Result<(char, char, Vec<String>), FileError> {
    let mut param_delim = ',';
    let mut record_delim = ';';
    let mut rest = text;

    if let Some(stripped) = rest.strip_prefix("1H") {
        let mut chars = stripped.chars();
        param_delim = chars
            .next()
            .ok_or_else(|| FileError::Corrupt("truncated delimiter declaration".into()))?;
        // 跳过声明本身和后面的分隔符
        rest = &stripped[param_delim.len_utf8()..];
        rest = rest.strip_prefix(param_delim).unwrap_or(rest);
    } else {
        rest = rest.strip_prefix(param_delim).unwrap_or(rest);
    }

    if let Some(stripped) = rest.strip_prefix("1H") {
        let mut chars = stripped.chars();
        record_delim = chars
            .next()
            .ok_or_else(|| FileError::Corrupt("truncated delimiter declaration".into()))?;
        rest = &stripped[record_delim.len_utf8()..];
        rest = rest.strip_prefix(param_delim).unwrap_or(rest);
    } else {
        rest = rest.strip_prefix(param_delim).unwrap_or(rest);
    }

    let mut fields = vec![param_delim.to_string(), record_delim.to_string()];
    fields.extend(split_fields(rest, param_delim, record_delim));
    Ok((param_delim, record_delim, fields))
}

/// 按分隔符切分字段，支持 Hollerith 字符串（`nHxxx` 中的内容
/// 可以包含分隔符）
fn split_fields(text: &str, param_delim: char, record_delim: char) -> Vec<String> {
    let mut fields = Vec::new();
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        // Hollerith 前缀：数字串后跟 'H'
        let digit_end = bytes[pos..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digit_end > 0 && bytes.get(pos + digit_end) == Some(&b'H') {
            if let Ok(len) = text[pos..pos + digit_end].parse::<usize>() {
                let start = pos + digit_end + 1;
                let end = (start + len).min(bytes.len());
                fields.push(text[start..end].to_string());
                pos = end;
                // 跳过字段后的分隔符
                if bytes.get(pos) == Some(&(param_delim as u8)) {
                    pos += 1;
                }
                continue;
            }
        }

        let field_end = text[pos..]
            .find([param_delim, record_delim])
            .map(|i| pos + i)
            .unwrap_or(bytes.len());
        fields.push(text[pos..field_end].trim().to_string());
        if bytes.get(field_end) == Some(&(record_delim as u8)) {
            break;
        }
        pos = field_end + 1;
    }

    fields
}

fn parse_directory_entry(
    index: usize,
    first_line: &str,
    second_line: &str,
) -> Result<DirectoryEntry, FileError> {
    let field = |line: &str, i: usize| -> String {
        line.get(i * 8..(i + 1) * 8)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let parse_int = |value: String, what: &str| -> Result<i64, FileError> {
        if value.is_empty() {
            return Ok(0);
        }
        value.parse().map_err(|_| {
            FileError::Corrupt(format!("directory entry {} has an invalid {what}", index + 1))
        })
    };

    let entity_type = parse_int(field(first_line, 0), "entity type")? as i32;
    let second_type = parse_int(field(second_line, 0), "entity type")? as i32;
    if entity_type != second_type {
        return Err(FileError::Corrupt(format!(
            "directory entry {} has mismatched entity types across its two records",
            index + 1
        )));
    }

    // 变换矩阵指针（字段 7）：非零时需要矩阵实体支持
    if parse_int(field(first_line, 6), "transformation matrix pointer")? != 0 {
        return Err(FileError::UnsupportedFeature(format!(
            "directory entry {} references a transformation matrix",
            index + 1
        )));
    }

    Ok(DirectoryEntry {
        entity_type,
        parameter_pointer: parse_int(field(first_line, 1), "parameter pointer")? as usize,
        color_number: parse_int(field(second_line, 2), "color number")? as i32,
        parameter_line_count: parse_int(field(second_line, 3), "parameter line count")? as usize,
    })
}

fn convert_iges_entity(
    entry: &DirectoryEntry,
    fields: &[String],
) -> Result<Option<Entity>, FileError> {
    let real = |i: usize| -> Result<f64, FileError> {
        fields
            .get(i)
            .map(|s| s.replace(['D', 'd'], "E"))
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or_else(|| {
                FileError::Corrupt(format!(
                    "entity type {} is missing parameter {i}",
                    entry.entity_type
                ))
            })
    };

    let geometry = match entry.entity_type {
        // 直线：x1,y1,z1,x2,y2,z2
        110 => Geometry::Line(Line::new(
            Point3::new(real(1)?, real(2)?, real(3)?),
            Point3::new(real(4)?, real(5)?, real(6)?),
        )),

        // 圆弧：zt, xc,yc, xs,ys, xe,ye（起止点重合即整圆）
        100 => {
            let zt = real(1)?;
            let center = Point3::new(real(2)?, real(3)?, zt);
            let start = Point3::new(real(4)?, real(5)?, zt);
            let end = Point3::new(real(6)?, real(7)?, zt);
            let radius = (start - center).norm();

            if points_approx_eq(&start, &end) {
                Geometry::Circle(Circle::new(center, radius))
            } else {
                let start_angle = (start.y - center.y).atan2(start.x - center.x);
                let end_angle = (end.y - center.y).atan2(end.x - center.x);
                Geometry::Arc(Arc::new(center, radius, start_angle, end_angle))
            }
        }

        // 点：x,y,z
        116 => Geometry::Point(Point::new(Point3::new(real(1)?, real(2)?, real(3)?))),

        other => {
            warn!(entity_type = other, "skipping unsupported entity type");
            return Ok(None);
        }
    };

    let mut entity = Entity::new(geometry);
    entity.color = iges_color_to_color(entry.color_number);
    Ok(Some(entity))
}

/// IGES 颜色编号转颜色（0 表示未指定）
fn iges_color_to_color(number: i32) -> Option<Color> {
    match number {
        1 => Some(Color::BLACK),
        2 => Some(Color::RED),
        3 => Some(Color::GREEN),
        4 => Some(Color::BLUE),
        5 => Some(Color::YELLOW),
        6 => Some(Color::MAGENTA),
        7 => Some(Color::CYAN),
        8 => Some(Color::WHITE),
        _ => None,
    }
}

fn color_to_iges_color(color: Option<Color>) -> i32 {
    match color {
        Some(Color::BLACK) => 1,
        Some(Color::RED) => 2,
        Some(Color::GREEN) => 3,
        Some(Color::BLUE) => 4,
        Some(Color::YELLOW) => 5,
        Some(Color::MAGENTA) => 6,
        Some(Color::CYAN) => 7,
        Some(Color::WHITE) => 8,
        _ => 0,
    }
}

/// IGES 实数格式：保证带小数点
fn fmt_real(value: f64) -> String {
    let s = format!("{value}");
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{s}.")
    }
}

/// Hollerith 字符串编码
fn hollerith(s: &str) -> String {
    format!("{}H{}", s.len(), s)
}

fn format_iges(file_name: &str, drawing: &Drawing) -> String {
    let start_lines = vec!["RCAD drawing".to_string()];
    let global_lines = format_global_section(file_name, drawing);
    let mut directory_lines: Vec<String> = Vec::new();
    let mut parameter_lines: Vec<String> = Vec::new();

    for layer in drawing.layers() {
        for entity in &layer.entities {
            let effective_color = entity.color.or(layer.color);
            for (entity_type, parameters) in iges_parameters(entity) {
                append_entity(
                    entity_type,
                    &parameters,
                    color_to_iges_color(effective_color),
                    &mut directory_lines,
                    &mut parameter_lines,
                );
            }
        }
    }

    let terminate = format!(
        "S{:>7}G{:>7}D{:>7}P{:>7}",
        start_lines.len(),
        global_lines.len(),
        directory_lines.len(),
        parameter_lines.len()
    );

    let mut output = String::new();
    let mut emit = |lines: &[String], letter: char| {
        for (i, line) in lines.iter().enumerate() {
            output.push_str(&format!("{:<72}{}{:>7}\n", line, letter, i + 1));
        }
    };
    emit(&start_lines, 'S');
    emit(&global_lines, 'G');
    emit(&directory_lines, 'D');
    emit(&parameter_lines, 'P');
    emit(&[terminate], 'T');
    output
}

fn format_global_section(file_name: &str, drawing: &Drawing) -> Vec<String> {
    let (units_flag, units_name) = match drawing.settings.unit_format {
        UnitFormat::Architectural => ("1", "IN"),
        UnitFormat::Metric => ("2", "MM"),
    };
    let timestamp = chrono::Local::now().format("%Y%m%d.%H%M%S").to_string();
    let author = drawing.settings.author.clone().unwrap_or_default();

    let fields = [
        "1H,".to_string(),
        "1H;".to_string(),
        hollerith(file_name),
        hollerith(file_name),
        hollerith("RCAD"),
        hollerith("1.0"),
        "32".to_string(),
        "38".to_string(),
        "6".to_string(),
        "308".to_string(),
        "15".to_string(),
        hollerith(file_name),
        "1.".to_string(),
        units_flag.to_string(),
        hollerith(units_name),
        "1".to_string(),
        "0.01".to_string(),
        hollerith(&timestamp),
        "1E-10".to_string(),
        "0.".to_string(),
        hollerith(&author),
        hollerith(""),
        "11".to_string(),
        "0".to_string(),
        hollerith(&timestamp),
    ];

    let mut text = fields.join(",");
    text.push(';');

    text.as_bytes()
        .chunks(DATA_WIDTH)
        .map(|c| String::from_utf8_lossy(c).into_owned())
        .collect()
}

/// 实体转 IGES 参数串（多段线分解为多条直线）
fn iges_parameters(entity: &Entity) -> Vec<(i32, String)> {
    match &entity.geometry {
        Geometry::Line(line) => vec![(110, line_parameters(line))],

        Geometry::Circle(circle) => {
            let start = circle.point_at(0.0);
            vec![(
                100,
                format!(
                    "100,{},{},{},{},{},{},{};",
                    fmt_real(circle.center.z),
                    fmt_real(circle.center.x),
                    fmt_real(circle.center.y),
                    fmt_real(start.x),
                    fmt_real(start.y),
                    fmt_real(start.x),
                    fmt_real(start.y),
                ),
            )]
        }

        Geometry::Arc(arc) => {
            let start = arc.start_point();
            let end = arc.end_point();
            vec![(
                100,
                format!(
                    "100,{},{},{},{},{},{},{};",
                    fmt_real(arc.center.z),
                    fmt_real(arc.center.x),
                    fmt_real(arc.center.y),
                    fmt_real(start.x),
                    fmt_real(start.y),
                    fmt_real(end.x),
                    fmt_real(end.y),
                ),
            )]
        }

        Geometry::Point(point) => vec![(
            116,
            format!(
                "116,{},{},{},0;",
                fmt_real(point.position.x),
                fmt_real(point.position.y),
                fmt_real(point.position.z),
            ),
        )],

        Geometry::Polyline(polyline) => polyline
            .segments()
            .iter()
            .map(|segment| (110, line_parameters(segment)))
            .collect(),

        Geometry::Ellipse(_) => {
            warn!("ellipse has no mapping; skipping entity");
            Vec::new()
        }
    }
}

fn line_parameters(line: &Line) -> String {
    format!(
        "110,{},{},{},{},{},{};",
        fmt_real(line.start.x),
        fmt_real(line.start.y),
        fmt_real(line.start.z),
        fmt_real(line.end.x),
        fmt_real(line.end.y),
        fmt_real(line.end.z),
    )
}

fn append_entity(
    entity_type: i32,
    parameters: &str,
    color_number: i32,
    directory_lines: &mut Vec<String>,
    parameter_lines: &mut Vec<String>,
) {
    let directory_sequence = directory_lines.len() + 1;
    let parameter_pointer = parameter_lines.len() + 1;

    let chunks: Vec<&[u8]> = parameters.as_bytes().chunks(PARAMETER_DATA_WIDTH).collect();
    for chunk in &chunks {
        parameter_lines.push(format!(
            "{:<64}{:>8}",
            String::from_utf8_lossy(chunk),
            directory_sequence
        ));
    }

    directory_lines.push(format!(
        "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
        entity_type, parameter_pointer, 0, 0, 0, 0, 0, 0, "00000000"
    ));
    directory_lines.push(format!(
        "{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
        entity_type,
        0,
        color_number,
        chunks.len(),
        0,
        "",
        "",
        "",
        0
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcad_core::math::approx_eq;
    use std::io::Cursor;

    fn round_trip(drawing: &Drawing) -> Drawing {
        let codec = IgesCodec;
        let mut bytes = Vec::new();
        codec
            .write_drawing(
                "test.igs",
                &mut bytes,
                drawing,
                None,
                &CodecSettings::Default,
            )
            .unwrap();
        codec
            .read_drawing(
                "test.igs",
                &mut Cursor::new(bytes),
                None,
                &CancelFlag::new(),
            )
            .unwrap()
            .drawing
    }

    #[test]
    fn test_iges_line_round_trip() {
        let mut drawing = Drawing::new();
        drawing.add_entity(
            Entity::new(Geometry::Line(Line::new(
                Point3::new(1.0, 2.0, 3.0),
                Point3::new(4.0, 5.0, 6.0),
            )))
            .with_color(Color::GREEN),
        );

        let restored = round_trip(&drawing);
        assert_eq!(restored.entity_count(), 1);
        let entity = restored.all_entities().next().unwrap();
        match &entity.geometry {
            Geometry::Line(l) => {
                assert!(points_approx_eq(&l.start, &Point3::new(1.0, 2.0, 3.0)));
                assert!(points_approx_eq(&l.end, &Point3::new(4.0, 5.0, 6.0)));
            }
            other => panic!("expected line, got {other:?}"),
        }
        assert_eq!(entity.color, Some(Color::GREEN));
    }

    #[test]
    fn test_iges_circle_and_arc_round_trip() {
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(Geometry::Circle(Circle::new(
            Point3::new(10.0, -2.0, 1.0),
            4.0,
        ))));
        drawing.add_entity(Entity::new(Geometry::Arc(Arc::new(
            Point3::origin(),
            5.0,
            0.0,
            std::f64::consts::FRAC_PI_2,
        ))));

        let restored = round_trip(&drawing);
        assert_eq!(restored.entity_count(), 2);

        let geometries: Vec<_> = restored.all_entities().map(|e| &e.geometry).collect();
        assert!(geometries.iter().any(|g| matches!(g, Geometry::Circle(c)
            if approx_eq(c.radius, 4.0) && approx_eq(c.center.z, 1.0))));
        assert!(geometries.iter().any(|g| matches!(g, Geometry::Arc(a)
            if approx_eq(a.radius, 5.0)
            && approx_eq(a.sweep(), std::f64::consts::FRAC_PI_2))));
    }

    #[test]
    fn test_iges_polyline_decomposes_to_lines() {
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(Geometry::Polyline(
            rcad_core::geometry::Polyline::new(
                vec![
                    Point3::origin(),
                    Point3::new(10.0, 0.0, 0.0),
                    Point3::new(10.0, 10.0, 0.0),
                ],
                false,
            ),
        )));

        let restored = round_trip(&drawing);
        assert_eq!(restored.entity_count(), 2);
        assert!(restored
            .all_entities()
            .all(|e| matches!(e.geometry, Geometry::Line(_))));
    }

    #[test]
    fn test_iges_units_round_trip() {
        let mut drawing = Drawing::new();
        drawing.settings.unit_format = UnitFormat::Architectural;
        let restored = round_trip(&drawing);
        assert_eq!(restored.settings.unit_format, UnitFormat::Architectural);
    }

    #[test]
    fn test_short_record_is_corrupt() {
        let codec = IgesCodec;
        let result = codec.read_drawing(
            "bad.igs",
            &mut Cursor::new(b"too short\n".to_vec()),
            None,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(FileError::Corrupt(_))));
    }

    #[test]
    fn test_terminate_count_mismatch_is_corrupt() {
        // 汇总行声称有 2 条 S 记录，实际只有 1 条
        let mut text = String::new();
        text.push_str(&format!("{:<72}S{:>7}\n", "comment", 1));
        text.push_str(&format!("{:<72}G{:>7}\n", "1H,,1H;;", 1));
        text.push_str(&format!(
            "{:<72}T{:>7}\n",
            "S      2G      1D      0P      0", 1
        ));

        let codec = IgesCodec;
        let result = codec.read_drawing(
            "bad.igs",
            &mut Cursor::new(text.into_bytes()),
            None,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(FileError::Corrupt(_))));
    }

    #[test]
    fn test_dangling_parameter_pointer_is_corrupt() {
        // 目录条目指向不存在的参数行
        let mut text = String::new();
        text.push_str(&format!("{:<72}S{:>7}\n", "comment", 1));
        text.push_str(&format!("{:<72}G{:>7}\n", "1H,,1H;;", 1));
        text.push_str(&format!(
            "{:<72}D{:>7}\n",
            format!("{:>8}{:>8}", 110, 5),
            1
        ));
        text.push_str(&format!(
            "{:<72}D{:>7}\n",
            format!("{:>8}{:>8}{:>8}{:>8}", 110, 0, 0, 1),
            2
        ));
        text.push_str(&format!(
            "{:<72}T{:>7}\n",
            "S      1G      1D      2P      0", 1
        ));

        let codec = IgesCodec;
        let result = codec.read_drawing(
            "bad.igs",
            &mut Cursor::new(text.into_bytes()),
            None,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(FileError::Corrupt(_))));
    }

    #[test]
    fn test_transformation_matrix_is_unsupported() {
        let mut text = String::new();
        text.push_str(&format!("{:<72}S{:>7}\n", "comment", 1));
        text.push_str(&format!("{:<72}G{:>7}\n", "1H,,1H;;", 1));
        // 字段 7（变换矩阵指针）非零
        text.push_str(&format!(
            "{:<72}D{:>7}\n",
            format!("{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}", 110, 1, 0, 0, 0, 0, 3),
            1
        ));
        text.push_str(&format!(
            "{:<72}D{:>7}\n",
            format!("{:>8}{:>8}{:>8}{:>8}", 110, 0, 0, 1),
            2
        ));
        text.push_str(&format!(
            "{:<72}P{:>7}\n",
            format!("{:<64}{:>8}", "110,0.,0.,0.,1.,0.,0.;", 1),
            1
        ));
        text.push_str(&format!(
            "{:<72}T{:>7}\n",
            "S      1G      1D      2P      1", 1
        ));

        let codec = IgesCodec;
        let result = codec.read_drawing(
            "bad.igs",
            &mut Cursor::new(text.into_bytes()),
            None,
            &CancelFlag::new(),
        );
        assert!(matches!(result, Err(FileError::UnsupportedFeature(_))));
    }

    #[test]
    fn test_iges_read_cancellation() {
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(Geometry::Line(Line::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
        ))));
        let codec = IgesCodec;
        let mut bytes = Vec::new();
        codec
            .write_drawing(
                "test.igs",
                &mut bytes,
                &drawing,
                None,
                &CodecSettings::Default,
            )
            .unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = codec.read_drawing("test.igs", &mut Cursor::new(bytes), None, &cancel);
        assert!(matches!(result, Err(FileError::Cancelled)));
    }

    #[test]
    fn test_open_drawing_file_saves_verbatim() {
        let mut drawing = Drawing::new();
        drawing.add_entity(Entity::new(Geometry::Point(Point::new(Point3::new(
            1.0, 2.0, 3.0,
        )))));
        let codec = IgesCodec;
        let mut bytes = Vec::new();
        codec
            .write_drawing(
                "test.igs",
                &mut bytes,
                &drawing,
                None,
                &CodecSettings::Default,
            )
            .unwrap();

        let file = codec
            .open_drawing_file(
                "test.igs",
                &mut Cursor::new(bytes.clone()),
                None,
                &CancelFlag::new(),
            )
            .unwrap();
        assert_eq!(file.drawing().entity_count(), 1);

        let mut saved = Vec::new();
        file.save(&mut saved).unwrap();
        assert_eq!(saved, bytes);
    }
}
