//! STL 只读导入
//!
//! 同时支持两种 STL 变体：
//! - ASCII：以 `solid` 开头的关键字令牌流
//! - 二进制：80 字节头 + u32 三角形数量 + 每个三角形 50 字节
//!
//! 网格在图纸模型中没有对应图元，每个三角形转换为 3 条线段，
//! 放入以实体名命名的图层。该格式只进不出：写入请求一律返回
//! [`FileError::ReadOnlyFormat`]。

use crate::codec::{
    CancelFlag, CodecSettings, ContentResolver, DrawingCodec, DrawingFile, ReadDrawingResult,
};
use crate::error::FileError;
use rcad_core::drawing::Drawing;
use rcad_core::entity::Entity;
use rcad_core::geometry::{Geometry, Line};
use rcad_core::math::Point3;
use rcad_core::viewport::ViewPort;
use std::io::{Read, Write};

/// 二进制变体中每个三角形的字节数（12 个 f32 + u16 属性）
const BINARY_TRIANGLE_SIZE: usize = 50;
/// 二进制头部长度
const BINARY_HEADER_SIZE: usize = 80;

const DEFAULT_SOLID_NAME: &str = "stl";

/// STL 编解码器（只读）
#[derive(Debug, Default)]
pub struct StlCodec;

impl DrawingCodec for StlCodec {
    fn display_name(&self) -> &'static str {
        "STL"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".stl"]
    }

    fn can_write(&self) -> bool {
        false
    }

    fn read_drawing(
        &self,
        file_name: &str,
        reader: &mut dyn Read,
        _resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<ReadDrawingResult, FileError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let mut drawing = parse_stl(&bytes, cancel)?;
        drawing.settings.file_name = Some(file_name.to_string());

        Ok(ReadDrawingResult {
            drawing,
            view_port: None,
        })
    }

    fn write_drawing(
        &self,
        _file_name: &str,
        _writer: &mut dyn Write,
        _drawing: &Drawing,
        _view_port: Option<&ViewPort>,
        _settings: &CodecSettings,
    ) -> Result<(), FileError> {
        Err(FileError::ReadOnlyFormat("STL"))
    }

    fn open_drawing_file(
        &self,
        file_name: &str,
        reader: &mut dyn Read,
        _resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<Box<dyn DrawingFile>, FileError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let mut drawing = parse_stl(&bytes, cancel)?;
        drawing.settings.file_name = Some(file_name.to_string());

        Ok(Box::new(StlDrawingFile { bytes, drawing }))
    }
}

/// 已打开的 STL 文件，`save` 逐字节回写原始内容
pub struct StlDrawingFile {
    bytes: Vec<u8>,
    drawing: Drawing,
}

impl DrawingFile for StlDrawingFile {
    fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    fn view_port(&self) -> Option<&ViewPort> {
        None
    }

    fn save(&self, writer: &mut dyn Write) -> Result<(), FileError> {
        writer.write_all(&self.bytes)?;
        Ok(())
    }
}

fn parse_stl(bytes: &[u8], cancel: &CancelFlag) -> Result<Drawing, FileError> {
    if bytes.starts_with(b"solid ") || bytes.starts_with(b"solid\n") || bytes.starts_with(b"solid\r")
    {
        parse_ascii(bytes, cancel)
    } else {
        parse_binary(bytes, cancel)
    }
}

fn add_triangle(drawing: &mut Drawing, layer_name: &str, vertices: [Point3; 3]) {
    for i in 0..3 {
        let line = Line::new(vertices[i], vertices[(i + 1) % 3]);
        drawing.add_entity_to_layer(layer_name, Entity::new(Geometry::Line(line)));
    }
}

fn parse_ascii(bytes: &[u8], cancel: &CancelFlag) -> Result<Drawing, FileError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| FileError::Corrupt("ASCII solid contains invalid UTF-8".into()))?;
    let mut tokens = text.split_whitespace().peekable();

    let expect = |tokens: &mut std::iter::Peekable<std::str::SplitWhitespace>,
                  keyword: &str|
     -> Result<(), FileError> {
        match tokens.next() {
            Some(token) if token.eq_ignore_ascii_case(keyword) => Ok(()),
            Some(token) => Err(FileError::Corrupt(format!(
                "expected keyword '{keyword}' but found '{token}'"
            ))),
            None => Err(FileError::Corrupt(format!(
                "unexpected end of file; expected keyword '{keyword}'"
            ))),
        }
    };
    let real = |tokens: &mut std::iter::Peekable<std::str::SplitWhitespace>|
     -> Result<f64, FileError> {
        tokens
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .ok_or_else(|| FileError::Corrupt("expected a numeric value".into()))
    };

    expect(&mut tokens, "solid")?;
    let solid_name = match tokens.peek() {
        Some(&token) if !token.eq_ignore_ascii_case("facet") => {
            tokens.next();
            token.to_string()
        }
        _ => DEFAULT_SOLID_NAME.to_string(),
    };

    let mut drawing = Drawing::new();
    loop {
        cancel.check()?;
        match tokens.next() {
            Some(token) if token.eq_ignore_ascii_case("facet") => {
                expect(&mut tokens, "normal")?;
                // 法向量对线框转换没有意义，读取后丢弃
                for _ in 0..3 {
                    real(&mut tokens)?;
                }

                expect(&mut tokens, "outer")?;
                expect(&mut tokens, "loop")?;
                let mut vertices = [Point3::origin(); 3];
                for vertex in &mut vertices {
                    expect(&mut tokens, "vertex")?;
                    *vertex = Point3::new(
                        real(&mut tokens)?,
                        real(&mut tokens)?,
                        real(&mut tokens)?,
                    );
                }
                expect(&mut tokens, "endloop")?;
                expect(&mut tokens, "endfacet")?;

                add_triangle(&mut drawing, &solid_name, vertices);
            }
            Some(token) if token.eq_ignore_ascii_case("endsolid") => break,
            Some(token) => {
                return Err(FileError::Corrupt(format!(
                    "expected 'facet' or 'endsolid' but found '{token}'"
                )))
            }
            None => {
                return Err(FileError::Corrupt(
                    "unexpected end of file; missing 'endsolid'".into(),
                ))
            }
        }
    }

    Ok(drawing)
}

fn parse_binary(bytes: &[u8], cancel: &CancelFlag) -> Result<Drawing, FileError> {
    if bytes.len() < BINARY_HEADER_SIZE + 4 {
        return Err(FileError::Corrupt(
            "binary solid is shorter than its fixed header".into(),
        ));
    }

    let count_bytes = [
        bytes[BINARY_HEADER_SIZE],
        bytes[BINARY_HEADER_SIZE + 1],
        bytes[BINARY_HEADER_SIZE + 2],
        bytes[BINARY_HEADER_SIZE + 3],
    ];
    let triangle_count = u32::from_le_bytes(count_bytes) as usize;

    let expected_len = BINARY_HEADER_SIZE + 4 + triangle_count * BINARY_TRIANGLE_SIZE;
    if bytes.len() < expected_len {
        return Err(FileError::Corrupt(format!(
            "binary solid declares {triangle_count} triangles but the file is truncated"
        )));
    }

    let mut drawing = Drawing::new();
    let mut offset = BINARY_HEADER_SIZE + 4;
    for _ in 0..triangle_count {
        cancel.check()?;

        let f32_at = |base: usize| -> f64 {
            let raw = [bytes[base], bytes[base + 1], bytes[base + 2], bytes[base + 3]];
            f32::from_le_bytes(raw) as f64
        };

        // 跳过法向量（前 3 个 f32）
        let mut vertices = [Point3::origin(); 3];
        for (i, vertex) in vertices.iter_mut().enumerate() {
            let base = offset + 12 + i * 12;
            *vertex = Point3::new(f32_at(base), f32_at(base + 4), f32_at(base + 8));
        }

        add_triangle(&mut drawing, DEFAULT_SOLID_NAME, vertices);
        offset += BINARY_TRIANGLE_SIZE;
    }

    Ok(drawing)
}
