//! 编解码器与绘图仪注册表
//!
//! 不做任何运行时发现，所有实现显式注册。按扩展名（编解码器）
//! 或名称（绘图仪）查找，匹配不区分大小写。

use crate::codec::DrawingCodec;
use crate::dxf_io::DxfCodec;
use crate::error::FileError;
use crate::iges::IgesCodec;
use crate::plot::Plotter;
use crate::stl::StlCodec;
use crate::svg_plot::SvgPlotter;
use std::path::Path;

/// 编解码器注册表
#[derive(Default)]
pub struct CodecRegistry {
    codecs: Vec<Box<dyn DrawingCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置格式全家桶：DXF、IGES、STL
    pub fn with_default_codecs() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DxfCodec));
        registry.register(Box::new(IgesCodec));
        registry.register(Box::new(StlCodec));
        registry
    }

    pub fn register(&mut self, codec: Box<dyn DrawingCodec>) {
        self.codecs.push(codec);
    }

    pub fn codecs(&self) -> impl Iterator<Item = &dyn DrawingCodec> {
        self.codecs.iter().map(|c| c.as_ref())
    }

    /// 支持读取的编解码器
    pub fn readers(&self) -> impl Iterator<Item = &dyn DrawingCodec> {
        self.codecs().filter(|c| c.can_read())
    }

    /// 支持写入的编解码器
    pub fn writers(&self) -> impl Iterator<Item = &dyn DrawingCodec> {
        self.codecs().filter(|c| c.can_write())
    }

    /// 按扩展名查找，接受带点或不带点的写法
    pub fn codec_for_extension(&self, extension: &str) -> Option<&dyn DrawingCodec> {
        let normalized = normalize_extension(extension);
        self.codecs
            .iter()
            .find(|c| c.extensions().contains(&normalized.as_str()))
            .map(|c| c.as_ref())
    }

    /// 按文件路径的扩展名查找，没有匹配的编解码器时报告
    /// 无法识别的格式
    pub fn codec_for_path(&self, path: &Path) -> Result<&dyn DrawingCodec, FileError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.codec_for_extension(ext))
            .ok_or_else(|| FileError::UnrecognizedFormat(path.display().to_string()))
    }
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim_start_matches('.');
    format!(".{}", trimmed.to_ascii_lowercase())
}

/// 绘图仪注册表
#[derive(Default)]
pub struct PlotterRegistry {
    plotters: Vec<Box<dyn Plotter>>,
}

impl PlotterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_plotters() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SvgPlotter));
        registry
    }

    pub fn register(&mut self, plotter: Box<dyn Plotter>) {
        self.plotters.push(plotter);
    }

    pub fn plotters(&self) -> impl Iterator<Item = &dyn Plotter> {
        self.plotters.iter().map(|p| p.as_ref())
    }

    /// 按名称查找
    pub fn plotter(&self, display_name: &str) -> Option<&dyn Plotter> {
        self.plotters
            .iter()
            .find(|p| p.display_name().eq_ignore_ascii_case(display_name))
            .map(|p| p.as_ref())
    }
}
