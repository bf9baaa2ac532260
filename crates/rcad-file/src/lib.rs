//! RCAD 文件格式处理
//!
//! 支持：
//! - `.dxf` 读写（基于 dxf crate 的文档模型）
//! - `.igs`/`.iges` 读写（80 列定长记录）
//! - `.stl` 只读导入（ASCII 和二进制）
//! - SVG 绘图仪输出
//!
//! 所有编解码器实现统一的 [`codec::DrawingCodec`] trait，通过
//! [`registry::CodecRegistry`] 按扩展名显式注册和查找。

pub mod codec;
pub mod dxf_io;
pub mod error;
pub mod iges;
pub mod plot;
pub mod registry;
pub mod stl;
pub mod svg_plot;

pub use codec::{
    CancelFlag, CodecSettings, ContentResolver, DrawingCodec, DrawingFile, ReadDrawingResult,
};
pub use error::FileError;
pub use plot::{apply_scale_to_thickness, Plotter};
pub use registry::{CodecRegistry, PlotterRegistry};
