//! 编解码器抽象
//!
//! 所有图纸格式实现统一的 [`DrawingCodec`] trait：
//! - 读取产出图纸 + 可选视口（[`ReadDrawingResult`]）
//! - 写入接收图纸、可选视口和格式参数
//! - [`DrawingFile`] 保留格式原生的文档结构，用于高保真回写
//!
//! 外部内容（如 DXF 引用的图像）通过 [`ContentResolver`] 回调
//! 按名称解析，编解码器自身不做任何文件系统访问。长时间的读
//! 取通过 [`CancelFlag`] 在记录边界协作式取消。

use crate::error::FileError;
use rcad_core::drawing::Drawing;
use rcad_core::viewport::ViewPort;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 外部内容解析回调
///
/// 输入内容名称（如引用的文件名），返回其字节内容。
pub type ContentResolver<'a> = dyn Fn(&str) -> Result<Vec<u8>, FileError> + 'a;

/// 协作式取消标志
///
/// 克隆共享同一内部状态，任意一端置位后读取循环在下一个
/// 记录边界返回 [`FileError::Cancelled`]。
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// 已取消时返回错误，用于读取循环中的检查点
    pub fn check(&self) -> Result<(), FileError> {
        if self.is_cancelled() {
            Err(FileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// 读取结果：图纸 + 文件中携带的活动视口（如果有）
#[derive(Debug)]
pub struct ReadDrawingResult {
    pub drawing: Drawing,
    pub view_port: Option<ViewPort>,
}

/// DXF 文件版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DxfFileVersion {
    R12,
    R2000,
    R2004,
    R2007,
    #[default]
    R2010,
    R2013,
}

/// 格式相关的写入参数
#[derive(Debug, Clone, Default)]
pub enum CodecSettings {
    /// 使用各格式的默认参数
    #[default]
    Default,
    /// DXF 专用参数
    Dxf { version: DxfFileVersion },
}

/// 图纸编解码器
///
/// 实现必须是无状态的，同一实例可被并发用于多次读写。
pub trait DrawingCodec: Send + Sync {
    /// 用户可见的格式名称
    fn display_name(&self) -> &'static str;

    /// 支持的扩展名（小写、含点，如 ".dxf"）
    fn extensions(&self) -> &'static [&'static str];

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    /// 从流中读取图纸
    ///
    /// `file_name` 仅用于诊断信息；读取循环在每条记录之间
    /// 检查 `cancel`。
    fn read_drawing(
        &self,
        file_name: &str,
        reader: &mut dyn Read,
        resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<ReadDrawingResult, FileError>;

    /// 把图纸写入流
    fn write_drawing(
        &self,
        file_name: &str,
        writer: &mut dyn Write,
        drawing: &Drawing,
        view_port: Option<&ViewPort>,
        settings: &CodecSettings,
    ) -> Result<(), FileError>;

    /// 打开文件并保留格式原生结构
    ///
    /// 与 [`DrawingCodec::read_drawing`] 的区别在于返回值还持有
    /// 原生文档模型，`save` 时未被识别的内容不会丢失。
    fn open_drawing_file(
        &self,
        file_name: &str,
        reader: &mut dyn Read,
        resolver: Option<&ContentResolver>,
        cancel: &CancelFlag,
    ) -> Result<Box<dyn DrawingFile>, FileError>;
}

/// 已打开的图纸文件
///
/// 持有格式原生的文档结构，转换后的图纸只读访问。
pub trait DrawingFile {
    /// 转换后的图纸
    fn drawing(&self) -> &Drawing;

    /// 文件中的活动视口
    fn view_port(&self) -> Option<&ViewPort>;

    /// 以原生结构回写
    fn save(&self, writer: &mut dyn Write) -> Result<(), FileError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(flag.check().is_ok());

        clone.cancel();
        assert!(flag.is_cancelled());
        assert!(matches!(flag.check(), Err(FileError::Cancelled)));
    }
}
