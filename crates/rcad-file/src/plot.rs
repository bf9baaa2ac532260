//! 绘图仪抽象
//!
//! 绘图仪把图纸按指定视口投影到固定尺寸的输出表面。与编解码
//! 器不同，绘图仪的输出是单向的，不保证可以读回。

use crate::codec::ContentResolver;
use crate::error::FileError;
use rcad_core::drawing::Drawing;
use rcad_core::viewport::ViewPort;
use std::io::Write;

/// 绘图仪
pub trait Plotter: Send + Sync {
    /// 用户可见的绘图仪名称
    fn display_name(&self) -> &'static str;

    /// 把图纸输出到目标流
    ///
    /// `width`/`height` 是输出表面的像素尺寸；外部内容（如图片
    /// 引用）通过 `resolver` 解析。
    fn plot(
        &self,
        drawing: &Drawing,
        view_port: &ViewPort,
        width: f64,
        height: f64,
        out: &mut dyn Write,
        resolver: Option<&ContentResolver>,
    ) -> Result<(), FileError>;
}

/// 线宽按比例缩放
///
/// 视口比例未定义（NaN）时返回 0.0，让输出端用默认线宽兜底，
/// 避免 NaN 污染输出文件。
pub fn apply_scale_to_thickness(thickness: f64, scale: f64) -> f64 {
    if scale.is_nan() {
        0.0
    } else {
        thickness * scale
    }
}
