//! 实体属性定义
//!
//! 包含颜色和线型等视觉属性。
//!
//! 颜色与平台表示之间通过 32 位 ARGB 值逐位转换，两个方向都保留
//! alpha 通道。"跟随图层"不用哨兵位表示，而是在实体上用
//! `Option<Color>` 表达（`None` = ByLayer），避免污染 ARGB 映射。

use serde::{Deserialize, Serialize};

/// ARGB颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    pub const fn with_alpha(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// 从32位ARGB值创建（如 0xFFFF0000 表示不透明红色）
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: ((argb >> 24) & 0xFF) as u8,
            r: ((argb >> 16) & 0xFF) as u8,
            g: ((argb >> 8) & 0xFF) as u8,
            b: (argb & 0xFF) as u8,
        }
    }

    /// 转换为32位ARGB值，与 `from_argb` 逐位互逆
    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// 格式化为 `#RRGGBB`，用于SVG等只认RGB的输出
    pub fn to_rgb_string(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// 格式化为 `#AARRGGBB`
    pub fn to_argb_string(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    /// 转换为 [0.0, 1.0] 范围的浮点数组（RGBA顺序）
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    // 预定义颜色（AutoCAD ACI颜色兼容）
    pub const RED: Color = Color::new(255, 0, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const GRAY: Color = Color::new(128, 128, 128);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// 线型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineType {
    /// 连续线（实线）
    Continuous,
    /// 虚线
    Dashed,
    /// 点线
    Dotted,
    /// 点划线
    DashDot,
    /// 自定义线型
    Custom {
        name: String,
        /// 线型模式（正数表示画线，负数表示空白）
        pattern: Vec<f64>,
    },
}

impl LineType {
    /// 获取线型的模式数据
    pub fn pattern(&self) -> Vec<f64> {
        match self {
            LineType::Continuous => vec![],
            LineType::Dashed => vec![12.0, -6.0],
            LineType::Dotted => vec![0.0, -6.0],
            LineType::DashDot => vec![12.0, -6.0, 0.0, -6.0],
            LineType::Custom { pattern, .. } => pattern.clone(),
        }
    }
}

impl Default for LineType {
    fn default() -> Self {
        LineType::Continuous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_round_trip_preserves_alpha() {
        // 半透明颜色在两个转换方向都不丢失alpha
        for argb in [0x00000000u32, 0x80FF8040, 0xFFFFFFFF, 0x01020304] {
            assert_eq!(Color::from_argb(argb).to_argb(), argb);
        }
    }

    #[test]
    fn test_from_argb_channels() {
        let c = Color::from_argb(0x80112233);
        assert_eq!(c.a, 0x80);
        assert_eq!(c.r, 0x11);
        assert_eq!(c.g, 0x22);
        assert_eq!(c.b, 0x33);
    }

    #[test]
    fn test_rgb_string() {
        assert_eq!(Color::RED.to_rgb_string(), "#FF0000");
        assert_eq!(Color::from_argb(0x40102030).to_argb_string(), "#40102030");
    }
}
