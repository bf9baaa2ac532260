//! 对象捕捉系统
//!
//! 参考主流 CAD 的设计，在屏幕空间对捕捉候选点进行排序。
//!
//! 支持的捕捉类型：
//! - 圆心 (Center)
//! - 端点 (EndPoint)
//! - 中点 (MidPoint)
//! - 象限点 (Quadrant)
//! - 焦点 (Focus)
//!
//! 查询流程：光标屏幕坐标经视图矩阵的逆变换验证视口有效性，
//! 再把每个实体的候选点投影回屏幕空间按像素距离排序。

use crate::entity::SnapSource;
use crate::math::{transform_point, Matrix4, Point3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// 捕捉类型掩码（位域）
///
/// 组合掩码只能作为查询过滤条件；产出的 [`SnapPoint`] 的 `kind`
/// 永远只携带单个位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapKind {
    bits: u8,
}

impl SnapKind {
    pub const NONE: SnapKind = SnapKind { bits: 0 };
    pub const CENTER: SnapKind = SnapKind { bits: 1 << 0 };
    pub const END_POINT: SnapKind = SnapKind { bits: 1 << 1 };
    pub const MID_POINT: SnapKind = SnapKind { bits: 1 << 2 };
    pub const QUADRANT: SnapKind = SnapKind { bits: 1 << 3 };
    pub const FOCUS: SnapKind = SnapKind { bits: 1 << 4 };
    pub const ALL: SnapKind = SnapKind { bits: 0b0001_1111 };

    pub const fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// 是否包含指定类型
    pub const fn contains(self, other: SnapKind) -> bool {
        self.bits & other.bits == other.bits
    }

    /// 是否恰好是单个捕捉类型
    pub const fn is_single(self) -> bool {
        self.bits != 0 && self.bits & (self.bits - 1) == 0
    }

    /// 排序优先级，数值越小优先级越高
    ///
    /// 固定顺序：Center > EndPoint > MidPoint > Quadrant > Focus。
    /// 等距候选点的取舍必须可复现，因此该顺序不可依赖实体遍历顺序。
    pub const fn priority(self) -> u8 {
        match self.bits {
            b if b == Self::CENTER.bits => 0,
            b if b == Self::END_POINT.bits => 1,
            b if b == Self::MID_POINT.bits => 2,
            b if b == Self::QUADRANT.bits => 3,
            b if b == Self::FOCUS.bits => 4,
            _ => u8::MAX,
        }
    }

    /// 获取捕捉类型的名称
    pub fn name(&self) -> &'static str {
        match self.bits {
            b if b == Self::CENTER.bits => "圆心",
            b if b == Self::END_POINT.bits => "端点",
            b if b == Self::MID_POINT.bits => "中点",
            b if b == Self::QUADRANT.bits => "象限点",
            b if b == Self::FOCUS.bits => "焦点",
            0 => "无",
            _ => "组合",
        }
    }
}

impl std::ops::BitOr for SnapKind {
    type Output = SnapKind;

    fn bitor(self, rhs: SnapKind) -> SnapKind {
        SnapKind {
            bits: self.bits | rhs.bits,
        }
    }
}

impl std::ops::BitOrAssign for SnapKind {
    fn bitor_assign(&mut self, rhs: SnapKind) {
        self.bits |= rhs.bits;
    }
}

impl Default for SnapKind {
    fn default() -> Self {
        Self::ALL
    }
}

/// 捕捉点
///
/// 每次查询临时生成，不做持久化。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    /// 捕捉到的世界坐标
    pub location: Point3,
    /// 捕捉类型（单个位）
    pub kind: SnapKind,
}

impl SnapPoint {
    pub fn new(location: Point3, kind: SnapKind) -> Self {
        debug_assert!(kind.is_single());
        Self { location, kind }
    }
}

/// 捕捉查询错误
#[derive(Error, Debug)]
pub enum SnapError {
    /// 视图矩阵不可逆（退化视口），整个查询失败
    #[error("view transform is singular; viewport is degenerate")]
    DegenerateViewTransform,
}

/// 在实体集合中寻找最佳捕捉点
///
/// # 参数
/// - `sources`: 参与捕捉的实体
/// - `view_transform`: 世界坐标到屏幕坐标的变换
/// - `cursor`: 光标的屏幕坐标（z 分量忽略）
/// - `mask`: 要求的捕捉类型过滤掩码
/// - `pixel_tolerance`: 屏幕像素容差，恰好等于容差的候选点保留
///
/// # 算法
/// 1. 求 `view_transform` 的逆，失败视为退化视口，硬错误返回；
/// 2. 收集每个实体按掩码过滤后的候选点，单个实体产生候选失败时
///    记录日志并跳过，不影响其余实体（部分失败容忍）；
/// 3. 候选点投影到屏幕空间，按与光标的距离过滤、取最小；
/// 4. 等距时按 [`SnapKind::priority`] 的固定顺序裁决。
///
/// 查询是只读、可重入的，相同输入必然给出相同结果。
pub fn resolve_snap(
    sources: &[&dyn SnapSource],
    view_transform: &Matrix4,
    cursor: Point3,
    mask: SnapKind,
    pixel_tolerance: f64,
) -> Result<Option<SnapPoint>, SnapError> {
    // 逆变换既是屏幕到世界映射的前提，也是视口有效性检查
    let inverse = view_transform
        .try_inverse()
        .ok_or(SnapError::DegenerateViewTransform)?;
    let cursor_world = transform_point(&inverse, &cursor);
    if !cursor_world.coords.iter().all(|v| v.is_finite()) {
        return Err(SnapError::DegenerateViewTransform);
    }

    let mut best: Option<(f64, SnapPoint)> = None;

    for source in sources {
        let candidates = match source.snap_points(mask) {
            Ok(candidates) => candidates,
            Err(e) => {
                // 单个实体的失败被隔离，查询继续
                warn!(error = %e, "snap candidate generation failed; skipping entity");
                continue;
            }
        };

        for candidate in candidates {
            debug_assert!(candidate.kind.is_single());
            debug_assert!(mask.contains(candidate.kind));

            let screen = transform_point(view_transform, &candidate.location);
            let dx = screen.x - cursor.x;
            let dy = screen.y - cursor.y;
            let dist = (dx * dx + dy * dy).sqrt();

            if dist > pixel_tolerance {
                continue;
            }

            let replace = match &best {
                None => true,
                Some((best_dist, best_point)) => {
                    dist < *best_dist
                        || (dist == *best_dist
                            && candidate.kind.priority() < best_point.kind.priority())
                }
            };

            if replace {
                best = Some((dist, candidate));
            }
        }
    }

    Ok(best.map(|(_, point)| point))
}
