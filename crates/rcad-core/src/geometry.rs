//! 几何图元定义
//!
//! 封闭的几何类型集合：点、线段、圆、圆弧、椭圆和多段线。
//! 每种图元负责给出自身的包围盒和捕捉候选点。
//!
//! 角度统一使用弧度，逆时针为正方向；圆和椭圆约定位于
//! 过各自中心、平行于 XY 的平面内。

use crate::math::{BoundingBox3, Point3, Vector3, EPSILON};
use crate::snap::{SnapKind, SnapPoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 几何计算错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// 椭圆长短轴比率非法，无法计算焦点
    #[error("ellipse minor/major ratio {ratio} is degenerate; cannot derive foci")]
    DegenerateEllipse { ratio: f64 },
    /// 长轴长度为零的椭圆
    #[error("ellipse major axis has zero length")]
    ZeroMajorAxis,
}

/// 点图元
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub position: Point3,
}

impl Point {
    pub fn new(position: Point3) -> Self {
        Self { position }
    }
}

/// 线段
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3,
    pub end: Point3,
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// 线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// 中点
    pub fn midpoint(&self) -> Point3 {
        Point3::from((self.start.coords + self.end.coords) / 2.0)
    }
}

/// 圆
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point3,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// 圆上指定角度处的点
    pub fn point_at(&self, angle: f64) -> Point3 {
        Point3::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
            self.center.z,
        )
    }

    /// 四个象限点（0°、90°、180°、270°）
    pub fn quadrants(&self) -> [Point3; 4] {
        [
            self.point_at(0.0),
            self.point_at(std::f64::consts::FRAC_PI_2),
            self.point_at(std::f64::consts::PI),
            self.point_at(std::f64::consts::PI * 1.5),
        ]
    }
}

/// 圆弧
///
/// 从 `start_angle` 逆时针扫到 `end_angle`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point3,
    pub radius: f64,
    /// 起始角（弧度）
    pub start_angle: f64,
    /// 终止角（弧度）
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point3, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 圆弧扫过的角度，归一化到 (0, TAU]
    ///
    /// 起止角相同视为整圆。角度差非有限时圆弧退化，返回 0。
    pub fn sweep(&self) -> f64 {
        let diff = self.end_angle - self.start_angle;
        if !diff.is_finite() {
            return 0.0;
        }
        let sweep = diff.rem_euclid(std::f64::consts::TAU);
        if sweep == 0.0 {
            std::f64::consts::TAU
        } else {
            sweep
        }
    }

    /// 圆弧上指定角度处的点
    pub fn point_at(&self, angle: f64) -> Point3 {
        Point3::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
            self.center.z,
        )
    }

    /// 起点
    pub fn start_point(&self) -> Point3 {
        self.point_at(self.start_angle)
    }

    /// 终点
    pub fn end_point(&self) -> Point3 {
        self.point_at(self.end_angle)
    }

    /// 弧线中点（角度意义上的中点）
    pub fn midpoint(&self) -> Point3 {
        self.point_at(self.start_angle + self.sweep() / 2.0)
    }

    /// 判断角度是否落在圆弧范围内，非有限角度一律视为不在弧上
    pub fn contains_angle(&self, angle: f64) -> bool {
        let offset = angle - self.start_angle;
        if !offset.is_finite() {
            return false;
        }
        offset.rem_euclid(std::f64::consts::TAU) <= self.sweep() + EPSILON
    }
}

/// 椭圆
///
/// 由中心、长半轴向量和短长轴比率定义。短半轴方向取长轴在
/// XY 平面内逆时针旋转 90° 的方向。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point3,
    /// 长半轴向量（长度即长半轴长）
    pub major_axis: Vector3,
    /// 短半轴与长半轴的比率，(0, 1]
    pub ratio: f64,
}

impl Ellipse {
    pub fn new(center: Point3, major_axis: Vector3, ratio: f64) -> Self {
        Self {
            center,
            major_axis,
            ratio,
        }
    }

    /// 短半轴向量
    pub fn minor_axis(&self) -> Vector3 {
        Vector3::new(-self.major_axis.y, self.major_axis.x, self.major_axis.z) * self.ratio
    }

    /// 四个轴端点（长轴两端 + 短轴两端）
    pub fn axis_endpoints(&self) -> [Point3; 4] {
        let minor = self.minor_axis();
        [
            self.center + self.major_axis,
            self.center - self.major_axis,
            self.center + minor,
            self.center - minor,
        ]
    }

    /// 两个焦点
    ///
    /// 焦距 c = a * sqrt(1 - ratio²)。比率超出 (0, 1] 或长轴
    /// 长度为零时焦点无定义，返回错误。
    pub fn foci(&self) -> Result<[Point3; 2], GeometryError> {
        let a = self.major_axis.norm();
        if a < EPSILON {
            return Err(GeometryError::ZeroMajorAxis);
        }
        if !self.ratio.is_finite() || self.ratio <= 0.0 || self.ratio > 1.0 {
            return Err(GeometryError::DegenerateEllipse { ratio: self.ratio });
        }
        let c = a * (1.0 - self.ratio * self.ratio).sqrt();
        let dir = self.major_axis / a;
        Ok([self.center + dir * c, self.center - dir * c])
    }
}

/// 多段线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point3>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(vertices: Vec<Point3>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    /// 顶点对组成的线段序列（闭合时含末尾到起点的一段）
    pub fn segments(&self) -> Vec<Line> {
        let mut segments = Vec::new();
        for pair in self.vertices.windows(2) {
            segments.push(Line::new(pair[0], pair[1]));
        }
        if self.closed && self.vertices.len() > 2 {
            segments.push(Line::new(
                self.vertices[self.vertices.len() - 1],
                self.vertices[0],
            ));
        }
        segments
    }
}

/// 几何图元（封闭集合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    Line(Line),
    Circle(Circle),
    Arc(Arc),
    Ellipse(Ellipse),
    Polyline(Polyline),
}

impl Geometry {
    /// 计算包围盒
    pub fn bounding_box(&self) -> BoundingBox3 {
        match self {
            Geometry::Point(p) => BoundingBox3::new(p.position, p.position),
            Geometry::Line(l) => BoundingBox3::from_points([l.start, l.end]),
            Geometry::Circle(c) => {
                let r = c.radius;
                BoundingBox3::new(
                    Point3::new(c.center.x - r, c.center.y - r, c.center.z),
                    Point3::new(c.center.x + r, c.center.y + r, c.center.z),
                )
            }
            Geometry::Arc(a) => {
                // 端点加上落在弧内的象限极值点
                let mut bbox = BoundingBox3::from_points([a.start_point(), a.end_point()]);
                for quadrant in [
                    0.0,
                    std::f64::consts::FRAC_PI_2,
                    std::f64::consts::PI,
                    std::f64::consts::PI * 1.5,
                ] {
                    if a.contains_angle(quadrant) {
                        bbox.expand_to_include(&a.point_at(quadrant));
                    }
                }
                bbox
            }
            Geometry::Ellipse(e) => BoundingBox3::from_points(e.axis_endpoints()),
            Geometry::Polyline(p) => BoundingBox3::from_points(p.vertices.iter().copied()),
        }
    }

    /// 按掩码生成捕捉候选点
    ///
    /// 各图元的候选点集合：
    /// - 点：1 个端点
    /// - 线段：2 个端点 + 1 个中点
    /// - 圆：圆心 + 4 个象限点
    /// - 圆弧：2 个端点 + 弧中点 + 圆心
    /// - 椭圆：中心 + 4 个轴端点（象限点）+ 2 个焦点
    /// - 多段线：各顶点端点 + 各直线段中点
    ///
    /// 椭圆参数退化时焦点无法计算，返回 [`GeometryError`]，
    /// 由捕捉引擎决定如何隔离。
    pub fn snap_points(&self, mask: SnapKind) -> Result<Vec<SnapPoint>, GeometryError> {
        let mut points = Vec::new();
        match self {
            Geometry::Point(p) => {
                if mask.contains(SnapKind::END_POINT) {
                    points.push(SnapPoint::new(p.position, SnapKind::END_POINT));
                }
            }
            Geometry::Line(l) => {
                if mask.contains(SnapKind::END_POINT) {
                    points.push(SnapPoint::new(l.start, SnapKind::END_POINT));
                    points.push(SnapPoint::new(l.end, SnapKind::END_POINT));
                }
                if mask.contains(SnapKind::MID_POINT) {
                    points.push(SnapPoint::new(l.midpoint(), SnapKind::MID_POINT));
                }
            }
            Geometry::Circle(c) => {
                if mask.contains(SnapKind::CENTER) {
                    points.push(SnapPoint::new(c.center, SnapKind::CENTER));
                }
                if mask.contains(SnapKind::QUADRANT) {
                    for q in c.quadrants() {
                        points.push(SnapPoint::new(q, SnapKind::QUADRANT));
                    }
                }
            }
            Geometry::Arc(a) => {
                if mask.contains(SnapKind::END_POINT) {
                    points.push(SnapPoint::new(a.start_point(), SnapKind::END_POINT));
                    points.push(SnapPoint::new(a.end_point(), SnapKind::END_POINT));
                }
                if mask.contains(SnapKind::MID_POINT) {
                    points.push(SnapPoint::new(a.midpoint(), SnapKind::MID_POINT));
                }
                if mask.contains(SnapKind::CENTER) {
                    points.push(SnapPoint::new(a.center, SnapKind::CENTER));
                }
            }
            Geometry::Ellipse(e) => {
                // 先算焦点：参数非法时即使掩码不含焦点也视为退化实体
                let foci = e.foci()?;
                if mask.contains(SnapKind::CENTER) {
                    points.push(SnapPoint::new(e.center, SnapKind::CENTER));
                }
                if mask.contains(SnapKind::QUADRANT) {
                    for q in e.axis_endpoints() {
                        points.push(SnapPoint::new(q, SnapKind::QUADRANT));
                    }
                }
                if mask.contains(SnapKind::FOCUS) {
                    for f in foci {
                        points.push(SnapPoint::new(f, SnapKind::FOCUS));
                    }
                }
            }
            Geometry::Polyline(p) => {
                if mask.contains(SnapKind::END_POINT) {
                    for v in &p.vertices {
                        points.push(SnapPoint::new(*v, SnapKind::END_POINT));
                    }
                }
                if mask.contains(SnapKind::MID_POINT) {
                    for seg in p.segments() {
                        points.push(SnapPoint::new(seg.midpoint(), SnapKind::MID_POINT));
                    }
                }
            }
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, points_approx_eq};

    #[test]
    fn test_line_midpoint() {
        let line = Line::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 20.0, 4.0));
        assert!(points_approx_eq(
            &line.midpoint(),
            &Point3::new(5.0, 10.0, 2.0)
        ));
        assert!(approx_eq(
            Line::new(Point3::origin(), Point3::new(3.0, 4.0, 0.0)).length(),
            5.0
        ));
    }

    #[test]
    fn test_line_snap_points() {
        let geom = Geometry::Line(Line::new(Point3::origin(), Point3::new(10.0, 0.0, 0.0)));

        let all = geom.snap_points(SnapKind::ALL).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(
            all.iter()
                .filter(|p| p.kind == SnapKind::END_POINT)
                .count(),
            2
        );
        assert_eq!(
            all.iter()
                .filter(|p| p.kind == SnapKind::MID_POINT)
                .count(),
            1
        );

        // 掩码过滤
        let mids = geom.snap_points(SnapKind::MID_POINT).unwrap();
        assert_eq!(mids.len(), 1);
        assert!(points_approx_eq(
            &mids[0].location,
            &Point3::new(5.0, 0.0, 0.0)
        ));

        let none = geom.snap_points(SnapKind::NONE).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_circle_snap_points() {
        let geom = Geometry::Circle(Circle::new(Point3::new(10.0, 10.0, 0.0), 5.0));
        let all = geom.snap_points(SnapKind::ALL).unwrap();

        assert_eq!(all.len(), 5);
        let center: Vec<_> = all
            .iter()
            .filter(|p| p.kind == SnapKind::CENTER)
            .collect();
        assert_eq!(center.len(), 1);
        assert!(points_approx_eq(
            &center[0].location,
            &Point3::new(10.0, 10.0, 0.0)
        ));

        let quadrants: Vec<_> = all
            .iter()
            .filter(|p| p.kind == SnapKind::QUADRANT)
            .collect();
        assert_eq!(quadrants.len(), 4);
        assert!(quadrants
            .iter()
            .any(|p| points_approx_eq(&p.location, &Point3::new(15.0, 10.0, 0.0))));
        assert!(quadrants
            .iter()
            .any(|p| points_approx_eq(&p.location, &Point3::new(10.0, 15.0, 0.0))));
    }

    #[test]
    fn test_arc_snap_points() {
        // 四分之一圆弧：0° 到 90°
        let arc = Arc::new(Point3::origin(), 10.0, 0.0, std::f64::consts::FRAC_PI_2);
        let geom = Geometry::Arc(arc);
        let all = geom.snap_points(SnapKind::ALL).unwrap();

        assert_eq!(all.len(), 4);
        assert!(all
            .iter()
            .any(|p| p.kind == SnapKind::END_POINT
                && points_approx_eq(&p.location, &Point3::new(10.0, 0.0, 0.0))));
        assert!(all
            .iter()
            .any(|p| p.kind == SnapKind::END_POINT
                && points_approx_eq(&p.location, &Point3::new(0.0, 10.0, 0.0))));

        // 弧中点位于 45°
        let expected_mid = Point3::new(
            10.0 * std::f64::consts::FRAC_PI_4.cos(),
            10.0 * std::f64::consts::FRAC_PI_4.sin(),
            0.0,
        );
        assert!(all
            .iter()
            .any(|p| p.kind == SnapKind::MID_POINT
                && points_approx_eq(&p.location, &expected_mid)));
    }

    #[test]
    fn test_arc_sweep_normalization() {
        // 跨零方向的弧：差值为负时归一化到 (0, TAU]
        let arc = Arc::new(Point3::origin(), 1.0, std::f64::consts::FRAC_PI_2, 0.0);
        assert!(approx_eq(arc.sweep(), std::f64::consts::PI * 1.5));

        // 起止角相同视为整圆
        let full = Arc::new(Point3::origin(), 1.0, 1.0, 1.0);
        assert!(approx_eq(full.sweep(), std::f64::consts::TAU));
    }

    #[test]
    fn test_arc_non_finite_angles_are_degenerate() {
        let arc = Arc::new(Point3::origin(), 1.0, 0.0, f64::NEG_INFINITY);
        assert!(approx_eq(arc.sweep(), 0.0));
        assert!(!arc.contains_angle(2.0));
        assert!(!arc.contains_angle(f64::INFINITY));

        let nan = Arc::new(Point3::origin(), 1.0, f64::NAN, 0.0);
        assert!(approx_eq(nan.sweep(), 0.0));
        assert!(!nan.contains_angle(0.0));
    }

    #[test]
    fn test_ellipse_foci() {
        // 长半轴 5 沿 X，比率 0.6 -> 短半轴 3，焦距 4
        let ellipse = Ellipse::new(Point3::origin(), Vector3::new(5.0, 0.0, 0.0), 0.6);
        let foci = ellipse.foci().unwrap();

        assert!(points_approx_eq(&foci[0], &Point3::new(4.0, 0.0, 0.0)));
        assert!(points_approx_eq(&foci[1], &Point3::new(-4.0, 0.0, 0.0)));

        let geom = Geometry::Ellipse(ellipse);
        let focus_points = geom.snap_points(SnapKind::FOCUS).unwrap();
        assert_eq!(focus_points.len(), 2);
    }

    #[test]
    fn test_degenerate_ellipse_is_error() {
        let bad_ratio = Ellipse::new(Point3::origin(), Vector3::new(5.0, 0.0, 0.0), 0.0);
        assert!(matches!(
            bad_ratio.foci(),
            Err(GeometryError::DegenerateEllipse { .. })
        ));

        let zero_axis = Ellipse::new(Point3::origin(), Vector3::zeros(), 0.5);
        assert!(matches!(zero_axis.foci(), Err(GeometryError::ZeroMajorAxis)));

        // 退化椭圆即使只请求圆心也报错
        let geom = Geometry::Ellipse(bad_ratio);
        assert!(geom.snap_points(SnapKind::CENTER).is_err());
    }

    #[test]
    fn test_polyline_snap_points() {
        let poly = Polyline::new(
            vec![
                Point3::origin(),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 10.0, 0.0),
            ],
            false,
        );
        let geom = Geometry::Polyline(poly);
        let all = geom.snap_points(SnapKind::ALL).unwrap();

        // 3 个顶点 + 2 个线段中点
        assert_eq!(all.len(), 5);
        assert!(all
            .iter()
            .any(|p| p.kind == SnapKind::MID_POINT
                && points_approx_eq(&p.location, &Point3::new(5.0, 0.0, 0.0))));
    }

    #[test]
    fn test_closed_polyline_segments() {
        let poly = Polyline::new(
            vec![
                Point3::origin(),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 10.0, 0.0),
            ],
            true,
        );
        assert_eq!(poly.segments().len(), 3);
    }

    #[test]
    fn test_arc_bounding_box_includes_quadrant() {
        // 从 0° 到 180° 的半圆，顶部象限点 (0, r) 决定包围盒上沿
        let geom = Geometry::Arc(Arc::new(Point3::origin(), 10.0, 0.0, std::f64::consts::PI));
        let bbox = geom.bounding_box();

        assert!(approx_eq(bbox.max.y, 10.0));
        assert!(approx_eq(bbox.min.y, 0.0));
        assert!(approx_eq(bbox.min.x, -10.0));
        assert!(approx_eq(bbox.max.x, 10.0));
    }
}
