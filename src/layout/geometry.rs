use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Direction used whenever a direction vector degenerates to zero length.
pub const DEFAULT_DIRECTION: Point = Point { x: 1.0, y: 0.0 };

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or [`DEFAULT_DIRECTION`] when the
    /// length is not above `epsilon`.
    pub fn normalized_or_default(self, epsilon: f64) -> Point {
        let len = self.length();
        if len <= epsilon || !len.is_finite() {
            DEFAULT_DIRECTION
        } else {
            Point::new(self.x / len, self.y / len)
        }
    }

    pub fn perpendicular(self) -> Point {
        Point::new(-self.y, self.x)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub r: f64,
}

impl Circle {
    pub fn new(center: Point, r: f64) -> Self {
        Self { center, r }
    }

    /// Signed gap between the two rims; negative when the circles overlap.
    pub fn gap(&self, other: &Circle) -> f64 {
        self.center.distance(other.center) - self.r - other.r
    }
}

/// Radius of the smallest circle around `center` enclosing all `circles`.
pub fn enclosing_radius_about(center: Point, circles: &[Circle]) -> f64 {
    circles
        .iter()
        .map(|c| c.center.distance(center) + c.r)
        .fold(0.0, f64::max)
}

pub fn centroid(points: impl IntoIterator<Item = Point>) -> Point {
    let mut sum = Point::ORIGIN;
    let mut count = 0usize;
    for p in points {
        sum += p;
        count += 1;
    }
    if count == 0 {
        Point::ORIGIN
    } else {
        sum * (1.0 / count as f64)
    }
}

/// Clamp `candidate` (relative to the container centre) so that a circle of
/// radius `r` centred there stays inside a container of radius `outer`.
/// Returns `None` when no clamping is needed.
pub fn clamp_inside(candidate: Point, r: f64, outer: f64, tolerance: f64) -> Option<Point> {
    let dist = candidate.length();
    if dist + r <= outer + tolerance {
        return None;
    }
    let target = (outer - r).max(0.0);
    Some(candidate.normalized_or_default(tolerance) * target)
}
