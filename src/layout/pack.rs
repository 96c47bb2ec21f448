use log::{debug, trace};

use super::geometry::{Circle, Point, centroid};
use crate::config::LayoutConfig;

/// Numeric knobs shared by packing and sibling separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackOptions {
    pub padding: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl PackOptions {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            padding: config.circle_padding.max(0.0),
            tolerance: config.tolerance.abs(),
            max_iterations: config.max_relax_iterations,
        }
    }
}

impl Default for PackOptions {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

/// Result of packing a set of circles around a common centre.
#[derive(Debug, Clone, PartialEq)]
pub struct Packing {
    /// Centres relative to the enclosing circle, in input order.
    pub positions: Vec<Point>,
    pub enclosing_radius: f64,
}

/// Packs circles of the given radii so that no two are closer than
/// `options.padding` and returns their centres relative to the enclosing
/// circle together with its radius (which keeps `padding` to every child).
///
/// With no circles the enclosing radius is `leaf_radius`.
pub fn pack(radii: &[f64], leaf_radius: f64, options: &PackOptions) -> Packing {
    let padding = options.padding;
    match radii {
        [] => {
            return Packing {
                positions: Vec::new(),
                enclosing_radius: leaf_radius,
            };
        }
        [single] => {
            return Packing {
                positions: vec![Point::ORIGIN],
                enclosing_radius: single + padding,
            };
        }
        _ => {}
    }

    // Inflating every circle by half the padding turns "keep padding apart"
    // into plain tangency.
    let half = padding / 2.0;
    let mut order: Vec<usize> = (0..radii.len()).collect();
    order.sort_by(|&a, &b| radii[b].total_cmp(&radii[a]).then(a.cmp(&b)));

    let mut placed: Vec<Circle> = Vec::with_capacity(radii.len());
    for &idx in &order {
        let r = radii[idx] + half;
        let center = seed_position(&placed, r, options.tolerance);
        placed.push(Circle::new(center, r));
    }

    let iterations = separate(
        &mut placed,
        None,
        0.0,
        options.tolerance,
        options.max_iterations,
    );
    trace!(
        "packed {} circles, relaxation took {iterations} iterations",
        radii.len()
    );

    let center = centroid(placed.iter().map(|c| c.center));
    let mut positions = vec![Point::ORIGIN; radii.len()];
    let mut enclosing = 0.0f64;
    for (slot, &idx) in order.iter().enumerate() {
        let relative = placed[slot].center - center;
        enclosing = enclosing.max(relative.length() + radii[idx]);
        positions[idx] = relative;
    }

    Packing {
        positions,
        enclosing_radius: enclosing + padding,
    }
}

/// Pushes overlapping circles apart along their centre line until every pair
/// keeps `padding` between rims (within `tolerance`) or `max_iterations`
/// sweeps are done. A `pinned` circle never moves; its partner takes the
/// whole push. Returns the number of sweeps that moved something.
pub fn separate(
    circles: &mut [Circle],
    pinned: Option<usize>,
    padding: f64,
    tolerance: f64,
    max_iterations: usize,
) -> usize {
    let n = circles.len();
    for iteration in 0..max_iterations {
        let mut moved = false;
        for i in 0..n {
            for j in (i + 1)..n {
                let required = circles[i].r + circles[j].r + padding;
                let delta = circles[j].center - circles[i].center;
                let overlap = required - delta.length();
                if overlap <= tolerance {
                    continue;
                }
                let dir = delta.normalized_or_default(tolerance);
                match pinned {
                    Some(p) if p == i => circles[j].center += dir * overlap,
                    Some(p) if p == j => circles[i].center -= dir * overlap,
                    _ => {
                        let push = dir * (overlap / 2.0);
                        circles[i].center -= push;
                        circles[j].center += push;
                    }
                }
                moved = true;
            }
        }
        if !moved {
            return iteration;
        }
    }
    if n > 1 {
        debug!("separation of {n} circles stopped at the iteration cap of {max_iterations}");
    }
    max_iterations
}

fn seed_position(placed: &[Circle], r: f64, tolerance: f64) -> Point {
    match placed {
        [] => return Point::ORIGIN,
        [first] => return first.center + Point::new(first.r + r, 0.0),
        _ => {}
    }

    let center = centroid(placed.iter().map(|c| c.center));
    let mut best: Option<(f64, Point)> = None;
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            for candidate in tangent_positions(a, b, r).into_iter().flatten() {
                let probe = Circle::new(candidate, r);
                if placed.iter().any(|c| c.gap(&probe) < -tolerance) {
                    continue;
                }
                let score = candidate.distance(center);
                if best.is_none_or(|(current, _)| score < current) {
                    best = Some((score, candidate));
                }
            }
        }
    }

    if let Some((_, candidate)) = best {
        return candidate;
    }
    let extent = placed
        .iter()
        .map(|c| c.center.distance(center) + c.r)
        .fold(0.0, f64::max);
    center + Point::new(extent + r, 0.0)
}

/// Centres of a circle of radius `r` touching both `a` and `b` from outside.
fn tangent_positions(a: &Circle, b: &Circle, r: f64) -> [Option<Point>; 2] {
    let ra = a.r + r;
    let rb = b.r + r;
    let delta = b.center - a.center;
    let d = delta.length();
    if d <= f64::EPSILON || d > ra + rb || d < (ra - rb).abs() {
        return [None, None];
    }
    let along = (ra * ra - rb * rb + d * d) / (2.0 * d);
    let h = (ra * ra - along * along).max(0.0).sqrt();
    let dir = delta * (1.0 / d);
    let base = a.center + dir * along;
    let perp = dir.perpendicular();
    [Some(base + perp * h), Some(base - perp * h)]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-4;

    fn options() -> PackOptions {
        PackOptions {
            padding: 10.0,
            tolerance: 1e-6,
            max_iterations: 500,
        }
    }

    fn assert_valid(radii: &[f64], packing: &Packing, padding: f64) {
        assert_eq!(packing.positions.len(), radii.len());
        for (i, (&ri, &pi)) in radii.iter().zip(&packing.positions).enumerate() {
            assert!(
                pi.length() + ri <= packing.enclosing_radius - padding + EPS,
                "circle {i} leaves the enclosing circle"
            );
            for (j, (&rj, &pj)) in radii.iter().zip(&packing.positions).enumerate().skip(i + 1) {
                assert!(
                    pi.distance(pj) >= ri + rj + padding - EPS,
                    "circles {i} and {j} overlap"
                );
            }
        }
    }

    #[test]
    fn empty_input_uses_leaf_radius() {
        let packing = pack(&[], 17.0, &options());
        assert!(packing.positions.is_empty());
        assert_eq!(packing.enclosing_radius, 17.0);
    }

    #[test]
    fn single_circle_is_centred_with_padding() {
        let packing = pack(&[12.0], 1.0, &options());
        assert_eq!(packing.positions, vec![Point::ORIGIN]);
        assert_eq!(packing.enclosing_radius, 22.0);
    }

    #[test]
    fn two_circles_touch_with_padding() {
        let radii = [10.0, 20.0];
        let packing = pack(&radii, 0.0, &options());
        let gap = packing.positions[0].distance(packing.positions[1]);
        assert!((gap - 40.0).abs() < EPS);
        assert_valid(&radii, &packing, 10.0);
    }

    #[test]
    fn many_equal_circles_do_not_overlap() {
        let radii = vec![15.0; 24];
        let packing = pack(&radii, 0.0, &options());
        assert_valid(&radii, &packing, 10.0);
    }

    #[test]
    fn mixed_radii_do_not_overlap() {
        let radii = [41.0, 3.0, 18.5, 18.5, 7.0, 60.0, 1.0, 22.0, 9.5, 30.0];
        let packing = pack(&radii, 0.0, &options());
        assert_valid(&radii, &packing, 10.0);
    }

    #[test]
    fn packing_is_deterministic() {
        let radii = [12.0, 30.0, 7.0, 7.0, 19.0, 25.0];
        let first = pack(&radii, 0.0, &options());
        let second = pack(&radii, 0.0, &options());
        assert_eq!(first, second);
    }

    #[test]
    fn packing_is_centred_on_the_centroid() {
        let radii = [5.0, 9.0, 14.0, 3.0];
        let packing = pack(&radii, 0.0, &options());
        let c = centroid(packing.positions.iter().copied());
        assert!(c.length() < EPS);
    }

    #[test]
    fn separate_splits_coincident_circles_along_default_direction() {
        let mut circles = [
            Circle::new(Point::ORIGIN, 5.0),
            Circle::new(Point::ORIGIN, 5.0),
        ];
        separate(&mut circles, None, 2.0, 1e-6, 10);
        assert!((circles[0].center.x + 6.0).abs() < EPS);
        assert!((circles[1].center.x - 6.0).abs() < EPS);
        assert!(circles[0].center.y.abs() < EPS);
    }

    #[test]
    fn separate_never_moves_the_pinned_circle() {
        let mut circles = [
            Circle::new(Point::new(0.0, 0.0), 10.0),
            Circle::new(Point::new(3.0, 4.0), 10.0),
            Circle::new(Point::new(-4.0, 1.0), 6.0),
        ];
        separate(&mut circles, Some(0), 1.0, 1e-6, 200);
        assert_eq!(circles[0].center, Point::ORIGIN);
        for i in 0..circles.len() {
            for j in (i + 1)..circles.len() {
                assert!(circles[i].gap(&circles[j]) >= 1.0 - EPS);
            }
        }
    }

    #[test]
    fn separate_respects_the_iteration_cap() {
        let mut circles = vec![Circle::new(Point::ORIGIN, 10.0); 30];
        let used = separate(&mut circles, None, 0.0, 1e-6, 3);
        assert_eq!(used, 3);
    }
}
