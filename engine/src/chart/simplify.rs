//! Polyline simplification for dense, x-monotonic chart lines.

use super::geometry::Point;

/// Drops points that sit within `tolerance` pixels of the line joining the
/// last kept point and the next remaining point. Endpoints are always kept.
///
/// Sweeps repeat until one removes nothing, so the result is a fixed point:
/// simplifying it again with the same tolerance returns it unchanged. A
/// tolerance of zero (or less) returns the input unchanged.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if tolerance <= 0.0 || points.len() < 3 {
        return points.to_vec();
    }

    let tolerance_sq = tolerance * tolerance;
    let mut current = points.to_vec();
    // every sweep but the last removes at least one point
    for _ in 0..points.len() {
        let next = sweep(&current, tolerance_sq);
        if next.len() == current.len() {
            break;
        }
        current = next;
    }
    current
}

fn sweep(points: &[Point], tolerance_sq: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut kept = Vec::with_capacity(points.len());
    kept.push(points[0]);

    for window in points.windows(2).skip(1) {
        let (current, next) = (window[0], window[1]);
        let anchor = *kept.last().unwrap_or(&points[0]);
        if perpendicular_distance_sq(current, anchor, next) > tolerance_sq {
            kept.push(current);
        }
    }

    if let Some(last) = points.last() {
        kept.push(*last);
    }
    kept
}

/// Squared distance from `p` to the infinite line through `a` and `b`.
/// Falls back to the point distance when `a` and `b` coincide.
fn perpendicular_distance_sq(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        let (px, py) = (p.x - a.x, p.y - a.y);
        return px * px + py * py;
    }
    let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
    cross * cross / len_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_zero_tolerance_is_identity() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 1.0)]);
        assert_eq!(simplify(&line, 0.0), line);
    }

    #[test]
    fn test_short_lines_untouched() {
        let line = pts(&[(0.0, 0.0), (5.0, 5.0)]);
        assert_eq!(simplify(&line, 10.0), line);
        assert!(simplify(&[], 1.0).is_empty());
    }

    #[test]
    fn test_collinear_points_removed() {
        let line = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        let simplified = simplify(&line, 0.1);
        assert_eq!(simplified, pts(&[(0.0, 0.0), (4.0, 4.0)]));
    }

    #[test]
    fn test_corners_kept() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 5.0), (4.0, 0.0), (5.0, 0.0)]);
        let simplified = simplify(&line, 0.5);
        assert_eq!(
            simplified,
            pts(&[(0.0, 0.0), (2.0, 0.0), (3.0, 5.0), (4.0, 0.0), (5.0, 0.0)])
        );
    }

    /// Small linear congruential generator so the generated lines are reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 33) % bound
        }
    }

    #[test]
    fn test_second_pass_removes_nothing() {
        let line = pts(&[(0.0, 5.0), (1.0, 1.0), (2.0, 1.0), (3.0, 4.0), (4.0, 5.0), (5.0, 6.0), (6.0, 2.0), (7.0, 5.0), (8.0, 1.0)]);
        let once = simplify(&line, 0.8);
        assert_eq!(simplify(&once, 0.8), once);
    }

    #[test]
    fn test_generated_lines_are_fixed_points() {
        let mut rng = Lcg(0x5eed);
        for case in 0..5_000 {
            let len = 3 + rng.next(12) as usize;
            let line: Vec<Point> = (0..len).map(|i| Point::new(i as f64, rng.next(8) as f64)).collect();
            let tolerance = [0.3, 0.8, 1.5, 3.0][case % 4];
            let once = simplify(&line, tolerance);
            let twice = simplify(&once, tolerance);
            assert_eq!(twice, once, "line {:?} at tolerance {}", line, tolerance);
            assert_eq!(once.first(), line.first());
            assert_eq!(once.last(), line.last());
        }
    }

    #[test]
    fn test_endpoints_always_kept() {
        let line = pts(&[(0.0, 3.0), (1.0, 3.01), (2.0, 2.99), (3.0, 3.0)]);
        let simplified = simplify(&line, 1.0);
        assert_eq!(simplified.first(), line.first());
        assert_eq!(simplified.last(), line.last());
        assert_eq!(simplified.len(), 2);
    }
}
