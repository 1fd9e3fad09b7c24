//! Convex decomposition of clipping polygons.
//!
//! Clipping runs Sutherland–Hodgman against convex pieces only, so arbitrary
//! (possibly concave) clip polygons are first ear-clipped into triangles and
//! the triangles are then greedily merged back into convex polygons.

pub(crate) type Point = [f32; 2];

/// Twice the signed area of `a b c`; positive when counter-clockwise.
#[inline]
pub(crate) fn cross(a: Point, b: Point, c: Point) -> f32 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Twice the signed area of a closed polygon.
pub(crate) fn signed_area(points: &[Point]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p[0] * q[1] - q[0] * p[1]
        })
        .sum()
}

fn contains_inclusive(p: Point, a: Point, b: Point, c: Point) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Reads an interleaved polygon, dropping repeated consecutive points and
/// returning it counter-clockwise. Returns nothing for degenerate input.
pub(crate) fn counter_clockwise_points(flat: &[f32]) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::with_capacity(flat.len() / 2);
    for xy in flat.chunks_exact(2) {
        let p = [xy[0], xy[1]];
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 3 {
        return Vec::new();
    }

    let area = signed_area(&points);
    if area == 0.0 || !area.is_finite() {
        return Vec::new();
    }
    if area < 0.0 {
        points.reverse();
    }
    points
}

/// Ear-clips a counter-clockwise simple polygon into triangles of point indices.
pub(crate) fn triangulate(points: &[Point]) -> Vec<[usize; 3]> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

    while remaining.len() > 3 {
        let n = remaining.len();
        let corner = |i: usize| {
            (
                remaining[(i + n - 1) % n],
                remaining[i],
                remaining[(i + 1) % n],
            )
        };

        let ear = (0..n).find(|&i| {
            let (prev, cur, next) = corner(i);
            let (a, b, c) = (points[prev], points[cur], points[next]);
            if cross(a, b, c) <= 0.0 {
                return false;
            }
            !remaining.iter().any(|&other| {
                other != prev
                    && other != cur
                    && other != next
                    && contains_inclusive(points[other], a, b, c)
            })
        });

        // Self-intersecting or numerically flat input has no clean ear; cut the
        // most convex corner so the loop always terminates.
        let i = ear.unwrap_or_else(|| {
            (0..n)
                .max_by(|&x, &y| {
                    let (px, cx, nx) = corner(x);
                    let (py, cy, ny) = corner(y);
                    cross(points[px], points[cx], points[nx])
                        .total_cmp(&cross(points[py], points[cy], points[ny]))
                })
                .unwrap_or(0)
        });

        let (prev, cur, next) = corner(i);
        triangles.push([prev, cur, next]);
        remaining.remove(i);
    }

    if let [a, b, c] = remaining[..] {
        triangles.push([a, b, c]);
    }
    triangles
}

fn is_convex(points: &[Point], polygon: &[usize]) -> bool {
    let n = polygon.len();
    (0..n).all(|i| {
        let a = points[polygon[i]];
        let b = points[polygon[(i + 1) % n]];
        let c = points[polygon[(i + 2) % n]];
        cross(a, b, c) >= 0.0
    })
}

/// Joins two counter-clockwise polygons across a shared edge if the result
/// stays convex.
fn merge_across_shared_edge(points: &[Point], a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        let (u, v) = (a[i], a[(i + 1) % na]);
        // The shared edge runs the opposite way in the neighbour.
        let Some(j) = (0..nb).find(|&j| b[j] == v && b[(j + 1) % nb] == u) else {
            continue;
        };

        let mut merged = Vec::with_capacity(na + nb - 2);
        merged.extend((0..na).map(|k| a[(i + 1 + k) % na]));
        merged.extend((0..nb - 2).map(|k| b[(j + 2 + k) % nb]));

        let mut sorted = merged.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != merged.len() {
            return None;
        }
        return is_convex(points, &merged).then_some(merged);
    }
    None
}

/// Splits a polygon into convex, counter-clockwise pieces.
pub(crate) fn convex_decompose(flat: &[f32]) -> Vec<Vec<Point>> {
    let points = counter_clockwise_points(flat);
    if points.is_empty() {
        return Vec::new();
    }

    let mut pieces: Vec<Vec<usize>> = triangulate(&points)
        .into_iter()
        .filter(|&[a, b, c]| cross(points[a], points[b], points[c]) > 0.0)
        .map(|t| t.to_vec())
        .collect();

    'merge: loop {
        for a in 0..pieces.len() {
            for b in (a + 1)..pieces.len() {
                if let Some(merged) = merge_across_shared_edge(&points, &pieces[a], &pieces[b]) {
                    pieces[a] = merged;
                    pieces.swap_remove(b);
                    continue 'merge;
                }
            }
        }
        break;
    }

    pieces
        .into_iter()
        .map(|piece| piece.into_iter().map(|i| points[i]).collect())
        .collect()
}
