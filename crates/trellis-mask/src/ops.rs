//! Raster drawing primitives used by [`MaskHistory`](crate::MaskHistory).
//!
//! Every primitive clips to the raster, so callers may pass coordinates that
//! lie partly or wholly outside it.

use crate::raster::Raster;

/// Pixel coordinate; `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Drawing backend for mask edits.
pub trait RasterOps: Send + Sync {
    /// Replace the 4-connected region of the seed's value with `color`.
    fn flood_fill(&self, raster: &mut Raster, seed: Point, color: u8);

    /// Straight line `thickness` pixels wide.
    fn draw_line(&self, raster: &mut Raster, from: Point, to: Point, color: u8, thickness: u32);

    fn draw_circle(&self, raster: &mut Raster, center: Point, radius: u32, color: u8, filled: bool);
}

/// CPU implementation of [`RasterOps`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareRaster;

impl RasterOps for SoftwareRaster {
    fn flood_fill(&self, raster: &mut Raster, seed: Point, color: u8) {
        let (width, height) = raster.dimensions();
        if !raster.contains(seed.x.into(), seed.y.into()) {
            return;
        }
        let (sx, sy) = (seed.x as usize, seed.y as usize);
        let target = match raster.get(sx, sy) {
            Some(v) if v != color => v,
            _ => return,
        };

        // Scanline fill: each popped seed expands to its full horizontal run,
        // then pushes one seed per matching run in the rows above and below.
        let mut stack = vec![(sx, sy)];
        while let Some((x, y)) = stack.pop() {
            let row = raster.row_mut(y);
            if row[x] != target {
                continue;
            }
            let mut left = x;
            while left > 0 && row[left - 1] == target {
                left -= 1;
            }
            let mut right = x;
            while right + 1 < width && row[right + 1] == target {
                right += 1;
            }
            row[left..=right].fill(color);

            let neighbours = [y.checked_sub(1), (y + 1 < height).then_some(y + 1)];
            for ny in neighbours.into_iter().flatten() {
                let row = raster.row_mut(ny);
                let mut in_run = false;
                for (nx, &cell) in row.iter().enumerate().take(right + 1).skip(left) {
                    if cell == target {
                        if !in_run {
                            stack.push((nx, ny));
                            in_run = true;
                        }
                    } else {
                        in_run = false;
                    }
                }
            }
        }
    }

    fn draw_line(&self, raster: &mut Raster, from: Point, to: Point, color: u8, thickness: u32) {
        if thickness <= 1 {
            thin_line(raster, from, to, color);
            return;
        }

        // Capsule: every pixel whose centre lies within thickness/2 of the segment.
        let half = f64::from(thickness) / 2.0;
        let reach = half.ceil() as i64;
        let (x0, y0) = (i64::from(from.x), i64::from(from.y));
        let (x1, y1) = (i64::from(to.x), i64::from(to.y));
        let (w, h) = (raster.width() as i64, raster.height() as i64);

        let min_x = (x0.min(x1) - reach).max(0);
        let max_x = (x0.max(x1) + reach).min(w - 1);
        let min_y = (y0.min(y1) - reach).max(0);
        let max_y = (y0.max(y1) + reach).min(h - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if distance_to_segment(x, y, (x0, y0), (x1, y1)) <= half {
                    raster.put(x, y, color);
                }
            }
        }
    }

    fn draw_circle(&self, raster: &mut Raster, center: Point, radius: u32, color: u8, filled: bool) {
        let (cx, cy) = (i64::from(center.x), i64::from(center.y));
        let r = i64::from(radius);
        // Squared distances exceed i64 for radii past ~3e9.
        let r_sq = i128::from(r) * i128::from(r);
        let inside = |x: i64, y: i64| {
            let (dx, dy) = (i128::from(x - cx), i128::from(y - cy));
            dx * dx + dy * dy <= r_sq
        };

        let (w, h) = (raster.width() as i64, raster.height() as i64);
        for y in (cy - r).max(0)..=(cy + r).min(h - 1) {
            for x in (cx - r).max(0)..=(cx + r).min(w - 1) {
                if !inside(x, y) {
                    continue;
                }
                // Outline: disk pixels with a 4-neighbour outside the disk.
                let edge = filled
                    || !inside(x - 1, y)
                    || !inside(x + 1, y)
                    || !inside(x, y - 1)
                    || !inside(x, y + 1);
                if edge {
                    raster.put(x, y, color);
                }
            }
        }
    }
}

/// One pixel per step along the major axis, visiting only steps that land
/// inside the raster.
fn thin_line(raster: &mut Raster, from: Point, to: Point, color: u8) {
    let (x0, y0) = (i64::from(from.x), i64::from(from.y));
    let (x1, y1) = (i64::from(to.x), i64::from(to.y));
    let (dx, dy) = (x1 - x0, y1 - y0);
    if dx == 0 && dy == 0 {
        raster.put(x0, y0, color);
        return;
    }

    let (w, h) = (raster.width() as i64, raster.height() as i64);
    if dx.abs() >= dy.abs() {
        for x in x0.min(x1).max(0)..=x0.max(x1).min(w - 1) {
            raster.put(x, y0 + round_div(x - x0, dy, dx), color);
        }
    } else {
        for y in y0.min(y1).max(0)..=y0.max(y1).min(h - 1) {
            raster.put(x0 + round_div(y - y0, dx, dy), y, color);
        }
    }
}

/// `a * b / d` rounded to nearest, ties upward. `|a| <= |d|` keeps the
/// result within `|b|`.
fn round_div(a: i64, b: i64, d: i64) -> i64 {
    let (mut n, mut d) = (i128::from(a) * i128::from(b), i128::from(d));
    if d < 0 {
        (n, d) = (-n, -d);
    }
    (2 * n + d).div_euclid(2 * d) as i64
}

fn distance_to_segment(px: i64, py: i64, (x0, y0): (i64, i64), (x1, y1): (i64, i64)) -> f64 {
    let (dx, dy) = ((x1 - x0) as f64, (y1 - y0) as f64);
    let (qx, qy) = ((px - x0) as f64, (py - y0) as f64);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((qx * dx + qy * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (ex, ey) = (qx - t * dx, qy - t * dy);
    (ex * ex + ey * ey).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_from_rows(rows: &[&str]) -> Raster {
        let width = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|row| row.bytes().map(|b| if b == b'#' { 1 } else { 0 }))
            .collect();
        Raster::from_vec(width, rows.len(), data).unwrap()
    }

    fn rows_of(raster: &Raster) -> Vec<String> {
        raster
            .as_bytes()
            .chunks(raster.width())
            .map(|row| row.iter().map(|&v| if v == 0 { '.' } else { '#' }).collect())
            .collect()
    }

    #[test]
    fn test_flood_fill_stays_inside_walls() {
        let mut r = raster_from_rows(&[
            "#####", //
            "#..##", //
            "#.#.#", //
            "#...#", //
            "#####",
        ]);
        SoftwareRaster.flood_fill(&mut r, Point::new(1, 1), 1);
        assert_eq!(r.count_nonzero(), 25);
    }

    #[test]
    fn test_flood_fill_is_four_connected() {
        let mut r = raster_from_rows(&[
            ".#", //
            "#.",
        ]);
        SoftwareRaster.flood_fill(&mut r, Point::new(0, 0), 1);
        // The diagonal cell is not reached.
        assert_eq!(rows_of(&r), vec!["##", "#."]);
    }

    #[test]
    fn test_flood_fill_noops() {
        let mut r = Raster::new(3, 3);
        SoftwareRaster.flood_fill(&mut r, Point::new(-1, 0), 9);
        SoftwareRaster.flood_fill(&mut r, Point::new(0, 3), 9);
        SoftwareRaster.flood_fill(&mut r, Point::new(1, 1), 0);
        assert_eq!(r, Raster::new(3, 3));
    }

    #[test]
    fn test_thin_line_hits_endpoints() {
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_line(&mut r, Point::new(0, 0), Point::new(4, 4), 255, 1);
        for i in 0..5 {
            assert_eq!(r.get(i, i), Some(255));
        }
        assert_eq!(r.count_nonzero(), 5);
    }

    #[test]
    fn test_shallow_line_steps_once_per_column() {
        let mut r = Raster::new(5, 3);
        SoftwareRaster.draw_line(&mut r, Point::new(4, 2), Point::new(0, 0), 1, 1);
        assert_eq!(rows_of(&r), vec!["#....", ".##..", "...##"]);
    }

    #[test]
    fn test_far_thin_line_only_visits_raster() {
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_line(
            &mut r,
            Point::new(-1_000_000_000, 2),
            Point::new(1_000_000_000, 2),
            1,
            1,
        );
        assert_eq!(rows_of(&r), vec![".....", ".....", "#####", ".....", "....."]);

        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_line(&mut r, Point::new(i32::MIN, 2), Point::new(i32::MAX, 2), 1, 1);
        assert_eq!(r.count_nonzero(), 5);

        // Steep: the visible rows sit at the midpoint of the run.
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_line(
            &mut r,
            Point::new(0, -1_000_000_000),
            Point::new(4, 1_000_000_000),
            1,
            1,
        );
        assert_eq!(rows_of(&r), vec!["..#..", "..#..", "..#..", "..#..", "..#.."]);
    }

    #[test]
    fn test_thick_line_band() {
        let mut r = Raster::new(7, 5);
        SoftwareRaster.draw_line(&mut r, Point::new(0, 2), Point::new(6, 2), 1, 3);
        assert_eq!(
            rows_of(&r),
            vec![".......", "#######", "#######", "#######", "......."]
        );
    }

    #[test]
    fn test_line_is_clipped() {
        let mut r = Raster::new(3, 3);
        SoftwareRaster.draw_line(&mut r, Point::new(-10, 1), Point::new(10, 1), 1, 1);
        assert_eq!(rows_of(&r), vec!["...", "###", "..."]);
        SoftwareRaster.draw_line(&mut r, Point::new(-10, -10), Point::new(-5, -5), 1, 9);
        assert_eq!(r.count_nonzero(), 3);
    }

    #[test]
    fn test_filled_circle() {
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_circle(&mut r, Point::new(2, 2), 1, 1, true);
        assert_eq!(rows_of(&r), vec![".....", "..#..", ".###.", "..#..", "....."]);
    }

    #[test]
    fn test_outline_circle_leaves_centre() {
        let mut r = Raster::new(9, 9);
        SoftwareRaster.draw_circle(&mut r, Point::new(4, 4), 3, 1, false);
        assert_eq!(r.get(4, 4), Some(0));
        assert_eq!(r.get(7, 4), Some(1));
        assert_eq!(r.get(4, 1), Some(1));
    }

    #[test]
    fn test_outline_circle_ring() {
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_circle(&mut r, Point::new(2, 2), 2, 1, false);
        assert_eq!(rows_of(&r), vec!["..#..", ".#.#.", "#...#", ".#.#.", "..#.."]);
    }

    #[test]
    fn test_huge_radius_circles() {
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_circle(&mut r, Point::new(2, 2), u32::MAX, 1, true);
        assert_eq!(r.count_nonzero(), 25);

        // The ring lies far outside the raster.
        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_circle(&mut r, Point::new(2, 2), u32::MAX, 1, false);
        assert_eq!(r.count_nonzero(), 0);

        let mut r = Raster::new(5, 5);
        SoftwareRaster.draw_circle(&mut r, Point::new(i32::MIN, i32::MAX), 3_100_000_000, 1, true);
        assert_eq!(r.count_nonzero(), 25);
    }

    #[test]
    fn test_zero_radius_circle_is_one_pixel() {
        let mut r = Raster::new(3, 3);
        SoftwareRaster.draw_circle(&mut r, Point::new(0, 0), 0, 1, true);
        assert_eq!(r.count_nonzero(), 1);
    }
}
