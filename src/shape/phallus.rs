//! The reference shape: two circular clusters left-of-center, a two-column
//! body spanning the desktop, and a terminal half-ellipse arc capping it.
//!
//! All radii and spans derive from the bounds, so the silhouette scales with
//! desktop size rather than icon count. Whatever the raw geometry produces,
//! [`ShapeGenerator::generate`] always returns exactly `count` in-bounds
//! points; a normalize-and-rescale pass corrects any out-of-bounds spill on
//! cramped desktops.

use std::f64::consts::PI;

use crate::error::ArrangeError;
use crate::model::{Bounds, Point};

use super::ShapeGenerator;

const MIN_ICONS: usize = 3;
const MIN_CLUSTER_POINTS: usize = 4;
/// Fraction of each bounds axis kept clear when rescaling spilled layouts.
const RESCALE_MARGIN: f64 = 0.05;

#[derive(Debug, Default)]
pub struct PhallusShape;

impl ShapeGenerator for PhallusShape {
    fn key(&self) -> &str {
        "penis"
    }

    fn generate(&self, count: usize, bounds: Bounds) -> Result<Vec<Point>, ArrangeError> {
        if count < MIN_ICONS {
            return Err(ArrangeError::InvalidArgument(format!(
                "shape 'penis' needs at least {MIN_ICONS} icons, but {count} were provided"
            )));
        }
        Ok(conform(plot(count, bounds), count, bounds))
    }
}

/// Raw geometry pass. May produce points outside cramped bounds; `conform`
/// fixes that up.
fn plot(count: usize, bounds: Bounds) -> Vec<Point> {
    let width = f64::from(bounds.width);
    let center_y = f64::from(bounds.center().y);
    let left_x = width * 0.1;
    let right_x = width * 0.9;

    // Clusters take 20% of the icons or at least 8, but the body always
    // keeps at least 3.
    let mut cluster_total = (2 * MIN_CLUSTER_POINTS).max(count / 5);
    if count.saturating_sub(cluster_total) < 3 {
        cluster_total = count.saturating_sub(3);
    }
    let body_total = count - cluster_total;
    let upper_cluster = cluster_total / 2;
    let lower_cluster = cluster_total - upper_cluster;

    let radius = f64::from(bounds.width.min(bounds.height)) / 12.0;
    let cluster_x = left_x + radius;

    let mut points = Vec::with_capacity(count);
    push_circle(&mut points, upper_cluster, cluster_x, center_y - radius, radius);
    push_circle(&mut points, lower_cluster, cluster_x, center_y + radius, radius);

    // Two-column body between the clusters and the terminal arc.
    let body_start = cluster_x + radius;
    let body_end = right_x - width * 0.08;
    let span = body_end - body_start;
    let column_offset = radius / 2.0;
    let column_total = body_total.saturating_sub(3).max(2);
    let first_column = column_total / 2 + column_total % 2;
    let second_column = column_total / 2;
    push_column(&mut points, first_column, body_start, span, center_y - column_offset);
    push_column(&mut points, second_column, body_start, span, center_y + column_offset);

    // Terminal arc: the right half of an ellipse capping the body.
    let arc_total = body_total.saturating_sub(column_total);
    let arc_width = width * 0.06;
    let arc_height = radius * 1.2;
    for i in 0..arc_total {
        let angle = PI / 2.0 + PI * i as f64 / (arc_total + 1) as f64;
        let x = right_x - arc_width * angle.cos();
        let y = center_y + arc_height * angle.sin();
        points.push(Point::new(x as i32, y as i32));
    }

    points
}

fn push_circle(points: &mut Vec<Point>, n: usize, cx: f64, cy: f64, radius: f64) {
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        let x = cx + radius * angle.cos();
        let y = cy + radius * angle.sin();
        points.push(Point::new(x as i32, y as i32));
    }
}

fn push_column(points: &mut Vec<Point>, n: usize, start_x: f64, span: f64, y: f64) {
    for i in 0..n {
        let x = if n == 1 {
            start_x + span / 2.0
        } else {
            start_x + span * i as f64 / (n - 1) as f64
        };
        points.push(Point::new(x as i32, y as i32));
    }
}

/// Enforce the generator contract: exactly `count` points, all in bounds.
fn conform(raw: Vec<Point>, count: usize, bounds: Bounds) -> Vec<Point> {
    let valid: Vec<Point> = raw
        .iter()
        .copied()
        .filter(|p| bounds.contains(*p))
        .collect();

    let mut result = if valid.len() == raw.len() {
        raw
    } else if valid.is_empty() {
        return diagonal(count, bounds);
    } else {
        rescale(&raw, &valid, bounds)
    };

    if result.is_empty() {
        return diagonal(count, bounds);
    }
    while result.len() < count {
        let last = result[result.len() - 1];
        result.push(last);
    }
    result.truncate(count);
    result
}

/// Scale and translate every raw point so the layout fits a margin-inset
/// region of `bounds`. The reference frame is the bounding box of the points
/// that were already valid, which keeps the silhouette's proportions.
fn rescale(raw: &[Point], valid: &[Point], bounds: Bounds) -> Vec<Point> {
    let min_x = valid.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = valid.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = valid.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = valid.iter().map(|p| p.y).max().unwrap_or(0);

    let span_x = f64::from((max_x - min_x).max(1));
    let span_y = f64::from((max_y - min_y).max(1));
    let usable_x = f64::from(bounds.width) * (1.0 - 2.0 * RESCALE_MARGIN);
    let usable_y = f64::from(bounds.height) * (1.0 - 2.0 * RESCALE_MARGIN);
    let scale = (usable_x / span_x).min(usable_y / span_y);

    let offset_x = f64::from(bounds.width) * RESCALE_MARGIN - f64::from(min_x) * scale;
    let offset_y = f64::from(bounds.height) * RESCALE_MARGIN - f64::from(min_y) * scale;

    raw.iter()
        .map(|p| {
            let x = (f64::from(p.x) * scale + offset_x) as i32;
            let y = (f64::from(p.y) * scale + offset_y) as i32;
            Point::new(clamp_axis(x, bounds.width), clamp_axis(y, bounds.height))
        })
        .collect()
}

/// Last-resort placement when no raw point survived the bounds check.
fn diagonal(count: usize, bounds: Bounds) -> Vec<Point> {
    let step = (bounds.width.min(bounds.height) / (count as i32 + 1)).max(1);
    (0..count)
        .map(|i| {
            let offset = step * (i as i32 + 1);
            Point::new(clamp_axis(offset, bounds.width), clamp_axis(offset, bounds.height))
        })
        .collect()
}

fn clamp_axis(value: i32, extent: i32) -> i32 {
    value.min(extent - 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_count_names_the_minimum() {
        let shape = PhallusShape;
        let err = shape.generate(2, Bounds::new(1920, 1080)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("at least 3"));
        assert!(msg.contains('2'));
    }

    #[test]
    fn typical_desktop_gets_exact_in_bounds_layout() {
        let shape = PhallusShape;
        let bounds = Bounds::new(1920, 1080);
        for count in [3, 8, 17, 40, 120] {
            let layout = shape.generate(count, bounds).expect("generate");
            assert_eq!(layout.len(), count);
            assert!(bounds.contains_all(&layout), "count {count} spilled");
        }
    }

    #[test]
    fn cramped_bounds_still_satisfy_the_contract() {
        let shape = PhallusShape;
        let bounds = Bounds::new(40, 30);
        for count in [3, 10, 25] {
            let layout = shape.generate(count, bounds).expect("generate");
            assert_eq!(layout.len(), count);
            assert!(bounds.contains_all(&layout), "count {count} spilled");
        }
    }

    #[test]
    fn degenerate_bounds_collapse_to_origin() {
        let shape = PhallusShape;
        let bounds = Bounds::new(1, 1);
        let layout = shape.generate(5, bounds).expect("generate");
        assert_eq!(layout.len(), 5);
        assert!(layout.iter().all(|p| *p == Point::new(0, 0)));
    }
}
