//! Copy-move forgery detection.
//!
//! Works by:
//! 1. Finding Harris corners on a two-octave grayscale pyramid
//! 2. Orienting each corner by its intensity centroid
//! 3. Sampling a rotated polar grid around it into a normalized descriptor
//! 4. Matching the descriptor set against itself (k = 2 nearest neighbours)
//! 5. Keeping pairs that pass the ratio test and lie far enough apart
//!
//! A region pasted elsewhere in the same image produces a cloud of
//! near-zero-distance matches with a common displacement.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::f64::consts::PI;
use tracing::debug;

use super::traits::{DetectionInput, Detector};
use crate::core::config::ThresholdConfig;
use crate::core::findings::{Finding, Technique};
use crate::core::signal::filters::gaussian_blur;
use crate::core::signal::Plane;
use crate::error::DetectorError;

/// Radius (octave pixels) of the descriptor patch
const PATCH_RADIUS: usize = 8;
/// Concentric sampling rings per descriptor
const RINGS: usize = 4;
/// Samples per ring
const RAYS: usize = 16;
/// Harris sensitivity constant
const HARRIS_K: f64 = 0.04;
/// Corners must reach this fraction of the strongest response
const RELATIVE_RESPONSE: f64 = 0.01;
/// Strongest corners kept per octave, finest first
const OCTAVE_BUDGET: [usize; 2] = [1000, 500];

/// Oriented corner in full-resolution coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub response: f64,
    /// Orientation in radians
    pub angle: f64,
    pub octave: usize,
}

/// Copy-move forgery detector
pub struct CopyMoveDetector;

impl CopyMoveDetector {
    /// Keypoints with their descriptors, finest octave first
    pub fn features(gray: &Plane) -> (Vec<Keypoint>, Vec<Vec<f64>>) {
        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();
        let mut level = gray.clone();

        for (octave, &budget) in OCTAVE_BUDGET.iter().enumerate() {
            if octave > 0 {
                level = half_size(&level);
            }
            if level.width() <= 2 * margin() || level.height() <= 2 * margin() {
                break;
            }

            let smoothed = gaussian_blur(&level, 3, 0.0);
            let scale = (1usize << octave) as f64;
            for (x, y, response) in harris_corners(&smoothed, budget) {
                let angle = centroid_angle(&smoothed, x, y);
                descriptors.push(describe(&smoothed, x, y, angle));
                keypoints.push(Keypoint {
                    x: x as f64 * scale,
                    y: y as f64 * scale,
                    response,
                    angle,
                    octave,
                });
            }
        }

        (keypoints, descriptors)
    }

    /// Pairs passing the ratio test whose keypoints are far enough apart.
    ///
    /// Counted per query keypoint, so a duplicated corner contributes from
    /// both of its copies.
    pub fn count_matches(
        keypoints: &[Keypoint],
        descriptors: &[Vec<f64>],
        ratio: f64,
        min_distance: f64,
    ) -> usize {
        (0..descriptors.len())
            .into_par_iter()
            .filter(|&i| {
                let Some((best, d1, d2)) = two_nearest(descriptors, i) else {
                    return false;
                };
                if d1 >= ratio * d2 {
                    return false;
                }
                let (a, b) = (&keypoints[i], &keypoints[best]);
                (a.x - b.x).hypot(a.y - b.y) > min_distance
            })
            .count()
    }
}

impl Detector for CopyMoveDetector {
    fn technique(&self) -> Technique {
        Technique::CopyMove
    }

    fn detect(
        &self,
        input: &DetectionInput<'_>,
        thresholds: &ThresholdConfig,
    ) -> Result<Finding, DetectorError> {
        let gray = Plane::from_gray(&input.image.luma());
        let (keypoints, descriptors) = Self::features(&gray);

        if keypoints.len() < thresholds.copy_move_min_keypoints {
            debug!(keypoints = keypoints.len(), "copy-move: insufficient features");
            return Ok(Finding::clear(
                Technique::CopyMove,
                format!(
                    "Insufficient features for copy-move detection ({} keypoints)",
                    keypoints.len()
                ),
            ));
        }

        let matches = Self::count_matches(
            &keypoints,
            &descriptors,
            thresholds.copy_move_ratio,
            thresholds.copy_move_min_distance,
        );
        debug!(keypoints = keypoints.len(), matches, "copy-move matching");

        if matches > thresholds.copy_move_min_matches {
            Ok(Finding::triggered(
                Technique::CopyMove,
                matches as f64 / 100.0,
                format!(
                    "Detected {} suspicious feature matches suggesting copy-move forgery",
                    matches
                ),
            ))
        } else {
            Ok(Finding::clear(
                Technique::CopyMove,
                format!("No copy-move forgery detected ({} matches)", matches),
            ))
        }
    }
}

/// Keypoints need the whole rotated patch plus one sample for interpolation
fn margin() -> usize {
    PATCH_RADIUS + 2
}

/// 2x2 box downsample
fn half_size(plane: &Plane) -> Plane {
    let (width, height) = (plane.width() / 2, plane.height() / 2);
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let sum = plane.get(2 * x, 2 * y)
                + plane.get(2 * x + 1, 2 * y)
                + plane.get(2 * x, 2 * y + 1)
                + plane.get(2 * x + 1, 2 * y + 1);
            data.push(sum / 4.0);
        }
    }
    Plane::new(width, height, data)
}

/// Harris corners after 3x3 non-maximum suppression, strongest first
fn harris_corners(plane: &Plane, budget: usize) -> Vec<(usize, usize, f64)> {
    let (width, height) = (plane.width(), plane.height());
    let mut xx = Vec::with_capacity(width * height);
    let mut yy = Vec::with_capacity(width * height);
    let mut xy = Vec::with_capacity(width * height);

    for y in 0..height as isize {
        for x in 0..width as isize {
            let p = |dx: isize, dy: isize| plane.get_reflected(x + dx, y + dy);
            let gx = p(1, -1) + 2.0 * p(1, 0) + p(1, 1) - p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1);
            let gy = p(-1, 1) + 2.0 * p(0, 1) + p(1, 1) - p(-1, -1) - 2.0 * p(0, -1) - p(1, -1);
            xx.push(gx * gx);
            yy.push(gy * gy);
            xy.push(gx * gy);
        }
    }

    let xx = gaussian_blur(&Plane::new(width, height, xx), 5, 1.0);
    let yy = gaussian_blur(&Plane::new(width, height, yy), 5, 1.0);
    let xy = gaussian_blur(&Plane::new(width, height, xy), 5, 1.0);

    let response: Vec<f64> = (0..width * height)
        .map(|i| {
            let (a, b, c) = (xx.data()[i], yy.data()[i], xy.data()[i]);
            a * b - c * c - HARRIS_K * (a + b) * (a + b)
        })
        .collect();
    let response = Plane::new(width, height, response);

    let strongest = response.data().iter().cloned().fold(0.0, f64::max);
    if strongest <= 0.0 {
        return Vec::new();
    }
    let floor = strongest * RELATIVE_RESPONSE;

    let m = margin();
    let mut corners = Vec::new();
    for y in m..height - m {
        for x in m..width - m {
            let r = response.get(x, y);
            if r <= floor || !is_local_peak(&response, x, y) {
                continue;
            }
            corners.push((x, y, r));
        }
    }

    // Stable: equal responses keep scan order
    corners.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
    corners.truncate(budget);
    corners
}

/// Strict maximum over earlier neighbours, non-strict over later ones,
/// so a plateau yields exactly one peak
fn is_local_peak(response: &Plane, x: usize, y: usize) -> bool {
    let r = response.get(x, y);
    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let neighbour = response.get((x as isize + dx) as usize, (y as isize + dy) as usize);
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if (earlier && neighbour >= r) || (!earlier && neighbour > r) {
                return false;
            }
        }
    }
    true
}

/// Orientation of the intensity centroid over the circular patch
fn centroid_angle(plane: &Plane, x: usize, y: usize) -> f64 {
    let radius = PATCH_RADIUS as isize;
    let (mut m10, mut m01) = (0.0, 0.0);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let v = plane.get((x as isize + dx) as usize, (y as isize + dy) as usize);
            m10 += dx as f64 * v;
            m01 += dy as f64 * v;
        }
    }
    m01.atan2(m10)
}

/// Zero-mean, unit-length samples of a polar grid rotated by `angle`
fn describe(plane: &Plane, x: usize, y: usize, angle: f64) -> Vec<f64> {
    let mut samples = Vec::with_capacity(RINGS * RAYS);
    for ring in 1..=RINGS {
        let radius = (ring * PATCH_RADIUS) as f64 / RINGS as f64;
        for ray in 0..RAYS {
            let theta = angle + 2.0 * PI * ray as f64 / RAYS as f64;
            samples.push(bilinear(
                plane,
                x as f64 + radius * theta.cos(),
                y as f64 + radius * theta.sin(),
            ));
        }
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    samples.iter_mut().for_each(|v| *v -= mean);
    let norm = samples.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 1e-9 {
        samples.iter_mut().for_each(|v| *v /= norm);
    }
    samples
}

fn bilinear(plane: &Plane, x: f64, y: f64) -> f64 {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as usize, y0 as usize);
    let top = plane.get(x0, y0) * (1.0 - fx) + plane.get(x0 + 1, y0) * fx;
    let bottom = plane.get(x0, y0 + 1) * (1.0 - fx) + plane.get(x0 + 1, y0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Nearest and second-nearest descriptors to `query`, excluding itself.
///
/// Returns `(best_index, best_distance, second_distance)`.
fn two_nearest(descriptors: &[Vec<f64>], query: usize) -> Option<(usize, f64, f64)> {
    let target = &descriptors[query];
    let mut best: Option<(usize, f64)> = None;
    let mut second = f64::INFINITY;

    for (j, candidate) in descriptors.iter().enumerate() {
        if j == query {
            continue;
        }
        let d: f64 = target
            .iter()
            .zip(candidate)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        match best {
            Some((_, best_d)) if d >= best_d => second = second.min(d),
            Some((_, best_d)) => {
                second = best_d;
                best = Some((j, d));
            }
            None => best = Some((j, d)),
        }
    }

    let (index, d1) = best?;
    if !second.is_finite() {
        return None;
    }
    Some((index, d1.sqrt(), second.sqrt()))
}
