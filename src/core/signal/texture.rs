//! Rotation-invariant uniform local binary patterns.

use super::Plane;

/// Histogram of uniform LBP codes over every pixel of the plane.
///
/// Each pixel is compared with `points` samples on a circle of `radius`
/// (bilinear interpolation, offsets rounded to five decimals). Samples that
/// fall outside the plane are read from its mirror image, so border pixels
/// count like interior ones. Codes with at most two bit transitions map to
/// their count of set bits (`0..=points`), all others to `points + 1`.
/// Returns normalized bin probabilities, or an empty vector for an empty
/// plane.
pub fn uniform_lbp_histogram(plane: &Plane, points: usize, radius: f64) -> Vec<f64> {
    let (width, height) = (plane.width(), plane.height());
    if points == 0 || plane.is_empty() {
        return Vec::new();
    }

    let round5 = |v: f64| (v * 1e5).round() / 1e5;
    let offsets: Vec<(f64, f64)> = (0..points)
        .map(|p| {
            let angle = 2.0 * std::f64::consts::PI * p as f64 / points as f64;
            (round5(radius * angle.cos()), round5(-radius * angle.sin()))
        })
        .collect();

    let mut counts = vec![0usize; points + 2];
    let mut bits = vec![false; points];
    let mut total = 0usize;

    for y in 0..height {
        for x in 0..width {
            let center = plane.get(x, y);
            for (bit, &(dx, dy)) in bits.iter_mut().zip(&offsets) {
                *bit = bilinear(plane, x as f64 + dx, y as f64 + dy) >= center;
            }

            let transitions = (0..points)
                .filter(|&p| bits[p] != bits[(p + 1) % points])
                .count();
            let code = if transitions <= 2 {
                bits.iter().filter(|&&b| b).count()
            } else {
                points + 1
            };
            counts[code] += 1;
            total += 1;
        }
    }

    counts
        .into_iter()
        .map(|c| c as f64 / total as f64)
        .collect()
}

/// Sum of squared bin probabilities; 1 for a single-code texture
pub fn uniformity(probabilities: &[f64]) -> f64 {
    probabilities.iter().map(|p| p * p).sum()
}

fn bilinear(plane: &Plane, x: f64, y: f64) -> f64 {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as isize, y0 as isize);

    let top = plane.get_reflected(x0, y0) * (1.0 - fx) + plane.get_reflected(x0 + 1, y0) * fx;
    let bottom =
        plane.get_reflected(x0, y0 + 1) * (1.0 - fx) + plane.get_reflected(x0 + 1, y0 + 1) * fx;
    top * (1.0 - fy) + bottom * fy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_plane_has_single_code() {
        let plane = Plane::filled(20, 20, 90.0);
        let hist = uniform_lbp_histogram(&plane, 24, 3.0);
        assert_eq!(hist.len(), 26);
        // Every neighbour equals the centre, so all 24 bits are set
        assert!((hist[24] - 1.0).abs() < 1e-12);
        assert!((uniformity(&hist) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn border_pixels_are_counted() {
        // Bright left column on a dark plane
        let data = (0..36).map(|i| if i % 6 == 0 { 200.0 } else { 50.0 }).collect();
        let plane = Plane::new(6, 6, data);
        let hist = uniform_lbp_histogram(&plane, 8, 1.0);
        assert_eq!(hist.len(), 10);
        assert!((hist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // Column pixels match only straight up and down, mirrored rows included
        assert!(hist[9] >= 6.0 / 36.0 - 1e-12);
    }

    #[test]
    fn single_pixel_plane_is_one_code() {
        let plane = Plane::filled(1, 1, 7.0);
        let hist = uniform_lbp_histogram(&plane, 24, 3.0);
        assert!((uniformity(&hist) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_plane_has_no_histogram() {
        let plane = Plane::new(0, 0, Vec::new());
        assert!(uniform_lbp_histogram(&plane, 24, 3.0).is_empty());
    }

    #[test]
    fn probabilities_sum_to_one() {
        let data = (0..400).map(|i| ((i * 37) % 251) as f64).collect();
        let plane = Plane::new(20, 20, data);
        let hist = uniform_lbp_histogram(&plane, 8, 1.0);
        assert!((hist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
