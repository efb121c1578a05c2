//! Perceptual lightness conversion.

use image::RgbImage;

use super::Plane;

/// CIE L* of every pixel, scaled to `0..=255` like an 8-bit Lab image
pub fn lightness(rgb: &RgbImage) -> Plane {
    let data = rgb
        .pixels()
        .map(|px| {
            let y = 0.212671 * srgb_to_linear(px[0])
                + 0.715160 * srgb_to_linear(px[1])
                + 0.072169 * srgb_to_linear(px[2]);
            let l_star = if y > 0.008856 {
                116.0 * y.cbrt() - 16.0
            } else {
                903.3 * y
            };
            l_star * 255.0 / 100.0
        })
        .collect();
    Plane::new(rgb.width() as usize, rgb.height() as usize, data)
}

fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn black_and_white_span_the_range() {
        let image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let plane = lightness(&image);
        assert!(plane.get(0, 0).abs() < 1e-9);
        assert!((plane.get(1, 0) - 255.0).abs() < 0.01);
    }

    #[test]
    fn lightness_is_monotonic_in_gray() {
        let image = RgbImage::from_fn(3, 1, |x, _| {
            let v = [40u8, 120, 200][x as usize];
            Rgb([v, v, v])
        });
        let plane = lightness(&image);
        assert!(plane.get(0, 0) < plane.get(1, 0));
        assert!(plane.get(1, 0) < plane.get(2, 0));
    }
}
