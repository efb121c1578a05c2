//! Spatial filters: median, Gaussian, Laplacian and histogram equalisation.

use image::{GrayImage, Luma};

use super::{clamp_index, Plane};

/// Median over a `size` x `size` window with replicated borders.
///
/// `size` must be odd.
pub fn median_filter(gray: &GrayImage, size: u32) -> GrayImage {
    let radius = (size / 2) as isize;
    let (width, height) = gray.dimensions();
    let mut window = Vec::with_capacity((size * size) as usize);

    GrayImage::from_fn(width, height, |x, y| {
        window.clear();
        for dy in -radius..=radius {
            let sy = clamp_index(y as isize + dy, height as usize) as u32;
            for dx in -radius..=radius {
                let sx = clamp_index(x as isize + dx, width as usize) as u32;
                window.push(gray.get_pixel(sx, sy)[0]);
            }
        }
        window.sort_unstable();
        Luma([window[window.len() / 2]])
    })
}

/// Gaussian kernel weights; a non-positive sigma is derived from the size
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size / 2) as f64;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Separable Gaussian blur with mirrored borders
pub fn gaussian_blur(plane: &Plane, size: usize, sigma: f64) -> Plane {
    let kernel = gaussian_kernel(size, sigma);
    let radius = (size / 2) as isize;
    let (width, height) = (plane.width(), plane.height());

    let mut horizontal = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = kernel
                .iter()
                .enumerate()
                .map(|(i, w)| w * plane.get_reflected(x as isize + i as isize - radius, y as isize))
                .sum::<f64>();
            horizontal.push(value);
        }
    }
    let horizontal = Plane::new(width, height, horizontal);

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = kernel
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    w * horizontal.get_reflected(x as isize, y as isize + i as isize - radius)
                })
                .sum::<f64>();
            data.push(value);
        }
    }
    Plane::new(width, height, data)
}

/// 4-neighbour Laplacian (`[0 1 0; 1 -4 1; 0 1 0]`) with mirrored borders
pub fn laplacian(plane: &Plane) -> Plane {
    let (width, height) = (plane.width(), plane.height());
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height as isize {
        for x in 0..width as isize {
            let center = plane.get_reflected(x, y);
            let value = plane.get_reflected(x, y - 1)
                + plane.get_reflected(x, y + 1)
                + plane.get_reflected(x - 1, y)
                + plane.get_reflected(x + 1, y)
                - 4.0 * center;
            data.push(value);
        }
    }
    Plane::new(width, height, data)
}

/// Spread the grey-level histogram over the full `0..=255` range.
///
/// An image with a single grey level is returned unchanged.
pub fn equalize_histogram(gray: &GrayImage) -> GrayImage {
    let mut hist = [0usize; 256];
    for px in gray.pixels() {
        hist[px[0] as usize] += 1;
    }

    let total: usize = hist.iter().sum();
    let Some(first) = hist.iter().position(|&c| c > 0) else {
        return gray.clone();
    };
    if hist[first] == total {
        return gray.clone();
    }

    let scale = 255.0 / (total - hist[first]) as f64;
    let mut lut = [0u8; 256];
    let mut running = 0usize;
    for level in first + 1..256 {
        running += hist[level];
        lut[level] = (running as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }

    let mut equalized = gray.clone();
    for px in equalized.pixels_mut() {
        px[0] = lut[px[0] as usize];
    }
    equalized
}
