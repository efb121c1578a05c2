//! # Signal Module
//!
//! Numeric kernels shared by the detectors: a floating-point image plane,
//! zero-guarded statistics, spatial filters, spectral transforms, texture
//! descriptors and connected-region labelling.
//!
//! Every statistic here returns 0 instead of NaN for empty input or a zero
//! denominator, so scores computed from them stay well-formed.

pub mod color;
pub mod filters;
pub mod regions;
pub mod texture;
pub mod transform;

use image::GrayImage;

/// Row-major plane of `f64` samples
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    /// Build a plane from samples; `data.len()` must be `width * height`
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Plane filled with one value
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    /// Promote an 8-bit grayscale image
    pub fn from_gray(gray: &GrayImage) -> Self {
        Self::new(
            gray.width() as usize,
            gray.height() as usize,
            gray.as_raw().iter().map(|&v| v as f64).collect(),
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Sample with mirrored borders (`dcb|abcd|cba`)
    #[inline]
    pub fn get_reflected(&self, x: isize, y: isize) -> f64 {
        self.get(
            reflect_index(x, self.width),
            reflect_index(y, self.height),
        )
    }

    /// Rectangular sub-plane; the caller guarantees it lies inside
    pub fn crop(&self, x0: usize, y0: usize, width: usize, height: usize) -> Plane {
        let mut data = Vec::with_capacity(width * height);
        for y in y0..y0 + height {
            let start = y * self.width + x0;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Plane::new(width, height, data)
    }

    /// Element-wise `|self - other|`
    pub fn abs_diff(&self, other: &Plane) -> Plane {
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .collect();
        Plane::new(self.width, self.height, data)
    }

    /// Element-wise `self - other`
    pub fn sub(&self, other: &Plane) -> Plane {
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Plane::new(self.width, self.height, data)
    }

    /// Values of every complete `block` x `block` tile, row by row.
    ///
    /// Partial tiles at the right and bottom edges are skipped.
    pub fn blocks(&self, block: usize) -> Vec<Plane> {
        if block == 0 {
            return Vec::new();
        }
        let mut tiles = Vec::new();
        for by in 0..self.height / block {
            for bx in 0..self.width / block {
                tiles.push(self.crop(bx * block, by * block, block, block));
            }
        }
        tiles
    }
}

/// Mirror an index into `0..len` without repeating the edge sample
#[inline]
pub fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let mut i = i.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as usize
}

/// Clamp an index into `0..len` (edge replication)
#[inline]
pub fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Arithmetic mean, 0 for empty input
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, 0 for empty input
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `numerator / denominator`, or 0 when the denominator is not positive
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && denominator.is_finite() && numerator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}

/// Standard deviation over mean; 0 when the mean is 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    safe_ratio(std_dev(values), mean(values))
}

/// Equal-width histogram over the value range (last bin closed).
///
/// A constant input lands in the middle bin of `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    if values.is_empty() || bins == 0 {
        return counts;
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    for &v in values {
        let index = (((v - lo) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }
    counts
}

/// Indices of bins strictly greater than both neighbours
pub fn local_maxima(counts: &[usize]) -> Vec<usize> {
    if counts.len() < 3 {
        return Vec::new();
    }
    (1..counts.len() - 1)
        .filter(|&i| counts[i] > counts[i - 1] && counts[i] > counts[i + 1])
        .collect()
}
