//! Separable 2-D spectral transforms.
//!
//! Both transforms run at full resolution in `O(w * h * log(w * h))`:
//! power-of-two lengths use an iterative radix-2 FFT, every other length
//! goes through Bluestein's chirp-z reformulation on a padded radix-2
//! plan. The DCT-II is read off a mirrored FFT of twice the length.
//! Rows and then columns are transformed in parallel.

use rayon::prelude::*;
use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

use super::Plane;

/// Minimal complex number for the transforms
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// `e^(i * angle)`
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    pub fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }

    fn scale(self, factor: f64) -> Self {
        Self::new(self.re * factor, self.im * factor)
    }
}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

enum Strategy {
    /// Forward twiddles `e^(-2*pi*i*j/n)` for `j < n/2`
    Radix2 { twiddles: Vec<Complex> },
    Bluestein {
        inner: Box<FftPlan>,
        /// `e^(-i*pi*j^2/n)` for `j < n`
        chirp: Vec<Complex>,
        /// Forward transform of the conjugate chirp, wrapped to the padded length
        kernel: Vec<Complex>,
    },
}

/// Precomputed forward DFT of one length, reusable across rows
pub struct FftPlan {
    len: usize,
    strategy: Strategy,
}

impl FftPlan {
    pub fn new(len: usize) -> Self {
        if len <= 1 || len.is_power_of_two() {
            let twiddles = (0..len / 2)
                .map(|j| Complex::from_angle(-2.0 * PI * j as f64 / len as f64))
                .collect();
            return Self {
                len,
                strategy: Strategy::Radix2 { twiddles },
            };
        }

        let padded = (2 * len - 1).next_power_of_two();
        let inner = FftPlan::new(padded);
        let modulus = 2 * len as u64;
        let chirp: Vec<Complex> = (0..len as u64)
            .map(|j| Complex::from_angle(-PI * ((j * j) % modulus) as f64 / len as f64))
            .collect();

        let mut kernel = vec![Complex::ZERO; padded];
        kernel[0] = chirp[0].conj();
        for j in 1..len {
            kernel[j] = chirp[j].conj();
            kernel[padded - j] = chirp[j].conj();
        }
        inner.forward(&mut kernel);

        Self {
            len,
            strategy: Strategy::Bluestein {
                inner: Box::new(inner),
                chirp,
                kernel,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// In-place forward DFT; `buffer.len()` must equal the plan length
    pub fn forward(&self, buffer: &mut [Complex]) {
        debug_assert_eq!(buffer.len(), self.len);
        match &self.strategy {
            Strategy::Radix2 { twiddles } => radix2(buffer, twiddles),
            Strategy::Bluestein {
                inner,
                chirp,
                kernel,
            } => {
                let padded = inner.len();
                let mut work = vec![Complex::ZERO; padded];
                for (slot, (&x, &c)) in work.iter_mut().zip(buffer.iter().zip(chirp)) {
                    *slot = x * c;
                }
                inner.forward(&mut work);
                for (w, &k) in work.iter_mut().zip(kernel) {
                    *w = *w * k;
                }
                inner.inverse_unscaled(&mut work);

                let norm = 1.0 / padded as f64;
                for (out, (&w, &c)) in buffer.iter_mut().zip(work.iter().zip(chirp)) {
                    *out = (w * c).scale(norm);
                }
            }
        }
    }

    /// Inverse DFT without the `1/n` factor
    fn inverse_unscaled(&self, buffer: &mut [Complex]) {
        buffer.iter_mut().for_each(|v| *v = v.conj());
        self.forward(buffer);
        buffer.iter_mut().for_each(|v| *v = v.conj());
    }
}

fn radix2(buffer: &mut [Complex], twiddles: &[Complex]) {
    let n = buffer.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            buffer.swap(i, j);
        }
    }

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        let stride = n / size;
        for start in (0..n).step_by(size) {
            for k in 0..half {
                let a = buffer[start + k];
                let b = buffer[start + k + half] * twiddles[k * stride];
                buffer[start + k] = a + b;
                buffer[start + k + half] = a - b;
            }
        }
        size <<= 1;
    }
}

/// Row-major `width x height` buffer transposed to `height x width`
fn transpose<T: Copy + Default + Send + Sync>(data: &[T], width: usize, height: usize) -> Vec<T> {
    let mut out = vec![T::default(); data.len()];
    out.par_chunks_mut(height).enumerate().for_each(|(x, column)| {
        for (y, slot) in column.iter_mut().enumerate() {
            *slot = data[y * width + x];
        }
    });
    out
}

/// Unshifted 2-D DFT of a real plane, row-major with DC at index 0
pub fn fft2d(plane: &Plane) -> Vec<Complex> {
    let (width, height) = (plane.width(), plane.height());
    if plane.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<Complex> = plane.data().iter().map(|&v| Complex::new(v, 0.0)).collect();
    let row_plan = FftPlan::new(width);
    rows.par_chunks_mut(width).for_each(|row| row_plan.forward(row));

    let mut columns = transpose(&rows, width, height);
    let column_plan = FftPlan::new(height);
    columns
        .par_chunks_mut(height)
        .for_each(|column| column_plan.forward(column));

    transpose(&columns, height, width)
}

/// Magnitudes of the unshifted 2-D DFT (DC at index `(0, 0)`)
pub fn dft_magnitude(plane: &Plane) -> Plane {
    let magnitude = fft2d(plane).into_iter().map(Complex::norm).collect();
    Plane::new(plane.width(), plane.height(), magnitude)
}

/// Orthonormal 1-D DCT-II of one length via a mirrored FFT of twice the length
struct DctPlan {
    len: usize,
    fft: FftPlan,
    /// `alpha_k * e^(-i*pi*k/(2n)) / 2`
    weights: Vec<Complex>,
}

impl DctPlan {
    fn new(len: usize) -> Self {
        let weights = (0..len)
            .map(|k| {
                let alpha = if k == 0 {
                    (1.0 / len as f64).sqrt()
                } else {
                    (2.0 / len as f64).sqrt()
                };
                Complex::from_angle(-PI * k as f64 / (2 * len) as f64).scale(alpha / 2.0)
            })
            .collect();
        Self {
            len,
            fft: FftPlan::new(2 * len),
            weights,
        }
    }

    fn apply(&self, values: &mut [f64]) {
        let n = self.len;
        let mut mirrored = vec![Complex::ZERO; 2 * n];
        for (i, &v) in values.iter().enumerate() {
            mirrored[i] = Complex::new(v, 0.0);
            mirrored[2 * n - 1 - i] = Complex::new(v, 0.0);
        }
        self.fft.forward(&mut mirrored);
        for (out, (&y, &w)) in values.iter_mut().zip(mirrored.iter().zip(&self.weights)) {
            *out = (y * w).re;
        }
    }
}

/// Orthonormal 2-D DCT-II (energy preserving)
pub fn dct2(plane: &Plane) -> Plane {
    let (width, height) = (plane.width(), plane.height());
    if plane.is_empty() {
        return Plane::new(width, height, Vec::new());
    }

    let mut rows = plane.data().to_vec();
    let row_plan = DctPlan::new(width);
    rows.par_chunks_mut(width).for_each(|row| row_plan.apply(row));

    let mut columns = transpose(&rows, width, height);
    let column_plan = DctPlan::new(height);
    columns
        .par_chunks_mut(height)
        .for_each(|column| column_plan.apply(column));

    Plane::new(width, height, transpose(&columns, height, width))
}
