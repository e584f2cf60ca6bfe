//! Structural similarity (SSIM) between two grayscale images
//!
//! Mean SSIM over every fully-contained 7x7 window, with uniform weights,
//! K1 = 0.01, K2 = 0.03, an 8-bit data range and sample covariance. Window sums are
//! read from summed-area tables so the cost is linear in the pixel count.

use crate::error::FrameError;
use image::GrayImage;

/// Side of the square comparison window
pub const WINDOW: u32 = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Summed-area table with a zero row and column prepended
struct Integral {
    stride: usize,
    sums: Vec<f64>,
}

impl Integral {
    fn build(width: u32, height: u32, value: impl Fn(u32, u32) -> f64) -> Self {
        let stride = width as usize + 1;
        let mut sums = vec![0.0; stride * (height as usize + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += value(x, y);
                let idx = (y as usize + 1) * stride + x as usize + 1;
                sums[idx] = sums[idx - stride] + row;
            }
        }
        Self { stride, sums }
    }

    /// Sum over the `size` x `size` window whose top-left corner is (x, y).
    fn window(&self, x: u32, y: u32, size: u32) -> f64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + size as usize, y0 + size as usize);
        let at = |x: usize, y: usize| self.sums[y * self.stride + x];
        at(x1, y1) - at(x0, y1) - at(x1, y0) + at(x0, y0)
    }
}

/// Mean structural similarity of `a` and `b`, in `[-1, 1]` (1 for identical images).
///
/// Images of different shape score 0. Images smaller than the window in either
/// dimension are a geometry error.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> Result<f64, FrameError> {
    if a.dimensions() != b.dimensions() {
        return Ok(0.0);
    }
    let (width, height) = a.dimensions();
    if width < WINDOW || height < WINDOW {
        return Err(FrameError::Geometry(format!(
            "{}x{} image is smaller than the {}x{} similarity window",
            width, height, WINDOW, WINDOW
        )));
    }

    let px = |img: &GrayImage, x: u32, y: u32| img.get_pixel(x, y).0[0] as f64;
    let sum_a = Integral::build(width, height, |x, y| px(a, x, y));
    let sum_b = Integral::build(width, height, |x, y| px(b, x, y));
    let sum_aa = Integral::build(width, height, |x, y| px(a, x, y).powi(2));
    let sum_bb = Integral::build(width, height, |x, y| px(b, x, y).powi(2));
    let sum_ab = Integral::build(width, height, |x, y| px(a, x, y) * px(b, x, y));

    let n = (WINDOW * WINDOW) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut count = 0u64;
    for y in 0..=(height - WINDOW) {
        for x in 0..=(width - WINDOW) {
            let ux = sum_a.window(x, y, WINDOW) / n;
            let uy = sum_b.window(x, y, WINDOW) / n;
            let uxx = sum_aa.window(x, y, WINDOW) / n;
            let uyy = sum_bb.window(x, y, WINDOW) / n;
            let uxy = sum_ab.window(x, y, WINDOW) / n;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            count += 1;
        }
    }

    Ok(total / count as f64)
}
