//! Frequency-domain analysis of simulation fields.
//!
//! Sonification-style consumers summarize a downsampled channel as energy
//! in three spatial-frequency bands: large blobs (low), spots and stripes
//! (mid), fine detail (high). The analyzer is read-only; its output is
//! never fed back into the simulation.
//!
//! # Example
//!
//! ```
//! use petri_spectral::analyze_field;
//!
//! let field = vec![0.5; 64 * 64];
//! let bands = analyze_field(&field, 64);
//! // A constant field is pure DC: all energy lands in the low band.
//! assert!(bands.low > 0.99);
//! ```

use std::f32::consts::PI;

/// In-place radix-2 Cooley-Tukey FFT.
///
/// `re` and `im` must have the same power-of-two length.
///
/// # Panics
///
/// Panics if the lengths differ or are not a power of two.
pub fn fft1d(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    assert_eq!(n, im.len(), "re/im length mismatch");
    assert!(n.is_power_of_two(), "fft length must be a power of two");
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
        j ^= bit;
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }

    // Butterflies
    let mut len = 2;
    while len <= n {
        let half = len >> 1;
        let angle = -2.0 * PI / len as f32;
        let (w_re, w_im) = (angle.cos(), angle.sin());

        let mut i = 0;
        while i < n {
            let mut cur_re = 1.0f32;
            let mut cur_im = 0.0f32;
            for k in 0..half {
                let a = i + k;
                let b = a + half;
                let t_re = cur_re * re[b] - cur_im * im[b];
                let t_im = cur_re * im[b] + cur_im * re[b];
                re[b] = re[a] - t_re;
                im[b] = im[a] - t_im;
                re[a] += t_re;
                im[a] += t_im;
                let next_re = cur_re * w_re - cur_im * w_im;
                cur_im = cur_re * w_im + cur_im * w_re;
                cur_re = next_re;
            }
            i += len;
        }
        len <<= 1;
    }
}

/// Spectral energy split by spatial-frequency band, normalized by total
/// power.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergy {
    /// Normalized radial frequency below 0.15.
    pub low: f32,
    /// Normalized radial frequency in [0.15, 0.5).
    pub mid: f32,
    /// Everything above.
    pub high: f32,
    /// Unnormalized total power.
    pub total: f32,
}

/// Runs a 2D FFT over a square field and bins the power spectrum.
///
/// `size` must be a power of two and `data` must hold `size * size`
/// samples.
///
/// # Panics
///
/// Panics if the dimensions are inconsistent or `size` is not a power of
/// two.
pub fn analyze_field(data: &[f32], size: usize) -> BandEnergy {
    assert_eq!(data.len(), size * size, "field must be size * size");
    assert!(size.is_power_of_two(), "size must be a power of two");

    let mut re = data.to_vec();
    let mut im = vec![0.0f32; size * size];

    // Row-wise FFT
    let mut row_re = vec![0.0f32; size];
    let mut row_im = vec![0.0f32; size];
    for y in 0..size {
        let offset = y * size;
        row_re.copy_from_slice(&re[offset..offset + size]);
        row_im.fill(0.0);
        fft1d(&mut row_re, &mut row_im);
        re[offset..offset + size].copy_from_slice(&row_re);
        im[offset..offset + size].copy_from_slice(&row_im);
    }

    // Column-wise FFT
    let mut col_re = vec![0.0f32; size];
    let mut col_im = vec![0.0f32; size];
    for x in 0..size {
        for y in 0..size {
            col_re[y] = re[y * size + x];
            col_im[y] = im[y * size + x];
        }
        fft1d(&mut col_re, &mut col_im);
        for y in 0..size {
            re[y * size + x] = col_re[y];
            im[y * size + x] = col_im[y];
        }
    }

    // Bin power by radial distance from DC
    let half = size / 2;
    let max_freq = half as f32 * std::f32::consts::SQRT_2;
    let mut bands = BandEnergy::default();

    for y in 0..size {
        for x in 0..size {
            let idx = y * size + x;
            let power = re[idx] * re[idx] + im[idx] * im[idx];
            bands.total += power;

            let fx = x.min(size - x) as f32;
            let fy = y.min(size - y) as f32;
            let norm_freq = (fx * fx + fy * fy).sqrt() / max_freq;

            if norm_freq < 0.15 {
                bands.low += power;
            } else if norm_freq < 0.5 {
                bands.mid += power;
            } else {
                bands.high += power;
            }
        }
    }

    if bands.total > 0.0 {
        let norm = 1.0 / bands.total;
        bands.low *= norm;
        bands.mid *= norm;
        bands.high *= norm;
    }

    bands
}
