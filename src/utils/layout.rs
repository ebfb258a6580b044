//! Tensor layout conversions between the reference and candidate kernels.
//!
//! The reference primitive works on NCHW activations and OIHW weights, the
//! candidate kernel on NHWC activations and HWIO weights.

/// Reorders an `[n, c, h, w]` tensor into `[n, h, w, c]`.
pub fn nchw_to_nhwc(src: &[f32], n: usize, c: usize, h: usize, w: usize) -> Vec<f32> {
    debug_assert_eq!(src.len(), n * c * h * w);
    let mut dst = vec![0.0f32; src.len()];
    for b in 0..n {
        for ch in 0..c {
            for y in 0..h {
                for x in 0..w {
                    dst[((b * h + y) * w + x) * c + ch] = src[((b * c + ch) * h + y) * w + x];
                }
            }
        }
    }
    dst
}

/// Reorders an `[n, h, w, c]` tensor into `[n, c, h, w]`.
pub fn nhwc_to_nchw(src: &[f32], n: usize, c: usize, h: usize, w: usize) -> Vec<f32> {
    debug_assert_eq!(src.len(), n * c * h * w);
    let mut dst = vec![0.0f32; src.len()];
    for b in 0..n {
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    dst[((b * c + ch) * h + y) * w + x] = src[((b * h + y) * w + x) * c + ch];
                }
            }
        }
    }
    dst
}

/// Reorders `[o, i, kh, kw]` weights into `[kh, kw, i, o]`.
pub fn oihw_to_hwio(src: &[f32], o: usize, i: usize, kh: usize, kw: usize) -> Vec<f32> {
    debug_assert_eq!(src.len(), o * i * kh * kw);
    let mut dst = vec![0.0f32; src.len()];
    for oc in 0..o {
        for ic in 0..i {
            for ky in 0..kh {
                for kx in 0..kw {
                    dst[((ky * kw + kx) * i + ic) * o + oc] =
                        src[((oc * i + ic) * kh + ky) * kw + kx];
                }
            }
        }
    }
    dst
}
