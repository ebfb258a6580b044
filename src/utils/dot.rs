//! SIMD-aware dot-product kernels used by the reference GEMM.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DotKernel {
    Scalar,
    #[cfg(target_arch = "x86_64")]
    Avx2Fma,
    #[cfg(target_arch = "x86_64")]
    Avx512Fma,
}

impl DotKernel {
    /// Picks the widest FMA kernel the running CPU supports.
    pub(crate) fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("avx512f") && std::is_x86_feature_detected!("fma") {
                return DotKernel::Avx512Fma;
            }
            if std::is_x86_feature_detected!("avx2") && std::is_x86_feature_detected!("fma") {
                return DotKernel::Avx2Fma;
            }
        }

        DotKernel::Scalar
    }
}

/// Dot product over the common prefix of `a` and `b`.
#[inline(always)]
pub(crate) fn dot(kernel: DotKernel, a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    match kernel {
        DotKernel::Scalar => dot_scalar(&a[..len], &b[..len]),
        // SAFETY: `detect` only returns these variants when the CPU reports the
        // features, and both pointers are valid for `len` reads.
        #[cfg(target_arch = "x86_64")]
        DotKernel::Avx2Fma => unsafe { x86_64::dot_avx2_fma(a.as_ptr(), b.as_ptr(), len) },
        #[cfg(target_arch = "x86_64")]
        DotKernel::Avx512Fma => unsafe { x86_64::dot_avx512_fma(a.as_ptr(), b.as_ptr(), len) },
    }
}

#[inline(always)]
fn dot_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut sums = [0.0f32; 4];

    let mut a_chunks = a.chunks_exact(4);
    let mut b_chunks = b.chunks_exact(4);
    for (ca, cb) in (&mut a_chunks).zip(&mut b_chunks) {
        sums[0] = ca[0].mul_add(cb[0], sums[0]);
        sums[1] = ca[1].mul_add(cb[1], sums[1]);
        sums[2] = ca[2].mul_add(cb[2], sums[2]);
        sums[3] = ca[3].mul_add(cb[3], sums[3]);
    }

    let mut sum = (sums[0] + sums[1]) + (sums[2] + sums[3]);
    for (&av, &bv) in a_chunks.remainder().iter().zip(b_chunks.remainder()) {
        sum = av.mul_add(bv, sum);
    }

    sum
}

#[cfg(target_arch = "x86_64")]
mod x86_64 {
    use core::arch::x86_64::*;

    #[target_feature(enable = "avx2,fma")]
    pub(super) unsafe fn dot_avx2_fma(a: *const f32, b: *const f32, len: usize) -> f32 {
        let mut acc = _mm256_setzero_ps();
        let mut i = 0usize;

        while i + 8 <= len {
            let va = unsafe { _mm256_loadu_ps(a.add(i)) };
            let vb = unsafe { _mm256_loadu_ps(b.add(i)) };
            acc = _mm256_fmadd_ps(va, vb, acc);
            i += 8;
        }

        let mut lanes = [0.0f32; 8];
        unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), acc) };
        let mut sum: f32 = lanes.iter().sum();

        while i < len {
            let (av, bv) = unsafe { (*a.add(i), *b.add(i)) };
            sum = av.mul_add(bv, sum);
            i += 1;
        }

        sum
    }

    #[target_feature(enable = "avx512f,fma")]
    pub(super) unsafe fn dot_avx512_fma(a: *const f32, b: *const f32, len: usize) -> f32 {
        let mut acc = _mm512_setzero_ps();
        let mut i = 0usize;

        while i + 16 <= len {
            let va = unsafe { _mm512_loadu_ps(a.add(i)) };
            let vb = unsafe { _mm512_loadu_ps(b.add(i)) };
            acc = _mm512_fmadd_ps(va, vb, acc);
            i += 16;
        }

        let mut lanes = [0.0f32; 16];
        unsafe { _mm512_storeu_ps(lanes.as_mut_ptr(), acc) };
        let mut sum: f32 = lanes.iter().sum();

        while i < len {
            let (av, bv) = unsafe { (*a.add(i), *b.add(i)) };
            sum = av.mul_add(bv, sum);
            i += 1;
        }

        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f32 = 1e-3;

    fn naive(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_scalar_matches_naive() {
        let a: Vec<f32> = (0..37).map(|i| (i as f32 * 0.3).sin()).collect();
        let b: Vec<f32> = (0..37).map(|i| (i as f32 * 0.7).cos()).collect();
        assert!((dot(DotKernel::Scalar, &a, &b) - naive(&a, &b)).abs() < DELTA);
    }

    #[test]
    fn test_detected_kernel_matches_naive() {
        let kernel = DotKernel::detect();
        for len in [0, 1, 7, 8, 15, 16, 33, 147] {
            let a: Vec<f32> = (0..len).map(|i| (i as f32 * 0.11).sin()).collect();
            let b: Vec<f32> = (0..len).map(|i| (i as f32 * 0.05).cos()).collect();
            assert!((dot(kernel, &a, &b) - naive(&a, &b)).abs() < DELTA);
        }
    }

    #[test]
    fn test_uses_common_prefix() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0];
        assert!((dot(DotKernel::Scalar, &a, &b) - 14.0).abs() < DELTA);
    }
}
