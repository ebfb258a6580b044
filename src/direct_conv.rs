//! Direct convolution kernel with a flat argument list.
//!
//! Activations are NHWC (`[batch, h, w, channels]`) and weights HWIO
//! (`[kernel, kernel, in_channels, out_channels]`). Each output is
//! `relu(bias + sum) * scale`. The kernel supports square inputs and kernels
//! only, without padding and with unit stride, so `out_h == in_h - kernel + 1`.

/// Execution context accepted for call-site compatibility with other kernels.
/// The direct kernel keeps no state and ignores it.
#[derive(Debug, Default)]
pub struct KernelContext;

/// Runs the direct convolution over the whole batch.
///
/// # Panics
///
/// Panics if the extents violate the kernel contract or a buffer length does
/// not match the extents. Callers check both before entering a timed loop.
#[allow(clippy::too_many_arguments)]
pub fn conv(
    _ctx: Option<&KernelContext>,
    out_h: usize,
    out_w: usize,
    out_channel: usize,
    kernel_dim: usize,
    in_channel: usize,
    in_h: usize,
    in_w: usize,
    scale: &f32,
    batch_size: usize,
    inp: &[f32],
    output: &mut [f32],
    weights: &[f32],
    bias: &[f32],
) {
    assert!(kernel_dim >= 1 && kernel_dim <= in_h && kernel_dim <= in_w);
    assert_eq!(out_h, in_h - kernel_dim + 1);
    assert_eq!(out_w, in_w - kernel_dim + 1);
    assert_eq!(inp.len(), batch_size * in_h * in_w * in_channel);
    assert_eq!(output.len(), batch_size * out_h * out_w * out_channel);
    assert_eq!(weights.len(), kernel_dim * kernel_dim * in_channel * out_channel);
    assert_eq!(bias.len(), out_channel);

    let scale = *scale;
    let in_image = in_h * in_w * in_channel;
    let out_image = out_h * out_w * out_channel;

    for (image, out) in inp
        .chunks_exact(in_image)
        .zip(output.chunks_exact_mut(out_image))
    {
        for orow in 0..out_h {
            for ocol in 0..out_w {
                let pixel = (orow * out_w + ocol) * out_channel;
                let out_pixel = &mut out[pixel..pixel + out_channel];
                out_pixel.copy_from_slice(bias);

                for krow in 0..kernel_dim {
                    for kcol in 0..kernel_dim {
                        let in_start = ((orow + krow) * in_w + (ocol + kcol)) * in_channel;
                        let in_pixel = &image[in_start..in_start + in_channel];
                        let tap = (krow * kernel_dim + kcol) * in_channel * out_channel;

                        for (kch, &value) in in_pixel.iter().enumerate() {
                            let w_start = tap + kch * out_channel;
                            let w_row = &weights[w_start..w_start + out_channel];
                            for (res, &w) in out_pixel.iter_mut().zip(w_row) {
                                *res = w.mul_add(value, *res);
                            }
                        }
                    }
                }

                for res in out_pixel.iter_mut() {
                    *res = res.max(0.0) * scale;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_channel_valid_convolution() {
        // 3x3 input, 2x2 kernel of ones -> window sums
        let inp = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let weights = [1.0; 4];
        let bias = [0.0];
        let mut output = [0.0f32; 4];
        conv(None, 2, 2, 1, 2, 1, 3, 3, &1.0, 1, &inp, &mut output, &weights, &bias);
        assert_eq!(output, [12.0, 16.0, 24.0, 28.0]);
    }

    #[test]
    fn test_bias_relu_and_scale() {
        // 1x1 kernel, two input channels, two output channels
        let inp = [1.0, 2.0];
        // HWIO: [ic0 -> oc0, oc1], [ic1 -> oc0, oc1]
        let weights = [1.0, -1.0, 1.0, -1.0];
        let bias = [0.5, 0.5];
        let mut output = [0.0f32; 2];
        conv(None, 1, 1, 2, 1, 2, 1, 1, &2.0, 1, &inp, &mut output, &weights, &bias);
        // oc0 = relu(0.5 + 3) * 2, oc1 = relu(0.5 - 3) * 2
        assert_eq!(output, [7.0, 0.0]);
    }

    #[test]
    fn test_batch_is_processed_in_one_call() {
        let inp = [1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0];
        let weights = [1.0; 4];
        let bias = [0.0];
        let mut output = [0.0f32; 2];
        conv(None, 1, 1, 1, 2, 1, 2, 2, &1.0, 2, &inp, &mut output, &weights, &bias);
        assert_eq!(output, [10.0, 100.0]);
    }

    #[test]
    #[should_panic]
    fn test_rejects_padded_extent() {
        let inp = [0.0f32; 9];
        let weights = [0.0f32; 9];
        let bias = [0.0];
        let mut output = [0.0f32; 9];
        // a same-size output would need padding, which the kernel does not support
        conv(None, 3, 3, 1, 3, 1, 3, 3, &1.0, 1, &inp, &mut output, &weights, &bias);
    }
}
