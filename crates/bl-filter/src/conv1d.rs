/// Centred weighted mean with a clipped window: near the ends only the taps
/// that exist contribute, and the divisor shrinks with them.
///
/// `kernel.len()` must be odd; `kernel[radius]` sits on the output sample.
pub fn smooth_clipped(signal: &[f32], kernel: &[f32], out: &mut [f32]) {
    assert_eq!(out.len(), signal.len(), "out must match signal length");
    assert!(kernel.len() % 2 == 1, "kernel len must be odd");

    let n = signal.len() as isize;
    let radius = (kernel.len() / 2) as isize;

    for (i, out_i) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        let mut wsum = 0.0f32;
        for (k, &kv) in kernel.iter().enumerate() {
            let idx = i as isize + k as isize - radius;
            if idx < 0 || idx >= n {
                continue;
            }
            acc += signal[idx as usize] * kv;
            wsum += kv;
        }
        *out_i = if wsum.abs() > f32::EPSILON { acc / wsum } else { acc };
    }
}

/// Valid-mode correlation: one output per position where the kernel fits
/// entirely, `signal.len() - kernel.len() + 1` samples (none if it never fits).
pub fn correlate_valid(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if kernel.is_empty() || kernel.len() > signal.len() {
        return Vec::new();
    }

    signal
        .windows(kernel.len())
        .map(|w| w.iter().zip(kernel).map(|(s, k)| s * k).sum())
        .collect()
}

/// Picks `count` samples at `floor(k * len / count)`, clamped to the last
/// index. Empty input yields an empty output.
pub fn resample_floor(signal: &[f32], count: usize) -> Vec<f32> {
    if signal.is_empty() {
        return Vec::new();
    }
    let len = signal.len();
    (0..count)
        .map(|k| signal[(k * len / count).min(len - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::conv1d::{correlate_valid, resample_floor, smooth_clipped};

    #[test]
    fn clipped_box_divides_by_existing_taps() {
        let signal = [3.0f32, 6.0, 9.0, 12.0];
        let mut out = vec![0.0f32; signal.len()];
        smooth_clipped(&signal, &[1.0, 1.0, 1.0], &mut out);
        assert_eq!(out, vec![4.5, 6.0, 9.0, 10.5]);
    }

    #[test]
    fn identity_kernel_copies() {
        let signal = [1.0f32, 2.0, 3.0, 4.0];
        let mut out = vec![0.0f32; signal.len()];
        smooth_clipped(&signal, &[1.0], &mut out);
        assert_eq!(&out, &signal);
    }

    #[test]
    fn valid_correlation_length_and_values() {
        let out = correlate_valid(&[1.0, 2.0, 3.0, 4.0], &[1.0, 0.0, -1.0]);
        assert_eq!(out, vec![-2.0, -2.0]);
        assert!(correlate_valid(&[1.0], &[1.0, 1.0]).is_empty());
    }

    #[test]
    fn resample_stretches_and_shrinks() {
        assert_eq!(resample_floor(&[1.0, 2.0], 4), vec![1.0, 1.0, 2.0, 2.0]);
        assert_eq!(resample_floor(&[1.0, 2.0, 3.0, 4.0], 2), vec![1.0, 3.0]);
        assert!(resample_floor(&[], 3).is_empty());
    }
}
