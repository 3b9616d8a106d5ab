/// Normalized Gaussian window for sliding weighted means.
///
/// Conventions:
/// - `weights[x] ∝ exp(-0.5 * (x - len/2)² / sigma²)` for `x in 0..len`; the
///   centre is `len / 2` in real arithmetic, so odd windows peak half a sample
///   right of the middle cell.
/// - `sum(weights) ~= 1`.
#[derive(Debug, Clone)]
pub struct GaussianWindow {
    pub sigma: f32,
    pub weights: Vec<f32>,
}

impl GaussianWindow {
    pub fn new(len: usize, sigma: f32) -> Self {
        assert!(
            sigma.is_finite() && sigma > 0.0,
            "sigma must be > 0 and finite"
        );
        assert!(len > 0, "window must not be empty");

        let center = len as f32 / 2.0;
        let sigma2 = sigma * sigma;
        let mut weights: Vec<f32> = (0..len)
            .map(|x| {
                let d = x as f32 - center;
                (-0.5 * d * d / sigma2).exp()
            })
            .collect();

        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }

        Self { sigma, weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Complex response of a Gaussian-windowed 1D Gabor filter centred on sample
/// `center`: envelope `exp(-(x - center)² / s²)` with `s = π f / 2`, carrier
/// phase `-2π f (x + 1)`.
pub fn gabor_response(signal: &[f32], center: f32, frequency: f32) -> (f32, f32) {
    let s = 0.5 * core::f32::consts::PI * frequency;
    let s2 = s * s;
    let mut re = 0.0f32;
    let mut im = 0.0f32;
    for (x, &v) in signal.iter().enumerate() {
        let d = x as f32 - center;
        let env = (-(d * d) / s2).exp();
        let phase = -2.0 * core::f32::consts::PI * frequency * (x as f32 + 1.0);
        re += v * env * phase.cos();
        im += v * env * phase.sin();
    }
    (re, im)
}

#[cfg(test)]
mod tests {
    use super::{GaussianWindow, gabor_response};

    #[test]
    fn window_is_normalized_and_peaks_near_centre() {
        let g = GaussianWindow::new(25, 5.0);
        let sum: f32 = g.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(g.len(), 25);

        // Centre at 12.5: cells 12 and 13 are equidistant.
        assert!((g.weights[12] - g.weights[13]).abs() < 1e-7);
        assert!(g.weights[12] > g.weights[0]);
        assert!(g.weights[0] < g.weights[24]);
    }

    #[test]
    fn gabor_of_zero_signal_is_zero() {
        let (re, im) = gabor_response(&[0.0; 16], 3.0, 0.75);
        assert_eq!((re, im), (0.0, 0.0));
    }

    #[test]
    fn gabor_envelope_localizes_response() {
        let mut signal = vec![0.0f32; 64];
        signal[40] = 1.0;
        let (re_far, im_far) = gabor_response(&signal, 5.0, 0.75);
        let (re_near, im_near) = gabor_response(&signal, 40.0, 0.75);

        assert!(re_far.abs() + im_far.abs() < 1e-6);
        assert!(re_near.abs() + im_near.abs() > 0.5);
    }
}
