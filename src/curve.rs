// src/curve.rs

use std::f64::consts::PI;

/// Number of points in every distortion curve.
pub const CURVE_SAMPLES: usize = 44_100;

/// Amount used when the slider text is not a number.
pub const DEFAULT_AMOUNT: f32 = 50.0;

/// Builds the waveshaper transfer curve for a distortion amount.
///
/// Point `i` maps `x = i * 2 / N - 1` to
/// `(3 + k) * x * 20 * PI / (PI + k * |x|)`.
/// `None` (or a non-finite value) falls back to [`DEFAULT_AMOUNT`].
pub fn make_distortion_curve(amount: Option<f32>) -> Vec<f32> {
    let k = match amount {
        Some(a) if a.is_finite() => a as f64,
        _ => DEFAULT_AMOUNT as f64,
    };
    let n = CURVE_SAMPLES as f64;

    (0..CURVE_SAMPLES)
        .map(|i| {
            let x = i as f64 * 2.0 / n - 1.0;
            ((3.0 + k) * x * 20.0 * PI / (PI + k * x.abs())) as f32
        })
        .collect()
}

/// Numeric parsing of slider text. Anything that is not a finite number is `None`.
pub fn parse_amount(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_has_fixed_length() {
        for k in [0.0, 1.0, 50.0, 400.0, 10_000.0, -2.0] {
            assert_eq!(make_distortion_curve(Some(k)).len(), CURVE_SAMPLES);
        }
        assert_eq!(make_distortion_curve(None).len(), CURVE_SAMPLES);
    }

    #[test]
    fn zero_amount_is_linear() {
        let curve = make_distortion_curve(Some(0.0));
        let n = CURVE_SAMPLES as f32;
        assert!((curve[0] + 60.0).abs() < 1e-4);
        let expected_last = 60.0 * (1.0 - 2.0 / n);
        assert!((curve[CURVE_SAMPLES - 1] - expected_last).abs() < 1e-3);
        // x = 0 at the midpoint
        assert!(curve[CURVE_SAMPLES / 2].abs() < 1e-6);
    }

    #[test]
    fn non_numeric_matches_default_amount() {
        let fallback = make_distortion_curve(parse_amount("loud"));
        let fifty = make_distortion_curve(Some(50.0));
        assert_eq!(fallback, fifty);
        assert_eq!(make_distortion_curve(Some(f32::NAN)), fifty);
    }

    #[test]
    fn curve_is_odd_and_monotonic() {
        let curve = make_distortion_curve(Some(400.0));
        for w in curve.windows(2) {
            assert!(w[1] >= w[0]);
        }
        // curve[i] and curve[N - i] sit at x and -x
        let i = 1000;
        assert!((curve[i] + curve[CURVE_SAMPLES - i]).abs() < 1e-3);
    }

    #[test]
    fn parse_amount_accepts_numbers() {
        assert_eq!(parse_amount(" 400 "), Some(400.0));
        assert_eq!(parse_amount("1.5"), Some(1.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }
}
