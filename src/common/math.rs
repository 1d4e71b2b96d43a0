//! Rolling-window math over price series.
//!
//! Every series function returns one slot per input value. A slot is `None`
//! while its window is not yet full, so callers can line results up with the
//! candles they came from.

/// Rolling simple moving average.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Rolling sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period < 2 || values.len() < period {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        out[i] = Some(variance.sqrt());
    }
    out
}

/// Exponential moving average series seeded with the first value.
///
/// `ema[0] = values[0]`, `ema[t] = alpha * values[t] + (1 - alpha) * ema[t - 1]`
/// with `alpha = 2 / (span + 1)`. Defined from the first value onward.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return out;
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = first;
    out.push(prev);
    for &value in &values[1..] {
        prev = alpha * value + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Percent change against the previous value, times 100.
///
/// A zero previous value yields 0.0 so the series stays finite.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        let prev = values[i - 1];
        out[i] = Some(if prev == 0.0 {
            0.0
        } else {
            (values[i] - prev) / prev * 100.0
        });
    }
    out
}

/// First difference, `None` at index 0.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        out[i] = Some(values[i] - values[i - 1]);
    }
    out
}
