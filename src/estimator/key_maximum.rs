/// The highest NSDF value between a positive and the following negative
/// zero crossing. One of them marks the pitch period.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct KeyMaximum {
    pub lag_index: usize,
    pub value_at_lag_index: f32,
    /// Interpolated peak value.
    pub value: f32,
    /// Interpolated peak lag, in samples.
    pub lag: f32,
}

impl KeyMaximum {
    pub(crate) fn at(nsdf: &[f32], lag_index: usize) -> Self {
        let value_at_lag_index = nsdf[lag_index];

        // Fit a parabola through the neighbors, clamped at the edges.
        let left = nsdf[lag_index.saturating_sub(1)];
        let right = nsdf[(lag_index + 1).min(nsdf.len() - 1)];

        // ax^2 + bx + c through (-1, left), (0, peak), (1, right)
        let a = 0.5 * (right - 2.0 * value_at_lag_index + left);
        let b = 0.5 * (right - left);
        let c = value_at_lag_index;
        let x_max = if a != 0.0 { -b / (2.0 * a) } else { 0.0 };

        KeyMaximum {
            lag_index,
            value_at_lag_index,
            value: a * x_max * x_max + b * x_max + c,
            lag: (lag_index as f32) + x_max,
        }
    }
}
