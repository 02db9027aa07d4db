pub struct StatsHelper;

impl StatsHelper {
    /// Arithmetic mean; an empty sequence averages to 0 rather than NaN.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }
}
