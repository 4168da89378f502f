// gramian_core/src/utils/spacing.rs

/// `n` evenly spaced values from `start` to `stop`. With `endpoint == false` the interval
/// is half-open and `stop` is excluded.
pub fn linspace(start: f64, stop: f64, n: usize, endpoint: bool) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let divisions = (if endpoint { n - 1 } else { n }) as f64;
            let step = (stop - start) / divisions;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            if endpoint {
                values[n - 1] = stop;
            }
            values
        }
    }
}

/// `n` values evenly spaced in log10 between `10^start` and `10^stop`, both included.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    linspace(start, stop, n, true)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}
