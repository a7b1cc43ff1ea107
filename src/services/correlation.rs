/// Pearson product-moment correlation coefficient of two paired samples
///
/// Returns a value in [-1, 1]. Slices must have equal length of at least two;
/// the engine only calls this with index-aligned vectors of shared films.
///
/// A zero-variance side carries no signal, so the result is 0 rather than NaN.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "paired samples must have equal length");

    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let (covariance, var_x, var_y) = x[..n].iter().zip(&y[..n]).fold(
        (0.0, 0.0, 0.0),
        |(cov, vx, vy), (xi, yi)| {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            (cov + dx * dy, vx + dx * dx, vy + dy * dy)
        },
    );

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }

    // Rounding can push |r| a hair past 1
    (covariance / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}
