use roots::{find_root_brent, SimpleConvergency};

/// Maximum number of iterations allowed for the bracketed root search
const MAX_ITERATIONS: usize = 100;

/// Find a root of `func` lying between `a` and `b`, to within `xtol`.
///
/// The function must change sign across the bracket; callers are expected to check
/// the bracket ends before calling.
pub(crate) fn bisect(func: impl Fn(f64) -> f64, a: f64, b: f64, xtol: f64) -> anyhow::Result<f64> {
    let mut convergency = SimpleConvergency {
        eps: xtol,
        max_iter: MAX_ITERATIONS,
    };

    // Brent's method converges faster than plain bisection on the smooth parts of the curve
    find_root_brent::<f64, _>(a, b, func, &mut convergency).map_err(|e| anyhow::anyhow!(e))
}
