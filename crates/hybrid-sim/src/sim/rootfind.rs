//! A pluggable bracket-based root finder, plus the crate's default
//! implementation: Brent's method.
//!
//! Mirrors `scipy.optimize.brentq`, the Python original's default
//! root-finder, as a trait so callers can substitute their own (§4.D
//! Simulator, §6 External Interfaces).

/// Options controlling when a root search gives up.
#[derive(Debug, Clone, Copy)]
pub struct RootFinderOptions {
    pub xtol: f64,
    pub rtol: f64,
    pub max_iter: usize,
}

impl Default for RootFinderOptions {
    fn default() -> Self {
        RootFinderOptions {
            xtol: 1e-12,
            rtol: 1e-12,
            max_iter: 100,
        }
    }
}

/// A root finder over a bracketing interval `[a, b]` with `f(a)` and `f(b)`
/// of opposite sign.
pub trait RootFinder {
    /// Finds `x` in `[a, b]` with `f(x) == 0` (to within `options`'
    /// tolerances). `f(a)` and `f(b)` must have opposite signs.
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> Result<f64, String>,
        a: f64,
        b: f64,
        options: RootFinderOptions,
    ) -> Result<f64, String>;
}

/// Brent's method: combines bisection, secant and inverse quadratic
/// interpolation, guaranteeing bisection-level worst-case convergence while
/// usually converging superlinearly. This crate's default [`RootFinder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BrentRootFinder;

impl RootFinder for BrentRootFinder {
    fn find_root(
        &self,
        f: &dyn Fn(f64) -> Result<f64, String>,
        a: f64,
        b: f64,
        options: RootFinderOptions,
    ) -> Result<f64, String> {
        let mut a = a;
        let mut b = b;
        let mut fa = f(a)?;
        let mut fb = f(b)?;

        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(format!(
                "root not bracketed: f({a})={fa}, f({b})={fb} have the same sign"
            ));
        }

        if fa.abs() < fb.abs() {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }

        let mut c = a;
        let mut fc = fa;
        let mut mflag = true;
        let mut d = a;

        for _ in 0..options.max_iter {
            if fb == 0.0 || (b - a).abs() < options.xtol + options.rtol * b.abs() {
                return Ok(b);
            }

            let mut s = if fa != fc && fb != fc {
                // Inverse quadratic interpolation.
                a * fb * fc / ((fa - fb) * (fa - fc))
                    + b * fa * fc / ((fb - fa) * (fb - fc))
                    + c * fa * fb / ((fc - fa) * (fc - fb))
            } else {
                // Secant method.
                b - fb * (b - a) / (fb - fa)
            };

            let cond1 = (s < (3.0 * a + b) / 4.0 && s < b) || (s > (3.0 * a + b) / 4.0 && s > b);
            let out_of_bounds = !((b > a && (3.0 * a + b) / 4.0 <= s && s <= b)
                || (b <= a && b <= s && s <= (3.0 * a + b) / 4.0));
            let too_slow = mflag && (s - b).abs() >= (b - c).abs() / 2.0;
            let too_slow2 = !mflag && (s - b).abs() >= (c - d).abs() / 2.0;
            let step_tiny = if mflag {
                (b - c).abs() < options.xtol
            } else {
                (c - d).abs() < options.xtol
            };

            if out_of_bounds || !cond1 || too_slow || too_slow2 || step_tiny {
                s = (a + b) / 2.0;
                mflag = true;
            } else {
                mflag = false;
            }

            let fs = f(s)?;
            d = c;
            c = b;
            fc = fb;

            if fa.signum() == fs.signum() {
                a = s;
                fa = fs;
            } else {
                b = s;
                fb = fs;
            }

            if fa.abs() < fb.abs() {
                std::mem::swap(&mut a, &mut b);
                std::mem::swap(&mut fa, &mut fb);
            }
        }

        let _ = d;
        Err(format!(
            "root finder did not converge within {} iterations",
            options.max_iter
        ))
    }
}
