//! Central moments of arrays along chosen axes.
//!
//! All moments are population estimates (divided by `n`, not `n - 1`).

use ndarray::{ArrayBase, ArrayD, ArrayViewD, Axis, Data, Dimension, Zip};
use num_traits::{Float, FromPrimitive};

use crate::error::{Error, Result};

/// Axes to reduce over and whether to keep them in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// Axes to reduce. `None` reduces over every axis.
    pub axes: Option<Vec<usize>>,

    /// Keep reduced axes with length 1.
    pub keepdim: bool,
}

impl Reduction {
    /// Reduce over every axis.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Reduce over the given axes only. An empty list reduces over every axis.
    #[must_use]
    pub fn over<I: Into<Vec<usize>>>(axes: I) -> Self {
        Self {
            axes: Some(axes.into()),
            keepdim: false,
        }
    }

    /// Set whether reduced axes are kept.
    #[must_use]
    pub fn keepdim(mut self, keepdim: bool) -> Self {
        self.keepdim = keepdim;
        self
    }

    /// Validated axes, deduplicated and sorted from last to first. An empty
    /// axis list means every axis, same as `None`.
    fn resolve(&self, ndim: usize) -> Result<Vec<usize>> {
        let mut axes = match &self.axes {
            Some(axes) if !axes.is_empty() => axes.clone(),
            _ => (0..ndim).collect(),
        };
        if let Some(&axis) = axes.iter().find(|&&axis| axis >= ndim) {
            return Err(Error::InvalidParameter {
                name: "axes".to_string(),
                reason: format!("axis {axis} is out of bounds for a {ndim}d array"),
            });
        }
        axes.sort_unstable_by(|a, b| b.cmp(a));
        axes.dedup();
        Ok(axes)
    }
}

/// Mean over `axes` (sorted from last to first).
fn reduce_mean<A>(x: ArrayD<A>, axes: &[usize], keepdim: bool) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
{
    axes.iter().try_fold(x, |acc, &axis| {
        let reduced = acc.mean_axis(Axis(axis)).ok_or_else(|| Error::InvalidParameter {
            name: "axes".to_string(),
            reason: format!("cannot reduce over empty axis {axis}"),
        })?;
        Ok(if keepdim {
            reduced.insert_axis(Axis(axis))
        } else {
            reduced
        })
    })
}

/// Mean over `axes`, refined by the mean of the residuals.
///
/// A slice of identical values comes back as exactly that value, so its
/// variance is exactly 0.
fn refined_mean<A>(x: &ArrayViewD<'_, A>, axes: &[usize], keepdim: bool) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
{
    let rough = reduce_mean(x.to_owned(), axes, true)?;
    let residuals = {
        let rough = broadcast_to(&rough, x.shape(), "mean")?;
        Zip::from(x).and(&rough).map_collect(|&v, &m| v - m)
    };
    let correction = reduce_mean(residuals, axes, true)?;
    let refined = Zip::from(&rough)
        .and(&correction)
        .map_collect(|&m, &c| m + c);

    if keepdim {
        return Ok(refined);
    }
    Ok(axes
        .iter()
        .fold(refined, |m, &axis| m.index_axis_move(Axis(axis), 0)))
}

/// Broadcast a precomputed moment, failing instead of panicking.
fn broadcast_to<'a, A>(
    moment: &'a ArrayD<A>,
    target: &[usize],
    name: &str,
) -> Result<ArrayViewD<'a, A>> {
    moment.broadcast(target).ok_or_else(|| Error::ShapeMismatch {
        expected: format!("{name} broadcastable to {target:?}"),
        actual: format!("{:?}", moment.shape()),
    })
}

/// Mean of `(x - mean)^order` (or of `|x - mean|^order`) over the reduction.
fn central_moment<A>(
    x: &ArrayViewD<'_, A>,
    mean: &ArrayD<A>,
    order: i32,
    absolute: bool,
    reduction: &Reduction,
) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
{
    let axes = reduction.resolve(x.ndim())?;
    let mean = broadcast_to(mean, x.shape(), "mean")?;

    let deviations = Zip::from(x).and(&mean).map_collect(|&v, &m| {
        let d = if absolute { (v - m).abs() } else { v - m };
        d.powi(order)
    });

    reduce_mean(deviations, &axes, reduction.keepdim)
}

/// Mean of `x` over the reduction.
///
/// Compute it with `keepdim` set to pass it back into [`variance`], [`skew`]
/// or [`kurtosis`].
///
/// # Errors
///
/// Returns an error if an axis is out of bounds or empty.
pub fn mean<A, S, D>(x: &ArrayBase<S, D>, reduction: &Reduction) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    let axes = reduction.resolve(x.ndim())?;
    refined_mean(&x.view().into_dyn(), &axes, reduction.keepdim)
}

fn mean_or_compute<A>(
    x: &ArrayViewD<'_, A>,
    mean: Option<&ArrayD<A>>,
    reduction: &Reduction,
) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
{
    match mean {
        Some(mean) => Ok(mean.clone()),
        None => self::mean(x, &reduction.clone().keepdim(true)),
    }
}

/// Sample estimate of `x` *variability*: `mean((x - mean)^2)`.
///
/// # Errors
///
/// Returns an error if an axis is out of bounds or empty, or if `mean` does
/// not broadcast to the shape of `x`.
pub fn variance<A, S, D>(
    x: &ArrayBase<S, D>,
    mean: Option<&ArrayD<A>>,
    reduction: &Reduction,
) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    let x = x.view().into_dyn();
    let mean = mean_or_compute(&x, mean, reduction)?;
    central_moment(&x, &mean, 2, false, reduction)
}

/// Divide `numerator` by `f(var)` element-wise, with `var` broadcast.
fn normalize_by<A, F>(numerator: &ArrayD<A>, var: &ArrayD<A>, f: F) -> Result<ArrayD<A>>
where
    A: Float,
    F: Fn(A) -> A,
{
    let var = broadcast_to(var, numerator.shape(), "variance")?;
    Ok(Zip::from(numerator).and(&var).map_collect(|&n, &v| n / f(v)))
}

/// Sample estimate of `x` *asymmetry* about its mean:
/// `mean((x - mean)^3) / var^1.5`.
///
/// A constant input has zero variance and yields NaN.
///
/// # Errors
///
/// Returns an error if an axis is out of bounds or empty, or if a
/// precomputed moment does not broadcast.
pub fn skew<A, S, D>(
    x: &ArrayBase<S, D>,
    mean: Option<&ArrayD<A>>,
    var: Option<&ArrayD<A>>,
    reduction: &Reduction,
) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    let x = x.view().into_dyn();
    let mean = mean_or_compute(&x, mean, reduction)?;
    let var = match var {
        Some(var) => var.clone(),
        None => variance(&x, Some(&mean), reduction)?,
    };
    let third = central_moment(&x, &mean, 3, false, reduction)?;
    normalize_by(&third, &var, |v| v * v.sqrt())
}

/// Sample estimate of `x` *tailedness* (presence of outliers):
/// `mean(|x - mean|^4) / var^2`.
///
/// The kurtosis of a univariate normal is 3. Smaller than 3 is
/// *platykurtic* (e.g. uniform), greater than 3 *leptokurtic* (e.g.
/// Laplace). A constant input has zero variance and yields NaN.
///
/// # Errors
///
/// Returns an error if an axis is out of bounds or empty, or if a
/// precomputed moment does not broadcast.
pub fn kurtosis<A, S, D>(
    x: &ArrayBase<S, D>,
    mean: Option<&ArrayD<A>>,
    var: Option<&ArrayD<A>>,
    reduction: &Reduction,
) -> Result<ArrayD<A>>
where
    A: Float + FromPrimitive,
    S: Data<Elem = A>,
    D: Dimension,
{
    let x = x.view().into_dyn();
    let mean = mean_or_compute(&x, mean, reduction)?;
    let var = match var {
        Some(var) => var.clone(),
        None => variance(&x, Some(&mean), reduction)?,
    };
    let fourth = central_moment(&x, &mean, 4, true, reduction)?;
    normalize_by(&fourth, &var, |v| v * v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2, Array3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    fn scalar(a: &ArrayD<f64>) -> f64 {
        assert_eq!(a.ndim(), 0);
        a.iter().copied().next().unwrap()
    }

    #[test]
    fn test_moments_of_small_vector() {
        let x = array![1.0, 2.0, 3.0, 4.0];

        assert_abs_diff_eq!(scalar(&variance(&x, None, &Reduction::all()).unwrap()), 1.25);
        assert_abs_diff_eq!(
            scalar(&skew(&x, None, None, &Reduction::all()).unwrap()),
            0.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            scalar(&kurtosis(&x, None, None, &Reduction::all()).unwrap()),
            1.64,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_skew_sign() {
        let x = array![0.0, 0.0, 0.0, 1.0];
        let s = scalar(&skew(&x, None, None, &Reduction::all()).unwrap());

        assert_abs_diff_eq!(s, 2.0 / 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_input() {
        let x = Array2::<f64>::from_elem((3, 4), 0.7);

        let var = variance(&x, None, &Reduction::all()).unwrap();
        assert_eq!(scalar(&var), 0.0);
        assert!(scalar(&skew(&x, None, None, &Reduction::all()).unwrap()).is_nan());
        assert!(scalar(&kurtosis(&x, None, None, &Reduction::all()).unwrap()).is_nan());
    }

    #[test]
    fn test_constant_rows_are_exact() {
        let x = Array2::<f64>::from_shape_fn((4, 9), |(i, _)| 0.1 * (i + 1) as f64);
        let reduction = Reduction::over([1]);

        let m = mean(&x, &reduction).unwrap();
        for (i, &v) in m.iter().enumerate() {
            assert_eq!(v, x[[i, 0]]);
        }
        assert!(variance(&x, None, &reduction).unwrap().iter().all(|&v| v == 0.0));
        assert!(kurtosis(&x, None, None, &reduction).unwrap().iter().all(|v| v.is_nan()));

        let y = Array1::<f32>::from_elem(1000, 0.1);
        assert_eq!(variance(&y, None, &Reduction::all()).unwrap().sum(), 0.0);
        assert!(skew(&y, None, None, &Reduction::all()).unwrap().sum().is_nan());
    }

    #[test]
    fn test_empty_axis_list_reduces_everything() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];

        let empty = variance(&x, None, &Reduction::over(Vec::new())).unwrap();
        assert_eq!(empty, variance(&x, None, &Reduction::all()).unwrap());
        assert_eq!(empty.ndim(), 0);
    }

    #[test]
    fn test_reduce_single_axis() {
        let x = array![[1.0, 2.0, 3.0], [2.0, 2.0, 2.0]];

        let var = variance(&x, None, &Reduction::over([1])).unwrap();
        assert_eq!(var.shape(), &[2]);
        assert_abs_diff_eq!(var[[0]], 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(var[[1]], 0.0);

        let kept = variance(&x, None, &Reduction::over([1]).keepdim(true)).unwrap();
        assert_eq!(kept.shape(), &[2, 1]);
    }

    #[test]
    fn test_reduce_several_axes() {
        let x =
            Array3::<f64>::from_shape_fn((2, 3, 4), |(b, i, j)| (b * 100 + i * 4 + j) as f64);

        let var = variance(&x, None, &Reduction::over([2, 1])).unwrap();
        assert_eq!(var.shape(), &[2]);
        assert_abs_diff_eq!(var[[0]], var[[1]], epsilon = 1e-9);

        let kept = kurtosis(&x, None, None, &Reduction::over([1, 2]).keepdim(true)).unwrap();
        assert_eq!(kept.shape(), &[2, 1, 1]);
    }

    #[test]
    fn test_reuse_precomputed_moments() {
        let x = array![[0.5, 1.5, 4.0], [2.0, -1.0, 3.0]];
        let reduction = Reduction::over([1]);

        let m = mean(&x, &reduction.clone().keepdim(true)).unwrap();
        let v = variance(&x, Some(&m), &reduction).unwrap();
        assert_eq!(v, variance(&x, None, &reduction).unwrap());

        let k = kurtosis(&x, Some(&m), Some(&v), &reduction).unwrap();
        assert_eq!(k, kurtosis(&x, None, None, &reduction).unwrap());
    }

    #[test]
    fn test_f32_input() {
        let x = array![1.0_f32, 2.0, 3.0, 4.0];
        let var = variance(&x, None, &Reduction::all()).unwrap();
        assert_eq!(var.ndim(), 0);
        assert_abs_diff_eq!(var.sum(), 1.25_f32);
    }

    #[test]
    fn test_axis_out_of_bounds() {
        let x = array![[1.0, 2.0]];
        let err = variance(&x, None, &Reduction::over([2])).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_mean_must_broadcast() {
        let x = array![[1.0, 2.0, 3.0]];
        let bad = Array1::<f64>::zeros(2).into_dyn();
        let err = variance(&x, Some(&bad), &Reduction::all()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_axis() {
        let x = Array2::<f64>::zeros((0, 3));
        assert!(variance(&x, None, &Reduction::all()).is_err());
    }

    #[test]
    fn test_normal_kurtosis_converges_to_three() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples: Array1<f64> =
            (0..200_000).map(|_| StandardNormal.sample(&mut rng)).collect();

        let k = scalar(&kurtosis(&samples, None, None, &Reduction::all()).unwrap());
        let s = scalar(&skew(&samples, None, None, &Reduction::all()).unwrap());

        assert_abs_diff_eq!(k, 3.0, epsilon = 0.06);
        assert_abs_diff_eq!(s, 0.0, epsilon = 0.03);
    }
}
