//! Per-point kernels over batched arrays
//!
//! Every batched operation in the crate computes each element independently.
//! With the `parallel` feature the kernels are spread over the rayon pool.

use crate::types::{SarError, SarResult};
use ndarray::{ArrayD, ArrayViewD, IxDyn, Zip};

/// Apply an infallible kernel to every element
pub fn map_batch<T, R, F>(input: &ArrayD<T>, f: F) -> ArrayD<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        Zip::from(input).par_map_collect(|x| f(x))
    }

    #[cfg(not(feature = "parallel"))]
    {
        Zip::from(input).map_collect(|x| f(x))
    }
}

/// Apply an infallible kernel element-wise over two arrays of the same shape
pub fn map_batch2<A, B, R, F>(a: &ArrayD<A>, b: &ArrayViewD<B>, f: F) -> SarResult<ArrayD<R>>
where
    A: Sync,
    B: Sync,
    R: Send,
    F: Fn(&A, &B) -> R + Sync + Send,
{
    if a.shape() != b.shape() {
        return Err(SarError::InvalidShape(format!(
            "Batch shapes differ: {:?} vs {:?}",
            a.shape(),
            b.shape()
        )));
    }

    #[cfg(feature = "parallel")]
    {
        Ok(Zip::from(a).and(b).par_map_collect(|x, y| f(x, y)))
    }

    #[cfg(not(feature = "parallel"))]
    {
        Ok(Zip::from(a).and(b).map_collect(|x, y| f(x, y)))
    }
}

/// Apply a fallible kernel to every element, stopping at the first error
pub fn try_map_batch<T, R, F>(input: &ArrayD<T>, f: F) -> SarResult<ArrayD<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> SarResult<R> + Sync + Send,
{
    let items: Vec<&T> = input.iter().collect();

    #[cfg(feature = "parallel")]
    let values = {
        use rayon::prelude::*;
        items
            .into_par_iter()
            .map(|x| f(x))
            .collect::<SarResult<Vec<_>>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let values = items
        .into_iter()
        .map(|x| f(x))
        .collect::<SarResult<Vec<_>>>()?;

    Ok(ArrayD::from_shape_vec(input.raw_dim(), values)?)
}

/// Broadcast `value` to `shape`, failing with `InvalidShape` when incompatible
pub fn broadcast_to<'a, T>(
    value: &'a ArrayD<T>,
    shape: &[usize],
    name: &str,
) -> SarResult<ArrayViewD<'a, T>> {
    value.broadcast(IxDyn(shape)).ok_or_else(|| {
        SarError::InvalidShape(format!(
            "{} with shape {:?} cannot be broadcast to {:?}",
            name,
            value.shape(),
            shape
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, Array};

    #[test]
    fn test_map_preserves_shape_and_order() {
        let input = Array::from_shape_vec(vec![2, 3], (0..6).map(f64::from).collect())
            .unwrap()
            .into_dyn();
        let doubled = map_batch(&input, |x| 2.0 * x);
        assert_eq!(doubled.shape(), &[2, 3]);
        assert_eq!(doubled[[1, 2]], 10.0);

        let squared = try_map_batch(&input, |x| Ok(x * x)).unwrap();
        assert_eq!(squared[[1, 0]], 9.0);
    }

    #[test]
    fn test_try_map_reports_error() {
        let input = Array::from_elem(vec![4], 1.0).into_dyn();
        let result = try_map_batch(&input, |_| -> SarResult<f64> {
            Err(SarError::InvalidParameter("boom".to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_broadcast_scalar() {
        let scalar = arr0(5.0).into_dyn();
        let view = broadcast_to(&scalar, &[2, 2], "hae0").unwrap();
        assert_eq!(view.shape(), &[2, 2]);

        let wrong = Array::from_elem(vec![3], 0.0).into_dyn();
        assert!(broadcast_to(&wrong, &[2, 2], "hae0").is_err());
    }
}
