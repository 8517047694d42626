//! Parallel/sequential execution helpers.
//!
//! The `cfg(feature = "parallel")` switch lives here, once, so call sites in
//! the simulation stay free of conditional compilation.
//!
//! # Runtime Override
//!
//! Every helper takes `force_sequential`. When `true`, execution is
//! sequential even with the `parallel` feature enabled, which keeps runs
//! reproducible for tests and makes profiling comparisons easy.
//!
//! # Example
//!
//! ```
//! let squares = parallel::map_slice(&[1, 2, 3], |x| x * x, false);
//! assert_eq!(squares, vec![1, 4, 9]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Map a function over a slice, potentially in parallel.
///
/// Output order always matches input order.
#[inline]
pub fn map_slice<T, F, R>(slice: &[T], f: F, force_sequential: bool) -> Vec<R>
where
    T: Sync,
    F: Fn(&T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            slice.iter().map(f).collect()
        } else {
            slice.par_iter().map(f).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        slice.iter().map(f).collect()
    }
}
