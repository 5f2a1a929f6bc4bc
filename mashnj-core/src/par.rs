/// Parallel map: apply `$f` to each element of `$slice`, collecting into a Vec.
///
/// Output order always follows `$slice`, so callers can fold the results
/// sequentially and stay deterministic.
macro_rules! par_map {
    ($slice:expr, $f:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
            $slice.par_iter().map($f).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter().map($f).collect()
        }
    }};
}
