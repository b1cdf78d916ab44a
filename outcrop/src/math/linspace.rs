use num_traits::{Float, FromPrimitive};

/// Returns `n` evenly spaced values from `start` to `end`, inclusive.
///
/// `n` must be at least 2.
pub fn linspace<T>(start: T, end: T, n: usize) -> impl Iterator<Item = T>
where
    T: Float + FromPrimitive,
{
    let last = n - 1;
    let dy = (end - start) / T::from_usize(last).unwrap_or_else(T::one);
    // The last value is pinned to `end` so bounds survive rounding.
    (0..n).map(move |i| {
        if i == last {
            end
        } else {
            start + T::from_usize(i).unwrap_or_else(T::zero) * dy
        }
    })
}
