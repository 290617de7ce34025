//! Image intensity normalization.

use ndarray::{Array, ArrayBase, Data, Dimension};

/// Z-score normalization over the whole array: `(image - mean) / std`.
///
/// Accepts any element type that widens losslessly to `f64` (the integer
/// MRC modes as well as `f32`) and always returns `f32`. Uses the population
/// standard deviation and accumulates in `f64`. A constant image has zero
/// standard deviation and yields non-finite values; an empty image yields an
/// empty array.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn normalise_image<A, S, D>(image: &ArrayBase<S, D>) -> Array<f32, D>
where
    A: Copy + Into<f64>,
    S: Data<Elem = A>,
    D: Dimension,
{
    let n = image.len() as f64;
    let mean = image.iter().map(|&v| v.into()).sum::<f64>() / n;
    let var = image
        .iter()
        .map(|&v| {
            let d = v.into() - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt();
    image.map(|&v| ((v.into() - mean) / std) as f32)
}
