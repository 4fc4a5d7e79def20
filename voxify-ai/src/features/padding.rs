//! Frame alignment and model input shaping

use ndarray::{s, Array2, Array4, ArrayView2, Axis};

/// Keep the first `frames` columns of `tensor`
///
/// Tensors that are already short enough are returned whole.
pub fn truncate_frames(tensor: &Array2<f32>, frames: usize) -> Array2<f32> {
    let keep = frames.min(tensor.ncols());
    tensor.slice(s![.., ..keep]).to_owned()
}

/// Zero-pad or truncate on the right to exactly `frames` columns
pub fn fit_frames(tensor: ArrayView2<f32>, frames: usize) -> Array2<f32> {
    let keep = frames.min(tensor.ncols());
    let mut out = Array2::<f32>::zeros((tensor.nrows(), frames));
    out.slice_mut(s![.., ..keep])
        .assign(&tensor.slice(s![.., ..keep]));
    out
}

/// Fit to `frames` columns and add batch and trailing channel axes:
/// `(C, T)` becomes `(1, C, frames, 1)`
pub fn pad_and_expand(tensor: ArrayView2<f32>, frames: usize) -> Array4<f32> {
    fit_frames(tensor, frames)
        .insert_axis(Axis(0))
        .insert_axis(Axis(3))
}
