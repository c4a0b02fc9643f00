// ============================================================
// Layer 5 — Attention Masks
// ============================================================
// true = visible, false = hidden.
//
//   padding mask  hides [PAD] keys                  [B, 1, 1, L]
//   causal mask   hides keys after the query        [1, 1, L, L]
//   decoder mask  padding AND causal                [B, 1, L, L]
//
// The plain Vec<bool> builders are framework-free and are used by
// the batcher and by the tests; the *_tensor builders lift them
// onto a burn device.

use burn::prelude::*;

/// `ids[j] != pad` for every position.
pub fn padding_mask(ids: &[u32], pad: u32) -> Vec<bool> {
    ids.iter().map(|&id| id != pad).collect()
}

/// Row-major `[len, len]`; row i sees columns 0..=i.
pub fn causal_mask(len: usize) -> Vec<bool> {
    (0..len)
        .flat_map(|i| (0..len).map(move |j| j <= i))
        .collect()
}

/// Row-major `[len, len]`; row i sees column j when j <= i and ids[j] is not pad.
pub fn decoder_mask(ids: &[u32], pad: u32) -> Vec<bool> {
    let len = ids.len();
    let keys = padding_mask(ids, pad);
    causal_mask(len)
        .into_iter()
        .enumerate()
        .map(|(idx, visible)| visible && keys[idx % len])
        .collect()
}

fn bool_tensor<B: Backend, const D: usize>(
    values: Vec<bool>,
    shape:  [usize; D],
    device: &B::Device,
) -> Tensor<B, D, Bool> {
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Padding masks for equally long rows → `[batch, 1, 1, len]`.
pub fn encoder_mask_tensor<B: Backend>(
    rows:   &[Vec<u32>],
    pad:    u32,
    device: &B::Device,
) -> Tensor<B, 4, Bool> {
    let len = rows.first().map_or(0, Vec::len);
    let values = rows.iter().flat_map(|ids| padding_mask(ids, pad)).collect();
    bool_tensor(values, [rows.len(), 1, 1, len], device)
}

/// Padding + causal masks for equally long rows → `[batch, 1, len, len]`.
pub fn decoder_mask_tensor<B: Backend>(
    rows:   &[Vec<u32>],
    pad:    u32,
    device: &B::Device,
) -> Tensor<B, 4, Bool> {
    let len = rows.first().map_or(0, Vec::len);
    let values = rows.iter().flat_map(|ids| decoder_mask(ids, pad)).collect();
    bool_tensor(values, [rows.len(), 1, len, len], device)
}

/// Causal mask alone → `[1, 1, len, len]` (used while decoding, where no
/// padding exists yet).
pub fn causal_mask_tensor<B: Backend>(len: usize, device: &B::Device) -> Tensor<B, 4, Bool> {
    bool_tensor(causal_mask(len), [1, 1, len, len], device)
}
