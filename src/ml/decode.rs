// ============================================================
// Layer 5 — Greedy Decoding
// ============================================================
// Inference-time generation:
//
//   1. encode the source once
//   2. decoder input = [SOS]
//   3. loop: causal mask for the current length → decode →
//      project the LAST position → argmax → append
//   4. stop on [EOS] or when the output reaches max_len
//
// encode / decode / project are kept separate (the Seq2Seq trait)
// so the encoder output is reused across every decoding step.

use burn::prelude::*;

use crate::ml::mask::causal_mask_tensor;

/// The three entry points of an encoder-decoder model.
pub trait Seq2Seq<B: Backend> {
    fn encode(&self, src: Tensor<B, 2, Int>, src_mask: Tensor<B, 4, Bool>) -> Tensor<B, 3>;

    fn decode(
        &self,
        memory:   Tensor<B, 3>,
        src_mask: Tensor<B, 4, Bool>,
        tgt:      Tensor<B, 2, Int>,
        tgt_mask: Tensor<B, 4, Bool>,
    ) -> Tensor<B, 3>;

    fn project(&self, x: Tensor<B, 3>) -> Tensor<B, 3>;

    /// Longest target sequence `decode` accepts.
    fn max_target_len(&self) -> usize {
        usize::MAX
    }
}

/// Greedy decoding of a single source sentence (`source`: `[1, src_len]`).
///
/// Returns the generated ids including the leading `sos`, and the
/// trailing `eos` when one was produced. The result never exceeds
/// `max_len` ids, nor the model's `max_target_len`.
pub fn greedy_decode<B: Backend, M: Seq2Seq<B>>(
    model:       &M,
    source:      Tensor<B, 2, Int>,
    source_mask: Tensor<B, 4, Bool>,
    sos:         u32,
    eos:         u32,
    max_len:     usize,
    device:      &B::Device,
) -> Vec<u32> {
    let max_len = max_len.min(model.max_target_len());
    let memory = model.encode(source, source_mask.clone());
    let mut output = vec![sos];

    while output.len() < max_len {
        let len = output.len();
        let decoder_input = ids_tensor::<B>(&output, device);
        let state = model.decode(
            memory.clone(),
            source_mask.clone(),
            decoder_input,
            causal_mask_tensor(len, device),
        );

        let [_, _, d_model] = state.dims();
        let last = state.slice([0..1, len - 1..len, 0..d_model]);
        let next = model
            .project(last)
            .argmax(2)
            .into_scalar()
            .elem::<i64>() as u32;

        output.push(next);
        if next == eos {
            break;
        }
    }

    tracing::trace!("greedy decode produced {} ids", output.len());
    output
}

/// `[1, len]` Int tensor from token ids.
pub fn ids_tensor<B: Backend>(ids: &[u32], device: &B::Device) -> Tensor<B, 2, Int> {
    let values: Vec<i64> = ids.iter().map(|&id| id as i64).collect();
    Tensor::from_data(TensorData::new(values, [1, ids.len()]), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mask::encoder_mask_tensor;
    use crate::ml::model::TransformerConfig;
    use std::cell::Cell;

    type TestBackend = burn::backend::NdArray;

    const VOCAB: usize = 6;
    const SOS: u32 = 2;
    const EOS: u32 = 3;

    /// Stand-in model whose projection always peaks on one fixed id.
    struct FixedChoice {
        choice:  u32,
        decodes: Cell<usize>,
        device:  <TestBackend as Backend>::Device,
    }

    impl Seq2Seq<TestBackend> for FixedChoice {
        fn encode(&self, src: Tensor<TestBackend, 2, Int>, _: Tensor<TestBackend, 4, Bool>) -> Tensor<TestBackend, 3> {
            let [batch, len] = src.dims();
            Tensor::zeros([batch, len, 4], &self.device)
        }

        fn decode(
            &self,
            _memory: Tensor<TestBackend, 3>,
            _src_mask: Tensor<TestBackend, 4, Bool>,
            tgt: Tensor<TestBackend, 2, Int>,
            _tgt_mask: Tensor<TestBackend, 4, Bool>,
        ) -> Tensor<TestBackend, 3> {
            self.decodes.set(self.decodes.get() + 1);
            let [batch, len] = tgt.dims();
            Tensor::zeros([batch, len, 4], &self.device)
        }

        fn project(&self, x: Tensor<TestBackend, 3>) -> Tensor<TestBackend, 3> {
            let [batch, len, _] = x.dims();
            let row: Vec<f32> = (0..VOCAB)
                .map(|id| if id as u32 == self.choice { 0.0 } else { -20.0 })
                .collect();
            let values = row.repeat(batch * len);
            Tensor::from_data(TensorData::new(values, [batch, len, VOCAB]), &self.device)
        }
    }

    fn source() -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 4, Bool>) {
        let device = Default::default();
        let ids = vec![SOS, 4, 5, EOS, 1];
        (ids_tensor(&ids, &device), encoder_mask_tensor(&[ids], 1, &device))
    }

    #[test]
    fn test_stops_immediately_on_end_token() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model = FixedChoice { choice: EOS, decodes: Cell::new(0), device: device.clone() };
        let (src, mask) = source();

        let out = greedy_decode(&model, src, mask, SOS, EOS, 50, &device);
        assert_eq!(out, vec![SOS, EOS]);
        assert_eq!(model.decodes.get(), 1);
    }

    #[test]
    fn test_never_exceeds_max_len() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let model = FixedChoice { choice: 4, decodes: Cell::new(0), device: device.clone() };
        let (src, mask) = source();

        let out = greedy_decode(&model, src, mask, SOS, EOS, 7, &device);
        assert_eq!(out.len(), 7);
        assert_eq!(out[0], SOS);
        assert!(out[1..].iter().all(|&id| id == 4));
    }

    #[test]
    fn test_real_model_output_is_bounded() {
        let device = Default::default();
        let model = TransformerConfig::new(VOCAB, VOCAB, 8, 8)
            .with_d_model(8)
            .with_num_layers(1)
            .with_num_heads(2)
            .with_d_ff(16)
            .init::<TestBackend>(&device)
            .unwrap();
        let (src, mask) = source();

        let out = greedy_decode(&model, src, mask, SOS, EOS, 8, &device);
        assert!(!out.is_empty() && out.len() <= 8);
        assert_eq!(out[0], SOS);
        assert!(out.iter().all(|&id| (id as usize) < VOCAB));
    }

    #[test]
    fn test_max_len_is_capped_by_target_positions() {
        let device = Default::default();
        let model = TransformerConfig::new(VOCAB, VOCAB, 8, 6)
            .with_d_model(8)
            .with_num_layers(1)
            .with_num_heads(2)
            .with_d_ff(16)
            .init::<TestBackend>(&device)
            .unwrap();
        assert_eq!(model.max_target_len(), 6);
        let (src, mask) = source();

        let out = greedy_decode(&model, src, mask, SOS, EOS, 50, &device);
        assert!(out.len() <= 6);
        assert_eq!(out[0], SOS);
    }
}
