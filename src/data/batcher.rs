// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TranslationSample>
// into tensors plus attention masks.
//
//   encoder_input  [N, L]          Int
//   decoder_input  [N, L]          Int
//   label          [N, L]          Int
//   encoder_mask   [N, 1, 1, L]    Bool  (padding)
//   decoder_mask   [N, 1, L, L]    Bool  (padding AND causal)
//
// All samples are pre-padded to seq_len by the dataset, so the
// rows can be flattened and reshaped directly.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationSample;
use crate::ml::mask::{decoder_mask_tensor, encoder_mask_tensor};

#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    pub encoder_input: Tensor<B, 2, Int>,
    pub decoder_input: Tensor<B, 2, Int>,
    pub label:         Tensor<B, 2, Int>,
    pub encoder_mask:  Tensor<B, 4, Bool>,
    pub decoder_mask:  Tensor<B, 4, Bool>,

    /// Raw sentences, kept for printing validation examples
    pub src_text: Vec<String>,
    pub tgt_text: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device: B::Device,
    pub pad_id: u32,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device, pad_id: u32) -> Self {
        Self { device, pad_id }
    }

    fn ids_tensor(&self, rows: &[Vec<u32>]) -> Tensor<B, 2, Int> {
        let batch_size = rows.len();
        let seq_len    = rows.first().map_or(0, Vec::len);
        let flat: Vec<i64> = rows
            .iter()
            .flat_map(|row| row.iter().map(|&id| id as i64))
            .collect();

        Tensor::from_data(TensorData::new(flat, [batch_size, seq_len]), &self.device)
    }
}

impl<B: Backend> Batcher<TranslationSample, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationSample>) -> TranslationBatch<B> {
        let encoder_rows: Vec<Vec<u32>> = items.iter().map(|s| s.encoder_input.clone()).collect();
        let decoder_rows: Vec<Vec<u32>> = items.iter().map(|s| s.decoder_input.clone()).collect();
        let label_rows:   Vec<Vec<u32>> = items.iter().map(|s| s.label.clone()).collect();

        TranslationBatch {
            encoder_input: self.ids_tensor(&encoder_rows),
            decoder_input: self.ids_tensor(&decoder_rows),
            label:         self.ids_tensor(&label_rows),
            encoder_mask:  encoder_mask_tensor(&encoder_rows, self.pad_id, &self.device),
            decoder_mask:  decoder_mask_tensor(&decoder_rows, self.pad_id, &self.device),
            src_text:      items.iter().map(|s| s.src_text.clone()).collect(),
            tgt_text:      items.iter().map(|s| s.tgt_text.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::build_sample;
    use crate::domain::tokens::SpecialTokens;

    type TestBackend = burn::backend::NdArray;

    fn sample(src: &[u32], tgt: &[u32]) -> TranslationSample {
        let (encoder_input, decoder_input, label) =
            build_sample(src, tgt, SpecialTokens::default(), 6).unwrap();
        TranslationSample {
            encoder_input, decoder_input, label,
            src_text: "src".into(),
            tgt_text: "tgt".into(),
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = TranslationBatcher::<TestBackend>::new(Default::default(), 1);
        let batch = batcher.batch(vec![sample(&[10, 11], &[20]), sample(&[12], &[21, 22, 23])]);

        assert_eq!(batch.encoder_input.dims(), [2, 6]);
        assert_eq!(batch.decoder_input.dims(), [2, 6]);
        assert_eq!(batch.label.dims(),         [2, 6]);
        assert_eq!(batch.encoder_mask.dims(),  [2, 1, 1, 6]);
        assert_eq!(batch.decoder_mask.dims(),  [2, 1, 6, 6]);
        assert_eq!(batch.src_text.len(), 2);
    }

    #[test]
    fn test_batch_preserves_ids_and_mask() {
        let batcher = TranslationBatcher::<TestBackend>::new(Default::default(), 1);
        let batch = batcher.batch(vec![sample(&[10, 11], &[20])]);

        let ids = batch.encoder_input.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(ids, vec![2, 10, 11, 3, 1, 1]);

        let mask = batch.encoder_mask.into_data().to_vec::<bool>().unwrap();
        assert_eq!(mask, vec![true, true, true, true, false, false]);
    }
}
