// ============================================================
// Layer 4 — Translation Dataset
// ============================================================
// Frames each tokenised pair into three fixed-length sequences:
//
//   encoder_input = [SOS] src… [EOS] [PAD]…
//   decoder_input = [SOS] tgt…       [PAD]…
//   label         =       tgt… [EOS] [PAD]…
//
// decoder_input and label are offset by one position, so at step
// i the decoder sees tgt[..i] and is trained to emit tgt[i]
// (teacher forcing).
//
// A pair that does not fit in seq_len is rejected, never truncated.

use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::errors::DataError;
use crate::domain::tokens::SpecialTokens;
use crate::domain::translation_pair::TranslationPair;

/// One framed training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSample {
    pub encoder_input: Vec<u32>,
    pub decoder_input: Vec<u32>,
    pub label:         Vec<u32>,
    pub src_text:      String,
    pub tgt_text:      String,
}

/// `[SOS] src… [EOS] [PAD]…` of length `seq_len`; the encoder input
/// on its own, as used when translating a single sentence.
pub fn frame_source(
    src_ids: &[u32],
    tokens:  SpecialTokens,
    seq_len: usize,
) -> Result<Vec<u32>, DataError> {
    let padding = seq_len
        .checked_sub(src_ids.len() + SpecialTokens::ENCODER_RESERVED)
        .ok_or(DataError::SequenceTooLong {
            side:     "source",
            tokens:   src_ids.len(),
            reserved: SpecialTokens::ENCODER_RESERVED,
            seq_len,
        })?;

    let mut encoder_input = Vec::with_capacity(seq_len);
    encoder_input.push(tokens.sos);
    encoder_input.extend_from_slice(src_ids);
    encoder_input.push(tokens.eos);
    encoder_input.extend(std::iter::repeat(tokens.pad).take(padding));
    Ok(encoder_input)
}

/// Frame already-tokenised source/target ids into
/// (encoder_input, decoder_input, label), each of length `seq_len`.
pub fn build_sample(
    src_ids: &[u32],
    tgt_ids: &[u32],
    tokens:  SpecialTokens,
    seq_len: usize,
) -> Result<(Vec<u32>, Vec<u32>, Vec<u32>), DataError> {
    let encoder_input = frame_source(src_ids, tokens, seq_len)?;

    let dec_padding = seq_len
        .checked_sub(tgt_ids.len() + SpecialTokens::DECODER_RESERVED)
        .ok_or(DataError::SequenceTooLong {
            side:     "target",
            tokens:   tgt_ids.len(),
            reserved: SpecialTokens::DECODER_RESERVED,
            seq_len,
        })?;

    let mut decoder_input = Vec::with_capacity(seq_len);
    decoder_input.push(tokens.sos);
    decoder_input.extend_from_slice(tgt_ids);
    decoder_input.extend(std::iter::repeat(tokens.pad).take(dec_padding));

    let mut label = Vec::with_capacity(seq_len);
    label.extend_from_slice(tgt_ids);
    label.push(tokens.eos);
    label.extend(std::iter::repeat(tokens.pad).take(dec_padding));

    Ok((encoder_input, decoder_input, label))
}

/// Token ids for one sentence, without special tokens.
pub fn encode_ids(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}

pub struct TranslationDataset {
    samples: Vec<TranslationSample>,
}

impl TranslationDataset {
    pub fn new(samples: Vec<TranslationSample>) -> Self {
        Self { samples }
    }

    /// Tokenise and frame every pair. Pairs that are too long for
    /// `seq_len` are skipped with a warning.
    pub fn from_pairs(
        pairs:         &[TranslationPair],
        src_tokenizer: &Tokenizer,
        tgt_tokenizer: &Tokenizer,
        tokens:        SpecialTokens,
        seq_len:       usize,
    ) -> Result<Self> {
        let mut samples = Vec::with_capacity(pairs.len());
        let mut skipped = 0usize;

        for pair in pairs {
            let src_ids = encode_ids(src_tokenizer, &pair.source)?;
            let tgt_ids = encode_ids(tgt_tokenizer, &pair.target)?;

            match build_sample(&src_ids, &tgt_ids, tokens, seq_len) {
                Ok((encoder_input, decoder_input, label)) => samples.push(TranslationSample {
                    encoder_input,
                    decoder_input,
                    label,
                    src_text: pair.source.clone(),
                    tgt_text: pair.target.clone(),
                }),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping pair: {e}");
                }
            }
        }

        if skipped > 0 {
            tracing::warn!("{} of {} pairs did not fit seq_len={}", skipped, pairs.len(), seq_len);
        }
        Ok(Self::new(samples))
    }

    pub fn samples(&self) -> &[TranslationSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<TranslationSample> {
        self.samples
    }
}

impl Dataset<TranslationSample> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: SpecialTokens = SpecialTokens { unk: 0, pad: 1, sos: 2, eos: 3 };

    #[test]
    fn test_framing_layout() {
        let (enc, dec, label) = build_sample(&[10, 11, 12], &[20, 21], T, 8).unwrap();
        assert_eq!(enc,   vec![2, 10, 11, 12, 3, 1, 1, 1]);
        assert_eq!(dec,   vec![2, 20, 21, 1, 1, 1, 1, 1]);
        assert_eq!(label, vec![20, 21, 3, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_label_is_decoder_input_shifted_left() {
        let tgt = [5, 6, 7, 8];
        let (_, dec, label) = build_sample(&[9], &tgt, T, 6).unwrap();
        assert_eq!(&dec[1..=tgt.len()], &label[..tgt.len()]);
    }

    #[test]
    fn test_exact_fit_has_no_padding() {
        // 8 source tokens + [SOS] + [EOS] = 10; 9 target tokens + 1 = 10
        let src: Vec<u32> = (10..18).collect();
        let tgt: Vec<u32> = (20..29).collect();
        let (enc, dec, label) = build_sample(&src, &tgt, T, 10).unwrap();
        assert!(!enc.contains(&T.pad));
        assert!(!dec.contains(&T.pad));
        assert_eq!(label.last(), Some(&T.eos));
    }

    #[test]
    fn test_too_long_source_is_rejected() {
        let src: Vec<u32> = (10..19).collect();
        let err = build_sample(&src, &[20], T, 10).unwrap_err();
        assert_eq!(err, DataError::SequenceTooLong {
            side: "source", tokens: 9, reserved: 2, seq_len: 10,
        });
    }

    #[test]
    fn test_too_long_target_is_rejected() {
        let tgt: Vec<u32> = (20..30).collect();
        let err = build_sample(&[10], &tgt, T, 10).unwrap_err();
        assert!(matches!(err, DataError::SequenceTooLong { side: "target", .. }));
    }

    #[test]
    fn test_frame_source_matches_encoder_input() {
        let (enc, _, _) = build_sample(&[7, 8], &[9], T, 6).unwrap();
        assert_eq!(frame_source(&[7, 8], T, 6).unwrap(), enc);
    }

    #[test]
    fn test_dataset_trait() {
        let (enc, dec, label) = build_sample(&[10], &[20], T, 4).unwrap();
        let sample = TranslationSample {
            encoder_input: enc, decoder_input: dec, label,
            src_text: "a".into(), tgt_text: "b".into(),
        };
        let ds = TranslationDataset::new(vec![sample.clone()]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0), Some(sample));
        assert_eq!(ds.get(1), None);
    }
}
