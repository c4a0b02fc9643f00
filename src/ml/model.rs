use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::domain::errors::ModelError;
use crate::ml::decode::Seq2Seq;
use crate::ml::decoder::{Decoder, DecoderBlock};
use crate::ml::encoder::{Encoder, EncoderBlock};
use crate::ml::layers::{xavier_uniform, InputEmbeddings, PositionalEncoding};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TransformerConfig {
    pub src_vocab_size: usize,
    pub tgt_vocab_size: usize,
    pub src_seq_len:    usize,
    pub tgt_seq_len:    usize,
    #[config(default = 512)]
    pub d_model:        usize,
    #[config(default = 6)]
    pub num_layers:     usize,
    #[config(default = 8)]
    pub num_heads:      usize,
    #[config(default = 0.1)]
    pub dropout:        f64,
    #[config(default = 2048)]
    pub d_ff:           usize,
}

impl TransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Transformer<B>, ModelError> {
        let encoder_layers = (0..self.num_layers)
            .map(|_| EncoderBlock::new(self.d_model, self.num_heads, self.d_ff, self.dropout, device))
            .collect::<Result<Vec<_>, _>>()?;
        let decoder_layers = (0..self.num_layers)
            .map(|_| DecoderBlock::new(self.d_model, self.num_heads, self.d_ff, self.dropout, device))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Transformer {
            encoder:    Encoder::new(encoder_layers, self.d_model, device),
            decoder:    Decoder::new(decoder_layers, self.d_model, device),
            src_embed:  InputEmbeddings::new(self.src_vocab_size, self.d_model, device),
            tgt_embed:  InputEmbeddings::new(self.tgt_vocab_size, self.d_model, device),
            src_pos:    PositionalEncoding::new(self.src_seq_len, self.d_model, self.dropout, device),
            tgt_pos:    PositionalEncoding::new(self.tgt_seq_len, self.d_model, self.dropout, device),
            projection: ProjectionLayer::new(self.d_model, self.tgt_vocab_size, device),
        })
    }
}

/// Build a transformer with the default hyperparameters
/// (d_model 512, 6 layers, 8 heads, dropout 0.1, d_ff 2048).
pub fn build_transformer<B: Backend>(
    src_vocab_size: usize,
    tgt_vocab_size: usize,
    src_seq_len:    usize,
    tgt_seq_len:    usize,
    device:         &B::Device,
) -> Result<Transformer<B>, ModelError> {
    TransformerConfig::new(src_vocab_size, tgt_vocab_size, src_seq_len, tgt_seq_len).init(device)
}

// ─── Projection ───────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct ProjectionLayer<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> ProjectionLayer<B> {
    pub fn new(d_model: usize, vocab_size: usize, device: &B::Device) -> Self {
        let linear = LinearConfig::new(d_model, vocab_size)
            .with_initializer(xavier_uniform())
            .init(device);
        Self { linear }
    }

    /// [batch, seq_len, d_model] → log-probabilities [batch, seq_len, vocab]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        log_softmax(self.linear.forward(x), 2)
    }
}

// ─── Transformer ──────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    encoder:    Encoder<B>,
    decoder:    Decoder<B>,
    src_embed:  InputEmbeddings<B>,
    tgt_embed:  InputEmbeddings<B>,
    src_pos:    PositionalEncoding<B>,
    tgt_pos:    PositionalEncoding<B>,
    projection: ProjectionLayer<B>,
}

impl<B: Backend> Transformer<B> {
    /// src: [batch, src_len] → encoder output [batch, src_len, d_model]
    pub fn encode(&self, src: Tensor<B, 2, Int>, src_mask: Tensor<B, 4, Bool>) -> Tensor<B, 3> {
        let x = self.src_pos.forward(self.src_embed.forward(src));
        self.encoder.forward(x, src_mask)
    }

    /// tgt: [batch, tgt_len] → decoder state [batch, tgt_len, d_model]
    pub fn decode(
        &self,
        memory:   Tensor<B, 3>,
        src_mask: Tensor<B, 4, Bool>,
        tgt:      Tensor<B, 2, Int>,
        tgt_mask: Tensor<B, 4, Bool>,
    ) -> Tensor<B, 3> {
        let x = self.tgt_pos.forward(self.tgt_embed.forward(tgt));
        self.decoder.forward(x, memory, src_mask, tgt_mask)
    }

    /// decoder state → log-probabilities over the target vocabulary
    pub fn project(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.projection.forward(x)
    }

    pub fn src_seq_len(&self) -> usize {
        self.src_pos.max_len()
    }

    pub fn tgt_seq_len(&self) -> usize {
        self.tgt_pos.max_len()
    }
}

impl<B: Backend> Seq2Seq<B> for Transformer<B> {
    fn encode(&self, src: Tensor<B, 2, Int>, src_mask: Tensor<B, 4, Bool>) -> Tensor<B, 3> {
        Transformer::encode(self, src, src_mask)
    }

    fn decode(
        &self,
        memory:   Tensor<B, 3>,
        src_mask: Tensor<B, 4, Bool>,
        tgt:      Tensor<B, 2, Int>,
        tgt_mask: Tensor<B, 4, Bool>,
    ) -> Tensor<B, 3> {
        Transformer::decode(self, memory, src_mask, tgt, tgt_mask)
    }

    fn project(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        Transformer::project(self, x)
    }

    fn max_target_len(&self) -> usize {
        self.tgt_seq_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mask::{decoder_mask_tensor, encoder_mask_tensor};

    type TestBackend = burn::backend::NdArray;

    fn small_config() -> TransformerConfig {
        TransformerConfig::new(100, 120, 10, 10)
            .with_d_model(16)
            .with_num_layers(2)
            .with_num_heads(2)
            .with_d_ff(32)
    }

    #[test]
    fn test_defaults_match_paper() {
        let cfg = TransformerConfig::new(1, 1, 1, 1);
        assert_eq!(cfg.d_model, 512);
        assert_eq!(cfg.num_layers, 6);
        assert_eq!(cfg.num_heads, 8);
        assert_eq!(cfg.d_ff, 2048);
        assert!((cfg.dropout - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_uneven_heads_fail_at_build() {
        let device = Default::default();
        let err = small_config()
            .with_num_heads(3)
            .init::<TestBackend>(&device)
            .unwrap_err();
        assert_eq!(err, ModelError::HeadsMismatch { d_model: 16, num_heads: 3 });
    }

    #[test]
    fn test_encode_decode_project_end_to_end() {
        let device = Default::default();
        let model = small_config().init::<TestBackend>(&device).unwrap();
        assert_eq!(model.src_seq_len(), 10);

        // One sequence, every position a real token
        let ids: Vec<u32> = vec![2, 11, 12, 13, 14, 15, 16, 17, 18, 3];
        let src = Tensor::<TestBackend, 2, Int>::from_ints([[2, 11, 12, 13, 14, 15, 16, 17, 18, 3]], &device);
        let tgt = Tensor::<TestBackend, 2, Int>::from_ints([[2, 21, 22, 23, 24, 25, 26, 27, 28, 29]], &device);
        let src_mask = encoder_mask_tensor(&[ids.clone()], 1, &device);
        let tgt_mask = decoder_mask_tensor(&[ids], 1, &device);

        let memory = model.encode(src, src_mask.clone());
        assert_eq!(memory.dims(), [1, 10, 16]);

        let state = model.decode(memory, src_mask, tgt, tgt_mask);
        assert_eq!(state.dims(), [1, 10, 16]);

        let log_probs = model.project(state);
        assert_eq!(log_probs.dims(), [1, 10, 120]);

        let sums = log_probs.exp().sum_dim(2).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(sums.len(), 10);
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4, "row sums to {s}");
        }
    }
}
