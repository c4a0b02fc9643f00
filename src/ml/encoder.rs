// ============================================================
// Layer 5 — Encoder
// ============================================================
// EncoderBlock = self-attention (padding mask only) + feed-forward,
// each wrapped in a pre-norm residual connection.
// Encoder      = N blocks in order, then one final LayerNormalization.

use burn::prelude::*;

use crate::domain::errors::ModelError;
use crate::ml::attention::{MultiHeadAttentionBlock, MultiHeadAttentionBlockConfig};
use crate::ml::layers::{FeedForwardBlock, LayerNormalization, ResidualConnection, Sublayer};

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    self_attention:        MultiHeadAttentionBlock<B>,
    feed_forward:          FeedForwardBlock<B>,
    attention_residual:    ResidualConnection<B>,
    feed_forward_residual: ResidualConnection<B>,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn new(
        d_model:   usize,
        num_heads: usize,
        d_ff:      usize,
        dropout:   f64,
        device:    &B::Device,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            self_attention: MultiHeadAttentionBlockConfig::new(d_model, num_heads)
                .with_dropout(dropout)
                .init(device)?,
            feed_forward:          FeedForwardBlock::new(d_model, d_ff, dropout, device),
            attention_residual:    ResidualConnection::new(d_model, dropout, device),
            feed_forward_residual: ResidualConnection::new(d_model, dropout, device),
        })
    }

    pub fn forward(&self, x: Tensor<B, 3>, src_mask: Tensor<B, 4, Bool>) -> Tensor<B, 3> {
        let x = self.attention_residual.forward(
            x,
            Sublayer::SelfAttention { attention: &self.self_attention, mask: Some(src_mask) },
        );
        self.feed_forward_residual
            .forward(x, Sublayer::FeedForward(&self.feed_forward))
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    layers: Vec<EncoderBlock<B>>,
    norm:   LayerNormalization<B>,
}

impl<B: Backend> Encoder<B> {
    pub fn new(layers: Vec<EncoderBlock<B>>, d_model: usize, device: &B::Device) -> Self {
        Self { layers, norm: LayerNormalization::new(d_model, device) }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// [batch, src_len, d_model] → same shape
    pub fn forward(&self, mut x: Tensor<B, 3>, src_mask: Tensor<B, 4, Bool>) -> Tensor<B, 3> {
        for layer in &self.layers {
            x = layer.forward(x, src_mask.clone());
        }
        self.norm.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mask::encoder_mask_tensor;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_encoder_is_shape_preserving() {
        let device = Default::default();
        let layers = (0..2)
            .map(|_| EncoderBlock::new(8, 2, 16, 0.0, &device))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let encoder = Encoder::<TestBackend>::new(layers, 8, &device);
        assert_eq!(encoder.num_layers(), 2);

        let x = Tensor::random([2, 4, 8], Distribution::Default, &device);
        let mask = encoder_mask_tensor(&[vec![5, 6, 1, 1], vec![5, 6, 7, 8]], 1, &device);
        assert_eq!(encoder.forward(x, mask).dims(), [2, 4, 8]);
    }

    #[test]
    fn test_encoder_block_propagates_head_error() {
        let device = Default::default();
        let err = EncoderBlock::<TestBackend>::new(9, 2, 16, 0.1, &device).unwrap_err();
        assert_eq!(err, ModelError::HeadsMismatch { d_model: 9, num_heads: 2 });
    }
}
