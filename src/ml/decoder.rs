// ============================================================
// Layer 5 — Decoder
// ============================================================
// DecoderBlock = masked self-attention (padding + causal)
//              + cross-attention over the encoder output
//              + feed-forward
// each wrapped in a pre-norm residual connection.
// Decoder      = N blocks in order, then one final LayerNormalization.

use burn::prelude::*;

use crate::domain::errors::ModelError;
use crate::ml::attention::{MultiHeadAttentionBlock, MultiHeadAttentionBlockConfig};
use crate::ml::layers::{FeedForwardBlock, LayerNormalization, ResidualConnection, Sublayer};

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    self_attention:        MultiHeadAttentionBlock<B>,
    cross_attention:       MultiHeadAttentionBlock<B>,
    feed_forward:          FeedForwardBlock<B>,
    self_residual:         ResidualConnection<B>,
    cross_residual:        ResidualConnection<B>,
    feed_forward_residual: ResidualConnection<B>,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn new(
        d_model:   usize,
        num_heads: usize,
        d_ff:      usize,
        dropout:   f64,
        device:    &B::Device,
    ) -> Result<Self, ModelError> {
        let attention = MultiHeadAttentionBlockConfig::new(d_model, num_heads).with_dropout(dropout);
        Ok(Self {
            self_attention:        attention.init(device)?,
            cross_attention:       attention.init(device)?,
            feed_forward:          FeedForwardBlock::new(d_model, d_ff, dropout, device),
            self_residual:         ResidualConnection::new(d_model, dropout, device),
            cross_residual:        ResidualConnection::new(d_model, dropout, device),
            feed_forward_residual: ResidualConnection::new(d_model, dropout, device),
        })
    }

    pub fn forward(
        &self,
        x:        Tensor<B, 3>,
        memory:   Tensor<B, 3>,
        src_mask: Tensor<B, 4, Bool>,
        tgt_mask: Tensor<B, 4, Bool>,
    ) -> Tensor<B, 3> {
        let x = self.self_residual.forward(
            x,
            Sublayer::SelfAttention { attention: &self.self_attention, mask: Some(tgt_mask) },
        );
        let x = self.cross_residual.forward(
            x,
            Sublayer::CrossAttention {
                attention: &self.cross_attention,
                memory,
                mask: Some(src_mask),
            },
        );
        self.feed_forward_residual
            .forward(x, Sublayer::FeedForward(&self.feed_forward))
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    layers: Vec<DecoderBlock<B>>,
    norm:   LayerNormalization<B>,
}

impl<B: Backend> Decoder<B> {
    pub fn new(layers: Vec<DecoderBlock<B>>, d_model: usize, device: &B::Device) -> Self {
        Self { layers, norm: LayerNormalization::new(d_model, device) }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// x: [batch, tgt_len, d_model], memory: [batch, src_len, d_model]
    pub fn forward(
        &self,
        mut x:    Tensor<B, 3>,
        memory:   Tensor<B, 3>,
        src_mask: Tensor<B, 4, Bool>,
        tgt_mask: Tensor<B, 4, Bool>,
    ) -> Tensor<B, 3> {
        for layer in &self.layers {
            x = layer.forward(x, memory.clone(), src_mask.clone(), tgt_mask.clone());
        }
        self.norm.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::mask::{decoder_mask_tensor, encoder_mask_tensor};
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_decoder_output_follows_target_length() {
        let device = Default::default();
        let layers = (0..2)
            .map(|_| DecoderBlock::new(8, 4, 16, 0.0, &device))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let decoder = Decoder::<TestBackend>::new(layers, 8, &device);
        assert_eq!(decoder.num_layers(), 2);

        let x = Tensor::random([1, 3, 8], Distribution::Default, &device);
        let memory = Tensor::random([1, 5, 8], Distribution::Default, &device);
        let src_mask = encoder_mask_tensor(&[vec![2, 7, 8, 3, 1]], 1, &device);
        let tgt_mask = decoder_mask_tensor(&[vec![2, 9, 1]], 1, &device);

        assert_eq!(decoder.forward(x, memory, src_mask, tgt_mask).dims(), [1, 3, 8]);
    }
}
