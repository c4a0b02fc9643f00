// ============================================================
// Layer 5 — Attention
// ============================================================
// Scaled dot-product attention and the multi-head block built
// on top of it.
//
//   scores  = Q · Kᵀ / √d_k
//   scores  = mask_fill(scores, hidden, -1e9)
//   weights = softmax(scores, over keys)
//   context = weights · V
//
// Masks follow one convention everywhere in this crate:
//   true  = the query may attend to this key
//   false = hidden
//
// Reference: Vaswani et al. (2017) Attention Is All You Need §3.2

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::domain::errors::ModelError;
use crate::ml::layers::xavier_uniform;

/// Score written into hidden positions before the softmax.
/// Finite on purpose: a fully hidden row becomes uniform, not NaN.
pub const MASK_FILL_VALUE: f32 = -1.0e9;

/// Result of one attention computation.
pub struct AttentionOutput<B: Backend> {
    /// Weighted sum of values — [..., seq_len_q, d_k]
    pub context: Tensor<B, 4>,

    /// Attention weights — [..., seq_len_q, seq_len_k]
    pub weights: Tensor<B, 4>,
}

/// Scaled dot-product attention over `[batch, heads, seq_len, d_k]` tensors.
///
/// `mask` may be any shape that broadcasts to
/// `[batch, heads, seq_len_q, seq_len_k]`, e.g. `[B,1,1,L]` for padding
/// or `[B,1,L,L]` for causal + padding.
pub fn scaled_dot_product_attention<B: Backend>(
    query:   Tensor<B, 4>,
    key:     Tensor<B, 4>,
    value:   Tensor<B, 4>,
    mask:    Option<Tensor<B, 4, Bool>>,
    dropout: Option<&Dropout>,
) -> AttentionOutput<B> {
    let d_k = query.dims()[3];

    // [B, H, Lq, d_k] · [B, H, d_k, Lk] → [B, H, Lq, Lk]
    let scores = query
        .matmul(key.swap_dims(2, 3))
        .div_scalar((d_k as f64).sqrt());

    let scores = match mask {
        Some(mask) => {
            let hidden = mask.bool_not().expand(scores.shape());
            scores.mask_fill(hidden, MASK_FILL_VALUE)
        }
        None => scores,
    };

    // burn's softmax subtracts the row max before exponentiating
    let weights = softmax(scores, 3);
    let weights = match dropout {
        Some(dropout) => dropout.forward(weights),
        None          => weights,
    };

    let context = weights.clone().matmul(value);
    AttentionOutput { context, weights }
}

/// Self-attention of `n` raw vectors against each other (Q = K = V, no
/// projections, no mask), on the CPU backend. `vectors` is row-major
/// `[n, dim]`; the returned weights are row-major `[n, n]`.
pub fn raw_self_attention(vectors: Vec<f32>, n: usize, dim: usize) -> anyhow::Result<Vec<f32>> {
    type Cpu = burn::backend::NdArray;
    let device = Default::default();

    let x = Tensor::<Cpu, 4>::from_data(TensorData::new(vectors, [1, 1, n, dim]), &device);
    let out = scaled_dot_product_attention(x.clone(), x.clone(), x, None, None);

    out.weights
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read attention weights: {e:?}"))
}

// ─── Multi-Head Attention ─────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct MultiHeadAttentionBlockConfig {
    pub d_model:   usize,
    pub num_heads: usize,
    #[config(default = 0.1)]
    pub dropout:   f64,
}

impl MultiHeadAttentionBlockConfig {
    /// Build the block. Fails when `d_model` does not split evenly into heads.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<MultiHeadAttentionBlock<B>, ModelError> {
        if self.num_heads == 0 {
            return Err(ModelError::NoHeads);
        }
        if self.d_model % self.num_heads != 0 {
            return Err(ModelError::HeadsMismatch {
                d_model:   self.d_model,
                num_heads: self.num_heads,
            });
        }

        let projection = || {
            LinearConfig::new(self.d_model, self.d_model)
                .with_bias(false)
                .with_initializer(xavier_uniform())
                .init(device)
        };

        Ok(MultiHeadAttentionBlock {
            w_q:       projection(),
            w_k:       projection(),
            w_v:       projection(),
            w_o:       projection(),
            dropout:   DropoutConfig::new(self.dropout).init(),
            num_heads: self.num_heads,
            d_k:       self.d_model / self.num_heads,
        })
    }
}

#[derive(Module, Debug)]
pub struct MultiHeadAttentionBlock<B: Backend> {
    w_q:       Linear<B>,
    w_k:       Linear<B>,
    w_v:       Linear<B>,
    w_o:       Linear<B>,
    dropout:   Dropout,
    num_heads: usize,
    d_k:       usize,
}

pub struct MhaOutput<B: Backend> {
    /// [batch, seq_len_q, d_model]
    pub context: Tensor<B, 3>,
    /// [batch, heads, seq_len_q, seq_len_k]
    pub weights: Tensor<B, 4>,
}

impl<B: Backend> MultiHeadAttentionBlock<B> {
    /// query: [batch, seq_len_q, d_model]; key/value: [batch, seq_len_k, d_model].
    /// Key and value may come from another sequence (cross-attention).
    pub fn forward(
        &self,
        query: Tensor<B, 3>,
        key:   Tensor<B, 3>,
        value: Tensor<B, 3>,
        mask:  Option<Tensor<B, 4, Bool>>,
    ) -> MhaOutput<B> {
        let [batch, len_q, _] = query.dims();

        let q = self.split_heads(self.w_q.forward(query));
        let k = self.split_heads(self.w_k.forward(key));
        let v = self.split_heads(self.w_v.forward(value));

        let attn = scaled_dot_product_attention(q, k, v, mask, Some(&self.dropout));

        // [B, H, Lq, d_k] → [B, Lq, H, d_k] → [B, Lq, D]
        let context = attn
            .context
            .swap_dims(1, 2)
            .reshape([batch, len_q, self.num_heads * self.d_k]);

        MhaOutput {
            context: self.w_o.forward(context),
            weights: attn.weights,
        }
    }

    pub fn num_heads(&self) -> usize {
        self.num_heads
    }

    /// [B, L, D] → [B, H, L, d_k]
    fn split_heads(&self, x: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, len, _] = x.dims();
        x.reshape([batch, len, self.num_heads, self.d_k]).swap_dims(1, 2)
    }
}
