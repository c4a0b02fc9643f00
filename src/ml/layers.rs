// ============================================================
// Layer 5 — Transformer Building Blocks
// ============================================================
// The leaf modules every encoder/decoder block is assembled from:
//
//   InputEmbeddings      token id → vector, scaled by √d_model
//   PositionalEncoding   fixed sine/cosine signal added per position
//   LayerNormalization   per-position mean/std normalisation
//   FeedForwardBlock     Linear → ReLU → Dropout → Linear
//   ResidualConnection   x + dropout(sublayer(norm(x)))
//
// Reference: Vaswani et al. (2017) §3.3–§3.5

use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::attention::MultiHeadAttentionBlock;

/// Uniform-variance (Glorot) initialisation used for every rank > 1 parameter.
pub fn xavier_uniform() -> Initializer {
    Initializer::XavierUniform { gain: 1.0 }
}

// ─── Input Embeddings ─────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct InputEmbeddings<B: Backend> {
    embedding: Embedding<B>,
    d_model:   usize,
}

impl<B: Backend> InputEmbeddings<B> {
    pub fn new(vocab_size: usize, d_model: usize, device: &B::Device) -> Self {
        // Embedding::init gives the initializer no fan-in/fan-out, which Xavier needs
        let mut embedding = EmbeddingConfig::new(vocab_size, d_model).init(device);
        embedding.weight =
            xavier_uniform().init_with([vocab_size, d_model], Some(vocab_size), Some(d_model), device);
        Self { embedding, d_model }
    }

    /// [batch, seq_len] ids → [batch, seq_len, d_model]
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.embedding
            .forward(ids)
            .mul_scalar((self.d_model as f64).sqrt())
    }
}

// ─── Positional Encoding ──────────────────────────────────────────────────────

/// Sinusoidal table, row-major `[max_len, d_model]`.
///
/// ```text
/// PE(pos, 2i)   = sin(pos / 10000^(2i / d_model))
/// PE(pos, 2i+1) = cos(pos / 10000^(2i / d_model))
/// ```
///
/// Pure function of its arguments, so two calls with the same
/// `(max_len, d_model)` are bit-identical.
pub fn sinusoidal_table(max_len: usize, d_model: usize) -> Vec<f32> {
    let log_base = 10_000f64.ln();
    let mut table = Vec::with_capacity(max_len * d_model);

    for pos in 0..max_len {
        for dim in 0..d_model {
            let even = dim - dim % 2;
            let angle = pos as f64 * (-(even as f64) * log_base / d_model as f64).exp();
            let value = if dim % 2 == 0 { angle.sin() } else { angle.cos() };
            table.push(value as f32);
        }
    }
    table
}

#[derive(Module, Debug)]
pub struct PositionalEncoding<B: Backend> {
    /// [1, max_len, d_model]; constant, not a trainable parameter
    table:   Tensor<B, 3>,
    dropout: Dropout,
}

impl<B: Backend> PositionalEncoding<B> {
    pub fn new(max_len: usize, d_model: usize, dropout: f64, device: &B::Device) -> Self {
        let table = Tensor::from_data(
            TensorData::new(sinusoidal_table(max_len, d_model), [1, max_len, d_model]),
            device,
        );
        Self {
            table,
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    pub fn max_len(&self) -> usize {
        self.table.dims()[1]
    }

    /// Adds the first `seq_len` rows of the table, then applies dropout.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [_, seq_len, d_model] = x.dims();
        let signal = self.table.clone().slice([0..1, 0..seq_len, 0..d_model]);
        self.dropout.forward(x + signal)
    }
}

// ─── Layer Normalisation ──────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct LayerNormalization<B: Backend> {
    alpha: Param<Tensor<B, 1>>,
    bias:  Param<Tensor<B, 1>>,
    eps:   f64,
}

impl<B: Backend> LayerNormalization<B> {
    pub const DEFAULT_EPS: f64 = 1e-6;

    pub fn new(features: usize, device: &B::Device) -> Self {
        Self {
            alpha: Initializer::Ones.init([features], device),
            bias:  Initializer::Zeros.init([features], device),
            eps:   Self::DEFAULT_EPS,
        }
    }

    /// alpha · (x − mean) / (std + eps) + bias, over the last axis.
    /// eps is added to the standard deviation, not the variance.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let mean = x.clone().mean_dim(2);
        let std  = x.clone().var(2).sqrt();

        let normed = (x - mean).div(std.add_scalar(self.eps));
        normed * self.alpha.val().unsqueeze::<3>() + self.bias.val().unsqueeze::<3>()
    }
}

// ─── Feed-Forward ─────────────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct FeedForwardBlock<B: Backend> {
    linear_1: Linear<B>,
    linear_2: Linear<B>,
    dropout:  Dropout,
}

impl<B: Backend> FeedForwardBlock<B> {
    pub fn new(d_model: usize, d_ff: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            linear_1: LinearConfig::new(d_model, d_ff)
                .with_initializer(xavier_uniform())
                .init(device),
            linear_2: LinearConfig::new(d_ff, d_model)
                .with_initializer(xavier_uniform())
                .init(device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    /// Position-wise; positions never mix.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self.dropout.forward(relu(self.linear_1.forward(x)));
        self.linear_2.forward(hidden)
    }
}

// ─── Residual Connection ──────────────────────────────────────────────────────

/// The transform a residual connection wraps.
///
/// Encoder blocks use `SelfAttention` + `FeedForward`; decoder blocks
/// add `CrossAttention` over the encoder output.
pub enum Sublayer<'a, B: Backend> {
    SelfAttention {
        attention: &'a MultiHeadAttentionBlock<B>,
        mask:      Option<Tensor<B, 4, Bool>>,
    },
    CrossAttention {
        attention: &'a MultiHeadAttentionBlock<B>,
        memory:    Tensor<B, 3>,
        mask:      Option<Tensor<B, 4, Bool>>,
    },
    FeedForward(&'a FeedForwardBlock<B>),
}

impl<B: Backend> Sublayer<'_, B> {
    pub fn apply(self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            Sublayer::SelfAttention { attention, mask } => {
                attention.forward(x.clone(), x.clone(), x, mask).context
            }
            Sublayer::CrossAttention { attention, memory, mask } => {
                attention.forward(x, memory.clone(), memory, mask).context
            }
            Sublayer::FeedForward(block) => block.forward(x),
        }
    }
}

#[derive(Module, Debug)]
pub struct ResidualConnection<B: Backend> {
    norm:    LayerNormalization<B>,
    dropout: Dropout,
}

impl<B: Backend> ResidualConnection<B> {
    pub fn new(d_model: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            norm:    LayerNormalization::new(d_model, device),
            dropout: DropoutConfig::new(dropout).init(),
        }
    }

    /// Pre-norm: x + dropout(sublayer(norm(x)))
    pub fn forward(&self, x: Tensor<B, 3>, sublayer: Sublayer<'_, B>) -> Tensor<B, 3> {
        let out = sublayer.apply(self.norm.forward(x.clone()));
        x + self.dropout.forward(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::attention::MultiHeadAttentionBlockConfig;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_positional_table_is_deterministic() {
        let a = sinusoidal_table(50, 16);
        let b = sinusoidal_table(50, 16);
        assert_eq!(a.len(), 50 * 16);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_positional_row_zero_alternates_zero_one() {
        let table = sinusoidal_table(4, 8);
        assert_eq!(&table[..8], &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_positional_pairs_share_frequency() {
        // dims 2i and 2i+1 use the same angle: sin² + cos² = 1
        let d_model = 6;
        let table = sinusoidal_table(10, d_model);
        for row in table.chunks(d_model) {
            for pair in row.chunks(2) {
                let norm = pair[0] * pair[0] + pair[1] * pair[1];
                assert!((norm - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_positional_forward_adds_prefix_of_table() {
        let device = Default::default();
        let pe = PositionalEncoding::<TestBackend>::new(10, 4, 0.0, &device);
        assert_eq!(pe.max_len(), 10);

        let out = pe.forward(Tensor::zeros([1, 3, 4], &device));
        let values = out.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_eq!(values, sinusoidal_table(3, 4));
    }

    #[test]
    fn test_embeddings_are_scaled() {
        let device = Default::default();
        let emb = InputEmbeddings::<TestBackend>::new(20, 16, &device);
        let ids = Tensor::<TestBackend, 2, Int>::from_ints([[1, 2, 3]], &device);

        let raw = emb.embedding.forward(ids.clone());
        let scaled = emb.forward(ids);
        assert_eq!(scaled.dims(), [1, 3, 16]);

        let diff = (scaled - raw.mul_scalar(4.0)).abs().max().into_scalar();
        assert!(diff < 1e-5);
    }

    #[test]
    fn test_embedding_weights_use_xavier_bound() {
        let device = Default::default();
        let emb = InputEmbeddings::<TestBackend>::new(20, 16, &device);
        let weights = emb.embedding.weight.val();
        assert_eq!(weights.dims(), [20, 16]);

        let bound = (6.0f32 / (20 + 16) as f32).sqrt();
        let values = weights.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.abs() <= bound + 1e-6));
        assert!(values.iter().any(|v| *v != 0.0));
    }

    #[test]
    fn test_layer_norm_centres_each_position() {
        let device = Default::default();
        let norm = LayerNormalization::<TestBackend>::new(8, &device);
        let x = Tensor::<TestBackend, 3>::random([2, 3, 8], Distribution::Normal(5.0, 3.0), &device);

        let out = norm.forward(x);
        let means = out.mean_dim(2).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!(means.iter().all(|m| m.abs() < 1e-4));
    }

    #[test]
    fn test_layer_norm_constant_input_stays_finite() {
        // std = 0 → eps keeps the division defined
        let device = Default::default();
        let norm = LayerNormalization::<TestBackend>::new(4, &device);
        let out = norm.forward(Tensor::ones([1, 2, 4], &device));
        let values = out.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_residual_preserves_shape() {
        let device = Default::default();
        let residual = ResidualConnection::<TestBackend>::new(16, 0.1, &device);
        let ff = FeedForwardBlock::new(16, 32, 0.1, &device);
        let mha = MultiHeadAttentionBlockConfig::new(16, 2).init(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([3, 5, 16], Distribution::Default, &device);

        let out = residual.forward(x.clone(), Sublayer::FeedForward(&ff));
        assert_eq!(out.dims(), [3, 5, 16]);

        let out = residual.forward(x, Sublayer::SelfAttention { attention: &mha, mask: None });
        assert_eq!(out.dims(), [3, 5, 16]);
    }
}
