// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model code: the encoder-decoder
// transformer, its masks, greedy decoding, the training loop
// and the translator built on a checkpoint.
//
//   layers.rs     — embeddings, sinusoidal positions, layer norm,
//                   feed-forward, residual connections
//   attention.rs  — scaled dot-product + multi-head attention
//   encoder.rs    — encoder block and stack
//   decoder.rs    — decoder block (self + cross attention) and stack
//   mask.rs       — padding / causal masks (true = visible)
//   model.rs      — Transformer: encode, decode, project
//   decode.rs     — greedy decoding
//   trainer.rs    — teacher-forced training with validation
//   translator.rs — inference from the latest checkpoint
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod layers;
pub mod attention;
pub mod encoder;
pub mod decoder;
pub mod mask;
pub mod model;
pub mod decode;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Loads a checkpoint and translates sentences
pub mod translator;
