// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   checkpoint.rs      — model/optimiser records, training state,
//                        config JSON, resume resolution
//   tokenizer_store.rs — per-language word-level tokenizers
//   metrics.rs         — CER/WER and the per-epoch CSV log
//   word_vectors.rs    — GloVe text-format embeddings for the
//                        attention exercise
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Error rates and training metrics CSV logger
pub mod metrics;

/// Pretrained word-vector loader
pub mod word_vectors;
