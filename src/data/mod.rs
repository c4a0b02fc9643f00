// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a parallel-corpus file to tensor batches:
//
//   corpus.jsonl
//       │
//       ▼
//   JsonlCorpus          → reads aligned sentence pairs
//       │
//       ▼
//   Tokenizer (infra)    → sentence → token ids
//       │
//       ▼
//   TranslationDataset   → [SOS]/[EOS]/[PAD] framing, Burn Dataset
//       │
//       ▼
//   TranslationBatcher   → stacks samples, builds attention masks
//       │
//       ▼
//   DataLoader           → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads aligned sentence pairs from a JSONL corpus
pub mod loader;

/// Frames token ids into encoder/decoder inputs and labels
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
