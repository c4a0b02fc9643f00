// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Two conditions are checked explicitly:
//
//   1. ModelError — the model dimension does not split evenly
//      across attention heads. Raised once at construction.
//
//   2. DataError  — a tokenised sentence does not fit in the
//      configured sequence length once the special tokens are
//      added. Raised per example; callers skip or abort.
//
// Every other numerical edge case is absorbed by the masking
// guard in attention rather than reported.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("d_model ({d_model}) is not divisible by num_heads ({num_heads})")]
    HeadsMismatch { d_model: usize, num_heads: usize },

    #[error("num_heads must be at least 1")]
    NoHeads,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("{side} sentence is too long: {tokens} tokens + {reserved} special > seq_len {seq_len}")]
    SequenceTooLong {
        side:     &'static str,
        tokens:   usize,
        reserved: usize,
        seq_len:  usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_numbers() {
        let e = ModelError::HeadsMismatch { d_model: 10, num_heads: 3 };
        assert_eq!(e.to_string(), "d_model (10) is not divisible by num_heads (3)");

        let e = DataError::SequenceTooLong { side: "source", tokens: 9, reserved: 2, seq_len: 10 };
        assert!(e.to_string().contains("source sentence is too long"));
    }
}
