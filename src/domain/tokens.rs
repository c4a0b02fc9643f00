// ============================================================
// Layer 3 — Special Tokens
// ============================================================
// Every vocabulary reserves four ids ahead of the real words:
//
//   [UNK] = 0   unknown word
//   [PAD] = 1   padding up to seq_len
//   [SOS] = 2   start of sentence
//   [EOS] = 3   end of sentence
//
// The ids are resolved from the tokenizer at runtime rather than
// hard-coded at every use site, but the tokenizer store writes them
// in exactly this order.

pub const UNK_TOKEN: &str = "[UNK]";
pub const PAD_TOKEN: &str = "[PAD]";
pub const SOS_TOKEN: &str = "[SOS]";
pub const EOS_TOKEN: &str = "[EOS]";

/// Special tokens in id order.
pub const SPECIAL_TOKENS: [&str; 4] = [UNK_TOKEN, PAD_TOKEN, SOS_TOKEN, EOS_TOKEN];

/// Resolved ids of the reserved tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub unk: u32,
    pub pad: u32,
    pub sos: u32,
    pub eos: u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self { unk: 0, pad: 1, sos: 2, eos: 3 }
    }
}

impl SpecialTokens {
    /// Number of slots the encoder input spends on markers ([SOS] + [EOS])
    pub const ENCODER_RESERVED: usize = 2;

    /// Number of slots the decoder input spends on markers ([SOS] only;
    /// the label carries [EOS] instead)
    pub const DECODER_RESERVED: usize = 1;
}
