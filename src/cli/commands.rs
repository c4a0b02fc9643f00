// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `translate` and `attend`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the translation model on a JSONL parallel corpus
    Train(TrainArgs),

    /// Translate a sentence using the latest checkpoint
    Translate(TranslateArgs),

    /// Print raw self-attention weights over pretrained word vectors
    Attend(AttendArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSONL corpus, one {"translation": {lang: text, ...}} record per line
    #[arg(long, default_value = "data/opus_books_en_it.jsonl")]
    pub corpus: String,

    /// Directory for checkpoints, tokenizers and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "en")]
    pub lang_src: String,

    #[arg(long, default_value = "it")]
    pub lang_tgt: String,

    /// Fixed sequence length for both encoder and decoder,
    /// including [SOS]/[EOS] and padding
    #[arg(long, default_value_t = 350)]
    pub seq_len: usize,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Model width; must be divisible by num_heads
    #[arg(long, default_value_t = 512)]
    pub d_model: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    /// Inner width of the feed-forward blocks
    #[arg(long, default_value_t = 2048)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Resume from "latest" or from an epoch number
    #[arg(long)]
    pub preload: Option<String>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Validation sentences decoded and printed each epoch
    #[arg(long, default_value_t = 2)]
    pub val_examples: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_path:    a.corpus,
            checkpoint_dir: a.checkpoint_dir,
            lang_src:       a.lang_src,
            lang_tgt:       a.lang_tgt,
            seq_len:        a.seq_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            d_model:        a.d_model,
            num_layers:     a.num_layers,
            num_heads:      a.num_heads,
            d_ff:           a.d_ff,
            dropout:        a.dropout,
            preload:        a.preload,
            seed:           a.seed,
            val_examples:   a.val_examples,
        }
    }
}

/// All arguments for the `translate` command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// The sentence to translate
    #[arg(long)]
    pub text: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

/// All arguments for the `attend` command
#[derive(Args, Debug)]
pub struct AttendArgs {
    /// Sentence whose words attend to each other
    #[arg(long)]
    pub text: String,

    /// GloVe-format text file of word vectors
    #[arg(long, default_value = "data/glove.6B.50d.txt")]
    pub vectors: String,
}
