// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`     — trains the translator on a parallel corpus
//   2. `translate` — greedy-translates one sentence
//   3. `attend`    — prints attention weights over word vectors
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{AttendArgs, Commands, TrainArgs, TranslateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "transformer-translate",
    version = "0.1.0",
    about = "Train an encoder-decoder transformer for translation, then translate sentences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Translate(args) => run_translate(args),
            Commands::Attend(args)    => run_attend(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus: {}", args.corpus);

    let state = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Training complete after epoch {} ({} steps). Checkpoint saved.",
        state.epoch, state.global_step
    );
    Ok(())
}

fn run_translate(args: TranslateArgs) -> Result<()> {
    use crate::application::translate_use_case::TranslateUseCase;

    let use_case = TranslateUseCase::new(&args.checkpoint_dir)?;
    let output = use_case.translate(&args.text)?;
    println!("\n{}", output);
    Ok(())
}

fn run_attend(args: AttendArgs) -> Result<()> {
    use crate::application::attend_use_case::AttendUseCase;

    let use_case = AttendUseCase::new(&args.vectors)?;
    let matrix = use_case.attend(&args.text)?;
    println!("\n{}", matrix.render());
    Ok(())
}
