// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores training state using Burn's CompactRecorder.
//
// What gets saved per epoch:
//   1. model_epoch_{n}.mpk.gz  — all learned parameters
//   2. optim_epoch_{n}.mpk.gz  — Adam moment estimates
//   3. state_epoch_{n}.json    — epoch number and global step
//   4. latest_epoch.json       — which epoch was last saved
//
// And once per run:
//   train_config.json — hyperparameters needed to rebuild the
//                       model before weights can be loaded into it
//
// Resuming restores weights, optimiser and step counter. The RNG
// state is not captured, so a resumed run is not bit-identical to
// an uninterrupted one.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::Transformer;

/// Counters restored when training resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrainingState {
    /// Last completed epoch (1-based)
    pub epoch: usize,

    /// Number of optimiser steps taken so far
    pub global_step: usize,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            bail!("Checkpoint dir '{}' does not exist. Have you run 'train' first?", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    fn optim_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("optim_epoch_{epoch}"))
    }

    fn state_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("state_epoch_{epoch}.json"))
    }

    /// Save weights, optimiser state and counters for `state.epoch`.
    pub fn save<B, O>(&self, model: &Transformer<B>, optim: &O, state: TrainingState) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<Transformer<B>, B>,
        Transformer<B>: AutodiffModule<B>,
    {
        let recorder = CompactRecorder::new();

        let path = self.model_path(state.epoch);
        Recorder::<B>::record(&recorder, model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        let path = self.optim_path(state.epoch);
        Recorder::<B>::record(&recorder, optim.to_record(), path.clone())
            .with_context(|| format!("Failed to save optimiser to '{}'", path.display()))?;

        fs::write(self.state_path(state.epoch), serde_json::to_string(&state)?)
            .with_context(|| "Failed to write training state")?;

        fs::write(self.dir.join("latest_epoch.json"), serde_json::to_string(&state.epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {} step {}", state.epoch, state.global_step);
        Ok(())
    }

    /// Load weights saved for `epoch` into an already-built model.
    pub fn load_model<B: Backend>(
        &self,
        model:  Transformer<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<Transformer<B>> {
        let path = self.model_path(epoch);
        tracing::info!("Loading model weights from epoch {}", epoch);

        let record = Recorder::<B>::load(&CompactRecorder::new(), path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;
        Ok(model.load_record(record))
    }

    /// Load weights from the most recent epoch.
    pub fn load_latest_model<B: Backend>(
        &self,
        model:  Transformer<B>,
        device: &B::Device,
    ) -> Result<Transformer<B>> {
        let epoch = self.latest_epoch()?;
        self.load_model(model, epoch, device)
    }

    /// Restore optimiser state saved for `epoch`.
    pub fn load_optimizer<B, O>(&self, optim: O, epoch: usize, device: &B::Device) -> Result<O>
    where
        B: AutodiffBackend,
        O: Optimizer<Transformer<B>, B>,
        Transformer<B>: AutodiffModule<B>,
    {
        let path = self.optim_path(epoch);
        let record = Recorder::<B>::load(&CompactRecorder::new(), path.clone(), device)
            .with_context(|| format!("Cannot load optimiser state '{}'", path.display()))?;
        Ok(optim.load_record(record))
    }

    pub fn load_state(&self, epoch: usize) -> Result<TrainingState> {
        let path = self.state_path(epoch);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read training state '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Turn a `preload` setting into the epoch to resume from.
    ///
    ///   "latest" → last saved epoch, or None when nothing was saved
    ///   "<n>"    → epoch n
    pub fn resolve_preload(&self, preload: &str) -> Result<Option<usize>> {
        if preload == "latest" {
            return Ok(self.latest_epoch().ok());
        }
        let epoch = preload
            .parse::<usize>()
            .with_context(|| format!("preload must be 'latest' or an epoch number, got '{preload}'"))?;
        Ok(Some(epoch))
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json and return the epoch number.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'latest_epoch.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
