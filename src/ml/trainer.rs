// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Teacher-forced training with Adam and label-smoothed
// cross-entropy, followed each epoch by greedy-decoding
// validation and a checkpoint.
//
//   Training uses B = Autodiff<Wgpu> for gradients
//   model.valid() returns the model on B::InnerBackend (no
//   autodiff, dropout disabled) for validation
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use tokenizers::Tokenizer;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TranslationBatch, TranslationBatcher},
    dataset::{TranslationDataset, TranslationSample},
};
use crate::domain::tokens::SpecialTokens;
use crate::infra::{
    checkpoint::{CheckpointManager, TrainingState},
    metrics::{EpochMetrics, ErrorRates, MetricsLogger},
};
use crate::ml::{
    decode::{greedy_decode, ids_tensor},
    mask::encoder_mask_tensor,
    model::Transformer,
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Label smoothing applied to the target distribution
pub const LABEL_SMOOTHING: f32 = 0.1;

/// Everything the loop needs besides the config.
pub struct TrainingData {
    pub train:          TranslationDataset,
    pub val:            Vec<TranslationSample>,
    pub src_vocab_size: usize,
    pub tgt_vocab_size: usize,
    pub tokens:         SpecialTokens,
    pub tgt_tokenizer:  Tokenizer,
}

pub fn run_training(
    cfg:          &TrainConfig,
    data:         TrainingData,
    ckpt_manager: CheckpointManager,
    metrics:      MetricsLogger,
) -> Result<TrainingState> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, data, &ckpt_manager, &metrics, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    data:         TrainingData,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       B::Device,
) -> Result<TrainingState>
where
    B::InnerBackend: Backend<Device = B::Device>,
{
    B::seed(cfg.seed);

    // ── Build model + optimiser ───────────────────────────────────────────────
    let model_cfg = cfg.model_config(data.src_vocab_size, data.tgt_vocab_size);
    let mut model: Transformer<B> = model_cfg.init(&device)?;
    let mut optim = AdamConfig::new()
        .with_epsilon(1e-9)
        .init::<B, Transformer<B>>();
    let mut state = TrainingState::default();
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} parameters",
        cfg.num_layers, cfg.d_model, model.num_params()
    );

    // ── Optional resume ───────────────────────────────────────────────────────
    let preload = match cfg.preload.as_deref() {
        Some(p) => ckpt_manager.resolve_preload(p)?,
        None    => None,
    };
    match preload {
        Some(epoch) => {
            tracing::info!("Resuming from epoch {}", epoch);
            model = ckpt_manager.load_model(model, epoch, &device)?;
            optim = ckpt_manager.load_optimizer::<B, _>(optim, epoch, &device)?;
            state = ckpt_manager.load_state(epoch)?;
        }
        None => tracing::info!("No checkpoint to preload, starting from scratch"),
    }

    // ── Data loader + loss ────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(TranslationBatcher::<B>::new(device.clone(), data.tokens.pad))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(data.train);

    let loss_fn = loss_function::<B>(data.tokens.pad, &device);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in (state.epoch + 1)..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = translation_loss(&model, &loss_fn, batch);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val;
            batches  += 1;
            state.global_step += 1;
            tracing::debug!("epoch {:02} step {} loss={:6.3}", epoch, state.global_step, loss_val);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }
        state.epoch = epoch;

        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };

        // ── Validation (inner backend, dropout off) ───────────────────────────
        let rates = run_validation(
            &model.valid(),
            &data.val,
            &data.tgt_tokenizer,
            data.tokens,
            cfg.seq_len,
            cfg.val_examples,
            &device,
        )?;

        println!(
            "Epoch {:>3}/{} | step={} | train_loss={:.4} | val_cer={:.4} | val_wer={:.4}",
            epoch, cfg.epochs, state.global_step, train_loss, rates.cer(), rates.wer(),
        );

        metrics.log(&EpochMetrics {
            epoch,
            global_step: state.global_step,
            train_loss,
            val_cer: rates.cer(),
            val_wer: rates.wer(),
        })?;

        ckpt_manager.save(&model, &optim, state)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(state)
}

/// Cross-entropy over the target vocabulary, ignoring [PAD] labels.
pub fn loss_function<B: Backend>(pad: u32, device: &B::Device) -> CrossEntropyLoss<B> {
    CrossEntropyLossConfig::new()
        .with_pad_tokens(Some(vec![pad as usize]))
        .with_smoothing(Some(LABEL_SMOOTHING))
        .init(device)
}

/// Teacher-forced loss for one batch: encode → decode → project, then
/// flatten [batch, seq_len, vocab] against the [batch, seq_len] labels.
pub fn translation_loss<B: Backend>(
    model:   &Transformer<B>,
    loss_fn: &CrossEntropyLoss<B>,
    batch:   TranslationBatch<B>,
) -> Tensor<B, 1> {
    let memory = model.encode(batch.encoder_input, batch.encoder_mask.clone());
    let state = model.decode(memory, batch.encoder_mask, batch.decoder_input, batch.decoder_mask);
    let log_probs = model.project(state);

    let [batch_size, seq_len, vocab] = log_probs.dims();
    loss_fn.forward(
        log_probs.reshape([batch_size * seq_len, vocab]),
        batch.label.reshape([batch_size * seq_len]),
    )
}

/// Greedy-translate up to `max_examples` validation samples, print them,
/// and accumulate CER/WER against the references.
pub fn run_validation<B: Backend>(
    model:        &Transformer<B>,
    samples:      &[TranslationSample],
    tgt_tokenizer: &Tokenizer,
    tokens:       SpecialTokens,
    seq_len:      usize,
    max_examples: usize,
    device:       &B::Device,
) -> Result<ErrorRates> {
    let mut rates = ErrorRates::new();

    for sample in samples.iter().take(max_examples) {
        let source = ids_tensor::<B>(&sample.encoder_input, device);
        let mask   = encoder_mask_tensor(&[sample.encoder_input.clone()], tokens.pad, device);

        let ids = greedy_decode(model, source, mask, tokens.sos, tokens.eos, seq_len, device);
        let predicted = tgt_tokenizer
            .decode(&ids, true)
            .map_err(|e| anyhow::anyhow!("Decode: {e}"))?;

        println!("{:-<80}", "");
        println!("{:>12}{}", "SOURCE: ", sample.src_text);
        println!("{:>12}{}", "TARGET: ", sample.tgt_text);
        println!("{:>12}{}", "PREDICTED: ", predicted);

        rates.update(&predicted, &sample.tgt_text)?;
    }

    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::build_sample;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray>;

    fn tiny_model(device: &<TestBackend as Backend>::Device) -> Transformer<TestBackend> {
        crate::ml::model::TransformerConfig::new(10, 10, 6, 6)
            .with_d_model(8)
            .with_num_layers(1)
            .with_num_heads(2)
            .with_d_ff(16)
            .with_dropout(0.0)
            .init(device)
            .unwrap()
    }

    fn sample(src: &[u32], tgt: &[u32]) -> TranslationSample {
        let (encoder_input, decoder_input, label) =
            build_sample(src, tgt, SpecialTokens::default(), 6).unwrap();
        TranslationSample {
            encoder_input, decoder_input, label,
            src_text: String::new(),
            tgt_text: String::new(),
        }
    }

    #[test]
    fn test_optimiser_steps_reduce_loss_on_one_batch() {
        let device = Default::default();
        let mut model = tiny_model(&device);
        let mut optim = AdamConfig::new().init::<TestBackend, Transformer<TestBackend>>();
        let loss_fn = loss_function::<TestBackend>(1, &device);
        let batcher = TranslationBatcher::<TestBackend>::new(device, 1);
        let items = vec![sample(&[4, 5], &[6, 7]), sample(&[8], &[9])];

        let first = translation_loss(&model, &loss_fn, batcher.batch(items.clone()))
            .into_scalar()
            .elem::<f64>();
        assert!(first.is_finite());

        for _ in 0..30 {
            let loss = translation_loss(&model, &loss_fn, batcher.batch(items.clone()));
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(1e-2, model, grads);
        }

        let last = translation_loss(&model, &loss_fn, batcher.batch(items))
            .into_scalar()
            .elem::<f64>();
        assert!(last < first, "loss did not fall: {first} → {last}");
    }
}
