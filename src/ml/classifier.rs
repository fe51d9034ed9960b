// ============================================================
// Layer 5 — Burn Adapters
// ============================================================
// Plugs the Burn CNN into the framework-agnostic Network and
// Optimizer traits that the Trainer drives.
//
// One training step, as the Trainer sees it:
//
//   net.zero_grads()          → drop stale loss / gradients
//   net.forward(.., Train)    → autodiff graph + CE loss, loss kept
//   net.backward()            → loss.backward() → GradientsParams
//   optimizer.update(&mut net)→ Burn optimizer step on the model
//
// Evaluation runs on model.valid(): the same weights on the
// inner (non-autodiff) backend, so no graph is recorded and
// dropout is disabled. That copy is cached and refreshed after
// every weight update.
//
// Reference: Burn Book §5 (Training, Autodiff)
//            Kingma & Ba (2015) Adam

use anyhow::{ensure, Context, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{momentum::MomentumConfig, AdamConfig, GradientsParams, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use ndarray::ArrayView4;

use crate::data::batcher::ImageBatcher;
use crate::domain::{
    metrics::Metrics,
    traits::{Mode, Network, Optimizer},
};
use crate::ml::model::Cnn;

// ─── BurnClassifier ──────────────────────────────────────────────────────────
/// A `Cnn` on an autodiff backend, exposed as a `Network`.
pub struct BurnClassifier<B: AutodiffBackend> {
    model:        Cnn<B>,
    batcher:      ImageBatcher<B>,
    eval_batcher: ImageBatcher<B::InnerBackend>,

    /// Loss of the last training forward pass, waiting for backward()
    pending_loss: Option<Tensor<B, 1>>,

    /// Gradients from the last backward(), waiting for the optimizer
    grads: Option<GradientsParams>,

    /// Inference copy of `model`, rebuilt lazily after each update
    eval_model: Option<Cnn<B::InnerBackend>>,
}

impl<B: AutodiffBackend> BurnClassifier<B> {
    pub fn new(model: Cnn<B>, device: B::Device) -> Self {
        Self {
            model,
            batcher:      ImageBatcher::new(device.clone()),
            eval_batcher: ImageBatcher::new(device),
            pending_loss: None,
            grads:        None,
            eval_model:   None,
        }
    }

    pub fn model(&self) -> &Cnn<B> {
        &self.model
    }

    /// Hand the stored gradients to an optimizer (leaves None behind).
    pub fn take_gradients(&mut self) -> Option<GradientsParams> {
        self.grads.take()
    }

    /// Replace the model with `step(model)` and invalidate the eval copy.
    pub fn replace_model(&mut self, step: impl FnOnce(Cnn<B>) -> Cnn<B>) {
        self.model      = step(self.model.clone());
        self.eval_model = None;
    }
}

impl<B: AutodiffBackend> Network for BurnClassifier<B> {
    fn zero_grads(&mut self) {
        self.pending_loss = None;
        self.grads        = None;
    }

    fn forward(
        &mut self,
        images: ArrayView4<'_, f32>,
        labels: &[usize],
        mode:   Mode,
    ) -> Result<Metrics> {
        ensure!(
            images.dim().0 == labels.len(),
            "batch has {} images but {} labels",
            images.dim().0,
            labels.len()
        );

        match mode {
            Mode::Train => {
                let batch            = self.batcher.batch(images, labels);
                let logits           = self.model.forward(batch.images);
                let (loss, accuracy) = score(logits, batch.targets);
                let loss_value: f64  = loss.clone().into_scalar().elem::<f64>();
                self.pending_loss    = Some(loss);
                Ok(Metrics::new(loss_value, accuracy))
            }
            Mode::Eval => {
                let model            = self.eval_model.get_or_insert_with(|| self.model.valid());
                let batch            = self.eval_batcher.batch(images, labels);
                let logits           = model.forward(batch.images);
                let (loss, accuracy) = score(logits, batch.targets);
                Ok(Metrics::new(loss.into_scalar().elem::<f64>(), accuracy))
            }
        }
    }

    fn backward(&mut self) -> Result<()> {
        let loss = self
            .pending_loss
            .take()
            .context("backward() called without a training forward pass")?;
        let grads  = loss.backward();
        self.grads = Some(GradientsParams::from_grads(grads, &self.model));
        Ok(())
    }
}

/// Softmax cross-entropy and the fraction of argmax hits.
fn score<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> (Tensor<B, 1>, f64) {
    let n  = targets.dims()[0];
    let ce = CrossEntropyLossConfig::new().init(&logits.device());
    let loss = ce.forward(logits.clone(), targets.clone());

    // argmax(1) returns shape [batch, 1] — squeeze to [batch]
    let correct: i64 = logits
        .argmax(1)
        .flatten::<1>(0, 1)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();

    (loss, correct as f64 / n.max(1) as f64)
}

// ─── BurnOptimizer ───────────────────────────────────────────────────────────
/// Any Burn optimizer for `Cnn<B>` plus the learning rate it steps with.
pub struct BurnOptimizer<O> {
    inner: O,
    lr:    f64,
}

impl<O> BurnOptimizer<O> {
    pub fn new(inner: O, lr: f64) -> Self {
        Self { inner, lr }
    }
}

impl<B, O> Optimizer<BurnClassifier<B>> for BurnOptimizer<O>
where
    B: AutodiffBackend,
    O: burn::optim::Optimizer<Cnn<B>, B>,
{
    fn update(&mut self, net: &mut BurnClassifier<B>) -> Result<()> {
        let grads = net
            .take_gradients()
            .context("update() called before backward()")?;
        let lr = self.lr;
        net.replace_model(|model| self.inner.step(lr, model, grads));
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}

/// Adam with Burn's defaults (β1 = 0.9, β2 = 0.999).
pub fn adam<B: AutodiffBackend>(lr: f64) -> BurnOptimizer<impl burn::optim::Optimizer<Cnn<B>, B>> {
    BurnOptimizer::new(AdamConfig::new().with_epsilon(1e-8).init::<B, Cnn<B>>(), lr)
}

/// SGD with classical (undampened) momentum.
pub fn momentum_sgd<B: AutodiffBackend>(
    lr:       f64,
    momentum: f64,
) -> BurnOptimizer<impl burn::optim::Optimizer<Cnn<B>, B>> {
    let momentum = MomentumConfig::new()
        .with_momentum(momentum)
        .with_dampening(0.0);
    let sgd = SgdConfig::new()
        .with_momentum(Some(momentum))
        .init::<B, Cnn<B>>();
    BurnOptimizer::new(sgd, lr)
}
