// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Minibatch training with optional validation and test passes.
//
// Per epoch:
//   1. Shuffle 0..N with a Fisher-Yates permutation
//   2. For every batch of the permutation (last one may be short):
//        zero grads → gather images → augment → forward(Train)
//        → backward → optimizer update
//        accumulate loss*len and acc*len
//   3. Divide the sums by N (NOT by the number of batches)
//   4. Validation pass (if given): forward(Eval) in dataset order
//   5. Test pass (if given): same, and time it
//   6. Call the user callback with the EpochStats, the network
//      and the optimizer (it may save checkpoints, log, or
//      change the learning rate)
//
// The loop only knows the Network / Optimizer traits, so the
// same code drives the Burn CNN and the scripted test doubles.
//
// Reference: Burn Book §5 (Training)
//            rand crate documentation (SliceRandom, StdRng)

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::time::Instant;

use crate::data::augment::Augmentation;
use crate::domain::{
    image_set::ImageSet,
    metrics::{EpochStats, MetricAccumulator, Metrics},
    traits::{Mode, Network, Optimizer},
};

// ─── TrainerConfig ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Number of full passes over the training set
    pub epoch_num: usize,

    /// Images per gradient step
    pub batch_size: usize,

    /// Transform applied to each training batch
    pub augmentation: Augmentation,

    /// Seed for shuffling and augmentation (None = from entropy)
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epoch_num:    100,
            batch_size:   100,
            augmentation: Augmentation::default(),
            seed:         None,
        }
    }
}

// ─── Trainer ─────────────────────────────────────────────────────────────────
/// Owns a network, its optimizer and the RNG driving shuffles/augmentation.
pub struct Trainer<N, O> {
    net:       N,
    optimizer: O,
    config:    TrainerConfig,
    rng:       StdRng,
}

impl<N, O> Trainer<N, O>
where
    N: Network,
    O: Optimizer<N>,
{
    pub fn new(net: N, optimizer: O, config: TrainerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Self { net, optimizer, config, rng }
    }

    #[cfg(test)]
    pub fn net(&self) -> &N {
        &self.net
    }

    #[cfg(test)]
    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Train for `epoch_num` epochs without a per-epoch callback.
    #[cfg(test)]
    pub fn fit(
        &mut self,
        train: &ImageSet,
        valid: Option<&ImageSet>,
        test:  Option<&ImageSet>,
    ) -> Result<Vec<EpochStats>> {
        self.fit_with_callback(train, valid, test, |_, _, _| Ok(()))
    }

    /// Train for `epoch_num` epochs, calling `callback` after each one.
    ///
    /// Returns the statistics of every epoch. An error from the network,
    /// the optimizer or the callback stops training immediately.
    pub fn fit_with_callback<F>(
        &mut self,
        train:        &ImageSet,
        valid:        Option<&ImageSet>,
        test:         Option<&ImageSet>,
        mut callback: F,
    ) -> Result<Vec<EpochStats>>
    where
        F: FnMut(&EpochStats, &mut N, &mut O) -> Result<()>,
    {
        ensure!(self.config.batch_size > 0, "batch size must be at least 1");
        ensure!(!train.is_empty(), "training set is empty");
        ensure!(valid.map_or(true, |v| !v.is_empty()), "validation set is empty");
        ensure!(test.map_or(true, |t| !t.is_empty()), "test set is empty");

        let dims = train.image_dims();
        for (name, set) in [("validation", valid), ("test", test)] {
            if let Some(set) = set {
                ensure!(
                    set.image_dims() == dims,
                    "{name} images are {:?} but training images are {:?}",
                    set.image_dims(),
                    dims
                );
            }
        }
        let (_, h, w) = dims;
        self.config.augmentation.validate(h, w)?;

        let mut history = Vec::with_capacity(self.config.epoch_num);

        for epoch in 0..self.config.epoch_num {
            let train_metrics = self.train_epoch(train)?;

            let valid_metrics = match valid {
                Some(set) => Some(self.evaluate(set)?),
                None      => None,
            };

            let (test_metrics, test_elapsed) = match test {
                Some(set) => {
                    let started = Instant::now();
                    let metrics = self.evaluate(set)?;
                    (Some(metrics), Some(started.elapsed()))
                }
                None => (None, None),
            };

            let stats = EpochStats {
                epoch,
                train: train_metrics,
                valid: valid_metrics,
                test:  test_metrics,
                test_elapsed,
            };

            tracing::debug!(
                "epoch {} train_loss={:.4} train_acc={:.4}",
                epoch,
                stats.train.loss,
                stats.train.accuracy,
            );

            callback(&stats, &mut self.net, &mut self.optimizer)?;
            history.push(stats);
        }

        Ok(history)
    }

    /// Score `set` with the current weights (no gradient step).
    pub fn evaluate(&mut self, set: &ImageSet) -> Result<Metrics> {
        evaluate(&mut self.net, set, self.config.batch_size, &self.config.augmentation)
    }

    /// One shuffled pass over the training set.
    fn train_epoch(&mut self, train: &ImageSet) -> Result<Metrics> {
        let mut perm: Vec<usize> = (0..train.len()).collect();
        perm.shuffle(&mut self.rng);

        let mut acc = MetricAccumulator::new();

        for batch_index in perm.chunks(self.config.batch_size) {
            self.net.zero_grads();

            let batch  = train.select(batch_index);
            let images = self.config.augmentation.apply(batch.images(), &mut self.rng);

            let metrics = self.net.forward(images.view(), batch.labels(), Mode::Train)?;
            self.net.backward()?;
            self.optimizer.update(&mut self.net)?;

            acc.add(metrics, batch_index.len());
        }

        acc.average_over(train.len())
    }
}

/// Forward-only pass over `set` in dataset order, weighted by batch size.
///
/// `augmentation` is the TRAINING policy; its evaluation counterpart
/// (`Augmentation::for_evaluation`) is what gets applied.
pub fn evaluate<N: Network>(
    net:          &mut N,
    set:          &ImageSet,
    batch_size:   usize,
    augmentation: &Augmentation,
) -> Result<Metrics> {
    ensure!(batch_size > 0, "batch size must be at least 1");
    ensure!(!set.is_empty(), "cannot evaluate an empty image set");

    let mut acc = MetricAccumulator::new();

    for start in (0..set.len()).step_by(batch_size) {
        let end              = (start + batch_size).min(set.len());
        let (images, labels) = set.slice(start..end);
        let images           = augmentation.apply_eval(images);

        let metrics = net.forward(images.view(), labels, Mode::Eval)?;
        acc.add(metrics, end - start);
    }

    acc.average_over(set.len())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, bail};
    use ndarray::{Array4, ArrayView4};

    /// Records every call and scores batches deterministically:
    ///   loss     = batch length
    ///   accuracy = fraction of even labels in the batch
    #[derive(Default)]
    struct ScriptedNet {
        calls:        Vec<&'static str>,
        train_labels: Vec<Vec<usize>>,
        eval_labels:  Vec<Vec<usize>>,
        image_dims:   Vec<(usize, usize, usize, usize)>,
        has_loss:     bool,
        has_grads:    bool,
        updates:      usize,
    }

    impl Network for ScriptedNet {
        fn zero_grads(&mut self) {
            self.calls.push("zero");
            self.has_loss  = false;
            self.has_grads = false;
        }

        fn forward(
            &mut self,
            images: ArrayView4<'_, f32>,
            labels: &[usize],
            mode:   Mode,
        ) -> Result<Metrics> {
            self.image_dims.push(images.dim());
            match mode {
                Mode::Train => {
                    self.calls.push("forward");
                    self.has_loss = true;
                    self.train_labels.push(labels.to_vec());
                }
                Mode::Eval => {
                    self.calls.push("eval");
                    self.eval_labels.push(labels.to_vec());
                }
            }
            let even = labels.iter().filter(|&&l| l % 2 == 0).count();
            Ok(Metrics::new(labels.len() as f64, even as f64 / labels.len() as f64))
        }

        fn backward(&mut self) -> Result<()> {
            if !self.has_loss {
                bail!("no loss to back-propagate");
            }
            self.calls.push("backward");
            self.has_grads = true;
            Ok(())
        }
    }

    struct ScriptedOpt {
        lr: f64,
    }

    impl Optimizer<ScriptedNet> for ScriptedOpt {
        fn update(&mut self, net: &mut ScriptedNet) -> Result<()> {
            if !net.has_grads {
                bail!("no gradients");
            }
            net.calls.push("update");
            net.updates += 1;
            Ok(())
        }

        fn learning_rate(&self) -> f64 {
            self.lr
        }

        fn set_learning_rate(&mut self, lr: f64) {
            self.lr = lr;
        }
    }

    /// n images of 3×32×32, label i for image i
    fn labelled_set(n: usize) -> ImageSet {
        let images = Array4::from_shape_fn((n, 3, 32, 32), |(i, _, _, _)| i as f32);
        ImageSet::new(images, (0..n).collect()).unwrap()
    }

    fn trainer(epochs: usize, batch_size: usize, augmentation: Augmentation) -> Trainer<ScriptedNet, ScriptedOpt> {
        let config = TrainerConfig { epoch_num: epochs, batch_size, augmentation, seed: Some(7) };
        Trainer::new(ScriptedNet::default(), ScriptedOpt { lr: 0.1 }, config)
    }

    #[test]
    fn test_ten_images_batch_four_gives_4_4_2_and_weighted_loss() {
        let mut t   = trainer(1, 4, Augmentation::Identity);
        let history = t.fit(&labelled_set(10), None, None).unwrap();

        let sizes: Vec<usize> = t.net().train_labels.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        // loss per batch = its length → (4*4 + 4*4 + 2*2) / 10
        assert!((history[0].train.loss - 3.6).abs() < 1e-12);
        // weighted mean of per-batch even fractions = overall even fraction
        assert!((history[0].train.accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_every_index_visited_once_per_epoch() {
        let mut t = trainer(3, 3, Augmentation::default());
        t.fit(&labelled_set(11), None, None).unwrap();

        let seen: Vec<usize> = t.net().train_labels.iter().flatten().copied().collect();
        assert_eq!(seen.len(), 33);
        for epoch in seen.chunks(11) {
            let mut epoch = epoch.to_vec();
            epoch.sort_unstable();
            assert_eq!(epoch, (0..11).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_step_order_is_zero_forward_backward_update() {
        let mut t = trainer(1, 5, Augmentation::Identity);
        t.fit(&labelled_set(10), None, None).unwrap();
        assert_eq!(
            t.net().calls,
            vec!["zero", "forward", "backward", "update", "zero", "forward", "backward", "update"]
        );
    }

    #[test]
    fn test_evaluation_runs_in_order_without_updates() {
        let mut t  = trainer(2, 4, Augmentation::default());
        let valid  = labelled_set(6);
        let test   = labelled_set(5);
        let history = t.fit(&labelled_set(8), Some(&valid), Some(&test)).unwrap();

        // 2 epochs × 2 training batches
        assert_eq!(t.net().updates, 4);
        // per epoch: valid [0..4], [4..6], then test [0..4], [4]
        assert_eq!(
            t.net().eval_labels,
            vec![
                vec![0, 1, 2, 3], vec![4, 5], vec![0, 1, 2, 3], vec![4],
                vec![0, 1, 2, 3], vec![4, 5], vec![0, 1, 2, 3], vec![4],
            ]
        );

        let valid_m = history[0].valid.unwrap();
        assert!((valid_m.loss - (4.0 * 4.0 + 2.0 * 2.0) / 6.0).abs() < 1e-12);
        assert!((valid_m.accuracy - 0.5).abs() < 1e-12);

        let test_m = history[1].test.unwrap();
        assert!((test_m.loss - (4.0 * 4.0 + 1.0) / 5.0).abs() < 1e-12);
        assert!((test_m.accuracy - 0.6).abs() < 1e-12);
        assert!(history[1].test_elapsed.is_some());
    }

    #[test]
    fn test_absent_phases_are_none() {
        let mut t   = trainer(1, 4, Augmentation::Identity);
        let history = t.fit(&labelled_set(4), None, None).unwrap();
        assert!(history[0].valid.is_none());
        assert!(history[0].test.is_none());
        assert!(history[0].test_elapsed.is_none());
        assert!(t.net().eval_labels.is_empty());
    }

    #[test]
    fn test_metrics_stay_in_range() {
        let mut t   = trainer(4, 3, Augmentation::default());
        let valid   = labelled_set(7);
        let history = t.fit(&labelled_set(10), Some(&valid), None).unwrap();
        for stats in &history {
            for m in [Some(stats.train), stats.valid].into_iter().flatten() {
                assert!(m.loss >= 0.0);
                assert!((0.0..=1.0).contains(&m.accuracy));
            }
        }
    }

    #[test]
    fn test_augmentation_shapes() {
        let mut t = trainer(1, 4, Augmentation::default());
        t.fit(&labelled_set(6), None, Some(&labelled_set(3))).unwrap();
        assert!(t.net().image_dims.iter().all(|d| d.1 == 3 && d.2 == 32 && d.3 == 32));

        // Centre crop applies to training AND evaluation batches
        let mut t = trainer(1, 4, Augmentation::CenterCrop { margin: 2 });
        t.fit(&labelled_set(6), None, Some(&labelled_set(3))).unwrap();
        assert!(t.net().image_dims.iter().all(|d| d.2 == 28 && d.3 == 28));
    }

    #[test]
    fn test_callback_runs_once_per_epoch_and_can_change_lr() {
        let mut t        = trainer(3, 4, Augmentation::Identity);
        let mut epochs   = Vec::new();
        t.fit_with_callback(&labelled_set(8), None, None, |stats, net, opt| {
            epochs.push(stats.epoch);
            assert_eq!(net.updates, 2 * (stats.epoch + 1));
            let lr = opt.learning_rate();
            opt.set_learning_rate(lr / 2.0);
            Ok(())
        })
        .unwrap();

        assert_eq!(epochs, vec![0, 1, 2]);
        assert!((t.optimizer().learning_rate() - 0.0125).abs() < 1e-12);
    }

    #[test]
    fn test_callback_error_stops_training() {
        let mut t = trainer(5, 4, Augmentation::Identity);
        let result = t.fit_with_callback(&labelled_set(4), None, None, |stats, _, _| {
            if stats.epoch == 1 {
                return Err(anyhow!("stop"));
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(t.net().updates, 2);
    }

    #[test]
    fn test_seeded_runs_shuffle_identically() {
        let mut a = trainer(2, 3, Augmentation::default());
        let mut b = trainer(2, 3, Augmentation::default());
        a.fit(&labelled_set(9), None, None).unwrap();
        b.fit(&labelled_set(9), None, None).unwrap();
        assert_eq!(a.net().train_labels, b.net().train_labels);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let empty = ImageSet::new(Array4::zeros((0, 3, 32, 32)), Vec::new()).unwrap();

        assert!(trainer(1, 4, Augmentation::Identity).fit(&empty, None, None).is_err());
        assert!(trainer(1, 0, Augmentation::Identity).fit(&labelled_set(4), None, None).is_err());
        assert!(trainer(1, 4, Augmentation::Identity)
            .fit(&labelled_set(4), Some(&empty), None)
            .is_err());
        assert!(trainer(1, 4, Augmentation::CenterCrop { margin: 16 })
            .fit(&labelled_set(4), None, None)
            .is_err());
    }

    #[test]
    fn test_evaluation_sets_must_match_training_image_size() {
        let small = ImageSet::new(Array4::zeros((2, 3, 4, 4)), vec![0, 1]).unwrap();
        let crop  = Augmentation::CenterCrop { margin: 2 };

        let mut t = trainer(1, 4, crop);
        assert!(t.fit(&labelled_set(4), Some(&small), None).is_err());
        assert!(t.net().calls.is_empty());

        let mut t = trainer(1, 4, crop);
        assert!(t.fit(&labelled_set(4), None, Some(&small)).is_err());
        assert!(t.net().calls.is_empty());
    }

    #[test]
    fn test_zero_epochs_trains_nothing() {
        let mut t   = trainer(0, 4, Augmentation::Identity);
        let history = t.fit(&labelled_set(4), None, None).unwrap();
        assert!(history.is_empty());
        assert!(t.net().calls.is_empty());
    }
}
