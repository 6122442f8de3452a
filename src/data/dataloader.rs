// Copyright (C) 2025 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Streaming loaders for the two training objectives.
//!
//! Both loaders run the same stages: resolve paths, repeat, optionally
//! shuffle, read, extract the JPEG shape, decode, augment on a worker pool,
//! stack into batches and prefetch into a bounded queue. They differ only in
//! the [`Objective`] that shapes each element and collates the batch.

use crate::core::error::{PipelineError, Result};
use crate::core::random;
use crate::core::tensor::Tensor;
use crate::data::augmentation::{build_augment, Augment, Mode};
use crate::data::image_decoder::{decode_jpeg, extract_jpeg_shape, read_file, ImageShape};
use crate::data::preprocessing::one_hot;
use crate::data::sample_list::SampleList;
use crate::data::sampler::{Sampler, SequentialSampler, ShuffleBufferSampler};
use crate::utilities::config::Configuration;
use image::RgbImage;
use rand::RngCore;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Shapes decoded images into per-element outputs and stacks them into batches.
pub trait Objective: Send + Sync + 'static {
    type Element: Send;
    type Batch: Send + 'static;

    fn preprocess(
        &self,
        image: &RgbImage,
        shape: ImageShape,
        label: i64,
        augment: &dyn Augment,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Element>;

    fn collate(&self, elements: Vec<Self::Element>) -> Result<Self::Batch>;

    fn name(&self) -> &str;
}

/// Images `[B, 3, S, S]` with one-hot labels `[B, classes]`.
#[derive(Debug, Clone)]
pub struct Batch {
    pub images: Tensor,
    pub labels: Tensor,
}

/// Two independently augmented views `[B, 3, S, S]` with labels `[B, 1]`.
#[derive(Debug, Clone)]
pub struct SupConBatch {
    pub anchor: Tensor,
    pub augmented: Tensor,
    pub labels: Tensor,
}

pub struct CrossEntropy {
    classes: usize,
}

impl CrossEntropy {
    pub fn new(classes: usize) -> Self {
        CrossEntropy { classes }
    }
}

impl Objective for CrossEntropy {
    type Element = (Tensor, Tensor);
    type Batch = Batch;

    fn preprocess(
        &self,
        image: &RgbImage,
        shape: ImageShape,
        label: i64,
        augment: &dyn Augment,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Element> {
        let view = augment.augment(image, shape, rng)?;
        let label = one_hot(label, self.classes)?;
        Ok((view, label))
    }

    fn collate(&self, elements: Vec<Self::Element>) -> Result<Batch> {
        let (images, labels): (Vec<Tensor>, Vec<Tensor>) = elements.into_iter().unzip();
        Ok(Batch {
            images: Tensor::stack(&images)?,
            labels: Tensor::stack(&labels)?,
        })
    }

    fn name(&self) -> &str {
        "cross-entropy"
    }
}

/// Views produced per element for the contrastive objective.
pub const SUPCON_VIEWS: usize = 2;

pub struct SupCon;

impl Objective for SupCon {
    type Element = ([Tensor; SUPCON_VIEWS], i64);
    type Batch = SupConBatch;

    fn preprocess(
        &self,
        image: &RgbImage,
        shape: ImageShape,
        label: i64,
        augment: &dyn Augment,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Element> {
        let anchor = augment.augment(image, shape, rng)?;
        let augmented = augment.augment(image, shape, rng)?;
        Ok(([anchor, augmented], label))
    }

    fn collate(&self, elements: Vec<Self::Element>) -> Result<SupConBatch> {
        let batch_size = elements.len();
        let mut anchors = Vec::with_capacity(batch_size);
        let mut augmented = Vec::with_capacity(batch_size);
        let mut labels = Vec::with_capacity(batch_size);

        for ([anchor, view], label) in elements {
            anchors.push(anchor);
            augmented.push(view);
            labels.push(label as f32);
        }

        Ok(SupConBatch {
            anchor: Tensor::stack(&anchors)?,
            augmented: Tensor::stack(&augmented)?,
            labels: Tensor::new(labels, vec![batch_size, 1])?,
        })
    }

    fn name(&self) -> &str {
        "supervised-contrastive"
    }
}

/// Endless iterator of prefetched batches. Yields `Err` at most once, after
/// which the stream is finished. Dropping the loader stops and joins the
/// producer thread.
pub struct DataLoader<O: Objective> {
    receiver: Receiver<Result<O::Batch>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    batch_size: usize,
    num_samples: usize,
    finished: bool,
}

/// Cross-entropy loader: `(image, one_hot(label))` per element.
pub fn dataloader(
    config: &Configuration,
    samples: &SampleList,
    mode: Mode,
    batch_size: usize,
    shuffle: bool,
) -> Result<DataLoader<CrossEntropy>> {
    DataLoader::build(
        config,
        samples,
        mode,
        batch_size,
        shuffle,
        CrossEntropy::new(config.classes),
    )
}

/// Supervised-contrastive loader: `((anchor, augmented), [label])` per element.
pub fn dataloader_supcon(
    config: &Configuration,
    samples: &SampleList,
    mode: Mode,
    batch_size: usize,
    shuffle: bool,
) -> Result<DataLoader<SupCon>> {
    DataLoader::build(config, samples, mode, batch_size, shuffle, SupCon)
}

impl<O: Objective> DataLoader<O> {
    pub fn build(
        config: &Configuration,
        samples: &SampleList,
        mode: Mode,
        batch_size: usize,
        shuffle: bool,
        objective: O,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(PipelineError::InvalidConfiguration)?;
        if samples.is_empty() {
            return Err(PipelineError::InvalidInputs(
                "cannot build a loader over an empty sample list".to_string(),
            ));
        }
        if batch_size == 0 {
            return Err(PipelineError::InvalidInputs(
                "batch size must be greater than 0".to_string(),
            ));
        }

        let num_samples = samples.len();
        // unseeded loaders draw their base seed from this thread's generator
        let seed = config.system.seed.unwrap_or_else(random::next_seed);
        let items = samples.resolve_paths(&config.data_path);
        let sampler: Box<dyn Sampler> = if shuffle {
            Box::new(ShuffleBufferSampler::new(num_samples, num_samples, Some(seed)))
        } else {
            Box::new(SequentialSampler::new(num_samples))
        };
        let augment: Arc<dyn Augment> = Arc::from(build_augment(config, mode));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.system.num_workers)
            .thread_name(|i| format!("dataloader-worker-{}", i))
            .build()?;

        let (sender, receiver) = mpsc::sync_channel(config.system.prefetch);
        let stop = Arc::new(AtomicBool::new(false));

        info!(
            "Building {} loader: {} samples, batch size {}, {} mode, augment={}, shuffle={}, workers={}, prefetch={}",
            objective.name(),
            num_samples,
            batch_size,
            mode,
            augment.name(),
            shuffle,
            config.system.num_workers,
            config.system.prefetch
        );

        let producer = Producer {
            items,
            sampler,
            augment,
            objective,
            pool,
            sender,
            stop: Arc::clone(&stop),
            batch_size,
            seed,
        };
        let handle = thread::Builder::new()
            .name("dataloader-prefetch".to_string())
            .spawn(move || producer.run())?;

        Ok(DataLoader {
            receiver,
            stop,
            handle: Some(handle),
            batch_size,
            num_samples,
            finished: false,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Batches needed to cover the sample list once.
    pub fn steps_per_epoch(&self) -> usize {
        self.num_samples.div_ceil(self.batch_size)
    }
}

impl<O: Objective> Iterator for DataLoader<O> {
    type Item = Result<O::Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.receiver.recv() {
            Ok(Ok(batch)) => Some(Ok(batch)),
            Ok(Err(e)) => {
                self.finished = true;
                Some(Err(e))
            }
            Err(_) => {
                self.finished = true;
                Some(Err(PipelineError::Disconnected(
                    "prefetch thread exited unexpectedly".to_string(),
                )))
            }
        }
    }
}

impl<O: Objective> Drop for DataLoader<O> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Free a slot so a producer blocked in send can observe the flag
        while self.receiver.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("dataloader prefetch thread panicked");
            }
        }
    }
}

struct Producer<O: Objective> {
    items: Vec<(PathBuf, i64)>,
    sampler: Box<dyn Sampler>,
    augment: Arc<dyn Augment>,
    objective: O,
    pool: rayon::ThreadPool,
    sender: SyncSender<Result<O::Batch>>,
    stop: Arc<AtomicBool>,
    batch_size: usize,
    seed: u64,
}

impl<O: Objective> Producer<O> {
    fn run(mut self) {
        let mut produced: u64 = 0;
        let mut batches: u64 = 0;
        debug!(
            "Prefetch started, {} samples per pass, seed {}",
            self.sampler.len(),
            self.seed
        );

        while !self.stop.load(Ordering::SeqCst) {
            let indices = self.sampler.sample(self.batch_size);
            let first_element = produced;
            produced += indices.len() as u64;

            let result = self.next_batch(&indices, first_element);
            let failed = result.is_err();
            if let Err(e) = &result {
                warn!("Batch {} failed: {}", batches, e);
            }

            if self.sender.send(result).is_err() {
                debug!("Consumer dropped, stopping after {} batches", batches);
                return;
            }
            if failed {
                return;
            }

            batches += 1;
            debug!("Prefetched batch {} ({} elements)", batches, indices.len());
        }

        debug!("Prefetch stopped after {} batches", batches);
    }

    fn next_batch(&self, indices: &[usize], first_element: u64) -> Result<O::Batch> {
        let objective = &self.objective;
        let augment: &dyn Augment = &*self.augment;
        let items = &self.items;
        let seed = self.seed;

        let elements = self.pool.install(|| {
            indices
                .par_iter()
                .enumerate()
                .map(|(offset, &index)| {
                    let (path, label) = &items[index];
                    let mut rng = random::stream_rng(seed, first_element + offset as u64);
                    load_element(objective, augment, path, *label, &mut rng)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        objective.collate(elements)
    }
}

fn load_element<O: Objective>(
    objective: &O,
    augment: &dyn Augment,
    path: &Path,
    label: i64,
    rng: &mut dyn RngCore,
) -> Result<O::Element> {
    let bytes = read_file(path)?;
    let with_path =
        |e: PipelineError| PipelineError::ImageError(format!("{}: {}", path.display(), e));
    let shape = extract_jpeg_shape(&bytes).map_err(with_path)?;
    let image = decode_jpeg(&bytes).map_err(with_path)?;
    objective.preprocess(&image, shape, label, augment, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_list::Sample;

    fn view(fill: f32) -> Tensor {
        Tensor::new(vec![fill; 3 * 2 * 2], vec![3, 2, 2]).unwrap()
    }

    #[test]
    fn cross_entropy_collate_stacks_images_and_labels() {
        let objective = CrossEntropy::new(3);
        let elements = vec![
            (view(0.0), one_hot(0, 3).unwrap()),
            (view(1.0), one_hot(2, 3).unwrap()),
        ];
        let batch = objective.collate(elements).unwrap();
        assert_eq!(batch.images.shape(), &[2, 3, 2, 2]);
        assert_eq!(batch.labels.shape(), &[2, 3]);
        assert_eq!(batch.labels.data(), &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn supcon_collate_keeps_views_apart() {
        let elements = vec![([view(0.0), view(1.0)], 4), ([view(2.0), view(3.0)], 7)];
        let batch = SupCon.collate(elements).unwrap();
        assert_eq!(batch.anchor.shape(), &[2, 3, 2, 2]);
        assert_eq!(batch.augmented.shape(), &[2, 3, 2, 2]);
        assert_eq!(batch.labels.shape(), &[2, 1]);
        assert_eq!(batch.labels.data(), &[4.0, 7.0]);
        assert_eq!(batch.anchor.index(1).unwrap(), view(2.0));
        assert_eq!(batch.augmented.index(0).unwrap(), view(1.0));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = Configuration::default();
        let samples = SampleList::new(vec![Sample {
            path: "a.jpg".to_string(),
            label: 0,
        }]);
        match dataloader_supcon(&config, &samples, Mode::Eval, 0, false) {
            Err(PipelineError::InvalidInputs(message)) => assert!(message.contains("batch size")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("batch size 0 was accepted"),
        }
    }

    #[test]
    fn empty_sample_list_is_rejected() {
        let config = Configuration::default();
        let empty = SampleList::default();
        assert!(dataloader(&config, &empty, Mode::Train, 4, true).is_err());
    }
}
