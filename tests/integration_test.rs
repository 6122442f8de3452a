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

use std::error::Error;
use std::fs;
use std::path::Path;

use contrastive_dataloader::{
    core::random,
    data::{
        augmentation::Mode,
        dataloader::{dataloader, dataloader_supcon},
        sample_list::{list_datasets, set_dataset},
    },
    utilities::config::Configuration,
    AugmentKind, Batch, DataPipeline, PipelineError,
};
use image::{Rgb, RgbImage};
use tempfile::TempDir;

const CLASSES: usize = 4;
const IMG_SIZE: usize = 16;

fn write_jpeg(path: &Path, seed: u32) -> Result<(), Box<dyn Error>> {
    let image = RgbImage::from_fn(40, 30, |x, y| {
        Rgb([
            ((x * 6 + seed * 17) % 256) as u8,
            ((y * 8 + seed * 31) % 256) as u8,
            (((x + y) * 3) % 256) as u8,
        ])
    });
    image.save(path)?;
    Ok(())
}

/// Writes `train` and `val` JPEGs plus the two CSV lists for dataset `toy`.
fn build_dataset(train: usize, val: usize) -> Result<TempDir, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("images"))?;

    let mut train_csv = String::from("path,label\n");
    for i in 0..train {
        let name = format!("images/train_{}.jpg", i);
        write_jpeg(&dir.path().join(&name), i as u32)?;
        train_csv.push_str(&format!("{},{}\n", name, i % CLASSES));
    }

    let mut val_csv = String::from("path,label\n");
    for i in 0..val {
        let name = format!("images/val_{}.jpg", i);
        write_jpeg(&dir.path().join(&name), 100 + i as u32)?;
        val_csv.push_str(&format!("{},{}\n", name, i % CLASSES));
    }

    fs::write(dir.path().join("toy_trainset.csv"), train_csv)?;
    fs::write(dir.path().join("toy_valset.csv"), val_csv)?;
    Ok(dir)
}

fn config_for(dir: &TempDir) -> Configuration {
    let mut config = Configuration {
        dataset: "toy".to_string(),
        data_path: dir.path().to_path_buf(),
        img_size: IMG_SIZE,
        classes: CLASSES,
        batch_size: 3,
        ..Configuration::default()
    };
    config.system.num_workers = 2;
    config.system.prefetch = 2;
    config.system.seed = Some(42);
    config
}

#[test]
fn test_set_dataset_matches_csv_rows() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(7, 3)?;
    let config = config_for(&dir);

    let (train, val) = set_dataset(&config)?;
    assert_eq!(train.len(), 7);
    assert_eq!(val.len(), 3);
    assert_eq!(train.get(0).map(|s| s.path.as_str()), Some("images/train_0.jpg"));
    assert_eq!(train.labels(), vec![0, 1, 2, 3, 0, 1, 2]);
    Ok(())
}

#[test]
fn test_cross_entropy_batches() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(5, 2)?;
    let config = config_for(&dir);
    let (train, _) = set_dataset(&config)?;

    let mut loader = dataloader(&config, &train, Mode::Train, 3, true)?;
    assert_eq!(loader.steps_per_epoch(), 2);
    assert_eq!(loader.batch_size(), 3);
    assert_eq!(loader.num_samples(), 5);

    let batch = loader.next().ok_or("stream ended")??;
    assert_eq!(batch.images.shape(), &[3, 3, IMG_SIZE, IMG_SIZE]);
    assert_eq!(batch.labels.shape(), &[3, CLASSES]);
    assert_eq!(batch.images.numel(), 3 * 3 * IMG_SIZE * IMG_SIZE);
    for row in batch.labels.data().chunks(CLASSES) {
        assert_eq!(row.iter().sum::<f32>(), 1.0);
        assert!(row.iter().all(|&v| v == 0.0 || v == 1.0));
    }
    Ok(())
}

#[test]
fn test_supcon_batches_carry_two_views() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(4, 2)?;
    let config = config_for(&dir);
    let (train, _) = set_dataset(&config)?;

    let mut loader = dataloader_supcon(&config, &train, Mode::Train, 2, false)?;
    let batch = loader.next().ok_or("stream ended")??;

    assert_eq!(batch.anchor.shape(), &[2, 3, IMG_SIZE, IMG_SIZE]);
    assert_eq!(batch.augmented.shape(), &[2, 3, IMG_SIZE, IMG_SIZE]);
    assert_eq!(batch.labels.shape(), &[2, 1]);
    // no shuffle: rows 0 and 1 in file order
    assert_eq!(batch.labels.data(), &[0.0, 1.0]);
    assert_ne!(batch.anchor, batch.augmented);
    Ok(())
}

#[test]
fn test_stream_repeats_past_one_epoch() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(3, 1)?;
    let mut config = config_for(&dir);
    config.augment = AugmentKind::Rand;
    let (train, _) = set_dataset(&config)?;

    let loader = dataloader(&config, &train, Mode::Eval, 2, false)?;
    let batches = loader.take(5).collect::<Result<Vec<_>, _>>()?;
    assert_eq!(batches.len(), 5);

    // sequential order wraps: 0 1 | 2 0 | 1 2 | ...
    let first_labels: Vec<usize> = batches
        .iter()
        .map(|b| b.labels.data().iter().position(|&v| v == 1.0).unwrap_or(usize::MAX))
        .collect();
    assert_eq!(first_labels, vec![0, 2, 1, 0, 2]);
    Ok(())
}

#[test]
fn test_missing_image_ends_stream_with_error() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(2, 1)?;
    let config = config_for(&dir);
    fs::remove_file(dir.path().join("images/train_1.jpg"))?;
    let (train, _) = set_dataset(&config)?;

    let mut loader = dataloader(&config, &train, Mode::Eval, 2, false)?;
    match loader.next() {
        Some(Err(PipelineError::IOError(_))) => {}
        other => panic!("expected an IO error, got {:?}", other.map(|r| r.is_ok())),
    }
    assert!(loader.next().is_none());
    Ok(())
}

#[test]
fn test_seeded_loaders_are_reproducible() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(6, 1)?;
    let config = config_for(&dir);
    let (train, _) = set_dataset(&config)?;

    let a = dataloader(&config, &train, Mode::Train, 3, true)?
        .take(3)
        .collect::<Result<Vec<_>, _>>()?;
    let b = dataloader(&config, &train, Mode::Train, 3, true)?
        .take(3)
        .collect::<Result<Vec<_>, _>>()?;

    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.images, y.images);
        assert_eq!(x.labels, y.labels);
    }
    Ok(())
}

#[test]
fn test_global_seed_drives_unseeded_loaders() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(6, 1)?;
    let mut config = config_for(&dir);
    config.system.seed = None;
    let (train, _) = set_dataset(&config)?;

    let draw = |seed: u64| -> Result<Vec<Batch>, Box<dyn Error>> {
        random::set_seed(seed);
        let batches = dataloader(&config, &train, Mode::Train, 3, true)?
            .take(2)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    };

    let a = draw(9)?;
    let b = draw(9)?;
    let c = draw(10)?;
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.images, y.images);
        assert_eq!(x.labels, y.labels);
    }
    assert!(a.iter().zip(c.iter()).any(|(x, y)| x.images != y.images));
    Ok(())
}

#[test]
fn test_out_of_range_label_is_an_error() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(2, 1)?;
    let mut config = config_for(&dir);
    config.classes = 1;
    let (train, _) = set_dataset(&config)?;

    let mut loader = dataloader(&config, &train, Mode::Eval, 2, false)?;
    assert!(matches!(
        loader.next(),
        Some(Err(PipelineError::LabelOutOfRange { label: 1, classes: 1 }))
    ));
    Ok(())
}

#[test]
fn test_pipeline_facade() -> Result<(), Box<dyn Error>> {
    let dir = build_dataset(4, 3)?;
    let config_path = dir.path().join("pipeline.yaml");
    config_for(&dir).save(&config_path)?;

    let mut pipeline = DataPipeline::with_config(&config_path)?;
    pipeline.initialize()?;
    assert_eq!(pipeline.config().dataset, "toy");
    let (train, val) = pipeline.load_datasets()?;

    let batch = pipeline.val_loader(&val)?.next().ok_or("stream ended")??;
    assert_eq!(batch.images.shape(), &[3, 3, IMG_SIZE, IMG_SIZE]);

    let batch = pipeline
        .train_loader_supcon(&train)?
        .next()
        .ok_or("stream ended")??;
    assert_eq!(batch.labels.shape(), &[3, 1]);

    assert_eq!(list_datasets(dir.path())?, vec!["toy".to_string()]);
    assert!(DataPipeline::system_info().contains(DataPipeline::get_name()));
    Ok(())
}
