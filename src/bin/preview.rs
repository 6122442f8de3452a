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

use clap::{Parser, ValueEnum};
use contrastive_dataloader::data::sample_list::SampleList;
use contrastive_dataloader::utilities::profiler::Profiler;
use contrastive_dataloader::DataPipeline;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    CrossEntropy,
    Supcon,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SplitArg {
    Train,
    Val,
}

/// Pull a few batches through the pipeline and report their shapes and timing.
#[derive(Parser, Debug)]
#[command(name = "preview", version, about)]
struct Args {
    /// YAML or JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "cross-entropy")]
    objective: ObjectiveArg,

    #[arg(short, long, value_enum, default_value = "train")]
    split: SplitArg,

    /// Number of batches to pull
    #[arg(short, long, default_value_t = 4)]
    batches: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut pipeline = match &args.config {
        Some(path) => DataPipeline::with_config(path)?,
        None => DataPipeline::new(),
    };
    pipeline.initialize()?;
    info!("{}", DataPipeline::system_info());

    let (train, val) = pipeline.load_datasets()?;
    let samples: &SampleList = match args.split {
        SplitArg::Train => &train,
        SplitArg::Val => &val,
    };
    let config = pipeline.config();
    info!(
        "Dataset {}: {} train samples, {} val samples, augment={}, img_size={}",
        config.dataset,
        train.len(),
        val.len(),
        config.augment,
        config.img_size
    );

    let mut profiler = Profiler::new();
    match args.objective {
        ObjectiveArg::CrossEntropy => {
            let mut loader = match args.split {
                SplitArg::Train => pipeline.train_loader(samples)?,
                SplitArg::Val => pipeline.val_loader(samples)?,
            };
            info!(
                "{} samples, batch size {}, {} steps per epoch",
                loader.num_samples(),
                loader.batch_size(),
                loader.steps_per_epoch()
            );
            for step in 0..args.batches {
                profiler.start("batch");
                let batch = match loader.next() {
                    Some(batch) => batch?,
                    None => break,
                };
                profiler.stop("batch");
                println!(
                    "batch {}: images {:?} ({} values), labels {:?}",
                    step,
                    batch.images.shape(),
                    batch.images.numel(),
                    batch.labels.shape()
                );
            }
        }
        ObjectiveArg::Supcon => {
            let mut loader = match args.split {
                SplitArg::Train => pipeline.train_loader_supcon(samples)?,
                SplitArg::Val => pipeline.val_loader_supcon(samples)?,
            };
            info!(
                "{} samples, batch size {}, {} steps per epoch",
                loader.num_samples(),
                loader.batch_size(),
                loader.steps_per_epoch()
            );
            for step in 0..args.batches {
                profiler.start("batch");
                let batch = match loader.next() {
                    Some(batch) => batch?,
                    None => break,
                };
                profiler.stop("batch");
                println!(
                    "batch {}: anchor {:?}, augmented {:?} ({} values per view), labels {:?}",
                    step,
                    batch.anchor.shape(),
                    batch.augmented.shape(),
                    batch.anchor.numel(),
                    batch.labels.shape()
                );
            }
        }
    }

    print!("{}", profiler.report());
    Ok(())
}
