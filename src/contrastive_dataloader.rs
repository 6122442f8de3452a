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

use crate::core::error::Result;
use crate::data::augmentation::Mode;
use crate::data::dataloader::{dataloader, dataloader_supcon, CrossEntropy, DataLoader, SupCon};
use crate::data::sample_list::{set_dataset, SampleList};
use crate::utilities::config::Configuration;
use std::path::Path;
use tracing::info;

pub mod core;
pub mod data;
pub mod utilities;

pub use crate::core::error::PipelineError;
pub use crate::core::tensor::Tensor;
pub use crate::data::augmentation::AugmentKind;
pub use crate::data::dataloader::{Batch, SupConBatch};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PIPELINE_NAME: &str = "Contrastive Dataloader";

/// Entry point tying a configuration to its datasets and loaders.
pub struct DataPipeline {
    config: Configuration,
    initialized: bool,
}

impl DataPipeline {
    pub fn new() -> Self {
        DataPipeline {
            config: Configuration::default(),
            initialized: false,
        }
    }

    pub fn with_config<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config = Configuration::from_file(config_path)?;
        Ok(Self::from_configuration(config))
    }

    pub fn from_configuration(config: Configuration) -> Self {
        DataPipeline {
            config,
            initialized: false,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        if let Some(seed) = self.config.system.seed {
            crate::core::random::set_seed(seed);
        }

        info!(
            "{} v{} initialized for dataset '{}'",
            PIPELINE_NAME, VERSION, self.config.dataset
        );
        self.initialized = true;
        Ok(())
    }

    /// `(train, val)` sample lists.
    pub fn load_datasets(&self) -> Result<(SampleList, SampleList)> {
        set_dataset(&self.config)
    }

    pub fn train_loader(&self, samples: &SampleList) -> Result<DataLoader<CrossEntropy>> {
        dataloader(
            &self.config,
            samples,
            Mode::Train,
            self.config.batch_size,
            self.config.shuffle,
        )
    }

    pub fn val_loader(&self, samples: &SampleList) -> Result<DataLoader<CrossEntropy>> {
        dataloader(
            &self.config,
            samples,
            Mode::Eval,
            self.config.batch_size,
            false,
        )
    }

    pub fn train_loader_supcon(&self, samples: &SampleList) -> Result<DataLoader<SupCon>> {
        dataloader_supcon(
            &self.config,
            samples,
            Mode::Train,
            self.config.batch_size,
            self.config.shuffle,
        )
    }

    pub fn val_loader_supcon(&self, samples: &SampleList) -> Result<DataLoader<SupCon>> {
        dataloader_supcon(
            &self.config,
            samples,
            Mode::Eval,
            self.config.batch_size,
            false,
        )
    }

    pub fn get_version() -> &'static str {
        VERSION
    }

    pub fn get_name() -> &'static str {
        PIPELINE_NAME
    }

    pub fn system_info() -> String {
        format!(
            "{} v{}\n\
            CPU Threads: {}",
            PIPELINE_NAME,
            VERSION,
            num_cpus::get(),
        )
    }
}

impl Default for DataPipeline {
    fn default() -> Self {
        Self::new()
    }
}
