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

use crate::core::error::{PipelineError, Result};
use crate::data::augmentation::AugmentKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Configuration {
    // Dataset selection
    pub dataset: String,
    pub data_path: PathBuf,

    // Augmentation
    pub augment: AugmentKind,
    pub img_size: usize,
    pub standardize: bool,
    pub randaug: RandAugmentConfig,

    // Batching
    pub classes: usize,
    pub batch_size: usize,
    pub shuffle: bool,

    // System configuration
    pub system: SystemConfig,

    // Custom parameters
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RandAugmentConfig {
    /// Number of operations applied per image.
    pub layers: usize,
    /// Operation strength on a 0..=30 scale.
    pub magnitude: f32,
    /// Standard deviation of per-image magnitude noise; 0 keeps it fixed.
    pub magnitude_std: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    /// Worker threads for the parallel decode + augment stage.
    pub num_workers: usize,
    /// Batches buffered ahead of the consumer.
    pub prefetch: usize,
    pub seed: Option<u64>,
}

impl Default for RandAugmentConfig {
    fn default() -> Self {
        RandAugmentConfig {
            layers: 2,
            magnitude: 10.0,
            magnitude_std: 0.0,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        let num_workers = num_cpus::get();
        SystemConfig {
            num_workers,
            prefetch: num_workers.max(2),
            seed: None,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            dataset: "cifar10".to_string(),
            data_path: PathBuf::from("data"),
            augment: AugmentKind::Sim,
            img_size: 224,
            standardize: true,
            randaug: RandAugmentConfig::default(),
            classes: 10,
            batch_size: 32,
            shuffle: true,
            system: SystemConfig::default(),
            parameters: HashMap::new(),
        }
    }
}

impl Configuration {
    /// Loads a configuration from YAML, or from JSON when the file ends in `.json`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Configuration = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config
            .validate()
            .map_err(PipelineError::InvalidConfiguration)?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.dataset.trim().is_empty() {
            return Err("Dataset name cannot be empty".to_string());
        }

        if self.batch_size == 0 {
            return Err("Batch size must be greater than 0".to_string());
        }

        if self.classes == 0 {
            return Err("Number of classes must be greater than 0".to_string());
        }

        if self.img_size == 0 {
            return Err("Image size must be greater than 0".to_string());
        }

        if !(0.0..=30.0).contains(&self.randaug.magnitude) {
            return Err("RandAugment magnitude must be between 0 and 30".to_string());
        }

        if self.randaug.magnitude_std < 0.0 {
            return Err("RandAugment magnitude_std cannot be negative".to_string());
        }

        if self.system.num_workers == 0 {
            return Err("Number of workers must be greater than 0".to_string());
        }

        if self.system.prefetch == 0 {
            return Err("Prefetch depth must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn merge(&mut self, other: &Configuration) {
        // Merge only non-default values from other configuration
        let defaults = Configuration::default();
        if other.dataset != defaults.dataset {
            self.dataset = other.dataset.clone();
        }
        if other.data_path != defaults.data_path {
            self.data_path = other.data_path.clone();
        }
        if other.augment != defaults.augment {
            self.augment = other.augment;
        }
        if other.classes != defaults.classes {
            self.classes = other.classes;
        }
        if other.batch_size != defaults.batch_size {
            self.batch_size = other.batch_size;
        }
        if other.img_size != defaults.img_size {
            self.img_size = other.img_size;
        }
        if other.standardize != defaults.standardize {
            self.standardize = other.standardize;
        }
        if other.shuffle != defaults.shuffle {
            self.shuffle = other.shuffle;
        }

        if other.randaug.layers != defaults.randaug.layers {
            self.randaug.layers = other.randaug.layers;
        }
        if other.randaug.magnitude != defaults.randaug.magnitude {
            self.randaug.magnitude = other.randaug.magnitude;
        }
        if other.randaug.magnitude_std != defaults.randaug.magnitude_std {
            self.randaug.magnitude_std = other.randaug.magnitude_std;
        }

        if other.system.num_workers != defaults.system.num_workers {
            self.system.num_workers = other.system.num_workers;
        }
        if other.system.prefetch != defaults.system.prefetch {
            self.system.prefetch = other.system.prefetch;
        }
        if other.system.seed.is_some() {
            self.system.seed = other.system.seed;
        }

        self.parameters.extend(other.parameters.clone());
    }

    pub fn train_csv(&self) -> PathBuf {
        self.data_path.join(format!("{}_trainset.csv", self.dataset))
    }

    pub fn val_csv(&self) -> PathBuf {
        self.data_path.join(format!("{}_valset.csv", self.dataset))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Configuration::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = Configuration {
            batch_size: 0,
            ..Configuration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Configuration =
            serde_yaml::from_str("dataset: flowers\naugment: rand\nclasses: 5\n").unwrap();
        assert_eq!(config.dataset, "flowers");
        assert_eq!(config.augment, AugmentKind::Rand);
        assert_eq!(config.classes, 5);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.randaug.layers, 2);
    }

    #[test]
    fn unknown_augment_flag_is_rejected() {
        let parsed: std::result::Result<Configuration, _> = serde_yaml::from_str("augment: auto\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn csv_paths_follow_dataset_name() {
        let config = Configuration {
            dataset: "cub".to_string(),
            data_path: PathBuf::from("/data"),
            ..Configuration::default()
        };
        assert_eq!(config.train_csv(), PathBuf::from("/data/cub_trainset.csv"));
        assert_eq!(config.val_csv(), PathBuf::from("/data/cub_valset.csv"));
    }

    #[test]
    fn merge_keeps_non_default_values() {
        let mut base = Configuration::default();
        let other = Configuration {
            batch_size: 128,
            ..Configuration::default()
        };
        base.merge(&other);
        assert_eq!(base.batch_size, 128);
        assert_eq!(base.dataset, "cifar10");
    }

    #[test]
    fn merge_overlays_flags_and_nested_sections() {
        let mut base = Configuration::default();
        let mut other = Configuration {
            shuffle: false,
            standardize: false,
            ..Configuration::default()
        };
        other.randaug.layers = 5;
        other.randaug.magnitude_std = 0.5;
        other.system.prefetch = 1234;

        base.merge(&other);
        assert!(!base.shuffle);
        assert!(!base.standardize);
        assert_eq!(base.randaug.layers, 5);
        assert_eq!(base.randaug.magnitude, 10.0);
        assert_eq!(base.randaug.magnitude_std, 0.5);
        assert_eq!(base.system.prefetch, 1234);
        assert_eq!(base.system.num_workers, SystemConfig::default().num_workers);
    }

    #[test]
    fn json_extension_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        let mut config = Configuration {
            dataset: "flowers".to_string(),
            augment: AugmentKind::Rand,
            shuffle: false,
            ..Configuration::default()
        };
        config.randaug.magnitude = 15.0;
        config.system.seed = Some(3);

        config.save(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.trim_start().starts_with('{'));
        assert_eq!(Configuration::from_file(&path).unwrap(), config);
    }
}
