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

/// Every failure the pipeline can surface, from CSV parsing to batch collation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid tensor shape: {0}")]
    InvalidShape(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Invalid inputs: {0}")]
    InvalidInputs(String),
    #[error("Label {label} outside of 0..{classes}")]
    LabelOutOfRange { label: i64, classes: usize },
    #[error("IO error: {0}")]
    IOError(String),
    #[error("CSV error in {path}: {message}")]
    CsvError { path: String, message: String },
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Pipeline disconnected: {0}")]
    Disconnected(String),
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::IOError(error.to_string())
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(error: image::ImageError) -> Self {
        PipelineError::ImageError(error.to_string())
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(error: serde_yaml::Error) -> Self {
        PipelineError::SerializationError(error.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::SerializationError(error.to_string())
    }
}

impl From<glob::PatternError> for PipelineError {
    fn from(error: glob::PatternError) -> Self {
        PipelineError::InvalidInputs(format!("bad glob pattern: {}", error))
    }
}

impl From<rayon::ThreadPoolBuildError> for PipelineError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        PipelineError::RuntimeError(format!("failed to build worker pool: {}", error))
    }
}
