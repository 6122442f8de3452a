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

/// Dense row-major `f32` buffer with a shape. Images are `[C, H, W]`,
/// batches prepend a leading batch dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self> {
        let size: usize = shape.iter().product();
        if data.len() != size {
            return Err(PipelineError::InvalidShape(format!(
                "shape {:?} requires {} elements, got {}",
                shape,
                size,
                data.len()
            )));
        }
        Ok(Tensor { data, shape })
    }

    pub fn zeros(shape: &[usize]) -> Self {
        let size = shape.iter().product();
        Tensor {
            data: vec![0.0; size],
            shape: shape.to_vec(),
        }
    }

    // Data access methods
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    // Calculate stride for the current shape
    pub fn stride(&self) -> Vec<usize> {
        let mut stride = Vec::with_capacity(self.shape.len());
        let mut current_stride = 1;
        for &dim in self.shape.iter().rev() {
            stride.push(current_stride);
            current_stride *= dim;
        }
        stride.reverse();
        stride
    }

    /// Stacks equally shaped tensors along a new leading dimension.
    pub fn stack(tensors: &[Tensor]) -> Result<Tensor> {
        let batch_shape = batch_shape(tensors)?;
        let mut batched = Tensor::zeros(&batch_shape);

        for (i, tensor) in tensors.iter().enumerate() {
            copy_tensor_slice(&mut batched, i, tensor)?;
        }

        Ok(batched)
    }

    /// Returns the `index`-th slice along the leading dimension.
    pub fn index(&self, index: usize) -> Result<Tensor> {
        if self.shape.is_empty() || index >= self.shape[0] {
            return Err(PipelineError::InvalidInputs(format!(
                "index {} out of bounds for shape {:?}",
                index, self.shape
            )));
        }
        let stride = self.stride()[0];
        let start = index * stride;
        Tensor::new(
            self.data[start..start + stride].to_vec(),
            self.shape[1..].to_vec(),
        )
    }
}

fn batch_shape(tensors: &[Tensor]) -> Result<Vec<usize>> {
    if tensors.is_empty() {
        return Err(PipelineError::InvalidInputs(
            "Empty tensor batch".to_string(),
        ));
    }

    let base_shape = tensors[0].shape();

    // Verify all tensors have the same shape
    for (i, tensor) in tensors.iter().enumerate().skip(1) {
        if tensor.shape() != base_shape {
            return Err(PipelineError::ShapeMismatch(format!(
                "tensor 0 has shape {:?} but tensor {} has shape {:?}",
                base_shape,
                i,
                tensor.shape()
            )));
        }
    }

    let mut batch_shape = vec![tensors.len()];
    batch_shape.extend(base_shape);
    Ok(batch_shape)
}

fn copy_tensor_slice(dest: &mut Tensor, batch_idx: usize, source: &Tensor) -> Result<()> {
    let batch_stride = dest.stride()[0];
    let start_idx = batch_idx * batch_stride;
    let end_idx = start_idx + batch_stride;

    if end_idx > dest.data().len() || source.data().len() != batch_stride {
        return Err(PipelineError::ShapeMismatch(format!(
            "cannot place {} elements at batch slot {}",
            source.data().len(),
            batch_idx
        )));
    }

    dest.data_mut()[start_idx..end_idx].copy_from_slice(source.data());
    Ok(())
}
