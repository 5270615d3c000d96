use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use burn::tensor::ElementConversion;
use derive_new::new;
use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::data::ImageFolderItem;
use crate::error::DecodeFailure;

/// Images and labels of one batch, already on the loader's device.
#[derive(Clone, Debug)]
pub struct ClassificationBatch<B: Backend> {
    /// `[batch, 3, size, size]`, values in `[0, 1]`.
    pub images: Tensor<B, 4>,
    /// `[batch]` class indices.
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ClassificationBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the dataloaders yield: a batch, or the first image of it that could not be decoded.
pub type BatchResult<B> = Result<ClassificationBatch<B>, DecodeFailure>;

/// Decodes, resizes and stacks [`ImageFolderItem`]s.
///
/// Runs on the dataloader worker threads, so this is where image decoding happens.
#[derive(new, Clone, Debug)]
pub struct ClassificationBatcher {
    image_size: usize,
}

impl<B: Backend> Batcher<B, ImageFolderItem, BatchResult<B>> for ClassificationBatcher {
    fn batch(&self, items: Vec<ImageFolderItem>, device: &B::Device) -> BatchResult<B> {
        let size = self.image_size;
        let mut pixels = Vec::with_capacity(items.len() * 3 * size * size);
        let mut targets = Vec::with_capacity(items.len());

        for item in items {
            pixels.extend(load_image(&item.path, size)?);
            targets.push((item.label as i64).elem::<B::IntElem>());
        }

        let batch_size = targets.len();
        let images =
            TensorData::new(pixels, [batch_size, 3, size, size]).convert::<B::FloatElem>();
        let targets = TensorData::new(targets, [batch_size]);

        Ok(ClassificationBatch {
            images: Tensor::from_data(images, device),
            targets: Tensor::from_data(targets, device),
        })
    }
}

/// Reads an image as RGB, resizes it to `size`×`size` and returns it in CHW order scaled to `[0, 1]`.
pub fn load_image(path: &Path, size: usize) -> Result<Vec<f32>, DecodeFailure> {
    let decoded = image::open(path).map_err(|e| DecodeFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let resized = imageops::resize(
        &decoded.to_rgb8(),
        size as u32,
        size as u32,
        FilterType::Triangle,
    );
    Ok(to_chw(&resized))
}

fn to_chw(image: &RgbImage) -> Vec<f32> {
    let plane = (image.width() * image.height()) as usize;
    let mut chw = vec![0.0; plane * 3];
    for (offset, pixel) in image.pixels().enumerate() {
        for (channel, value) in pixel.0.iter().enumerate() {
            chw[channel * plane + offset] = *value as f32 / 255.0;
        }
    }
    chw
}
