use burn::nn::conv::Conv2d;
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

use super::block::{Bottleneck, BottleneckConfig, conv};

/// Bottleneck ResNet for image classification.
///
/// Takes `[batch, 3, height, width]` images and returns `[batch, num_classes]` logits.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B>,
    relu: Relu,
    maxpool: MaxPool2d,
    stages: Vec<Stage<B>>,
    avgpool: AdaptiveAvgPool2d,
    fc: Linear<B>,
}

impl<B: Backend> ResNet<B> {
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(images);
        let x = self.relu.forward(self.bn1.forward(x));
        let x = self.maxpool.forward(x);

        let x = self
            .stages
            .iter()
            .fold(x, |x, stage| stage.forward(x));

        let x = self.avgpool.forward(x);
        self.fc.forward(x.flatten::<2>(1, 3))
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }
}

/// A run of bottlenecks sharing one output width.
#[derive(Module, Debug)]
pub struct Stage<B: Backend> {
    blocks: Vec<Bottleneck<B>>,
}

impl<B: Backend> Stage<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.blocks
            .iter()
            .fold(input, |x, block| block.forward(x))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Config, Debug)]
pub struct ResNetConfig {
    pub num_classes: usize,
    /// Bottlenecks per stage.
    #[config(default = "[3, 4, 6, 3]")]
    pub blocks: [usize; 4],
    /// Inner width of the first stage, doubled at every following stage.
    #[config(default = 64)]
    pub base_width: usize,
}

impl ResNetConfig {
    /// ResNet-50: `[3, 4, 6, 3]` bottlenecks with widths 64 to 512.
    pub fn resnet50(num_classes: usize) -> Self {
        Self::new(num_classes)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let stem_channels = self.base_width;
        let mut in_channels = stem_channels;

        let mut stages = Vec::with_capacity(self.blocks.len());
        for (index, &depth) in self.blocks.iter().enumerate() {
            let width = self.base_width << index;
            let mut blocks = Vec::with_capacity(depth);
            for position in 0..depth {
                // Only the first stage keeps the resolution coming out of the stem.
                let stride = if position == 0 && index > 0 { 2 } else { 1 };
                let block = BottleneckConfig::new(in_channels, width).with_stride(stride);
                in_channels = block.out_channels();
                blocks.push(block.init(device));
            }
            stages.push(Stage { blocks });
        }

        ResNet {
            conv1: conv(3, stem_channels, 7, 2, device),
            bn1: BatchNormConfig::new(stem_channels).init(device),
            relu: Relu::new(),
            maxpool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),
            stages,
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(in_channels, self.num_classes).init(device),
        }
    }
}
