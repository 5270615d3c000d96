use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

/// Channel multiplier between a bottleneck's inner width and its output.
pub const EXPANSION: usize = 4;

/// 1x1 reduce, 3x3, 1x1 expand, with a residual connection.
///
/// The stride sits on the 3x3 convolution.
#[derive(Module, Debug)]
pub struct Bottleneck<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B>,
    conv3: Conv2d<B>,
    bn3: BatchNorm<B>,
    relu: Relu,
    downsample: Option<Downsample<B>>,
}

impl<B: Backend> Bottleneck<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(input.clone()),
            None => input.clone(),
        };

        let out = self.conv1.forward(input);
        let out = self.relu.forward(self.bn1.forward(out));
        let out = self.conv2.forward(out);
        let out = self.relu.forward(self.bn2.forward(out));
        let out = self.conv3.forward(out);
        let out = self.bn3.forward(out);

        self.relu.forward(out + identity)
    }
}

/// Projection shortcut used when a block changes resolution or width.
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B>,
}

impl<B: Backend> Downsample<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(input))
    }
}

#[derive(Config, Debug)]
pub struct BottleneckConfig {
    pub in_channels: usize,
    /// Inner width; the block outputs `width * EXPANSION` channels.
    pub width: usize,
    #[config(default = 1)]
    pub stride: usize,
}

impl BottleneckConfig {
    pub fn out_channels(&self) -> usize {
        self.width * EXPANSION
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Bottleneck<B> {
        let out_channels = self.out_channels();
        let downsample = (self.stride != 1 || self.in_channels != out_channels).then(|| Downsample {
            conv: conv(self.in_channels, out_channels, 1, self.stride, device),
            bn: BatchNormConfig::new(out_channels).init(device),
        });

        Bottleneck {
            conv1: conv(self.in_channels, self.width, 1, 1, device),
            bn1: BatchNormConfig::new(self.width).init(device),
            conv2: conv(self.width, self.width, 3, self.stride, device),
            bn2: BatchNormConfig::new(self.width).init(device),
            conv3: conv(self.width, out_channels, 1, 1, device),
            bn3: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            downsample,
        }
    }
}

/// Bias-free square convolution with "same" padding for odd kernels.
pub(crate) fn conv<B: Backend>(
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    stride: usize,
    device: &B::Device,
) -> Conv2d<B> {
    let padding = kernel / 2;
    Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_bias(false)
        .init(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn identity_block_keeps_shape() {
        let device = Default::default();
        let block = BottleneckConfig::new(16, 4).init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 4>::ones([2, 16, 8, 8], &device);

        assert!(block.downsample.is_none());
        assert_eq!(block.forward(input).dims(), [2, 16, 8, 8]);
    }

    #[test]
    fn strided_block_projects_the_shortcut() {
        let device = Default::default();
        let block = BottleneckConfig::new(8, 4)
            .with_stride(2)
            .init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 4>::ones([1, 8, 8, 8], &device);

        assert!(block.downsample.is_some());
        assert_eq!(block.forward(input).dims(), [1, 16, 4, 4]);
    }
}
