mod block;
mod resnet;

pub use block::{Bottleneck, BottleneckConfig, Downsample, EXPANSION};
pub use resnet::{ResNet, ResNetConfig, Stage};
