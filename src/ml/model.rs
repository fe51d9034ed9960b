use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

const CONV_CHANNELS: [usize; 4] = [3, 64, 64, 128];
const HIDDEN:        usize      = 1000;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CnnConfig {
    pub num_classes: usize,
    /// Side length of the (square) input images after augmentation
    pub image_size:  usize,
    #[config(default = 0.5)]
    pub dropout:     f64,
}

impl CnnConfig {
    /// Length of the flattened feature map after three 2×2 poolings.
    pub fn feature_len(&self) -> usize {
        let side = self.image_size / 2 / 2 / 2;
        side * side * CONV_CHANNELS[3]
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Cnn<B> {
        let conv1   = conv_layer::<B>(0, device);
        let conv2   = conv_layer::<B>(1, device);
        let conv3   = conv_layer::<B>(2, device);
        let pool    = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let dropout = DropoutConfig::new(self.dropout).init();
        let fc1     = LinearConfig::new(self.feature_len(), HIDDEN).init(device);
        let fc2     = LinearConfig::new(HIDDEN, self.num_classes).init(device);
        Cnn { conv1, conv2, conv3, pool, dropout, fc1, fc2 }
    }
}

/// 5×5 convolution from stage `i` to stage `i + 1`, same padding.
fn conv_layer<B: Backend>(i: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([CONV_CHANNELS[i], CONV_CHANNELS[i + 1]], [5, 5])
        .with_padding(PaddingConfig2d::Same)
        .init(device)
}

/// Three conv/ReLU/max-pool stages followed by a two-layer classifier head.
#[derive(Module, Debug)]
pub struct Cnn<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub conv2:   Conv2d<B>,
    pub conv3:   Conv2d<B>,
    pub pool:    MaxPool2d,
    pub dropout: Dropout,
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
}

impl<B: Backend> Cnn<B> {
    /// images: [batch, 3, size, size] → logits: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = self.pool.forward(relu(self.conv3.forward(x))); // [batch, 128, s/8, s/8]

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = relu(self.fc1.forward(self.dropout.forward(x)));
        self.fc2.forward(self.dropout.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_feature_len_follows_input_size() {
        assert_eq!(CnnConfig::new(10, 32).feature_len(), 4 * 4 * 128);
        assert_eq!(CnnConfig::new(10, 28).feature_len(), 3 * 3 * 128);
    }

    #[test]
    fn test_forward_shape_for_cropped_images() {
        let device = Default::default();
        let model  = CnnConfig::new(10, 28).init::<NdArray>(&device);
        let images = Tensor::<NdArray, 4>::zeros([2, 3, 28, 28], &device);
        assert_eq!(model.forward(images).dims(), [2, 10]);
    }
}
