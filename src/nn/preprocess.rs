use image::imageops::FilterType;

/// ResNet50 "caffe" channel means, in BGR order.
const BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

//NHWC, batch of one, BGR
#[derive(Debug, Clone)]
pub struct ImageTensor {
    pub height: u32,
    pub width: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    pub fn shape(&self) -> [u64; 4] {
        [1, self.height as u64, self.width as u64, 3]
    }
}

/// Decodes `bytes`, resizes to `height`x`width` and applies the ResNet50 input
/// normalisation.
pub fn preprocess(bytes: &[u8], height: u32, width: u32) -> Result<ImageTensor, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    let rgb = image
        .resize_exact(width, height, FilterType::Nearest)
        .to_rgb8();

    let mut data = Vec::with_capacity((height * width * 3) as usize);
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        data.push(b as f32 - BGR_MEAN[0]);
        data.push(g as f32 - BGR_MEAN[1]);
        data.push(r as f32 - BGR_MEAN[2]);
    }

    Ok(ImageTensor {
        height,
        width,
        data,
    })
}

pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, _)| index)
}
