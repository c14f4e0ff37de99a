//! Default Split Transforms
//!
//! Training gets light stochastic augmentation (random resized crop,
//! horizontal flip, photometric jitter); validation and test get a plain
//! deterministic resize. Both end in CHW float conversion with ImageNet
//! normalization. Any of these can be swapped out through the
//! [`Transform`](crate::dataset::view::Transform) trait.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use rand::Rng;

use crate::dataset::view::Transform;

/// ImageNet channel means, matching pretrained-backbone expectations
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Convert to CHW float data normalized with ImageNet statistics
pub fn to_normalized_chw(img: &RgbImage) -> Vec<f32> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut data = vec![0.0f32; 3 * height * width];

    for y in 0..height {
        for x in 0..width {
            let pixel = img.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                data[c * height * width + y * width + x] =
                    (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }
    }

    data
}

/// Stochastic training transform
///
/// Randomness comes from the thread-local RNG on each call; augmentation
/// draws are intentionally not replayable across epochs.
#[derive(Debug, Clone)]
pub struct TrainTransform {
    image_size: u32,
}

impl TrainTransform {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }
}

impl Transform for TrainTransform {
    fn apply(&self, image: DynamicImage) -> Vec<f32> {
        let mut rng = rand::thread_rng();

        let image = random_resized_crop(&image, self.image_size, &mut rng);
        let image = if rng.gen_bool(0.5) { image.fliph() } else { image };

        // Mild photometric jitter
        let image = image.brighten(rng.gen_range(-25..=25));
        let image = image.adjust_contrast(rng.gen_range(-10.0..=10.0));
        let image = image.huerotate(rng.gen_range(-18..=18));

        to_normalized_chw(&image.to_rgb8())
    }
}

/// Deterministic val/test transform: resize + normalize only
#[derive(Debug, Clone)]
pub struct EvalTransform {
    image_size: u32,
}

impl EvalTransform {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }
}

impl Transform for EvalTransform {
    fn apply(&self, image: DynamicImage) -> Vec<f32> {
        let resized = image.resize_exact(self.image_size, self.image_size, FilterType::Triangle);
        to_normalized_chw(&resized.to_rgb8())
    }
}

/// Crop a random region covering 8-100% of the area with aspect ratio in
/// [3/4, 4/3], then resize to the target. Falls back to a full-image
/// resize when no candidate region fits.
fn random_resized_crop<R: Rng>(image: &DynamicImage, target: u32, rng: &mut R) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let area = (width * height) as f64;

    for _ in 0..10 {
        let target_area = area * rng.gen_range(0.08..=1.0);
        let aspect = rng.gen_range(0.75..=4.0 / 3.0);

        let crop_w = (target_area * aspect).sqrt().round() as u32;
        let crop_h = (target_area / aspect).sqrt().round() as u32;

        if crop_w == 0 || crop_h == 0 || crop_w > width || crop_h > height {
            continue;
        }

        let x = rng.gen_range(0..=width - crop_w);
        let y = rng.gen_range(0..=height - crop_h);
        return image
            .crop_imm(x, y, crop_w, crop_h)
            .resize_exact(target, target, FilterType::Triangle);
    }

    image.resize_exact(target, target, FilterType::Triangle)
}
