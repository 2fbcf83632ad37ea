use image::{imageops, RgbImage};
use ndarray::Array4;

/// Preprocessor for converting RGB frames to YOLO input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Preprocess an RGB image into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions (aspect ratio is not kept, YOLO boxes are
    ///    scaled back per axis)
    /// 2. Convert to float and normalize to [0, 1]
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized;
        let source = if image.dimensions() != (self.target_width, self.target_height) {
            resized = imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            );
            &resized
        } else {
            image
        };

        let (width, height) = source.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in source.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        tensor
    }

    /// Per-axis factors mapping model-space coordinates back onto `frame`
    pub fn scale_to(&self, frame: &RgbImage) -> (f32, f32) {
        let (w, h) = frame.dimensions();
        (
            w as f32 / self.target_width as f32,
            h as f32 / self.target_height as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn produces_nchw_normalized_tensor() {
        let pre = Preprocessor::new(8, 4);
        let frame = RgbImage::from_pixel(8, 4, Rgb([255, 0, 51]));

        let tensor = pre.preprocess(&frame);

        assert_eq!(tensor.shape(), &[1, 3, 4, 8]);
        assert_eq!(tensor[[0, 0, 3, 7]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert!((tensor[[0, 2, 2, 5]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn resizes_to_target() {
        let pre = Preprocessor::new(16, 16);
        let frame = RgbImage::from_pixel(64, 32, Rgb([10, 20, 30]));

        assert_eq!(pre.preprocess(&frame).shape(), &[1, 3, 16, 16]);
        assert_eq!(pre.scale_to(&frame), (4.0, 2.0));
    }
}
