use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage, RgbaImage, imageops::FilterType};
use ndarray::Array3;

/// Load an image from disk into memory.
///
/// # Arguments
///
/// * `path` - The path to the image file.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path_ref = path.as_ref();
    image::open(path_ref).with_context(|| format!("failed to open image {}", path_ref.display()))
}

/// Load an image and keep its alpha channel (used for cutouts).
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage> {
    Ok(load_image(path)?.to_rgba8())
}

/// Resize an RGB image to exactly `width` x `height` using the provided filter.
///
/// Returns a plain clone when the size already matches.
pub fn resize_rgb(image: &RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, filter)
}

/// Greyscale copy of `image` kept in the RGB color model (R = G = B = luma).
pub fn greyscale_rgb(image: &RgbImage) -> RgbImage {
    let luma = image::imageops::grayscale(image);
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let value = luma.get_pixel(x, y)[0];
        image::Rgb([value, value, value])
    })
}

/// Convert an RGB image into a BGR HWC array of raw `0..=255` intensities.
///
/// This is the channel order and layout the reference network was trained on.
pub fn rgb_to_bgr_hwc(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((height as usize, width as usize, 3));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        array[(yi, xi, 0)] = pixel[2] as f32; // Blue
        array[(yi, xi, 1)] = pixel[1] as f32; // Green
        array[(yi, xi, 2)] = pixel[0] as f32; // Red
    }
    array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn rgb_to_bgr_hwc_swaps_channels() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([10, 20, 30]));
        image.put_pixel(1, 0, Rgb([255, 0, 128]));

        let array = rgb_to_bgr_hwc(&image);
        assert_eq!(array.shape(), &[1, 2, 3]);
        assert_eq!(array[(0, 0, 0)], 30.0);
        assert_eq!(array[(0, 0, 2)], 10.0);
        assert_eq!(array[(0, 1, 0)], 128.0);
        assert_eq!(array[(0, 1, 1)], 0.0);
    }

    #[test]
    fn greyscale_rgb_has_equal_channels() {
        let image = RgbImage::from_pixel(3, 2, Rgb([200, 40, 90]));
        let grey = greyscale_rgb(&image);
        assert_eq!(grey.dimensions(), (3, 2));
        let pixel = grey.get_pixel(1, 1);
        assert_eq!(pixel[0], pixel[1]);
        assert_eq!(pixel[1], pixel[2]);
        assert_ne!(*pixel, Rgb([200, 40, 90]));
    }

    #[test]
    fn resize_rgb_is_identity_at_same_size() {
        let image = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 7]));
        let same = resize_rgb(&image, 4, 4, FilterType::CatmullRom);
        assert_eq!(same.as_raw(), image.as_raw());
        let small = resize_rgb(&image, 2, 3, FilterType::Nearest);
        assert_eq!(small.dimensions(), (2, 3));
    }
}
