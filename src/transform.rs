use image::{DynamicImage, Rgba, RgbaImage};

use crate::cli::ProcessArguments;
use crate::color::{HlsColorFormat, RgbColorFormat};
use crate::error::Error;
use crate::Result;

/// Alpha weighted channel sum under which the legacy rule clears a
/// pixel, roughly 5% of the largest possible sum.
const BLACK_BACKGROUND_CUTOFF: f32 = 0.05 * 255.0 * 3.0;

/// A negative threshold disables the transparency step entirely.
pub const THRESHOLD_DISABLED: f32 = -1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformationOptions {
    pub invert_lightness: bool,
    pub transparency_threshold: f32,
}

impl Default for TransformationOptions {
    fn default() -> Self {
        TransformationOptions {
            invert_lightness: false,
            transparency_threshold: THRESHOLD_DISABLED,
        }
    }
}

impl From<&ProcessArguments> for TransformationOptions {
    fn from(value: &ProcessArguments) -> Self {
        TransformationOptions {
            invert_lightness: value.invert_lightness,
            transparency_threshold: value.transparency_threshold.unwrap_or(THRESHOLD_DISABLED),
        }
    }
}

pub struct PixelTransformer<'a> {
    options: &'a TransformationOptions,
}

impl<'a> PixelTransformer<'a> {
    pub fn new(options: &'a TransformationOptions) -> Self {
        PixelTransformer { options }
    }

    /// Applies the lightness pipeline to every pixel and returns a new
    /// image of the same dimensions. The input is never mutated.
    pub fn transform(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let input = rgba_view(image)?;
        let mut output = RgbaImage::new(input.width(), input.height());
        for (output_pixel, input_pixel) in output.pixels_mut().zip(input.pixels()) {
            *output_pixel = self.transform_pixel(input_pixel);
        }
        Ok(output)
    }

    fn transform_pixel(&self, pixel: &Rgba<u8>) -> Rgba<u8> {
        let rgb = RgbColorFormat::from(pixel);
        let mut hls = HlsColorFormat::from(&rgb);
        if self.options.invert_lightness {
            hls.lightness = 1.0 - hls.lightness;
        }
        let [red, green, blue] = RgbColorFormat::from(&hls).to_bytes();
        let alpha = if self.clears_pixel(hls.lightness) {
            0
        } else {
            pixel[3]
        };
        Rgba([red, green, blue, alpha])
    }

    fn clears_pixel(&self, lightness: f32) -> bool {
        self.options.transparency_threshold >= 0.0
            && lightness < self.options.transparency_threshold
    }
}

/// Legacy black background removal. A pixel whose alpha weighted
/// channel sum falls under the cutoff is replaced by the fully zeroed
/// pixel; everything else is copied unchanged. Takes no parameters.
pub fn remove_black_background(image: &DynamicImage) -> Result<RgbaImage> {
    let input = rgba_view(image)?;
    let mut output = RgbaImage::new(input.width(), input.height());
    for (output_pixel, input_pixel) in output.pixels_mut().zip(input.pixels()) {
        let weighted_sum = (input_pixel[0] as u32 + input_pixel[1] as u32 + input_pixel[2] as u32)
            * input_pixel[3] as u32;
        *output_pixel = if (weighted_sum as f32) < BLACK_BACKGROUND_CUTOFF {
            Rgba([0, 0, 0, 0])
        } else {
            *input_pixel
        };
    }
    Ok(output)
}

fn rgba_view(image: &DynamicImage) -> Result<&RgbaImage> {
    image.as_rgba8().ok_or(Error::ImageIsNotRgba)
}

#[cfg(test)]
mod test {
    use image::{DynamicImage, Rgba, RgbaImage, RgbImage};

    use super::{
        remove_black_background, PixelTransformer, TransformationOptions, THRESHOLD_DISABLED,
    };
    use crate::color::{HlsColorFormat, RgbColorFormat};
    use crate::error::Error;

    fn image_of_pixel(pixel: Rgba<u8>) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, pixel))
    }

    fn transform_pixel(pixel: Rgba<u8>, options: &TransformationOptions) -> Rgba<u8> {
        let transformer = PixelTransformer::new(options);
        let output = transformer
            .transform(&image_of_pixel(pixel))
            .expect("Transform failed");
        *output.get_pixel(0, 0)
    }

    fn lightness_of(pixel: Rgba<u8>) -> f32 {
        HlsColorFormat::from(&RgbColorFormat::from(&pixel)).lightness
    }

    fn assert_pixel_approximately_equal(actual: Rgba<u8>, expected: Rgba<u8>) {
        for channel_index in 0..3 {
            let difference =
                (actual[channel_index] as i16 - expected[channel_index] as i16).abs();
            assert!(
                difference <= 1,
                "channel {} differs by more than one count: {:?} vs {:?}",
                channel_index,
                actual,
                expected
            );
        }
        assert_eq!(actual[3], expected[3], "alpha must match exactly");
    }

    #[test]
    fn disabled_transforms_are_the_identity() {
        let options = TransformationOptions::default();
        let pixels = [
            Rgba([0, 0, 0, 255]),
            Rgba([255, 255, 255, 255]),
            Rgba([255, 0, 0, 128]),
            Rgba([12, 200, 34, 0]),
            Rgba([90, 90, 90, 7]),
        ];
        for pixel in pixels {
            let result = transform_pixel(pixel, &options);
            assert_pixel_approximately_equal(result, pixel);
        }
    }

    #[test]
    fn inversion_turns_black_into_white() {
        let options = TransformationOptions {
            invert_lightness: true,
            transparency_threshold: THRESHOLD_DISABLED,
        };
        let result = transform_pixel(Rgba([0, 0, 0, 255]), &options);
        assert_eq!(result, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn inversion_turns_white_into_black() {
        let options = TransformationOptions {
            invert_lightness: true,
            transparency_threshold: THRESHOLD_DISABLED,
        };
        let result = transform_pixel(Rgba([255, 255, 255, 64]), &options);
        assert_eq!(result, Rgba([0, 0, 0, 64]));
    }

    #[test]
    fn inverting_twice_restores_the_original() {
        let options = TransformationOptions {
            invert_lightness: true,
            transparency_threshold: THRESHOLD_DISABLED,
        };
        let pixels = [
            Rgba([17, 130, 201, 255]),
            Rgba([250, 2, 2, 200]),
            Rgba([128, 128, 128, 255]),
        ];
        for pixel in pixels {
            let once = transform_pixel(pixel, &options);
            let twice = transform_pixel(once, &options);
            assert_pixel_approximately_equal(twice, pixel);
        }
    }

    #[test]
    fn pixel_at_threshold_boundary_stays_opaque() {
        let pixel = Rgba([128, 128, 128, 255]);
        let options = TransformationOptions {
            invert_lightness: false,
            transparency_threshold: lightness_of(pixel),
        };
        let result = transform_pixel(pixel, &options);
        assert_eq!(result[3], 255, "threshold comparison must be strict");
    }

    #[test]
    fn pixel_below_threshold_becomes_transparent() {
        let pixel = Rgba([128, 128, 128, 255]);
        let options = TransformationOptions {
            invert_lightness: false,
            transparency_threshold: lightness_of(pixel) + 1e-6,
        };
        let result = transform_pixel(pixel, &options);
        assert_eq!(result[3], 0);
    }

    #[test]
    fn threshold_applies_to_the_inverted_lightness() {
        let options = TransformationOptions {
            invert_lightness: true,
            transparency_threshold: 0.05,
        };
        let light_pixel = transform_pixel(Rgba([250, 250, 250, 200]), &options);
        assert_eq!(light_pixel[3], 0, "a light pixel inverts into the cut");
        let dark_pixel = transform_pixel(Rgba([5, 5, 5, 200]), &options);
        assert_eq!(dark_pixel[3], 200, "a dark pixel inverts out of the cut");
    }

    #[test]
    fn threshold_preserves_original_alpha_above_the_cut() {
        let options = TransformationOptions {
            invert_lightness: false,
            transparency_threshold: 0.05,
        };
        let result = transform_pixel(Rgba([200, 200, 200, 90]), &options);
        assert_eq!(result[3], 90);
    }

    #[test]
    fn output_dimensions_match_input_dimensions() {
        let transformer_options = TransformationOptions::default();
        let transformer = PixelTransformer::new(&transformer_options);
        for (width, height) in [(0, 0), (1, 1), (3, 5)] {
            let input = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
            let output = transformer.transform(&input).expect("Transform failed");
            assert_eq!(output.width(), width, "width does not match");
            assert_eq!(output.height(), height, "height does not match");
        }
    }

    #[test]
    fn non_rgba_image_is_rejected() {
        let transformer_options = TransformationOptions::default();
        let transformer = PixelTransformer::new(&transformer_options);
        let input = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let result = transformer.transform(&input);
        assert!(
            matches!(result, Err(Error::ImageIsNotRgba)),
            "RGB image without alpha must be rejected"
        );
    }

    #[test]
    fn legacy_rule_clears_opaque_black() {
        let output = remove_black_background(&image_of_pixel(Rgba([0, 0, 0, 255])))
            .expect("Transform failed");
        assert_eq!(*output.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn legacy_rule_keeps_opaque_white() {
        let output = remove_black_background(&image_of_pixel(Rgba([255, 255, 255, 255])))
            .expect("Transform failed");
        assert_eq!(*output.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn legacy_rule_zeroes_already_transparent_pixels() {
        let output = remove_black_background(&image_of_pixel(Rgba([10, 10, 10, 0])))
            .expect("Transform failed");
        assert_eq!(*output.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn legacy_rule_cutoff_is_strict() {
        let kept = remove_black_background(&image_of_pixel(Rgba([1, 1, 1, 13])))
            .expect("Transform failed");
        assert_eq!(
            *kept.get_pixel(0, 0),
            Rgba([1, 1, 1, 13]),
            "sum of 39 lies above the cutoff"
        );
        let cleared = remove_black_background(&image_of_pixel(Rgba([1, 1, 1, 10])))
            .expect("Transform failed");
        assert_eq!(
            *cleared.get_pixel(0, 0),
            Rgba([0, 0, 0, 0]),
            "sum of 30 lies below the cutoff"
        );
    }

    #[test]
    fn legacy_rule_rejects_non_rgba_input() {
        let input = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(matches!(
            remove_black_background(&input),
            Err(Error::ImageIsNotRgba)
        ));
    }

    #[test]
    fn legacy_rule_preserves_dimensions() {
        for (width, height) in [(0, 0), (1, 1)] {
            let input = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
            let output = remove_black_background(&input).expect("Transform failed");
            assert_eq!((output.width(), output.height()), (width, height));
        }
    }
}
