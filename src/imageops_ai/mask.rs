use image::{ImageBuffer, Luma, Pixel, Primitive, Rgb, Rgba};
use num_traits::AsPrimitive;
use thiserror::Error;

use crate::imageops_ai::get_max_value;

/// Mask and image sizes differ.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("image is {}x{} but mask is {}x{}", .image.0, .image.1, .mask.0, .mask.1)]
pub struct DimensionMismatch {
    pub image: (u32, u32),
    pub mask: (u32, u32),
}

/// Use `mask` as the alpha channel of `image`. Mask values are clamped to the
/// mask's channel range before scaling.
pub fn apply<SI, SM>(
    image: &ImageBuffer<Rgb<SI>, Vec<SI>>,
    mask: &ImageBuffer<Luma<SM>, Vec<SM>>,
) -> Result<ImageBuffer<Rgba<SI>, Vec<SI>>, DimensionMismatch>
where
    Rgb<SI>: Pixel<Subpixel = SI>,
    Rgba<SI>: Pixel<Subpixel = SI>,
    Luma<SM>: Pixel<Subpixel = SM>,
    SI: Primitive + AsPrimitive<f32> + 'static,
    SM: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<SI>,
{
    if image.dimensions() != mask.dimensions() {
        return Err(DimensionMismatch {
            image: image.dimensions(),
            mask: mask.dimensions(),
        });
    }

    let si_max: f32 = get_max_value::<SI>().as_();
    let sm_max: f32 = get_max_value::<SM>().as_();

    let mut output = ImageBuffer::new(image.width(), image.height());
    for ((target, source), weight) in output.pixels_mut().zip(image.pixels()).zip(mask.pixels()) {
        let Rgb([red, green, blue]) = *source;
        let Luma([alpha]) = *weight;
        let alpha = (alpha.as_() / sm_max).clamp(0.0, 1.0) * si_max;
        *target = Rgba([red, green, blue, alpha.round().as_()]);
    }

    Ok(output)
}
