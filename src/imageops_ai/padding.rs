use image::{imageops, GenericImageView, ImageBuffer, Pixel, Primitive};

/// Top-left offset that centres a `width`×`height` image on a larger canvas.
///
/// `None` when the image does not fit.
pub fn center_offset(
    width: u32,
    height: u32,
    pad_width: u32,
    pad_height: u32,
) -> Option<(u32, u32)> {
    if width > pad_width || height > pad_height {
        return None;
    }
    Some(((pad_width - width) / 2, (pad_height - height) / 2))
}

/// Place `image` in the centre of a `pad_width`×`pad_height` canvas filled with `color`.
///
/// Returns the canvas together with the offset the image was drawn at.
pub fn pad_center<I, P, S>(
    image: &I,
    pad_width: u32,
    pad_height: u32,
    color: P,
) -> Option<(ImageBuffer<P, Vec<S>>, (u32, u32))>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S>,
    S: Primitive,
{
    let (width, height) = image.dimensions();

    center_offset(width, height, pad_width, pad_height).map(|(x, y)| {
        let mut canvas = ImageBuffer::from_pixel(pad_width, pad_height, color);
        imageops::overlay(&mut canvas, image, i64::from(x), i64::from(y));
        (canvas, (x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_center_offset() {
        assert_eq!(center_offset(4, 2, 4, 4), Some((0, 1)));
        assert_eq!(center_offset(1, 1, 4, 4), Some((1, 1)));
        assert_eq!(center_offset(5, 1, 4, 4), None);
    }

    #[test]
    fn test_pad_center() {
        let image = RgbImage::from_pixel(2, 1, Rgb([255, 255, 255]));
        let (canvas, offset) = pad_center(&image, 4, 3, Rgb([0, 0, 0])).unwrap();

        assert_eq!(offset, (1, 1));
        assert_eq!(canvas.dimensions(), (4, 3));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(2, 1), &Rgb([255, 255, 255]));
        assert_eq!(canvas.get_pixel(3, 1), &Rgb([0, 0, 0]));
    }
}
