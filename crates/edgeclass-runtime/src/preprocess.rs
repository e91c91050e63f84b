use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use edgeclass_core::{DType, Error, Layout, Nchw, Result, Shape, Tensor, TensorSpec};
use half::f16;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Order of the colour planes written into a 3-channel input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue, green, red. What IR classifiers converted from Caffe expect.
    #[default]
    Bgr,
    Rgb,
}

impl std::str::FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("bgr") {
            Ok(ChannelOrder::Bgr)
        } else if s.eq_ignore_ascii_case("rgb") {
            Ok(ChannelOrder::Rgb)
        } else {
            Err(format!("unknown channel order: {s} (expected bgr or rgb)"))
        }
    }
}

/// A decoded source image, still in its original resolution.
#[derive(Debug)]
pub struct RawImage {
    pub path: PathBuf,
    pub image: DynamicImage,
}

impl RawImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub fn load_image(path: &Path) -> Result<RawImage> {
    let image = image::open(path).map_err(|e| Error::ImageRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "image decoded"
    );
    Ok(RawImage {
        path: path.to_path_buf(),
        image,
    })
}

/// Builds the input tensor for `slot` from `image`.
///
/// The image is resized (not cropped) to the slot's height and width,
/// rearranged from interleaved pixels into channel planes, and repeated
/// along the batch axis. Pixel values are passed through unscaled.
pub fn prepare(image: &RawImage, slot: &TensorSpec, order: ChannelOrder) -> Result<Tensor> {
    let Nchw { n, c, h, w } = slot.nchw()?;
    let name = slot.name.as_str();
    let (th, tw) = match (u32::try_from(h), u32::try_from(w)) {
        (Ok(th), Ok(tw)) => (th, tw),
        _ => return Err(Error::shape(name, format!("{h}x{w} is too large for an image"))),
    };

    let resized = image.image.resize_exact(tw, th, FilterType::Triangle);
    let (interleaved, reverse) = match c {
        3 => (resized.to_rgb8().into_raw(), order == ChannelOrder::Bgr),
        1 => (resized.to_luma8().into_raw(), false),
        _ => {
            return Err(Error::shape(
                name,
                format!("cannot fill {c} channels from an image"),
            ))
        }
    };
    let planar = to_planar(&interleaved, c, reverse);

    let mut buf = BytesMut::with_capacity(n * planar.len() * slot.dtype.byte_size());
    for _ in 0..n {
        match slot.dtype {
            DType::U8 => buf.put_slice(&planar),
            DType::F32 => planar.iter().for_each(|v| buf.put_f32_le(f32::from(*v))),
            DType::F16 => planar
                .iter()
                .for_each(|v| buf.put_slice(&f16::from_f32(f32::from(*v)).to_le_bytes())),
            other => {
                return Err(Error::shape(
                    name,
                    format!("image inputs of type {other:?} are not supported"),
                ))
            }
        }
    }

    debug!(
        slot = name,
        from = %format!("{}x{}", image.width(), image.height()),
        to = %format!("{h}x{w}"),
        batch = n,
        "input prepared"
    );
    Tensor::from_bytes(
        slot.dtype,
        Shape::from_slice(&[n, c, h, w]),
        Layout::Nchw,
        buf.freeze(),
    )
}

/// HWC to CHW. With `reverse`, channel `k` of the output is channel
/// `c - 1 - k` of the input.
fn to_planar(interleaved: &[u8], c: usize, reverse: bool) -> Vec<u8> {
    let plane = interleaved.len() / c;
    let mut planar = vec![0u8; interleaved.len()];
    for (i, px) in interleaved.chunks_exact(c).enumerate() {
        for ch in 0..c {
            let src = if reverse { c - 1 - ch } else { ch };
            planar[ch * plane + i] = px[src];
        }
    }
    planar
}

#[cfg(test)]
mod tests {
    use edgeclass_core::IOName;
    use image::{Rgb, RgbImage};

    use super::*;

    fn slot(dtype: DType, dims: [usize; 4]) -> TensorSpec {
        TensorSpec {
            name: IOName("data".to_string()),
            dtype,
            dims: dims.iter().map(|d| Some(*d)).collect(),
        }
    }

    fn solid(w: u32, h: u32, px: [u8; 3]) -> RawImage {
        RawImage {
            path: PathBuf::from("solid.png"),
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(px))),
        }
    }

    #[test]
    fn interleaved_to_planar() {
        // two pixels: (r0 g0 b0) (r1 g1 b1)
        let hwc = [1, 2, 3, 4, 5, 6];
        assert_eq!(to_planar(&hwc, 3, false), vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(to_planar(&hwc, 3, true), vec![3, 6, 2, 5, 1, 4]);
    }

    #[test]
    fn resizes_to_declared_shape() {
        let img = solid(640, 480, [10, 20, 30]);
        let t = prepare(&img, &slot(DType::U8, [1, 3, 224, 224]), ChannelOrder::Rgb).unwrap();
        assert_eq!(t.shape().dims(), &[1, 3, 224, 224]);
        assert_eq!(t.desc.layout, Layout::Nchw);
        assert_eq!(t.byte_len(), 3 * 224 * 224);
    }

    #[test]
    fn planes_follow_channel_order() {
        let img = solid(64, 48, [10, 20, 30]);
        let t = prepare(&img, &slot(DType::U8, [1, 3, 6, 8]), ChannelOrder::Bgr).unwrap();
        let plane = 6 * 8;
        for (k, want) in [30u8, 20, 10].into_iter().enumerate() {
            let got = &t.bytes[k * plane..(k + 1) * plane];
            assert!(got.iter().all(|v| v.abs_diff(want) <= 1), "plane {k}: {got:?}");
        }
    }

    #[test]
    fn f32_inputs_keep_raw_pixel_values() {
        let img = solid(4, 4, [200, 200, 200]);
        let t = prepare(&img, &slot(DType::F32, [1, 3, 4, 4]), ChannelOrder::Bgr).unwrap();
        let values = t.to_f32_vec().unwrap();
        assert_eq!(values.len(), 48);
        assert!(values.iter().all(|v| (*v - 200.0).abs() <= 1.0));
    }

    #[test]
    fn f16_inputs_encode_half_precision_pixels() {
        let img = solid(6, 6, [200, 100, 50]);
        let t = prepare(&img, &slot(DType::F16, [1, 3, 4, 4]), ChannelOrder::Rgb).unwrap();
        assert_eq!(t.dtype(), DType::F16);
        assert_eq!(t.byte_len(), 3 * 4 * 4 * 2);
        let values = t.to_f32_vec().unwrap();
        let plane = 16;
        for (k, want) in [200.0f32, 100.0, 50.0].into_iter().enumerate() {
            let got = &values[k * plane..(k + 1) * plane];
            assert!(got.iter().all(|v| (v - want).abs() <= 1.0), "plane {k}: {got:?}");
        }
    }

    #[test]
    fn batch_repeats_the_image() {
        let img = solid(5, 5, [1, 2, 3]);
        let t = prepare(&img, &slot(DType::U8, [2, 3, 5, 5]), ChannelOrder::Rgb).unwrap();
        let half = t.byte_len() / 2;
        assert_eq!(t.bytes[..half], t.bytes[half..]);
    }

    #[test]
    fn grayscale_input() {
        let img = solid(9, 9, [50, 50, 50]);
        let t = prepare(&img, &slot(DType::U8, [1, 1, 3, 3]), ChannelOrder::Bgr).unwrap();
        assert_eq!(t.shape().dims(), &[1, 1, 3, 3]);
    }

    #[test]
    fn unsupported_channel_count() {
        let img = solid(4, 4, [0, 0, 0]);
        let err = prepare(&img, &slot(DType::U8, [1, 4, 4, 4]), ChannelOrder::Bgr).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn unsupported_dtype() {
        let img = solid(4, 4, [0, 0, 0]);
        let err = prepare(&img, &slot(DType::I64, [1, 3, 4, 4]), ChannelOrder::Bgr).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn missing_image_file() {
        let err = load_image(Path::new("/nonexistent/input_image.jpg")).unwrap_err();
        assert!(matches!(err, Error::ImageRead { .. }));
    }

    #[test]
    fn undecodable_image_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("input_image.jpg");
        std::fs::write(&path, b"not a jpeg")?;
        assert!(matches!(load_image(&path), Err(Error::ImageRead { .. })));
        Ok(())
    }

    #[test]
    fn channel_order_parses() {
        assert_eq!("BGR".parse::<ChannelOrder>().unwrap(), ChannelOrder::Bgr);
        assert_eq!("rgb".parse::<ChannelOrder>().unwrap(), ChannelOrder::Rgb);
        assert!("hsv".parse::<ChannelOrder>().is_err());
    }
}
