//! Photo normalization: orientation correction and re-encoding to the
//! canonical embed format (baseline RGB JPEG).

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

/// Counter-clockwise rotation applied to make a photo upright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Ccw90 => 90,
            Rotation::Ccw180 => 180,
            Rotation::Ccw270 => 270,
        }
    }

    /// EXIF orientation tag (0x0112) to rotation. Mirrored variants are not
    /// produced by phone cameras and are left untouched.
    pub fn from_exif_orientation(tag: u32) -> Self {
        match tag {
            3 => Rotation::Ccw180,
            6 => Rotation::Ccw270,
            8 => Rotation::Ccw90,
            _ => Rotation::None,
        }
    }

    fn apply(self, img: DynamicImage) -> DynamicImage {
        // image's rotate* helpers turn clockwise
        match self {
            Rotation::None => img,
            Rotation::Ccw90 => img.rotate270(),
            Rotation::Ccw180 => img.rotate180(),
            Rotation::Ccw270 => img.rotate90(),
        }
    }
}

/// A photo ready to embed: JPEG bytes with the orientation baked in.
#[derive(Clone)]
pub struct NormalizedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

impl std::fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Decoded signature, kept lossless so the transparent canvas background
/// stays transparent on the page.
pub(crate) struct SignatureImage {
    pub(crate) rgba: RgbaImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoError(pub String);

impl std::fmt::Display for PhotoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for PhotoError {}

/// `ftyp` brands of HEIC/HEIF still images.
const HEIF_BRANDS: [&[u8; 4]; 6] = [b"heic", b"heix", b"hevc", b"heim", b"heis", b"mif1"];

pub(crate) fn is_heif(bytes: &[u8]) -> bool {
    bytes.len() >= 12
        && &bytes[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == *brand)
}

/// Decode any supported source format. The flag is set when the decoder has
/// already applied the container's orientation transform.
fn decode(bytes: &[u8]) -> Result<(DynamicImage, bool), PhotoError> {
    if is_heif(bytes) {
        return decode_heif(bytes).map(|img| (img, true));
    }
    image::load_from_memory(bytes)
        .map(|img| (img, false))
        .map_err(|e| PhotoError(e.to_string()))
}

#[cfg(feature = "heic")]
fn decode_heif(bytes: &[u8]) -> Result<DynamicImage, PhotoError> {
    use libheif_rs::{ColorSpace, HeifContext, HeifError, LibHeif, RgbChroma};

    let heif_err = |e: HeifError| PhotoError(format!("HEIF decoding failed: {e}"));
    let lib = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(bytes).map_err(heif_err)?;
    let handle = ctx.primary_image_handle().map_err(heif_err)?;
    let decoded = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_err)?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| PhotoError("HEIF image has no interleaved RGB plane".into()))?;
    let (width, height) = (plane.width, plane.height);
    let row_len = width as usize * 3;
    let mut rgb = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        let pixels = row
            .get(..row_len)
            .ok_or_else(|| PhotoError("HEIF plane is shorter than its width".into()))?;
        rgb.extend_from_slice(pixels);
    }
    let buf = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PhotoError("HEIF plane is shorter than its height".into()))?;
    log::debug!("decode_heif: {} bytes in → {}x{}", bytes.len(), width, height);
    Ok(DynamicImage::ImageRgb8(buf))
}

#[cfg(not(feature = "heic"))]
fn decode_heif(_bytes: &[u8]) -> Result<DynamicImage, PhotoError> {
    Err(PhotoError(
        "HEIC/HEIF photo: this build has no HEIF decoder (enable the `heic` feature)".into(),
    ))
}

/// Orientation tag from the image's EXIF block. `None` when there is no EXIF
/// data or it cannot be parsed; `Some(1)` when EXIF exists without the tag.
pub fn read_exif_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    Some(
        exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .unwrap_or(1),
    )
}

/// Rotation used when a photo carries no orientation metadata: portrait
/// frames are assumed to come from a sideways camera.
pub fn heuristic_rotation(width: u32, height: u32) -> Rotation {
    if width < height {
        Rotation::Ccw270
    } else {
        Rotation::None
    }
}

/// Decode, turn upright, and re-encode as JPEG at the given quality.
///
/// Re-encoding happens even when no rotation is needed so every embedded
/// photo shares one format.
pub fn normalize_image(bytes: &[u8], jpeg_quality: u8) -> Result<NormalizedImage, PhotoError> {
    let (decoded, oriented) = decode(bytes)?;

    // HEIF decoding already applies the container's transforms
    let exif = if oriented { Some(1) } else { read_exif_orientation(bytes) };
    let rotation = match exif {
        Some(tag) => Rotation::from_exif_orientation(tag),
        None => {
            let r = heuristic_rotation(decoded.width(), decoded.height());
            if r != Rotation::None {
                log::warn!(
                    "No orientation metadata on {}x{} portrait photo, rotating {}°",
                    decoded.width(),
                    decoded.height(),
                    r.degrees()
                );
            }
            r
        }
    };

    let upright = rotation.apply(decoded);
    let rgb = upright.to_rgb8();
    let (width, height) = rgb.dimensions();
    drop(upright);

    let mut data = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut data, jpeg_quality))
        .map_err(|e| PhotoError(format!("JPEG encoding failed: {e}")))?;

    log::debug!(
        "normalize_image: {} bytes in → {}x{} rotated {}° → {} bytes",
        bytes.len(),
        width,
        height,
        rotation.degrees(),
        data.len()
    );

    Ok(NormalizedImage {
        data,
        width,
        height,
        rotation,
    })
}

pub(crate) fn prepare_signature(bytes: &[u8]) -> Result<SignatureImage, PhotoError> {
    let (decoded, _) = decode(bytes)?;
    Ok(SignatureImage {
        rgba: decoded.to_rgba8(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
        let mut box_ = vec![0, 0, 0, 24];
        box_.extend_from_slice(b"ftyp");
        box_.extend_from_slice(brand);
        box_.extend_from_slice(&[0, 0, 0, 0]);
        box_.extend_from_slice(b"mif1heic");
        box_
    }

    #[test]
    fn heif_brands_are_recognized() {
        assert!(is_heif(&ftyp(b"heic")));
        assert!(is_heif(&ftyp(b"mif1")));
        assert!(!is_heif(&ftyp(b"isom")));
        assert!(!is_heif(b"\xFF\xD8\xFF\xE0"));
    }
}
