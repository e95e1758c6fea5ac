#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use visit_report::{Classification, ImageAsset, Observation, ReportInput, VisitRecord};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Output directory for files a test writes: tests/output/<case>/
pub fn output_dir(case: &str) -> PathBuf {
    PathBuf::from("tests/output").join(case)
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

/// Baseline JPEG without any metadata.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    gradient(width, height)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 90))
        .unwrap();
    out
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Lossless WebP, as exported by some Android galleries.
pub fn webp(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, ImageFormat::WebP)
        .unwrap();
    out.into_inner()
}

/// A HEIC `ftyp` box followed by no image data.
pub fn heic_header_only() -> Vec<u8> {
    let mut out = vec![0, 0, 0, 24];
    out.extend_from_slice(b"ftypheic");
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(b"mif1heic");
    out
}

/// Signature-like PNG: dark strokes on a transparent canvas.
pub fn signature_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 7 == 0 {
            Rgba([10, 10, 60, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// APP1 segment carrying a big-endian TIFF block with a single
/// Orientation (0x0112) entry.
fn exif_app1(orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// JPEG whose stored pixels are `width`×`height`, tagged with an EXIF
/// orientation right after the SOI marker.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let plain = jpeg(width, height);
    assert_eq!(&plain[..2], &[0xFF, 0xD8]);
    let mut out = plain[..2].to_vec();
    out.extend_from_slice(&exif_app1(orientation));
    out.extend_from_slice(&plain[2..]);
    out
}

pub fn visit() -> VisitRecord {
    VisitRecord {
        date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        address: "12 rue des Lilas, 69003 Lyon".into(),
        author: "Camille Martin".into(),
        arrival_time: NaiveTime::from_hms_opt(9, 30, 0),
        departure_time: NaiveTime::from_hms_opt(10, 45, 0),
        building_code: "B1234".into(),
        persons_present: Some("Le président du conseil syndical".into()),
    }
}

pub fn observation(classification: Classification, description: &str) -> Observation {
    Observation {
        classification,
        description: description.into(),
        action: None,
        photos: Vec::new(),
    }
}

/// Landscape main photo, one positive observation, signed.
pub fn sample_input() -> ReportInput {
    ReportInput {
        visit: visit(),
        observations: vec![observation(
            Classification::Positive,
            "Parties communes propres et bien entretenues.",
        )],
        main_photo: Some(ImageAsset::new(jpeg(80, 60))),
        signature: Some(ImageAsset::new(signature_png(200, 80))),
    }
}
