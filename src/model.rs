use std::fmt;

use chrono::{NaiveDate, NaiveTime};

pub const MAX_PHOTOS_PER_OBSERVATION: usize = 3;

/// Site visit facts shown in the information table on the first page.
#[derive(Clone, Debug)]
pub struct VisitRecord {
    pub date: NaiveDate,
    pub address: String,
    pub author: String,
    pub arrival_time: Option<NaiveTime>,
    pub departure_time: Option<NaiveTime>,
    pub building_code: String,
    pub persons_present: Option<String>,
}

impl VisitRecord {
    /// `DD/MM/YYYY`, the format printed in the report.
    pub fn display_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }

    pub(crate) fn persons_present(&self) -> Option<&str> {
        self.persons_present
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Positive,
    NeedsImprovement,
}

impl Classification {
    pub fn label(self) -> &'static str {
        match self {
            Classification::Positive => "Positive",
            Classification::NeedsImprovement => "A améliorer",
        }
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            Classification::Positive => [0, 150, 0],
            Classification::NeedsImprovement => [200, 0, 0],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Observation {
    pub classification: Classification,
    pub description: String,
    pub action: Option<String>,
    pub photos: Vec<ImageAsset>,
}

impl Observation {
    pub(crate) fn action(&self) -> Option<&str> {
        self.action
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Encoded image bytes exactly as uploaded (JPEG, PNG, ...).
#[derive(Clone)]
pub struct ImageAsset {
    pub data: Vec<u8>,
}

impl ImageAsset {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Everything the composer needs for one report.
#[derive(Clone, Debug)]
pub struct ReportInput {
    pub visit: VisitRecord,
    pub observations: Vec<Observation>,
    pub main_photo: Option<ImageAsset>,
    pub signature: Option<ImageAsset>,
}

/// Where an image sits in the input, used to name it in error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImagePosition {
    MainPhoto,
    Observation { observation: usize, photo: usize },
    Signature,
}

impl fmt::Display for ImagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImagePosition::MainPhoto => write!(f, "main photo"),
            ImagePosition::Observation { observation, photo } => {
                write!(f, "observation {}, photo {}", observation + 1, photo + 1)
            }
            ImagePosition::Signature => write!(f, "signature"),
        }
    }
}

/// `rapport_visite_<YYYYMMDD>.pdf`
pub fn report_file_name(date: NaiveDate) -> String {
    format!("rapport_visite_{}.pdf", date.format("%Y%m%d"))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// Index of an image XObject written into the output document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageId(pub(crate) usize);

impl ImageId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One drawing command. Coordinates are millimetres from the top-left corner
/// of the page; text `y` is the baseline.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [u8; 3],
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [u8; 3],
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        style: FontStyle,
        size: f32,
        color: [u8; 3],
    },
    Image {
        id: ImageId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Drawing commands of a single page, in paint order.
#[derive(Clone, Debug, Default)]
pub struct PageLayout {
    pub(crate) ops: Vec<DrawOp>,
}

impl PageLayout {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Image { .. }))
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// A finished report. Built once by the composer and never modified.
pub struct Report {
    pub(crate) bytes: Vec<u8>,
    pub(crate) pages: Vec<PageLayout>,
    pub(crate) file_name: String,
}

impl Report {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageLayout] {
        &self.pages
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("file_name", &self.file_name)
            .field("pages", &self.pages.len())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
