mod config;
mod delivery;
mod error;
mod fonts;
#[cfg(feature = "cli")]
mod manifest;
mod model;
mod pdf;
mod photo;
mod sanitize;

pub use config::{Branding, PageGeometry, ReportConfig};
pub use delivery::{DirectorySink, EmailDraft, ReportSink};
pub use error::{BlockKind, Error, ValidationError};
#[cfg(feature = "cli")]
pub use manifest::{Manifest, ManifestClassification, ManifestObservation, parse_date, parse_time};
pub use model::{
    Classification, DrawOp, FontStyle, ImageAsset, ImageId, ImagePosition,
    MAX_PHOTOS_PER_OBSERVATION, Observation, PageLayout, Report, ReportInput, VisitRecord,
    report_file_name,
};
pub use pdf::compose_report;
pub use photo::{
    NormalizedImage, PhotoError, Rotation, heuristic_rotation, normalize_image,
    read_exif_orientation,
};
pub use sanitize::sanitize_text;

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compose a report and write it into `dir` under its dated file name.
pub fn generate_report(
    input: &ReportInput,
    config: &ReportConfig,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let t0 = Instant::now();

    let report = compose_report(input, config)?;
    let t_compose = t0.elapsed();

    let draft = EmailDraft::for_report(&input.visit, &report);
    let mut sink = DirectorySink::new(dir);
    sink.deliver(&report, &draft)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: compose={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes, {} pages)",
        t_compose.as_secs_f64() * 1000.0,
        (t_total - t_compose).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.bytes().len(),
        report.page_count(),
    );

    Ok(dir.join(report.file_name()))
}
