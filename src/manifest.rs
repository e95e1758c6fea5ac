//! JSON description of a visit, as produced by the intake form, with image
//! references resolved relative to the manifest file.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::error::Error;
use crate::model::{Classification, ImageAsset, Observation, ReportInput, VisitRecord};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub date: String,
    #[serde(default)]
    pub address: String,
    pub author: String,
    #[serde(default)]
    pub building_code: String,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub persons_present: Option<String>,
    pub main_photo: Option<PathBuf>,
    pub signature: Option<PathBuf>,
    #[serde(default)]
    pub observations: Vec<ManifestObservation>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestObservation {
    pub classification: ManifestClassification,
    pub description: String,
    pub action: Option<String>,
    #[serde(default)]
    pub photos: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestClassification {
    Positive,
    NeedsImprovement,
}

impl From<ManifestClassification> for Classification {
    fn from(c: ManifestClassification) -> Self {
        match c {
            ManifestClassification::Positive => Classification::Positive,
            ManifestClassification::NeedsImprovement => Classification::NeedsImprovement,
        }
    }
}

/// Accepts `DD/MM/YYYY` (as typed in the form) and ISO `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| Error::InvalidManifest(format!("unrecognized date {s:?}")))
}

/// Accepts `HH:MM` and `HH:MM:SS`; blank means not recorded.
pub fn parse_time(s: &str) -> Result<Option<NaiveTime>, Error> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| Error::InvalidManifest(format!("unrecognized time {s:?}")))
}

fn read_image(base: &Path, rel: &Path) -> Result<ImageAsset, Error> {
    let path = base.join(rel);
    let data = std::fs::read(&path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    Ok(ImageAsset::new(data))
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::InvalidManifest(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        Self::from_json(&text)
    }

    /// Build the composer input, reading every referenced image from `base`.
    pub fn into_input(self, base: &Path) -> Result<ReportInput, Error> {
        let visit = VisitRecord {
            date: parse_date(&self.date)?,
            address: self.address,
            author: self.author,
            arrival_time: self.arrival_time.as_deref().map(parse_time).transpose()?.flatten(),
            departure_time: self
                .departure_time
                .as_deref()
                .map(parse_time)
                .transpose()?
                .flatten(),
            building_code: self.building_code,
            persons_present: self.persons_present,
        };

        let observations = self
            .observations
            .into_iter()
            .map(|obs| -> Result<Observation, Error> {
                let photos = obs
                    .photos
                    .iter()
                    .map(|p| read_image(base, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Observation {
                    classification: obs.classification.into(),
                    description: obs.description,
                    action: obs.action,
                    photos,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReportInput {
            visit,
            observations,
            main_photo: self.main_photo.map(|p| read_image(base, &p)).transpose()?,
            signature: self.signature.map(|p| read_image(base, &p)).transpose()?,
        })
    }
}
