//! Hand-off of a finished report to whoever transports it (email, disk).

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{Report, VisitRecord};
use crate::sanitize::sanitize_text;

/// Text of the email that accompanies a report. Transport is not handled
/// here; the draft only carries what the sender needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
}

impl EmailDraft {
    pub fn for_report(visit: &VisitRecord, report: &Report) -> Self {
        let address = sanitize_text(visit.address.trim());
        let date = visit.date.format("%Y-%m-%d");
        let subject = format!("Rapport de visite - {address} - {date}");
        let body = format!(
            "Bonjour,\n\n\
             Veuillez trouver ci-joint le rapport de la visite effectuee le {date} \
             a l'adresse : {address}.\n\n\
             Cordialement,\n\
             Service Syndic\n"
        );
        Self {
            subject,
            body,
            attachment_name: report.file_name().to_string(),
        }
    }
}

/// Destination for finished reports.
pub trait ReportSink {
    fn deliver(&mut self, report: &Report, draft: &EmailDraft) -> Result<(), Error>;
}

/// Writes each report into a directory under its artifact name.
pub struct DirectorySink {
    dir: PathBuf,
    delivered: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            delivered: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in delivery order.
    pub fn delivered(&self) -> &[PathBuf] {
        &self.delivered
    }
}

impl ReportSink for DirectorySink {
    fn deliver(&mut self, report: &Report, draft: &EmailDraft) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dir).map_err(Error::Io)?;
        let path = self.dir.join(&draft.attachment_name);
        std::fs::write(&path, report.bytes()).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            ))
        })?;
        log::info!("Wrote {} ({} bytes)", path.display(), report.bytes().len());
        self.delivered.push(path);
        Ok(())
    }
}
