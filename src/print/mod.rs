mod convert;
mod dispatch;
mod projection;
pub mod sheet;

pub use convert::{convert_to_pdf, find_converter, CONVERSION_TIMEOUT};
pub use dispatch::{print_or_open, Delivery};
pub use projection::{project, ProjectionReport, TOTAL_LABEL};
pub use sheet::{CellSink, CellValue, MemorySheet, OdsSheet};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{AppPaths, TemplateLayout};
use crate::error::Result;
use crate::record::Record;
use crate::store::sanitize_file_stem;

/// Everything needed to turn a record into a printout
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub template: PathBuf,
    pub layout: TemplateLayout,
    pub output_dir: PathBuf,
    pub converter: PathBuf,
    pub timeout: Duration,
}

impl PrintJob {
    pub fn from_paths(paths: &AppPaths) -> Result<Self> {
        Ok(Self {
            template: paths.template_path(),
            layout: paths.load_layout()?,
            output_dir: paths.output_dir(),
            converter: find_converter(),
            timeout: CONVERSION_TIMEOUT,
        })
    }
}

/// Files produced for one record
#[derive(Debug, Clone)]
pub struct Printout {
    pub spreadsheet: PathBuf,
    pub pdf: Option<PathBuf>,
    pub report: ProjectionReport,
    /// Problems the user should hear about that did not stop the printout
    pub warnings: Vec<String>,
}

impl Printout {
    /// The file to hand to the printer: the PDF, or the spreadsheet when
    /// conversion failed
    pub fn target(&self) -> &Path {
        self.pdf.as_deref().unwrap_or(&self.spreadsheet)
    }
}

/// Fill the template with `record`, save it as `<base_name>.ods` in the output
/// directory and convert it to PDF.
pub fn render(record: &Record, base_name: &str, job: &PrintJob) -> Result<Printout> {
    let mut sheet = OdsSheet::open(&job.template)?;
    fs::create_dir_all(&job.output_dir)?;

    let report = project(record, &job.layout, &mut sheet);
    let mut warnings = Vec::new();
    if let Some(message) = report.truncation_warning() {
        warn!(
            items = report.total_items,
            rows = report.available_rows,
            "line items truncated on printout"
        );
        warnings.push(message);
    }

    let mut stem = sanitize_file_stem(base_name);
    if stem.trim().is_empty() {
        stem = "stampa".to_string();
    }
    let spreadsheet = job.output_dir.join(format!("{stem}.ods"));
    sheet.save_as(&spreadsheet)?;
    info!(path = %spreadsheet.display(), "wrote printout spreadsheet");

    let pdf = match convert_to_pdf(&job.converter, &spreadsheet, &job.output_dir, job.timeout) {
        Ok(pdf) => Some(pdf),
        Err(e) => {
            warn!(error = %e, "PDF conversion failed, falling back to the spreadsheet");
            warnings.push(format!("{e}. The spreadsheet will be printed instead."));
            None
        }
    };

    Ok(Printout {
        spreadsheet,
        pdf,
        report,
        warnings,
    })
}
