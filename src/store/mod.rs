mod listing;
mod naming;

pub use listing::{search, sort_by_ceremony, RecordSummary};
pub use naming::{base_name, sanitize_file_stem, slug, unique_path};

use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::error::{OrderError, Result};
use crate::record::{DocumentKind, Record};

/// Outcome of turning a quote into an order
#[derive(Debug, Clone)]
pub struct Conversion {
    pub order_path: PathBuf,
    pub record: Record,
    /// Set when the quote file could not be removed after the order was
    /// written. The order is the record of truth; the quote needs manual
    /// cleanup.
    pub leftover_quote: Option<PathBuf>,
}

/// Orders and quotes kept as one JSON file each, in two directories
#[derive(Debug, Clone)]
pub struct RecordStore {
    orders_dir: PathBuf,
    quotes_dir: PathBuf,
}

impl RecordStore {
    pub fn new(orders_dir: PathBuf, quotes_dir: PathBuf) -> Self {
        Self {
            orders_dir,
            quotes_dir,
        }
    }

    /// Store rooted at `<data_dir>/orders` and `<data_dir>/quotes`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("orders"), data_dir.join("quotes"))
    }

    pub fn dir_for(&self, kind: DocumentKind) -> &Path {
        match kind {
            DocumentKind::Order => &self.orders_dir,
            DocumentKind::Quote => &self.quotes_dir,
        }
    }

    /// Which directory, if any, `path` lives in
    pub fn kind_of(&self, path: &Path) -> Option<DocumentKind> {
        let parent = path.parent()?;
        [DocumentKind::Order, DocumentKind::Quote]
            .into_iter()
            .find(|kind| same_dir(parent, self.dir_for(*kind)))
    }

    /// Persist `record` as `kind`.
    ///
    /// An `existing` path already inside the kind's directory is overwritten in
    /// place; anything else gets a fresh collision-free name. The file is
    /// written to a temporary sibling first so a failed write leaves no
    /// partial record behind.
    pub fn save(&self, record: &Record, kind: DocumentKind, existing: Option<&Path>) -> Result<PathBuf> {
        if record.customer_name().trim().is_empty() {
            return Err(OrderError::MissingCustomerName);
        }

        let mut record = record.clone();
        record.finalize(kind);

        let dir = self.dir_for(kind);
        fs::create_dir_all(dir)?;

        let target = match existing {
            Some(path) if self.kind_of(path) == Some(kind) => path.to_path_buf(),
            _ => {
                let base = base_name(
                    kind.file_prefix(),
                    record.customer_name(),
                    &record.info_ordine.data_cerimonia,
                );
                unique_path(dir, &base)
            }
        };

        write_json(&target, &record)?;
        info!(path = %target.display(), %kind, "saved record");
        Ok(target)
    }

    pub fn load(&self, path: &Path) -> Result<Record> {
        if !path.is_file() {
            return Err(OrderError::RecordNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| OrderError::RecordParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Every readable record of `kind`, sorted by ceremony date.
    /// The directory is re-read on every call.
    pub fn list(&self, kind: DocumentKind) -> Result<Vec<RecordSummary>> {
        listing::scan_dir(self.dir_for(kind))
    }

    /// Remove a record file for good
    pub fn delete(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            warn!(path = %path.display(), "delete requested for missing record");
            return Err(OrderError::RecordNotFound(path.to_path_buf()));
        }
        fs::remove_file(path).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "could not delete record");
        })?;
        info!(path = %path.display(), "deleted record");
        Ok(())
    }

    /// Rewrite a quote as a brand-new order dated `today`, then remove the
    /// quote. This is copy-then-delete: if the delete fails the new order
    /// stands and the quote is reported as left over.
    pub fn convert_quote_to_order(&self, quote_path: &Path, today: NaiveDate) -> Result<Conversion> {
        let mut record = self.load(quote_path)?;
        record.info_ordine.tipo_documento = DocumentKind::Order;
        record.info_ordine.data_ordine = today.format("%Y-%m-%d").to_string();

        let order_path = self.save(&record, DocumentKind::Order, None)?;
        record.finalize(DocumentKind::Order);

        let leftover_quote = match fs::remove_file(quote_path) {
            Ok(()) => None,
            Err(e) => {
                error!(
                    quote = %quote_path.display(),
                    order = %order_path.display(),
                    error = %e,
                    "order written but quote could not be removed"
                );
                Some(quote_path.to_path_buf())
            }
        };

        info!(from = %quote_path.display(), to = %order_path.display(), "converted quote to order");
        Ok(Conversion {
            order_path,
            record,
            leftover_quote,
        })
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Pretty JSON with 4-space indentation, keys in struct order
fn write_json(path: &Path, record: &Record) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut serializer)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &buf)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
