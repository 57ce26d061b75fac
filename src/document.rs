//! Lifecycle of a document being edited.
//!
//! A session starts either blank ([`DocumentState::New`]) or from a file on
//! disk, and the state decides which actions are on offer:
//!
//! | state          | actions                                      |
//! |----------------|----------------------------------------------|
//! | New            | save as order, save as quote                 |
//! | ExistingOrder  | overwrite order, print, delete               |
//! | ExistingQuote  | overwrite quote, print, convert, delete      |
//!
//! Saving, converting and deleting consume the session; the editor starts
//! over (or reopens the result) afterwards.

use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{OrderError, Result};
use crate::record::{DocumentKind, Record};
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    New,
    ExistingOrder(PathBuf),
    ExistingQuote(PathBuf),
}

impl DocumentState {
    pub fn name(&self) -> &'static str {
        match self {
            DocumentState::New => "a new document",
            DocumentState::ExistingOrder(_) => "an existing order",
            DocumentState::ExistingQuote(_) => "an existing quote",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DocumentState::New => None,
            DocumentState::ExistingOrder(path) | DocumentState::ExistingQuote(path) => Some(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SaveAsOrder,
    SaveAsQuote,
    OverwriteOrder,
    OverwriteQuote,
    Print,
    ConvertToOrder,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::SaveAsOrder => "save as order",
            Action::SaveAsQuote => "save as quote",
            Action::OverwriteOrder => "save order",
            Action::OverwriteQuote => "save quote",
            Action::Print => "print",
            Action::ConvertToOrder => "convert to order",
            Action::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// A record saved by a session, ready to be printed
#[derive(Debug, Clone)]
pub struct SavedDocument {
    pub kind: DocumentKind,
    pub path: PathBuf,
    pub record: Record,
    /// Quote file that survived a conversion and must be removed by hand
    pub leftover_quote: Option<PathBuf>,
}

impl SavedDocument {
    /// Base name for printouts: the record file name without extension
    pub fn print_name(&self) -> String {
        print_name(&self.path)
    }
}

pub fn print_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The document currently in the editor
#[derive(Debug, Clone)]
pub struct DocumentSession {
    state: DocumentState,
    record: Record,
}

impl DocumentSession {
    /// Blank document with the editor's defaults
    pub fn new(today: NaiveDate) -> Self {
        Self::from_record(Record::new_blank(today))
    }

    pub fn from_record(record: Record) -> Self {
        Self {
            state: DocumentState::New,
            record,
        }
    }

    /// Open a record file; its directory decides whether it is an order or a quote
    pub fn open(store: &RecordStore, path: &Path) -> Result<Self> {
        let kind = store
            .kind_of(path)
            .ok_or_else(|| OrderError::NotARecordPath(path.to_path_buf()))?;
        let mut record = store.load(path)?;
        // The directory wins over the stored key, which legacy files may lack
        record.info_ordine.tipo_documento = kind;
        let state = match kind {
            DocumentKind::Order => DocumentState::ExistingOrder(path.to_path_buf()),
            DocumentKind::Quote => DocumentState::ExistingQuote(path.to_path_buf()),
        };
        Ok(Self { state, record })
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }

    /// Actions offered in the current state
    pub fn actions(&self) -> &'static [Action] {
        match self.state {
            DocumentState::New => &[Action::SaveAsOrder, Action::SaveAsQuote],
            DocumentState::ExistingOrder(_) => {
                &[Action::OverwriteOrder, Action::Print, Action::Delete]
            }
            DocumentState::ExistingQuote(_) => &[
                Action::OverwriteQuote,
                Action::Print,
                Action::ConvertToOrder,
                Action::Delete,
            ],
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        self.actions().contains(&action)
    }

    fn require(&self, action: Action) -> Result<()> {
        if self.allows(action) {
            return Ok(());
        }
        Err(self.unavailable(action))
    }

    fn unavailable(&self, action: Action) -> OrderError {
        OrderError::ActionNotAvailable {
            action,
            state: self.state.name(),
        }
    }

    /// Save the edited record as `kind`: a new file for new documents, the
    /// same file for existing ones.
    pub fn save(self, store: &RecordStore, kind: DocumentKind) -> Result<SavedDocument> {
        let action = match (&self.state, kind) {
            (DocumentState::New, DocumentKind::Order) => Action::SaveAsOrder,
            (DocumentState::New, DocumentKind::Quote) => Action::SaveAsQuote,
            (_, DocumentKind::Order) => Action::OverwriteOrder,
            (_, DocumentKind::Quote) => Action::OverwriteQuote,
        };
        self.require(action)?;

        let path = store.save(&self.record, kind, self.state.path())?;
        let mut record = self.record;
        record.finalize(kind);
        Ok(SavedDocument {
            kind,
            path,
            record,
            leftover_quote: None,
        })
    }

    /// Record and printout base name for the print action
    pub fn print_source(&self) -> Result<(&Record, String)> {
        self.require(Action::Print)?;
        let path = self
            .state
            .path()
            .ok_or_else(|| self.unavailable(Action::Print))?;
        Ok((&self.record, print_name(path)))
    }

    /// Turn the open quote into a new order; the quote file is removed.
    /// Unsaved edits are not carried over: the quote is converted as stored.
    pub fn convert_to_order(self, store: &RecordStore, today: NaiveDate) -> Result<SavedDocument> {
        let DocumentState::ExistingQuote(quote_path) = &self.state else {
            return Err(self.unavailable(Action::ConvertToOrder));
        };
        let conversion = store.convert_quote_to_order(quote_path, today)?;
        Ok(SavedDocument {
            kind: DocumentKind::Order,
            path: conversion.order_path,
            record: conversion.record,
            leftover_quote: conversion.leftover_quote,
        })
    }

    /// Delete the open record file; returns the removed path
    pub fn delete(self, store: &RecordStore) -> Result<PathBuf> {
        self.require(Action::Delete)?;
        let path = self
            .state
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| self.unavailable(Action::Delete))?;
        store.delete(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn new_session(name: &str) -> DocumentSession {
        let mut session = DocumentSession::new(today());
        session.record_mut().dati_cliente.nome_cliente = name.to_string();
        session
    }

    #[test]
    fn new_document_offers_only_saves() {
        let session = new_session("Rossi");
        assert_eq!(session.actions(), &[Action::SaveAsOrder, Action::SaveAsQuote]);
        assert!(!session.allows(Action::Print));
        assert!(matches!(
            session.print_source(),
            Err(OrderError::ActionNotAvailable { action: Action::Print, .. })
        ));
    }

    #[test]
    fn existing_order_hides_quote_actions() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let saved = new_session("Rossi").save(&store, DocumentKind::Order).unwrap();

        let session = DocumentSession::open(&store, &saved.path).unwrap();

        assert_eq!(session.state(), &DocumentState::ExistingOrder(saved.path.clone()));
        assert!(!session.allows(Action::ConvertToOrder));
        let err = session.save(&store, DocumentKind::Quote).unwrap_err();
        assert!(matches!(
            err,
            OrderError::ActionNotAvailable { action: Action::OverwriteQuote, .. }
        ));
    }

    #[test]
    fn existing_quote_overwrites_in_place() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let saved = new_session("Verdi").save(&store, DocumentKind::Quote).unwrap();

        let mut session = DocumentSession::open(&store, &saved.path).unwrap();
        session.record_mut().info_ordine.altro = "nastro doppio".to_string();
        let resaved = session.save(&store, DocumentKind::Quote).unwrap();

        assert_eq!(resaved.path, saved.path);
        assert_eq!(store.load(&saved.path).unwrap().info_ordine.altro, "nastro doppio");
    }

    #[test]
    fn quote_conversion_yields_an_order() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let quote = new_session("Bianchi").save(&store, DocumentKind::Quote).unwrap();

        let session = DocumentSession::open(&store, &quote.path).unwrap();
        let order = session.convert_to_order(&store, today()).unwrap();

        assert!(!quote.path.exists());
        let reopened = DocumentSession::open(&store, &order.path).unwrap();
        assert!(matches!(reopened.state(), DocumentState::ExistingOrder(_)));
        assert_eq!(order.print_name(), "Ordine_Bianchi_2025-05-10");
    }

    #[test]
    fn print_source_uses_file_stem() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let saved = new_session("Neri").save(&store, DocumentKind::Order).unwrap();

        let session = DocumentSession::open(&store, &saved.path).unwrap();
        let (record, name) = session.print_source().unwrap();

        assert_eq!(record.customer_name(), "Neri");
        assert_eq!(name, "Ordine_Neri_2025-05-10");
    }

    #[test]
    fn legacy_quote_without_kind_is_treated_as_quote() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let quotes = store.dir_for(DocumentKind::Quote).to_path_buf();
        std::fs::create_dir_all(&quotes).unwrap();
        let path = quotes.join("Preventivo_X_2025-01-01.json");
        std::fs::write(
            &path,
            r#"{"info_ordine": {}, "dati_cliente": {"nome_cliente": "X"}, "dettagli_ordine": [{"ditta": "ETM", "codice": "A", "descrizione": "scatola", "quantita": "4", "prezzo_unitario": "1.5"}]}"#,
        )
        .unwrap();

        let session = DocumentSession::open(&store, &path).unwrap();
        assert_eq!(session.record().kind(), DocumentKind::Quote);

        let layout = crate::config::TemplateLayout::builtin().unwrap();
        let mut sheet = crate::print::MemorySheet::new();
        let (record, _) = session.print_source().unwrap();
        let report = crate::print::project(record, &layout, &mut sheet);

        assert_eq!(report.grand_total, None);
        assert!(sheet.is_blank(layout.items.total_cell()));
    }

    #[test]
    fn open_outside_store_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let stray = temp.path().join("stray.json");
        std::fs::write(&stray, "{}").unwrap();

        assert!(matches!(
            DocumentSession::open(&store, &stray),
            Err(OrderError::NotARecordPath(_))
        ));
    }

    #[test]
    fn delete_consumes_existing_document() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::in_data_dir(temp.path());
        let saved = new_session("Gialli").save(&store, DocumentKind::Order).unwrap();

        let session = DocumentSession::open(&store, &saved.path).unwrap();
        let removed = session.delete(&store).unwrap();

        assert_eq!(removed, saved.path);
        assert!(!removed.exists());
    }
}
