pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod print;
pub mod record;
pub mod store;

pub use config::{AppPaths, Settings, TemplateLayout};
pub use document::{Action, DocumentSession, DocumentState, SavedDocument};
pub use error::{OrderError, Result};
pub use print::{print_or_open, render, Delivery, PrintJob, Printout};
pub use record::{DocumentKind, LineItem, Record};
pub use store::{RecordStore, RecordSummary};
