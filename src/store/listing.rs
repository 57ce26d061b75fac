use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::record::parse_iso_date;

const UNKNOWN_CUSTOMER: &str = "Sconosciuto";

/// What a listing shows for one record file
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub file_name: String,
    pub customer_name: String,
    /// `None` when the stored date is missing or unreadable
    pub ceremony_date: Option<NaiveDate>,
    pub path: PathBuf,
}

impl RecordSummary {
    pub fn display_date(&self) -> String {
        match self.ceremony_date {
            Some(date) => date.format("%d/%m/%Y").to_string(),
            None => "N.D.".to_string(),
        }
    }
}

// Only the two keys the listing needs; the rest of the file is ignored.
#[derive(Deserialize)]
struct SummaryFile {
    #[serde(default)]
    info_ordine: SummaryInfo,
    #[serde(default)]
    dati_cliente: SummaryCustomer,
}

#[derive(Deserialize, Default)]
struct SummaryInfo {
    #[serde(default)]
    data_cerimonia: Option<String>,
}

#[derive(Deserialize, Default)]
struct SummaryCustomer {
    #[serde(default)]
    nome_cliente: Option<String>,
}

/// Summaries of every `*.json` record in `dir`, oldest ceremony first with
/// undated records ahead of all others. Unreadable files are skipped.
pub fn scan_dir(dir: &Path) -> Result<Vec<RecordSummary>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut summaries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") || !path.is_file() {
            continue;
        }
        match read_summary(&path) {
            Ok(summary) => summaries.push(summary),
            Err(reason) => debug!(path = %path.display(), %reason, "skipping unreadable record"),
        }
    }

    sort_by_ceremony(&mut summaries);
    Ok(summaries)
}

fn read_summary(path: &Path) -> std::result::Result<RecordSummary, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let file: SummaryFile = serde_json::from_str(&content).map_err(|e| e.to_string())?;

    let customer_name = file
        .dati_cliente
        .nome_cliente
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());
    let ceremony_date = file
        .info_ordine
        .data_cerimonia
        .as_deref()
        .and_then(parse_iso_date);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(RecordSummary {
        file_name,
        customer_name,
        ceremony_date,
        path: path.to_path_buf(),
    })
}

/// Ascending by ceremony date, undated first; file name breaks ties so the
/// order (and therefore list indices) is stable between runs.
pub fn sort_by_ceremony(summaries: &mut [RecordSummary]) {
    summaries.sort_by(|a, b| {
        a.ceremony_date
            .cmp(&b.ceremony_date)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
}

/// Case-insensitive customer-name search. Blank queries match everything.
/// Each hit keeps its 1-based position in the unfiltered list.
pub fn search<'a>(summaries: &'a [RecordSummary], query: &str) -> Vec<(usize, &'a RecordSummary)> {
    let needle = query.trim().to_lowercase();
    summaries
        .iter()
        .enumerate()
        .filter(|(_, s)| needle.is_empty() || s.customer_name.to_lowercase().contains(&needle))
        .map(|(idx, s)| (idx + 1, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, customer: &str, date: &str) {
        let body = format!(
            r#"{{"info_ordine": {{"data_cerimonia": "{date}"}}, "dati_cliente": {{"nome_cliente": "{customer}"}}, "dettagli_ordine": []}}"#
        );
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn sorts_by_date_with_undated_first_and_skips_corrupt_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "b.json", "Bianchi", "2025-09-10");
        write(dir, "a.json", "Azzurri", "2025-03-01");
        write(dir, "n.json", "Neri", "non una data");
        fs::write(dir.join("broken.json"), "{ nope").unwrap();
        fs::write(dir.join("readme.txt"), "ignored").unwrap();

        let list = scan_dir(dir).unwrap();

        let names: Vec<_> = list.iter().map(|s| s.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Neri", "Azzurri", "Bianchi"]);
        assert_eq!(list[0].ceremony_date, None);
        assert_eq!(list[0].display_date(), "N.D.");
        assert_eq!(list[2].display_date(), "10/09/2025");
    }

    #[test]
    fn missing_customer_shows_as_unknown() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("x.json"), r#"{"info_ordine": {}}"#).unwrap();

        let list = scan_dir(temp.path()).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].customer_name, UNKNOWN_CUSTOMER);
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(scan_dir(&temp.path().join("orders")).unwrap().is_empty());
    }

    #[test]
    fn search_keeps_list_positions() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "1.json", "Maria Rossi", "2025-01-01");
        write(dir, "2.json", "Luca Verdi", "2025-02-01");
        write(dir, "3.json", "Anna ROSSI", "2025-03-01");
        let list = scan_dir(dir).unwrap();

        let hits = search(&list, "  rossi ");
        let positions: Vec<_> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![1, 3]);

        assert_eq!(search(&list, "   ").len(), 3);
        assert!(search(&list, "bianchi").is_empty());
    }
}
