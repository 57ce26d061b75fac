mod amount;
pub mod vocab;

pub use amount::{format_amount, line_total, parse_amount};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment method that enables the two deposit slots
pub const DEPOSIT_PAYMENT: &str = "Acconto";

/// Most line items a record can be given through the editor
pub const MAX_LINE_ITEMS: usize = 13;

/// Discriminator between orders and quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentKind {
    #[default]
    #[serde(rename = "ordine")]
    Order,
    #[serde(rename = "preventivo")]
    Quote,
}

impl DocumentKind {
    /// Prefix used for the record file names
    pub fn file_prefix(self) -> &'static str {
        match self {
            DocumentKind::Order => "Ordine",
            DocumentKind::Quote => "Preventivo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Order => "order",
            DocumentKind::Quote => "quote",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Legacy files may lack any of these keys, so every field defaults to "".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderInfo {
    pub data_ordine: String,
    pub operatore: String,
    pub data_cerimonia: String,
    pub data_consegna: String,
    pub tipo_cerimonia: String,
    pub colore_nastri: String,
    pub tipo_confetti: String,
    pub colore_confetti: String,
    pub confezione: String,
    pub pagamento: String,
    pub altro: String,
    pub tipo_documento: DocumentKind,
    pub acconto1_tipo: String,
    pub acconto1_importo: String,
    pub acconto2_tipo: String,
    pub acconto2_importo: String,
}

impl OrderInfo {
    /// Selected confetti types, split from their stored comma-joined form
    pub fn confetti_types(&self) -> Vec<&str> {
        self.tipo_confetti
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn set_confetti_types<S: AsRef<str>>(&mut self, types: &[S]) {
        self.tipo_confetti = types
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
    }

    /// Deposit slots as (type, amount) pairs
    pub fn deposits(&self) -> [(&str, &str); 2] {
        [
            (&self.acconto1_tipo, &self.acconto1_importo),
            (&self.acconto2_tipo, &self.acconto2_importo),
        ]
    }

    pub fn takes_deposits(&self) -> bool {
        self.pagamento == DEPOSIT_PAYMENT
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub nome_cliente: String,
    pub telefono_cliente: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub ditta: String,
    pub codice: String,
    pub descrizione: String,
    pub prezzo_unitario: String,
    pub quantita: String,
    pub prezzo_totale: String,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            ditta: String::new(),
            codice: String::new(),
            descrizione: String::new(),
            prezzo_unitario: "0".to_string(),
            quantita: "0".to_string(),
            prezzo_totale: "0.00".to_string(),
        }
    }
}

impl LineItem {
    pub fn new(
        company: &str,
        code: &str,
        description: &str,
        quantity: &str,
        unit_price: &str,
    ) -> Self {
        let mut item = Self {
            ditta: company.trim().to_string(),
            codice: code.trim().to_string(),
            descrizione: description.trim().to_string(),
            prezzo_unitario: unit_price.trim().to_string(),
            quantita: quantity.trim().to_string(),
            prezzo_totale: String::new(),
        };
        item.refresh_total();
        item
    }

    /// A row with no company, code or description carries nothing worth keeping
    pub fn is_blank(&self) -> bool {
        self.ditta.trim().is_empty()
            && self.codice.trim().is_empty()
            && self.descrizione.trim().is_empty()
    }

    pub fn quantity(&self) -> f64 {
        parse_amount(&self.quantita)
    }

    pub fn unit_price(&self) -> f64 {
        parse_amount(&self.prezzo_unitario)
    }

    pub fn total(&self) -> f64 {
        line_total(self.quantity(), self.unit_price())
    }

    pub fn refresh_total(&mut self) {
        self.prezzo_totale = format_amount(self.total());
    }
}

/// One order or quote document as persisted on disk
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub info_ordine: OrderInfo,
    pub dati_cliente: Customer,
    pub dettagli_ordine: Vec<LineItem>,
}

impl Record {
    /// A record filled with the editor's defaults for a fresh document
    pub fn new_blank(today: NaiveDate) -> Self {
        let today = today.format("%Y-%m-%d").to_string();
        Self {
            info_ordine: OrderInfo {
                data_ordine: today.clone(),
                operatore: vocab::OPERATORS[0].to_string(),
                data_cerimonia: today.clone(),
                data_consegna: today,
                tipo_cerimonia: vocab::CEREMONY_TYPES[0].to_string(),
                tipo_confetti: vocab::CONFETTI_TYPES[0].to_string(),
                colore_confetti: vocab::CONFETTI_COLORS[0].to_string(),
                pagamento: vocab::PAYMENT_METHODS[0].to_string(),
                ..OrderInfo::default()
            },
            ..Self::default()
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.info_ordine.tipo_documento
    }

    pub fn customer_name(&self) -> &str {
        &self.dati_cliente.nome_cliente
    }

    /// Brings the record into the shape it is persisted in: kind stamped,
    /// deposits cleared unless paid by deposit, blank rows dropped and line
    /// totals recomputed.
    pub fn finalize(&mut self, kind: DocumentKind) {
        self.info_ordine.tipo_documento = kind;

        if !self.info_ordine.takes_deposits() {
            self.info_ordine.acconto1_tipo.clear();
            self.info_ordine.acconto1_importo.clear();
            self.info_ordine.acconto2_tipo.clear();
            self.info_ordine.acconto2_importo.clear();
        }

        self.dettagli_ordine.retain(|item| !item.is_blank());
        for item in &mut self.dettagli_ordine {
            item.refresh_total();
        }
    }

    /// Sum of all line totals, rounded to cents
    pub fn grand_total(&self) -> f64 {
        let sum: f64 = self.dettagli_ordine.iter().map(LineItem::total).sum();
        (sum * 100.0).round() / 100.0
    }
}

/// Parse a stored ISO date; accepts a bare date or a date-time.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Date as shown to the shop: DD/MM/YYYY, or "N.D." when missing or unreadable
pub fn display_date(value: &str) -> String {
    match parse_iso_date(value) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => "N.D.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_clears_deposits_for_other_payments() {
        let mut record = Record::default();
        record.info_ordine.pagamento = "Consegna".to_string();
        record.info_ordine.acconto1_tipo = "Contanti".to_string();
        record.info_ordine.acconto1_importo = "50".to_string();

        record.finalize(DocumentKind::Order);

        assert_eq!(record.info_ordine.acconto1_tipo, "");
        assert_eq!(record.info_ordine.acconto1_importo, "");
        assert_eq!(record.info_ordine.tipo_documento, DocumentKind::Order);
    }

    #[test]
    fn finalize_keeps_deposits_when_paid_by_deposit() {
        let mut record = Record::default();
        record.info_ordine.pagamento = DEPOSIT_PAYMENT.to_string();
        record.info_ordine.acconto2_tipo = "Bonifico".to_string();
        record.info_ordine.acconto2_importo = "20,50".to_string();

        record.finalize(DocumentKind::Quote);

        assert_eq!(record.info_ordine.acconto2_tipo, "Bonifico");
        assert_eq!(record.info_ordine.acconto2_importo, "20,50");
        assert_eq!(record.kind(), DocumentKind::Quote);
    }

    #[test]
    fn finalize_drops_blank_rows_and_recomputes_totals() {
        let mut record = Record::default();
        let mut item = LineItem::new("BAGUTTA", "A1", "Scatolina", "3", "2,50");
        item.prezzo_totale = "999".to_string();
        record.dettagli_ordine.push(item);
        record.dettagli_ordine.push(LineItem::default());

        record.finalize(DocumentKind::Order);

        assert_eq!(record.dettagli_ordine.len(), 1);
        assert_eq!(record.dettagli_ordine[0].prezzo_totale, "7.50");
    }

    #[test]
    fn kind_serializes_with_legacy_names() {
        let json = serde_json::to_string(&DocumentKind::Quote).unwrap();
        assert_eq!(json, "\"preventivo\"");
        let kind: DocumentKind = serde_json::from_str("\"ordine\"").unwrap();
        assert_eq!(kind, DocumentKind::Order);
    }

    #[test]
    fn legacy_record_without_optional_keys_loads() {
        let json = r#"{
            "info_ordine": {"data_ordine": "2024-05-01", "data_cerimonia": "2024-06-02"},
            "dati_cliente": {"nome_cliente": "Rossi"},
            "dettagli_ordine": [{"ditta": "ETM", "quantita": "2", "prezzo_unitario": "1.5"}]
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.customer_name(), "Rossi");
        assert_eq!(record.info_ordine.data_consegna, "");
        assert_eq!(record.kind(), DocumentKind::Order);
        assert_eq!(record.dettagli_ordine[0].total(), 3.0);
    }

    #[test]
    fn confetti_types_round_trip_through_joined_string() {
        let mut info = OrderInfo::default();
        info.set_confetti_types(&["Mandorla", " Snob ", ""]);
        assert_eq!(info.tipo_confetti, "Mandorla, Snob");
        assert_eq!(info.confetti_types(), vec!["Mandorla", "Snob"]);
    }

    #[test]
    fn dates_display_or_fall_back() {
        assert_eq!(display_date("2025-09-14"), "14/09/2025");
        assert_eq!(display_date("2025-09-14T10:30:00"), "14/09/2025");
        assert_eq!(display_date(""), "N.D.");
        assert_eq!(display_date("domani"), "N.D.");
    }

    #[test]
    fn grand_total_sums_rounded_lines() {
        let mut record = Record::default();
        record
            .dettagli_ordine
            .push(LineItem::new("", "", "a", "3", "0,333"));
        record
            .dettagli_ordine
            .push(LineItem::new("", "", "b", "1", "10.50"));
        assert_eq!(record.grand_total(), 11.5);
    }
}
