use crate::config::layout::TextField;
use crate::config::{CellRef, TemplateLayout};
use crate::record::{display_date, parse_amount, DocumentKind, Record};

use super::sheet::CellSink;

/// Label written next to an order's grand total
pub const TOTAL_LABEL: &str = "TOTALE";

/// What a projection did with the line items
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionReport {
    pub total_items: usize,
    pub written_items: usize,
    pub available_rows: usize,
    /// Grand total of the written rows; `None` for quotes, which show no total
    pub grand_total: Option<f64>,
}

impl ProjectionReport {
    pub fn truncated(&self) -> bool {
        self.total_items > self.available_rows
    }

    pub fn truncation_warning(&self) -> Option<String> {
        self.truncated().then(|| {
            format!(
                "the record has {} line items but the template only has room for {}; the extra items were not printed",
                self.total_items, self.available_rows
            )
        })
    }
}

fn field_value(record: &Record, field: TextField) -> String {
    let info = &record.info_ordine;
    let customer = &record.dati_cliente;
    let raw = match field {
        TextField::CustomerName => &customer.nome_cliente,
        TextField::CustomerPhone => &customer.telefono_cliente,
        TextField::OrderDate => &info.data_ordine,
        TextField::CeremonyDate => &info.data_cerimonia,
        TextField::DeliveryDate => &info.data_consegna,
        TextField::Operator => &info.operatore,
        TextField::CeremonyType => &info.tipo_cerimonia,
        TextField::RibbonColor => &info.colore_nastri,
        TextField::ConfettiType => &info.tipo_confetti,
        TextField::ConfettiColor => &info.colore_confetti,
        TextField::Packaging => &info.confezione,
        TextField::Payment => &info.pagamento,
        TextField::Note => &info.altro,
    };
    if field.is_date() {
        display_date(raw)
    } else {
        raw.trim().to_string()
    }
}

/// Write `record` onto `sheet` following `layout`.
///
/// Items beyond the table's capacity are left out (see
/// [`ProjectionReport::truncation_warning`]); unused rows are blanked since
/// the template may carry content from an earlier printout. Line totals and
/// the grand total are computed here rather than left to the spreadsheet.
pub fn project<S: CellSink>(record: &Record, layout: &TemplateLayout, sheet: &mut S) -> ProjectionReport {
    for (field, cell) in &layout.fields {
        sheet.set_text(*cell, &field_value(record, *field));
    }

    for (slot, (kind, amount)) in layout.deposits.iter().zip(record.info_ordine.deposits()) {
        let kind = kind.trim();
        if kind.is_empty() {
            sheet.clear(slot.kind);
            sheet.clear(slot.amount);
        } else {
            sheet.set_text(slot.kind, kind);
            sheet.set_currency(slot.amount, parse_amount(amount));
        }
    }

    let block = &layout.items;
    let available_rows = block.available_rows();
    let items = &record.dettagli_ordine;

    let mut grand_total = 0.0;
    let mut written_items = 0;
    for (row, item) in (block.start_row..).zip(items.iter().take(available_rows)) {
        sheet.set_text(CellRef::new(row, block.company), item.ditta.trim());
        sheet.set_text(CellRef::new(row, block.code), item.codice.trim());
        sheet.set_text(CellRef::new(row, block.description), item.descrizione.trim());
        sheet.set_number(CellRef::new(row, block.quantity), item.quantity());
        sheet.set_currency(CellRef::new(row, block.unit_price), item.unit_price());

        let line_total = item.total();
        sheet.set_currency(CellRef::new(row, block.line_total), line_total);
        grand_total += line_total;
        written_items += 1;
    }

    for row in (block.start_row + written_items as u32)..block.total_row {
        for col in block.columns() {
            sheet.clear(CellRef::new(row, col));
        }
    }

    let grand_total = (grand_total * 100.0).round() / 100.0;
    let grand_total = match record.kind() {
        DocumentKind::Quote => {
            sheet.clear(block.total_cell());
            sheet.clear(block.total_label_cell());
            None
        }
        DocumentKind::Order => {
            sheet.set_text(block.total_label_cell(), TOTAL_LABEL);
            sheet.set_currency(block.total_cell(), grand_total);
            Some(grand_total)
        }
    };

    ProjectionReport {
        total_items: items.len(),
        written_items,
        available_rows,
        grand_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::sheet::{CellValue, MemorySheet};
    use crate::record::{LineItem, DEPOSIT_PAYMENT};

    fn cell(a1: &str) -> CellRef {
        CellRef::parse(a1).unwrap()
    }

    fn order_with_items(count: usize) -> Record {
        let mut record = Record::default();
        record.dati_cliente.nome_cliente = "  Maria Rossi ".to_string();
        record.dati_cliente.telefono_cliente = "333 1234567".to_string();
        record.info_ordine.data_ordine = "2025-01-15".to_string();
        record.info_ordine.data_cerimonia = "2025-06-01".to_string();
        record.info_ordine.data_consegna = String::new();
        record.info_ordine.tipo_confetti = "Mandorla, Snob".to_string();
        for i in 0..count {
            record.dettagli_ordine.push(LineItem::new(
                "ETM",
                &format!("C{i}"),
                &format!("articolo {i}"),
                "2",
                "1,25",
            ));
        }
        record
    }

    #[test]
    fn single_fields_land_in_their_cells() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();

        project(&order_with_items(1), &layout, &mut sheet);

        assert_eq!(sheet.text(cell("C11")), Some("Maria Rossi"));
        assert_eq!(sheet.text(cell("C17")), Some("333 1234567"));
        assert_eq!(sheet.text(cell("C6")), Some("15/01/2025"));
        assert_eq!(sheet.text(cell("C13")), Some("01/06/2025"));
        assert_eq!(sheet.text(cell("E41")), Some("N.D."));
        assert_eq!(sheet.text(cell("C37")), Some("Mandorla, Snob"));
    }

    #[test]
    fn order_gets_computed_total_and_label() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();
        let mut record = order_with_items(2);
        record
            .dettagli_ordine
            .push(LineItem::new("FAMA", "X", "nastro", "3", "0.333"));

        let report = project(&record, &layout, &mut sheet);

        assert_eq!(report.grand_total, Some(6.0));
        assert_eq!(sheet.amount(cell("G20")), Some(2.5));
        assert_eq!(sheet.amount(cell("G22")), Some(1.0));
        assert_eq!(sheet.get(cell("F20")), Some(&CellValue::Currency(1.25)));
        assert_eq!(sheet.get(cell("E20")), Some(&CellValue::Number(2.0)));
        assert_eq!(sheet.text(cell("F33")), Some(TOTAL_LABEL));
        assert_eq!(sheet.amount(cell("G33")), Some(6.0));
    }

    #[test]
    fn quote_total_is_blanked() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();
        sheet.insert(cell("G33"), CellValue::Formula("of:=SUM([.G20:.G32])".into()));
        sheet.insert(cell("F33"), CellValue::Text(TOTAL_LABEL.into()));
        let mut record = order_with_items(3);
        record.info_ordine.tipo_documento = DocumentKind::Quote;

        let report = project(&record, &layout, &mut sheet);

        assert_eq!(report.grand_total, None);
        assert!(sheet.is_blank(cell("G33")));
        assert!(sheet.is_blank(cell("F33")));
        assert_eq!(sheet.amount(cell("G22")), Some(2.5));
    }

    #[test]
    fn excess_items_are_truncated_with_warning() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();

        let report = project(&order_with_items(15), &layout, &mut sheet);

        assert_eq!(report.total_items, 15);
        assert_eq!(report.available_rows, 13);
        assert_eq!(report.written_items, 13);
        assert_eq!(report.grand_total, Some(32.5));
        assert_eq!(sheet.text(cell("B32")), Some("C12"));
        let warning = report.truncation_warning().unwrap();
        assert!(warning.contains("15") && warning.contains("13"));
    }

    #[test]
    fn stale_rows_are_cleared() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();
        for a1 in ["A25", "C25", "E25", "F25", "G25", "B32"] {
            sheet.insert(cell(a1), CellValue::Text("vecchio".into()));
        }
        sheet.insert(cell("G26"), CellValue::Formula("of:=[.E26]*[.F26]".into()));

        let report = project(&order_with_items(2), &layout, &mut sheet);

        assert!(report.truncation_warning().is_none());
        for a1 in ["A25", "C25", "E25", "F25", "G25", "G26", "B32"] {
            assert!(sheet.is_blank(cell(a1)), "{a1} should be blank");
        }
        assert_eq!(sheet.text(cell("A21")), Some("ETM"));
    }

    #[test]
    fn deposits_written_only_when_typed() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();
        sheet.insert(cell("B44"), CellValue::Text("Bonifico".into()));
        sheet.insert(cell("C44"), CellValue::Currency(99.0));
        let mut record = order_with_items(0);
        record.info_ordine.pagamento = DEPOSIT_PAYMENT.to_string();
        record.info_ordine.acconto1_tipo = "Contanti".to_string();
        record.info_ordine.acconto1_importo = "10,50".to_string();
        record.info_ordine.acconto2_importo = "20".to_string();

        project(&record, &layout, &mut sheet);

        assert_eq!(sheet.text(cell("B43")), Some("Contanti"));
        assert_eq!(sheet.get(cell("C43")), Some(&CellValue::Currency(10.5)));
        assert!(sheet.is_blank(cell("B44")));
        assert!(sheet.is_blank(cell("C44")));
    }

    #[test]
    fn unreadable_deposit_amount_becomes_zero() {
        let layout = TemplateLayout::builtin().unwrap();
        let mut sheet = MemorySheet::new();
        let mut record = order_with_items(0);
        record.info_ordine.acconto1_tipo = "Bancomat".to_string();
        record.info_ordine.acconto1_importo = "cinquanta".to_string();

        project(&record, &layout, &mut sheet);

        assert_eq!(sheet.amount(cell("C43")), Some(0.0));
    }
}
