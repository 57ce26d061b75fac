//! Where each record field lands on the printout template.
//!
//! The layout is plain data (TOML) so a reworked template only needs a new
//! `layout.toml` next to it. Rows in the file are the 1-based numbers shown by
//! the spreadsheet application; [`CellRef`] is 0-based.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::{OrderError, Result};

/// Layout of the shop's `template.ods`
pub const DEFAULT_LAYOUT: &str = r#"# Cell coordinates for template.ods

[fields]
nome_cliente = "C11"
telefono_cliente = "C17"
data_ordine = "C6"
data_cerimonia = "C13"
data_consegna = "E41"
operatore = "G6"
tipo_cerimonia = "C9"
colore_nastri = "C35"
tipo_confetti = "C37"
colore_confetti = "E37"
confezione = "C39"
pagamento = "C41"
altro = "C15"

[deposits]
acconto1_tipo = "B43"
acconto1_importo = "C43"
acconto2_tipo = "B44"
acconto2_importo = "C44"

[items]
start_row = 20      # first line-item row
total_row = 33      # grand total row; items use the rows in between
company = "A"
code = "B"
description = "C"
quantity = "E"
unit_price = "F"
line_total = "G"    # also the grand total column
total_label = "F"
"#;

/// A 0-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style coordinate such as "C11"
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| OrderError::InvalidCellRef(text.to_string()))?;
        let (letters, digits) = text.split_at(split);

        let col = parse_column(letters).map_err(|_| OrderError::InvalidCellRef(text.to_string()))?;
        let row: u32 = digits
            .parse()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| OrderError::InvalidCellRef(text.to_string()))?;

        Ok(Self { row: row - 1, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// "A" → 0, "Z" → 25, "AA" → 26
pub fn parse_column(letters: &str) -> Result<u32> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(OrderError::InvalidCellRef(letters.to_string()));
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        col = col
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| OrderError::InvalidCellRef(letters.to_string()))?;
    }
    Ok(col - 1)
}

fn column_name(mut col: u32) -> String {
    let mut name = Vec::new();
    loop {
        name.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name.iter().rev().collect()
}

/// Single-value fields placed on the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    CustomerName,
    CustomerPhone,
    OrderDate,
    CeremonyDate,
    DeliveryDate,
    Operator,
    CeremonyType,
    RibbonColor,
    ConfettiType,
    ConfettiColor,
    Packaging,
    Payment,
    Note,
}

impl TextField {
    pub fn is_date(self) -> bool {
        matches!(
            self,
            TextField::OrderDate | TextField::CeremonyDate | TextField::DeliveryDate
        )
    }
}

/// One deposit slot: type label cell and amount cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositCells {
    pub kind: CellRef,
    pub amount: CellRef,
}

/// The bounded line-item table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemBlock {
    /// 0-based first item row
    pub start_row: u32,
    /// 0-based grand total row
    pub total_row: u32,
    pub company: u32,
    pub code: u32,
    pub description: u32,
    pub quantity: u32,
    pub unit_price: u32,
    pub line_total: u32,
    pub total_label: u32,
}

impl ItemBlock {
    pub fn available_rows(&self) -> usize {
        (self.total_row - self.start_row) as usize
    }

    pub fn columns(&self) -> [u32; 6] {
        [
            self.company,
            self.code,
            self.description,
            self.quantity,
            self.unit_price,
            self.line_total,
        ]
    }

    pub fn total_cell(&self) -> CellRef {
        CellRef::new(self.total_row, self.line_total)
    }

    pub fn total_label_cell(&self) -> CellRef {
        CellRef::new(self.total_row, self.total_label)
    }

    fn contains(&self, cell: CellRef) -> bool {
        let columns = self.columns();
        let min_col = columns.iter().copied().min().unwrap_or(0).min(self.total_label);
        let max_col = columns.iter().copied().max().unwrap_or(0).max(self.total_label);
        (self.start_row..=self.total_row).contains(&cell.row)
            && (min_col..=max_col).contains(&cell.col)
    }
}

/// Validated cell layout of the printout template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLayout {
    pub fields: Vec<(TextField, CellRef)>,
    pub deposits: [DepositCells; 2],
    pub items: ItemBlock,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutFile {
    fields: FieldSpec,
    deposits: DepositSpec,
    items: ItemSpec,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSpec {
    nome_cliente: String,
    telefono_cliente: String,
    data_ordine: String,
    data_cerimonia: String,
    data_consegna: String,
    operatore: String,
    tipo_cerimonia: String,
    colore_nastri: String,
    tipo_confetti: String,
    colore_confetti: String,
    confezione: String,
    pagamento: String,
    altro: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DepositSpec {
    acconto1_tipo: String,
    acconto1_importo: String,
    acconto2_tipo: String,
    acconto2_importo: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemSpec {
    start_row: u32,
    total_row: u32,
    company: String,
    code: String,
    description: String,
    quantity: String,
    unit_price: String,
    line_total: String,
    total_label: String,
}

impl TemplateLayout {
    pub fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_LAYOUT)
    }

    /// Parse and validate a layout document
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: LayoutFile = toml::from_str(content).map_err(|e| OrderError::LayoutParse {
            path: LAYOUT_SOURCE_BUILTIN.into(),
            source: e,
        })?;
        let layout = Self::from_file(file)?;
        layout.validate()?;
        Ok(layout)
    }

    fn from_file(file: LayoutFile) -> Result<Self> {
        let f = &file.fields;
        let fields = vec![
            (TextField::CustomerName, CellRef::parse(&f.nome_cliente)?),
            (TextField::CustomerPhone, CellRef::parse(&f.telefono_cliente)?),
            (TextField::OrderDate, CellRef::parse(&f.data_ordine)?),
            (TextField::CeremonyDate, CellRef::parse(&f.data_cerimonia)?),
            (TextField::DeliveryDate, CellRef::parse(&f.data_consegna)?),
            (TextField::Operator, CellRef::parse(&f.operatore)?),
            (TextField::CeremonyType, CellRef::parse(&f.tipo_cerimonia)?),
            (TextField::RibbonColor, CellRef::parse(&f.colore_nastri)?),
            (TextField::ConfettiType, CellRef::parse(&f.tipo_confetti)?),
            (TextField::ConfettiColor, CellRef::parse(&f.colore_confetti)?),
            (TextField::Packaging, CellRef::parse(&f.confezione)?),
            (TextField::Payment, CellRef::parse(&f.pagamento)?),
            (TextField::Note, CellRef::parse(&f.altro)?),
        ];

        let d = &file.deposits;
        let deposits = [
            DepositCells {
                kind: CellRef::parse(&d.acconto1_tipo)?,
                amount: CellRef::parse(&d.acconto1_importo)?,
            },
            DepositCells {
                kind: CellRef::parse(&d.acconto2_tipo)?,
                amount: CellRef::parse(&d.acconto2_importo)?,
            },
        ];

        let i = &file.items;
        if i.start_row == 0 || i.total_row == 0 {
            return Err(OrderError::InvalidLayout(
                "item rows are numbered from 1".to_string(),
            ));
        }
        let items = ItemBlock {
            start_row: i.start_row - 1,
            total_row: i.total_row - 1,
            company: parse_column(&i.company)?,
            code: parse_column(&i.code)?,
            description: parse_column(&i.description)?,
            quantity: parse_column(&i.quantity)?,
            unit_price: parse_column(&i.unit_price)?,
            line_total: parse_column(&i.line_total)?,
            total_label: parse_column(&i.total_label)?,
        };

        Ok(Self {
            fields,
            deposits,
            items,
        })
    }

    fn validate(&self) -> Result<()> {
        let items = &self.items;
        if items.start_row >= items.total_row {
            return Err(OrderError::InvalidLayout(format!(
                "item start row {} must come before total row {}",
                items.start_row + 1,
                items.total_row + 1
            )));
        }

        let mut seen = HashSet::new();
        if !items.columns().iter().all(|col| seen.insert(*col)) {
            return Err(OrderError::InvalidLayout(
                "item columns must be distinct".to_string(),
            ));
        }
        if items.total_label == items.line_total {
            return Err(OrderError::InvalidLayout(
                "total label and total value need separate columns".to_string(),
            ));
        }

        let single_cells = self
            .fields
            .iter()
            .map(|(_, cell)| *cell)
            .chain(self.deposits.iter().flat_map(|d| [d.kind, d.amount]));
        let mut used = HashSet::new();
        for cell in single_cells {
            if items.contains(cell) {
                return Err(OrderError::InvalidLayout(format!(
                    "cell {cell} lies inside the line-item table"
                )));
            }
            if !used.insert(cell) {
                return Err(OrderError::InvalidLayout(format!(
                    "cell {cell} is assigned twice"
                )));
            }
        }

        Ok(())
    }
}

const LAYOUT_SOURCE_BUILTIN: &str = "<built-in layout>";
