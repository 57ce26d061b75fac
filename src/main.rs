use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::warn;

use bomboniere::config::{purge_output_dir, save_config, AppPaths, Settings};
use bomboniere::document::{DocumentSession, DocumentState};
use bomboniere::error::{OrderError, Result};
use bomboniere::logging::init_logger;
use bomboniere::print::{print_or_open, render, Delivery, PrintJob};
use bomboniere::record::vocab::{
    ensure_choice, CEREMONY_TYPES, COMPANIES, CONFETTI_COLORS, CONFETTI_TYPES, DEPOSIT_TYPES,
    OPERATORS, PAYMENT_METHODS,
};
use bomboniere::record::{display_date, DocumentKind, LineItem, Record, DEPOSIT_PAYMENT, MAX_LINE_ITEMS};
use bomboniere::store::{search, RecordStore};

#[derive(Parser)]
#[command(name = "bomboniere")]
#[command(version, about = "Orders and quotes for a gift favor shop", long_about = None)]
struct Cli {
    /// Directory holding config.json (default: next to the executable)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Directory holding template.ods and layout.toml (default: <exe dir>/resources)
    #[arg(long, global = true, value_name = "DIR")]
    resources: Option<PathBuf>,

    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new order (or quote with --quote)
    New {
        /// Customer name
        #[arg(long)]
        customer: String,

        /// Save as a quote instead of an order
        #[arg(long)]
        quote: bool,

        /// Print the document right after saving
        #[arg(long)]
        print: bool,

        #[command(flatten)]
        fields: RecordArgs,
    },

    /// Change an existing record and save it in place
    Edit {
        /// Index from 'list', file name or path
        reference: String,

        /// Look the reference up among quotes
        #[arg(long)]
        quote: bool,

        /// Customer name
        #[arg(long)]
        customer: Option<String>,

        /// Print the document after saving
        #[arg(long)]
        print: bool,

        #[command(flatten)]
        fields: RecordArgs,
    },

    /// Show a record's details and line items
    Show {
        /// Index from 'list', file name or path
        reference: String,

        #[arg(long)]
        quote: bool,
    },

    /// List saved orders (or quotes), oldest ceremony first
    List {
        #[arg(long)]
        quote: bool,

        /// Only show customers whose name contains TEXT
        #[arg(short, long, value_name = "TEXT")]
        search: Option<String>,
    },

    /// Fill the template, convert it to PDF and print it
    Print {
        /// Index from 'list', file name or path
        reference: String,

        #[arg(long)]
        quote: bool,

        /// Only produce the files, do not send them to the printer
        #[arg(long)]
        no_dispatch: bool,
    },

    /// Turn a quote into a new order dated today
    Convert {
        /// Index from 'list --quote', file name or path
        reference: String,
    },

    /// Delete a record file
    Delete {
        /// Index from 'list', file name or path
        reference: String,

        #[arg(long)]
        quote: bool,
    },

    /// Show resolved paths or change the data directory
    Config {
        /// Store records under DIR from the next run on
        #[arg(long, value_name = "DIR", conflicts_with = "reset")]
        data_path: Option<PathBuf>,

        /// Go back to the default data directory
        #[arg(long)]
        reset: bool,
    },
}

/// Editable record fields shared by 'new' and 'edit'
#[derive(Args)]
struct RecordArgs {
    #[arg(long)]
    phone: Option<String>,

    /// Ceremony date (YYYY-MM-DD)
    #[arg(long)]
    ceremony_date: Option<String>,

    /// Delivery date (YYYY-MM-DD)
    #[arg(long)]
    delivery_date: Option<String>,

    #[arg(long)]
    operator: Option<String>,

    #[arg(long)]
    ceremony_type: Option<String>,

    #[arg(long)]
    ribbon_color: Option<String>,

    /// Confetti type (can be repeated)
    #[arg(long)]
    confetti: Vec<String>,

    #[arg(long)]
    confetti_color: Option<String>,

    #[arg(long)]
    packaging: Option<String>,

    #[arg(long)]
    payment: Option<String>,

    #[arg(long)]
    deposit1_type: Option<String>,

    #[arg(long)]
    deposit1_amount: Option<String>,

    #[arg(long)]
    deposit2_type: Option<String>,

    #[arg(long)]
    deposit2_amount: Option<String>,

    /// Free-form note
    #[arg(long)]
    note: Option<String>,

    /// Line item (can be repeated, replaces existing items)
    #[arg(short, long, value_name = "COMPANY;CODE;DESCRIPTION;QTY;PRICE")]
    item: Vec<String>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let paths = AppPaths::resolve(cli.config_dir, cli.resources)?;
    let store = RecordStore::new(paths.orders_dir(), paths.quotes_dir());

    match cli.command {
        Commands::New {
            customer,
            quote,
            print,
            fields,
        } => cmd_new(&paths, &store, &customer, kind_flag(quote), &fields, print),
        Commands::Edit {
            reference,
            quote,
            customer,
            print,
            fields,
        } => cmd_edit(
            &paths,
            &store,
            &reference,
            kind_flag(quote),
            customer.as_deref(),
            &fields,
            print,
        ),
        Commands::Show { reference, quote } => cmd_show(&store, &reference, kind_flag(quote)),
        Commands::List { quote, search } => cmd_list(&store, kind_flag(quote), search.as_deref()),
        Commands::Print {
            reference,
            quote,
            no_dispatch,
        } => cmd_print(&paths, &store, &reference, kind_flag(quote), !no_dispatch),
        Commands::Convert { reference } => cmd_convert(&store, &reference),
        Commands::Delete { reference, quote } => cmd_delete(&store, &reference, kind_flag(quote)),
        Commands::Config { data_path, reset } => cmd_config(&paths, data_path, reset),
    }
}

fn kind_flag(quote: bool) -> DocumentKind {
    if quote {
        DocumentKind::Quote
    } else {
        DocumentKind::Order
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn warn_user(message: &str) {
    eprintln!("Warning: {message}");
}

// Table row structs for tabled
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "CEREMONY")]
    ceremony: String,
    #[tabled(rename = "FILE")]
    file: String,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "COMPANY")]
    company: String,
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "PRICE")]
    unit_price: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

/// Resolve a record reference to a file path.
/// Accepts a 1-based index from 'list', a file name in the kind's directory
/// (with or without .json) or a path.
fn resolve_reference(store: &RecordStore, kind: DocumentKind, reference: &str) -> Result<PathBuf> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(OrderError::InvalidRecordReference(reference.to_string()));
    }

    // Try to parse as an index first
    if let Ok(idx) = reference.parse::<usize>() {
        let summaries = store.list(kind)?;
        if idx == 0 || idx > summaries.len() {
            return Err(OrderError::InvalidRecordReference(reference.to_string()));
        }
        return Ok(summaries[idx - 1].path.clone());
    }

    let as_path = Path::new(reference);
    if as_path.is_absolute() || as_path.components().count() > 1 {
        return Ok(as_path.to_path_buf());
    }

    let file_name = if reference.ends_with(".json") {
        reference.to_string()
    } else {
        format!("{reference}.json")
    };
    Ok(store.dir_for(kind).join(file_name))
}

fn parse_date(value: &str) -> Result<String> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| OrderError::InvalidDate(value.to_string()))
}

/// Empty counts as zero, like an untouched cell in the form
fn is_number(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value
            .replace(',', ".")
            .parse::<f64>()
            .is_ok_and(f64::is_finite)
}

/// Parse "COMPANY;CODE;DESCRIPTION;QTY;PRICE"
fn parse_item(input: &str) -> Result<LineItem> {
    let parts: Vec<&str> = input.split(';').map(str::trim).collect();
    let [company, code, description, quantity, price] = parts.as_slice() else {
        return Err(OrderError::InvalidItemFormat(input.to_string()));
    };
    ensure_choice("company", company, COMPANIES)?;
    if !is_number(quantity) || !is_number(price) {
        return Err(OrderError::InvalidItemFormat(input.to_string()));
    }
    Ok(LineItem::new(company, code, description, quantity, price))
}

/// Apply the given fields to `record`; returns warnings for the user
fn apply_fields(record: &mut Record, fields: &RecordArgs) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    let info = &mut record.info_ordine;

    if let Some(phone) = &fields.phone {
        record.dati_cliente.telefono_cliente = phone.trim().to_string();
    }
    if let Some(date) = &fields.ceremony_date {
        info.data_cerimonia = parse_date(date)?;
    }
    if let Some(date) = &fields.delivery_date {
        info.data_consegna = parse_date(date)?;
    }
    if let Some(operator) = &fields.operator {
        ensure_choice("operator", operator, OPERATORS)?;
        info.operatore = operator.clone();
    }
    if let Some(ceremony) = &fields.ceremony_type {
        ensure_choice("ceremony type", ceremony, CEREMONY_TYPES)?;
        info.tipo_cerimonia = ceremony.clone();
    }
    if let Some(color) = &fields.ribbon_color {
        info.colore_nastri = color.trim().to_string();
    }
    if !fields.confetti.is_empty() {
        for confetti in &fields.confetti {
            ensure_choice("confetti type", confetti, CONFETTI_TYPES)?;
        }
        info.set_confetti_types(&fields.confetti);
    }
    if let Some(color) = &fields.confetti_color {
        ensure_choice("confetti color", color, CONFETTI_COLORS)?;
        info.colore_confetti = color.clone();
    }
    if let Some(packaging) = &fields.packaging {
        info.confezione = packaging.trim().to_string();
    }
    if let Some(payment) = &fields.payment {
        ensure_choice("payment", payment, PAYMENT_METHODS)?;
        info.pagamento = payment.clone();
    }
    if let Some(kind) = &fields.deposit1_type {
        ensure_choice("deposit type", kind, DEPOSIT_TYPES)?;
        info.acconto1_tipo = kind.clone();
    }
    if let Some(amount) = &fields.deposit1_amount {
        info.acconto1_importo = amount.trim().to_string();
    }
    if let Some(kind) = &fields.deposit2_type {
        ensure_choice("deposit type", kind, DEPOSIT_TYPES)?;
        info.acconto2_tipo = kind.clone();
    }
    if let Some(amount) = &fields.deposit2_amount {
        info.acconto2_importo = amount.trim().to_string();
    }
    if let Some(note) = &fields.note {
        info.altro = note.trim().to_string();
    }

    let has_deposit = info
        .deposits()
        .iter()
        .any(|(kind, amount)| !kind.trim().is_empty() || !amount.trim().is_empty());
    if has_deposit && !info.takes_deposits() {
        warnings.push(format!(
            "deposits are only kept when payment is '{DEPOSIT_PAYMENT}'; they will be cleared"
        ));
    }

    if !fields.item.is_empty() {
        let mut items = fields
            .item
            .iter()
            .map(|input| parse_item(input))
            .collect::<Result<Vec<_>>>()?;
        if items.len() > MAX_LINE_ITEMS {
            warn!(given = items.len(), max = MAX_LINE_ITEMS, "line items capped");
            warnings.push(format!(
                "a record holds at most {MAX_LINE_ITEMS} line items; {} were ignored",
                items.len() - MAX_LINE_ITEMS
            ));
            items.truncate(MAX_LINE_ITEMS);
        }
        record.dettagli_ordine = items;
    }

    Ok(warnings)
}

/// Create and save a new record
fn cmd_new(
    paths: &AppPaths,
    store: &RecordStore,
    customer: &str,
    kind: DocumentKind,
    fields: &RecordArgs,
    print: bool,
) -> Result<()> {
    let mut session = DocumentSession::new(today());
    session.record_mut().dati_cliente.nome_cliente = customer.trim().to_string();
    let warnings = apply_fields(session.record_mut(), fields)?;

    let saved = session.save(store, kind)?;
    for warning in &warnings {
        warn_user(warning);
    }

    println!("Saved {} for {}", kind, saved.record.customer_name());
    println!("  File:   {}", saved.path.display());
    println!("  Items:  {}", saved.record.dettagli_ordine.len());
    if kind == DocumentKind::Order {
        println!("  Total:  EUR {:.2}", saved.record.grand_total());
    }

    if print {
        let session = DocumentSession::open(store, &saved.path)?;
        print_document(paths, &session, true)?;
    }
    Ok(())
}

/// Edit an existing record and overwrite its file
fn cmd_edit(
    paths: &AppPaths,
    store: &RecordStore,
    reference: &str,
    kind: DocumentKind,
    customer: Option<&str>,
    fields: &RecordArgs,
    print: bool,
) -> Result<()> {
    let path = resolve_reference(store, kind, reference)?;
    let mut session = DocumentSession::open(store, &path)?;
    let kind = match session.state() {
        DocumentState::ExistingQuote(_) => DocumentKind::Quote,
        _ => DocumentKind::Order,
    };

    if let Some(customer) = customer {
        session.record_mut().dati_cliente.nome_cliente = customer.trim().to_string();
    }
    let warnings = apply_fields(session.record_mut(), fields)?;

    let saved = session.save(store, kind)?;
    for warning in &warnings {
        warn_user(warning);
    }

    println!("Updated {} {}", kind, saved.print_name());
    println!("  File:   {}", saved.path.display());

    if print {
        let session = DocumentSession::open(store, &saved.path)?;
        print_document(paths, &session, true)?;
    }
    Ok(())
}

fn cmd_show(store: &RecordStore, reference: &str, kind: DocumentKind) -> Result<()> {
    let path = resolve_reference(store, kind, reference)?;
    let session = DocumentSession::open(store, &path)?;
    let record = session.record();
    let info = &record.info_ordine;

    let customer = match record.customer_name().trim() {
        "" => "Sconosciuto",
        name => name,
    };

    println!("{} ({})", customer, record.kind());
    println!("  File:          {}", path.display());
    println!("  Phone:         {}", record.dati_cliente.telefono_cliente);
    println!("  Order date:    {}", display_date(&info.data_ordine));
    println!("  Ceremony:      {} on {}", info.tipo_cerimonia, display_date(&info.data_cerimonia));
    println!("  Delivery:      {}", display_date(&info.data_consegna));
    println!("  Operator:      {}", info.operatore);
    println!("  Ribbon color:  {}", info.colore_nastri);
    println!("  Confetti:      {} ({})", info.tipo_confetti, info.colore_confetti);
    println!("  Packaging:     {}", info.confezione);
    println!("  Payment:       {}", info.pagamento);
    for (slot, (kind, amount)) in info.deposits().iter().enumerate() {
        if !kind.trim().is_empty() {
            println!("  Deposit {}:     {} {}", slot + 1, kind, amount);
        }
    }
    if !info.altro.trim().is_empty() {
        println!("  Note:          {}", info.altro);
    }

    if record.dettagli_ordine.is_empty() {
        println!();
        println!("No line items.");
        return Ok(());
    }

    let rows: Vec<ItemRow> = record
        .dettagli_ordine
        .iter()
        .enumerate()
        .map(|(idx, item)| ItemRow {
            index: idx + 1,
            company: item.ditta.clone(),
            code: item.codice.clone(),
            description: item.descrizione.clone(),
            quantity: item.quantita.clone(),
            unit_price: item.prezzo_unitario.clone(),
            total: format!("{:.2}", item.total()),
        })
        .collect();

    println!();
    println!("{}", Table::new(rows).with(Style::rounded()));
    if record.kind() == DocumentKind::Order {
        println!("Total: EUR {:.2}", record.grand_total());
    }
    Ok(())
}

fn cmd_list(store: &RecordStore, kind: DocumentKind, query: Option<&str>) -> Result<()> {
    let summaries = store.list(kind)?;
    if summaries.is_empty() {
        println!("No {}s saved yet.", kind);
        return Ok(());
    }

    let hits = search(&summaries, query.unwrap_or(""));
    if hits.is_empty() {
        println!("No {}s match '{}'.", kind, query.unwrap_or("").trim());
        return Ok(());
    }

    let rows: Vec<RecordRow> = hits
        .iter()
        .map(|(index, summary)| RecordRow {
            index: *index,
            customer: summary.customer_name.clone(),
            ceremony: summary.display_date(),
            file: summary.file_name.clone(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
    println!("Total: {} {}s", summaries.len(), kind);
    println!("Use index number with show/edit/print/delete (e.g., 'bomboniere print 1')");
    Ok(())
}

fn cmd_print(
    paths: &AppPaths,
    store: &RecordStore,
    reference: &str,
    kind: DocumentKind,
    dispatch: bool,
) -> Result<()> {
    let path = resolve_reference(store, kind, reference)?;
    let session = DocumentSession::open(store, &path)?;
    print_document(paths, &session, dispatch)
}

fn print_document(paths: &AppPaths, session: &DocumentSession, dispatch: bool) -> Result<()> {
    let (record, name) = session.print_source()?;
    // Earlier printouts stay until the next one is made, so a viewer can keep them open
    purge_output_dir(&paths.output_dir());
    let job = PrintJob::from_paths(paths)?;
    let printout = render(record, &name, &job)?;
    for warning in &printout.warnings {
        warn_user(warning);
    }

    println!("Printout: {}", printout.target().display());
    if !dispatch {
        return Ok(());
    }

    match print_or_open(printout.target())? {
        Delivery::Printed => println!("Sent to the default printer"),
        Delivery::Viewer | Delivery::Opened => {
            println!("Opened in the default viewer, print it from there")
        }
    }
    Ok(())
}

fn cmd_convert(store: &RecordStore, reference: &str) -> Result<()> {
    let path = resolve_reference(store, DocumentKind::Quote, reference)?;
    let session = DocumentSession::open(store, &path)?;
    let saved = session.convert_to_order(store, today())?;

    println!("Converted quote to order for {}", saved.record.customer_name());
    println!("  File:   {}", saved.path.display());
    if let Some(quote) = &saved.leftover_quote {
        warn_user(&format!(
            "the order was saved but the quote {} could not be removed; delete it by hand",
            quote.display()
        ));
    }
    Ok(())
}

fn cmd_delete(store: &RecordStore, reference: &str, kind: DocumentKind) -> Result<()> {
    let path = resolve_reference(store, kind, reference)?;
    if !path.is_file() {
        warn!(path = %path.display(), "nothing to delete");
        warn_user(&format!("record file not found, nothing deleted: {}", path.display()));
        return Ok(());
    }

    let session = DocumentSession::open(store, &path)?;
    match session.delete(store) {
        Ok(path) => {
            println!("Deleted {}", path.display());
            Ok(())
        }
        // Removed by someone else in the meantime
        Err(OrderError::RecordNotFound(path)) => {
            warn_user(&format!("record file not found, nothing deleted: {}", path.display()));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_config(paths: &AppPaths, data_path: Option<PathBuf>, reset: bool) -> Result<()> {
    if data_path.is_none() && !reset {
        println!("Config dir:    {}", paths.config_dir.display());
        println!("Resources:     {}", paths.resource_dir.display());
        println!("Template:      {}", paths.template_path().display());
        println!("Data dir:      {}", paths.data_dir.display());
        println!("  Orders:      {}", paths.orders_dir().display());
        println!("  Quotes:      {}", paths.quotes_dir().display());
        println!("  Printouts:   {}", paths.output_dir().display());
        return Ok(());
    }

    let settings = match data_path {
        Some(dir) => Settings {
            custom_data_path: dir.to_string_lossy().to_string(),
        },
        None => Settings::default(),
    };
    save_config(&paths.config_dir, &settings)?;

    match settings.custom_data_path() {
        Some(dir) => println!("Data directory set to {dir}"),
        None => println!("Data directory reset to the default"),
    }
    println!("The change takes effect on the next run.");
    Ok(())
}
