//! Catalog transfer CLI
//!
//! # Main Commands
//!
//! ```bash
//! catalog-transfer transfer -s supplier.xlsx -d catalog.xlsx   # Copy filtered rows
//! catalog-transfer serve                                       # Start HTTP server (port 3000)
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! catalog-transfer inspect supplier.xlsx --rows 5   # Show sheets and first rows
//! catalog-transfer categories                       # Show allowed categories
//! catalog-transfer layout                           # Show the column layout
//! ```

use clap::{Parser, Subcommand};
use catalog_transfer::{
    read_source, run_transfer, sheet_names, AllowedCategories, ColumnLayout, SourceFormat,
    TransferOptions, TransferSession, CATEGORY_ENV_VAR,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "catalog-transfer")]
#[command(about = "Copy filtered catalog rows from a source sheet into a destination workbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy allowed, priced, new rows from source to destination
    Transfer {
        /// Source file (xlsx, xlsm, xlsb, xls, ods, csv)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Destination workbook (xlsx)
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// Source sheet (default: first sheet)
        #[arg(long)]
        source_sheet: Option<String>,

        /// Destination sheet (default: first sheet)
        #[arg(long)]
        destination_sheet: Option<String>,

        /// Column layout JSON file (default: built-in layout)
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Comma-separated allowed categories, overrides the environment
        #[arg(short, long)]
        categories: Option<String>,

        /// Run the filter without saving the destination
        #[arg(long)]
        dry_run: bool,

        /// Copy the destination aside before saving
        #[arg(long)]
        backup: bool,

        /// Write the JSON summary to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Show the sheets and first rows of a file
    Inspect {
        /// File to inspect
        input: PathBuf,

        /// Sheet to show (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Number of rows to show
        #[arg(short, long, default_value = "10")]
        rows: usize,
    },

    /// Show the allowed categories read from the environment
    Categories,

    /// Show the column layout as JSON
    Layout {
        /// Layout JSON file to validate and show (default: built-in layout)
        file: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Column layout JSON file
        #[arg(short, long)]
        layout: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transfer {
            source,
            destination,
            source_sheet,
            destination_sheet,
            layout,
            categories,
            dry_run,
            backup,
            report,
        } => {
            let categories = categories
                .map(|list| AllowedCategories::parse(&list))
                .unwrap_or_else(AllowedCategories::from_env);

            match load_layout(layout.as_deref()) {
                Ok(layout) => {
                    let mut session = TransferSession::new(categories)
                        .with_source_sheet(source_sheet)
                        .with_destination_sheet(destination_sheet)
                        .with_layout(layout)
                        .with_options(TransferOptions { dry_run, backup });
                    session.source = source;
                    session.destination = destination;
                    cmd_transfer(&session, report.as_deref())
                }
                Err(e) => Err(e),
            }
        }

        Commands::Inspect { input, sheet, rows } => cmd_inspect(&input, sheet.as_deref(), rows),

        Commands::Categories => cmd_categories(),

        Commands::Layout { file } => cmd_layout(file.as_deref()),

        Commands::Serve { port, layout } => cmd_serve(port, layout.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_layout(path: Option<&Path>) -> Result<ColumnLayout, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(ColumnLayout::from_file(p)?),
        None => Ok(ColumnLayout::default()),
    }
}

fn cmd_transfer(session: &TransferSession, report: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run_transfer(session)?;

    let skipped = &summary.report.skipped;
    eprintln!("\n{}", "=".repeat(70));
    eprintln!("📊 SUMMARY");
    eprintln!("{}", "=".repeat(70));
    eprintln!("   Source:           {} [{}]", summary.source.display(), summary.source_sheet);
    eprintln!("   Destination:      {} [{}]", summary.destination.display(), summary.destination_sheet);
    eprintln!("   Start row:        {}", summary.report.start_row);
    eprintln!("   Copied:           {}", summary.report.copied);
    eprintln!("   Skipped:          {}", skipped.total());
    eprintln!("     category:       {}", skipped.category_not_allowed);
    eprintln!("     no part number: {}", skipped.missing_part_number);
    eprintln!("     duplicate:      {}", skipped.duplicate_part_number);
    eprintln!("     bad price:      {}", skipped.non_numeric_price);
    eprintln!("     zero price:     {}", skipped.zero_price);
    if let Some(ref backup) = summary.backup {
        eprintln!("   Backup:           {}", backup.display());
    }
    if !summary.saved {
        eprintln!("   (dry run, destination not saved)");
    }
    eprintln!("{}", "=".repeat(70));

    if let Some(path) = report {
        fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    Ok(())
}

fn cmd_inspect(input: &Path, sheet: Option<&str>, rows: usize) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    if SourceFormat::from_path(input)? == SourceFormat::Workbook {
        eprintln!("   Sheets: {}", sheet_names(input)?.join(", "));
    }

    let table = read_source(input, sheet)?;
    eprintln!("   Sheet: {}", table.sheet);
    if let Some(ref encoding) = table.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = table.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
    }
    eprintln!("   Rows: {}", table.row_count());
    eprintln!("   Columns: {}", table.width);
    eprintln!();

    for (i, row) in table.rows.iter().take(rows).enumerate() {
        let cells: Vec<String> = row.cells.iter().map(|c| c.to_text()).collect();
        println!("{:>4} | {}", i + 1, cells.join(" | "));
    }

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn cmd_categories() -> Result<(), Box<dyn std::error::Error>> {
    let categories = AllowedCategories::from_env();
    if categories.is_empty() {
        eprintln!("📋 No allowed categories. Set {} (comma-separated).", CATEGORY_ENV_VAR);
        return Ok(());
    }

    eprintln!("📋 Allowed categories ({}):", categories.len());
    for category in categories.iter() {
        println!("  {}", category);
    }
    Ok(())
}

fn cmd_layout(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let layout = load_layout(file)?;
    println!("{}", layout.to_json()?);
    Ok(())
}

async fn cmd_serve(port: u16, layout: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let state = catalog_transfer::server::AppState {
        categories: AllowedCategories::from_env(),
        layout: load_layout(layout)?,
    };
    catalog_transfer::server::start_server(port, state).await
}
