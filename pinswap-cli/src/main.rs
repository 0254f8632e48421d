//! Pinswap CLI - swap two pads' nets on a legacy KiCad board from the
//! command line, keeping the schematic's net labels in sync.

use clap::{Parser, Subcommand, ValueEnum};
use pinswap::{LegacyBoard, PinSwapCore, PinSwapOptions, PinSwapReport, SheetTree};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "pinswap")]
#[command(about = "Swap two pads' nets on a KiCad board and its schematic", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Swap the nets of two pads on one footprint
    Swap {
        /// Path to the legacy board file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Reference designator of the footprint (e.g. U201)
        #[arg(value_name = "FOOTPRINT")]
        footprint: String,

        /// First pad name/number
        #[arg(value_name = "PAD1")]
        pad_1: String,

        /// Second pad name/number
        #[arg(value_name = "PAD2")]
        pad_2: String,

        /// Write temp_-prefixed copies instead of overwriting the files
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Resolve and print the hierarchical sheet tree of a schematic
    Sheets {
        /// Path to the root schematic file
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Swap {
            board,
            footprint,
            pad_1,
            pad_2,
            dry_run,
            format,
        } => handle_swap(&board, &footprint, &pad_1, &pad_2, dry_run, format),
        Commands::Sheets { root, format } => handle_sheets(&root, format),
    };

    process::exit(exit_code);
}

fn handle_swap(
    board_path: &Path,
    footprint: &str,
    pad_1: &str,
    pad_2: &str,
    dry_run: bool,
    format: OutputFormat,
) -> i32 {
    let mut board = match LegacyBoard::load(board_path) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    let pads = match (
        board.find_pad(footprint, pad_1),
        board.find_pad(footprint, pad_2),
    ) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    let options = PinSwapOptions { dry_run };
    match PinSwapCore::swap_pins(&mut board, pads.0, pads.1, options) {
        Ok(report) => {
            print_report(&report, format);
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn print_report(report: &PinSwapReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).expect("report serialization failed")
            );
        }
        OutputFormat::Human => {
            println!(
                "Swapped pads {} and {} on {}",
                report.pad_1, report.pad_2, report.footprint
            );
            println!("  {} <-> {}", report.net_1, report.net_2);
            println!(
                "  schematic: {} ({} sheets resolved)",
                report.schematic.display(),
                report.sheets
            );
            println!("  wrote: {}", report.schematic_written.display());
            println!("  wrote: {}", report.board_written.display());
        }
    }
}

fn handle_sheets(root: &Path, format: OutputFormat) -> i32 {
    let tree = match SheetTree::resolve(root) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "documents": tree
                    .documents()
                    .map(|d| d.path.display().to_string())
                    .collect::<Vec<_>>(),
                "references": tree
                    .references()
                    .map(|(parent, child, line)| serde_json::json!({
                        "parent": parent.path.display().to_string(),
                        "child": child.path.display().to_string(),
                        "line": line,
                    }))
                    .collect::<Vec<_>>(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&value).expect("tree serialization failed")
            );
        }
        OutputFormat::Human => {
            println!("{} sheets:", tree.len());
            for doc in tree.documents() {
                println!("  {}", doc.path.display());
            }
            for (parent, child, line) in tree.references() {
                println!(
                    "  {} -> {} (line {})",
                    parent.file_name(),
                    child.file_name(),
                    line
                );
            }
        }
    }
    0
}
