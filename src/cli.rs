use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Normalize and load timesheet CSV exports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process every matching file in a drop folder, relocating each to a
    /// processed/failed folder afterwards
    Ingest(IngestArgs),
    /// Normalize and load a single CSV file without relocating it
    Load(LoadArgs),
    /// Create the target table if it does not exist
    Init(InitArgs),
    /// Write the built-in field registry to a YAML file
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Drop folder to scan for exports
    #[arg(short = 'f', long = "folder")]
    pub folder: PathBuf,
    /// SQLite database file
    #[arg(long)]
    pub db: PathBuf,
    /// Target table name
    #[arg(long, default_value = crate::store::DEFAULT_TABLE)]
    pub table: String,
    /// File extension to match, without the dot
    #[arg(long, default_value = "csv")]
    pub extension: String,
    /// Folder for successfully processed files (defaults to <folder>/processed)
    #[arg(long = "processed-dir")]
    pub processed_dir: Option<PathBuf>,
    /// Folder for rejected files (defaults to <folder>/failed)
    #[arg(long = "failed-dir")]
    pub failed_dir: Option<PathBuf>,
    /// Field registry YAML overriding the built-in timesheet layout
    #[arg(short = 'm', long = "schema")]
    pub schema: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Input CSV file to load
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// SQLite database file
    #[arg(long)]
    pub db: PathBuf,
    /// Target table name
    #[arg(long, default_value = crate::store::DEFAULT_TABLE)]
    pub table: String,
    /// Correlation token shared by every row of this run (random UUID if omitted)
    #[arg(long = "batch-id")]
    pub batch_id: Option<String>,
    /// Field registry YAML overriding the built-in timesheet layout
    #[arg(short = 'm', long = "schema")]
    pub schema: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// SQLite database file
    #[arg(long)]
    pub db: PathBuf,
    /// Target table name
    #[arg(long, default_value = crate::store::DEFAULT_TABLE)]
    pub table: String,
    /// Field registry YAML overriding the built-in timesheet layout
    #[arg(short = 'm', long = "schema")]
    pub schema: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "out")]
    pub out: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
