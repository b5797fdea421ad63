pub mod cli;
pub mod data;
pub mod error;
pub mod files;
pub mod grid;
pub mod io_utils;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod store;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, info, warn};
use uuid::Uuid;

use crate::{
    cli::{Cli, Commands, IngestArgs, InitArgs, LoadArgs, SchemaArgs},
    pipeline::Disposition,
    schema::ImportSchema,
    store::Store,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("timesheet_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest(args) => handle_ingest(&args),
        Commands::Load(args) => handle_load(&args),
        Commands::Init(args) => handle_init(&args),
        Commands::Schema(args) => handle_schema(&args),
    }
}

fn resolve_schema(path: Option<&Path>) -> Result<ImportSchema> {
    match path {
        Some(path) => {
            ImportSchema::load(path).with_context(|| format!("Loading field registry {path:?}"))
        }
        None => Ok(ImportSchema::timesheet()),
    }
}

fn handle_ingest(args: &IngestArgs) -> Result<()> {
    let schema = resolve_schema(args.schema.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let processed_dir = args
        .processed_dir
        .clone()
        .unwrap_or_else(|| args.folder.join("processed"));
    let failed_dir = args
        .failed_dir
        .clone()
        .unwrap_or_else(|| args.folder.join("failed"));

    let candidates = files::find_files(&args.folder, &args.extension)?;
    if candidates.is_empty() {
        info!(
            "No *.{} files found in {}",
            args.extension,
            args.folder.display()
        );
        return Ok(());
    }

    let mut store = Store::open(&args.db, &args.table)
        .with_context(|| format!("Opening database {:?}", args.db))?;

    for path in candidates {
        let (_, stem, extension) = files::split_path(&path);
        info!("Processing {stem}.{extension}");
        let batch_id = Uuid::new_v4().to_string();
        let outcome = pipeline::process_file(
            &path,
            &schema,
            &mut store,
            &batch_id,
            args.delimiter,
            encoding,
        )
        .with_context(|| format!("Processing {path:?}"))?;

        info!("{stem}.{extension}: {}", outcome.disposition.report());
        let destination = match outcome.disposition {
            Disposition::Rejected { .. } => &failed_dir,
            _ => &processed_dir,
        };
        let moved = files::move_to_folder(&path, destination)?;
        info!("Moved {stem}.{extension} to {}", moved.display());
    }
    Ok(())
}

fn handle_load(args: &LoadArgs) -> Result<()> {
    let schema = resolve_schema(args.schema.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let batch_id = args
        .batch_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut store = Store::open(&args.db, &args.table)
        .with_context(|| format!("Opening database {:?}", args.db))?;
    let outcome = pipeline::process_file(
        &args.input,
        &schema,
        &mut store,
        &batch_id,
        args.delimiter,
        encoding,
    )
    .with_context(|| format!("Processing {:?}", args.input))?;

    match &outcome.disposition {
        Disposition::Rejected { reason } => {
            warn!("{}: rejected — {reason}", args.input.display());
            Err(anyhow!("{:?} rejected: {reason}", args.input))
        }
        disposition => {
            info!("{}: {}", args.input.display(), disposition.report());
            Ok(())
        }
    }
}

fn handle_init(args: &InitArgs) -> Result<()> {
    let schema = resolve_schema(args.schema.as_deref())?;
    let store = Store::open(&args.db, &args.table)
        .with_context(|| format!("Opening database {:?}", args.db))?;
    store.ensure_table(&schema)?;
    info!("Table '{}' is ready in {:?}", store.table(), args.db);
    Ok(())
}

fn handle_schema(args: &SchemaArgs) -> Result<()> {
    let schema = ImportSchema::timesheet();
    schema
        .save(&args.out)
        .with_context(|| format!("Writing field registry to {:?}", args.out))?;
    info!(
        "Wrote registry with {} field(s) to {:?}",
        schema.field_count(),
        args.out
    );
    Ok(())
}
