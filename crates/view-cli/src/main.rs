//! `view` CLI -- filter, encode, decode and merge entities described by a
//! schema document.
//!
//! ## Usage
//!
//! ```sh
//! # Filter an entity for the "read" group
//! view filter --schema schema.json --type Product --groups read -i product.json
//!
//! # Negotiate and encode a list (groups from the environment)
//! VIEW_GROUPS=read view encode --schema schema.json --type Product --list \
//!     --accept "text/csv, application/json;q=0.5" -i products.json
//!
//! # Apply a partial update to an existing entity
//! echo '{"name":"b"}' | view merge --schema schema.json --type Product --target product.json
//!
//! # Decode an XML or CSV body to JSON
//! view decode --schema schema.json --type Product --list --content-type text/csv -i products.csv
//!
//! # Show which format an Accept header selects
//! view negotiate "application/xml;q=0.9, */*;q=0.1"
//! ```
//!
//! Failures of the engine itself are printed to stdout as a structured error
//! body (`{"code":"not_acceptable","message":"..."}`) and exit with status 2;
//! every other failure exits with status 1. Logging goes to stderr, filtered
//! by `--log-level` or `VIEW_LOG` (default `warn`).

use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use view_core::negotiate::from_content_type;
use view_core::{resolve, ErrorBody, FieldKind, GroupSet, SchemaRegistry, ViewEngine, ViewError};

#[derive(Parser)]
#[command(
    name = "view",
    version,
    about = "Group-scoped views: filter, encode, decode and merge entities"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive)
    #[arg(long, global = true, env = "VIEW_LOG", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the view of a JSON entity visible to the given groups
    Filter {
        #[command(flatten)]
        schema: SchemaArgs,
        #[command(flatten)]
        groups: GroupArgs,
        #[command(flatten)]
        io: IoArgs,
    },
    /// Filter and encode a JSON entity in the format selected by --accept
    Encode {
        #[command(flatten)]
        schema: SchemaArgs,
        #[command(flatten)]
        groups: GroupArgs,
        #[command(flatten)]
        io: IoArgs,
        /// Accept header to negotiate the output format (JSON if omitted)
        #[arg(long, default_value = "")]
        accept: String,
        /// Print Content-Type and Content-Length to stderr
        #[arg(long)]
        headers: bool,
    },
    /// Decode a JSON, XML or CSV body into pretty-printed JSON
    Decode {
        #[command(flatten)]
        schema: SchemaArgs,
        #[command(flatten)]
        io: IoArgs,
        /// Content-Type of the input (JSON if omitted)
        #[arg(long, default_value = "")]
        content_type: String,
    },
    /// Merge a partial update (the input) into an existing JSON entity
    Merge {
        #[command(flatten)]
        schema: SchemaArgs,
        #[command(flatten)]
        io: IoArgs,
        /// JSON file holding the entity to update
        #[arg(long)]
        target: String,
        /// Content-Type of the update payload (JSON if omitted)
        #[arg(long, default_value = "")]
        content_type: String,
    },
    /// Show the format an Accept header resolves to
    Negotiate {
        /// Accept header value
        accept: String,
    },
    /// List the types declared in a schema document
    Types {
        /// Schema document (JSON)
        #[arg(long)]
        schema: String,
    },
}

#[derive(Args)]
struct SchemaArgs {
    /// Schema document (JSON) describing the entity types
    #[arg(long)]
    schema: String,
    /// Name of the root type in the schema document
    #[arg(long = "type")]
    type_name: String,
    /// Treat the root as a list of the type
    #[arg(long)]
    list: bool,
}

#[derive(Args)]
struct GroupArgs {
    /// Comma-separated groups the caller is authorized for (all fields if empty)
    #[arg(long, env = "VIEW_GROUPS", default_value = "")]
    groups: String,
}

#[derive(Args)]
struct IoArgs {
    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(command: Commands) -> Result<()> {
    let engine = ViewEngine::new();

    match command {
        Commands::Filter { schema, groups, io } => {
            let root = load_root(&schema)?;
            let groups = GroupSet::parse(&groups.groups);
            let value = read_json(io.input.as_deref())?;
            let view = engine.filter_value(&value, &root, &groups)?;
            write_output(io.output.as_deref(), &pretty(&view)?)?;
        }
        Commands::Encode {
            schema,
            groups,
            io,
            accept,
            headers,
        } => {
            let root = load_root(&schema)?;
            let groups = GroupSet::parse(&groups.groups);
            let value = read_json(io.input.as_deref())?;
            let format = resolve(&accept)?;
            let body = engine.encode_value(&value, &root, format, &groups)?;
            if headers {
                eprintln!("Content-Type: {}", body.content_type());
                if let Some(length) = body.content_length() {
                    eprintln!("Content-Length: {}", length);
                }
            }
            write_output(io.output.as_deref(), &body.bytes)?;
        }
        Commands::Decode {
            schema,
            io,
            content_type,
        } => {
            let root = load_root(&schema)?;
            let format = from_content_type(&content_type)?;
            let bytes = read_input(io.input.as_deref())?;
            let value = engine.decode_value(&bytes, format, &root)?;
            write_output(io.output.as_deref(), &pretty(&value)?)?;
        }
        Commands::Merge {
            schema,
            io,
            target,
            content_type,
        } => {
            let root = load_root(&schema)?;
            let format = from_content_type(&content_type)?;
            let mut entity = read_json(Some(target.as_str()))?;
            let payload = read_input(io.input.as_deref())?;
            engine.merge_value(&payload, format, &mut entity, &root)?;
            write_output(io.output.as_deref(), &pretty(&entity)?)?;
        }
        Commands::Negotiate { accept } => {
            let format = resolve(&accept)?;
            println!("{}\t{}", format, format.content_type());
        }
        Commands::Types { schema } => {
            let registry = load_registry(&schema)?;
            for name in registry.names() {
                println!("{}", name);
            }
        }
    }

    let stats = engine.cache().stats();
    debug!(hits = stats.hits, misses = stats.misses, "shape cache");
    Ok(())
}

/// Print engine errors as a structured body; everything else as plain text.
fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ViewError>() {
        Some(view_err) => {
            error!("request failed: {err:#}");
            let body = ErrorBody::from(view_err);
            match serde_json::to_string(&body) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{}", view_err),
            }
            ExitCode::from(2)
        }
        None => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_registry(path: &str) -> Result<SchemaRegistry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema document: {}", path))?;
    // Keep the message plain: a broken schema file is not a request error.
    SchemaRegistry::from_json(&text)
        .map_err(|e| anyhow::anyhow!("Invalid schema document {}: {}", path, e))
}

fn load_root(args: &SchemaArgs) -> Result<FieldKind> {
    let registry = load_registry(&args.schema)?;
    let kind = registry.kind(&args.type_name).with_context(|| {
        format!(
            "Unknown type: '{}'. Available types: {}",
            args.type_name,
            registry.names().join(", ")
        )
    })?;
    Ok(if args.list { FieldKind::list(kind) } else { kind })
}

fn pretty(value: &Value) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(value).context("Failed to format JSON output")?;
    out.push(b'\n');
    Ok(out)
}

fn read_json(path: Option<&str>) -> Result<Value> {
    let bytes = read_input(path)?;
    serde_json::from_slice(&bytes).map_err(|e| ViewError::Schema(e.to_string()).into())
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {}", path)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content)
                .and_then(|()| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
