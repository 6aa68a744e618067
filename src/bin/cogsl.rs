//! Command-line interface for cogsl
//! This binary tokenizes a cogsl document and prints the token stream.
//!
//! Usage:
//!   cogsl [`<path>`] [--format `<format>`]   - Tokenize a file (or stdin when no path is given)
//!   cogsl --config `<file>` `<path>`         - Layer a configuration file over the defaults
//!
//! Formats:
//!   token-simple  one line per token on stderr, word tokens followed by their text (default)
//!   token-stream  one line per token on stderr as soon as it is emitted, without text
//!   token-json    JSON array of tokens with their text on stdout
//!
//! Logging is enabled by setting `COGSL_LOG` (or `RUST_LOG`), e.g. `COGSL_LOG=debug`.

use anyhow::{bail, Context, Result};
use clap::{Arg, Command};
use cogsl::cogsl::config::Loader;
use cogsl::cogsl::lexing::{spawn_tokenizer, ByteSource, GrowableBuffer, ReaderSource, Tokenizer};
use cogsl::{LexicalClass, Token};
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let matches = Command::new("cogsl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tokenize cogsl documents")
        .arg(
            Arg::new("path")
                .help("Path to the cogsl file (reads stdin when omitted)")
                .index(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: token-simple, token-stream or token-json")
                .default_value("token-simple"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .help("Bytes read from the source at a time")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("line-breaks")
                .long("line-breaks")
                .help("Tokenization of consecutive newlines")
                .value_parser(["separate", "merge"]),
        )
        .get_matches();

    let options = Options {
        path: matches.get_one::<String>("path").cloned(),
        format: matches
            .get_one::<String>("format")
            .cloned()
            .unwrap_or_else(|| "token-simple".to_string()),
        config: matches.get_one::<String>("config").cloned(),
        chunk_size: matches.get_one::<u32>("chunk-size").copied(),
        line_breaks: matches.get_one::<String>("line-breaks").cloned(),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Fatal: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(options)) {
        eprintln!("Fatal: {:#}", err);
        std::process::exit(1);
    }
}

struct Options {
    path: Option<String>,
    format: String,
    config: Option<String>,
    chunk_size: Option<u32>,
    line_breaks: Option<String>,
}

/// Initialise the global tracing subscriber when `COGSL_LOG` or `RUST_LOG` is set.
///
/// All output goes to stderr.
fn init_tracing() {
    let filter = match (std::env::var("COGSL_LOG"), std::env::var("RUST_LOG")) {
        (Ok(val), _) => EnvFilter::builder().parse_lossy(val),
        (Err(_), Ok(_)) => EnvFilter::from_default_env(),
        _ => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(options: Options) -> Result<()> {
    if !matches!(
        options.format.as_str(),
        "token-simple" | "token-stream" | "token-json"
    ) {
        bail!(
            "Format '{}' not supported. Available formats: token-simple, token-stream, token-json",
            options.format
        );
    }

    let mut loader = Loader::with_defaults().with_env();
    if let Some(path) = &options.config {
        loader = loader.file(path, true);
    }
    if let Some(chunk_size) = options.chunk_size {
        loader = loader.set_override("tokenizer.chunk_size", i64::from(chunk_size))?;
    }
    if let Some(line_breaks) = &options.line_breaks {
        loader = loader.set_override("tokenizer.line_breaks", line_breaks.as_str())?;
    }
    let settings = loader.load().context("loading configuration")?;

    let source: Box<dyn ByteSource + Send> = match &options.path {
        Some(path) => {
            let file = std::fs::File::open(path).with_context(|| format!("opening {path}"))?;
            Box::new(ReaderSource::new(file))
        }
        None => Box::new(ReaderSource::new(std::io::stdin())),
    };

    let mut handle = spawn_tokenizer(
        Tokenizer::new(settings.tokenizer),
        source,
        settings.queue_capacity,
    );

    let mut tokens = Vec::new();
    let stderr = std::io::stderr();
    while let Some(token) = handle.recv().await {
        if options.format == "token-stream" {
            writeln!(stderr.lock(), "{token}")?;
        } else {
            tokens.push(token);
        }
    }
    let buffer = handle.finish().await?;

    match options.format.as_str() {
        "token-simple" => print_simple(&tokens, &buffer)?,
        "token-json" => print_json(&tokens, &buffer)?,
        _ => {}
    }
    Ok(())
}

fn print_simple(tokens: &[Token], buffer: &GrowableBuffer) -> Result<()> {
    let mut out = std::io::stderr().lock();
    for token in tokens {
        writeln!(out, "{token}")?;
        if token.kind == LexicalClass::Word {
            writeln!(out, "{}", buffer.text(token))?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TokenWithText<'a> {
    #[serde(flatten)]
    token: &'a Token,
    text: std::borrow::Cow<'a, str>,
}

fn print_json(tokens: &[Token], buffer: &GrowableBuffer) -> Result<()> {
    let rows: Vec<TokenWithText<'_>> = tokens
        .iter()
        .map(|token| TokenWithText {
            token,
            text: buffer.text(token),
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows).context("formatting tokens")?;
    println!("{json}");
    Ok(())
}
