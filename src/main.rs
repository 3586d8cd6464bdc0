use clap::Parser;
use pegmark::ast::RootNode;
use pegmark::parser::Parser as MarkdownParser;
use pegmark::renderer::HtmlRenderer;
use pegmark::{Error, Extensions, Options, Result};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Convert Markdown to HTML
#[derive(Parser)]
#[command(name = "pegmark")]
#[command(version)]
struct Args {
    /// Markdown file to convert; reads stdin when omitted
    input: Option<PathBuf>,

    /// Comma-separated extensions, e.g. `tables,fenced-code-blocks`
    #[arg(short, long, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Enable every grammar extension
    #[arg(long)]
    all: bool,

    /// JSON options file, e.g. `{"extensions": "TABLES", "tab_stop": 4}`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the parse tree as JSON instead of HTML
    #[arg(long)]
    ast: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn options(args: &Args) -> Result<Options> {
    let mut options = match &args.config {
        Some(path) => Options::from_json(&std::fs::read_to_string(path)?)?,
        None => Options::default(),
    };
    for name in &args.extensions {
        let extension = Extensions::from_cli_name(name).ok_or_else(|| Error::UnknownExtension(name.clone()))?;
        options.extensions |= extension;
    }
    if args.all {
        options.extensions |= Extensions::ALL;
    }
    Ok(options)
}

fn run(args: &Args) -> Result<String> {
    let options = options(args)?;
    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            input
        }
    };
    debug!(extensions = ?options.extensions, "converting {} bytes", input.len());

    let root: RootNode = MarkdownParser::new(options).parse(&input)?;
    if args.ast {
        return Ok(serde_json::to_string_pretty(&root)?);
    }
    Ok(HtmlRenderer::new(options.extensions).render(&root))
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level);

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("pegmark: {}", e);
            ExitCode::FAILURE
        }
    }
}
