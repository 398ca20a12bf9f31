//! Template library authoring tool - CLI entry point.
//!
//! Validates template fixture files and renders individual templates against
//! a context file, so template authors can check wire shapes without writing
//! a test.

use anyhow::Result;
use clap::Parser;
use edge_mock_client::{Context, ResponseFactory, ResponseSpec, TemplateLibrary};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "edge-mock-client",
    about = "Validate and preview mock response templates",
    version
)]
struct Args {
    /// Path to a template library YAML file (built-in library if omitted)
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Validate the library and exit
    #[arg(long)]
    validate: bool,

    /// List template names and exit
    #[arg(long)]
    list: bool,

    /// Render this template to stdout
    #[arg(short, long, value_name = "NAME")]
    render: Option<String>,

    /// YAML/JSON file with the render context
    #[arg(short, long, value_name = "FILE")]
    context: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "warn")]
    log_level: Level,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let library = match &args.templates {
        Some(path) => {
            info!(path = ?path, "Loading template library");
            TemplateLibrary::from_file(path)?
        }
        None => TemplateLibrary::builtin(),
    };

    if args.validate {
        library.validate()?;
        println!("Library is valid ({} templates defined)", library.len());
        return Ok(());
    }

    if args.list {
        for name in library.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(name) = &args.render {
        let context = match &args.context {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                // serde_yaml also accepts JSON
                serde_yaml::from_str::<Context>(&content)?
            }
            None => Context::new(),
        };

        let factory = ResponseFactory::new(library);
        let response = factory.render(&ResponseSpec::template(name, context))?;

        println!("HTTP {}", response.status());
        let mut headers: Vec<_> = response.headers().iter().collect();
        headers.sort();
        for (header, value) in headers {
            println!("{header}: {value}");
        }
        println!();
        println!("{}", response.body_str());
        return Ok(());
    }

    println!(
        "Nothing to do: pass --validate, --list, or --render NAME (see --help)"
    );
    Ok(())
}
