use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use coverdiff::cli::{self, Style};
use coverdiff::report::RenderOptions;

/// coverdiff — Compare two Go coverage profiles package by package.
#[derive(Parser)]
#[command(name = "coverdiff", version, about)]
struct Cli {
    /// Coverage profile of the base revision.
    base: PathBuf,

    /// Coverage profile of the head revision.
    head: PathBuf,

    /// go.mod used to find the module path stripped from package names.
    #[arg(long, default_value = "go.mod")]
    go_mod: PathBuf,

    /// Module path to strip from package names (overrides go.mod).
    #[arg(long)]
    module_root: Option<String>,

    /// File listing every package of the module, one per line
    /// (e.g. `go list ./...`), so untested packages get a row too.
    #[arg(long)]
    packages: Option<PathBuf>,

    /// Print `+0.00%` for packages whose coverage did not change.
    #[arg(long)]
    show_zero_delta: bool,

    /// Output style.
    #[arg(long, value_enum, default_value = "text")]
    style: Style,

    /// Create or update a comment on the GitHub pull request
    /// (needs GITHUB_TOKEN, GITHUB_REPOSITORY and GITHUB_PULL_REQUEST_ID).
    #[arg(long)]
    comment: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let options = RenderOptions {
        module_root: cli::resolve_module_root(args.module_root.as_deref(), &args.go_mod),
        hide_zero_delta: !args.show_zero_delta,
    };

    let report = cli::build_report(&args.base, &args.head, args.packages.as_deref(), options)?;
    print!("{}", cli::cmd_diff(&report, args.style)?);

    if args.comment {
        eprint!("{}", cli::cmd_comment(&report)?);
    }

    Ok(())
}
