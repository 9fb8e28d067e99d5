use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use d2latex::{LatexConfig, LatexRenderer, ScriptBundle};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "d2latex", version, about = "Render LaTeX math to SVG and measure it in pixels")]
struct Cli {
    /// Serve sandbox jobs over stdin/stdout (used by process workers)
    #[arg(long, hide = true)]
    worker: bool,

    /// MathJax bundle to load (overrides D2LATEX_MATHJAX_JS)
    #[arg(long, global = true, value_name = "FILE")]
    mathjax: Option<PathBuf>,

    /// Run each sandbox in a child worker process
    #[arg(long, global = true)]
    process_worker: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the SVG document for LATEX ("-" reads stdin)
    Render { latex: String },
    /// Print the pixel size of LATEX ("-" reads stdin)
    Measure {
        latex: String,
        /// Print {"width":..,"height":..}
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    builder.filter_level(level);
    // RUST_LOG wins over flags.
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // Logs go to stderr; stdout carries results (and the worker protocol).
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });
    let _ = builder.try_init();
}

fn read_input(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut s = String::new();
    io::stdin().read_to_string(&mut s).context("failed to read latex from stdin")?;
    Ok(s.trim_end_matches(['\r', '\n']).to_string())
}

fn renderer(cli: &Cli) -> Result<LatexRenderer> {
    let mut config = LatexConfig::from_env();
    if let Some(path) = &cli.mathjax {
        config.typesetter_path = Some(path.clone());
    }
    if cli.process_worker {
        config.use_process_worker = true;
    }
    let bundle = ScriptBundle::resolve(&config)?;
    Ok(LatexRenderer::new(config, Arc::new(bundle)))
}

#[cfg(feature = "boa")]
fn worker_main() -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    d2latex::sandbox::process::run_worker(stdin.lock(), stdout.lock()).context("worker failed")
}

#[cfg(not(feature = "boa"))]
fn worker_main() -> Result<()> {
    anyhow::bail!("worker mode needs the `boa` feature")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.worker {
        return worker_main();
    }

    match &cli.command {
        Some(Cmd::Render { latex }) => {
            let latex = read_input(latex)?;
            let svg = renderer(&cli)?.render(&latex)?;
            println!("{}", svg);
        }
        Some(Cmd::Measure { latex, json }) => {
            let latex = read_input(latex)?;
            let dims = renderer(&cli)?.measure(&latex)?;
            if *json {
                println!("{}", serde_json::json!({ "width": dims.width, "height": dims.height }));
            } else {
                println!("{} {}", dims.width, dims.height);
            }
        }
        None => {
            println!("d2latex: use `render` or `measure`; see --help");
        }
    }
    Ok(())
}
