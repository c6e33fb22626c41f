use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use brainyuck_core::{generate, run_with_stdio, translate_with, Optimizations};

use crate::native::NativeBuild;

mod native;

#[derive(Debug, StructOpt)]
#[structopt(name = "brainyuck", about = "optimizing Brainfuck interpreter and C translator")]
struct Opt {
    /// Source file to run
    #[structopt(parse(from_os_str))]
    filename: PathBuf,

    /// Print the generated C instead of running the program
    #[structopt(long)]
    emit_c: bool,

    /// Compile the generated C with an external compiler and run the result
    #[structopt(long)]
    native: bool,

    /// C compiler used by --native
    #[structopt(long, default_value = "cc")]
    cc: String,

    /// Optimization flag passed to the C compiler
    #[structopt(long, default_value = "-O1", allow_hyphen_values = true)]
    opt_level: String,

    /// Where --native puts the C file and the executable [default: a temporary directory]
    #[structopt(long, parse(from_os_str))]
    work_dir: Option<PathBuf>,

    /// Print the translated program to stderr
    #[structopt(long)]
    dump_ir: bool,

    /// Translate every loop literally
    #[structopt(long)]
    no_optimize: bool,

    /// Print run statistics to stderr (interpreter only)
    #[structopt(long)]
    stats: bool,

    /// More logging (-v, -vv); RUST_LOG overrides this
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logging(opt.verbose);

    let source = std::fs::read(&opt.filename)
        .with_context(|| format!("could not read {}", opt.filename.display()))?;

    let optimizations = if opt.no_optimize {
        Optimizations::none()
    } else {
        Optimizations::default()
    };

    let start = Instant::now();
    let program = translate_with(&source, optimizations)
        .with_context(|| format!("could not translate {}", opt.filename.display()))?;
    info!(elapsed = ?start.elapsed(), instructions = program.len(), "translated");

    if opt.dump_ir {
        eprint!("{}", program);
    }

    if opt.emit_c {
        io::stdout().write_all(generate(&program).as_bytes())?;
        return Ok(());
    }

    if opt.native {
        let temporary = opt.work_dir.is_none();
        let build = NativeBuild {
            cc: opt.cc,
            opt_level: opt.opt_level,
            work_dir: opt.work_dir.unwrap_or_else(|| {
                std::env::temp_dir().join(format!("brainyuck-{}", std::process::id()))
            }),
        };
        let outcome = build
            .compile(&generate(&program))
            .and_then(|binary| build.run(&binary));
        if temporary {
            build.clean_up();
        }
        let status = outcome?;
        if !status.success() {
            anyhow::bail!("native program exited with {}", status);
        }
        return Ok(());
    }

    let start = Instant::now();
    let stats = run_with_stdio(&program)?;
    info!(elapsed = ?start.elapsed(), "program finished");
    debug!(?stats, "run statistics");

    if opt.stats {
        eprintln!("Printing statistics");
        eprintln!("{}", stats);
    }

    Ok(())
}

/// Logs go to stderr, so they never mix with the program's own output.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}
