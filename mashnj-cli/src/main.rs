use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use mashnj_core::io::{write_matrix_tsv_path, OnError};
use mashnj_core::phylo::{
    build_tree, to_ascii_with, to_newick_with_precision, AsciiOptions, TreeMethod,
    DEFAULT_PRECISION,
};
use mashnj_core::{load_dir, AssembleOptions, MissingPolicy};
use std::path::PathBuf;
use std::time::Instant;

/// Build a phylogenetic tree from a directory of Mash distance files and
/// print it as ASCII art and Newick.
#[derive(Parser, Debug)]
#[command(name = "mashnj", version, about = "Neighbor-joining trees from Mash distances")]
struct Args {
    /// Directory of Mash `dist` output files, one per reference genome
    input: PathBuf,

    /// Tree construction method
    #[arg(long, value_enum, default_value_t = MethodArg::Nj, env = "MASHNJ_METHOD")]
    method: MethodArg,

    /// What to do with a malformed distance line
    #[arg(long = "on-error", value_enum, default_value_t = OnErrorArg::Raise, env = "MASHNJ_ON_ERROR")]
    on_error: OnErrorArg,

    /// Value for genome pairs with no recorded distance: 0, or abort
    #[arg(long, value_enum, default_value_t = MissingArg::Zero, env = "MASHNJ_MISSING")]
    missing: MissingArg,

    /// Digits after the decimal point for Newick branch lengths
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: usize,

    /// Also write the assembled distance matrix as TSV
    #[arg(long, value_name = "PATH")]
    matrix: Option<PathBuf>,

    /// Do not print the ASCII tree
    #[arg(long, default_value_t = false)]
    no_ascii: bool,

    /// Do not print the Newick string
    #[arg(long, default_value_t = false)]
    no_newick: bool,

    /// Draw the ASCII tree without spacer lines
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    Nj,
    Upgma,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OnErrorArg {
    Raise,
    Skip,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MissingArg {
    Zero,
    Error,
}

impl From<MethodArg> for TreeMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Nj => TreeMethod::NeighborJoining,
            MethodArg::Upgma => TreeMethod::Upgma,
        }
    }
}

impl From<OnErrorArg> for OnError {
    fn from(arg: OnErrorArg) -> Self {
        match arg {
            OnErrorArg::Raise => OnError::Raise,
            OnErrorArg::Skip => OnError::Skip,
        }
    }
}

impl From<MissingArg> for MissingPolicy {
    fn from(arg: MissingArg) -> Self {
        match arg {
            MissingArg::Zero => MissingPolicy::Zero,
            MissingArg::Error => MissingPolicy::Error,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet);

    let out = run(&args)?;
    print!("{out}");
    Ok(())
}

fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: &Args) -> Result<String> {
    let opts = AssembleOptions {
        on_error: args.on_error.into(),
        missing: args.missing.into(),
    };

    let t0 = Instant::now();
    let report = load_dir(&args.input, &opts)
        .with_context(|| format!("failed to load distances from {}", args.input.display()))?;
    let dm = report
        .matrix()
        .context("failed to assemble distance matrix")?;
    info!(
        "assembled {n}x{n} distance matrix in {:.3}s",
        t0.elapsed().as_secs_f64(),
        n = dm.n()
    );

    if let Some(path) = &args.matrix {
        write_matrix_tsv_path(path, &dm)
            .with_context(|| format!("failed to write matrix to {}", path.display()))?;
        info!("wrote distance matrix to {}", path.display());
    }

    let t1 = Instant::now();
    let tree = build_tree(&dm, args.method.into()).context("failed to build tree")?;
    info!(
        "built {:?} tree with {} leaves in {:.3}s",
        args.method,
        tree.num_leaves(),
        t1.elapsed().as_secs_f64()
    );

    let mut out = String::new();
    if !args.no_ascii {
        out.push_str(&to_ascii_with(&tree, AsciiOptions { compact: args.compact }));
        out.push_str("\n\n");
    }
    if !args.no_newick {
        out.push_str(&to_newick_with_precision(&tree, args.precision));
        out.push('\n');
    }
    Ok(out)
}
