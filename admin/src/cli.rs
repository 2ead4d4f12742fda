use std::path::PathBuf;

/// Upper bound for `replicate --count`.
pub const MAX_COUNT: u32 = 4096;

#[derive(Debug, clap::Parser)]
#[command(name = "rosterkit", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: Subcommand,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Grow a roster by splitting its first node into new ones.
    Replicate(ReplicateCmd),

    /// Create a fresh random roster, for test clusters.
    Generate(GenerateCmd),

    /// Validate a roster and print its aggregate values.
    Inspect(InspectCmd),
}

#[derive(Debug, clap::Parser)]
pub struct ReplicateCmd {
    /// The roster file to grow. It is never modified.
    #[arg(short, long)]
    pub input: PathBuf,

    /// How many nodes to add.
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_COUNT)))]
    pub count: u32,

    /// Where to write the grown roster.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Allow the output to replace the input file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, clap::Parser)]
pub struct GenerateCmd {
    /// Number of nodes.
    #[arg(short, long)]
    pub nodes: usize,

    /// Ephemeral secrets per node, defaults to the number of nodes.
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Where to write the roster.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, clap::Parser)]
pub struct InspectCmd {
    /// The roster file to check.
    #[arg(short, long)]
    pub input: PathBuf,
}
