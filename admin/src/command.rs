use std::{
    fmt,
    path::{Path, PathBuf},
};

use ark_serialize::{CanonicalSerialize, SerializationError};
use ark_std::rand::rngs::OsRng;
use rosterkit::{codec, replicate, roster::DimensionError, split, DefaultCurve, PublicKey, Roster};
use sha3::{Digest, Sha3_256};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, GenerateCmd, InspectCmd, ReplicateCmd, Subcommand};

/// Bytes of the SHA3-256 digest shown for every column sum.
const COLUMN_DIGEST_LEN: usize = 8;

#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum Error {
    /// {0}
    Codec(#[from] codec::Error),
    /// {0}
    Replicate(#[from] replicate::Error),
    /// {0}
    Dimension(#[from] DimensionError),
    /// Failed to generate a roster: {0}
    Generate(#[from] split::Error),
    /// Failed to encode a column sum: {0}
    Encode(#[from] SerializationError),
    /// Refusing to overwrite the input roster {0:?}, pass --force to replace it
    OutputIsInput(PathBuf),
    /// A roster needs at least one node
    NoNodes,
}

/// Log to stderr, `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}

pub fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.subcommand {
        Subcommand::Replicate(cmd) => cmd.run(),
        Subcommand::Generate(cmd) => cmd.run(),
        Subcommand::Inspect(cmd) => {
            let summary = cmd.run()?;
            print!("{summary}");
            Ok(())
        },
    }
}

impl ReplicateCmd {
    pub fn run(&self) -> Result<(), Error> {
        if !self.force && same_file(&self.input, &self.output) {
            return Err(Error::OutputIsInput(self.output.clone()));
        }
        let roster: Roster<DefaultCurve> = codec::load(&self.input)?;
        info!(path = %self.input.display(), nodes = roster.len(), width = roster.width(), "loaded roster");

        let grown = rosterkit::replicate(&mut OsRng, &roster, self.count as usize)?;
        codec::save(&self.output, &grown)?;
        info!(path = %self.output.display(), nodes = grown.len(), width = grown.width(), "saved roster");
        Ok(())
    }
}

impl GenerateCmd {
    pub fn run(&self) -> Result<(), Error> {
        if self.nodes == 0 {
            return Err(Error::NoNodes);
        }
        let width = self.width.unwrap_or(self.nodes);
        let roster = Roster::<DefaultCurve>::random(&mut OsRng, self.nodes, width)?;
        roster.validate()?;
        codec::save(&self.output, &roster)?;
        info!(path = %self.output.display(), nodes = roster.len(), width, "generated roster");
        Ok(())
    }
}

impl InspectCmd {
    pub fn run(&self) -> Result<Summary, Error> {
        let roster: Roster<DefaultCurve> = codec::load(&self.input)?;
        roster.validate()?;
        Summary::of(&roster)
    }
}

/// What an operator compares before and after a replication. Holds no secret material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub nodes: usize,
    pub width: usize,
    pub aggregate_public_key: PublicKey<DefaultCurve>,
    pub column_digests: Vec<String>,
}

impl Summary {
    pub fn of(roster: &Roster<DefaultCurve>) -> Result<Self, Error> {
        let column_digests = roster
            .column_sums()
            .iter()
            .map(|sum| -> Result<String, Error> {
                let mut bytes = Vec::new();
                sum.serialize_compressed(&mut bytes)?;
                Ok(hex::encode(&Sha3_256::digest(&bytes)[..COLUMN_DIGEST_LEN]))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            nodes: roster.len(),
            width: roster.width(),
            aggregate_public_key: roster.aggregate_public_key(),
            column_digests,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes: {}", self.nodes)?;
        writeln!(f, "width: {}", self.width)?;
        writeln!(f, "aggregate public key: {}", self.aggregate_public_key)?;
        for (j, digest) in self.column_digests.iter().enumerate() {
            writeln!(f, "column {j}: {digest}")?;
        }
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
