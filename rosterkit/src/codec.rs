//! Roster files.
//!
//! A roster is stored as TOML, one `[[node]]` table per participant:
//!
//! ```toml
//! [[node]]
//! publicKey = "<hex of the compressed public key>"
//! secretKey = "<hex of the secret key share>"
//! secrets = ["<hex of ephemeral secret 0>", "<hex of ephemeral secret 1>"]
//! ```
//!
//! The capitalized key names `[[Node]]`, `PubKey`, `SecKey` and `Secrets` are accepted as aliases,
//! the values behind them must still be hex encodings in the format above. Writing always uses the
//! names above.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use ark_ec::CurveGroup;
use ark_serialize::SerializationError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use crate::{
    ark::{self, DecodeError},
    keys::{PublicKey, SecretKey},
    roster::{Node, PublicKeyMismatch, Roster},
    ErrorKind, Scalar,
};

/// The serialized form of a roster.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RosterFile {
    #[serde(rename = "node", alias = "Node", default)]
    pub nodes: Vec<NodeRecord>,
}

/// The serialized form of one node. Every field is a hex encoded canonical value.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "publicKey", alias = "PubKey")]
    pub public_key: String,
    #[serde(rename = "secretKey", alias = "SecKey")]
    pub secret_key: String,
    #[serde(rename = "secrets", alias = "Secrets", default)]
    pub secrets: Vec<String>,
}

impl core::fmt::Debug for NodeRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeRecord")
            .field("public_key", &self.public_key)
            .field("secret_key", &"<redacted>")
            .field("secrets", &format_args!("<{} redacted>", self.secrets.len()))
            .finish()
    }
}

impl Drop for NodeRecord {
    fn drop(&mut self) {
        self.secret_key.zeroize();
        self.secrets.zeroize();
    }
}

/// A field of a [`NodeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
pub enum Field {
    /// publicKey
    PublicKey,
    /// secretKey
    SecretKey,
    /// secrets[{0}]
    Secret(usize),
}

#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum DecodeReason {
    /// {0}
    Malformed(#[from] DecodeError),
    /// {0}
    Mismatch(#[from] PublicKeyMismatch),
}

#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum Error {
    /// I/O error on {path:?}: {source}
    Io { path: PathBuf, source: io::Error },
    /// Roster file is not valid TOML: {0}
    Parse(#[source] toml::de::Error),
    /// Roster could not be written as TOML: {0}
    Serialize(#[source] toml::ser::Error),
    /// Record {index}, field {field}: {reason}
    Decode {
        index: usize,
        field: Field,
        #[source]
        reason: DecodeReason,
    },
    /// Record {index} could not be encoded: {source}
    Encode { index: usize, source: SerializationError },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) | Self::Decode { .. } => ErrorKind::Decode,
            Self::Io { .. } | Self::Serialize(_) | Self::Encode { .. } => ErrorKind::Io,
        }
    }

    fn decode(index: usize, field: Field, reason: impl Into<DecodeReason>) -> Self {
        Self::Decode { index, field, reason: reason.into() }
    }
}

impl RosterFile {
    /// Decode every record, failing on the first field that is not a canonical encoding.
    pub fn decode<C: CurveGroup>(&self) -> Result<Roster<C>, Error> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, record)| record.decode(index))
            .collect::<Result<Vec<_>, _>>()
            .map(Roster::from)
    }

    /// Encode a roster, record `i` holding node `i`.
    pub fn encode<C: CurveGroup>(roster: &Roster<C>) -> Result<Self, Error> {
        let nodes = roster
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| NodeRecord::encode(node).map_err(|source| Error::Encode { index, source }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nodes })
    }
}

impl NodeRecord {
    fn decode<C: CurveGroup>(&self, index: usize) -> Result<Node<C>, Error> {
        let public = ark::decode::<C::Affine>(&self.public_key)
            .map_err(|e| Error::decode(index, Field::PublicKey, e))?;
        let secret = ark::decode::<Scalar<C>>(&self.secret_key)
            .map_err(|e| Error::decode(index, Field::SecretKey, e))?;
        let ephemeral = self
            .secrets
            .iter()
            .enumerate()
            .map(|(j, s)| ark::decode::<Scalar<C>>(s).map_err(|e| Error::decode(index, Field::Secret(j), e)))
            .collect::<Result<Vec<_>, _>>()?;
        Node::with_public(SecretKey::new(secret), PublicKey::from_affine(public), ephemeral)
            .map_err(|e| Error::decode(index, Field::PublicKey, e))
    }

    fn encode<C: CurveGroup>(node: &Node<C>) -> Result<Self, SerializationError> {
        Ok(Self {
            public_key: ark::encode(&node.public().into_affine())?,
            secret_key: ark::encode(&node.secret().expose_secret())?,
            secrets: node.ephemeral().iter().map(ark::encode).collect::<Result<Vec<_>, _>>()?,
        })
    }
}

/// Parse a roster from TOML text.
pub fn from_toml_str<C: CurveGroup>(s: &str) -> Result<Roster<C>, Error> {
    let file: RosterFile = toml::from_str(s).map_err(Error::Parse)?;
    file.decode()
}

/// Render a roster as TOML text.
pub fn to_toml_string<C: CurveGroup>(roster: &Roster<C>) -> Result<String, Error> {
    let file = RosterFile::encode(roster)?;
    toml::to_string(&file).map_err(Error::Serialize)
}

/// Load a roster file.
pub fn load<C: CurveGroup>(path: impl AsRef<Path>) -> Result<Roster<C>, Error> {
    let path = path.as_ref();
    let mut contents = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    let roster = from_toml_str(&contents);
    contents.zeroize();
    let roster = roster?;
    debug!(path = %path.display(), nodes = roster.len(), width = roster.width(), "roster loaded");
    Ok(roster)
}

/// Save a roster file.
///
/// The roster is fully encoded before anything touches the disk. It is then written to a
/// temporary file next to `path`, synced and renamed over `path`, so either the complete new
/// roster is in place or the previous file is left as it was.
pub fn save<C: CurveGroup>(path: impl AsRef<Path>, roster: &Roster<C>) -> Result<(), Error> {
    let path = path.as_ref();
    let mut contents = to_toml_string(roster)?;
    let result = write_atomically(path, contents.as_bytes());
    contents.zeroize();
    result.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    debug!(path = %path.display(), nodes = roster.len(), width = roster.width(), "roster saved");
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temporary_path(path);
    let result = (|| {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
        let mut file = options.open(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        // the temporary file may not exist, nothing to report then
        let _ = fs::remove_file(&tmp);
    }
    result
}
