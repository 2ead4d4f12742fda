use ark_ec::CurveGroup;
use ark_std::{rand, vec, vec::Vec, Zero};
use zeroize::Zeroize;

use crate::{
    keys::{PublicKey, SecretKey},
    split, Scalar,
};

/// One participant of the cluster.
///
/// The public key is always derived from the secret key, it is never taken on trust.
#[derive(Clone, PartialEq, Eq)]
pub struct Node<C: CurveGroup> {
    /// Additive share of the collective secret key
    secret: SecretKey<C>,
    /// `generator * secret`
    public: PublicKey<C>,
    /// Ephemeral secrets, one per query-term column
    ephemeral: Vec<Scalar<C>>,
}

/// The public key of a node did not match its secret key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[displaydoc("public key does not match the secret key")]
pub struct PublicKeyMismatch;

impl<C: CurveGroup> Node<C> {
    /// Create a node, deriving its public key.
    pub fn new(secret: SecretKey<C>, ephemeral: Vec<Scalar<C>>) -> Self {
        let public = secret.public();
        Self { secret, public, ephemeral }
    }

    /// Create a node from a stored key pair, checking that `public` belongs to `secret`.
    pub fn with_public(
        secret: SecretKey<C>,
        public: PublicKey<C>,
        ephemeral: Vec<Scalar<C>>,
    ) -> Result<Self, PublicKeyMismatch> {
        let node = Self::new(secret, ephemeral);
        if node.public != public {
            return Err(PublicKeyMismatch);
        }
        Ok(node)
    }

    /// A node with random secrets.
    pub fn random<R: rand::RngCore + rand::CryptoRng + ?Sized>(rng: &mut R, width: usize) -> Result<Self, split::Error> {
        let secret = SecretKey::new(split::random_scalar::<Scalar<C>, _>(rng)?);
        let ephemeral = (0..width).map(|_| split::random_scalar(rng)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(secret, ephemeral))
    }

    /// Get the secret key share
    pub fn secret(&self) -> &SecretKey<C> {
        &self.secret
    }

    /// Get the public key share
    pub fn public(&self) -> PublicKey<C> {
        self.public
    }

    /// Get the ephemeral secrets
    pub fn ephemeral(&self) -> &[Scalar<C>] {
        &self.ephemeral
    }

    /// Number of ephemeral columns
    pub fn width(&self) -> usize {
        self.ephemeral.len()
    }

    /// The same node with `count` more columns, each a copy of column 0.
    ///
    /// `None` when the widened row cannot be allocated.
    pub(crate) fn extended(&self, count: usize) -> Option<Self> {
        let width = self.ephemeral.len().checked_add(count)?;
        let mut ephemeral = Vec::new();
        ephemeral.try_reserve_exact(width).ok()?;
        ephemeral.extend_from_slice(&self.ephemeral);
        if let Some(first) = self.ephemeral.first() {
            ephemeral.extend(core::iter::repeat(*first).take(count));
        }
        Some(Self { secret: self.secret.clone(), public: self.public, ephemeral })
    }
}

impl<C: CurveGroup> core::fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("secret", &self.secret)
            .field("public", &self.public)
            .field("ephemeral", &format_args!("<{} redacted>", self.ephemeral.len()))
            .finish()
    }
}

impl<C: CurveGroup> Drop for Node<C> {
    fn drop(&mut self) {
        self.ephemeral.zeroize();
    }
}

/// The shape of the ephemeral matrix is not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum DimensionError {
    /// ephemeral rows have no columns
    NoColumns,
    /// ephemeral row of node {index} has {actual} columns, expected {expected}
    RaggedRow { index: usize, expected: usize, actual: usize },
}

/// The ordered list of participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster<C: CurveGroup> {
    nodes: Vec<Node<C>>,
}

impl<C: CurveGroup> From<Vec<Node<C>>> for Roster<C> {
    fn from(nodes: Vec<Node<C>>) -> Self {
        Self { nodes }
    }
}

impl<C: CurveGroup> FromIterator<Node<C>> for Roster<C> {
    fn from_iter<I: IntoIterator<Item = Node<C>>>(iter: I) -> Self {
        Self { nodes: iter.into_iter().collect() }
    }
}

impl<C: CurveGroup> Roster<C> {
    /// A roster of `n` random nodes with `width` ephemeral columns each.
    pub fn random<R: rand::RngCore + rand::CryptoRng + ?Sized>(
        rng: &mut R,
        n: usize,
        width: usize,
    ) -> Result<Self, split::Error> {
        (0..n).map(|_| Node::random(rng, width)).collect()
    }

    pub fn nodes(&self) -> &[Node<C>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Width of the ephemeral matrix, taken from the first node.
    pub fn width(&self) -> usize {
        self.nodes.first().map(Node::width).unwrap_or(0)
    }

    /// Check that the ephemeral matrix is rectangular and has at least one column.
    ///
    /// An empty roster is trivially rectangular; callers that need nodes check for that themselves.
    pub fn validate(&self) -> Result<(), DimensionError> {
        let expected = self.width();
        if !self.is_empty() && expected == 0 {
            return Err(DimensionError::NoColumns);
        }
        match self.nodes.iter().position(|node| node.width() != expected) {
            Some(index) => Err(DimensionError::RaggedRow { index, expected, actual: self.nodes[index].width() }),
            None => Ok(()),
        }
    }

    /// The collective public key, the sum of all public key shares.
    pub fn aggregate_public_key(&self) -> PublicKey<C> {
        self.nodes.iter().map(Node::public).sum()
    }

    /// Sum of every ephemeral column over all nodes.
    ///
    /// Rows shorter than the first one contribute nothing to the missing columns; call
    /// [`Roster::validate`] first when that matters.
    pub fn column_sums(&self) -> Vec<Scalar<C>> {
        let mut sums = vec![Scalar::<C>::zero(); self.width()];
        for node in &self.nodes {
            for (sum, value) in sums.iter_mut().zip(node.ephemeral()) {
                *sum += value;
            }
        }
        sums
    }

    pub fn into_nodes(self) -> Vec<Node<C>> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use ark_bls12_381::{Fr, G2Projective};
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    use super::*;

    type G = G2Projective;

    fn node(sk: u64, row: &[u64]) -> Node<G> {
        Node::new(SecretKey::new(Fr::from(sk)), row.iter().copied().map(Fr::from).collect())
    }

    #[test]
    fn public_key_is_derived() {
        let n = node(5, &[1, 2]);
        assert_eq!(n.public(), SecretKey::<G>::new(Fr::from(5u64)).public());

        let other = SecretKey::<G>::new(Fr::from(6u64)).public();
        let err = Node::with_public(SecretKey::new(Fr::from(5u64)), other, Vec::new()).unwrap_err();
        assert_eq!(err, PublicKeyMismatch);
        assert!(Node::with_public(SecretKey::<G>::new(Fr::from(5u64)), n.public(), Vec::new()).is_ok());
    }

    #[test]
    fn aggregates() {
        let roster = Roster::from(vec![node(1, &[1, 10]), node(2, &[2, 20]), node(3, &[3, 30])]);
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.width(), 2);
        assert_eq!(roster.aggregate_public_key(), SecretKey::<G>::new(Fr::from(6u64)).public());
        assert_eq!(roster.column_sums(), vec![Fr::from(6u64), Fr::from(60u64)]);
    }

    #[test]
    fn validate_detects_ragged_rows() {
        let roster = Roster::from(vec![node(1, &[1, 2]), node(2, &[1, 2]), node(3, &[1])]);
        assert_eq!(roster.validate(), Err(DimensionError::RaggedRow { index: 2, expected: 2, actual: 1 }));

        let roster = Roster::from(vec![node(1, &[]), node(2, &[])]);
        assert_eq!(roster.validate(), Err(DimensionError::NoColumns));

        let roster = Roster::<G>::from(Vec::new());
        assert_eq!(roster.validate(), Ok(()));
        assert_eq!(roster.width(), 0);
        assert!(roster.column_sums().is_empty());
    }

    #[test]
    fn extension_copies_first_column() {
        let n = node(1, &[7, 8]).extended(3).unwrap();
        assert_eq!(n.ephemeral(), &[7u64, 8, 7, 7, 7].map(Fr::from));
        assert_eq!(n.public(), node(1, &[]).public());
    }

    #[test]
    fn extension_beyond_addressable_width_fails() {
        let n = node(1, &[7, 8]);
        assert!(n.extended(usize::MAX).is_none());
        assert!(n.extended(1 << 60).is_none());
        assert_eq!(n.ephemeral(), &[7u64, 8].map(Fr::from));
    }

    #[test]
    fn random_roster_is_rectangular() {
        let rng = &mut StdRng::seed_from_u64(11);
        let roster = Roster::<G>::random(rng, 4, 6).unwrap();
        assert_eq!(roster.len(), 4);
        assert_eq!(roster.width(), 6);
        assert!(roster.validate().is_ok());
        assert!(!format!("{roster:?}").contains(&format!("{:?}", roster.nodes()[0].ephemeral()[0])));
        for node in roster.nodes() {
            assert_eq!(node.public(), node.secret().public());
        }
    }
}
