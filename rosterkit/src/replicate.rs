use ark_ec::CurveGroup;
use ark_std::{end_timer, rand, start_timer, vec::Vec};
use tracing::{debug, info};

use crate::{
    roster::{DimensionError, Node, Roster},
    split, ErrorKind,
};

/// Replication error
#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// Invalid argument: {0}
    InvalidArgument(#[cfg_attr(feature = "std", from, source)] InvalidArgument),
    /// Roster has an unusable shape: {0}
    Dimension(#[cfg_attr(feature = "std", from, source)] DimensionError),
    /// Splitting the donor secrets failed: {0}
    Split(#[cfg_attr(feature = "std", from, source)] split::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum InvalidArgument {
    /// the number of nodes to add must be greater than zero
    NothingToAdd,
    /// the roster has no nodes
    EmptyRoster,
    /// adding {0} nodes would exceed the addressable roster size
    TooMany(usize),
}

#[cfg(not(feature = "std"))]
impl From<InvalidArgument> for Error {
    fn from(e: InvalidArgument) -> Self {
        Self::InvalidArgument(e)
    }
}

#[cfg(not(feature = "std"))]
impl From<DimensionError> for Error {
    fn from(e: DimensionError) -> Self {
        Self::Dimension(e)
    }
}

#[cfg(not(feature = "std"))]
impl From<split::Error> for Error {
    fn from(e: split::Error) -> Self {
        Self::Split(e)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Dimension(_) => ErrorKind::Dimension,
            Self::Split(e) => e.kind(),
        }
    }
}

/// Grow the roster by `add_count` nodes, keeping the collective key and the ephemeral column sums.
///
/// 1. Every row gets `add_count` new columns, each a copy of its column 0, so every new column
///    sums to the existing column 0 sum.
/// 2. The node at index 0 is the donor. Its secret key and its (extended) row are split into
///    `add_count + 1` additive shares.
/// 3. The donor is replaced by the new nodes, which are appended after the untouched ones.
///
/// The result has `roster.len() + add_count` nodes. Nothing is produced unless every step
/// succeeds, and the input roster is left as it was.
#[tracing::instrument(level = "debug", skip_all, fields(nodes = roster.len(), width = roster.width(), add_count = add_count))]
pub fn replicate<C, R>(rng: &mut R, roster: &Roster<C>, add_count: usize) -> Result<Roster<C>, Error>
where
    C: CurveGroup,
    R: rand::RngCore + rand::CryptoRng + ?Sized,
{
    if add_count == 0 {
        return Err(InvalidArgument::NothingToAdd.into());
    }
    if roster.is_empty() {
        return Err(InvalidArgument::EmptyRoster.into());
    }
    roster.validate()?;
    let total = roster.len().checked_add(add_count).ok_or(InvalidArgument::TooMany(add_count))?;
    roster.width().checked_add(add_count).ok_or(InvalidArgument::TooMany(add_count))?;

    let timer = start_timer!(|| "Replicate roster");
    let extended = roster
        .nodes()
        .iter()
        .map(|node| node.extended(add_count))
        .collect::<Option<Vec<_>>>()
        .ok_or(InvalidArgument::TooMany(add_count))?;
    let (donor, untouched) = extended.split_first().ok_or(InvalidArgument::EmptyRoster)?;

    debug!(donor = %donor.public(), "splitting donor node");
    let shares = split::split_node_secrets(rng, donor.secret(), donor.ephemeral(), add_count)?;

    let mut nodes: Vec<Node<C>> = Vec::new();
    nodes.try_reserve_exact(total).map_err(|_| InvalidArgument::TooMany(add_count))?;
    nodes.extend_from_slice(untouched);
    nodes.extend(shares);
    end_timer!(timer);

    let replicated = Roster::from(nodes);
    info!(
        before = roster.len(),
        after = replicated.len(),
        width = replicated.width(),
        "roster replicated"
    );
    Ok(replicated)
}

#[cfg(test)]
mod tests {
    use ark_bls12_381::{Fr, G1Projective, G2Projective};
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };
    use proptest::prelude::ProptestConfig;
    use test_strategy::proptest;

    use super::*;
    use crate::{keys::SecretKey, split::testing::DryRng};

    type G = G2Projective;

    fn secret_sum<C: CurveGroup>(roster: &Roster<C>) -> C::ScalarField {
        roster.nodes().iter().map(|node| node.secret().expose_secret()).sum()
    }

    fn assert_invariants<C: CurveGroup>(before: &Roster<C>, after: &Roster<C>, add_count: usize) {
        assert_eq!(after.len(), before.len() + add_count);
        assert!(after.validate().is_ok());
        assert_eq!(after.width(), before.width() + add_count);
        assert_eq!(secret_sum(after), secret_sum(before));
        assert_eq!(after.aggregate_public_key(), before.aggregate_public_key());

        let expected = before.column_sums();
        let actual = after.column_sums();
        for (j, sum) in actual.iter().enumerate() {
            if j < before.width() {
                assert_eq!(sum, &expected[j], "column {j} changed");
            } else {
                assert_eq!(sum, &expected[0], "new column {j} does not match column 0");
            }
        }
        for node in after.nodes() {
            assert_eq!(node.public(), node.secret().public());
        }
    }

    #[test]
    fn three_nodes_grow_to_six() {
        let rng = &mut StdRng::seed_from_u64(0xdead);
        let secrets = (0..3).map(|_| Fr::rand(rng)).collect::<Vec<_>>();
        let roster: Roster<G> = secrets
            .iter()
            .map(|sk| Node::new(SecretKey::new(*sk), (0..3).map(|_| Fr::rand(rng)).collect()))
            .collect();
        let collective = SecretKey::<G>::new(secrets.iter().sum::<Fr>()).public();

        let grown = replicate(rng, &roster, 3).unwrap();
        assert_eq!(grown.len(), 6);
        assert_eq!(grown.aggregate_public_key(), collective);
        assert_invariants(&roster, &grown, 3);

        // the donor is gone, the other nodes are kept in order at the front
        assert_eq!(&grown.nodes()[0].public(), &roster.nodes()[1].public());
        assert_eq!(&grown.nodes()[1].public(), &roster.nodes()[2].public());
        assert!(grown.nodes().iter().all(|node| node.public() != roster.nodes()[0].public()));
        // untouched nodes only got their column 0 copied
        let kept = &grown.nodes()[0];
        assert_eq!(&kept.ephemeral()[..3], roster.nodes()[1].ephemeral());
        assert!(kept.ephemeral()[3..].iter().all(|x| *x == roster.nodes()[1].ephemeral()[0]));
    }

    #[test]
    fn single_node_is_split_entirely() {
        let rng = &mut StdRng::seed_from_u64(1);
        let sk = Fr::from(424242u64);
        let value = Fr::from(17u64);
        let roster = Roster::<G>::from(vec![Node::new(SecretKey::new(sk), vec![value])]);

        let grown = replicate(rng, &roster, 2).unwrap();
        assert_eq!(grown.len(), 3);
        assert_eq!(grown.width(), 3);
        assert_eq!(secret_sum(&grown), sk);
        assert_eq!(grown.column_sums(), vec![value; 3]);
        assert_invariants(&roster, &grown, 2);
    }

    #[test]
    fn rejects_invalid_arguments() {
        let rng = &mut StdRng::seed_from_u64(2);
        let roster = Roster::<G>::random(rng, 3, 3).unwrap();

        let err = replicate(rng, &roster, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(InvalidArgument::NothingToAdd)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = replicate(rng, &Roster::<G>::from(Vec::new()), 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(InvalidArgument::EmptyRoster)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn oversized_growth_is_an_error() {
        let rng = &mut StdRng::seed_from_u64(8);
        let roster = Roster::<G>::random(rng, 3, 2).unwrap();
        let snapshot = roster.clone();

        for add_count in [usize::MAX, usize::MAX - 1, 1 << 60] {
            let err = replicate(rng, &roster, add_count).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(InvalidArgument::TooMany(n)) if n == add_count));
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(roster, snapshot);

        // the node count fits but the widened rows do not
        let single = Roster::<G>::random(rng, 1, 3).unwrap();
        let err = replicate(rng, &single, usize::MAX - 2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(InvalidArgument::TooMany(_))));
    }

    #[test]
    fn rejects_ragged_rosters_before_drawing_randomness() {
        let rng = &mut StdRng::seed_from_u64(3);
        let mut nodes = Roster::<G>::random(rng, 3, 3).unwrap().into_nodes();
        nodes.push(Node::random(rng, 2).unwrap());
        let ragged = Roster::from(nodes);

        // DryRng would fail any split, so a dimension error proves validation came first
        let err = replicate(&mut DryRng, &ragged, 1).unwrap_err();
        assert!(matches!(err, Error::Dimension(DimensionError::RaggedRow { index: 3, expected: 3, actual: 2 })));
        assert_eq!(err.kind(), ErrorKind::Dimension);

        let no_columns = Roster::<G>::random(rng, 2, 0).unwrap();
        let err = replicate(rng, &no_columns, 1).unwrap_err();
        assert!(matches!(err, Error::Dimension(DimensionError::NoColumns)));
    }

    #[test]
    fn randomness_failure_aborts_without_output() {
        let rng = &mut StdRng::seed_from_u64(4);
        let roster = Roster::<G>::random(rng, 2, 2).unwrap();
        let snapshot = roster.clone();

        let err = replicate(&mut DryRng, &roster, 2).unwrap_err();
        assert!(matches!(err, Error::Split(split::Error::Randomness(_))));
        assert_eq!(err.kind(), ErrorKind::Randomness);
        assert_eq!(roster, snapshot);
    }

    #[test]
    fn repeated_calls_differ_but_keep_invariants() {
        let rng = &mut StdRng::seed_from_u64(5);
        let roster = Roster::<G>::random(rng, 3, 3).unwrap();

        let a = replicate(rng, &roster, 2).unwrap();
        let b = replicate(rng, &roster, 2).unwrap();
        let new_a = a.nodes()[2..].iter().map(|n| n.secret().expose_secret()).collect::<Vec<_>>();
        let new_b = b.nodes()[2..].iter().map(|n| n.secret().expose_secret()).collect::<Vec<_>>();
        assert_ne!(new_a, new_b);
        assert_eq!(secret_sum(&a), secret_sum(&b));
        assert_eq!(a.aggregate_public_key(), b.aggregate_public_key());
        assert_eq!(a.column_sums(), b.column_sums());
    }

    #[test]
    fn works_over_other_groups() {
        let rng = &mut StdRng::seed_from_u64(6);
        let roster = Roster::<G1Projective>::random(rng, 4, 4).unwrap();
        let grown = replicate(rng, &roster, 1).unwrap();
        assert_invariants(&roster, &grown, 1);
    }

    #[proptest(ProptestConfig { cases: 32, ..ProptestConfig::default() })]
    fn replicate_preserves_aggregates(
        #[strategy(1usize..6)] n: usize,
        #[strategy(1usize..6)] width: usize,
        #[strategy(1usize..6)] add_count: usize,
        seed: u64,
    ) {
        let rng = &mut StdRng::seed_from_u64(seed);
        let roster = Roster::<G1Projective>::random(rng, n, width).unwrap();
        let grown = replicate(rng, &roster, add_count).unwrap();
        assert_invariants(&roster, &grown, add_count);
    }
}
