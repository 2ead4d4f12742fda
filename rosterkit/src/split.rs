use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_std::{rand, vec, vec::Vec};
use zeroize::Zeroize;

use crate::{keys::SecretKey, roster::Node, Scalar};

/// Extra random bytes drawn on top of the field size, so reducing the sample modulo the field
/// order leaves a bias of at most 2^-128.
const WIDE_SAMPLE_EXTRA_BYTES: usize = 16;

#[derive(Debug, displaydoc::Display)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum Error {
    /// Secure random source failed: {0}
    Randomness(rand::Error),
    /// Cannot split a value into zero shares
    ZeroShares,
    /// Cannot split a value into more shares than are addressable
    TooManyShares,
}

impl Error {
    pub fn kind(&self) -> crate::ErrorKind {
        match self {
            Self::Randomness(_) => crate::ErrorKind::Randomness,
            Self::ZeroShares | Self::TooManyShares => crate::ErrorKind::InvalidArgument,
        }
    }
}

/// Draw a uniformly random field element.
///
/// Unlike [`ark_std::UniformRand`] this goes through [`rand::RngCore::try_fill_bytes`], so a
/// source that cannot deliver randomness is reported instead of panicking.
pub fn random_scalar<F, R>(rng: &mut R) -> Result<F, Error>
where
    F: PrimeField,
    R: rand::RngCore + rand::CryptoRng + ?Sized,
{
    let field_bytes = (F::MODULUS_BIT_SIZE as usize + 7) / 8;
    let mut bytes = vec![0u8; field_bytes + WIDE_SAMPLE_EXTRA_BYTES];
    rng.try_fill_bytes(&mut bytes).map_err(Error::Randomness)?;
    let x = F::from_le_bytes_mod_order(&bytes);
    bytes.zeroize();
    Ok(x)
}

/// Split `total` into `n` additive shares.
///
/// The first `n - 1` shares are uniformly random and the last one is the remainder, so the shares
/// always sum to `total`. Splitting into a single share returns `total` and draws no randomness.
pub fn split_scalar<F, R>(rng: &mut R, total: F, n: usize) -> Result<Vec<F>, Error>
where
    F: PrimeField,
    R: rand::RngCore + rand::CryptoRng + ?Sized,
{
    if n == 0 {
        return Err(Error::ZeroShares);
    }
    let mut shares = Vec::new();
    shares.try_reserve_exact(n).map_err(|_| Error::TooManyShares)?;
    for _ in 1..n {
        match random_scalar(rng) {
            Ok(share) => shares.push(share),
            Err(e) => {
                shares.zeroize();
                return Err(e);
            },
        }
    }
    let remainder = shares.iter().fold(total, |acc, share| acc - share);
    shares.push(remainder);
    Ok(shares)
}

/// Split a donor's secret key and ephemeral row between `add_count + 1` new nodes.
///
/// The secret key and every ephemeral column are split independently. Node `i` gets the `i`-th
/// share of the secret key and the `i`-th share of every column; its public key is derived from
/// its own share.
pub fn split_node_secrets<C, R>(
    rng: &mut R,
    donor_secret: &SecretKey<C>,
    donor_row: &[Scalar<C>],
    add_count: usize,
) -> Result<Vec<Node<C>>, Error>
where
    C: CurveGroup,
    R: rand::RngCore + rand::CryptoRng + ?Sized,
{
    let parts = add_count.checked_add(1).ok_or(Error::TooManyShares)?;
    let mut secrets = split_scalar(rng, donor_secret.expose_secret(), parts)?;

    let mut rows: Vec<Vec<Scalar<C>>> = (0..parts).map(|_| Vec::with_capacity(donor_row.len())).collect();
    for value in donor_row {
        let column = match split_scalar(rng, *value, parts) {
            Ok(column) => column,
            Err(e) => {
                secrets.zeroize();
                rows.zeroize();
                return Err(e);
            },
        };
        for (row, share) in rows.iter_mut().zip(column) {
            row.push(share);
        }
    }

    Ok(secrets
        .into_iter()
        .zip(rows)
        .map(|(secret, row)| Node::new(SecretKey::new(secret), row))
        .collect())
}
