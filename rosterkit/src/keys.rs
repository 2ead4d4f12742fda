use core::{iter::Sum, ops::Add};

use ark_ec::{AffineRepr, CurveGroup};
use ark_serialize::CanonicalSerialize;
use ark_std::{rand, vec::Vec, UniformRand, Zero};
use zeroize::Zeroize;

use crate::Scalar;

/// A Public Key is a curve point, the generator multiplied by the matching [`SecretKey`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey<C: CurveGroup>(C::Affine);

impl<C: CurveGroup> PublicKey<C> {
    /// Wrap an Affine point
    pub fn from_affine(pk: C::Affine) -> Self {
        Self(pk)
    }

    /// Normalize a Projective point
    pub fn from_projective(pk: C) -> Self {
        Self(pk.into_affine())
    }

    /// Get the PublicKey as an Affine point
    pub fn into_affine(self) -> C::Affine {
        self.0
    }

    /// Get the PublicKey as a Projective point
    pub fn into_projective(self) -> C {
        self.0.into_group()
    }
}

impl<C: CurveGroup> AsRef<C::Affine> for PublicKey<C> {
    fn as_ref(&self) -> &C::Affine {
        &self.0
    }
}

impl<C: CurveGroup> Add<&PublicKey<C>> for PublicKey<C> {
    type Output = Self;

    fn add(self, rhs: &PublicKey<C>) -> Self {
        Self((self.0 + rhs.0).into_affine())
    }
}

impl<C: CurveGroup> Add<PublicKey<C>> for PublicKey<C> {
    type Output = Self;

    fn add(self, rhs: PublicKey<C>) -> Self {
        self + &rhs
    }
}

impl<C: CurveGroup> Zero for PublicKey<C> {
    fn zero() -> Self {
        Self(C::Affine::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl<C: CurveGroup> Sum for PublicKey<C> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self::from_projective(iter.map(Self::into_projective).sum::<C>())
    }
}

impl<'a, C: CurveGroup> Sum<&'a PublicKey<C>> for PublicKey<C> {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl<C: CurveGroup> core::fmt::Display for PublicKey<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut bytes = Vec::new();
        self.0
            .serialize_compressed(&mut bytes)
            .map_err(|_| core::fmt::Error)?;
        write!(f, "{}", hex::encode(&bytes))
    }
}

/// A Secret Key is a scalar field element, one additive share of the collective key.
///
/// Wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey<C: CurveGroup>(Scalar<C>);

impl<C: CurveGroup> core::fmt::Debug for SecretKey<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SecretKey").field(&"<redacted>").finish()
    }
}

impl<C: CurveGroup> Drop for SecretKey<C> {
    fn drop(&mut self) {
        self.0.zeroize()
    }
}

impl<C: CurveGroup> UniformRand for SecretKey<C> {
    fn rand<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Scalar::<C>::rand(rng))
    }
}

impl<C: CurveGroup> Zeroize for SecretKey<C> {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl<C: CurveGroup> SecretKey<C> {
    /// Wrap a field element
    pub fn new(sk: Scalar<C>) -> Self {
        Self(sk)
    }

    /// Return the public key corresponding to this secret key
    pub fn public(&self) -> PublicKey<C> {
        PublicKey::from_projective(C::generator() * self.0)
    }

    /// Get the SecretKey as a field element
    ///
    /// NOTE: you should not use this function unless you know what you are doing.
    pub fn expose_secret(&self) -> Scalar<C> {
        self.0
    }

    /// Is the current secret key is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}
