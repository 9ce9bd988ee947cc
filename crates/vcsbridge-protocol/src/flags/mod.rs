//! Typed flag sets used for traits, commands, field flags and asset states.
//!
//! Every flag enum assigns each variant a bit position. A [`FlagSet`] stores
//! the union of positions as a `u32` and serialises to that integer, so the
//! wire keeps the compact bitmask while Rust code works with named variants.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;

/// A single flag with a fixed bit position.
pub trait Flag: Copy + Eq + IntoEnumIterator + fmt::Debug + fmt::Display + 'static {
    /// Returns the zero-based bit position of the flag.
    fn position(self) -> u32;

    /// Returns the flag as a one-bit mask.
    fn bit(self) -> u32 {
        1 << self.position()
    }
}

/// Implements [`Flag`] for a fieldless enum whose discriminants are bit
/// positions, plus `A | B` composition into a [`FlagSet`].
macro_rules! impl_flag {
    ($ty:ty) => {
        impl $crate::flags::Flag for $ty {
            fn position(self) -> u32 {
                self as u32
            }
        }

        impl ::std::ops::BitOr for $ty {
            type Output = $crate::flags::FlagSet<$ty>;

            fn bitor(self, rhs: Self) -> Self::Output {
                $crate::flags::FlagSet::from(self) | rhs
            }
        }
    };
}

pub(crate) use impl_flag;

/// A set of flags of one kind.
///
/// # Example
///
/// ```
/// use vcsbridge_protocol::{AssetState, AssetStates};
///
/// let states = AssetState::Local | AssetState::CheckedOutLocal;
/// assert!(states.contains(AssetState::CheckedOutLocal));
/// assert!(!states.contains(AssetState::Conflicted));
/// assert_eq!(AssetStates::empty().bits(), 0);
/// ```
pub struct FlagSet<T> {
    bits: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> FlagSet<T> {
    const fn from_raw(bits: u32) -> Self {
        Self {
            bits,
            marker: PhantomData,
        }
    }

    /// Returns the empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_raw(0)
    }

    /// Returns the raw bitmask.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns `true` when no flag is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl<T: Flag> FlagSet<T> {
    /// Returns the set holding every declared flag.
    #[must_use]
    pub fn all() -> Self {
        Self::from_raw(T::iter().fold(0, |acc, flag| acc | flag.bit()))
    }

    /// Builds a set from a raw mask, dropping bits no flag declares.
    #[must_use]
    pub fn from_bits_truncate(bits: u32) -> Self {
        Self::from_raw(bits & Self::all().bits)
    }

    /// Returns `true` when `flag` is in the set.
    #[must_use]
    pub fn contains(&self, flag: T) -> bool {
        self.bits & flag.bit() != 0
    }

    /// Returns `true` when every flag of `other` is in the set.
    #[must_use]
    pub const fn contains_all(&self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Returns `true` when the two sets share at least one flag.
    #[must_use]
    pub const fn intersects(&self, other: Self) -> bool {
        self.bits & other.bits != 0
    }

    /// Adds `flag` to the set.
    pub fn insert(&mut self, flag: T) {
        self.bits |= flag.bit();
    }

    /// Removes `flag` from the set.
    pub fn remove(&mut self, flag: T) {
        self.bits &= !flag.bit();
    }

    /// Returns the flags present in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self::from_raw(self.bits & other.bits)
    }

    /// Returns the union of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self::from_raw(self.bits | other.bits)
    }

    /// Returns every declared flag not in the set.
    #[must_use]
    pub fn complement(self) -> Self {
        Self::from_raw(Self::all().bits & !self.bits)
    }

    /// Iterates the contained flags in declaration order.
    #[must_use]
    pub fn iter(self) -> impl Iterator<Item = T> {
        T::iter().filter(move |flag| self.contains(*flag))
    }
}

impl<T> Clone for FlagSet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FlagSet<T> {}

impl<T> Default for FlagSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for FlagSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for FlagSet<T> {}

impl<T> Hash for FlagSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T: Flag> fmt::Debug for FlagSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Flag> fmt::Display for FlagSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for flag in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{flag}")?;
            first = false;
        }
        Ok(())
    }
}

impl<T: Flag> From<T> for FlagSet<T> {
    fn from(flag: T) -> Self {
        Self::from_raw(flag.bit())
    }
}

impl<T: Flag> FromIterator<T> for FlagSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_raw(iter.into_iter().fold(0, |acc, flag| acc | flag.bit()))
    }
}

impl<T: Flag> BitOr for FlagSet<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl<T: Flag> BitOr<T> for FlagSet<T> {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self::Output {
        Self::from_raw(self.bits | rhs.bit())
    }
}

impl<T: Flag> BitOrAssign for FlagSet<T> {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl<T: Flag> BitOrAssign<T> for FlagSet<T> {
    fn bitor_assign(&mut self, rhs: T) {
        self.insert(rhs);
    }
}

impl<T: Flag> BitAnd for FlagSet<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}

impl<T: Flag> BitAndAssign for FlagSet<T> {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits &= rhs.bits;
    }
}

impl<T: Flag> Sub for FlagSet<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_raw(self.bits & !rhs.bits)
    }
}

impl<T: Flag> Not for FlagSet<T> {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.complement()
    }
}

impl<T> Serialize for FlagSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits)
    }
}

impl<'de, T: Flag> Deserialize<'de> for FlagSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_truncate)
    }
}
