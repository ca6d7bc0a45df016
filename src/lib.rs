//! A growable contiguous container built from first principles.
//!
//! [`Hoard`] is contract-equivalent to a standard vector, assembled from a
//! raw storage block ([`RawBuf`]) and explicit element placement, with the
//! panic-safety guarantee of every mutating operation spelled out.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub use hoard_core::AllocError;

pub use crate::{raw::RawBuf, vec::Hoard};

mod raw;
mod vec;
