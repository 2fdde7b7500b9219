//! IPv4 CIDR parsing and sequential subnet allocation

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{ConstructError, Result};

/// Smallest prefix EC2 accepts for a VPC or subnet
pub const MIN_PREFIX: u8 = 16;
/// Largest prefix EC2 accepts for a VPC or subnet
pub const MAX_PREFIX: u8 = 28;

/// An IPv4 network in CIDR notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Cidr {
    network: u32,
    prefix: u8,
}

impl Ipv4Cidr {
    /// # Errors
    /// Returns [`ConstructError::InvalidCidr`] if `prefix > 32` or host bits are set
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self> {
        let network = u32::from(network);
        if prefix > 32 || network & !mask(prefix) != 0 {
            return Err(ConstructError::InvalidCidr(format!(
                "{}/{prefix}",
                Ipv4Addr::from(network)
            )));
        }
        Ok(Self { network, prefix })
    }

    #[inline]
    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    #[inline]
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        1u64 << (32 - self.prefix)
    }

    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.prefix >= self.prefix && other.network & mask(self.prefix) == self.network
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ConstructError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ConstructError::InvalidCidr(s.to_string());
        let (addr, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        Self::new(addr, prefix).map_err(|_| invalid())
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

/// Hands out consecutive, aligned, non-overlapping blocks of a parent network
#[derive(Debug, Clone)]
pub struct CidrAllocator {
    parent: Ipv4Cidr,
    next: u64,
}

impl CidrAllocator {
    #[must_use]
    pub fn new(parent: Ipv4Cidr) -> Self {
        Self {
            next: u64::from(parent.network),
            parent,
        }
    }

    /// Next free `/mask` block
    ///
    /// # Errors
    /// - [`ConstructError::InvalidMask`] if the mask is outside `parent.prefix..=28`
    /// - [`ConstructError::CidrExhausted`] if the block does not fit
    pub fn allocate(&mut self, mask: u8) -> Result<Ipv4Cidr> {
        if mask > MAX_PREFIX {
            return Err(ConstructError::InvalidMask {
                mask,
                reason: format!("subnets cannot be smaller than /{MAX_PREFIX}"),
            });
        }
        if mask < self.parent.prefix {
            return Err(ConstructError::InvalidMask {
                mask,
                reason: format!("larger than the VPC block {}", self.parent),
            });
        }

        let size = 1u64 << (32 - mask);
        let start = self.next.div_ceil(size) * size;
        let end = u64::from(self.parent.network) + self.parent.size();
        if start + size > end {
            return Err(ConstructError::CidrExhausted {
                cidr: self.parent.to_string(),
                mask,
            });
        }
        self.next = start + size;

        let network = u32::try_from(start).map_err(|_| ConstructError::CidrExhausted {
            cidr: self.parent.to_string(),
            mask,
        })?;
        Ok(Ipv4Cidr { network, prefix: mask })
    }
}
