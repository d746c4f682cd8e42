//! IP address range (CIDR block) parsing and address arithmetic.
//!
//! Provides [`AddressRange`] for IPv4 and IPv6 networks, [`Candidate`] for
//! the single address that stands in for a range during probing, and the
//! mask helpers both are built on. Addresses are handled as `u128` bit
//! patterns so one set of helpers covers both families.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// Maximum prefix length for an IPv4 network (32 bits).
pub const MAX_LENGTH_V4: u8 = 32;
/// Maximum prefix length for an IPv6 network (128 bits).
pub const MAX_LENGTH_V6: u8 = 128;

/// Why a range string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length '{0}'")]
    InvalidPrefix(String),
    #[error("prefix length /{len} is too long for {family} (max /{max})")]
    PrefixTooLong { len: u8, max: u8, family: Family },
}

/// IP protocol family of a range or address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub fn of(addr: &IpAddr) -> Family {
        match addr {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    /// Number of bits in an address of this family.
    pub fn max_length(self) -> u8 {
        match self {
            Family::V4 => MAX_LENGTH_V4,
            Family::V6 => MAX_LENGTH_V6,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// Convert a prefix length to a network mask for the given family.
///
/// The mask occupies the low `family.max_length()` bits of the result.
///
/// # Examples
/// ```
/// use cfip_ranker::models::{get_cidr_mask, Family};
/// assert_eq!(get_cidr_mask(24, Family::V4).unwrap(), 0xFFFF_FF00);
/// ```
pub fn get_cidr_mask(len: u8, family: Family) -> Result<u128, RangeParseError> {
    let max = family.max_length();
    if len > max {
        return Err(RangeParseError::PrefixTooLong { len, max, family });
    }
    if len == 0 {
        return Ok(0);
    }
    let all_bits = if max == MAX_LENGTH_V6 {
        u128::MAX
    } else {
        (1u128 << max) - 1
    };
    let right_len = max - len;
    Ok((all_bits >> right_len) << right_len)
}

/// Address as a bit pattern, right-aligned in a `u128`.
pub fn addr_bits(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Inverse of [`addr_bits`]. Bits above the family width are dropped.
pub fn addr_from_bits(bits: u128, family: Family) -> IpAddr {
    match family {
        Family::V4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        Family::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: IpAddr, len: u8) -> Result<IpAddr, RangeParseError> {
    let family = Family::of(&addr);
    let mask = get_cidr_mask(len, family)?;
    Ok(addr_from_bits(addr_bits(addr) & mask, family))
}

/// Calculate the last (broadcast) address for a given IP and prefix length.
pub fn broadcast_addr(addr: IpAddr, len: u8) -> Result<IpAddr, RangeParseError> {
    let family = Family::of(&addr);
    let mask = get_cidr_mask(len, family)?;
    let host_bits = !mask & get_cidr_mask(family.max_length(), family)?;
    Ok(addr_from_bits((addr_bits(addr) & mask) | host_bits, family))
}

/// A CIDR block such as `198.51.100.0/24` or `2001:db8::/32`.
///
/// `addr` is always the network address: host bits given in the source
/// text are cleared by [`AddressRange::new`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct AddressRange {
    /// The network address.
    pub addr: IpAddr,
    /// The prefix length (0-32 for IPv4, 0-128 for IPv6).
    pub mask: u8,
}

impl AddressRange {
    /// Parse a range from CIDR text. A bare address is a single-address block.
    pub fn new(cidr: &str) -> Result<AddressRange, RangeParseError> {
        let cidr = cidr.trim();
        let (addr_part, mask_part) = match cidr.split_once('/') {
            Some((addr, mask)) => (addr.trim(), Some(mask.trim())),
            None => (cidr, None),
        };
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| RangeParseError::InvalidAddress(addr_part.to_string()))?;
        let family = Family::of(&addr);
        let mask = match mask_part {
            Some(mask) => mask
                .parse::<u8>()
                .map_err(|_| RangeParseError::InvalidPrefix(mask.to_string()))?,
            None => family.max_length(),
        };
        let network = cut_addr(addr, mask)?;
        Ok(AddressRange {
            addr: network,
            mask,
        })
    }

    pub fn family(&self) -> Family {
        Family::of(&self.addr)
    }

    /// Get the lowest (network) address in the range.
    pub fn network(&self) -> IpAddr {
        self.addr
    }

    /// Get the highest address in the range.
    pub fn last(&self) -> IpAddr {
        // mask was validated when the range was built
        broadcast_addr(self.addr, self.mask).unwrap_or(self.addr)
    }

    /// True for a /32 (IPv4) or /128 (IPv6) block.
    pub fn is_single_address(&self) -> bool {
        self.mask == self.family().max_length()
    }

    /// The address `offset` places above the network address, if it is
    /// still inside the range.
    pub fn nth(&self, offset: u128) -> Option<IpAddr> {
        let start = addr_bits(self.addr);
        let end = addr_bits(self.last());
        let bits = start.checked_add(offset)?;
        (bits <= end).then(|| addr_from_bits(bits, self.family()))
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        if Family::of(addr) != self.family() {
            return false;
        }
        let bits = addr_bits(*addr);
        addr_bits(self.addr) <= bits && bits <= addr_bits(self.last())
    }
}

impl FromStr for AddressRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressRange::new(s)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl Serialize for AddressRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AddressRange {
    fn deserialize<D>(deserializer: D) -> Result<AddressRange, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AddressRange::new(&s).map_err(de::Error::custom)
    }
}

/// One representative address chosen for a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Candidate {
    /// The address that gets probed.
    pub addr: IpAddr,
    /// The range it stands in for.
    pub range: AddressRange,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}
