//! Value types shared by the encoder and the learning agent.

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// Largest number of components an observation can carry.
pub const MAX_ARITY: usize = 8;

/// A discretized battle situation used as a Q-table key.
///
/// Observations are small fixed-shape tuples of bucket indices. They are
/// `Copy`, hash structurally, and never change once built. Slots past the
/// arity are always zero so derived equality only sees the live buckets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Observation {
    len: u8,
    buckets: [u8; MAX_ARITY],
}

impl Observation {
    /// Build an observation from a slice of bucket indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArity`] when the slice is empty or longer than
    /// [`MAX_ARITY`].
    pub fn new(buckets: &[u8]) -> Result<Self> {
        if buckets.is_empty() || buckets.len() > MAX_ARITY {
            return Err(Error::InvalidArity {
                got: buckets.len(),
                max: MAX_ARITY,
            });
        }
        let mut slots = [0u8; MAX_ARITY];
        slots[..buckets.len()].copy_from_slice(buckets);
        Ok(Self {
            len: buckets.len() as u8,
            buckets: slots,
        })
    }

    /// Build an observation from a fixed-size array; the arity is checked at
    /// compile time.
    pub const fn from_array<const N: usize>(buckets: [u8; N]) -> Self {
        const { assert!(N > 0 && N <= MAX_ARITY, "observation arity out of range") };
        let mut slots = [0u8; MAX_ARITY];
        let mut i = 0;
        while i < N {
            slots[i] = buckets[i];
            i += 1;
        }
        Self {
            len: N as u8,
            buckets: slots,
        }
    }

    /// Number of components.
    pub fn arity(&self) -> usize {
        self.len as usize
    }

    /// The live bucket indices.
    pub fn buckets(&self) -> &[u8] {
        &self.buckets[..self.arity()]
    }

    /// Component at `index`, if present.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.buckets().get(index).copied()
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observation{self}")
    }
}

/// Canonical tuple text: `(b0, b1, ..., bn)`; a single component renders as
/// `(b0,)`.
impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, bucket) in self.buckets().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{bucket}")?;
        }
        if self.arity() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

impl FromStr for Observation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::MalformedKey {
            key: s.to_string(),
            reason: reason.to_string(),
        };

        let body = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| malformed("state must be enclosed in parentheses"))?;

        let mut parts: Vec<&str> = body.split(',').map(str::trim).collect();
        // Single-component tuples carry a trailing comma.
        if parts.len() == 2 && parts[1].is_empty() {
            parts.pop();
        }

        let mut buckets = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() {
                return Err(malformed("empty state component"));
            }
            let bucket = part
                .parse::<u8>()
                .map_err(|_| malformed(&format!("component '{part}' is not a bucket index")))?;
            buckets.push(bucket);
        }

        Observation::new(&buckets).map_err(|_| {
            malformed(&format!(
                "state has {} components, expected 1 to {MAX_ARITY}",
                buckets.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_tuple_text() {
        let obs = Observation::from_array([0, 2, 1, 1]);
        assert_eq!(obs.to_string(), "(0, 2, 1, 1)");
        assert_eq!(Observation::from_array([5]).to_string(), "(5,)");
    }

    #[test]
    fn test_parse_accepts_loose_whitespace() {
        let obs: Observation = "( 3,1 , 0 )".parse().unwrap();
        assert_eq!(obs.buckets(), &[3, 1, 0]);
        let single: Observation = "(5,)".parse().unwrap();
        assert_eq!(single.buckets(), &[5]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("1, 2".parse::<Observation>().is_err());
        assert!("(1, x)".parse::<Observation>().is_err());
        assert!("(1, , 2)".parse::<Observation>().is_err());
        assert!("()".parse::<Observation>().is_err());
        assert!("(-1, 2)".parse::<Observation>().is_err());
        assert!("(1, 2, 3, 4, 5, 6, 7, 8, 9)".parse::<Observation>().is_err());
    }

    #[test]
    fn test_equality_is_structural() {
        let a = Observation::new(&[1, 2]).unwrap();
        let b = Observation::from_array([1, 2]);
        let c = Observation::from_array([1, 2, 0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_new_rejects_bad_arity() {
        assert!(Observation::new(&[]).is_err());
        assert!(Observation::new(&[0; MAX_ARITY + 1]).is_err());
    }
}
