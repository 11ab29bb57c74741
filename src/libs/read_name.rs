//! Hi-C read naming convention.
//!
//! Simulated Hi-C reads are named `<fragment><tag>`, where the tag is `fwd` or
//! `rev` for the two ends of one ligation product, e.g. `frg01fwd` and `frg01rev`.

use crate::libs::error::GraphError;
use std::fmt;

/// Length of the orientation suffix
pub const TAG_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Forward => "fwd",
            Orientation::Reverse => "rev",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Orientation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fwd" => Ok(Orientation::Forward),
            "rev" => Ok(Orientation::Reverse),
            _ => Err(()),
        }
    }
}

/// Splits a read name into its pair key and orientation.
///
/// ```
/// use hicgraph::libs::read_name::{split_name, Orientation};
///
/// let (key, dir) = split_name("frg01fwd").unwrap();
/// assert_eq!(key, "frg01");
/// assert_eq!(dir, Orientation::Forward);
///
/// assert!(split_name("frgXYZqrs").is_err());
/// ```
pub fn split_name(name: &str) -> Result<(&str, Orientation), GraphError> {
    let split_at = name.len().checked_sub(TAG_LEN);
    let parts = split_at
        .filter(|&i| name.is_char_boundary(i))
        .map(|i| name.split_at(i));

    match parts {
        Some((key, tag)) => match tag.parse::<Orientation>() {
            Ok(dir) => Ok((key, dir)),
            Err(_) => Err(GraphError::ReadName {
                name: name.to_string(),
                tag: tag.to_string(),
            }),
        },
        None => Err(GraphError::ReadName {
            name: name.to_string(),
            tag: name.to_string(),
        }),
    }
}
