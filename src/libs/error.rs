use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A read name does not end in a recognized orientation tag
    ReadName {
        /// The offending read name
        name: String,
        /// The trailing characters found where the tag was expected
        tag: String,
    },
    /// Options that cannot be used together
    Config(String),
    /// The graph cannot be finalized, e.g. an edge endpoint has no usable length
    Degenerate(String),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::ReadName { name, tag } => {
                write!(
                    f,
                    "Reads in alignment file do not conform to expected convention \
                     [a-zA-Z]+[0-9]+(fwd|rev): read \"{}\" ends in \"{}\"",
                    name, tag
                )
            }
            GraphError::Config(msg) => write!(f, "Invalid options: {}", msg),
            GraphError::Degenerate(msg) => write!(f, "Degenerate graph: {}", msg),
        }
    }
}

impl std::error::Error for GraphError {}
