use crate::libs::error::GraphError;
use crate::libs::linkage::{LinkageEntry, LinkageMap};
use crate::libs::source::RefSet;
use fxhash::FxHashMap;
use itertools::Itertools;

/// Which pairs of entries within one read pair count as linkage evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairPolicy {
    /// Every pair, including two hits on the same contig
    #[default]
    All,
    /// Only pairs from opposite ends of the fragment landing on different contigs
    Distinct,
}

impl PairPolicy {
    pub fn counts(&self, a: &LinkageEntry, b: &LinkageEntry) -> bool {
        match self {
            PairPolicy::All => true,
            PairPolicy::Distinct => a.orientation != b.orientation && a.contig != b.contig,
        }
    }
}

impl std::str::FromStr for PairPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PairPolicy::All),
            "distinct" => Ok(PairPolicy::Distinct),
            _ => Err(anyhow::anyhow!("Unknown pair policy: {}", s)),
        }
    }
}

/// Orders the endpoints of an undirected edge.
///
/// ```
/// use hicgraph::libs::edge::canonical;
/// assert_eq!(canonical("ctgB", "ctgA"), ("ctgA", "ctgB"));
/// assert_eq!(canonical("ctgA", "ctgB"), ("ctgA", "ctgB"));
/// ```
pub fn canonical<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Raw weight scaled by the geometric mean of the contig lengths
pub fn norm_weight(raw_weight: u64, len_a: u64, len_b: u64) -> f64 {
    raw_weight as f64 / ((len_a as f64) * (len_b as f64)).sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub raw_weight: u64,
    pub norm_weight: f64,
}

/// Counts read pairs supporting each contig pair.
#[derive(Debug, Clone, Default)]
pub struct EdgeAggregator {
    policy: PairPolicy,
    weights: FxHashMap<(String, String), u64>,
}

impl EdgeAggregator {
    pub fn new(policy: PairPolicy) -> Self {
        Self {
            policy,
            weights: FxHashMap::default(),
        }
    }

    /// Counts every admissible pair of positions in one read pair's linkage list.
    pub fn add_linkage(&mut self, entries: &[LinkageEntry]) {
        for (a, b) in entries.iter().tuple_combinations() {
            if self.policy.counts(a, b) {
                self.increment(&a.contig, &b.contig);
            }
        }
    }

    pub fn fold(&mut self, map: &LinkageMap) {
        for (_, entries) in map.iter() {
            self.add_linkage(entries);
        }
    }

    fn increment(&mut self, a: &str, b: &str) {
        let (s, t) = canonical(a, b);
        *self
            .weights
            .entry((s.to_string(), t.to_string()))
            .or_insert(0) += 1;
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<u64> {
        let (s, t) = canonical(a, b);
        self.weights.get(&(s.to_string(), t.to_string())).copied()
    }

    /// Gives each node without one a self-loop of weight 1.
    ///
    /// Must run after all read pairs are folded. Returns the number of loops added.
    pub fn add_self_loops<'a, I>(&mut self, nodes: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for node in nodes {
            let key = (node.to_string(), node.to_string());
            if !self.weights.contains_key(&key) {
                self.weights.insert(key, 1);
                added += 1;
            }
        }
        added
    }

    /// Number of distinct edges
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Computes normalized weights and returns the edges sorted by endpoints.
    ///
    /// Every endpoint needs a known, non-zero length.
    pub fn finish(self, refs: &RefSet) -> Result<Vec<Edge>, GraphError> {
        let length_of = |name: &str| -> Result<u64, GraphError> {
            match refs.get(name).copied() {
                Some(0) => Err(GraphError::Degenerate(format!(
                    "contig {} has zero length",
                    name
                ))),
                Some(len) => Ok(len),
                None => Err(GraphError::Degenerate(format!(
                    "contig {} is not declared by any input",
                    name
                ))),
            }
        };

        let mut edges = self
            .weights
            .into_iter()
            .map(|((source, target), raw_weight)| -> Result<Edge, GraphError> {
                let norm = norm_weight(raw_weight, length_of(&source)?, length_of(&target)?);
                Ok(Edge {
                    source,
                    target,
                    raw_weight,
                    norm_weight: norm,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        Ok(edges)
    }
}
