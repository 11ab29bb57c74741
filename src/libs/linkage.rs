use crate::libs::read_name::{split_name, Orientation};
use crate::libs::source::AlignmentRecord;
use fxhash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkageEntry {
    pub contig: String,
    pub orientation: Orientation,
}

/// Contigs touched by each read pair, keyed by the read name without its orientation tag.
#[derive(Debug, Clone, Default)]
pub struct LinkageMap {
    map: FxHashMap<String, Vec<LinkageEntry>>,
}

impl LinkageMap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add(&mut self, key: &str, contig: &str, orientation: Orientation) {
        let entry = LinkageEntry {
            contig: contig.to_string(),
            orientation,
        };
        match self.map.get_mut(key) {
            Some(entries) => entries.push(entry),
            None => {
                self.map.insert(key.to_string(), vec![entry]);
            }
        }
    }

    /// Adds every contig of a mapped record under its read pair.
    ///
    /// Fails when the read name does not carry an orientation tag.
    pub fn add_record(&mut self, record: &AlignmentRecord) -> anyhow::Result<()> {
        let contigs = record.contigs();
        if contigs.is_empty() {
            return Ok(());
        }

        let (key, orientation) = split_name(&record.query_name)?;
        for contig in contigs {
            self.add(key, contig, orientation);
        }

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&[LinkageEntry]> {
        self.map.get(key).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LinkageEntry])> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of read pairs
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total number of entries over all read pairs
    pub fn entry_count(&self) -> usize {
        self.map.values().map(|v| v.len()).sum()
    }
}
