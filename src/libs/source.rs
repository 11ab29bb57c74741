//! Alignment inputs: BAM files and PSL tables, read into one record shape.

use crate::libs::error::GraphError;
use crate::libs::psl::Psl;
use anyhow::Context;
use indexmap::IndexMap;
use noodles::bam;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use std::io::{BufRead, Read};

/// Contig names and lengths, in the order they were declared
pub type RefSet = IndexMap<String, u64>;

/// One alignment of one read, as far as graph building cares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentRecord {
    pub query_name: String,
    /// `None` for unmapped reads
    pub reference_name: Option<String>,
    pub reference_length: u64,
    pub alignment_length: Option<u64>,
    pub query_length: Option<u64>,
    pub percent_identity: Option<f64>,
    /// Contigs of alternate hits, in tag order
    pub alternate_hits: Vec<String>,
}

impl AlignmentRecord {
    /// Contigs this record places the read on, primary first, each once.
    pub fn contigs(&self) -> Vec<&str> {
        let mut contigs: Vec<&str> = vec![];
        for name in self.reference_name.iter().chain(self.alternate_hits.iter()) {
            if !contigs.contains(&name.as_str()) {
                contigs.push(name.as_str());
            }
        }
        contigs
    }

    /// Fraction of the query covered by the alignment, if known
    pub fn coverage(&self) -> Option<f64> {
        match (self.alignment_length, self.query_length) {
            (Some(_), Some(0)) => Some(0.0),
            (Some(alen), Some(qlen)) => Some(alen as f64 / qlen as f64),
            _ => None,
        }
    }
}

impl From<&Psl> for AlignmentRecord {
    fn from(psl: &Psl) -> Self {
        Self {
            query_name: psl.q_name.clone(),
            reference_name: Some(psl.t_name.clone()),
            reference_length: psl.t_size as u64,
            alignment_length: Some(psl.align_len().max(0) as u64),
            query_length: Some(psl.q_size as u64),
            percent_identity: Some(psl.percent_identity()),
            alternate_hits: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignFormat {
    Bam,
    Psl,
}

impl std::str::FromStr for AlignFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bam" => Ok(AlignFormat::Bam),
            "psl" => Ok(AlignFormat::Psl),
            _ => Err(anyhow::anyhow!("Unknown alignment format: {}", s)),
        }
    }
}

/// Quality thresholds for tabular alignments.
///
/// Records lacking a metric always pass the corresponding test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordFilter {
    /// Minimum percentage identity
    pub min_identity: f64,
    /// Minimum fraction of the query covered by the alignment
    pub min_coverage: f64,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            min_identity: 95.0,
            min_coverage: 0.5,
        }
    }
}

impl RecordFilter {
    pub fn accepts(&self, record: &AlignmentRecord) -> bool {
        if let Some(cov) = record.coverage() {
            if cov < self.min_coverage {
                return false;
            }
        }
        if let Some(ident) = record.percent_identity {
            if ident < self.min_identity {
                return false;
            }
        }
        true
    }
}

/// A stream of alignment records together with the contigs they refer to.
pub trait AlignmentSource: Iterator<Item = anyhow::Result<AlignmentRecord>> {
    /// Contigs known so far. Complete once the stream is exhausted.
    fn references(&self) -> &RefSet;

    /// Records skipped so far, either unmapped or filtered out
    fn dropped(&self) -> usize;
}

/// Opens `path` in the given format.
///
/// Alternate hits are only available from BAM files; asking for them with
/// PSL input fails before the file is touched.
pub fn open_source(
    path: &str,
    format: AlignFormat,
    recover_alts: bool,
    filter: RecordFilter,
) -> anyhow::Result<Box<dyn AlignmentSource>> {
    match format {
        AlignFormat::Bam => open_bam(path, recover_alts),
        AlignFormat::Psl => {
            if recover_alts {
                return Err(GraphError::Config(
                    "Recovering alternate alignments is only applicable to BAM file parsing"
                        .to_string(),
                )
                .into());
            }
            Ok(Box::new(PslSource::new(crate::reader(path)?, filter)))
        }
    }
}

/// Opens a BAM file, or the standard input for `stdin` and `-`.
pub fn open_bam(path: &str, recover_alts: bool) -> anyhow::Result<Box<dyn AlignmentSource>> {
    let input: Box<dyn Read> = if path == "stdin" || path == "-" {
        Box::new(std::io::stdin())
    } else {
        Box::new(std::fs::File::open(path).with_context(|| format!("could not open {}", path))?)
    };
    let source = BamSource::new(bam::io::Reader::new(input), recover_alts)
        .with_context(|| format!("could not read BAM header of {}", path))?;

    Ok(Box::new(source))
}

/// Splits an `XA:Z` value into the contig names of its hits.
///
/// Each hit is `contig,±pos,CIGAR,NM`. Hits without exactly four fields are ignored.
///
/// ```
/// use hicgraph::libs::source::parse_alt_hits;
///
/// let hits = parse_alt_hits("ctgB,+100,50M,0;ctgC,-20,50M,1;");
/// assert_eq!(hits, vec!["ctgB", "ctgC"]);
/// assert!(parse_alt_hits("ctgB,+100").is_empty());
/// ```
pub fn parse_alt_hits(field: &str) -> Vec<String> {
    field
        .split(';')
        .filter(|hit| !hit.is_empty())
        .filter_map(|hit| {
            let parts: Vec<&str> = hit.split(',').collect();
            if parts.len() != 4 {
                log::debug!("Skipping malformed alternate hit {:?}", hit);
                None
            } else {
                Some(parts[0].to_string())
            }
        })
        .collect()
}

pub struct BamSource<R> {
    reader: bam::io::Reader<R>,
    refs: RefSet,
    recover_alts: bool,
    record: bam::Record,
    dropped: usize,
}

impl<R: Read> BamSource<R> {
    /// Reads the header; the reference set is complete before the first record.
    pub fn new(mut reader: bam::io::Reader<R>, recover_alts: bool) -> anyhow::Result<Self> {
        let header = reader.read_header()?;
        let refs: RefSet = header
            .reference_sequences()
            .iter()
            .map(|(name, seq)| (name.to_string(), seq.length().get() as u64))
            .collect();

        Ok(Self {
            reader,
            refs,
            recover_alts,
            record: bam::Record::default(),
            dropped: 0,
        })
    }

    fn convert(&self) -> anyhow::Result<Option<AlignmentRecord>> {
        let id = match self.record.reference_sequence_id().transpose()? {
            Some(id) => id,
            None => return Ok(None),
        };
        let (name, length) = self
            .refs
            .get_index(id)
            .ok_or_else(|| anyhow::anyhow!("Reference id {} is not in the header", id))?;

        let query_name = self
            .record
            .name()
            .map(|n| n.to_string())
            .unwrap_or_default();

        let alternate_hits = if self.recover_alts {
            alt_hits(&self.record)?
        } else {
            vec![]
        };

        Ok(Some(AlignmentRecord {
            query_name,
            reference_name: Some(name.clone()),
            reference_length: *length,
            alternate_hits,
            ..Default::default()
        }))
    }
}

fn alt_hits(record: &bam::Record) -> anyhow::Result<Vec<String>> {
    let tag = Tag::new(b'X', b'A');
    let data = record.data();
    let hits = match data.get(&tag).transpose()? {
        Some(Value::String(s)) => parse_alt_hits(&s.to_string()),
        _ => vec![],
    };

    Ok(hits)
}

impl<R: Read> Iterator for BamSource<R> {
    type Item = anyhow::Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }

            match self.convert() {
                Ok(Some(rec)) => return Some(Ok(rec)),
                Ok(None) => self.dropped += 1,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<R: Read> AlignmentSource for BamSource<R> {
    fn references(&self) -> &RefSet {
        &self.refs
    }

    fn dropped(&self) -> usize {
        self.dropped
    }
}

pub struct PslSource {
    lines: std::io::Lines<Box<dyn BufRead>>,
    line_no: usize,
    refs: RefSet,
    filter: RecordFilter,
    dropped: usize,
}

impl PslSource {
    pub fn new(reader: Box<dyn BufRead>, filter: RecordFilter) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            refs: RefSet::new(),
            filter,
            dropped: 0,
        }
    }
}

impl Iterator for PslSource {
    type Item = anyhow::Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if !Psl::is_data_line(&line) {
                continue;
            }

            let psl = match line
                .parse::<Psl>()
                .with_context(|| format!("PSL line {}", self.line_no))
            {
                Ok(psl) => psl,
                Err(e) => return Some(Err(e)),
            };

            // contigs enter the graph even when this alignment is rejected
            self.refs
                .entry(psl.t_name.clone())
                .or_insert(psl.t_size as u64);

            let record = AlignmentRecord::from(&psl);
            if !self.filter.accepts(&record) {
                self.dropped += 1;
                continue;
            }
            return Some(Ok(record));
        }

        None
    }
}

impl AlignmentSource for PslSource {
    fn references(&self) -> &RefSet {
        &self.refs
    }

    fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Counts mapped records per contig, e.g. shotgun reads aligned to the assembly.
///
/// Returns the contigs declared by the file and the count for every one of them.
pub fn read_counts(path: &str) -> anyhow::Result<(RefSet, IndexMap<String, u64>)> {
    let mut source = open_bam(path, false)?;
    let mut counts: IndexMap<String, u64> = source
        .references()
        .keys()
        .map(|name| (name.clone(), 0))
        .collect();

    for record in source.by_ref() {
        let record = record?;
        if let Some(name) = record.reference_name {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    Ok((source.references().clone(), counts))
}
