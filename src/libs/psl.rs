//! The subset of a PSL row needed to place a read on a contig.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // psLayout headers and separators never start with a number followed by a tab
    static ref RE_DATA_LINE: Regex = Regex::new(r"^[0-9]+\t").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Psl {
    pub match_count: u32,
    pub mismatch_count: u32,
    pub rep_match: u32,
    pub q_num_insert: u32,
    pub q_name: String,
    pub q_size: u32,
    pub q_start: i32,
    pub q_end: i32,
    pub t_name: String,
    pub t_size: u32,
}

impl Psl {
    /// Is this line an alignment row rather than a header?
    pub fn is_data_line(line: &str) -> bool {
        RE_DATA_LINE.is_match(line)
    }

    /// Length of the aligned span on the query, both ends inclusive
    pub fn align_len(&self) -> i64 {
        self.q_end as i64 - self.q_start as i64 + 1
    }

    /// Percentage identity as computed by BLAT's `pslScore`-style scripts.
    ///
    /// An alignment without any aligned bases has an identity of 0.
    pub fn percent_identity(&self) -> f64 {
        let aligned = self.match_count as u64 + self.mismatch_count as u64 + self.rep_match as u64;
        if aligned == 0 {
            return 0.0;
        }
        let penalty = self.mismatch_count as u64 + self.q_num_insert as u64;
        (1.0 - penalty as f64 / aligned as f64) * 100.0
    }
}

impl std::str::FromStr for Psl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() < 21 {
            return Err(anyhow::anyhow!(
                "Invalid PSL line: {} columns, expected 21",
                fields.len()
            ));
        }

        let parse_u32 = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| anyhow::anyhow!("Invalid u32: {}", s))
        };
        let parse_i32 = |s: &str| {
            s.parse::<i32>()
                .map_err(|_| anyhow::anyhow!("Invalid i32: {}", s))
        };

        Ok(Psl {
            match_count: parse_u32(fields[0])?,
            mismatch_count: parse_u32(fields[1])?,
            rep_match: parse_u32(fields[2])?,
            q_num_insert: parse_u32(fields[4])?,
            q_name: fields[9].to_string(),
            q_size: parse_u32(fields[10])?,
            q_start: parse_i32(fields[11])?,
            q_end: parse_i32(fields[12])?,
            t_name: fields[13].to_string(),
            t_size: parse_u32(fields[14])?,
        })
    }
}
