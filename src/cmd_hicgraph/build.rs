use clap::*;
use hicgraph::libs::edge::{EdgeAggregator, PairPolicy};
use hicgraph::libs::error::GraphError;
use hicgraph::libs::graph::{collect_nodes, ContigGraph};
use hicgraph::libs::linkage::LinkageMap;
use hicgraph::libs::source::{open_source, read_counts, AlignFormat, RecordFilter, RefSet};
use hicgraph::StagedFile;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("build")
        .about("Create edge and node tables from a Hi-C alignment file")
        .after_help(
            r###"
Reads Hi-C read pairs aligned to contigs and links every two contigs hit by the
same read pair. The number of supporting read pairs is the raw weight of an edge;
the normalized weight divides it by sqrt(length_a * length_b). It is computed
on every run, so a linked contig with a zero or unknown length is an error even
without --norm or --graphml.

BAM input, including --wgs, can be read from stdin with `-`. PSL input may also
be gzipped.

Read names must end in `fwd` or `rev`, e.g. frg01fwd and frg01rev. Any other
suffix aborts the run without writing output.

Pair policies:
* all      - every two hits of a read pair count, including hits on one contig
* distinct - only hits from opposite ends landing on different contigs count

Outputs are space delimited:
* edges: SOURCE TARGET RAWWEIGHT [WEIGHT] TYPE
* nodes: ID LENGTH [READS]

Examples:
1. From a BAM file:
   hicgraph build hic2ctg.bam edges.csv nodes.csv

2. Include alternate alignments and self-loops:
   hicgraph build --recover-alts -s hic2ctg.bam edges.csv nodes.csv

3. From a PSL file, with a GraphML copy of the graph:
   hicgraph build --afmt psl --minid 98 hic2ctg.psl edges.csv nodes.csv --graphml graph.xml

"###,
        )
        .arg(
            Arg::new("hic2ctg")
                .required(true)
                .index(1)
                .help("Hi-C reads to contigs alignment file"),
        )
        .arg(
            Arg::new("edge_csv")
                .required(true)
                .index(2)
                .help("Edge table output file"),
        )
        .arg(
            Arg::new("node_csv")
                .required(true)
                .index(3)
                .help("Node table output file"),
        )
        .arg(
            Arg::new("afmt")
                .long("afmt")
                .num_args(1)
                .value_parser(["bam", "psl"])
                .default_value("bam")
                .help("Alignment file format"),
        )
        .arg(
            Arg::new("minid")
                .long("minid")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("95.0")
                .help("Minimum percentage identity for alignment (psl)"),
        )
        .arg(
            Arg::new("minlen")
                .long("minlen")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .default_value("1000")
                .help("Minimum length in bp. Accepted for compatibility, not applied"),
        )
        .arg(
            Arg::new("mincov")
                .long("mincov")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .default_value("0.5")
                .help("Minimum coverage of query by alignment (psl)"),
        )
        .arg(
            Arg::new("recover_alts")
                .long("recover-alts")
                .action(ArgAction::SetTrue)
                .help("Recover the alternate alignments (XA tag) from BAM"),
        )
        .arg(
            Arg::new("add_selfloops")
                .long("add-selfloops")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("Add self-loops to nodes"),
        )
        .arg(
            Arg::new("graphml")
                .long("graphml")
                .num_args(1)
                .help("Also write the graph in GraphML"),
        )
        .arg(
            Arg::new("wgs")
                .long("wgs")
                .num_args(1)
                .value_name("WGS_BAM")
                .help("WGS reads to contigs BAM file, adds read counts to nodes"),
        )
        .arg(
            Arg::new("policy")
                .long("policy")
                .num_args(1)
                .value_parser(["all", "distinct"])
                .default_value("all")
                .help("Which hit pairs of a read pair count as a link"),
        )
        .arg(
            Arg::new("norm")
                .long("norm")
                .action(ArgAction::SetTrue)
                .help("Add the normalized WEIGHT column to the edge table"),
        )
}

#[derive(Debug, Clone)]
pub struct BuildOpt {
    pub hic2ctg: String,
    pub edge_csv: String,
    pub node_csv: String,
    pub format: AlignFormat,
    pub filter: RecordFilter,
    pub recover_alts: bool,
    pub self_loops: bool,
    pub graphml: Option<String>,
    pub wgs: Option<String>,
    pub policy: PairPolicy,
    pub norm: bool,
}

impl BuildOpt {
    fn from_matches(args: &ArgMatches) -> anyhow::Result<Self> {
        Ok(Self {
            hic2ctg: args.get_one::<String>("hic2ctg").unwrap().to_string(),
            edge_csv: args.get_one::<String>("edge_csv").unwrap().to_string(),
            node_csv: args.get_one::<String>("node_csv").unwrap().to_string(),
            format: args.get_one::<String>("afmt").unwrap().parse()?,
            filter: RecordFilter {
                min_identity: *args.get_one::<f64>("minid").unwrap(),
                min_coverage: *args.get_one::<f64>("mincov").unwrap(),
            },
            recover_alts: args.get_flag("recover_alts"),
            self_loops: args.get_flag("add_selfloops"),
            graphml: args.get_one::<String>("graphml").cloned(),
            wgs: args.get_one::<String>("wgs").cloned(),
            policy: args.get_one::<String>("policy").unwrap().parse()?,
            norm: args.get_flag("norm"),
        })
    }

    /// Rejects option combinations that cannot work, before any file is opened.
    fn validate(&self) -> Result<(), GraphError> {
        if self.recover_alts && self.format != AlignFormat::Bam {
            return Err(GraphError::Config(
                "Recovering alternate alignments is only applicable to BAM file parsing"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let opt = BuildOpt::from_matches(args)?;
    opt.validate()?;

    //----------------------------
    // Linkage map
    //----------------------------
    log::info!("==> Reading {} as {:?}", opt.hic2ctg, opt.format);
    let mut source = open_source(&opt.hic2ctg, opt.format, opt.recover_alts, opt.filter)?;

    let mut linkage = LinkageMap::new();
    let mut n_records = 0usize;
    for record in source.by_ref() {
        let record = record?;
        n_records += 1;
        linkage.add_record(&record)?;
    }
    let mut refs = source.references().clone();
    log::info!(
        "    {} records used, {} dropped; {} read pairs over {} contigs",
        n_records,
        source.dropped(),
        linkage.len(),
        refs.len()
    );

    let counts = match &opt.wgs {
        Some(wgs) => {
            log::info!("==> Counting reads in {}", wgs);
            let (wgs_refs, counts) = read_counts(wgs)?;
            let filled = fill_lengths(&mut refs, &wgs_refs, &linkage);
            if filled > 0 {
                log::info!("    {} contig lengths taken from {}", filled, wgs);
            }
            Some(counts)
        }
        None => None,
    };

    //----------------------------
    // Edges
    //----------------------------
    let mut aggregator = EdgeAggregator::new(opt.policy);
    aggregator.fold(&linkage);
    log::info!(
        "==> {} edges under the {:?} policy",
        aggregator.len(),
        opt.policy
    );

    if opt.self_loops {
        let added = aggregator.add_self_loops(refs.keys().map(|k| k.as_str()));
        log::info!("    {} self-loops added", added);
    }

    let edges = aggregator.finish(&refs)?;
    let graph = ContigGraph::new(collect_nodes(&refs, counts.as_ref()), edges)?;

    //----------------------------
    // Outputs
    //----------------------------
    let mut edge_out = StagedFile::create(&opt.edge_csv)?;
    graph.write_edges(&mut edge_out, opt.norm)?;
    let mut node_out = StagedFile::create(&opt.node_csv)?;
    graph.write_nodes(&mut node_out)?;
    let graphml_out = match &opt.graphml {
        Some(path) => {
            let mut out = StagedFile::create(path)?;
            graph.write_graphml(&mut out)?;
            Some(out)
        }
        None => None,
    };

    let outputs = [Some(edge_out), Some(node_out), graphml_out]
        .into_iter()
        .flatten()
        .collect();
    StagedFile::commit_all(outputs)?;

    Ok(())
}

/// Takes lengths the alignment file could not provide from another reference set.
///
/// Only contigs hit by some read pair are considered. Returns the number of contigs updated.
fn fill_lengths(refs: &mut RefSet, other: &RefSet, linkage: &LinkageMap) -> usize {
    let mut filled = 0;
    for (_, entries) in linkage.iter() {
        for entry in entries {
            if refs.get(&entry.contig).is_some_and(|&len| len > 0) {
                continue;
            }
            if let Some(&len) = other.get(&entry.contig) {
                refs.insert(entry.contig.clone(), len);
                filled += 1;
            }
        }
    }
    filled
}
