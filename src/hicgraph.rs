extern crate clap;
use clap::*;

mod cmd_hicgraph;

fn main() -> anyhow::Result<()> {
    let app = Command::new("hicgraph")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`hicgraph` - Contig linkage graphs from Hi-C alignments")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Report progress on stderr"),
        )
        .subcommand(cmd_hicgraph::build::make_subcommand())
        .after_help(
            r###"Subcommands:

* build - Edge and node tables from a Hi-C to contig alignment

The graph is the input of clustering tools such as MCL, which group contigs
belonging to the same genome.

"###,
        );

    let matches = app.get_matches();

    let level = if matches.get_flag("verbose") {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    match matches.subcommand() {
        Some(("build", sub_matches)) => cmd_hicgraph::build::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
