use assert_cmd::Command;
use noodles::sam::alignment::io::Write as _;
use noodles::{bam, sam};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SAM_HEADER: &str = "\
@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:ctgA\tLN:1000
@SQ\tSN:ctgB\tLN:4000
@SQ\tSN:ctgC\tLN:250
";

fn get_input_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/build");
    path.push(filename);
    path
}

fn sam_line(name: &str, flag: u16, contig: &str, tags: &str) -> String {
    let pos = if contig == "*" { 0 } else { 1 };
    let cigar = if contig == "*" { "*" } else { "4M" };
    let mut line = format!(
        "{}\t{}\t{}\t{}\t60\t{}\t*\t0\t0\tACGT\t*",
        name, flag, contig, pos, cigar
    );
    if !tags.is_empty() {
        line.push('\t');
        line.push_str(tags);
    }
    line.push('\n');
    line
}

fn write_bam(path: &Path, body: &str) -> anyhow::Result<()> {
    let sam_text = format!("{}{}", SAM_HEADER, body);
    let mut reader = sam::io::Reader::new(sam_text.as_bytes());
    let header = reader.read_header()?;

    let mut writer = bam::io::Writer::new(fs::File::create(path)?);
    writer.write_alignment_header(&header)?;
    for result in reader.record_bufs(&header) {
        let record = result?;
        writer.write_alignment_record(&header, &record)?;
    }
    writer.finish(&header)?;

    Ok(())
}

fn hic_body() -> String {
    [
        sam_line("frg01fwd", 0, "ctgA", ""),
        sam_line("frg01rev", 16, "ctgB", ""),
        sam_line("frg02fwd", 0, "ctgA", "XA:Z:ctgC,+100,4M,0;"),
        sam_line("frg02rev", 16, "ctgB", ""),
        sam_line("frg03fwd", 0, "ctgA", ""),
        sam_line("frg03rev", 16, "ctgA", ""),
        sam_line("frg06fwd", 4, "*", ""),
        sam_line("frg06rev", 16, "ctgC", ""),
    ]
    .concat()
}

#[test]
fn command_build_help() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build").arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Create edge and node tables"))
        .stdout(predicate::str::contains("zero or unknown length is an error"))
        .stdout(predicate::str::contains("read from stdin with `-`"));
    Ok(())
}

#[test]
fn command_build_bam() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    write_bam(&bam_path, &hic_body())?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg(&bam_path)
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    // frg06 has one unmapped end and links nothing
    assert_eq!(
        fs::read_to_string(&edges)?,
        "SOURCE TARGET RAWWEIGHT TYPE\nctgA ctgA 1 UNDIRECTED\nctgA ctgB 2 UNDIRECTED\n"
    );
    assert_eq!(
        fs::read_to_string(&nodes)?,
        "ID LENGTH\nctgA 1000\nctgB 4000\nctgC 250\n"
    );

    Ok(())
}

#[test]
fn command_build_bam_distinct() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    write_bam(&bam_path, &hic_body())?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--policy")
        .arg("distinct")
        .arg("--norm")
        .arg(&bam_path)
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&edges)?,
        "SOURCE TARGET RAWWEIGHT WEIGHT TYPE\nctgA ctgB 2 0.001 UNDIRECTED\n"
    );

    Ok(())
}

#[test]
fn command_build_recover_alts() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    write_bam(&bam_path, &hic_body())?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--recover-alts")
        .arg(&bam_path)
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    // frg02: ctgA and its alternate ctgC, then ctgB
    let text = fs::read_to_string(&edges)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "SOURCE TARGET RAWWEIGHT TYPE",
            "ctgA ctgA 1 UNDIRECTED",
            "ctgA ctgB 2 UNDIRECTED",
            "ctgA ctgC 1 UNDIRECTED",
            "ctgB ctgC 1 UNDIRECTED",
        ]
    );

    Ok(())
}

#[test]
fn command_build_selfloops_graphml() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    write_bam(&bam_path, &hic_body())?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");
    let graphml = dir.path().join("graph.xml");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("-s")
        .arg("--graphml")
        .arg(&graphml)
        .arg(&bam_path)
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    let text = fs::read_to_string(&edges)?;
    assert_eq!(text.lines().count(), 5);
    // the aggregated self-loop keeps its weight
    assert!(text.contains("ctgA ctgA 1 UNDIRECTED\n"));
    assert!(text.contains("ctgB ctgB 1 UNDIRECTED\n"));
    assert!(text.contains("ctgC ctgC 1 UNDIRECTED\n"));

    let xml = fs::read_to_string(&graphml)?;
    assert_eq!(xml.matches("<node ").count(), 3);
    assert_eq!(xml.matches("<edge ").count(), 4);
    assert!(xml.contains("<edge source=\"ctgA\" target=\"ctgB\">"));

    Ok(())
}

#[test]
fn command_build_wgs() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    write_bam(&bam_path, &hic_body())?;
    let wgs_path = dir.path().join("wgs2ctg.bam");
    let wgs_body = [
        sam_line("SRR01.1", 0, "ctgA", ""),
        sam_line("SRR01.2", 0, "ctgA", ""),
        sam_line("SRR01.3", 16, "ctgC", ""),
        sam_line("SRR01.4", 4, "*", ""),
    ]
    .concat();
    write_bam(&wgs_path, &wgs_body)?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--wgs")
        .arg(&wgs_path)
        .arg(&bam_path)
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&nodes)?,
        "ID LENGTH READS\nctgA 1000 2\nctgB 4000 0\nctgC 250 1\n"
    );

    Ok(())
}

#[test]
fn command_build_psl() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--afmt")
        .arg("psl")
        .arg(get_input_path("pairs.psl"))
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    // frg04fwd covers 40% of the query, frg05fwd is 90% identical
    assert_eq!(
        fs::read_to_string(&edges)?,
        "SOURCE TARGET RAWWEIGHT TYPE\nctgA ctgA 1 UNDIRECTED\nctgA ctgB 2 UNDIRECTED\n"
    );
    // contigs of rejected alignments are still nodes
    assert_eq!(
        fs::read_to_string(&nodes)?,
        "ID LENGTH\nctgA 1000\nctgB 4000\nctgC 250\n"
    );

    Ok(())
}

#[test]
fn command_build_psl_thresholds() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--afmt")
        .arg("psl")
        .arg("--mincov")
        .arg("0.3")
        .arg("--minid")
        .arg("90")
        .arg(get_input_path("pairs.psl"))
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&edges)?,
        "SOURCE TARGET RAWWEIGHT TYPE\n\
         ctgA ctgA 1 UNDIRECTED\n\
         ctgA ctgB 2 UNDIRECTED\n\
         ctgB ctgC 2 UNDIRECTED\n"
    );

    Ok(())
}

#[test]
fn command_build_bad_name() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--afmt")
        .arg("psl")
        .arg(get_input_path("bad_name.psl"))
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("frgXYZqrs"));

    assert!(!edges.exists());
    assert!(!nodes.exists());
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);

    Ok(())
}

#[test]
fn command_build_bad_name_bam() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    let body = [
        sam_line("frg01fwd", 0, "ctgA", ""),
        sam_line("frgXYZqrs", 0, "ctgB", ""),
    ]
    .concat();
    write_bam(&bam_path, &body)?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg(&bam_path)
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("do not conform"));

    assert!(!edges.exists());
    assert!(!nodes.exists());

    Ok(())
}

#[test]
fn command_build_psl_recover_alts() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--afmt")
        .arg("psl")
        .arg("--recover-alts")
        .arg("no/such/input.psl")
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("only applicable to BAM"));

    assert!(!edges.exists());

    Ok(())
}

#[test]
fn command_build_missing_input() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("no/such/hic2ctg.bam")
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no/such/hic2ctg.bam"));

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--afmt")
        .arg("psl")
        .arg("--wgs")
        .arg("no/such/wgs2ctg.bam")
        .arg(get_input_path("pairs.psl"))
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no/such/wgs2ctg.bam"));

    assert!(!edges.exists());
    assert!(!nodes.exists());

    Ok(())
}

#[test]
fn command_build_bam_stdin() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let bam_path = dir.path().join("hic2ctg.bam");
    write_bam(&bam_path, &hic_body())?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes.csv");

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("-")
        .arg(&edges)
        .arg(&nodes)
        .write_stdin(fs::read(&bam_path)?)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&edges)?,
        "SOURCE TARGET RAWWEIGHT TYPE\nctgA ctgA 1 UNDIRECTED\nctgA ctgB 2 UNDIRECTED\n"
    );

    Ok(())
}

#[test]
fn command_build_output_is_dir() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let edges = dir.path().join("edges.csv");
    let nodes = dir.path().join("nodes_dir");
    fs::create_dir(&nodes)?;

    let mut cmd = Command::cargo_bin("hicgraph")?;
    cmd.arg("build")
        .arg("--afmt")
        .arg("psl")
        .arg(get_input_path("pairs.psl"))
        .arg(&edges)
        .arg(&nodes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is a directory"));

    // neither the edge table nor a leftover temporary file
    assert!(!edges.exists());
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);

    Ok(())
}
