//! Contig graph and its serializations.
//!
//! Node and edge tables are space delimited with a header line:
//!
//! ```text
//! ID LENGTH [READS]
//! ctgA 1000
//!
//! SOURCE TARGET RAWWEIGHT [WEIGHT] TYPE
//! ctgA ctgB 2 UNDIRECTED
//! ```

use crate::libs::edge::Edge;
use crate::libs::error::GraphError;
use crate::libs::source::RefSet;
use indexmap::IndexMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub length: u64,
    /// Reads aligned to this contig, when a read-to-contig alignment was supplied
    pub reads: Option<u64>,
}

/// Turns the reference set into nodes, attaching read counts if available.
pub fn collect_nodes(refs: &RefSet, reads: Option<&IndexMap<String, u64>>) -> Vec<Node> {
    refs.iter()
        .map(|(id, &length)| Node {
            id: id.clone(),
            length,
            reads: reads.map(|counts| counts.get(id).copied().unwrap_or(0)),
        })
        .collect()
}

pub struct ContigGraph {
    graph: UnGraph<Node, Edge>,
    with_reads: bool,
}

impl ContigGraph {
    /// Every edge endpoint must be one of `nodes`.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let with_reads = !nodes.is_empty() && nodes.iter().all(|n| n.reads.is_some());

        let mut graph: UnGraph<Node, Edge> =
            UnGraph::with_capacity(nodes.len(), edges.len());
        let mut index_of: HashMap<String, NodeIndex> = HashMap::new();
        for node in nodes {
            let id = node.id.clone();
            let idx = graph.add_node(node);
            index_of.insert(id, idx);
        }

        for edge in edges {
            let lookup = |id: &str| {
                index_of.get(id).copied().ok_or_else(|| {
                    GraphError::Degenerate(format!("edge endpoint {} is not a node", id))
                })
            };
            let a = lookup(&edge.source)?;
            let b = lookup(&edge.target)?;
            graph.add_edge(a, b, edge);
        }

        Ok(Self { graph, with_reads })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    pub fn write_nodes<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if self.with_reads {
            writeln!(w, "ID LENGTH READS")?;
        } else {
            writeln!(w, "ID LENGTH")?;
        }

        for node in self.nodes() {
            match node.reads {
                Some(reads) if self.with_reads => {
                    writeln!(w, "{} {} {}", node.id, node.length, reads)?
                }
                _ => writeln!(w, "{} {}", node.id, node.length)?,
            }
        }

        Ok(())
    }

    /// `with_norm` adds the normalized `WEIGHT` column
    pub fn write_edges<W: Write>(&self, w: &mut W, with_norm: bool) -> io::Result<()> {
        if with_norm {
            writeln!(w, "SOURCE TARGET RAWWEIGHT WEIGHT TYPE")?;
        } else {
            writeln!(w, "SOURCE TARGET RAWWEIGHT TYPE")?;
        }

        for edge in self.edges() {
            if with_norm {
                writeln!(
                    w,
                    "{} {} {} {} UNDIRECTED",
                    edge.source, edge.target, edge.raw_weight, edge.norm_weight
                )?;
            } else {
                writeln!(
                    w,
                    "{} {} {} UNDIRECTED",
                    edge.source, edge.target, edge.raw_weight
                )?;
            }
        }

        Ok(())
    }

    pub fn write_graphml<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "<?xml version='1.0' encoding='utf-8'?>")?;
        writeln!(
            w,
            "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             xsi:schemaLocation=\"http://graphml.graphdrawing.org/xmlns \
             http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd\">"
        )?;
        writeln!(
            w,
            "  <key id=\"d0\" for=\"node\" attr.name=\"length\" attr.type=\"long\" />"
        )?;
        if self.with_reads {
            writeln!(
                w,
                "  <key id=\"d1\" for=\"node\" attr.name=\"reads\" attr.type=\"long\" />"
            )?;
        }
        writeln!(
            w,
            "  <key id=\"d2\" for=\"edge\" attr.name=\"weight\" attr.type=\"long\" />"
        )?;
        writeln!(
            w,
            "  <key id=\"d3\" for=\"edge\" attr.name=\"normweight\" attr.type=\"double\" />"
        )?;
        writeln!(w, "  <graph edgedefault=\"undirected\">")?;

        for node in self.nodes() {
            writeln!(w, "    <node id=\"{}\">", xml_escape(&node.id))?;
            writeln!(w, "      <data key=\"d0\">{}</data>", node.length)?;
            if let (true, Some(reads)) = (self.with_reads, node.reads) {
                writeln!(w, "      <data key=\"d1\">{}</data>", reads)?;
            }
            writeln!(w, "    </node>")?;
        }

        for e in self.graph.edge_references() {
            let source = &self.graph[e.source()].id;
            let target = &self.graph[e.target()].id;
            writeln!(
                w,
                "    <edge source=\"{}\" target=\"{}\">",
                xml_escape(source),
                xml_escape(target)
            )?;
            writeln!(w, "      <data key=\"d2\">{}</data>", e.weight().raw_weight)?;
            writeln!(w, "      <data key=\"d3\">{}</data>", e.weight().norm_weight)?;
            writeln!(w, "    </edge>")?;
        }

        writeln!(w, "  </graph>")?;
        writeln!(w, "</graphml>")?;

        Ok(())
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
