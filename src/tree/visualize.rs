//! DOT rendering of a citation tree.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::{fs, io};

use xxhash_rust::xxh3::xxh3_64;

use super::node::CiteNode;
use super::traverse;

/// Write `node`'s tree as a DOT digraph to `path`.
///
/// Vertices are titles and edges run parent → child, in pre-order.
/// Vertex ids are hashes of the title, so duplicate titles collapse
/// into one vertex.
pub fn visualize(node: &Arc<CiteNode>, path: &Path) -> io::Result<()> {
    fs::write(path, render(node))
}

fn render(node: &Arc<CiteNode>) -> String {
    let mut vertex_seen: HashSet<u64> = HashSet::new();
    let mut edge_seen: HashSet<(u64, u64)> = HashSet::new();
    let mut vertices: Vec<(u64, String)> = Vec::new();
    let mut edges: Vec<(u64, u64)> = Vec::new();

    traverse(node, &mut |n| {
        let title = n.info().title;
        let vertex = xxh3_64(title.as_bytes());
        if vertex_seen.insert(vertex) {
            vertices.push((vertex, title));
        }
        if let Some(parent) = n.parent() {
            let from = xxh3_64(parent.info().title.as_bytes());
            if edge_seen.insert((from, vertex)) {
                edges.push((from, vertex));
            }
        }
    });

    let mut out = String::from("digraph citations {\n");
    for (vertex, title) in &vertices {
        let _ = writeln!(out, "  n{vertex:016x} [label=\"{}\"];", escape_label(title));
    }
    for (from, to) in &edges {
        let _ = writeln!(out, "  n{from:016x} -> n{to:016x};");
    }
    out.push_str("}\n");
    out
}

fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ")
}
