#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::convert::Infallible;

use pretty_assertions::assert_eq;

use super::*;
use crate::DependencyListEntry;

struct Names;

impl DependencyContext for Names {
    type Error = Infallible;

    fn node_name(&self, node: NodeId) -> String {
        format!("n{}", node.raw())
    }

    fn static_dependencies(&self, _node: NodeId) -> Result<Vec<DependencyListEntry>, Infallible> {
        Ok(Vec::new())
    }
}

fn n(raw: u32) -> NodeId {
    NodeId::from_raw(raw)
}

fn reason(text: &'static str) -> Reason {
    Reason::Borrowed(text)
}

#[test]
fn first_mark_ignores_later_reasons() {
    let mut log = FirstMarkLogStrategy::default();
    log.node_marked(n(0), None, &reason("root"));
    log.node_marked(n(0), Some(n(5)), &reason("late"));

    assert_eq!(log.len(), 1);
    assert_eq!(
        log.reason(n(0)),
        Some(&MarkReason {
            source: None,
            reason: reason("root"),
        })
    );
}

#[test]
fn first_mark_discovery_path_walks_back_to_root() {
    let mut log = FirstMarkLogStrategy::default();
    log.node_marked(n(0), None, &reason("root"));
    log.node_marked(n(1), Some(n(0)), &reason("call"));
    log.node_marked(n(2), Some(n(1)), &reason("type"));

    let path = log.discovery_path(n(2)).unwrap();
    let sources: Vec<Option<NodeId>> = path.iter().map(|hop| hop.source).collect();
    assert_eq!(sources, vec![Some(n(1)), Some(n(0)), None]);
    assert!(log.discovery_path(n(9)).is_none());
}

#[test]
fn first_mark_report_lists_marked_nodes_in_order() {
    let mut log = FirstMarkLogStrategy::default();
    log.node_marked(n(3), None, &reason("root"));
    log.node_marked(n(1), Some(n(3)), &reason("call"));

    let report = log.report(&Names, &[n(3), n(1)]).unwrap();
    let names: Vec<&str> = report.nodes.iter().map(|node| node.name.as_str()).collect();
    assert_eq!(names, vec!["n3", "n1"]);
    assert_eq!(report.nodes[1].reasons[0].source.as_deref(), Some("n3"));
    assert_eq!(report.nodes[1].reasons[0].reason, "call");
}

#[test]
fn full_graph_deduplicates_identical_edges() {
    let mut log = FullGraphLogStrategy::default();
    log.edge_visited(Some(n(0)), n(1), &reason("call"));
    log.edge_visited(Some(n(0)), n(1), &reason("call"));
    log.edge_visited(Some(n(0)), n(1), &reason("other"));

    assert_eq!(log.edges().len(), 2);
}

#[test]
fn full_graph_keeps_conditional_edges_distinct() {
    let mut log = FullGraphLogStrategy::default();
    log.edge_visited(Some(n(0)), n(1), &reason("dep"));
    log.conditional_edge_visited(n(0), n(2), n(1), &reason("dep"));

    let incoming: Vec<Option<NodeId>> = log.incoming(n(1)).map(|edge| edge.condition).collect();
    assert_eq!(incoming, vec![None, Some(n(2))]);
}

#[test]
fn full_graph_discovery_path_follows_first_incoming_edge() {
    let mut log = FullGraphLogStrategy::default();
    log.edge_visited(None, n(0), &reason("root"));
    log.edge_visited(Some(n(0)), n(1), &reason("first"));
    log.edge_visited(Some(n(2)), n(1), &reason("second"));

    let path = log.discovery_path(n(1)).unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(path[0].reason, "first");
    assert_eq!(path[1].source, None);
}

#[test]
fn full_graph_report_skips_unmarked_targets() {
    let mut log = FullGraphLogStrategy::default();
    log.edge_visited(None, n(0), &reason("root"));
    log.edge_visited(Some(n(0)), n(1), &reason("call"));
    log.edge_visited(Some(n(0)), n(7), &reason("never marked"));

    let report = log.report(&Names, &[n(0), n(1)]).unwrap();
    assert_eq!(report.kind, ReportKind::FullGraph);
    assert_eq!(report.nodes.len(), 2);
    assert!(report.node("n7").is_none());
    assert_eq!(report.reason_count(), 2);
}

#[test]
fn strategy_names_are_distinct() {
    assert_eq!(NoLogStrategy::NAME, "none");
    assert_eq!(FirstMarkLogStrategy::NAME, "first-mark");
    assert_eq!(FullGraphLogStrategy::NAME, "full-graph");
    assert!(FullGraphLogStrategy::TRACKS_EDGES);
    assert!(!FirstMarkLogStrategy::TRACKS_EDGES);
}
