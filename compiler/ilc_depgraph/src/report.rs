//! Dependency reports: which nodes were marked, and why.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// One reason per node: the first one seen.
    FirstMark,
    /// Every recorded incoming edge per node.
    FullGraph,
}

/// A rendered view of a finished walk. Nodes appear in marking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub kind: ReportKind,
    pub nodes: Vec<ReportNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportNode {
    pub name: String,
    pub reasons: Vec<ReportReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportReason {
    /// Name of the requiring node; absent for roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Name of the node whose marking activated a conditional edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub reason: String,
}

impl ReportReason {
    /// `required by <source>`, or `root: <reason>` for roots.
    pub fn describe(&self) -> String {
        match &self.source {
            Some(source) => format!("required by {source}"),
            None => format!("root: {}", self.reason),
        }
    }
}

impl DependencyReport {
    pub fn node(&self, name: &str) -> Option<&ReportNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Total number of recorded reasons across all nodes.
    pub fn reason_count(&self) -> usize {
        self.nodes.iter().map(|node| node.reasons.len()).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report to `path`: JSON for a `.json` extension, text otherwise.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let contents = if path.extension().is_some_and(|ext| ext == "json") {
            self.to_json().map_err(io::Error::other)?
        } else {
            self.to_string()
        };
        std::fs::write(path, contents)
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "{}", node.name)?;
            for reason in &node.reasons {
                write!(f, "    <- {}", reason.describe())?;
                if let Some(condition) = &reason.condition {
                    write!(f, " [when {condition}]")?;
                }
                if reason.source.is_some() {
                    write!(f, ": {}", reason.reason)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
