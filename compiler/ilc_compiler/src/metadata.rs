//! Reflection metadata for the entities a compilation emits.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use ilc_depgraph::NodeId;

use crate::factory::NodeFactory;
use crate::nodes::NodeKey;
use crate::DiagnosticFailure;

/// One entity that gets reflection metadata.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetadataEntry {
    /// Display name, e.g. `System.Collections.Generic.List<System.Int32>`.
    pub name: String,
    /// Symbol of the node that made the entity reachable.
    pub symbol: String,
}

/// Types and methods the compilation emits metadata for, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedMetadata {
    pub types: Vec<MetadataEntry>,
    pub methods: Vec<MetadataEntry>,
}

impl GeneratedMetadata {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.methods.is_empty()
    }

    /// `type <name> <symbol>` and `method <name> <symbol>` lines.
    pub fn to_log(&self) -> String {
        let mut out = String::new();
        for entry in &self.types {
            let _ = writeln!(out, "type {} {}", entry.name, entry.symbol);
        }
        for entry in &self.methods {
            let _ = writeln!(out, "method {} {}", entry.name, entry.symbol);
        }
        out
    }
}

/// Decides which marked entities need metadata and optionally logs them.
#[derive(Debug, Clone, Default)]
pub struct MetadataManager {
    log_file: Option<PathBuf>,
}

impl MetadataManager {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Local type descriptors and method entrypoints among `marked`.
    pub fn collect(&self, factory: &NodeFactory, marked: &[NodeId]) -> GeneratedMetadata {
        let context = factory.context();
        let group = factory.module_group();
        let mut metadata = GeneratedMetadata::default();

        for &id in marked {
            let Some(node) = factory.node(id) else {
                continue;
            };
            match *node.key() {
                NodeKey::TypeDescriptor(ty) if group.contains_type(context, ty) => {
                    if let Ok(name) = context.type_display_name(ty) {
                        metadata.types.push(MetadataEntry {
                            name,
                            symbol: node.name().to_string(),
                        });
                    }
                }
                NodeKey::MethodEntrypoint(method) if group.contains_method(context, method) => {
                    if let Ok(name) = context.method_display_name(method) {
                        metadata.methods.push(MetadataEntry {
                            name,
                            symbol: node.name().to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        metadata.types.sort();
        metadata.methods.sort();
        metadata
    }

    /// Write the metadata log, if one is configured.
    pub fn write_log(&self, metadata: &GeneratedMetadata) -> Result<(), DiagnosticFailure> {
        let Some(path) = &self.log_file else {
            return Ok(());
        };
        std::fs::write(path, metadata.to_log()).map_err(|e| DiagnosticFailure {
            artifact: path.clone(),
            message: e.to_string(),
        })
    }
}
