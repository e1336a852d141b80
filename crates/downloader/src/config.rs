use crate::error::{ExportError, Result};
use crate::rdf::GraphSyntax;
use crate::tabular::is_workbook_path;
use downloader_api::MolgenisVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Instance namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "http://molgenis.org/entities/";

/// Output representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Workbook or zip of TSV files
    #[default]
    Tabular,
    /// RDF triple store
    Graph,
}

/// Concrete backend implied by the target and the output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Zip archive of TSV files
    Zip,
    /// `.xlsx` workbook (`.xls` paths included)
    Workbook,
    /// Graph serialized to a file in the given syntax
    GraphFile(GraphSyntax),
    /// Persistent triple store directory
    GraphStore,
}

/// Parameters of one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Entities to export (empty = all)
    pub entities: Vec<String>,

    /// Output file or store directory
    pub output: PathBuf,

    /// Write the schema before the data and expand the entity selection
    pub include_metadata: bool,

    /// Replace an existing output
    pub overwrite: bool,

    /// Schema version (None = ask the server)
    pub version: Option<MolgenisVersion>,

    /// Rows per page (None = client default)
    pub page_size: Option<usize>,

    /// Output representation
    pub target: TargetKind,

    /// Base IRI of instance subjects in graph output
    pub namespace: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            output: PathBuf::from("export.zip"),
            include_metadata: false,
            overwrite: false,
            version: None,
            page_size: None,
            target: TargetKind::Tabular,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ExportConfig {
    /// Tabular export to `output`.
    pub fn tabular(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    /// Graph export to `output`.
    pub fn graph(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            target: TargetKind::Graph,
            ..Default::default()
        }
    }

    /// Load a config document.
    ///
    /// ```rust
    /// use downloader::{ExportConfig, TargetKind};
    ///
    /// let config = ExportConfig::from_json(
    ///     r#"{"entities": ["Person"], "output": "people.ttl", "target": "graph"}"#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.target, TargetKind::Graph);
    /// assert!(!config.overwrite);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExportError::serialization("Failed to parse export config", Some(e)))
    }

    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_version(mut self, version: MolgenisVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Page size to request; zero counts as unset.
    pub fn effective_page_size(&self) -> Option<usize> {
        self.page_size.filter(|size| *size > 0)
    }

    /// Backend chosen from the target and the output extension.
    pub fn output_format(&self) -> OutputFormat {
        match self.target {
            TargetKind::Tabular if is_workbook_path(&self.output) => OutputFormat::Workbook,
            TargetKind::Tabular => OutputFormat::Zip,
            TargetKind::Graph => self
                .output
                .extension()
                .and_then(|e| e.to_str())
                .and_then(GraphSyntax::from_extension)
                .map_or(OutputFormat::GraphStore, OutputFormat::GraphFile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert!(config.entities.is_empty());
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.output_format(), OutputFormat::Zip);
        assert_eq!(config.effective_page_size(), None);
    }

    #[test]
    fn test_output_format_by_extension() {
        assert_eq!(ExportConfig::tabular("a.xlsx").output_format(), OutputFormat::Workbook);
        assert_eq!(ExportConfig::tabular("a.xls").output_format(), OutputFormat::Workbook);
        assert_eq!(ExportConfig::tabular("a.tsv.zip").output_format(), OutputFormat::Zip);
        assert_eq!(
            ExportConfig::graph("a.ttl").output_format(),
            OutputFormat::GraphFile(GraphSyntax::Turtle)
        );
        assert_eq!(
            ExportConfig::graph("a.nt").output_format(),
            OutputFormat::GraphFile(GraphSyntax::NTriples)
        );
        assert_eq!(ExportConfig::graph("store").output_format(), OutputFormat::GraphStore);
    }

    #[test]
    fn test_from_json_with_version() {
        let config = ExportConfig::from_json(
            r#"{"output": "x.zip", "version": {"major": 2, "minor": 1, "patch": 0}, "page_size": 0}"#,
        )
        .unwrap();
        assert_eq!(config.version, Some(MolgenisVersion::new(2, 1, 0)));
        assert_eq!(config.effective_page_size(), None);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ExportConfig::from_json("{"),
            Err(ExportError::Serialization { .. })
        ));
    }

    #[test]
    fn test_builder() {
        let config = ExportConfig::graph("out.nt")
            .with_entities(["Person", "City"])
            .with_metadata(true)
            .with_overwrite(true)
            .with_page_size(50)
            .with_namespace("http://ex/");
        assert_eq!(config.entities, vec!["Person", "City"]);
        assert!(config.include_metadata && config.overwrite);
        assert_eq!(config.effective_page_size(), Some(50));
    }
}
