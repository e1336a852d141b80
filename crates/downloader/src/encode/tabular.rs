use super::AttributeIndex;
use downloader_api::Row;

/// Turns rows into cells, one per leaf attribute, in declared order.
///
/// No conversion happens: cells are the row's text, empty when the value
/// is null or the key is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRowEncoder {
    header: Vec<String>,
}

impl TabularRowEncoder {
    pub fn new(index: &AttributeIndex<'_>) -> Self {
        Self {
            header: index.leaves().iter().map(|a| a.name.clone()).collect(),
        }
    }

    /// Column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn encode(&self, row: &Row) -> Vec<String> {
        self.header
            .iter()
            .map(|name| row.get(name).cloned().flatten().unwrap_or_default())
            .collect()
    }
}
