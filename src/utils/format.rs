//! Table formatting and output utilities
//!
//! This module renders resource listings as styled tables or JSON.

use crate::error::Result;
use crate::resource::{ResourceListing, StorageResource};
use crossterm::terminal::size;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Table row for a storage resource
#[derive(Debug, Clone, Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Last Modified")]
    pub last_modified: String,
    #[tabled(rename = "URL")]
    pub url: String,
}

impl From<&StorageResource> for ResourceRow {
    fn from(resource: &StorageResource) -> Self {
        Self {
            kind: resource.kind().to_string(),
            name: resource.name().to_string(),
            last_modified: resource
                .last_modified()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
            url: resource.url().unwrap_or("-").to_string(),
        }
    }
}

/// Formatter for resource listings
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Format resources in the configured output format
    pub fn format_resources<'a, I>(&self, resources: I) -> Result<String>
    where
        I: IntoIterator<Item = &'a StorageResource>,
    {
        let resources: Vec<&StorageResource> = resources.into_iter().collect();

        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&resources)?),
            OutputFormat::Table => {
                if resources.is_empty() {
                    return Ok("No containers or queues found".to_string());
                }
                let rows: Vec<ResourceRow> = resources.into_iter().map(ResourceRow::from).collect();
                Ok(self.format_as_table(&rows))
            }
        }
    }

    pub fn format_listing(&self, listing: &ResourceListing) -> Result<String> {
        self.format_resources(listing)
    }

    /// Format data as a styled table
    fn format_as_table<T: Tabled>(&self, data: &[T]) -> String {
        let mut table = Table::new(data);

        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Padding::new(1, 1, 0, 0));

        if !self.no_color {
            table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
        }

        // Auto-adjust width to terminal
        if let Ok((width, _)) = size() {
            table.with(Width::wrap(width as usize));
        }

        table.to_string()
    }
}
