//! Rendering of exported records as JSON, NDJSON or CSV.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use clap::{Args, ValueEnum};
use cycle::{Company, Customer, Release, ReleaseNote};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One pretty-printed JSON array, written once every page is in.
    Json,
    /// One JSON object per line, written as pages arrive.
    Ndjson,
    /// A header row plus one row per record, written once every page is in.
    Csv,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Write to this file instead of stdout.
    #[arg(long)]
    pub output: Option<std::path::PathBuf>,
}

/// A record that can be flattened into one CSV row.
pub trait Tabular {
    const HEADERS: &'static [&'static str];

    fn row(&self) -> Vec<String>;
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

impl Tabular for Company {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "domain",
        "arr",
        "number_of_employees",
        "zendesk_id",
        "hubspot_id",
        "intercom_id",
        "pipedrive_id",
        "snowflake_id",
        "custom_id",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            cell(self.domain.as_deref()),
            cell(self.arr),
            cell(self.number_of_employees),
            cell(self.zendesk_id.as_deref()),
            cell(self.hubspot_id.as_deref()),
            cell(self.intercom_id.as_deref()),
            cell(self.pipedrive_id.as_deref()),
            cell(self.snowflake_id.as_deref()),
            cell(self.custom_id.as_deref()),
        ]
    }
}

impl Tabular for Customer {
    const HEADERS: &'static [&'static str] = &["id", "name", "email", "company_id", "company_name"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            cell(self.name.as_deref()),
            cell(self.email.as_deref()),
            cell(self.company.as_ref().map(|company| &company.id)),
            cell(self.company.as_ref().and_then(|company| company.name.as_deref())),
        ]
    }
}

impl Tabular for Release {
    const HEADERS: &'static [&'static str] = &["id", "title", "date"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            cell(self.title.as_deref()),
            cell(self.date),
        ]
    }
}

impl Tabular for ReleaseNote {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "title",
        "is_other",
        "doc_id",
        "doc_title",
        "cover_url",
        "html_content",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            cell(self.title.as_deref()),
            self.is_other.to_string(),
            cell(self.doc.as_ref().map(|doc| &doc.id)),
            cell(self.doc.as_ref().and_then(|doc| doc.title.as_deref())),
            cell(self.cover.as_ref().map(|cover| cover.url.as_str())),
            cell(self.html_content.as_deref()),
        ]
    }
}

/// Opens the destination: the file at `path`, or stdout.
pub fn open(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

/// Writes a complete collection in `format`.
pub fn write_batch<T, W>(writer: &mut W, format: Format, items: &[T]) -> anyhow::Result<()>
where
    T: Serialize + Tabular,
    W: Write + ?Sized,
{
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut *writer, items)?;
            writeln!(writer)?;
        }
        Format::Ndjson => {
            for item in items {
                write_line(writer, item)?;
            }
        }
        Format::Csv => {
            let mut csv = csv::Writer::from_writer(&mut *writer);
            csv.write_record(T::HEADERS)?;
            for item in items {
                csv.write_record(item.row())?;
            }
            csv.flush()?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes one record as a single JSON line.
pub fn write_line<T, W>(writer: &mut W, item: &T) -> anyhow::Result<()>
where
    T: Serialize,
    W: Write + ?Sized,
{
    serde_json::to_writer(&mut *writer, item)?;
    writeln!(writer)?;
    Ok(())
}
