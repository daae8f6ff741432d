//! Record source: fetch the export and split it into CSV records

use std::sync::Arc;

use async_trait::async_trait;
use csv::StringRecord;
use sales_common::SourceLocation;
use tracing::{debug, info, instrument};

use super::error::{PipelineError, Result};

/// Read access to an object store holding the export
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the whole object at `location`
    async fn fetch(&self, location: &SourceLocation) -> anyhow::Result<Vec<u8>>;
}

/// A source row together with the 1-based line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub line: u64,
    pub record: StringRecord,
}

/// Fully parsed export
#[derive(Debug, Clone, Default)]
pub struct SourceRows {
    /// First record, present only when the source declares a header
    pub header: Option<StringRecord>,
    pub rows: Vec<SourceRow>,
}

#[derive(Clone)]
pub struct RecordSource {
    store: Arc<dyn ObjectStore>,
    location: SourceLocation,
    has_header: bool,
}

impl RecordSource {
    pub fn new(store: Arc<dyn ObjectStore>, location: SourceLocation, has_header: bool) -> Self {
        Self {
            store,
            location,
            has_header,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Download and parse the export in one step
    ///
    /// Either every record is returned or the call fails; there is no
    /// partial result.
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn read(&self) -> Result<SourceRows> {
        let data = self
            .store
            .fetch(&self.location)
            .await
            .map_err(|e| PipelineError::Retrieval {
                location: self.location.clone(),
                message: format!("{:#}", e),
            })?;

        debug!(bytes = data.len(), "Fetched export");

        let rows = parse_records(&data, self.has_header)?;

        info!(
            rows = rows.rows.len(),
            has_header = rows.header.is_some(),
            "Parsed export"
        );

        Ok(rows)
    }
}

/// Parse CSV bytes into records
///
/// Every record must have the same number of fields as the first one, and
/// quoting must be well formed.
pub fn parse_records(data: &[u8], has_header: bool) -> Result<SourceRows> {
    check_quoting(data)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(data);

    let mut parsed = SourceRows::default();
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if has_header && parsed.header.is_none() && parsed.rows.is_empty() {
            parsed.header = Some(record.clone());
            continue;
        }

        parsed.rows.push(SourceRow {
            line,
            record: record.clone(),
        });
    }

    Ok(parsed)
}

/// Reject quoting the `csv` reader would otherwise accept leniently
///
/// A quote may only open a field; inside a quoted field a quote is either
/// doubled or closes the field, and must then be followed by a delimiter,
/// a line break, or the end of input. Quoted fields must be closed.
fn check_quoting(data: &[u8]) -> Result<()> {
    let quote_error = |line: u64, message: &str| PipelineError::Parse {
        line,
        message: message.to_string(),
    };

    let mut line: u64 = 1;
    let mut field_start = true;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];

        if field_start && byte == b'"' {
            let opened_at = line;
            i += 1;

            loop {
                match data.get(i) {
                    None => return Err(quote_error(opened_at, "unterminated quoted field")),
                    Some(b'"') => match data.get(i + 1) {
                        Some(b'"') => i += 2,
                        None | Some(b',') | Some(b'\n') | Some(b'\r') => {
                            i += 1;
                            break;
                        },
                        Some(_) => {
                            return Err(quote_error(line, "extraneous \" in quoted field"));
                        },
                    },
                    Some(b'\n') => {
                        line += 1;
                        i += 1;
                    },
                    Some(_) => i += 1,
                }
            }

            field_start = false;
            continue;
        }

        match byte {
            b'"' => return Err(quote_error(line, "bare \" in non-quoted field")),
            b',' => field_start = true,
            b'\n' => {
                line += 1;
                field_start = true;
            },
            _ => field_start = false,
        }
        i += 1;
    }

    Ok(())
}
