//! Tabular input.
//!
//! Roster and results tables arrive either as CSV/TSV exports or as sheets of one Excel run
//! workbook. A [`Table`] holds one header row and the data rows with every cell already
//! cleaned, and resolves logical fields to column positions through per-field alias lists.

use crate::constants::NULL_CELL_SPELLINGS;
use crate::{PipelineError, PipelineResult};
use calamine::{Data, DataType, Reader, Sheets};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// A logical column and the header spellings accepted for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl Field {
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }
}

/// Trims surrounding blanks and maps spreadsheet null spellings to the empty string.
///
/// Embedded newlines are kept: lab conclusions sometimes span lines.
pub fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if NULL_CELL_SPELLINGS
        .iter()
        .any(|null| trimmed.eq_ignore_ascii_case(null))
    {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Raw cells of one source line, with its 1-based line number in the sheet or file.
pub(crate) type NumberedRecord = (usize, Vec<String>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    name: &'static str,
    headers: Vec<String>,
    rows: Vec<NumberedRecord>,
}

impl Table {
    /// Builds a table from raw cells, header on line 1 and data from line 2. Cells are
    /// cleaned; fully blank rows are dropped without renumbering the rest.
    pub fn new(
        name: &'static str,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> PipelineResult<Self> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (index + 2, row))
            .collect();
        Self::numbered(name, headers, rows)
    }

    fn numbered(
        name: &'static str,
        headers: Vec<String>,
        rows: Vec<NumberedRecord>,
    ) -> PipelineResult<Self> {
        let headers: Vec<String> = headers.iter().map(|h| clean_cell(h)).collect();
        if headers.iter().all(String::is_empty) {
            return Err(PipelineError::EmptyTable { table: name });
        }

        let rows: Vec<NumberedRecord> = rows
            .into_iter()
            .map(|(line, row)| {
                let cells: Vec<String> = row.iter().map(|cell| clean_cell(cell)).collect();
                (line, cells)
            })
            .filter(|(_, row)| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    /// Loads a CSV or TSV file; `.tsv` and `.tab` select tab as the delimiter.
    ///
    /// When `header_marker` is given, the header is the first line holding a cell that
    /// contains the marker (case-insensitive); lines before it are discarded. Otherwise the
    /// first line is the header.
    pub fn from_path(
        name: &'static str,
        path: &Path,
        header_marker: Option<&str>,
    ) -> PipelineResult<Self> {
        let delimiter = delimiter_for(path);
        let file = std::fs::File::open(path).map_err(PipelineError::FileRead)?;
        let records = read_records(file, delimiter).map_err(|source| PipelineError::TableRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_records(name, records, header_marker)
    }

    /// Loads a table from any reader, with the same header rules as [`Table::from_path`].
    pub fn from_reader<R: Read>(
        name: &'static str,
        reader: R,
        delimiter: u8,
        header_marker: Option<&str>,
    ) -> PipelineResult<Self> {
        let records = read_records(reader, delimiter)?;
        Self::from_records(name, records, header_marker)
    }

    /// Header search shared by every loader: picks the header line and keeps the lines below
    /// it as data, each with its original line number.
    pub(crate) fn from_records(
        name: &'static str,
        mut records: Vec<NumberedRecord>,
        header_marker: Option<&str>,
    ) -> PipelineResult<Self> {
        let header_index = match header_marker {
            Some(marker) => {
                let marker = marker.to_lowercase();
                records
                    .iter()
                    .position(|(_, record)| {
                        record
                            .iter()
                            .any(|cell| cell.trim().to_lowercase().contains(&marker))
                    })
                    .unwrap_or(0)
            }
            None => 0,
        };

        if records.len() <= header_index {
            return Err(PipelineError::EmptyTable { table: name });
        }

        let rows = records.split_off(header_index + 1);
        let (_, headers) = records.swap_remove(header_index);
        Self::numbered(name, headers, rows)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first header matching any alias of `field`, compared
    /// case-insensitively after trimming. Aliases are tried in order.
    pub fn column(&self, field: &Field) -> Option<usize> {
        field.aliases.iter().find_map(|alias| {
            self.headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(alias.trim()))
        })
    }

    /// Like [`Table::column`], but a missing column is a structural error.
    pub fn require_column(&self, field: &Field) -> PipelineResult<usize> {
        self.column(field).ok_or_else(|| PipelineError::MissingColumn {
            table: self.name,
            field: field.name,
            aliases: field.aliases.to_vec(),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.rows.iter().map(|(line, cells)| TableRow {
            number: *line,
            cells,
        })
    }
}

/// An open Excel workbook whose sheets load as [`Table`]s.
pub struct Workbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> PipelineResult<Self> {
        let sheets =
            calamine::open_workbook_auto(path).map_err(|source| PipelineError::WorkbookRead {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// Loads the sheet named `sheet` (case-insensitive) with the same header rules as
    /// [`Table::from_path`]. Row numbers are the sheet's own row numbers.
    pub fn table(
        &mut self,
        name: &'static str,
        sheet: &'static str,
        header_marker: Option<&str>,
    ) -> PipelineResult<Table> {
        let Some(sheet_name) = self
            .sheets
            .sheet_names()
            .into_iter()
            .find(|candidate| candidate.trim().eq_ignore_ascii_case(sheet))
        else {
            return Err(PipelineError::MissingSheet {
                path: self.path.clone(),
                sheet,
            });
        };

        let range = self
            .sheets
            .worksheet_range(&sheet_name)
            .map_err(|source| PipelineError::WorkbookRead {
                path: self.path.clone(),
                source,
            })?;
        let first_row = range.start().map_or(0, |(row, _)| row as usize);

        let records: Vec<NumberedRecord> = range
            .rows()
            .enumerate()
            .map(|(index, cells)| {
                let cells: Vec<String> = cells.iter().map(cell_text).collect();
                (first_row + index + 1, cells)
            })
            .collect();
        tracing::debug!(sheet = %sheet_name, rows = records.len(), "read workbook sheet");

        Table::from_records(name, records, header_marker)
    }
}

/// Text of one workbook cell. Dates come out as `YYYY-MM-DD`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// One data row. Short rows read as empty cells.
#[derive(Clone, Copy, Debug)]
pub struct TableRow<'a> {
    /// 1-based line in the source sheet or file, header and preamble included.
    pub number: usize,
    cells: &'a [String],
}

impl<'a> TableRow<'a> {
    pub fn get(&self, column: Option<usize>) -> &'a str {
        column
            .and_then(|index| self.cells.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn at(&self, column: usize) -> &'a str {
        self.get(Some(column))
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

fn read_records<R: Read>(reader: R, delimiter: u8) -> Result<Vec<NumberedRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map_or(index + 1, |position| position.line() as usize);
        records.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(records)
}
