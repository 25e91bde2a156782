//! Delimited-text ingest.
//!
//! Input layout: one sample per line, `n` feature columns followed by the target
//! column, no header. `n` is taken from the first data line.
//!
//! Design goals:
//! - **Strict rows**: a wrong column count or a non-numeric token is fatal and
//!   reported with its 1-based line number
//! - **Tolerant whitespace**: fields are trimmed, blank lines are skipped
//! - **No fitting logic here**

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

use crate::domain::{Dataset, Delimiter};
use crate::error::{RegressError, RegressResult};

/// Load a dataset from a file.
pub fn load_dataset(path: &Path, delimiter: Delimiter) -> RegressResult<Dataset> {
    let file = File::open(path).map_err(|source| RegressError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data = read_dataset(file, delimiter).map_err(|e| match e {
        RegressError::Io { source, .. } => RegressError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    log::info!(
        "loaded {} samples x {} features from {}",
        data.n_samples(),
        data.n_features(),
        path.display()
    );
    Ok(data)
}

/// Parse a dataset from any reader.
pub fn read_dataset<R: Read>(reader: R, delimiter: Delimiter) -> RegressResult<Dataset> {
    let lines = match delimiter {
        Delimiter::Tab => read_delimited(reader, b'\t')?,
        Delimiter::Comma => read_delimited(reader, b',')?,
        Delimiter::Whitespace => read_whitespace(reader)?,
    };
    build_dataset(lines)
}

/// Raw fields of one non-blank line.
struct RawLine {
    line: usize,
    fields: Vec<String>,
}

fn read_delimited<R: Read>(reader: R, delimiter: u8) -> RegressResult<Vec<RawLine>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
            match e.into_kind() {
                csv::ErrorKind::Io(source) => RegressError::Io {
                    path: Default::default(),
                    source,
                },
                kind => RegressError::MalformedInput {
                    line,
                    message: format!("unreadable record: {kind:?}"),
                },
            }
        })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(str::is_empty) {
            continue;
        }
        out.push(RawLine {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(out)
}

fn read_whitespace<R: Read>(reader: R) -> RegressResult<Vec<RawLine>> {
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line_no = idx + 1;
        let text = line.map_err(|source| match source.kind() {
            ErrorKind::InvalidData => RegressError::MalformedInput {
                line: line_no,
                message: "line is not valid UTF-8".to_string(),
            },
            _ => RegressError::Io {
                path: Default::default(),
                source,
            },
        })?;
        let fields: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if fields.is_empty() {
            continue;
        }
        out.push(RawLine { line: line_no, fields });
    }
    Ok(out)
}

fn build_dataset(lines: Vec<RawLine>) -> RegressResult<Dataset> {
    let Some(first) = lines.first() else {
        return Err(RegressError::EmptyDataset);
    };
    let width = first.fields.len();
    if width < 2 {
        return Err(RegressError::MalformedInput {
            line: first.line,
            message: format!("expected at least one feature and a target, found {width} column(s)"),
        });
    }

    let mut rows = Vec::with_capacity(lines.len());
    let mut targets = Vec::with_capacity(lines.len());
    for raw in &lines {
        if raw.fields.len() != width {
            return Err(RegressError::MalformedInput {
                line: raw.line,
                message: format!("expected {width} columns, found {}", raw.fields.len()),
            });
        }
        let mut values = raw
            .fields
            .iter()
            .map(|f| parse_value(f, raw.line))
            .collect::<RegressResult<Vec<f64>>>()?;
        // Last column is the target.
        if let Some(target) = values.pop() {
            targets.push(target);
        }
        rows.push(values);
    }

    Dataset::from_rows(&rows, targets)
}

fn parse_value(token: &str, line: usize) -> RegressResult<f64> {
    let v = token.parse::<f64>().map_err(|_| RegressError::MalformedInput {
        line,
        message: format!("'{token}' is not a number"),
    })?;
    if !v.is_finite() {
        return Err(RegressError::MalformedInput {
            line,
            message: format!("'{token}' is not a finite number"),
        });
    }
    Ok(v)
}
