//! Loading query results: remote CSV fetch, CSV parsing and local datasets.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::local_dataset;
use crate::model::{QueryResult, QuerySource, Row, TableColumn, Value};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("offline mode: {url} is not cached")]
    Offline { url: String },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returns the body of a URL as text.
pub trait Fetcher: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, LoadError>;
}

/// HTTP fetcher with an optional on-disk cache.
///
/// A cached body is reused without revalidation.
pub struct HttpFetcher {
    agent: ureq::Agent,
    cache_dir: Option<PathBuf>,
    offline: bool,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, cache_dir: Option<PathBuf>, offline: bool) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            cache_dir,
            offline,
        }
    }

    fn cache_file(&self, url: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let name: String = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect();
        Some(dir.join(name))
    }

    fn store_cached(&self, path: &PathBuf, body: &str) {
        let result = path
            .parent()
            .map(fs::create_dir_all)
            .transpose()
            .and_then(|_| fs::write(path, body));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to write CSV cache");
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
        let cache_file = self.cache_file(url);
        if let Some(path) = cache_file.as_ref().filter(|p| p.exists()) {
            debug!(url, path = %path.display(), "serving CSV from cache");
            return Ok(fs::read_to_string(path)?);
        }

        if self.offline {
            return Err(LoadError::Offline {
                url: url.to_string(),
            });
        }

        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => LoadError::Status {
                url: url.to_string(),
                status,
            },
            other => LoadError::Http {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;
        let body = response.into_string()?;

        if let Some(path) = cache_file {
            self.store_cached(&path, &body);
        }
        Ok(body)
    }
}

/// Run `f` and return its value with the elapsed wall time in milliseconds.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, u64) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed().as_millis() as u64)
}

/// Infer a typed value from a CSV field.
///
/// Booleans and numbers are converted, empty fields become null. Numbers
/// with a leading zero (postal codes, padded ids) stay text.
pub fn parse_dynamic(field: &str) -> Value {
    match field {
        "" => return Value::Null,
        "true" | "TRUE" => return Value::Bool(true),
        "false" | "FALSE" => return Value::Bool(false),
        _ => {}
    }

    let trimmed = field.trim();
    if !looks_numeric(trimmed) || has_padding_zero(trimmed) {
        return Value::Text(field.to_string());
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Text(field.to_string()),
    }
}

fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());

    let mantissa_ok = match frac_part {
        Some(frac) => {
            digits(int_part) && digits(frac) && !(int_part.is_empty() && frac.is_empty())
        }
        None => !int_part.is_empty() && digits(int_part),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

fn has_padding_zero(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let int_part = body.split(['.', 'e', 'E']).next().unwrap_or("");
    int_part.len() > 1 && int_part.starts_with('0')
}

/// Parse CSV text with a header row into columns and typed rows.
pub fn parse_csv(text: &str, limit: Option<usize>) -> Result<(Vec<TableColumn>, Vec<Row>), LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let keys = unique_keys(reader.headers()?.iter());
    let columns: Vec<TableColumn> = keys.iter().map(|k| TableColumn::from_key(k)).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|l| rows.len() >= l) {
            break;
        }
        let record = record?;
        // Only a fully blank line is skipped; `,,` is a row of nulls.
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        let row: Row = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let value = record.get(i).map(parse_dynamic).unwrap_or(Value::Null);
                (key.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok((columns, rows))
}

fn unique_keys<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for header in headers {
        let base = header.trim().to_string();
        let mut key = base.clone();
        let mut n = 1;
        while keys.contains(&key) {
            key = format!("{}_{}", base, n);
            n += 1;
        }
        keys.push(key);
    }
    keys
}

/// Fetch a CSV file and turn it into a query result.
pub fn load_csv_as_query_result(
    fetcher: &dyn Fetcher,
    url: &str,
    limit: Option<usize>,
) -> Result<QueryResult, LoadError> {
    let (parsed, elapsed) = measure(|| -> Result<_, LoadError> {
        let text = fetcher.fetch_text(url)?;
        parse_csv(&text, limit)
    });
    let (columns, rows) = parsed?;
    debug!(url, rows = rows.len(), elapsed_ms = elapsed, "loaded CSV result");
    Ok(QueryResult::new(columns, rows, elapsed))
}

/// Produce the result for a query source.
pub fn resolve_source(
    fetcher: &dyn Fetcher,
    base_url: &str,
    source: QuerySource,
) -> Result<QueryResult, LoadError> {
    match source {
        QuerySource::RemoteCsv { file, limit } => {
            let url = format!("{}/{}", base_url.trim_end_matches('/'), file);
            load_csv_as_query_result(fetcher, &url, limit)
        }
        QuerySource::Local(dataset) => {
            let (mut result, elapsed) = measure(|| local_dataset(dataset));
            result.execution_ms = elapsed;
            Ok(result)
        }
    }
}
