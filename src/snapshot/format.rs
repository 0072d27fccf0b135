//! On-disk snapshot encoding.
//!
//! A snapshot file is line-oriented JSON. The first line is the header:
//!
//! ```text
//! {"format":"scenarist-snapshot","version":1,"scenario":"Users","fingerprint":"…","checksum":"…","created_at":"…"}
//! ```
//!
//! Each following line is one table section holding the table name, its
//! columns, and its rows. The header checksum is the SHA-256 of every byte
//! after the header line.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::db::{DataSet, Table};
use crate::fingerprint::checksum;
use crate::scenario::ScenarioName;

/// Format tag written to every snapshot header.
pub const FORMAT_TAG: &str = "scenarist-snapshot";
/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// Database state captured after a scenario's chain committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Scenario the snapshot was captured for.
    pub scenario: ScenarioName,
    /// Chain fingerprint of the plan that produced it.
    pub fingerprint: String,
    /// When the snapshot was captured.
    pub created_at: OffsetDateTime,
    /// Captured tables.
    pub data: DataSet,
}

impl Snapshot {
    /// Capture `data` for `scenario` now.
    #[must_use]
    pub fn new(scenario: ScenarioName, fingerprint: String, data: DataSet) -> Self {
        Self {
            scenario,
            fingerprint,
            created_at: OffsetDateTime::now_utc(),
            data,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    format: String,
    version: u32,
    scenario: String,
    fingerprint: String,
    checksum: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Serialize)]
struct SectionRef<'a> {
    table: &'a str,
    columns: &'a [String],
    rows: &'a [Vec<Value>],
}

#[derive(Deserialize)]
struct Section {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

pub(crate) fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    for (table, contents) in snapshot.data.tables() {
        let section = SectionRef {
            table,
            columns: &contents.columns,
            rows: &contents.rows,
        };
        serde_json::to_writer(&mut body, &section)?;
        body.push(b'\n');
    }
    let header = Header {
        format: FORMAT_TAG.to_owned(),
        version: FORMAT_VERSION,
        scenario: snapshot.scenario.to_string(),
        fingerprint: snapshot.fingerprint.clone(),
        checksum: checksum(&body),
        created_at: snapshot.created_at,
    };
    let mut out = serde_json::to_vec(&header)?;
    out.push(b'\n');
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode `bytes`, returning a human-readable reason on failure.
pub(crate) fn decode(bytes: &[u8]) -> Result<Snapshot, String> {
    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| "missing header line".to_owned())?;
    let (header_line, rest) = bytes.split_at(split);
    let body = rest.get(1..).unwrap_or_default();

    let header: Header =
        serde_json::from_slice(header_line).map_err(|err| format!("unreadable header: {err}"))?;
    if header.format != FORMAT_TAG {
        return Err(format!("unrecognised format tag '{}'", header.format));
    }
    if header.version != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", header.version));
    }
    let actual = checksum(body);
    if actual != header.checksum {
        return Err(format!(
            "checksum mismatch (expected {}, found {actual})",
            header.checksum
        ));
    }

    let mut data = DataSet::new();
    for (idx, line) in body.split(|b| *b == b'\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        let section: Section = serde_json::from_slice(line)
            .map_err(|err| format!("unreadable section {idx}: {err}"))?;
        if let Some(row) = section.rows.iter().position(|r| r.len() != section.columns.len()) {
            return Err(format!(
                "row {row} of table '{}' does not match its {} columns",
                section.table,
                section.columns.len()
            ));
        }
        data.insert_table(
            section.table,
            Table {
                columns: section.columns,
                rows: section.rows,
            },
        );
    }

    let scenario = ScenarioName::new(header.scenario).map_err(|err| err.to_string())?;
    Ok(Snapshot {
        scenario,
        fingerprint: header.fingerprint,
        created_at: header.created_at,
        data,
    })
}
