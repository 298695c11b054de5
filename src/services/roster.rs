use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;
use validator::Validate;

use crate::config::{ColumnAlias, RosterSettings};
use crate::models::{Person, PAIR_SEPARATOR};

pub const EMAIL_COLUMN: &str = "email";
pub const DEPARTMENT_COLUMN: &str = "department";

/// Errors that can occur while reading the roster
///
/// Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to open roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed roster: {0}")]
    Csv(#[from] csv::Error),

    #[error("Roster is missing required column `{0}`")]
    MissingColumn(String),

    #[error("Roster has column `{0}` more than once")]
    DuplicateColumn(String),

    #[error("Roster row {row}: invalid email `{email}`")]
    InvalidEmail { row: usize, email: String },

    #[error("Roster row {row}: email `{email}` contains the pair separator `&`")]
    ReservedSeparator { row: usize, email: String },

    #[error("Roster row {row}: email `{email}` already appears earlier")]
    DuplicateEmail { row: usize, email: String },
}

/// Load the roster file named in the settings
///
/// `required` lists the attribute columns the configured passes rely on.
pub fn load_roster(settings: &RosterSettings, required: &[String]) -> Result<Vec<Person>, RosterError> {
    let file = File::open(&settings.path).map_err(|source| RosterError::Io {
        path: settings.path.clone(),
        source,
    })?;

    let roster = read_roster(file, settings, required)?;
    tracing::info!("Loaded {} people from {}", roster.len(), settings.path.display());
    Ok(roster)
}

/// Parse a CSV roster from any reader
pub fn read_roster<R: Read>(
    reader: R,
    settings: &RosterSettings,
    required: &[String],
) -> Result<Vec<Person>, RosterError> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let columns = normalize_headers(csv_reader.headers()?, &settings.column_aliases)?;
    let email_idx = column_index(&columns, EMAIL_COLUMN)?;
    let department_idx = column_index(&columns, DEPARTMENT_COLUMN)?;
    for attribute in required {
        column_index(&columns, attribute)?;
    }

    // Columns that become match attributes
    let attribute_columns: Vec<(usize, &str)> = columns
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx != email_idx
                && *idx != department_idx
                && !settings.drop_columns.iter().any(|d| d == *name)
        })
        .map(|(idx, name)| (idx, name.as_str()))
        .collect();

    let mut roster = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let row = i + 2;

        let email = record.get(email_idx).unwrap_or_default();
        if email.is_empty() {
            tracing::warn!("Skipping roster row {}: no email", row);
            continue;
        }

        let mut person = Person::new(email, record.get(department_idx).unwrap_or_default());
        for (idx, name) in &attribute_columns {
            person
                .attributes
                .insert(name.to_string(), record.get(*idx).unwrap_or_default().to_string());
        }

        if person.validate().is_err() {
            return Err(RosterError::InvalidEmail {
                row,
                email: person.email,
            });
        }
        // History lines join two emails with the separator
        if person.email.contains(PAIR_SEPARATOR) {
            return Err(RosterError::ReservedSeparator {
                row,
                email: person.email,
            });
        }
        if !seen.insert(person.email.clone()) {
            return Err(RosterError::DuplicateEmail {
                row,
                email: person.email,
            });
        }

        roster.push(person);
    }

    Ok(roster)
}

/// Apply column aliases; a header without an alias keeps its own name
fn normalize_headers(headers: &StringRecord, aliases: &[ColumnAlias]) -> Result<Vec<String>, RosterError> {
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());

    for header in headers.iter() {
        let name = aliases
            .iter()
            .find(|alias| alias.from.trim().eq_ignore_ascii_case(header))
            .map(|alias| alias.to.clone())
            .unwrap_or_else(|| header.to_string());

        if columns.contains(&name) {
            return Err(RosterError::DuplicateColumn(name));
        }
        columns.push(name);
    }

    Ok(columns)
}

fn column_index(columns: &[String], name: &str) -> Result<usize, RosterError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| RosterError::MissingColumn(name.to_string()))
}
