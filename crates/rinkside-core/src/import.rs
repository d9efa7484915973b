//! Bulk player import from CSV.
//!
//! Coaches export rosters from all kinds of registration systems, so
//! headers are mapped heuristically: exact aliases first, then keyword
//! matches. Rows are validated individually; bad rows are reported and
//! skipped, good rows are deduplicated against the coach's existing players
//! and inserted in small batches.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Handedness, NewPlayer, Player, Position};
use crate::services::{players, tryouts};
use crate::store::Store;
use crate::utils::normalize_name;
use crate::validation;

/// Rows inserted per request
pub const IMPORT_BATCH_SIZE: usize = 10;

/// Header row of the downloadable template
pub const TEMPLATE_HEADERS: [&str; 12] = [
    "first_name",
    "last_name",
    "email",
    "phone",
    "date_of_birth",
    "position",
    "jersey_number",
    "shoots",
    "parent_name",
    "parent_email",
    "parent_phone",
    "notes",
];

const TEMPLATE_EXAMPLE: [&str; 12] = [
    "Connor",
    "Hughes",
    "connor@example.com",
    "555-123-4567",
    "2012-01-13",
    "C",
    "97",
    "L",
    "Kelly Hughes",
    "kelly@example.com",
    "555-765-4321",
    "Captain last season",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("The file has no header row")]
    EmptyFile,

    #[error("No column found for: {0}")]
    MissingColumns(String),
}

/// Player attribute a CSV column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerField {
    FirstName,
    LastName,
    /// "First Last" or "Last, First" in one column
    FullName,
    Email,
    Phone,
    DateOfBirth,
    Position,
    JerseyNumber,
    Shoots,
    ParentName,
    ParentEmail,
    ParentPhone,
    Notes,
}

impl PlayerField {
    pub const ALL: [PlayerField; 13] = [
        PlayerField::FirstName,
        PlayerField::LastName,
        PlayerField::FullName,
        PlayerField::Email,
        PlayerField::Phone,
        PlayerField::DateOfBirth,
        PlayerField::Position,
        PlayerField::JerseyNumber,
        PlayerField::Shoots,
        PlayerField::ParentName,
        PlayerField::ParentEmail,
        PlayerField::ParentPhone,
        PlayerField::Notes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlayerField::FirstName => "first name",
            PlayerField::LastName => "last name",
            PlayerField::FullName => "full name",
            PlayerField::Email => "email",
            PlayerField::Phone => "phone",
            PlayerField::DateOfBirth => "date of birth",
            PlayerField::Position => "position",
            PlayerField::JerseyNumber => "jersey number",
            PlayerField::Shoots => "shoots",
            PlayerField::ParentName => "parent name",
            PlayerField::ParentEmail => "parent email",
            PlayerField::ParentPhone => "parent phone",
            PlayerField::Notes => "notes",
        }
    }

    /// Normalized header spellings that map without guessing
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            PlayerField::FirstName => &["firstname", "first", "fname", "givenname", "playerfirstname"],
            PlayerField::LastName => &["lastname", "last", "lname", "surname", "familyname", "playerlastname"],
            PlayerField::FullName => &["name", "fullname", "playername", "player"],
            PlayerField::Email => &["email", "emailaddress", "playeremail", "mail"],
            PlayerField::Phone => &["phone", "phonenumber", "cell", "mobile", "playerphone"],
            PlayerField::DateOfBirth => &["dateofbirth", "dob", "birthdate", "birthday"],
            PlayerField::Position => &["position", "pos"],
            PlayerField::JerseyNumber => &["jerseynumber", "jersey", "number", "no", "num"],
            PlayerField::Shoots => &["shoots", "handedness", "hand", "stick"],
            PlayerField::ParentName => &["parentname", "guardianname", "parent", "guardian"],
            PlayerField::ParentEmail => &["parentemail", "guardianemail"],
            PlayerField::ParentPhone => &["parentphone", "guardianphone"],
            PlayerField::Notes => &["notes", "note", "comments"],
        }
    }
}

/// Lowercase alphanumerics only: "Player's E-mail" -> "playersemail"
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Keyword guess for a header no alias matched
fn guess_field(raw: &str) -> Option<PlayerField> {
    let h = normalize_header(raw);
    let has = |words: &[&str]| words.iter().any(|w| h.contains(w));

    if has(&["parent", "guardian", "mom", "dad", "mother", "father"]) {
        return Some(if has(&["mail"]) {
            PlayerField::ParentEmail
        } else if has(&["phone", "cell", "mobile"]) {
            PlayerField::ParentPhone
        } else {
            PlayerField::ParentName
        });
    }
    if has(&["mail"]) {
        Some(PlayerField::Email)
    } else if has(&["phone", "cell", "mobile"]) {
        Some(PlayerField::Phone)
    } else if has(&["dob", "birth"]) {
        Some(PlayerField::DateOfBirth)
    } else if has(&["first", "given"]) {
        Some(PlayerField::FirstName)
    } else if has(&["last", "surname", "family"]) {
        Some(PlayerField::LastName)
    } else if raw.contains('#') || has(&["jersey", "number"]) {
        Some(PlayerField::JerseyNumber)
    } else if has(&["pos"]) {
        Some(PlayerField::Position)
    } else if has(&["shoot", "hand"]) {
        Some(PlayerField::Shoots)
    } else if has(&["note", "comment"]) {
        Some(PlayerField::Notes)
    } else if has(&["name"]) {
        Some(PlayerField::FullName)
    } else {
        None
    }
}

/// Which column feeds which player field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: HashMap<PlayerField, usize>,
}

impl ColumnMapping {
    pub fn get(&self, field: PlayerField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Map `field` to `column`, replacing any earlier choice for either.
    pub fn set(&mut self, field: PlayerField, column: usize) {
        self.columns.retain(|_, c| *c != column);
        self.columns.insert(field, column);
    }

    pub fn clear(&mut self, field: PlayerField) {
        self.columns.remove(&field);
    }

    fn column_taken(&self, column: usize) -> bool {
        self.columns.values().any(|c| *c == column)
    }

    /// Names come from the first/last pair, else from a single name column
    fn uses_full_name(&self) -> bool {
        (self.get(PlayerField::FirstName).is_none() || self.get(PlayerField::LastName).is_none())
            && self.get(PlayerField::FullName).is_some()
    }

    pub fn missing_required(&self) -> Vec<PlayerField> {
        if self.uses_full_name() {
            return Vec::new();
        }
        [PlayerField::FirstName, PlayerField::LastName]
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    pub fn ensure_complete(&self) -> Result<(), ImportError> {
        let missing = self.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            Err(ImportError::MissingColumns(labels.join(", ")))
        }
    }
}

/// Map headers to fields: exact aliases first, then keyword guesses.
/// Each field takes at most one column and each column at most one field.
pub fn auto_map(headers: &[String]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    for field in PlayerField::ALL {
        if let Some(col) = normalized
            .iter()
            .enumerate()
            .position(|(i, h)| !mapping.column_taken(i) && field.aliases().contains(&h.as_str()))
        {
            mapping.columns.insert(field, col);
        }
    }

    for (col, raw) in headers.iter().enumerate() {
        if mapping.column_taken(col) {
            continue;
        }
        if let Some(field) = guess_field(raw) {
            if mapping.get(field).is_none() {
                mapping.columns.insert(field, col);
            }
        }
    }
    debug!(mapped = mapping.columns.len(), columns = headers.len(), "Auto-mapped CSV columns");
    mapping
}

/// One data row; `number` is 1-based and excludes the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub number: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

/// Read a CSV document. Rows may be short or long; cells are trimmed and
/// rows with no content are dropped.
pub fn parse_csv(input: &str) -> Result<CsvData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::EmptyFile.into());
    }

    // Row numbers follow the file's lines (header is line 1) so blank lines
    // skipped by the reader still count.
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", i + 1))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let number = record
            .position()
            .map(|p| p.line().saturating_sub(1) as usize)
            .unwrap_or(i + 1);
        rows.push(CsvRow {
            number,
            cells: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(CsvData { headers, rows })
}

/// Template file with one example row
pub fn template_csv() -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TEMPLATE_HEADERS)?;
    writer.write_record(TEMPLATE_EXAMPLE)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to build CSV template: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

// ===== Row parsing =====

/// `YYYY-MM-DD`, `MM/DD/YYYY` or `M/D/YY` (two-digit years below 70 are 20xx)
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let month: u32 = parts[0].parse().ok()?;
    let day: u32 = parts[1].parse().ok()?;
    let year: i32 = match parts[2].len() {
        1 | 2 => {
            let yy: i32 = parts[2].parse().ok()?;
            if yy < 70 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        4 => parts[2].parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split "Last, First" or "First Middle Last"
fn split_full_name(name: &str) -> Option<(String, String)> {
    if let Some((last, first)) = name.split_once(',') {
        let (first, last) = (first.trim(), last.trim());
        return (!first.is_empty() && !last.is_empty()).then(|| (first.to_string(), last.to_string()));
    }
    let (first, last) = name.trim().rsplit_once(char::is_whitespace)?;
    let first = first.trim();
    (!first.is_empty() && !last.is_empty()).then(|| (first.to_string(), last.to_string()))
}

/// Build a player from one row, or a message describing what is wrong
fn parse_row(row: &CsvRow, mapping: &ColumnMapping, coach_id: Uuid) -> Result<NewPlayer, String> {
    let cell = |field: PlayerField| -> Option<String> {
        mapping
            .get(field)
            .and_then(|col| row.cells.get(col))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let (first_name, last_name) = if mapping.uses_full_name() {
        let full = cell(PlayerField::FullName).ok_or("name is required")?;
        split_full_name(&full)
            .ok_or_else(|| format!("name '{}' needs both a first and last name", full))?
    } else {
        (
            cell(PlayerField::FirstName).ok_or("first name is required")?,
            cell(PlayerField::LastName).ok_or("last name is required")?,
        )
    };

    let date_of_birth = match cell(PlayerField::DateOfBirth) {
        Some(raw) => Some(parse_date(&raw).ok_or_else(|| format!("invalid date of birth '{}'", raw))?),
        None => None,
    };
    let jersey_number = match cell(PlayerField::JerseyNumber) {
        Some(raw) => {
            let n: i32 = raw
                .trim_start_matches('#')
                .parse()
                .map_err(|_| format!("invalid jersey number '{}'", raw))?;
            validation::jersey_number("jersey_number", n).map_err(|e| e.to_string())?;
            Some(n)
        }
        None => None,
    };
    let position = match cell(PlayerField::Position) {
        Some(raw) => Some(Position::parse(&raw).ok_or_else(|| format!("unknown position '{}'", raw))?),
        None => None,
    };
    let shoots = match cell(PlayerField::Shoots) {
        Some(raw) => Some(Handedness::parse(&raw).ok_or_else(|| format!("unknown handedness '{}'", raw))?),
        None => None,
    };

    let player = NewPlayer {
        coach_id: Some(coach_id),
        first_name,
        last_name,
        email: cell(PlayerField::Email).map(|e| e.to_lowercase()),
        phone: cell(PlayerField::Phone),
        date_of_birth,
        position,
        jersey_number,
        shoots,
        parent_name: cell(PlayerField::ParentName),
        parent_email: cell(PlayerField::ParentEmail).map(|e| e.to_lowercase()),
        parent_phone: cell(PlayerField::ParentPhone),
        notes: cell(PlayerField::Notes),
    };
    player.validate().map_err(|e| e.to_string())?;
    Ok(player)
}

// ===== Import =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateMatch {
    Email,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRow {
    pub row: usize,
    pub name: String,
    pub matched_on: DuplicateMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Players written, or that would be written in a dry run
    pub inserted: usize,
    /// Imported players signed up for the tryout
    pub registered: usize,
    pub duplicates: Vec<DuplicateRow>,
    pub errors: Vec<RowError>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Register every imported player for this tryout (as pending)
    pub tryout_id: Option<Uuid>,
    /// Validate and deduplicate without writing anything
    pub dry_run: bool,
}

/// Email and name keys already taken, from the database and earlier rows
#[derive(Default)]
struct SeenPlayers {
    emails: HashSet<String>,
    names: HashSet<String>,
}

impl SeenPlayers {
    fn from_existing(players: &[Player]) -> Self {
        let mut seen = Self::default();
        for p in players {
            if let Some(email) = p.normalized_email() {
                seen.emails.insert(email);
            }
            seen.names.insert(normalize_name(&p.first_name, &p.last_name));
        }
        seen
    }

    /// A matching email wins; otherwise the normalized name is compared,
    /// whether or not the row carries an email.
    fn check(&self, player: &NewPlayer) -> Option<DuplicateMatch> {
        if player
            .normalized_email()
            .is_some_and(|email| self.emails.contains(&email))
        {
            return Some(DuplicateMatch::Email);
        }
        self.names
            .contains(&normalize_name(&player.first_name, &player.last_name))
            .then_some(DuplicateMatch::Name)
    }

    fn remember(&mut self, player: &NewPlayer) {
        if let Some(email) = player.normalized_email() {
            self.emails.insert(email);
        }
        self.names.insert(normalize_name(&player.first_name, &player.last_name));
    }
}

/// Import rows as players owned by `coach_id`.
///
/// A failed batch records its rows as errors and the import carries on with
/// the next batch.
pub async fn import_players<S: Store>(
    store: &S,
    coach_id: Uuid,
    data: &CsvData,
    mapping: &ColumnMapping,
    options: ImportOptions,
) -> Result<ImportReport> {
    mapping.ensure_complete()?;
    if let Some(tryout_id) = options.tryout_id {
        let tryout = tryouts::get_tryout(store, tryout_id).await?;
        if tryout.status.is_closed() {
            return Err(tryouts::TryoutError::Closed(tryout.status).into());
        }
    }

    let existing = players::players_for_coach(store, coach_id).await?;
    let mut seen = SeenPlayers::from_existing(&existing);
    let mut report = ImportReport {
        dry_run: options.dry_run,
        ..Default::default()
    };

    let mut accepted: Vec<(usize, NewPlayer)> = Vec::new();
    for row in &data.rows {
        match parse_row(row, mapping, coach_id) {
            Err(message) => report.errors.push(RowError { row: row.number, message }),
            Ok(player) => match seen.check(&player) {
                Some(matched_on) => report.duplicates.push(DuplicateRow {
                    row: row.number,
                    name: format!("{} {}", player.first_name, player.last_name),
                    matched_on,
                }),
                None => {
                    seen.remember(&player);
                    accepted.push((row.number, player));
                }
            },
        }
    }

    if options.dry_run {
        report.inserted = accepted.len();
        return Ok(report);
    }

    for batch in accepted.chunks(IMPORT_BATCH_SIZE) {
        let rows: Vec<NewPlayer> = batch.iter().map(|(_, p)| p.clone()).collect();
        let inserted: Vec<Player> = match store.insert(&rows).await {
            Ok(players) => players,
            Err(e) => {
                warn!(rows = batch.len(), error = %e, "Import batch failed");
                for (row, _) in batch {
                    report.errors.push(RowError {
                        row: *row,
                        message: format!("insert failed: {}", e),
                    });
                }
                continue;
            }
        };
        report.inserted += inserted.len();

        if let Some(tryout_id) = options.tryout_id {
            for ((row, _), player) in batch.iter().zip(&inserted) {
                match tryouts::register_player(store, tryout_id, player.id, player.jersey_number).await {
                    Ok(_) => report.registered += 1,
                    Err(e) => report.errors.push(RowError {
                        row: *row,
                        message: format!("imported but not registered for tryout: {}", e),
                    }),
                }
            }
        }
    }
    report.errors.sort_by_key(|e| e.row);

    info!(
        inserted = report.inserted,
        duplicates = report.duplicates.len(),
        errors = report.errors.len(),
        "CSV import finished"
    );
    Ok(report)
}
