//! Student roster import from `roll,name` lines.
//!
//! Rows are upserted by roll number: new roll numbers become students,
//! known ones get their name refreshed. Emails are never touched.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};

use crate::application::database::DbConn;
use crate::application::error::Result;
use crate::models::prelude::*;
use crate::models::student;

/// Rows per statement, well under SQLite's bound-parameter ceiling.
const BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub roll_number: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// One entry per roll number; a repeated roll number keeps its last name.
    pub entries: Vec<RosterEntry>,
    /// 1-based numbers of lines that were not `roll,name`.
    pub malformed_lines: Vec<usize>,
}

impl Roster {
    /// Blank lines are ignored. The first comma splits roll number from
    /// name, so names may contain commas.
    pub fn parse(text: &str) -> Self {
        let mut roster = Roster::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((roll, name)) = line.split_once(',') else {
                roster.malformed_lines.push(index + 1);
                continue;
            };
            let (roll, name) = (roll.trim(), name.trim());
            if roll.is_empty() || name.is_empty() {
                roster.malformed_lines.push(index + 1);
                continue;
            }

            let entry = RosterEntry {
                roll_number: roll.to_string(),
                name: name.to_string(),
            };
            match positions.get(roll) {
                Some(&at) => roster.entries[at] = entry,
                None => {
                    positions.insert(roll.to_string(), roster.entries.len());
                    roster.entries.push(entry);
                }
            }
        }

        roster
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub processed: usize,
    pub skipped: usize,
    pub upserted: usize,
    pub modified: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Seeded/updated students: {}", self.processed)?;
        writeln!(f, "Skipped malformed lines: {}", self.skipped)?;
        write!(f, "Upserts: {} Modified: {}", self.upserted, self.modified)
    }
}

pub struct RosterImporter {
    db: DbConn,
}

impl RosterImporter {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Count what `roster` would change without writing anything.
    pub async fn plan(&self, roster: &Roster) -> Result<ImportSummary> {
        let known = self.known_names(&self.db, roster).await?;
        Ok(summarize(roster, &known))
    }

    pub async fn import(&self, roster: &Roster) -> Result<ImportSummary> {
        if roster.entries.is_empty() {
            return Ok(summarize(roster, &HashMap::new()));
        }

        let txn = self.db.begin().await?;
        let known = self.known_names(&txn, roster).await?;
        let summary = summarize(roster, &known);

        let now = Utc::now();
        for batch in roster.entries.chunks(BATCH_SIZE) {
            let rows = batch.iter().map(|entry| student::ActiveModel {
                name: Set(entry.name.clone()),
                roll_number: Set(Some(entry.roll_number.clone())),
                created_at: Set(now),
                ..Default::default()
            });
            Student::insert_many(rows)
                .on_conflict(
                    OnConflict::column(student::Column::RollNumber)
                        .update_column(student::Column::Name)
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        tracing::info!(
            upserted = summary.upserted,
            modified = summary.modified,
            skipped = summary.skipped,
            "Roster imported"
        );
        Ok(summary)
    }

    /// Current names of the roster's roll numbers that already exist.
    async fn known_names<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        roster: &Roster,
    ) -> Result<HashMap<String, String>> {
        let mut known = HashMap::new();
        for batch in roster.entries.chunks(BATCH_SIZE) {
            let rolls = batch.iter().map(|e| e.roll_number.clone());
            let students = Student::find()
                .filter(student::Column::RollNumber.is_in(rolls))
                .all(conn)
                .await?;
            for s in students {
                if let Some(roll) = s.roll_number {
                    known.insert(roll, s.name);
                }
            }
        }
        Ok(known)
    }
}

fn summarize(roster: &Roster, known: &HashMap<String, String>) -> ImportSummary {
    let mut summary = ImportSummary {
        processed: roster.entries.len(),
        skipped: roster.malformed_lines.len(),
        ..Default::default()
    };
    for entry in &roster.entries {
        match known.get(&entry.roll_number) {
            None => summary.upserted += 1,
            Some(name) if *name != entry.name => summary.modified += 1,
            Some(_) => {}
        }
    }
    summary
}
