//! Topic voting board.
//!
//! Topics are rows of the `topics` sheet: `[id, name, topic, direction, votes]`.
//! The generated id, not the row position, identifies a topic, so a vote
//! always lands on the topic the voter saw even if rows move.

use crate::error::TopicError;
use crate::store::{Sheet, Workbook};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

const ID_COL: usize = 0;
const NAME_COL: usize = 1;
const TOPIC_COL: usize = 2;
const DIRECTION_COL: usize = 3;
const VOTES_COL: usize = 4;

/// Vote count every new topic starts with.
pub const INITIAL_VOTES: u32 = 1;

/// Whether the submitter wants to hear about the topic or talk about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "want to hear")]
    WantToHear,
    #[serde(rename = "want to talk")]
    WantToTalk,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::WantToHear => "want to hear",
            Direction::WantToTalk => "want to talk",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "want to hear" => Ok(Direction::WantToHear),
            "want to talk" => Ok(Direction::WantToTalk),
            other => Err(format!("unknown direction `{}`", other)),
        }
    }
}

/// A topic as stored in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEntry {
    pub id: Uuid,
    pub name: String,
    pub topic: String,
    pub direction: Direction,
    pub votes: u32,
}

/// A topic as shown on the board. The submitter's name is never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicTopic {
    pub id: Uuid,
    pub topic: String,
    pub direction: Direction,
    pub votes: u32,
}

impl From<&TopicEntry> for PublicTopic {
    fn from(entry: &TopicEntry) -> Self {
        Self {
            id: entry.id,
            topic: entry.topic.clone(),
            direction: entry.direction,
            votes: entry.votes,
        }
    }
}

impl TopicEntry {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.topic.clone(),
            self.direction.to_string(),
            self.votes.to_string(),
        ]
    }

    pub fn from_row(row: &[String]) -> Result<Self, String> {
        let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

        Ok(Self {
            id: Uuid::parse_str(cell(ID_COL).trim())
                .map_err(|e| format!("bad id `{}`: {}", cell(ID_COL), e))?,
            name: cell(NAME_COL).to_string(),
            topic: cell(TOPIC_COL).to_string(),
            direction: cell(DIRECTION_COL).parse()?,
            votes: parse_votes(cell(VOTES_COL))?,
        })
    }
}

fn parse_votes(cell: &str) -> Result<u32, String> {
    cell.trim()
        .parse()
        .map_err(|e| format!("bad vote count `{}`: {}", cell, e))
}

/// A topic submission from the board form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTopic {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub topic: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicOutcome {
    pub topic: PublicTopic,
    /// False when the workbook is unavailable and the write was skipped
    pub persisted: bool,
}

/// Validates a submission and appends it with one vote.
pub async fn submit_topic(workbook: &Workbook, new: NewTopic) -> Result<TopicOutcome, TopicError> {
    let name = new.name.trim();
    let topic = new.topic.trim();

    if name.is_empty() {
        return Err(TopicError::MissingField { field: "name" });
    }
    if topic.is_empty() {
        return Err(TopicError::MissingField { field: "topic" });
    }

    let entry = TopicEntry {
        id: Uuid::new_v4(),
        name: name.to_string(),
        topic: topic.to_string(),
        direction: new.direction,
        votes: INITIAL_VOTES,
    };

    let row = workbook.append_row(Sheet::Topics, entry.to_row()).await?;
    info!(id = %entry.id, direction = %entry.direction, "Added topic");

    Ok(TopicOutcome {
        topic: PublicTopic::from(&entry),
        persisted: row.is_some(),
    })
}

/// All topics in submission order. Rows that cannot be read are skipped.
pub async fn list_topics(workbook: &Workbook) -> Result<Vec<TopicEntry>, TopicError> {
    let rows = workbook.read_all_rows(Sheet::Topics).await?;

    Ok(rows
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(position, row)| match TopicEntry::from_row(row) {
            Ok(entry) => Some(entry),
            Err(message) => {
                warn!(row = position, "Skipping unreadable topic row: {}", message);
                None
            }
        })
        .collect())
}

/// Adds one vote to the topic with the given id.
///
/// The count is read and written back with compare-and-set while holding the
/// sheet lock. If another process changed the count in between, the vote is
/// re-read and retried, at most `retry_limit` times in total.
pub async fn vote(workbook: &Workbook, id: Uuid, retry_limit: u32) -> Result<TopicEntry, TopicError> {
    let attempts = retry_limit.max(1);
    let _guard = workbook.lock_sheet(Sheet::Topics).await;

    for attempt in 1..=attempts {
        let rows = workbook.read_all_rows(Sheet::Topics).await?;

        let (position, row) = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| {
                row.get(ID_COL)
                    .and_then(|cell| Uuid::parse_str(cell.trim()).ok())
                    == Some(id)
            })
            .ok_or(TopicError::NotFound { id })?;

        let mut entry = TopicEntry::from_row(row).map_err(|message| TopicError::CorruptRow {
            row: position,
            message,
        })?;
        let current = row.get(VOTES_COL).cloned().unwrap_or_default();
        let next = entry.votes.saturating_add(1);

        let swapped = workbook
            .compare_and_set_cell(Sheet::Topics, position, VOTES_COL, current, next.to_string())
            .await?;

        if swapped {
            entry.votes = next;
            info!(id = %id, votes = next, "Recorded vote");
            return Ok(entry);
        }

        warn!(id = %id, attempt, "Vote count changed underneath us, retrying");
    }

    Err(TopicError::Contended { id, attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryWorkbook, SheetStore, SqliteWorkbook, StoreError};
    use std::sync::Arc;

    fn workbook() -> Workbook {
        Workbook::new(Arc::new(MemoryWorkbook::new())).unwrap()
    }

    fn new_topic(name: &str, topic: &str) -> NewTopic {
        NewTopic {
            name: name.to_string(),
            topic: topic.to_string(),
            direction: Direction::WantToTalk,
        }
    }

    #[tokio::test]
    async fn test_submission_appends_one_row_with_one_vote() {
        let workbook = workbook();
        let outcome = submit_topic(&workbook, new_topic("Ken", " Rust async ")).await.unwrap();

        assert!(outcome.persisted);
        assert_eq!(outcome.topic.votes, 1);
        assert_eq!(outcome.topic.topic, "Rust async");

        let topics = list_topics(&workbook).await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, outcome.topic.id);
        assert_eq!(topics[0].name, "Ken");
        assert_eq!(topics[0].votes, 1);
    }

    #[tokio::test]
    async fn test_missing_fields_leave_board_unchanged() {
        let workbook = workbook();

        let err = submit_topic(&workbook, new_topic("", "topic")).await.unwrap_err();
        assert!(matches!(err, TopicError::MissingField { field: "name" }));

        let err = submit_topic(&workbook, new_topic("Ken", "   ")).await.unwrap_err();
        assert!(matches!(err, TopicError::MissingField { field: "topic" }));

        assert!(list_topics(&workbook).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vote_increments_only_target() {
        let workbook = workbook();
        let a = submit_topic(&workbook, new_topic("a", "first")).await.unwrap().topic;
        let b = submit_topic(&workbook, new_topic("b", "second")).await.unwrap().topic;
        let c = submit_topic(&workbook, new_topic("c", "third")).await.unwrap().topic;

        let voted = vote(&workbook, b.id, 5).await.unwrap();
        assert_eq!(voted.votes, 2);

        let votes: Vec<(Uuid, u32)> = list_topics(&workbook)
            .await
            .unwrap()
            .iter()
            .map(|t| (t.id, t.votes))
            .collect();
        assert_eq!(votes, vec![(a.id, 1), (b.id, 2), (c.id, 1)]);
    }

    #[tokio::test]
    async fn test_vote_on_unknown_topic() {
        let workbook = workbook();
        let id = Uuid::new_v4();
        let err = vote(&workbook, id, 5).await.unwrap_err();
        assert!(matches!(err, TopicError::NotFound { id: missing } if missing == id));
    }

    #[tokio::test]
    async fn test_vote_on_corrupt_count() {
        let backend = Arc::new(MemoryWorkbook::new());
        let workbook = Workbook::new(backend.clone()).unwrap();
        let topic = submit_topic(&workbook, new_topic("a", "b")).await.unwrap().topic;
        backend.update_cell(Sheet::Topics, 1, VOTES_COL, "many").unwrap();

        let err = vote(&workbook, topic.id, 5).await.unwrap_err();
        assert!(matches!(err, TopicError::CorruptRow { row: 1, .. }));
    }

    #[tokio::test]
    async fn test_concurrent_votes_are_not_lost() {
        let backend = Arc::new(SqliteWorkbook::open_in_memory().unwrap());
        let workbook = Arc::new(Workbook::new(backend).unwrap());
        let id = submit_topic(&workbook, new_topic("a", "b")).await.unwrap().topic.id;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let workbook = workbook.clone();
                tokio::spawn(async move { vote(&workbook, id, 5).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let topics = list_topics(&workbook).await.unwrap();
        assert_eq!(topics[0].votes, 21);
    }

    /// A store where some other writer always changes the cell first.
    struct AlwaysStale(MemoryWorkbook);

    impl SheetStore for AlwaysStale {
        fn append_row(&self, sheet: Sheet, values: &[String]) -> Result<usize, StoreError> {
            self.0.append_row(sheet, values)
        }

        fn read_all_rows(&self, sheet: Sheet) -> Result<Vec<Vec<String>>, StoreError> {
            self.0.read_all_rows(sheet)
        }

        fn update_cell(
            &self,
            sheet: Sheet,
            row: usize,
            col: usize,
            value: &str,
        ) -> Result<(), StoreError> {
            self.0.update_cell(sheet, row, col, value)
        }

        fn compare_and_set_cell(
            &self,
            _sheet: Sheet,
            _row: usize,
            _col: usize,
            _expected: &str,
            _value: &str,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_vote_gives_up_after_retry_limit() {
        let workbook = Workbook::new(Arc::new(AlwaysStale(MemoryWorkbook::new()))).unwrap();
        let id = submit_topic(&workbook, new_topic("a", "b")).await.unwrap().topic.id;

        let err = vote(&workbook, id, 3).await.unwrap_err();
        assert!(matches!(err, TopicError::Contended { id: contended, attempts: 3 } if contended == id));

        let err = vote(&workbook, id, 0).await.unwrap_err();
        assert!(matches!(err, TopicError::Contended { attempts: 1, .. }));

        let topics = list_topics(&workbook).await.unwrap();
        assert_eq!(topics[0].votes, INITIAL_VOTES);
    }

    #[tokio::test]
    async fn test_unreadable_rows_are_skipped_in_listing() {
        let backend = Arc::new(MemoryWorkbook::new());
        let workbook = Workbook::new(backend.clone()).unwrap();
        backend
            .append_row(Sheet::Topics, &["not-a-uuid".to_string()])
            .unwrap();
        submit_topic(&workbook, new_topic("a", "b")).await.unwrap();

        assert_eq!(list_topics(&workbook).await.unwrap().len(), 1);
    }

    #[test]
    fn test_direction_round_trips_through_serde() {
        let parsed: Direction = serde_json::from_str("\"want to hear\"").unwrap();
        assert_eq!(parsed, Direction::WantToHear);
        assert_eq!("want to talk".parse::<Direction>(), Ok(Direction::WantToTalk));
        assert!("want to sing".parse::<Direction>().is_err());
    }
}
