//! Availability survey: submitting responses and summarizing the log.

use crate::aggregate::{HeatmapView, RankedSlot, SlotFrequency, TOP_SLOTS};
use crate::error::SurveyError;
use crate::slots::{decode_slots, encode_slots, Day, Hour, SlotId, SlotSet};
use crate::store::{data_rows, Sheet, Workbook};
use serde::{Deserialize, Serialize};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column of the encoded slot selection in a response row.
const SELECTION_COL: usize = 3;

/// A submission as it arrives from the form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    /// Slot keys such as `Sat-09:00`
    #[serde(default)]
    pub slots: Vec<String>,
}

/// One row of the response log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyResponse {
    pub timestamp: String,
    pub name: String,
    pub feedback: String,
    pub selected_slots: SlotSet,
}

impl SurveyResponse {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.name.clone(),
            self.feedback.clone(),
            encode_slots(&self.selected_slots),
        ]
    }

    /// Reads a stored row back. Missing cells are treated as empty and
    /// unknown slot tokens are skipped.
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();

        Self {
            timestamp: cell(0),
            name: cell(1),
            feedback: cell(2),
            selected_slots: decode_slots(&cell(SELECTION_COL)).slots,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub response: SurveyResponse,
    /// False when the workbook is unavailable and the write was skipped
    pub persisted: bool,
    pub row: Option<usize>,
}

/// Aggregated view of the whole response log.
#[derive(Debug, Clone, Serialize)]
pub struct SurveySummary {
    pub respondents: usize,
    pub heatmap: HeatmapView,
    pub top: Vec<RankedSlot>,
    pub dropped_tokens: usize,
}

impl From<&SlotFrequency> for SurveySummary {
    fn from(frequency: &SlotFrequency) -> Self {
        Self {
            respondents: frequency.respondents,
            heatmap: frequency.heatmap(),
            top: frequency.top(TOP_SLOTS),
            dropped_tokens: frequency.dropped_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayColumn {
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourRow {
    pub key: String,
    pub label: String,
    /// Slot keys of this row, one per day column
    pub slots: Vec<SlotId>,
}

/// The checkbox grid, for rendering the form either as a 4-column grid or
/// as a single-column list on narrow layouts.
#[derive(Debug, Clone, Serialize)]
pub struct GridDefinition {
    pub days: Vec<DayColumn>,
    pub hours: Vec<HourRow>,
}

pub fn grid() -> GridDefinition {
    GridDefinition {
        days: Day::ALL
            .into_iter()
            .map(|day| DayColumn {
                key: day.as_str(),
                label: day.label(),
            })
            .collect(),
        hours: Hour::all()
            .map(|hour| HourRow {
                key: hour.to_string(),
                label: hour.label(),
                slots: Day::ALL
                    .into_iter()
                    .map(|day| SlotId::new(day, hour))
                    .collect(),
            })
            .collect(),
    }
}

/// Validates the checked slot keys of a submission.
pub fn parse_selection(keys: &[String]) -> Result<SlotSet, SurveyError> {
    if keys.iter().all(|k| k.trim().is_empty()) {
        return Err(SurveyError::NoSlotsSelected);
    }

    keys.iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| k.parse::<SlotId>().map_err(SurveyError::from))
        .collect()
}

/// Validates a submission and appends it to the response log.
pub async fn submit_response(
    workbook: &Workbook,
    submission: NewResponse,
) -> Result<SubmitOutcome, SurveyError> {
    let selected_slots = parse_selection(&submission.slots)?;

    let response = SurveyResponse {
        timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        name: submission.name.unwrap_or_default().trim().to_string(),
        feedback: submission.feedback.unwrap_or_default().trim().to_string(),
        selected_slots,
    };

    let row = workbook
        .append_row(Sheet::Responses, response.to_row())
        .await?;

    info!(
        slots = response.selected_slots.len(),
        persisted = row.is_some(),
        "Recorded survey response"
    );

    Ok(SubmitOutcome {
        response,
        persisted: row.is_some(),
        row,
    })
}

/// Reads the full response log and recomputes the frequency table.
pub async fn load_frequency(workbook: &Workbook) -> Result<SlotFrequency, SurveyError> {
    let rows = workbook.read_all_rows(Sheet::Responses).await?;

    let frequency = SlotFrequency::from_selections(
        data_rows(&rows)
            .iter()
            .map(|row| row.get(SELECTION_COL).map(String::as_str).unwrap_or("")),
    );

    if frequency.dropped_tokens > 0 {
        info!(
            dropped = frequency.dropped_tokens,
            "Response log contains tokens outside the slot grid"
        );
    }

    Ok(frequency)
}

pub async fn load_summary(workbook: &Workbook) -> Result<SurveySummary, SurveyError> {
    let frequency = load_frequency(workbook).await?;
    Ok(SurveySummary::from(&frequency))
}
