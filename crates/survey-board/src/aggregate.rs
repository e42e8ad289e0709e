//! Frequency tables over the response log.
use crate::slots::{decode_slots, Day, Hour, SlotId, DAY_COUNT, HOUR_COUNT};
use serde::Serialize;

/// How many slots the summary view ranks.
pub const TOP_SLOTS: usize = 3;

/// Per-slot response counts, recomputed from the full response log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFrequency {
    /// Indexed by `[hour.index()][day.index()]`.
    counts: [[u32; DAY_COUNT]; HOUR_COUNT],
    /// Number of responses read.
    pub respondents: usize,
    /// Tokens in the log that did not name a grid slot.
    pub dropped_tokens: usize,
}

/// A slot together with its position in the popularity ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedSlot {
    pub rank: usize,
    pub slot: SlotId,
    pub count: u32,
}

/// Everything a frontend needs to draw the annotated heatmap.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub days: Vec<&'static str>,
    pub hours: Vec<String>,
    /// One row per hour, one column per day.
    pub counts: Vec<Vec<u32>>,
    /// `count / max_count`, or 0 everywhere when nothing was selected.
    pub intensity: Vec<Vec<f32>>,
    pub max_count: u32,
}

impl SlotFrequency {
    pub fn empty() -> Self {
        Self {
            counts: [[0; DAY_COUNT]; HOUR_COUNT],
            respondents: 0,
            dropped_tokens: 0,
        }
    }

    /// Tallies selection cells, one cell per response.
    ///
    /// A slot is counted at most once per response, so the count of a slot is
    /// the number of responses that contain it.
    pub fn from_selections<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut frequency = Self::empty();

        for cell in cells {
            let decoded = decode_slots(cell);
            for slot in decoded.slots {
                frequency.counts[slot.hour.index()][slot.day.index()] += 1;
            }
            frequency.dropped_tokens += decoded.dropped;
            frequency.respondents += 1;
        }

        frequency
    }

    pub fn get(&self, hour: Hour, day: Day) -> u32 {
        self.counts[hour.index()][day.index()]
    }

    pub fn count(&self, slot: SlotId) -> u32 {
        self.get(slot.hour, slot.day)
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// The `n` most selected slots, highest count first.
    ///
    /// Slots nobody selected are never ranked. Equal counts are ordered by
    /// [`SlotId`] ordering (day in grid order, then earlier hour first).
    pub fn top(&self, n: usize) -> Vec<RankedSlot> {
        let mut selected: Vec<(SlotId, u32)> = SlotId::all()
            .map(|slot| (slot, self.count(slot)))
            .filter(|&(_, count)| count > 0)
            .collect();

        selected.sort_by(|(a_slot, a_count), (b_slot, b_count)| {
            b_count.cmp(a_count).then_with(|| a_slot.cmp(b_slot))
        });

        selected
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, (slot, count))| RankedSlot {
                rank: i + 1,
                slot,
                count,
            })
            .collect()
    }

    pub fn heatmap(&self) -> HeatmapView {
        let max_count = self.max_count();
        let counts: Vec<Vec<u32>> = self.counts.iter().map(|row| row.to_vec()).collect();
        let intensity = counts
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&c| {
                        if max_count == 0 {
                            0.0
                        } else {
                            c as f32 / max_count as f32
                        }
                    })
                    .collect()
            })
            .collect();

        HeatmapView {
            days: Day::ALL.iter().map(|d| d.as_str()).collect(),
            hours: Hour::all().map(|h| h.to_string()).collect(),
            counts,
            intensity,
            max_count,
        }
    }
}

impl Default for SlotFrequency {
    fn default() -> Self {
        Self::empty()
    }
}
