//! Search, filter and multi-key sort over a projected roster.
//!
//! The pipeline order is fixed: search text, then status filter, then the
//! module column filter, then the sort. Every call recomputes from the full
//! roster so the output depends only on `(rows, state)`.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::models::{RosterRow, StatusCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    RiskScore,
    StudentNumber,
    FullName,
    Module,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: Direction,
    /// 1 is the most significant key.
    pub priority: u32,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "risk_score" | "risk" => Ok(SortColumn::RiskScore),
            "student_number" | "number" | "id" => Ok(SortColumn::StudentNumber),
            "full_name" | "name" => Ok(SortColumn::FullName),
            "module" => Ok(SortColumn::Module),
            "status" => Ok(SortColumn::Status),
            other => Err(format!("unknown sort column '{other}'")),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Parses `column[:direction]` specs; priority follows argument order.
pub fn parse_sort_keys(specs: &[String]) -> Result<Vec<SortKey>, String> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| -> Result<SortKey, String> {
            let (column, direction): (SortColumn, Direction) = match spec.split_once(':') {
                Some((column, direction)) => (column.parse()?, direction.parse()?),
                None => (spec.parse()?, Direction::Ascending),
            };
            Ok(SortKey {
                column,
                direction,
                priority: index as u32 + 1,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub search_term: String,
    pub status_filter: Option<StatusCategory>,
    pub module_filter: BTreeSet<String>,
    pub sort_keys: Vec<SortKey>,
}

impl ViewState {
    /// Selecting the active status again clears the filter.
    pub fn toggle_status(&mut self, status: StatusCategory) {
        if self.status_filter == Some(status) {
            self.status_filter = None;
        } else {
            self.status_filter = Some(status);
        }
    }

    /// Adds or replaces the key for `column` at the given priority.
    pub fn set_sort(&mut self, column: SortColumn, direction: Direction, priority: u32) {
        self.sort_keys.retain(|key| key.column != column);
        self.sort_keys.push(SortKey {
            column,
            direction,
            priority,
        });
    }
}

pub fn matches_search(row: &RosterRow, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    row.full_name.to_lowercase().contains(&needle)
        || row.student_number.to_string().contains(&needle)
        || row.module.to_lowercase().contains(&needle)
}

fn compare_column(a: &RosterRow, b: &RosterRow, column: SortColumn) -> Ordering {
    match column {
        SortColumn::RiskScore => a.risk_score.total_cmp(&b.risk_score),
        SortColumn::StudentNumber => a.student_number.cmp(&b.student_number),
        SortColumn::FullName => a.full_name.cmp(&b.full_name),
        SortColumn::Module => a.module.cmp(&b.module),
        SortColumn::Status => a.status.label().cmp(b.status.label()),
    }
}

/// Stable sort by the composite key; priority 1 dominates.
pub fn sort_rows(rows: &mut [RosterRow], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    let mut ordered = keys.to_vec();
    ordered.sort_by_key(|key| key.priority);

    rows.sort_by(|a, b| {
        ordered
            .iter()
            .map(|key| {
                let ordering = compare_column(a, b, key.column);
                match key.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

pub fn view(rows: &[RosterRow], state: &ViewState) -> Vec<RosterRow> {
    let mut visible: Vec<RosterRow> = rows
        .iter()
        .filter(|row| matches_search(row, &state.search_term))
        .filter(|row| state.status_filter.is_none_or(|status| row.status == status))
        .filter(|row| state.module_filter.is_empty() || state.module_filter.contains(&row.module))
        .cloned()
        .collect();

    sort_rows(&mut visible, &state.sort_keys);
    visible
}

/// One page of rows, `page` counted from 1.
pub fn paginate(rows: &[RosterRow], page: usize, page_size: usize) -> &[RosterRow] {
    if page_size == 0 {
        return rows;
    }
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= rows.len() {
        return &[];
    }
    let end = (start + page_size).min(rows.len());
    &rows[start..end]
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{self, tests::record, tests::sample_roster};

    fn names(rows: &[RosterRow]) -> Vec<String> {
        rows.iter().map(|row| row.full_name.clone()).collect()
    }

    #[test]
    fn search_matches_module_case_insensitively() {
        let rows = roster::project(&sample_roster());
        let state = ViewState {
            search_term: "cs162".to_string(),
            ..ViewState::default()
        };
        let visible = view(&rows, &state);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].student_number, 3);
    }

    #[test]
    fn search_matches_name_or_number() {
        let rows = roster::project(&[
            record(20012345, "John Doe", "CS161", 25.0),
            record(20054321, "Jane Smith", "CS161", 82.0),
        ]);
        let by_name = ViewState {
            search_term: "SMITH".to_string(),
            ..ViewState::default()
        };
        assert_eq!(names(&view(&rows, &by_name)), vec!["Jane Smith"]);

        let by_number = ViewState {
            search_term: "2345".to_string(),
            ..ViewState::default()
        };
        assert_eq!(names(&view(&rows, &by_number)), vec!["John Doe"]);
    }

    #[test]
    fn blank_search_passes_everything() {
        let rows = roster::project(&sample_roster());
        let state = ViewState {
            search_term: "   ".to_string(),
            ..ViewState::default()
        };
        assert_eq!(view(&rows, &state), rows);
    }

    #[test]
    fn status_toggle_on_then_off_restores_rows() {
        let rows = roster::project(&sample_roster());
        let mut state = ViewState {
            search_term: "cs161".to_string(),
            ..ViewState::default()
        };
        let before = view(&rows, &state);

        state.toggle_status(StatusCategory::AtRisk);
        assert_eq!(names(&view(&rows, &state)), vec!["Ann"]);

        state.toggle_status(StatusCategory::AtRisk);
        assert_eq!(state.status_filter, None);
        assert_eq!(view(&rows, &state), before);
    }

    #[test]
    fn toggling_a_different_status_switches_filter() {
        let mut state = ViewState::default();
        state.toggle_status(StatusCategory::AtRisk);
        state.toggle_status(StatusCategory::OnTrack);
        assert_eq!(state.status_filter, Some(StatusCategory::OnTrack));
    }

    #[test]
    fn module_filter_keeps_selected_codes() {
        let rows = roster::project(&sample_roster());
        let mut state = ViewState::default();
        state.module_filter.insert("CS162".to_string());
        assert_eq!(names(&view(&rows, &state)), vec!["Cy"]);

        state.module_filter.clear();
        assert_eq!(view(&rows, &state).len(), 3);
    }

    #[test]
    fn view_is_idempotent() {
        let rows = roster::project(&sample_roster());
        let mut state = ViewState {
            search_term: "cs".to_string(),
            ..ViewState::default()
        };
        state.set_sort(SortColumn::RiskScore, Direction::Descending, 1);
        let first = view(&rows, &state);
        let second = view(&rows, &state);
        assert_eq!(first, second);
        assert_eq!(view(&first, &state), first);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let rows = roster::project(&[
            record(1, "A", "CS161", 1.0),
            record(2, "B", "CS161", 1.0),
            record(3, "C", "CS161", 2.0),
        ]);
        let mut state = ViewState::default();
        state.set_sort(SortColumn::RiskScore, Direction::Ascending, 1);
        assert_eq!(names(&view(&rows, &state)), vec!["A", "B", "C"]);

        state.set_sort(SortColumn::RiskScore, Direction::Descending, 1);
        assert_eq!(names(&view(&rows, &state)), vec!["C", "A", "B"]);
    }

    #[test]
    fn primary_key_dominates_secondary() {
        let rows = roster::project(&[
            record(1, "Zed", "CS162", 50.0),
            record(2, "Amy", "CS161", 90.0),
            record(3, "Bea", "CS162", 10.0),
            record(4, "Cal", "CS161", 20.0),
        ]);
        let keys = parse_sort_keys(&["module".to_string(), "risk_score:desc".to_string()])
            .expect("valid sort specs");
        let state = ViewState {
            sort_keys: keys,
            ..ViewState::default()
        };
        assert_eq!(names(&view(&rows, &state)), vec!["Amy", "Cal", "Zed", "Bea"]);
    }

    #[test]
    fn priority_order_not_insertion_order_decides() {
        let rows = roster::project(&[
            record(1, "Zed", "CS162", 50.0),
            record(2, "Amy", "CS161", 50.0),
        ]);
        let mut state = ViewState::default();
        state.set_sort(SortColumn::FullName, Direction::Descending, 2);
        state.set_sort(SortColumn::RiskScore, Direction::Ascending, 1);
        assert_eq!(names(&view(&rows, &state)), vec!["Zed", "Amy"]);
    }

    #[test]
    fn status_sorts_by_label() {
        let rows = roster::project(&sample_roster());
        let mut state = ViewState::default();
        state.set_sort(SortColumn::Status, Direction::Ascending, 1);
        let statuses: Vec<StatusCategory> =
            view(&rows, &state).iter().map(|row| row.status).collect();
        assert_eq!(
            statuses,
            vec![
                StatusCategory::AtRisk,
                StatusCategory::NewlyAtRisk,
                StatusCategory::OnTrack
            ]
        );
    }

    #[test]
    fn rejects_unknown_sort_specs() {
        assert!(parse_sort_keys(&["height".to_string()]).is_err());
        assert!(parse_sort_keys(&["module:sideways".to_string()]).is_err());
    }

    #[test]
    fn paginates_in_fixed_pages() {
        let rows = roster::project(&sample_roster());
        assert_eq!(paginate(&rows, 1, 2).len(), 2);
        assert_eq!(paginate(&rows, 2, 2).len(), 1);
        assert!(paginate(&rows, 3, 2).is_empty());
        assert_eq!(page_count(rows.len(), 2), 2);
        assert_eq!(page_count(0, 5), 1);
    }
}
