use std::collections::{BTreeMap, HashMap};

use crate::models::{
    Aggregate, Module, ModuleFilterOption, RosterRow, StatusCategory, StudentRecord,
};
use crate::risk;

pub fn row_key(student_id: i64, module: &str) -> String {
    format!("{student_id}-{module}")
}

/// Builds a fresh roster. A student enrolled in several modules yields one
/// row per module. Records sharing a `(student_id, module)` key collapse to
/// the last one seen, kept at the first one's position.
pub fn project(records: &[StudentRecord]) -> Vec<RosterRow> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<RosterRow> = Vec::with_capacity(records.len());

    for record in records {
        let row = RosterRow {
            key: row_key(record.student_id, &record.module),
            student_number: record.student_id,
            full_name: record.student_name.clone(),
            module: record.module.clone(),
            risk_score: record.risk_score,
            status: risk::classify(record.risk_score),
        };

        match positions.get(&row.key) {
            Some(&index) => {
                tracing::debug!(key = %row.key, "duplicate roster key, keeping latest record");
                rows[index] = row;
            }
            None => {
                positions.insert(row.key.clone(), rows.len());
                rows.push(row);
            }
        }
    }

    rows
}

pub fn aggregate(rows: &[RosterRow]) -> Aggregate {
    let mut counts = Aggregate::default();
    for row in rows {
        match row.status {
            StatusCategory::AtRisk => counts.at_risk_count += 1,
            StatusCategory::NewlyAtRisk => counts.newly_at_risk_count += 1,
            StatusCategory::Improving => counts.improving_count += 1,
            StatusCategory::OnTrack => {}
        }
    }
    counts
}

/// Count of rows for every category, On Track included.
pub fn status_mix(rows: &[RosterRow]) -> Vec<(StatusCategory, usize)> {
    StatusCategory::ALL
        .iter()
        .map(|category| {
            let count = rows.iter().filter(|row| row.status == *category).count();
            (*category, count)
        })
        .collect()
}

pub fn module_counts(rows: &[RosterRow]) -> BTreeMap<String, (usize, usize)> {
    let mut map: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = map.entry(row.module.clone()).or_insert((0, 0));
        entry.0 += 1;
        if row.status == StatusCategory::AtRisk {
            entry.1 += 1;
        }
    }
    map
}

pub fn module_filter_options(modules: &[Module]) -> Vec<ModuleFilterOption> {
    modules
        .iter()
        .map(|module| ModuleFilterOption {
            display_text: format!("{} - {}", module.module_code, module.module_name),
            match_value: module.module_code.clone(),
        })
        .collect()
}
