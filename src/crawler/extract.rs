//! Department-page field extraction
//!
//! Every lookup is anchored on label text, because the catalog renders the
//! same semantic fields in structurally different tables across
//! institutions. Two subject-threshold layouts exist: a standard layout
//! with one subject label per cell, and a condensed layout packing all
//! subject labels into one cell and all values into its sibling. The
//! condensed branch is the only place where position, not label adjacency,
//! determines the mapping.
//!
//! Absence of any field is not an error; every slot defaults to the empty
//! string, so a page with an unknown layout degrades to an empty record
//! rather than failing the run.

use crate::dom::{
    cell_has_exact, cell_text, cell_tokens, clean_text, find_cell_in_row, next_row_of,
    value_cell_of, LabelDoc,
};
use crate::model::{DepartmentRecord, RANK_SLOTS, SUBJECT_KEYS};
use regex::Regex;

/// Extracts one flat admissions record from a parsed department page
///
/// `institution_name` is the display-name fallback when the page carries no
/// usable name of its own; `source_url` is recorded verbatim.
pub fn extract_record(
    doc: &LabelDoc,
    institution_name: &str,
    source_url: &str,
) -> DepartmentRecord {
    let mut record = DepartmentRecord {
        source_url: source_url.to_string(),
        ..Default::default()
    };

    extract_identity(doc, institution_name, &mut record);
    record.category = label_value(doc, "學群類別");
    extract_quotas(doc, &mut record);
    extract_thresholds(doc, &mut record);
    extract_ranking(doc, &mut record);

    record
}

/// Identity fields: institution display name, department name, and code
///
/// The department-name node is formatted `(code)Name`; when the pattern is
/// absent the raw text is kept as the name and the code comes from a
/// secondary `校系代碼` label lookup.
fn extract_identity(doc: &LabelDoc, institution_name: &str, record: &mut DepartmentRecord) {
    record.institution_name = doc
        .select_text(".colname")
        .unwrap_or_else(|| institution_name.to_string());

    let dept_name = doc.select_text(".gsdname").unwrap_or_default();
    let name_pattern = Regex::new(r"^\((\d+)\)(.+)").expect("valid name pattern");

    if let Some(caps) = name_pattern.captures(&dept_name) {
        record.department_code = caps[1].to_string();
        record.department_name = caps[2].trim().to_string();
    } else {
        record.department_name = dept_name;
        record.department_code = label_value(doc, "校系代碼");
    }
}

/// Generic rule: exact whole-cell label, value in the next cell of the row
fn label_value(doc: &LabelDoc, label: &str) -> String {
    doc.find_cell_exact(label)
        .and_then(value_cell_of)
        .map(cell_text)
        .unwrap_or_default()
}

/// Quota fields plus their elective-choice counts
///
/// The choice count sits in a second row beneath each quota row, labeled
/// `可填志願數`, not beside the quota value. Some layouts instead use one
/// full-label cell (`招生名額…志願數`); that form is the fallback.
fn extract_quotas(doc: &LabelDoc, record: &mut DepartmentRecord) {
    let choice_pattern = Regex::new("可填志願數").expect("valid choice pattern");

    let (base_quota, base_choices) = quota_with_choice(doc, "招生名額", &choice_pattern);
    record.base_quota = base_quota;
    record.base_quota_choices = base_choices;

    let (extra_quota, extra_choices) = quota_with_choice(doc, "外加名額", &choice_pattern);
    record.extra_quota = extra_quota;
    record.extra_quota_choices = extra_choices;

    if record.base_quota_choices.is_empty() {
        record.base_quota_choices =
            regex_label_value(doc, &Regex::new("招生名額.*志願數").expect("valid pattern"));
    }
    if record.extra_quota_choices.is_empty() {
        record.extra_quota_choices =
            regex_label_value(doc, &Regex::new("外加名額.*志願數").expect("valid pattern"));
    }
}

/// Reads a quota value and, from the row below, its choice count
fn quota_with_choice(doc: &LabelDoc, label: &str, choice_pattern: &Regex) -> (String, String) {
    let Some(label_cell) = doc.find_cell_exact(label) else {
        return (String::new(), String::new());
    };

    let quota = value_cell_of(label_cell).map(cell_text).unwrap_or_default();

    let choices = next_row_of(label_cell)
        .and_then(|row| find_cell_in_row(row, choice_pattern))
        .and_then(value_cell_of)
        .map(cell_text)
        .unwrap_or_default();

    (quota, choices)
}

/// Label lookup by pattern instead of exact cell text
fn regex_label_value(doc: &LabelDoc, pattern: &Regex) -> String {
    doc.find_cell_matching(pattern)
        .and_then(value_cell_of)
        .map(cell_text)
        .unwrap_or_default()
}

/// Subject-score thresholds for the seven fixed subjects
///
/// Condensed mode is detected when the cell holding the exact `國文` text
/// also holds an exact `英文` text: all subject labels share one cell and
/// all values share its sibling, paired by position. Otherwise each subject
/// is looked up independently by exact label.
fn extract_thresholds(doc: &LabelDoc, record: &mut DepartmentRecord) {
    if let Some(first_cell) = doc.find_cell_exact(SUBJECT_KEYS[0]) {
        if cell_has_exact(first_cell, SUBJECT_KEYS[1]) {
            let subjects: Vec<String> = cell_tokens(first_cell)
                .into_iter()
                .filter(|token| SUBJECT_KEYS.contains(&token.as_str()))
                .collect();
            let values = value_cell_of(first_cell)
                .map(cell_tokens)
                .unwrap_or_default();

            for (i, subject) in subjects.iter().enumerate() {
                let Some(value) = values.get(i) else {
                    // Fewer values than labels: the tail keeps its default.
                    break;
                };
                if let Some(slot) = DepartmentRecord::subject_index(subject) {
                    record.thresholds[slot] = value.clone();
                }
            }
            return;
        }
    }

    for (slot, subject) in SUBJECT_KEYS.iter().enumerate() {
        record.thresholds[slot] = label_value(doc, subject);
    }
}

/// Ranking-criteria block: a numbered free-text list assigned to slots 1–8
///
/// Lines are matched as `<n>.` or `<n>、` followed by text. Numerals may
/// appear out of order and with gaps; the last write to a slot wins.
/// Unnumbered continuation lines are dropped.
fn extract_ranking(doc: &LabelDoc, record: &mut DepartmentRecord) {
    let start_pattern = Regex::new(r"1[.、]").expect("valid start pattern");
    let line_pattern = Regex::new(r"^(\d+)[.、](.+)").expect("valid line pattern");

    let Some(container) = doc.find_cell_matching(&start_pattern) else {
        return;
    };

    for line in cell_tokens(container) {
        let Some(caps) = line_pattern.captures(&line) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        if (1..=RANK_SLOTS).contains(&index) {
            record.ranking[index - 1] = clean_text(&caps[2]);
        }
    }
}
