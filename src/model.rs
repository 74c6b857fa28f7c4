//! Data model for the admissions catalog
//!
//! Three shapes flow through a run: institutions discovered from the entry
//! page, department links discovered per institution, and the flat record
//! extracted from each department page. Records default every field to the
//! empty string; absence of a field on a page is not an error.

use serde::Serialize;

/// The seven subject-threshold keys, in export column order
pub const SUBJECT_KEYS: [&str; 7] = ["國文", "英文", "數學A", "數學B", "社會", "自然", "英聽"];

/// Number of ranking-criteria slots in a record
pub const RANK_SLOTS: usize = 8;

/// A university-equivalent entity in the source catalog
///
/// Identity is the catalog code. Institutions are created during discovery
/// and immutable afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Institution {
    /// Display name as it appears on the entry page
    pub name: String,

    /// Catalog code extracted from the listing link
    pub code: String,

    /// Absolute URL of the institution's department listing
    pub url: String,
}

/// A link to one department's detail page
///
/// The owning institution is carried along because its page URL is the
/// referer for the detail fetch and its name is the fallback display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentLink {
    /// Absolute URL of the department detail page
    pub url: String,

    /// Name of the owning institution
    pub institution_name: String,

    /// URL of the owning institution's listing page
    pub institution_url: String,
}

/// One extracted admissions record, flat, with empty-string defaults
///
/// Export column order is fixed: institution name, department name,
/// department code, category, base quota, extra quota, the two
/// elective-choice counts, seven subject thresholds, eight ranking-criteria
/// slots, and the source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentRecord {
    pub institution_name: String,
    pub department_name: String,
    pub department_code: String,

    /// Admission category (學群類別)
    pub category: String,

    /// Base admission quota (招生名額)
    pub base_quota: String,

    /// Extra admission quota (外加名額)
    pub extra_quota: String,

    /// Elective-choice count for the base quota (可填志願數)
    pub base_quota_choices: String,

    /// Elective-choice count for the extra quota
    pub extra_quota_choices: String,

    /// Subject-score thresholds, indexed like [`SUBJECT_KEYS`]
    pub thresholds: [String; SUBJECT_KEYS.len()],

    /// Ranking-criteria slots 1..=8 (分發比序項目)
    pub ranking: [String; RANK_SLOTS],

    /// URL of the page this record was extracted from
    pub source_url: String,
}

impl DepartmentRecord {
    /// Returns the fixed export column headers, in order
    pub fn columns() -> Vec<String> {
        let mut cols: Vec<String> = [
            "學校名稱",
            "學系名稱",
            "校系代碼",
            "學群類別",
            "招生名額",
            "外加名額",
            "招生名額各學群可選填志願數",
            "外加名額各學群可選填志願數",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for subject in SUBJECT_KEYS {
            cols.push(format!("{subject}檢定標準"));
        }
        for slot in 1..=RANK_SLOTS {
            cols.push(format!("分發比序項目{slot}"));
        }
        cols.push("資料連結".to_string());
        cols
    }

    /// Returns the record's values in export column order
    pub fn to_row(&self) -> Vec<String> {
        let mut row = vec![
            self.institution_name.clone(),
            self.department_name.clone(),
            self.department_code.clone(),
            self.category.clone(),
            self.base_quota.clone(),
            self.extra_quota.clone(),
            self.base_quota_choices.clone(),
            self.extra_quota_choices.clone(),
        ];
        row.extend(self.thresholds.iter().cloned());
        row.extend(self.ranking.iter().cloned());
        row.push(self.source_url.clone());
        row
    }

    /// Index of a subject key in the threshold array, if it is one of the
    /// seven known subjects
    pub fn subject_index(subject: &str) -> Option<usize> {
        SUBJECT_KEYS.iter().position(|s| *s == subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_count_matches_row_count() {
        let record = DepartmentRecord::default();
        assert_eq!(DepartmentRecord::columns().len(), record.to_row().len());
        assert_eq!(DepartmentRecord::columns().len(), 24);
    }

    #[test]
    fn test_column_order() {
        let cols = DepartmentRecord::columns();
        assert_eq!(cols[0], "學校名稱");
        assert_eq!(cols[3], "學群類別");
        assert_eq!(cols[8], "國文檢定標準");
        assert_eq!(cols[14], "英聽檢定標準");
        assert_eq!(cols[15], "分發比序項目1");
        assert_eq!(cols[22], "分發比序項目8");
        assert_eq!(cols[23], "資料連結");
    }

    #[test]
    fn test_default_record_is_all_empty() {
        let record = DepartmentRecord::default();
        assert!(record.to_row().iter().all(|v| v.is_empty()));
    }

    #[test]
    fn test_subject_index() {
        assert_eq!(DepartmentRecord::subject_index("國文"), Some(0));
        assert_eq!(DepartmentRecord::subject_index("英聽"), Some(6));
        assert_eq!(DepartmentRecord::subject_index("物理"), None);
    }
}
