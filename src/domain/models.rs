use crate::cli::MessageKind;
use crate::domain::constants::{
    DEFAULT_BASE_URL, DEFAULT_CARD_URL, DEFAULT_DATA_DIR, DEFAULT_TIME_MARK, FIELD_DECLAREDATE,
    FIELD_HOLDER, FIELD_SECCODE, FIELD_VARYDATE,
};
use chrono::NaiveDate;
use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// One shareholder transaction or summary row, fields in the order the API
/// sent them. Values are kept as text; the textual form is what snapshots
/// store and what keys compare.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, String>);

impl Record {
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Field value, or `""` when absent.
    pub fn field(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    /// Field value when present and not blank.
    pub fn non_blank(&self, field: &str) -> Option<&str> {
        self.get(field).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Ordered rows plus the union of their column names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Record) {
        for (field, _) in row.fields() {
            if !self.columns.iter().any(|c| c == field) {
                self.columns.push(field.to_string());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows matching `keep`, under the same column list.
    pub fn retain_rows(&self, mut keep: impl FnMut(&Record) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl FromIterator<Record> for Table {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut table = Table::new();
        for row in iter {
            table.push(row);
        }
        table
    }
}

/// Row identity for diffing: two rows with equal keys are the same event even
/// when their other fields differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BusinessKey {
    pub seccode: String,
    pub declare_date: String,
    pub vary_date: String,
    pub holder: String,
}

impl BusinessKey {
    pub fn of(row: &Record) -> Self {
        Self {
            seccode: row.field(FIELD_SECCODE).to_string(),
            declare_date: row.field(FIELD_DECLAREDATE).to_string(),
            vary_date: row.field(FIELD_VARYDATE).to_string(),
            holder: row.field(FIELD_HOLDER).to_string(),
        }
    }
}

impl fmt::Display for BusinessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.seccode, self.declare_date, self.vary_date, self.holder
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    IncDetail,
    IncSummary,
    DescDetail,
    DescSummary,
}

impl Category {
    /// Processing order of a run.
    pub const ALL: [Category; 4] = [
        Category::IncDetail,
        Category::IncSummary,
        Category::DescDetail,
        Category::DescSummary,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Category::IncDetail => "inc-detail",
            Category::IncSummary => "inc-summary",
            Category::DescDetail => "desc-detail",
            Category::DescSummary => "desc-summary",
        }
    }

    /// Path segment under the API base url.
    pub fn endpoint(self) -> &'static str {
        match self {
            Category::IncDetail | Category::DescDetail => "detail",
            Category::IncSummary | Category::DescSummary => "stat",
        }
    }

    /// Value of the `type` query parameter.
    pub fn api_type(self) -> &'static str {
        match self {
            Category::IncDetail | Category::IncSummary => "inc",
            Category::DescDetail | Category::DescSummary => "desc",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::IncDetail => "增持明细",
            Category::IncSummary => "增持汇总",
            Category::DescDetail => "减持明细",
            Category::DescSummary => "减持汇总",
        }
    }

    pub fn snapshot_file(self) -> &'static str {
        match self {
            Category::IncDetail => "last_inc_detail.csv",
            Category::IncSummary => "last_inc_summary.csv",
            Category::DescDetail => "last_desc_detail.csv",
            Category::DescSummary => "last_desc_summary.csv",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub fetch: FetchSettings,
    pub notify: NotifySettings,
    pub filter: FilterSettings,
    pub format: FormatSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            fetch: FetchSettings::default(),
            notify: NotifySettings::default(),
            filter: FilterSettings::default(),
            format: FormatSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    pub base_url: String,
    pub time_mark: String,
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            time_mark: DEFAULT_TIME_MARK.to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifySettings {
    pub kind: MessageKind,
    pub timeout_secs: u64,
    /// Link opened when a template card is clicked.
    pub card_url: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            kind: MessageKind::Text,
            timeout_secs: 10,
            card_url: DEFAULT_CARD_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    /// Trailing window in days; five covers a weekend plus a holiday.
    pub window_days: u32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self { window_days: 5 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSettings {
    /// Entry cap for text and card messages.
    pub compact_cap: usize,
    /// Entry cap for markdown tables.
    pub table_cap: usize,
    pub holder_max_chars: usize,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            compact_cap: 5,
            table_cap: 8,
            holder_max_chars: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Failed,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyStatus {
    /// Nothing new, no message sent.
    Skipped,
    Delivered,
    Rejected,
    Failed,
}

impl NotifyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyStatus::Skipped => "skipped",
            NotifyStatus::Delivered => "delivered",
            NotifyStatus::Rejected => "rejected",
            NotifyStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub title: String,
    pub fetch_status: FetchStatus,
    pub fetch_error: Option<String>,
    pub fetched_rows: usize,
    pub recent_rows: usize,
    pub delta_rows: usize,
    pub notify_status: NotifyStatus,
    pub notify_error: Option<String>,
    pub snapshot_saved: bool,
    pub snapshot_rows: usize,
    pub snapshot_sha256: Option<String>,
    pub snapshot_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub as_of: NaiveDate,
    pub window_days: u32,
    pub kind: MessageKind,
    pub categories: Vec<CategoryReport>,
    pub new_records: usize,
    pub fetch_failures: usize,
    pub notify_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub id: String,
    pub title: String,
    pub endpoint: String,
    pub api_type: String,
    pub snapshot_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub category: Category,
    pub path: String,
    pub exists: bool,
    pub rows: usize,
    pub columns: Vec<String>,
    pub sha256: Option<String>,
    pub latest_keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_follow_first_seen_order() {
        let mut table = Table::new();
        table.push(Record::from_iter([("B", "1"), ("A", "2")]));
        table.push(Record::from_iter([("C", "3"), ("A", "4")]));
        assert_eq!(table.columns(), ["B", "A", "C"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn business_key_defaults_missing_fields_to_empty() {
        let row = Record::from_iter([(FIELD_SECCODE, "000001"), (FIELD_HOLDER, "张三")]);
        let key = BusinessKey::of(&row);
        assert_eq!(key.seccode, "000001");
        assert_eq!(key.declare_date, "");
        assert_eq!(key.vary_date, "");
        assert_eq!(key.holder, "张三");
    }

    #[test]
    fn categories_map_to_distinct_snapshot_files() {
        let files: std::collections::HashSet<_> =
            Category::ALL.iter().map(|c| c.snapshot_file()).collect();
        assert_eq!(files.len(), 4);
        assert_eq!(Category::DescSummary.endpoint(), "stat");
        assert_eq!(Category::DescSummary.api_type(), "desc");
    }

    #[test]
    fn settings_parse_partial_toml() {
        let raw = "[filter]\nwindow_days = 7\n[notify]\nkind = \"card\"\n";
        let settings: Settings = toml::from_str(raw).expect("parse settings");
        assert_eq!(settings.filter.window_days, 7);
        assert_eq!(settings.notify.kind, MessageKind::Card);
        assert_eq!(settings.format.table_cap, 8);
        assert_eq!(settings.fetch.time_mark, "oneMonth");
    }
}
