//! Table sorter - ヘッダーのクリックで行を並べ替える
//!
//! # 学習ポイント
//! - ソート状態はテーブル自身の属性（`data-sort-column`, `data-sort-order`）に保存する
//! - 同じ列をもう一度クリックすると昇順/降順が反転する
//! - 安定ソート: 等しいキーの行は元の相対順序を保つ（昇順でも降順でも）

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::collate::column_keys;

pub const SORT_COLUMN_ATTR: &str = "data-sort-column";
pub const SORT_ORDER_ATTR: &str = "data-sort-order";
pub const ASC_CLASS: &str = "sort-asc";
pub const DESC_CLASS: &str = "sort-desc";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("no table with id `{0}`")]
    UnknownTable(String),

    #[error("column {column} is out of range for table `{table}` ({width} columns)")]
    ColumnOutOfRange {
        table: String,
        column: usize,
        width: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_attr(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Ascending),
            "desc" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn marker_class(self) -> &'static str {
        match self {
            SortDirection::Ascending => ASC_CLASS,
            SortDirection::Descending => DESC_CLASS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    text: String,
    classes: BTreeSet<String>,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            classes: BTreeSet::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// A table: one header row and body rows of cell text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    id: String,
    headers: Vec<HeaderCell>,
    rows: Vec<Vec<String>>,
    attributes: BTreeMap<String, String>,
}

impl Table {
    pub fn new<H, S>(id: impl Into<String>, headers: H, rows: Vec<Vec<String>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            headers: headers.into_iter().map(HeaderCell::new).collect(),
            rows,
            attributes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn headers(&self) -> &[HeaderCell] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of addressable columns (header or widest row, whichever is wider).
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Sort state persisted by the last click, if any.
    pub fn sort_state(&self) -> Option<SortState> {
        let column = self.attribute(SORT_COLUMN_ATTR)?.trim().parse().ok()?;
        let direction = SortDirection::from_attr(self.attribute(SORT_ORDER_ATTR)?)?;
        Some(SortState { column, direction })
    }

    /// Direction the next click on `column` sorts in.
    pub fn next_direction(&self, column: usize) -> SortDirection {
        let same_column = self
            .attribute(SORT_COLUMN_ATTR)
            .and_then(|c| c.trim().parse::<usize>().ok())
            == Some(column);
        if same_column && self.attribute(SORT_ORDER_ATTR) == Some(SortDirection::Ascending.as_attr())
        {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    /// Sorts the body rows by `column`, as one header click would.
    pub fn sort_by_column(&mut self, column: usize) -> Result<SortState, SortError> {
        let width = self.width();
        if column >= width {
            return Err(SortError::ColumnOutOfRange {
                table: self.id.clone(),
                column,
                width,
            });
        }

        let direction = self.next_direction(column);
        let cells: Vec<&str> = self
            .rows
            .iter()
            .map(|row| row.get(column).map_or("", |c| c.trim()))
            .collect();
        let keys = column_keys(&cells);

        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        // slice::sort_by は安定ソート
        order.sort_by(|&a, &b| {
            let ord = keys[a].compare(&keys[b]);
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });

        let mut rows: Vec<Option<Vec<String>>> = self.rows.drain(..).map(Some).collect();
        self.rows = order.into_iter().filter_map(|i| rows[i].take()).collect();

        self.set_attribute(SORT_COLUMN_ATTR, column.to_string());
        self.set_attribute(SORT_ORDER_ATTR, direction.as_attr());
        self.mark_header(column, direction);

        debug!(table = %self.id, column, direction = direction.as_attr(), "table sorted");
        Ok(SortState { column, direction })
    }

    fn mark_header(&mut self, column: usize, direction: SortDirection) {
        for (i, header) in self.headers.iter_mut().enumerate() {
            header.classes.remove(ASC_CLASS);
            header.classes.remove(DESC_CLASS);
            if i == column {
                header.classes.insert(direction.marker_class().to_string());
            }
        }
    }
}

/// A clickable header: sorting `table_id` by `column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderBinding {
    pub table_id: String,
    pub column: usize,
}

/// All tables on a page.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tables: Vec<Table>,
}

impl Document {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn sort_table(&mut self, table_id: &str, column: usize) -> Result<SortState, SortError> {
        self.tables
            .iter_mut()
            .find(|t| t.id == table_id)
            .ok_or_else(|| SortError::UnknownTable(table_id.to_string()))?
            .sort_by_column(column)
    }

    /// One binding per header cell of every table, in document order.
    pub fn attach_sorters(&self) -> Vec<HeaderBinding> {
        self.tables
            .iter()
            .flat_map(|table| {
                (0..table.headers.len()).map(move |column| HeaderBinding {
                    table_id: table.id.clone(),
                    column,
                })
            })
            .collect()
    }

    pub fn click(&mut self, binding: &HeaderBinding) -> Result<SortState, SortError> {
        self.sort_table(&binding.table_id, binding.column)
    }
}
