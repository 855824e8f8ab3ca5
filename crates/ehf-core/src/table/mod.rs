//! Table sorting: click a header, reorder the body rows by that column.

pub mod collate;
pub mod sorter;

pub use self::collate::{CellKey, CollationKey, collate, column_keys, compare_cells, parse_number};
pub use self::sorter::{
    ASC_CLASS, DESC_CLASS, Document, HeaderBinding, HeaderCell, SORT_COLUMN_ATTR, SORT_ORDER_ATTR,
    SortDirection, SortError, SortState, Table,
};
