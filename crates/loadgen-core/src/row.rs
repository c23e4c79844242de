//! Finished rows and their column schemas.
//!
//! Each row kind is a plain struct plus a static column descriptor. The
//! [`Record`] trait ties the two together so sinks can write headers from
//! `COLUMNS` and values from `fields()` without knowing the concrete kind.

use crate::values::{FieldType, FieldValue};
use crate::CafeId;
use chrono::{DateTime, Utc};
use std::fmt;

/// Column descriptor: name plus declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: &'static str,
    /// Column type
    pub field_type: FieldType,
}

impl Column {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }
}

/// Kind of emitted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Article,
    Comment,
}

impl RowKind {
    /// Name used in output file names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Article => "article",
            RowKind::Comment => "comment",
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row with a fixed, statically known schema.
pub trait Record {
    /// Row kind.
    const KIND: RowKind;

    /// Column descriptors, in emission order.
    const COLUMNS: &'static [Column];

    /// Field values, in the same order as [`Record::COLUMNS`].
    fn fields(&self) -> Vec<FieldValue>;

    /// Column names, in emission order.
    fn column_names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|c| c.name).collect()
    }
}

/// Summary row of one article.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRow {
    /// Owning cafe id
    pub service_id: CafeId,
    pub ticket_no: i64,
    pub object_id: String,
    pub comment_count: u64,
    /// Always equal to `comment_count`; no deletion is modelled
    pub display_comment_count: u64,
    /// Number of the last comment created, if any
    pub last_comment_no: Option<i64>,
    pub trackback_count: u64,
    pub reg_time: DateTime<Utc>,
}

impl Record for ArticleRow {
    const KIND: RowKind = RowKind::Article;

    const COLUMNS: &'static [Column] = &[
        Column::new("service_id", FieldType::Int),
        Column::new("ticket_no", FieldType::Int),
        Column::new("object_id", FieldType::Text),
        Column::new("comment_count", FieldType::Int),
        Column::new("display_comment_count", FieldType::Int),
        Column::new("last_comment_no", FieldType::Int),
        Column::new("trackback_count", FieldType::Int),
        Column::new("reg_time", FieldType::Timestamp),
    ];

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(self.service_id as i64),
            FieldValue::Int(self.ticket_no),
            FieldValue::Text(self.object_id.clone()),
            FieldValue::Int(self.comment_count as i64),
            FieldValue::Int(self.display_comment_count as i64),
            FieldValue::int_or_null(self.last_comment_no),
            FieldValue::Int(self.trackback_count as i64),
            FieldValue::Timestamp(self.reg_time),
        ]
    }
}

/// One node of a reply tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub service_id: CafeId,
    /// Ticket of the owning article
    pub ticket_no: i64,
    /// Object id of the owning article
    pub object_id: String,
    pub comment_no: i64,
    /// Comment number of the thread root
    pub top_comment_no: i64,
    /// Comment number of the immediate parent (own number at root)
    pub parent_comment_no: i64,
    pub depth: u8,
    pub position: u16,
    pub sort_key: String,
    pub reg_time: DateTime<Utc>,
}

impl Record for CommentRow {
    const KIND: RowKind = RowKind::Comment;

    const COLUMNS: &'static [Column] = &[
        Column::new("service_id", FieldType::Int),
        Column::new("ticket_no", FieldType::Int),
        Column::new("object_id", FieldType::Text),
        Column::new("comment_no", FieldType::Int),
        Column::new("top_comment_no", FieldType::Int),
        Column::new("parent_comment_no", FieldType::Int),
        Column::new("depth", FieldType::Int),
        Column::new("position", FieldType::Int),
        Column::new("sort_key", FieldType::Text),
        Column::new("reg_time", FieldType::Timestamp),
    ];

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Int(self.service_id as i64),
            FieldValue::Int(self.ticket_no),
            FieldValue::Text(self.object_id.clone()),
            FieldValue::Int(self.comment_no),
            FieldValue::Int(self.top_comment_no),
            FieldValue::Int(self.parent_comment_no),
            FieldValue::Int(i64::from(self.depth)),
            FieldValue::Int(i64::from(self.position)),
            FieldValue::Text(self.sort_key.clone()),
            FieldValue::Timestamp(self.reg_time),
        ]
    }
}
