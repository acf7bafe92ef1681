//! Purpose: The in-memory record table behind the HTTP service.
//! Exports: `Table`, `Envelope`, `Links`, `Pagination`.
//! Role: Single source of truth; owns the ordered backing sequence and
//! executes find/update/append and the combined filter+paginate query.
//! Invariants: Records are addressed by zero-based offset in the backing
//! sequence, never by the value of an `id` field (inherited contract).
//! Invariants: `query` is pure; there is no shared "current query" state.
//! Invariants: Appended identifiers are dense and 1-based (`len + 1`); there
//! is no delete, so identifiers are never reused.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;

pub struct Table {
    rows: Vec<Record>,
}

/// The `{data, pagination}` result shape returned to callers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub data: Vec<Record>,
    pub pagination: Links,
}

/// Navigation links, present only when a page exists in that direction.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "nextPage", skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    #[serde(rename = "prevPage", skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
}

/// Page arithmetic over a filtered total.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Pagination {
    pub fn pages(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }
}

impl Table {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Clone of the record at zero-based `offset` in the full backing
    /// sequence. The externally supplied id passes straight through as the
    /// offset; see DESIGN.md for why this contract is kept as-is.
    pub fn find(&self, offset: usize) -> Result<Record, Error> {
        self.rows
            .get(offset)
            .cloned()
            .ok_or_else(|| not_found(offset, self.rows.len()))
    }

    /// Overwrite fields of the record at `offset` with values from `patch`.
    /// Patch keys not already present in the record are dropped; update
    /// never grows a record's field set.
    pub fn update(&mut self, offset: usize, patch: &Record) -> Result<Record, Error> {
        let len = self.rows.len();
        let record = self
            .rows
            .get_mut(offset)
            .ok_or_else(|| not_found(offset, len))?;
        for (field, value) in patch {
            if let Some(slot) = record.get_mut(field) {
                *slot = value.clone();
            }
        }
        Ok(record.clone())
    }

    /// Append `fields` with a generated `id` of `len + 1` and return the
    /// stored record. No uniqueness checks beyond the mechanical id.
    pub fn append(&mut self, mut fields: Record) -> Record {
        let id = self.rows.len() as u64 + 1;
        fields.insert("id".to_string(), Value::from(id));
        self.rows.push(fields.clone());
        fields
    }

    /// Filter and paginate in one pure call.
    ///
    /// Empty criteria select the whole backing sequence in original order;
    /// otherwise a record matches when every criterion field is present and
    /// equal. Slicing is clamped, so a page beyond the end yields an empty
    /// data list rather than an error; distinguishing "empty page 1" from
    /// "out-of-range page" is the HTTP boundary's job.
    pub fn query(
        &self,
        criteria: &Record,
        page: usize,
        per_page: usize,
        base_path: &str,
    ) -> Result<Envelope, Error> {
        if page < 1 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("page numbers start at 1"));
        }
        if per_page < 1 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("per_page must be greater than zero"));
        }

        let matches = self.filtered(criteria);
        let pagination = Pagination {
            page,
            per_page,
            total: matches.len(),
        };

        let start = (page - 1).saturating_mul(per_page).min(matches.len());
        let end = start.saturating_add(per_page).min(matches.len());
        let data = matches[start..end].iter().map(|row| (*row).clone()).collect();

        let mut links = Links::default();
        if pagination.has_next() {
            links.next_page = Some(format!("{base_path}/page/{}", page + 1));
        }
        if pagination.has_prev() {
            links.prev_page = Some(format!("{base_path}/page/{}", page - 1));
        }

        Ok(Envelope {
            data,
            pagination: links,
        })
    }

    fn filtered(&self, criteria: &Record) -> Vec<&Record> {
        self.rows
            .iter()
            .filter(|row| {
                criteria
                    .iter()
                    .all(|(field, value)| row.get(field) == Some(value))
            })
            .collect()
    }
}

fn not_found(offset: usize, len: usize) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message(format!("no record at offset {offset} (length {len})"))
}
