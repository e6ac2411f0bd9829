//! Operator annotation of report records.
//!
//! Editing is two-phase: [`AnnotationDrafts::begin_edit`] marks a record as
//! being edited and seeds a draft from its current remarks, and
//! [`AnnotationDrafts::commit_edit`] writes the text back through the store.
//! Drafts are UI state only and are never persisted.

use std::collections::HashMap;

use crate::record::StoppageRecord;
use crate::store::{RecordPatch, ReportStore, StoreError};
use crate::types::RecordId;

/// In-progress remark edits, keyed by record.
#[derive(Debug, Default)]
pub struct AnnotationDrafts {
    drafts: HashMap<RecordId, String>,
}

impl AnnotationDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing `id`, seeding the draft with the record's remarks.
    ///
    /// Beginning an edit that is already in progress keeps the existing draft.
    pub fn begin_edit(&mut self, store: &ReportStore, id: &RecordId) -> Result<&str, StoreError> {
        let record = store
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let draft = self
            .drafts
            .entry(id.clone())
            .or_insert_with(|| record.remarks.clone());
        Ok(draft.as_str())
    }

    /// Replaces the draft text of an edit in progress.
    ///
    /// Returns `false` if `id` is not being edited.
    pub fn set_draft(&mut self, id: &RecordId, text: impl Into<String>) -> bool {
        self.drafts.get_mut(id).is_some_and(|draft| {
            *draft = text.into();
            true
        })
    }

    pub fn draft(&self, id: &RecordId) -> Option<&str> {
        self.drafts.get(id).map(String::as_str)
    }

    pub fn is_editing(&self, id: &RecordId) -> bool {
        self.drafts.contains_key(id)
    }

    /// Abandons an edit without touching the record.
    pub fn cancel_edit(&mut self, id: &RecordId) -> bool {
        self.drafts.remove(id).is_some()
    }

    /// Writes `text` into the record's remarks and ends the edit.
    ///
    /// If the store rejects the update, the edit stays open so it can be retried.
    pub fn commit_edit(
        &mut self,
        store: &mut ReportStore,
        id: &RecordId,
        text: impl Into<String>,
    ) -> Result<StoppageRecord, StoreError> {
        let result = store.update(id, RecordPatch::Remarks(text.into()));
        // A mirror failure still leaves the remarks applied in memory.
        if matches!(result, Ok(_) | Err(StoreError::Mirror(_))) {
            self.drafts.remove(id);
            tracing::debug!(id = %id, "remarks updated");
        }
        result
    }
}
