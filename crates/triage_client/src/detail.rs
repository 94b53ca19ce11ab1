use triage_core::domain::{Incident, IncidentPatch, IncidentStatus};

use crate::error::ServiceError;
use crate::service::IncidentService;
use crate::session::Session;
use crate::store::IncidentStore;

/// State behind the incident detail view: the persisted record plus the operator's
/// pending status choice and comment draft.
///
/// Client calls are synchronous and both saves take `&mut self` plus the store by
/// `&mut`, so a save holds the view exclusively until its result is applied. A second
/// save, or a read of the editor, cannot start while one is in flight:
///
/// ```compile_fail
/// use triage_client::{IncidentEditor, IncidentService, IncidentStore, Session};
///
/// fn overlapping<S: IncidentService>(
///     editor: &mut IncidentEditor,
///     store: &mut IncidentStore<S>,
///     session: &Session,
/// ) {
///     let pending = editor.comment_draft();
///     let _ = editor.save_status(store, session);
///     println!("{pending}");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentEditor {
    incident: Incident,
    selected_status: IncidentStatus,
    comment_draft: String,
}

impl IncidentEditor {
    pub fn new(incident: Incident) -> Self {
        Self {
            selected_status: incident.status,
            comment_draft: incident.comments.clone(),
            incident,
        }
    }

    pub fn incident(&self) -> &Incident {
        &self.incident
    }

    pub fn selected_status(&self) -> IncidentStatus {
        self.selected_status
    }

    pub fn comment_draft(&self) -> &str {
        &self.comment_draft
    }

    /// Optimistic: the dropdown shows the new value before the backend confirms it.
    pub fn select_status(&mut self, status: IncidentStatus) {
        self.selected_status = status;
    }

    pub fn set_comment_draft(&mut self, text: impl Into<String>) {
        self.comment_draft = text.into();
    }

    pub fn has_unsaved_comment(&self) -> bool {
        self.comment_draft != self.incident.comments
    }

    /// Persist the selected status. On failure the dropdown reverts to the last
    /// persisted value and the error is returned for the operator alert.
    pub fn save_status<S: IncidentService>(
        &mut self,
        store: &mut IncidentStore<S>,
        session: &Session,
    ) -> Result<(), ServiceError> {
        if self.selected_status == self.incident.status {
            return Ok(());
        }
        let patch = IncidentPatch::status(self.selected_status);
        match store.update(session, self.incident.id, &patch) {
            Ok(updated) => {
                self.selected_status = updated.status;
                self.incident = updated;
                Ok(())
            }
            Err(err) => {
                self.selected_status = self.incident.status;
                Err(err)
            }
        }
    }

    /// Persist the comment draft. A failed save keeps the draft so nothing typed is lost.
    pub fn save_comment<S: IncidentService>(
        &mut self,
        store: &mut IncidentStore<S>,
        session: &Session,
    ) -> Result<(), ServiceError> {
        let patch = IncidentPatch::comments(self.comment_draft.clone());
        let updated = store.update(session, self.incident.id, &patch)?;
        self.comment_draft = updated.comments.clone();
        self.incident = updated;
        Ok(())
    }
}
