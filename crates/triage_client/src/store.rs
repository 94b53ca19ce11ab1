use tracing::{debug, warn};
use triage_core::domain::{Incident, IncidentPatch};
use triage_core::filter::{facets, filter_incidents, Criteria, Facets};

use crate::error::ServiceError;
use crate::service::IncidentService;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    /// Human-readable banner text. The previous collection is still available.
    Error(String),
}

/// Handle for one in-flight request. A completion carrying a ticket older than the
/// store's current generation is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

/// Client-side source of truth for the incident list.
///
/// Only request completions write to it. Every successful mutation is followed by a
/// full re-fetch of the list; records are never patched in place.
#[derive(Debug)]
pub struct IncidentStore<S> {
    service: S,
    incidents: Vec<Incident>,
    state: LoadState,
    last_error: Option<ServiceError>,
    generation: u64,
}

impl<S: IncidentService> IncidentStore<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            incidents: Vec::new(),
            state: LoadState::Idle,
            last_error: None,
            generation: 0,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn last_error(&self) -> Option<&ServiceError> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// The subset the table should show.
    pub fn visible(&self, criteria: &Criteria) -> Vec<Incident> {
        filter_incidents(&self.incidents, criteria)
    }

    pub fn facets(&self) -> Facets {
        facets(&self.incidents)
    }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = LoadState::Loading;
        Ticket {
            generation: self.generation,
        }
    }

    /// The owning view went away: anything still in flight completes into the void.
    pub fn detach(&mut self) {
        self.generation += 1;
        if self.state == LoadState::Loading {
            self.state = if self.incidents.is_empty() {
                LoadState::Idle
            } else {
                LoadState::Ready
            };
        }
    }

    /// Apply a list result. Returns `false` when the ticket is stale and nothing changed.
    pub fn complete(&mut self, ticket: Ticket, result: Result<Vec<Incident>, ServiceError>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale incident store completion"
            );
            return false;
        }

        match result {
            Ok(incidents) => {
                self.incidents = incidents;
                self.state = LoadState::Ready;
                self.last_error = None;
            }
            Err(err) => {
                warn!(error = %err, "incident store request failed; keeping previous data");
                self.state = LoadState::Error(err.user_message());
                self.last_error = Some(err);
            }
        }
        true
    }

    pub fn load(&mut self, session: &Session) -> Result<(), ServiceError> {
        let ticket = self.begin();
        let result = self.service.list(session);
        let outcome = result.as_ref().map(|_| ()).map_err(|e| e.clone());
        self.complete(ticket, result);
        outcome
    }

    /// Send the patch, then reload the whole list.
    ///
    /// A rejected update leaves the collection untouched. If the update succeeds but
    /// the reload fails, the updated record is still returned and the reload error
    /// shows up in `state`.
    pub fn update(
        &mut self,
        session: &Session,
        id: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, ServiceError> {
        let ticket = self.begin();
        match self.service.update(session, id, patch) {
            Ok(updated) => {
                // a failed reload is already recorded in state and last_error
                let _ = self.load(session);
                Ok(updated)
            }
            Err(err) => {
                self.complete(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Fetch one incident from the backend. On any failure the error is recorded and
    /// the last-loaded collection is searched instead.
    pub fn fetch_incident(&mut self, session: &Session, id: i64) -> Option<Incident> {
        match self.service.get_by_id(session, id) {
            Ok(incident) => {
                self.last_error = None;
                Some(incident)
            }
            Err(err) => {
                warn!(id, error = %err, "incident fetch failed; falling back to loaded list");
                self.last_error = Some(err);
                self.find_local(id).cloned()
            }
        }
    }

    pub fn find_local(&self, id: i64) -> Option<&Incident> {
        self.incidents.iter().find(|i| i.id == id)
    }
}
