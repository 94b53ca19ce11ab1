use tracing::info;
use triage_core::domain::{Incident, IncidentPatch};

use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::http::{decode, send};
use crate::session::{AccessToken, Session};

/// Network boundary for incident records. Every call is a single request: no cache,
/// no retry, no idempotency key.
pub trait IncidentService {
    fn list(&self, session: &Session) -> Result<Vec<Incident>, ServiceError>;

    fn get_by_id(&self, session: &Session, id: i64) -> Result<Incident, ServiceError>;

    /// Sends only the fields present in `patch`.
    fn update(
        &self,
        session: &Session,
        id: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, ServiceError>;
}

impl<S: IncidentService + ?Sized> IncidentService for &S {
    fn list(&self, session: &Session) -> Result<Vec<Incident>, ServiceError> {
        (**self).list(session)
    }

    fn get_by_id(&self, session: &Session, id: i64) -> Result<Incident, ServiceError> {
        (**self).get_by_id(session, id)
    }

    fn update(
        &self,
        session: &Session,
        id: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, ServiceError> {
        (**self).update(session, id, patch)
    }
}

/// `IncidentService` over the backend's REST API (blocking).
#[derive(Debug, Clone)]
pub struct HttpIncidentService {
    agent: ureq::Agent,
}

impl Default for HttpIncidentService {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpIncidentService {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    fn authorized(&self, session: &Session, method: &str, path: &str) -> Result<ureq::Request, ServiceError> {
        let auth = session.authorization().ok_or(ServiceError::Unauthorized)?;
        Ok(self
            .agent
            .request(method, &session.url(path))
            .set("Authorization", &auth))
    }

    /// Exchange the configured operator credentials for a bearer token.
    pub fn login(&self, session: &mut Session, config: &ClientConfig) -> Result<(), ServiceError> {
        let body = serde_json::json!({
            "username": config.username(),
            "password": config.password(),
        });

        let req = self.agent.post(&session.url("/auth/login"));
        let token: AccessToken = decode(send(req, Some(body))?)?;
        info!(username = config.username(), expires_at = %token.expires_at, "operator logged in");
        session.establish(token);
        Ok(())
    }

    /// Revoke the token server-side and clear it locally. The local session is cleared
    /// even when the backend call fails.
    pub fn logout(&self, session: &mut Session) -> Result<(), ServiceError> {
        let result = match self.authorized(session, "POST", "/auth/logout") {
            Ok(req) => send(req, None).map(|_| ()),
            Err(ServiceError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        };
        session.clear();
        result
    }
}

impl IncidentService for HttpIncidentService {
    fn list(&self, session: &Session) -> Result<Vec<Incident>, ServiceError> {
        let req = self.authorized(session, "GET", "/incidents")?;
        decode(send(req, None)?)
    }

    fn get_by_id(&self, session: &Session, id: i64) -> Result<Incident, ServiceError> {
        let req = self.authorized(session, "GET", &format!("/incidents/{id}"))?;
        decode(send(req, None)?)
    }

    fn update(
        &self,
        session: &Session,
        id: i64,
        patch: &IncidentPatch,
    ) -> Result<Incident, ServiceError> {
        let body = serde_json::to_value(patch)
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        let req = self.authorized(session, "PATCH", &format!("/incidents/{id}"))?;
        decode(send(req, Some(body))?)
    }
}
