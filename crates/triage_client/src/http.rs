use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Issue one request. Non-2xx statuses and transport failures become `ServiceError`.
pub(crate) fn send(
    req: ureq::Request,
    body: Option<serde_json::Value>,
) -> Result<ureq::Response, ServiceError> {
    let method = req.method().to_string();
    let url = req.url().to_string();
    debug!(%method, %url, "incident api request");

    let result = match body {
        Some(json) => req.send_json(json),
        None => req.call(),
    };

    match result {
        Ok(resp) => {
            debug!(%method, %url, status = resp.status(), "incident api response");
            Ok(resp)
        }
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            let err = ServiceError::from_status(code, &body);
            warn!(%method, %url, status = code, error = %err, "incident api rejected request");
            Err(err)
        }
        Err(ureq::Error::Transport(t)) => {
            warn!(%method, %url, error = %t, "incident api unreachable");
            Err(ServiceError::Network(t.to_string()))
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(resp: ureq::Response) -> Result<T, ServiceError> {
    resp.into_json::<T>()
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}
