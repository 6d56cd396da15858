use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::capabilities::{AppHttp, HttpResult, UrlError, ValidatedUrl};
use crate::event::Event;
use crate::model::{Ambulance, ApprovalPatch, Entity, EntityId, EntityKind};

/// Why a service call produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Transport(String),

    /// Non-2xx answer. The body text is the cause shown to the user.
    #[error("{}", status_cause(.status, .body))]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

fn status_cause(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("HTTP error {status}")
    } else {
        body.to_string()
    }
}

fn body_text(body: Option<&Vec<u8>>) -> String {
    body.map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

impl ServiceError {
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Response body of a rejected call, when the service sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => Some(body),
            _ => None,
        }
    }
}

/// Accepts a 2xx response, turning everything else into a [`ServiceError`].
/// A rejected status may arrive either as an error or as a plain response.
pub fn accept(result: HttpResult) -> Result<crux_http::Response<Vec<u8>>, ServiceError> {
    match result {
        Ok(response) => {
            let status = u16::from(response.status());
            if (200..300).contains(&status) {
                Ok(response)
            } else {
                Err(ServiceError::Status {
                    status,
                    body: body_text(response.body()),
                })
            }
        }
        Err(crux_http::Error::Http(e)) => Err(ServiceError::Status {
            status: u16::from(e.code),
            body: body_text(e.body.as_ref()),
        }),
        Err(e) => Err(ServiceError::Transport(e.to_string())),
    }
}

pub fn decode<T: DeserializeOwned>(result: HttpResult) -> Result<T, ServiceError> {
    let response = accept(result)?;
    let body = response.body().map(Vec::as_slice).unwrap_or_default();
    serde_json::from_slice(body).map_err(|e| ServiceError::Decode(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// A service call ready to hand to the HTTP capability. Components return
/// these from their transitions; the app sends them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    url: ValidatedUrl,
    body: Option<Vec<u8>>,
}

impl ApiRequest {
    fn new(method: HttpMethod, url: ValidatedUrl) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, RequestError> {
        self.body = Some(serde_json::to_vec(value).map_err(RequestError::Body)?);
        Ok(self)
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &ValidatedUrl {
        &self.url
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }

    pub fn send<F>(self, http: &AppHttp, callback: F)
    where
        F: FnOnce(HttpResult) -> Event + Send + 'static,
    {
        let url = self.url.as_str();
        let builder = match self.method {
            HttpMethod::Get => http.get(url),
            HttpMethod::Post => http.post(url),
            HttpMethod::Put => http.put(url),
            HttpMethod::Delete => http.delete(url),
        };
        let builder = match self.body {
            Some(body) => builder.header("Content-Type", "application/json").body(body),
            None => builder,
        };
        builder.send(callback);
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("cannot encode request body: {0}")]
    Body(serde_json::Error),
}

/// Builds requests against the remote entity service. One client per mounted
/// component, rooted at the configured base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClient {
    base: ValidatedUrl,
}

impl ApiClient {
    pub fn new(api_base: &str) -> Result<Self, UrlError> {
        Ok(Self {
            base: ValidatedUrl::new(api_base)?,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<ValidatedUrl, UrlError> {
        self.base.join_segments(segments.iter().copied())
    }

    fn entity_url(kind: EntityKind, id: &EntityId) -> [&str; 2] {
        [kind.collection(), id.as_str()]
    }

    pub fn fetch<E: Entity>(&self, id: &EntityId) -> Result<ApiRequest, RequestError> {
        let url = self.url(&Self::entity_url(E::KIND, id))?;
        Ok(ApiRequest::new(HttpMethod::Get, url))
    }

    pub fn fetch_all<E: Entity>(&self) -> Result<ApiRequest, RequestError> {
        let url = self.url(&[E::KIND.collection()])?;
        Ok(ApiRequest::new(HttpMethod::Get, url))
    }

    pub fn fetch_procedures_of(&self, ambulance_id: &EntityId) -> Result<ApiRequest, RequestError> {
        let url = self.url(&[
            Ambulance::KIND.collection(),
            ambulance_id.as_str(),
            EntityKind::Procedure.collection(),
        ])?;
        Ok(ApiRequest::new(HttpMethod::Get, url))
    }

    /// Create call. The payload is the entity's draft and never carries an id.
    pub fn create<E: Entity>(&self, entry: &E) -> Result<ApiRequest, RequestError> {
        let url = self.url(&[E::KIND.collection()])?;
        ApiRequest::new(HttpMethod::Post, url).with_json(&entry.draft())
    }

    /// Full replacement of the entity stored under `id`. The payload id is
    /// forced to `id`.
    pub fn update<E: Entity>(&self, id: &EntityId, entry: &E) -> Result<ApiRequest, RequestError> {
        let url = self.url(&Self::entity_url(E::KIND, id))?;
        let mut payload = entry.clone();
        payload.set_id(id.clone());
        ApiRequest::new(HttpMethod::Put, url).with_json(&payload)
    }

    pub fn delete<E: Entity>(&self, id: &EntityId) -> Result<ApiRequest, RequestError> {
        let url = self.url(&Self::entity_url(E::KIND, id))?;
        Ok(ApiRequest::new(HttpMethod::Delete, url))
    }

    pub fn approve_procedure(&self, id: &EntityId) -> Result<ApiRequest, RequestError> {
        let url = self.url(&Self::entity_url(EntityKind::Procedure, id))?;
        ApiRequest::new(HttpMethod::Put, url).with_json(&ApprovalPatch::approved())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{ok_json, status_text, transport};
    use super::*;
    use crate::model::{Procedure, VisitType};

    const BASE: &str = "http://localhost:8080/api";

    fn client() -> ApiClient {
        ApiClient::new(BASE).unwrap()
    }

    fn procedure() -> Procedure {
        Procedure {
            id: EntityId::new("stale"),
            description: "X-ray".into(),
            patient: "Eva".into(),
            price: 20.0,
            visit_type: VisitType::Unapproved,
            payer: "Dôvera".into(),
            ambulance_id: EntityId::new("A1"),
        }
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(ApiClient::new("").is_err());
        assert!(ApiClient::new("ftp://files.example.com").is_err());
    }

    #[test]
    fn entity_urls_are_relative_to_base() {
        let request = client().fetch::<Ambulance>(&EntityId::new("A1")).unwrap();
        assert_eq!(request.method(), HttpMethod::Get);
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/ambulances/A1");
        assert_eq!(request.body_json(), None);

        let request = client().fetch_all::<Procedure>().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/procedures");

        let request = client().fetch_procedures_of(&EntityId::new("A1")).unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/api/ambulances/A1/procedures"
        );
    }

    #[test]
    fn ids_are_percent_encoded() {
        let request = client().delete::<Procedure>(&EntityId::new("a/b c")).unwrap();
        assert_eq!(request.method(), HttpMethod::Delete);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/api/procedures/a%2Fb%20c"
        );
    }

    #[test]
    fn create_posts_draft_without_id() {
        let mut entry = procedure();
        entry.id = EntityId::sentinel();
        let request = client().create(&entry).unwrap();
        assert_eq!(request.method(), HttpMethod::Post);
        let body = request.body_json().unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["ambulance_id"], "A1");
    }

    #[test]
    fn update_forces_target_id() {
        let request = client().update(&EntityId::new("P7"), &procedure()).unwrap();
        assert_eq!(request.method(), HttpMethod::Put);
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/procedures/P7");
        assert_eq!(request.body_json().unwrap()["id"], "P7");
    }

    #[test]
    fn approval_sends_partial_payload() {
        let request = client().approve_procedure(&EntityId::new("P1")).unwrap();
        assert_eq!(request.method(), HttpMethod::Put);
        assert_eq!(
            request.body_json().unwrap(),
            serde_json::json!({"visit_type": "Schválená"})
        );
    }

    #[test]
    fn non_success_status_uses_body_as_cause() {
        let err = accept(status_text(500, "database offline")).unwrap_err();
        assert_eq!(err.to_string(), "database offline");
        assert_eq!(err.body(), Some("database offline"));

        let err = accept(status_text(404, "")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP error 404");
        assert!(err.is_not_found());
        assert_eq!(err.body(), None);
    }

    #[test]
    fn transport_error_text_is_the_cause() {
        let err = accept(transport("connection refused")).unwrap_err();
        assert_matches::assert_matches!(&err, ServiceError::Transport(_));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn decodes_successful_body() {
        let decoded: Procedure = decode(ok_json(&procedure())).unwrap();
        assert_eq!(decoded, procedure());
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode::<Procedure>(status_text(200, "not json")).unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
