//! C7 — bearer-token gate on streaming RPCs. Runs as a `tonic::Interceptor`,
//! before the handler and before any stream I/O (spec.md §4.6).

use tonic::{Request, Status};

#[derive(Clone)]
pub struct BearerAuth {
    token: Option<String>,
}

impl BearerAuth {
    /// `token = None` makes every call pass unchecked (spec.md §4.6 "no-op
    /// if no token configured").
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl tonic::service::Interceptor for BearerAuth {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        let Some(expected) = &self.token else {
            return Ok(request);
        };

        let presented = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if token == expected => Ok(request),
            _ => Err(Status::unauthenticated("missing or invalid bearer token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::service::Interceptor;
    use tonic::metadata::MetadataValue;

    fn request_with_auth_header(value: Option<&str>) -> Request<()> {
        let mut request = Request::new(());
        if let Some(value) = value {
            request
                .metadata_mut()
                .insert("authorization", MetadataValue::try_from(value).unwrap());
        }
        request
    }

    #[test]
    fn no_token_configured_passes_every_request() {
        let mut auth = BearerAuth::new(None);
        assert!(auth.call(request_with_auth_header(None)).is_ok());
    }

    #[test]
    fn matching_bearer_token_passes() {
        let mut auth = BearerAuth::new(Some("secret".to_owned()));
        assert!(auth.call(request_with_auth_header(Some("Bearer secret"))).is_ok());
    }

    #[test]
    fn missing_header_is_rejected_when_token_is_configured() {
        let mut auth = BearerAuth::new(Some("secret".to_owned()));
        assert!(auth.call(request_with_auth_header(None)).is_err());
    }

    #[test]
    fn wrong_token_is_rejected() {
        let mut auth = BearerAuth::new(Some("secret".to_owned()));
        assert!(auth.call(request_with_auth_header(Some("Bearer wrong"))).is_err());
    }
}
