//! HTTP error plumbing.
//!
//! Public response bodies stay terse; the full diagnostic travels alongside
//! the response as an `ErrorReport` extension, where the response-logging
//! middleware picks it up.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::docs::pipeline::RenderFailure;

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::from_message(source, status, detail),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<RenderFailure> for HttpError {
    fn from(failure: RenderFailure) -> Self {
        const SOURCE: &str = "http::docs::render_failure";
        match &failure {
            RenderFailure::NotFound => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Document not found",
                failure.to_string(),
            ),
            RenderFailure::Fetch(_) => HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Fetching the document failed",
                failure.to_string(),
            ),
            RenderFailure::Format(_) => HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Document could not be decoded",
                failure.to_string(),
            ),
            RenderFailure::Render(_) => HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Document could not be rendered",
                failure.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = HttpError::from(RenderFailure::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
    }

    #[test]
    fn other_failures_map_to_500() {
        for failure in [
            RenderFailure::Fetch("boom".to_string()),
            RenderFailure::Format("bad bytes".to_string()),
            RenderFailure::Render("rejected".to_string()),
        ] {
            let response = HttpError::from(failure).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn report_collects_the_error_chain() {
        let io = std::io::Error::other("inner failure");
        let report =
            ErrorReport::from_error("test::source", StatusCode::INTERNAL_SERVER_ERROR, &io);
        assert_eq!(report.source, "test::source");
        assert_eq!(report.messages, vec!["inner failure".to_string()]);
    }
}
