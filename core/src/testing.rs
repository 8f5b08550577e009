//! Scripted transport for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::auth::AuthConfig;
use crate::client::WatershedClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Replays canned responses in order and records every request sent.
/// Running out of responses is reported as a transport error.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    sent: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<(u16, &str)>) -> Self {
        let responses = responses
            .into_iter()
            .map(|(status, body)| HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            })
            .collect();
        Self {
            responses: RefCell::new(responses),
            sent: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn sent(&self) -> Vec<HttpRequest> {
        self.sent.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no scripted response left".to_string()))
    }
}

pub(crate) fn scripted_client(responses: Vec<(u16, &str)>) -> WatershedClient<ScriptedTransport> {
    WatershedClient::with_transport(
        ClientConfig::new("https://watershedlrs.com", &AuthConfig::basic("a", "b")),
        ScriptedTransport::new(responses),
    )
}
