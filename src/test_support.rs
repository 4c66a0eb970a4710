//! In-memory [`ArmTransport`] for unit tests.

use crate::azure::{ArmOperation, ArmRequest, ArmTransport};
use crate::error::{UtilizationError, UtilizationResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Route {
    Url(String),
    Location(ArmOperation, String),
    Operation(ArmOperation),
}

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status(u16, String),
}

/// Answers requests from canned replies and records every request.
///
/// Routes are matched by exact URL, then by (operation, location), then by
/// operation. A route with several replies serves them in order and repeats
/// the last one.
#[derive(Default)]
pub(crate) struct StaticTransport {
    routes: HashMap<Route, Vec<Reply>>,
    served: Mutex<HashMap<Route, usize>>,
    requests: Mutex<Vec<ArmRequest>>,
    delay: Option<Duration>,
}

impl StaticTransport {
    pub fn new() -> StaticTransport {
        StaticTransport::default()
    }

    pub fn respond(self, operation: ArmOperation, value: Value) -> Self {
        self.route(Route::Operation(operation), vec![Reply::Json(value)])
    }

    pub fn respond_sequence(self, operation: ArmOperation, values: Vec<Value>) -> Self {
        let replies = values.into_iter().map(Reply::Json).collect();
        self.route(Route::Operation(operation), replies)
    }

    pub fn respond_for(self, operation: ArmOperation, location: &str, value: Value) -> Self {
        self.route(
            Route::Location(operation, location.to_ascii_lowercase()),
            vec![Reply::Json(value)],
        )
    }

    pub fn respond_url(self, url: &str, value: Value) -> Self {
        self.route(Route::Url(url.to_string()), vec![Reply::Json(value)])
    }

    pub fn fail(self, operation: ArmOperation, status: u16) -> Self {
        self.route(
            Route::Operation(operation),
            vec![Reply::Status(status, format!("{operation} unavailable"))],
        )
    }

    /// Delay every reply, to let concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, operation: ArmOperation) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    pub fn requests(&self) -> Vec<ArmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn route(mut self, route: Route, replies: Vec<Reply>) -> Self {
        self.routes.insert(route, replies);
        self
    }

    fn find_route(&self, request: &ArmRequest) -> Option<Route> {
        let mut candidates = vec![Route::Url(request.url.clone())];
        if let Some(location) = &request.location {
            candidates.push(Route::Location(request.operation, location.clone()));
        }
        candidates.push(Route::Operation(request.operation));
        candidates.into_iter().find(|r| self.routes.contains_key(r))
    }
}

#[async_trait]
impl ArmTransport for StaticTransport {
    async fn send(&self, request: &ArmRequest) -> UtilizationResult<Value> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.find_route(request).ok_or_else(|| {
            UtilizationError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no canned reply for {} {}", request.operation, request.url),
            ))
        })?;
        let replies = &self.routes[&route];
        let reply = {
            let mut served = self.served.lock().unwrap();
            let count = served.entry(route.clone()).or_insert(0);
            let reply = replies[(*count).min(replies.len() - 1)].clone();
            *count += 1;
            reply
        };

        match reply {
            Reply::Json(value) => Ok(value),
            Reply::Status(status, body) => Err(UtilizationError::UpstreamFailure {
                operation: request.operation,
                status,
                body,
            }),
        }
    }
}
