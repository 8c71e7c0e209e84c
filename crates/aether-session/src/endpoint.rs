//! Endpoint resolution: which base URL is active, and is it reachable.
//!
//! Resolution is split in three steps so that overlapping resolutions can be
//! ordered by generation rather than by arrival:
//!
//! 1. [`EndpointResolver::begin`] issues a ticket and applies the parts of
//!    the decision that need no network (explicit modes switch the endpoint
//!    immediately).
//! 2. [`ResolveRequest::run`] performs the probe. It borrows nothing from
//!    the resolver and may be awaited concurrently with newer requests.
//! 3. [`EndpointResolver::apply`] commits the outcome if its ticket is
//!    still current and drops it otherwise.

use std::time::Instant;

use aether_core::{ActiveEndpoint, EndpointKind, HealthStatus, SearchBackend, ServerMode};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::generation::{Generation, Ticket};

/// Outcome of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub ticket: Ticket,
    pub mode: ServerMode,
    pub endpoint: ActiveEndpoint,
    pub status: HealthStatus,
}

/// A resolution that has been started but not yet probed.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub ticket: Ticket,
    pub mode: ServerMode,
    local: ActiveEndpoint,
    cloud: ActiveEndpoint,
}

impl ResolveRequest {
    /// Probe according to the mode. Never fails: probe errors become an
    /// `Offline` status (explicit modes) or the cloud fallback (auto).
    pub async fn run(self, backend: &dyn SearchBackend) -> Resolution {
        let started = Instant::now();
        let (endpoint, status) = match self.mode {
            ServerMode::Local => {
                let status = probe(backend, &self.local, HealthStatus::OnlineLocal).await;
                (self.local, status)
            }
            ServerMode::Cloud => {
                let status = probe(backend, &self.cloud, HealthStatus::OnlineCloud).await;
                (self.cloud, status)
            }
            ServerMode::Auto => match backend.probe_health(self.local.as_str()).await {
                Ok(()) => (self.local, HealthStatus::OnlineLocal),
                Err(e) => {
                    // Cloud is assumed reachable without a second probe.
                    warn!(
                        subsystem = "session",
                        component = "endpoint",
                        local = %self.local,
                        cloud = %self.cloud,
                        error = %e,
                        "Local engine unreachable, falling back to cloud"
                    );
                    (self.cloud, HealthStatus::OnlineCloud)
                }
            },
        };

        debug!(
            subsystem = "session",
            component = "endpoint",
            generation = self.ticket.value(),
            mode = %self.mode,
            endpoint = %endpoint,
            status = %status,
            duration_ms = started.elapsed().as_millis() as u64,
            "Endpoint probe finished"
        );

        Resolution {
            ticket: self.ticket,
            mode: self.mode,
            endpoint,
            status,
        }
    }
}

async fn probe(
    backend: &dyn SearchBackend,
    endpoint: &ActiveEndpoint,
    online: HealthStatus,
) -> HealthStatus {
    match backend.probe_health(endpoint.as_str()).await {
        Ok(()) => online,
        Err(e) => {
            warn!(
                subsystem = "session",
                component = "endpoint",
                endpoint = %endpoint,
                error = %e,
                "Selected engine failed its health probe"
            );
            HealthStatus::Offline
        }
    }
}

/// Tracks the selected mode, the active endpoint and its health.
#[derive(Debug)]
pub struct EndpointResolver {
    local: ActiveEndpoint,
    cloud: ActiveEndpoint,
    mode: ServerMode,
    endpoint: ActiveEndpoint,
    status: HealthStatus,
    generation: Generation,
}

impl EndpointResolver {
    /// Start in `config.default_mode`, status `Checking`. The initial
    /// endpoint is the one the mode implies (auto starts on local).
    pub fn new(config: &SessionConfig) -> Self {
        let local = ActiveEndpoint {
            kind: EndpointKind::Local,
            base_url: config.local_url.clone(),
        };
        let cloud = ActiveEndpoint {
            kind: EndpointKind::Cloud,
            base_url: config.cloud_url.clone(),
        };
        let endpoint = match config.default_mode {
            ServerMode::Cloud => cloud.clone(),
            ServerMode::Local | ServerMode::Auto => local.clone(),
        };

        Self {
            local,
            cloud,
            mode: config.default_mode,
            endpoint,
            status: HealthStatus::Checking,
            generation: Generation::new(),
        }
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    pub fn endpoint(&self) -> &ActiveEndpoint {
        &self.endpoint
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// True while the latest issued resolution has not been applied.
    pub fn is_resolving(&self) -> bool {
        self.status == HealthStatus::Checking
    }

    /// Start resolving `mode`, superseding any resolution in flight.
    pub fn begin(&mut self, mode: ServerMode) -> ResolveRequest {
        let ticket = self.generation.advance();
        self.mode = mode;
        self.status = HealthStatus::Checking;

        // Explicit choices are trusted before the probe answers.
        match mode {
            ServerMode::Local => self.endpoint = self.local.clone(),
            ServerMode::Cloud => self.endpoint = self.cloud.clone(),
            ServerMode::Auto => {}
        }

        debug!(
            subsystem = "session",
            component = "endpoint",
            generation = ticket.value(),
            mode = %mode,
            "Endpoint resolution started"
        );

        ResolveRequest {
            ticket,
            mode,
            local: self.local.clone(),
            cloud: self.cloud.clone(),
        }
    }

    /// Commit `resolution` if it is the latest one. Returns whether it was
    /// applied.
    pub fn apply(&mut self, resolution: Resolution) -> bool {
        if !self.generation.is_current(resolution.ticket) {
            debug!(
                subsystem = "session",
                component = "endpoint",
                generation = resolution.ticket.value(),
                current = self.generation.current().value(),
                mode = %resolution.mode,
                "Discarding stale endpoint resolution"
            );
            return false;
        }

        info!(
            subsystem = "session",
            component = "endpoint",
            mode = %resolution.mode,
            endpoint = %resolution.endpoint,
            status = %resolution.status,
            "Endpoint resolved"
        );
        self.endpoint = resolution.endpoint;
        self.status = resolution.status;
        true
    }

    /// Begin, probe and apply in sequence.
    pub async fn resolve(&mut self, backend: &dyn SearchBackend, mode: ServerMode) -> Resolution {
        let resolution = self.begin(mode).run(backend).await;
        self.apply(resolution.clone());
        resolution
    }
}
