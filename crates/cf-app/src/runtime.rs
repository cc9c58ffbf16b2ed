//! The dispatch loop.
//!
//! Everything runs on the calling thread: due model ticks first, then any
//! pending endpoint requests, then a short sleep until the next deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::PlantConfig;
use crate::endpoint::Endpoint;
use crate::error::AppResult;
use crate::server::ReactorServer;

/// Longest sleep between two polls of the endpoint and the stop flag.
const POLL_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Stop after this many model ticks.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub requests: u64,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct Runtime {
    server: ReactorServer,
    endpoint: Option<Endpoint>,
}

impl Runtime {
    /// Build the server and open the endpoint if the config asks for one.
    pub fn new(config: &PlantConfig) -> AppResult<Self> {
        let server = ReactorServer::build(config, Instant::now())?;
        let endpoint = config.listen.as_deref().map(Endpoint::bind).transpose()?;
        Ok(Self { server, endpoint })
    }

    pub fn server(&self) -> &ReactorServer {
        &self.server
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Run until `stop` is set or the tick limit is reached.
    pub fn run_until(&mut self, stop: &AtomicBool, options: RunOptions) -> RunSummary {
        let started = Instant::now();
        let first_tick = self.server.tick_count();
        let mut requests = 0u64;

        while !stop.load(Ordering::SeqCst) {
            self.server.run_pending(Instant::now());
            let ticks = self.server.tick_count() - first_tick;
            if options.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }

            if let Some(endpoint) = self.endpoint.as_mut() {
                let server = &self.server;
                requests += endpoint.poll(|line| server.handle_line(line)) as u64;
            }

            let now = Instant::now();
            let wait = self
                .server
                .next_deadline()
                .map_or(POLL_SLICE, |due| due.saturating_duration_since(now))
                .min(POLL_SLICE);
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }

        let summary = RunSummary {
            ticks: self.server.tick_count() - first_tick,
            requests,
            elapsed: started.elapsed(),
        };
        info!(
            ticks = summary.ticks,
            requests = summary.requests,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "dispatch loop stopped"
        );
        summary
    }

    /// Close the endpoint and release the plant.
    pub fn shutdown(self) {
        drop(self.endpoint);
        self.server.shutdown();
    }
}
