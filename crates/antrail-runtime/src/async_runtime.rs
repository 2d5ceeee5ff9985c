//! Async driver for a [`PlaybackController`].
//!
//! [`PlaybackDriver`] owns the controller, a tokio interval at the reference
//! tick length, and the channel routed lookups are answered on. Everything
//! runs on the driver's task; route lookups are the only work spawned off it,
//! and their answers are applied between ticks.
//!
//! # Feature Flag
//!
//! This module requires the `async` feature:
//! ```toml
//! antrail-runtime = { version = "0.3", features = ["async"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use antrail_runtime::prelude::*;
//!
//! let mut driver = PlaybackDriver::new(controller).with_provider(router);
//! driver.start()?;
//! driver.run_to_end(|frame, _outcome| draw(frame)).await?;
//! ```

#![cfg(feature = "async")]

use crate::controller::{Frame, PlaybackController, TickOutcome};
use crate::resolver::RouteRequest;
use crate::scheduler::FrameToken;
use antrail_core::error::{ResolutionFailure, Result};
use antrail_core::types::Point;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// An external routing collaborator.
///
/// Points are render-plane points: for geographic graphs `x` is the
/// longitude and `y` the latitude. Failure is an ordinary outcome.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, from: Point, to: Point) -> std::result::Result<Vec<Point>, ResolutionFailure>;
}

/// The answer to one routed lookup.
#[derive(Debug)]
pub struct RouteCompletion {
    pub request: RouteRequest,
    pub result: std::result::Result<Vec<Point>, ResolutionFailure>,
}

/// Why the driver woke up.
#[derive(Debug)]
pub enum Wake {
    Tick { token: FrameToken, dt: Duration },
    Route(RouteCompletion),
}

/// Drives a controller from a timer.
pub struct PlaybackDriver {
    controller: PlaybackController,
    provider: Option<Arc<dyn RouteProvider>>,
    interval: Interval,
    last_tick: Instant,
    completions_tx: mpsc::UnboundedSender<RouteCompletion>,
    completions_rx: mpsc::UnboundedReceiver<RouteCompletion>,
}

impl PlaybackDriver {
    /// Must be called from within a tokio runtime.
    pub fn new(controller: PlaybackController) -> Self {
        let mut interval = tokio::time::interval(controller.config().reference_dt());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            provider: None,
            interval,
            last_tick: Instant::now(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn RouteProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn set_provider(&mut self, provider: Option<Arc<dyn RouteProvider>>) {
        self.provider = provider;
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Direct access for loads, graph swaps and stops. Lookups queued
    /// through it go out with the next tick.
    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    pub fn into_controller(self) -> PlaybackController {
        self.controller
    }

    /// Start playback and restart the tick clock.
    pub fn start(&mut self) -> Result<FrameToken> {
        let token = self.controller.start()?;
        self.interval.reset();
        self.last_tick = Instant::now();
        self.dispatch_routes();
        Ok(token)
    }

    /// Wait for the next tick (only while animating) or route answer.
    ///
    /// Never returns while idle with no lookups outstanding; hosts select
    /// it against their own command sources.
    pub async fn wake(&mut self) -> Wake {
        loop {
            let token = self.controller.frame_token();
            tokio::select! {
                now = self.interval.tick(), if token.is_some() => {
                    let dt = now.saturating_duration_since(self.last_tick);
                    self.last_tick = now;
                    if let Some(token) = token {
                        return Wake::Tick { token, dt };
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    return Wake::Route(completion);
                }
            }
        }
    }

    /// Apply a wake-up. Returns the tick outcome for ticks.
    pub fn handle(&mut self, wake: Wake) -> Result<Option<TickOutcome>> {
        match wake {
            Wake::Tick { token, dt } => {
                let outcome = self.controller.tick_scheduled(token, dt);
                self.dispatch_routes();
                outcome.map(Some)
            }
            Wake::Route(completion) => {
                self.controller
                    .complete_route(&completion.request, completion.result);
                Ok(None)
            }
        }
    }

    /// Drive the current run to its end, calling `on_frame` after each tick.
    /// Starts playback first if the controller is ready.
    pub async fn run_to_end<F>(&mut self, mut on_frame: F) -> Result<()>
    where
        F: FnMut(&Frame, &TickOutcome),
    {
        if !self.controller.is_animating() {
            self.start()?;
        }
        while self.controller.is_animating() {
            let wake = self.wake().await;
            if let Some(outcome) = self.handle(wake)? {
                on_frame(&self.controller.frame(), &outcome);
            }
        }
        Ok(())
    }

    /// Send queued lookups to the provider. Without one, every lookup fails
    /// at once and the edge stays straight.
    fn dispatch_routes(&mut self) {
        for request in self.controller.take_route_requests() {
            match &self.provider {
                Some(provider) => {
                    let provider = Arc::clone(provider);
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let result = provider.route(request.from_point, request.to_point).await;
                        // The driver may be gone; nothing is waiting then.
                        let _ = tx.send(RouteCompletion { request, result });
                    });
                }
                None => {
                    debug!(edge = %request.key, "no route provider configured");
                    self.controller.complete_route(
                        &request,
                        Err(ResolutionFailure::new("no route provider configured")),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathMode, PlaybackConfig};
    use antrail_core::graph::GraphModel;
    use antrail_core::ingest::parse_trace;
    use antrail_core::types::{Edge, Node, NodeId};

    fn controller(path_mode: PathMode) -> PlaybackController {
        let graph = GraphModel::new(
            vec![Node::planar("A", 0.0, 0.0), Node::planar("B", 4.0, 0.0)],
            vec![Edge::new("A", "B", 1.0)],
        )
        .unwrap();
        let mut controller = PlaybackController::with_graph(
            graph,
            PlaybackConfig {
                seed: Some(3),
                settle_delay_ms: 100,
                path_mode,
                ..PlaybackConfig::default()
            },
        )
        .unwrap();
        controller
            .load_trace(
                parse_trace(
                    r#"{"best_path": ["A", "B"], "distance": 1.0, "iterations": [
                        {"iteration": 1, "best_distance": 1.0, "best_path": ["A", "B"],
                         "paths": [[["A", "B"], 1.0]], "pheromone_levels": {}}]}"#,
                )
                .unwrap(),
            )
            .unwrap();
        controller
    }

    struct Detour;

    #[async_trait]
    impl RouteProvider for Detour {
        async fn route(
            &self,
            from: Point,
            to: Point,
        ) -> std::result::Result<Vec<Point>, ResolutionFailure> {
            Ok(vec![from, Point::new(2.0, 3.0), to])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_trace_to_the_end() {
        let mut driver = PlaybackDriver::new(controller(PathMode::Straight));
        let mut ticks = 0;
        driver.run_to_end(|_, _| ticks += 1).await.unwrap();
        assert!(ticks > 0);
        assert!(!driver.controller().is_animating());
        assert!(driver.controller().agents().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn routes_arrive_between_ticks() {
        let mut driver = PlaybackDriver::new(controller(PathMode::Routed)).with_provider(Arc::new(Detour));
        driver.start().unwrap();

        let (a, b) = (NodeId::from("A"), NodeId::from("B"));
        while !driver.controller().resolver().is_cached(&a, &b) {
            let wake = driver.wake().await;
            driver.handle(wake).unwrap();
        }
        if driver.controller().is_animating() {
            driver.controller_mut().stop().unwrap();
        }
        assert_eq!(driver.controller().resolver().cached_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_provider_falls_back_to_straight() {
        let mut driver = PlaybackDriver::new(controller(PathMode::Routed));
        driver.start().unwrap();
        assert!(driver
            .controller()
            .resolver()
            .is_cached(&NodeId::from("A"), &NodeId::from("B")));
    }
}
