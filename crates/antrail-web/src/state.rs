//! Application state for the web server.
//!
//! Playback runs on a dedicated thread with its own single-threaded tokio
//! runtime, so every tick, route completion and command is applied by one
//! task in arrival order. Handlers reach it through a command channel and
//! get their answers on oneshot replies.

use crate::error::ApiError;
use antrail::prelude::{
    AntrailError, BlockedEdges, CoordinateSystem, Distance, EdgeOverlay, Frame, GraphModel,
    GraphPayload, GraphServiceClient, NewNode, NodeId, OptimizeResponse, OsrmRouter, PathMode,
    PlaybackConfig, PlaybackController, PlaybackDriver, PlaybackState, RouteProvider,
    RouterConfig, SpawnFilter, TickOutcome, ValidationError, Wake,
};
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

type Reply<T> = oneshot::Sender<T>;

/// Commands sent to the playback worker thread.
enum Command {
    Graph(Reply<GraphPayload>),
    ReplaceGraph(GraphModel, Reply<GraphPayload>),
    Blocked(Reply<BlockedEdges>),
    Block {
        a: NodeId,
        b: NodeId,
        reply: Reply<antrail::prelude::Result<BlockedEdges>>,
    },
    Unblock {
        a: NodeId,
        b: NodeId,
        reply: Reply<BlockedEdges>,
    },
    ClearBlocked(Reply<BlockedEdges>),
    LoadResponse(OptimizeResponse, Reply<antrail::prelude::Result<TraceSummary>>),
    Start {
        best_only: Option<bool>,
        routed: Option<bool>,
        reply: Reply<antrail::prelude::Result<Frame>>,
    },
    Stop(Reply<antrail::prelude::Result<Frame>>),
    Frame(Reply<Frame>),
    Overlay(Reply<Vec<EdgeOverlay>>),
}

/// Pushed to every WebSocket subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Update {
    Frame(Frame),
    Overlay(Vec<EdgeOverlay>),
    Graph(GraphPayload),
    /// Playback halted on an error.
    Stopped { reason: String },
}

/// What a loaded optimize run looks like.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub iterations: usize,
    pub best_path: Vec<NodeId>,
    pub distance: Distance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ants_per_iteration: Option<u32>,
}

/// Settings for the playback worker.
#[derive(Debug, Clone, Default)]
pub struct WorkerConfig {
    pub playback: PlaybackConfig,
    /// Router for routed mode. Without one, routed lookups fail at once and
    /// edges stay straight.
    pub router: Option<RouterConfig>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the playback worker.
    cmd_tx: mpsc::UnboundedSender<Command>,
    /// Broadcast channel for frames and overlays.
    update_tx: broadcast::Sender<Update>,
    client: Arc<GraphServiceClient>,
}

impl AppState {
    /// Spawn the playback worker. The graph starts empty until
    /// [`reload_graph`](Self::reload_graph) succeeds.
    pub fn new(client: GraphServiceClient, config: WorkerConfig) -> anyhow::Result<Self> {
        let controller = PlaybackController::new(config.playback)?;
        let provider: Option<Arc<dyn RouteProvider>> = match config.router {
            Some(router) => Some(Arc::new(OsrmRouter::new(router)?)),
            None => None,
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (update_tx, _) = broadcast::channel(256);
        let updates = update_tx.clone();

        thread::Builder::new()
            .name("antrail-playback".into())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut driver = PlaybackDriver::new(controller);
                    driver.set_provider(provider);
                    let worker = Worker {
                        driver,
                        blocked: BlockedEdges::new(),
                        updates,
                    };
                    worker.run(cmd_rx).await;
                });
                debug!("playback worker stopped");
            })?;

        Ok(Self {
            cmd_tx,
            update_tx,
            client: Arc::new(client),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.update_tx.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, ApiError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| ApiError::Unavailable)?;
        rx.await.map_err(|_| ApiError::Unavailable)
    }

    pub async fn graph(&self) -> Result<GraphPayload, ApiError> {
        self.request(Command::Graph).await
    }

    /// Refetch the graph from the service and hand it to playback.
    pub async fn reload_graph(&self) -> Result<GraphPayload, ApiError> {
        let graph = self.client.get_graph().await?;
        self.request(|reply| Command::ReplaceGraph(graph, reply)).await
    }

    pub async fn add_node(&self, node: NewNode) -> Result<GraphPayload, ApiError> {
        if !(-90.0..=90.0).contains(&node.lat) || !(-180.0..=180.0).contains(&node.lng) {
            return Err(AntrailError::from(ValidationError::MalformedCoordinate {
                node: node.id,
                reason: "latitude or longitude out of range".into(),
            })
            .into());
        }
        self.client.add_node(&node).await?;
        self.reload_graph().await
    }

    pub async fn remove_node(&self, id: NodeId) -> Result<GraphPayload, ApiError> {
        self.client.remove_node(&id).await?;
        self.reload_graph().await
    }

    pub async fn blocked(&self) -> Result<BlockedEdges, ApiError> {
        self.request(Command::Blocked).await
    }

    pub async fn block(&self, a: NodeId, b: NodeId) -> Result<BlockedEdges, ApiError> {
        Ok(self.request(|reply| Command::Block { a, b, reply }).await??)
    }

    pub async fn unblock(&self, a: NodeId, b: NodeId) -> Result<BlockedEdges, ApiError> {
        self.request(|reply| Command::Unblock { a, b, reply }).await
    }

    pub async fn clear_blocked(&self) -> Result<BlockedEdges, ApiError> {
        self.request(Command::ClearBlocked).await
    }

    /// Optimize around the current overrides and load the resulting trace.
    pub async fn optimize(&self, start: NodeId, end: NodeId) -> Result<TraceSummary, ApiError> {
        let blocked = self.blocked().await?;
        let response = self.client.optimize(&start, &end, &blocked).await?;
        Ok(self
            .request(|reply| Command::LoadResponse(response, reply))
            .await??)
    }

    pub async fn start(
        &self,
        best_only: Option<bool>,
        routed: Option<bool>,
    ) -> Result<Frame, ApiError> {
        Ok(self
            .request(|reply| Command::Start {
                best_only,
                routed,
                reply,
            })
            .await??)
    }

    pub async fn stop(&self) -> Result<Frame, ApiError> {
        Ok(self.request(Command::Stop).await??)
    }

    pub async fn frame(&self) -> Result<Frame, ApiError> {
        self.request(Command::Frame).await
    }

    pub async fn overlay(&self) -> Result<Vec<EdgeOverlay>, ApiError> {
        self.request(Command::Overlay).await
    }
}

/// Why the worker woke up.
enum Event {
    Command(Command),
    Wake(Wake),
    Closed,
}

/// Owns the driver. Lives on the playback thread.
struct Worker {
    driver: PlaybackDriver,
    /// User overrides; the graph's own blocked flags live on the graph.
    blocked: BlockedEdges,
    updates: broadcast::Sender<Update>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let event = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => Event::Closed,
                },
                wake = self.driver.wake() => Event::Wake(wake),
            };
            match event {
                Event::Command(command) => self.handle_command(command),
                Event::Wake(wake) => self.handle_wake(wake),
                Event::Closed => break,
            }
        }
    }

    fn handle_wake(&mut self, wake: Wake) {
        match self.driver.handle(wake) {
            Ok(Some(TickOutcome::Stale)) | Ok(None) => {}
            Ok(Some(outcome)) => {
                self.publish_frame();
                if matches!(outcome, TickOutcome::Advanced { .. } | TickOutcome::Finished) {
                    self.publish_overlay();
                }
                if outcome == TickOutcome::Finished {
                    info!("playback finished");
                }
            }
            Err(e) => {
                warn!(error = %e, "playback stopped");
                self.publish(Update::Stopped {
                    reason: e.to_string(),
                });
                self.publish_frame();
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Graph(reply) => {
                let _ = reply.send(self.graph_payload());
            }
            Command::ReplaceGraph(graph, reply) => {
                self.driver.controller_mut().replace_graph(graph);
                self.prune_blocked();
                let payload = self.graph_payload();
                self.publish(Update::Graph(payload.clone()));
                self.publish_frame();
                self.publish_overlay();
                let _ = reply.send(payload);
            }
            Command::Blocked(reply) => {
                let _ = reply.send(self.blocked.clone());
            }
            Command::Block { a, b, reply } => {
                let result = self.block(a, b);
                if result.is_ok() {
                    self.publish_overlay();
                }
                let _ = reply.send(result);
            }
            Command::Unblock { a, b, reply } => {
                if self.blocked.remove(&a, &b) {
                    self.publish_overlay();
                }
                let _ = reply.send(self.blocked.clone());
            }
            Command::ClearBlocked(reply) => {
                self.blocked.clear();
                self.publish_overlay();
                let _ = reply.send(self.blocked.clone());
            }
            Command::LoadResponse(response, reply) => {
                let _ = reply.send(self.load(response));
            }
            Command::Start {
                best_only,
                routed,
                reply,
            } => {
                let result = self.start(best_only, routed);
                if result.is_ok() {
                    self.publish_frame();
                    self.publish_overlay();
                }
                let _ = reply.send(result);
            }
            Command::Stop(reply) => {
                let result = self.driver.controller_mut().stop().map(|()| {
                    let frame = self.driver.controller().frame();
                    info!("playback stopped");
                    frame
                });
                if result.is_ok() {
                    self.publish_frame();
                }
                let _ = reply.send(result);
            }
            Command::Frame(reply) => {
                let _ = reply.send(self.driver.controller().frame());
            }
            Command::Overlay(reply) => {
                let _ = reply.send(self.driver.controller().overlays(&self.blocked));
            }
        }
    }

    fn block(&mut self, a: NodeId, b: NodeId) -> antrail::prelude::Result<BlockedEdges> {
        let graph = self.driver.controller().graph();
        for id in [&a, &b] {
            if !graph.contains(id) {
                return Err(ValidationError::UnknownNode(id.clone()).into());
            }
        }
        if graph.edge_between(&a, &b).is_none() {
            return Err(ValidationError::Malformed(format!("no edge between {} and {}", a, b)).into());
        }
        if self.blocked.insert(a.clone(), b.clone()) {
            debug!(%a, %b, "edge blocked");
        }
        Ok(self.blocked.clone())
    }

    /// Drop overrides whose endpoints left the current graph.
    fn prune_blocked(&mut self) {
        let graph = Arc::clone(self.driver.controller().graph());
        let before = self.blocked.len();
        self.blocked.retain(|key| {
            let (a, b) = key.endpoints();
            graph.contains(a) && graph.contains(b)
        });
        if self.blocked.len() != before {
            debug!(dropped = before - self.blocked.len(), "pruned overrides for removed nodes");
        }
    }

    fn load(&mut self, response: OptimizeResponse) -> antrail::prelude::Result<TraceSummary> {
        let echoed_graph = response.graph.is_some();
        let summary = TraceSummary {
            iterations: response.trace.len(),
            best_path: response.trace.best_path.clone(),
            distance: response.trace.distance,
            total_iterations: response.trace.total_iterations,
            ants_per_iteration: response.trace.ants_per_iteration,
        };
        self.driver.controller_mut().load_response(response)?;
        if echoed_graph {
            self.prune_blocked();
            self.publish(Update::Graph(self.graph_payload()));
        }
        self.publish_frame();
        self.publish_overlay();
        Ok(summary)
    }

    fn start(
        &mut self,
        best_only: Option<bool>,
        routed: Option<bool>,
    ) -> antrail::prelude::Result<Frame> {
        let controller = self.driver.controller_mut();
        if controller.state() != PlaybackState::Ready {
            return Err(AntrailError::invalid_transition("start", controller.state()));
        }
        if let Some(best_only) = best_only {
            controller.set_spawn_filter(if best_only {
                SpawnFilter::BestOnly
            } else {
                SpawnFilter::AllPaths
            });
        }
        let routed = routed.unwrap_or(controller.config().path_mode == PathMode::Routed);
        let geographic =
            controller.graph().coordinate_system() == Some(CoordinateSystem::Geographic);
        if routed && !geographic {
            debug!("routed mode needs a geographic graph, drawing straight edges");
        }
        let mode = if routed && geographic {
            PathMode::Routed
        } else {
            PathMode::Straight
        };
        if controller.config().path_mode != mode {
            controller.set_path_mode(mode);
        }
        self.driver.start()?;
        Ok(self.driver.controller().frame())
    }

    fn graph_payload(&self) -> GraphPayload {
        GraphPayload::from_model(self.driver.controller().graph())
    }

    fn publish(&self, update: Update) {
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }

    fn publish_frame(&self) {
        self.publish(Update::Frame(self.driver.controller().frame()));
    }

    fn publish_overlay(&self) {
        self.publish(Update::Overlay(
            self.driver.controller().overlays(&self.blocked),
        ));
    }
}
