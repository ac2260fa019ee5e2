// src/runtime.rs
//! Single-task event loop around the `Controller`.
//!
//! Feed events, bucket ticks and user commands are multiplexed with
//! `tokio::select!` in one task, so every handler runs to completion before the
//! next one starts and the aggregation state needs no lock. The feed connect
//! runs in its own task so a slow endpoint never holds up ticks or commands.
//! Commands, ticks, feed state changes and matched events publish a fresh
//! `Snapshot` on a watch channel; dropped events publish nothing.

use anyhow::Context as _;
use std::pin::pin;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::engine::{Controller, Outcome};
use crate::feed::{Event, FeedSource};
use crate::snapshot::Snapshot;
use crate::terms::TermError;

/// Requests from the HTTP surface.
#[derive(Debug)]
pub enum Command {
    AddTerm {
        term: String,
        reply: oneshot::Sender<Result<Vec<String>, TermError>>,
    },
    RemoveTerm {
        term: String,
        reply: oneshot::Sender<(bool, Vec<String>)>,
    },
    Start {
        input: String,
        reply: oneshot::Sender<Result<Vec<String>, TermError>>,
    },
}

/// Cloneable handle to a running controller.
#[derive(Clone)]
pub struct AppHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error(transparent)]
    Term(#[from] TermError),
    #[error("controller is not running")]
    Stopped,
}

impl AppHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Track one term; returns the full term list.
    pub async fn add_term(&self, term: String) -> Result<Vec<String>, HandleError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::AddTerm { term, reply }).await?;
        Ok(rx.await.map_err(|_| HandleError::Stopped)??)
    }

    /// Untrack one term; returns whether it existed and the remaining list.
    pub async fn remove_term(&self, term: String) -> Result<(bool, Vec<String>), HandleError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RemoveTerm { term, reply }).await?;
        rx.await.map_err(|_| HandleError::Stopped)
    }

    /// Batch start; returns the full term list.
    pub async fn start(&self, input: String) -> Result<Vec<String>, HandleError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { input, reply }).await?;
        Ok(rx.await.map_err(|_| HandleError::Stopped)??)
    }

    async fn send(&self, cmd: Command) -> Result<(), HandleError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| HandleError::Stopped)
    }
}

/// Spawn the controller loop. The feed is subscribed once the first term is
/// tracked. The loop ends when every `AppHandle` has been dropped.
pub fn spawn(controller: Controller, feed: Arc<dyn FeedSource>) -> (AppHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let mut controller = controller;
    let (snap_tx, snap_rx) = watch::channel(controller.snapshot());
    let task = tokio::spawn(run(controller, feed, cmd_rx, snap_tx));
    (
        AppHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
        },
        task,
    )
}

/// Wait for the controller task and log how it ended. Once it is gone every
/// API call answers `Stopped`.
pub async fn supervise(task: JoinHandle<()>) {
    match task.await {
        Ok(()) => info!(target: "controller", "controller task finished"),
        Err(e) if e.is_panic() => {
            error!(target: "controller", error = %e, "controller task panicked")
        }
        Err(e) => warn!(target: "controller", error = %e, "controller task cancelled"),
    }
}

type Subscription = JoinHandle<anyhow::Result<mpsc::Receiver<Event>>>;

async fn run(
    mut controller: Controller,
    feed: Arc<dyn FeedSource>,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Snapshot>,
) {
    let mut events: Option<mpsc::Receiver<Event>> = None;
    let mut connecting: Option<Subscription> = None;
    let mut subscribed = false;
    let mut ticker = pin!(sleep(controller.bucket_width()));

    loop {
        let publish = tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else {
                    info!(target: "controller", "all handles dropped; shutting down");
                    break;
                };
                let reply = apply(&mut controller, cmd);
                if !subscribed && !controller.terms().is_empty() {
                    subscribed = true;
                    controller.mark_feed_connecting();
                    let feed = Arc::clone(&feed);
                    connecting = Some(tokio::spawn(async move { feed.subscribe().await }));
                }
                // Publish before replying so a caller never reads a stale snapshot.
                snapshots.send_replace(controller.snapshot());
                reply.send();
                false
            }
            res = connected(&mut connecting) => {
                connecting = None;
                events = accept(&mut controller, feed.name(), res);
                true
            }
            ev = next_event(&mut events) => match ev {
                Some(ev) => matches!(controller.handle_event(ev), Outcome::Matched { .. }),
                None => {
                    warn!(target: "feed", source = feed.name(), "feed closed; no further updates");
                    events = None;
                    controller.mark_feed_closed();
                    true
                }
            },
            _ = &mut ticker => {
                let width = controller.tick();
                ticker.as_mut().reset(Instant::now() + width);
                true
            }
        };

        if publish {
            snapshots.send_replace(controller.snapshot());
        }
    }

    if let Some(pending) = connecting {
        pending.abort();
    }
}

fn accept(
    controller: &mut Controller,
    source: &str,
    res: anyhow::Result<mpsc::Receiver<Event>>,
) -> Option<mpsc::Receiver<Event>> {
    match res {
        Ok(rx) => {
            info!(target: "feed", source, "feed subscribed");
            controller.mark_feed_live();
            Some(rx)
        }
        Err(e) => {
            warn!(target: "feed", source, error = %format!("{e:#}"), "feed subscribe failed");
            controller.mark_feed_closed();
            None
        }
    }
}

/// Result of the in-flight subscription, or pending forever when none is.
async fn connected(connecting: &mut Option<Subscription>) -> anyhow::Result<mpsc::Receiver<Event>> {
    match connecting {
        Some(task) => task.await.context("feed subscribe task")?,
        None => std::future::pending().await,
    }
}

/// A command result waiting to be delivered.
enum Reply {
    Terms(oneshot::Sender<Result<Vec<String>, TermError>>, Result<Vec<String>, TermError>),
    Removed(oneshot::Sender<(bool, Vec<String>)>, (bool, Vec<String>)),
}

impl Reply {
    fn send(self) {
        // A dropped receiver only means the HTTP caller went away.
        match self {
            Reply::Terms(tx, v) => {
                let _ = tx.send(v);
            }
            Reply::Removed(tx, v) => {
                let _ = tx.send(v);
            }
        }
    }
}

fn apply(controller: &mut Controller, cmd: Command) -> Reply {
    match cmd {
        Command::AddTerm { term, reply } => {
            let res = controller
                .add_term(&term)
                .map(|_| controller.terms().as_slice().to_vec());
            Reply::Terms(reply, res)
        }
        Command::RemoveTerm { term, reply } => {
            let removed = controller.remove_term(&term);
            Reply::Removed(reply, (removed, controller.terms().as_slice().to_vec()))
        }
        Command::Start { input, reply } => {
            let res = controller
                .start(&input)
                .map(|_| controller.terms().as_slice().to_vec());
            Reply::Terms(reply, res)
        }
    }
}

/// Next feed event, or pending forever while there is no subscription.
async fn next_event(events: &mut Option<mpsc::Receiver<Event>>) -> Option<Event> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
