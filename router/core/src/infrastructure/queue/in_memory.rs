// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Single-owner in-memory queue.
//!
//! One tokio task owns the `VecDeque`; every operation is a command sent over
//! an mpsc channel and answered on a oneshot. The owning task processes one
//! command at a time, which is what makes FIFO order trivially correct.
//!
//! The same actor backs [`super::distributed::DistributedQueue`], which adds a
//! capacity ceiling and a notification topic.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::queue::{QueueError, QueueEvent, SignalQueue};
use crate::domain::signal::Signal;
use crate::infrastructure::pubsub::PubSub;
use crate::telemetry;

pub(crate) const COMMAND_BUFFER: usize = 1024;

enum Command<T> {
    Push(T, oneshot::Sender<Result<(), QueueError>>),
    Pop(oneshot::Sender<Option<T>>),
    Len(oneshot::Sender<usize>),
    Snapshot(oneshot::Sender<Vec<T>>),
    Cleanup(oneshot::Sender<()>),
}

/// Where an actor announces successful pushes and pops
pub(crate) struct Notifier<T> {
    pub(crate) pubsub: Arc<dyn PubSub<QueueEvent<T>>>,
    pub(crate) topic: String,
}

struct QueueActor<T> {
    name: String,
    items: VecDeque<T>,
    capacity: Option<usize>,
    notifier: Option<Notifier<T>>,
    commands: mpsc::Receiver<Command<T>>,
}

impl<T> QueueActor<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        debug!(queue = %self.name, "Queue actor started");
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Push(item, reply) => {
                    let _ = reply.send(self.push(item));
                }
                Command::Pop(reply) => {
                    let item = self.items.pop_front();
                    if let Some(popped) = &item {
                        self.notify(QueueEvent::Popped(popped.clone()));
                    }
                    let _ = reply.send(item);
                }
                Command::Len(reply) => {
                    let _ = reply.send(self.items.len());
                }
                Command::Snapshot(reply) => {
                    let _ = reply.send(self.items.iter().cloned().collect());
                }
                Command::Cleanup(reply) => {
                    let dropped = self.items.len();
                    self.items.clear();
                    info!(queue = %self.name, dropped, "Queue cleaned up");
                    let _ = reply.send(());
                    break;
                }
            }
        }
        debug!(queue = %self.name, "Queue actor stopped");
    }

    fn push(&mut self, item: T) -> Result<(), QueueError> {
        if let Some(capacity) = self.capacity {
            if self.items.len() >= capacity {
                warn!(queue = %self.name, capacity, "Queue full, rejecting push");
                metrics::counter!(telemetry::QUEUE_REJECTIONS, "queue" => self.name.clone())
                    .increment(1);
                return Err(QueueError::Full { capacity });
            }
        }
        if self.notifier.is_some() {
            self.notify(QueueEvent::Pushed(item.clone()));
        }
        self.items.push_back(item);
        Ok(())
    }

    fn notify(&self, event: QueueEvent<T>) {
        if let Some(notifier) = &self.notifier {
            notifier.pubsub.publish(&notifier.topic, event);
        }
    }
}

/// Cloneable handle to a running queue actor
pub(crate) struct ActorHandle<T> {
    name: String,
    capacity: Option<usize>,
    commands: mpsc::Sender<Command<T>>,
}

impl<T> Clone for ActorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            capacity: self.capacity,
            commands: self.commands.clone(),
        }
    }
}

impl<T> ActorHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn the owning task. Must be called from within a tokio runtime.
    pub(crate) fn spawn(name: &str, capacity: Option<usize>, notifier: Option<Notifier<T>>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = QueueActor {
            name: name.to_string(),
            items: VecDeque::new(),
            capacity,
            notifier,
            commands: rx,
        };
        tokio::spawn(actor.run());
        Self {
            name: name.to_string(),
            capacity,
            commands: tx,
        }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> Command<T>,
    ) -> Result<R, QueueError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(build(reply_tx))
            .await
            .map_err(|_| QueueError::Closed)?;
        reply_rx.await.map_err(|_| QueueError::Closed)
    }

    /// Bounded queues never wait on the command channel: a push that finds
    /// it saturated is rejected as `Full` like one that finds the buffer full.
    pub(crate) async fn push(&self, item: T) -> Result<(), QueueError> {
        let Some(capacity) = self.capacity else {
            return self.request(|reply| Command::Push(item, reply)).await?;
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        match self.commands.try_send(Command::Push(item, reply_tx)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(queue = %self.name, capacity, "Queue command backlog saturated, rejecting push");
                metrics::counter!(telemetry::QUEUE_REJECTIONS, "queue" => self.name.clone())
                    .increment(1);
                return Err(QueueError::Full { capacity });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return Err(QueueError::Closed),
        }
        reply_rx.await.map_err(|_| QueueError::Closed)?
    }

    pub(crate) async fn pop(&self) -> Result<Option<T>, QueueError> {
        self.request(Command::Pop).await
    }

    pub(crate) async fn len(&self) -> Result<usize, QueueError> {
        self.request(Command::Len).await
    }

    pub(crate) async fn to_list(&self) -> Result<Vec<T>, QueueError> {
        self.request(Command::Snapshot).await
    }

    pub(crate) async fn cleanup(&self) -> Result<(), QueueError> {
        match self.request(Command::Cleanup).await {
            Ok(()) | Err(QueueError::Closed) => Ok(()),
            Err(other) => Err(other),
        }
    }
}

/// Unbounded FIFO owned by a single task
pub struct InMemoryQueue<T = Signal> {
    name: String,
    actor: ActorHandle<T>,
}

impl<T> Clone for InMemoryQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            actor: self.actor.clone(),
        }
    }
}

impl<T> InMemoryQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start the owning task. Must be called from within a tokio runtime.
    pub fn spawn(name: impl Into<String>) -> Self {
        let name = name.into();
        let actor = ActorHandle::spawn(&name, None, None);
        Self { name, actor }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<T> SignalQueue<T> for InMemoryQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn push(&self, item: T) -> Result<(), QueueError> {
        self.actor.push(item).await
    }

    async fn pop(&self) -> Result<Option<T>, QueueError> {
        self.actor.pop().await
    }

    async fn len(&self) -> Result<usize, QueueError> {
        self.actor.len().await
    }

    async fn cleanup(&self) -> Result<(), QueueError> {
        self.actor.cleanup().await
    }

    async fn to_list(&self) -> Result<Vec<T>, QueueError> {
        self.actor.to_list().await
    }
}
