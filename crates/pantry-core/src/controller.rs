//! List controller
//!
//! Owns the [`EditBuffer`] on a single task and applies every state
//! transition there, in order: user commands, remote snapshots, finished
//! image lookups and finished flushes all arrive through one mailbox. The
//! visible list is published on a `watch` channel.
//!
//! Image lookups and commits run on their own tasks and report back to the
//! owner exactly once, so neither blocks the other or the listener.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::buffer::{EditBuffer, FlushError, FlushOutcome, PendingEdits};
use crate::images::ImageSearch;
use crate::models::{Item, ItemDraft, ItemError, ItemId};
use crate::store::{DocumentStore, StoreError};
use crate::sync::{ListenerEvent, SubscriptionHandle, SyncListener};

/// What the user sees
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    /// Waiting for the first remote snapshot
    Loading,
    /// The current list
    Ready(ListView),
    /// The remote subscription failed
    LoadFailed(String),
}

impl ListState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading)
    }

    /// The visible items, if the list is ready
    pub fn items(&self) -> Option<&[Item]> {
        match self {
            ListState::Ready(view) => Some(&view.items),
            _ => None,
        }
    }
}

/// The visible list plus save status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub items: Vec<Item>,
    /// Unsaved local edits exist
    pub has_pending_changes: bool,
    /// A save is in flight
    pub saving: bool,
    /// Message from the last failed save
    pub last_error: Option<String>,
}

/// Errors returned by controller operations
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Item(#[from] ItemError),

    #[error(transparent)]
    Flush(#[from] FlushError),

    #[error("List controller has stopped")]
    Stopped,
}

type Reply<T> = oneshot::Sender<Result<T, ControllerError>>;

enum Command {
    Add {
        draft: ItemDraft,
        reply: Reply<Item>,
    },
    Resolved {
        item: Item,
        reply: Reply<Item>,
    },
    Delete {
        id: ItemId,
        reply: Reply<()>,
    },
    Save {
        reply: Reply<FlushOutcome>,
    },
    FlushFinished {
        result: Result<(), StoreError>,
    },
    Remote(ListenerEvent),
    Pending {
        reply: Reply<PendingEdits>,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Loading,
    Ready,
    LoadFailed(String),
}

/// State owned by the controller task
struct Owner {
    buffer: EditBuffer,
    restored: Option<PendingEdits>,
    phase: Phase,
    last_error: Option<String>,
    save_reply: Option<Reply<FlushOutcome>>,
    store: Arc<dyn DocumentStore>,
    images: Arc<dyn ImageSearch>,
    mailbox: mpsc::UnboundedSender<Command>,
    state: watch::Sender<ListState>,
}

impl Owner {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        listener: SubscriptionHandle,
    ) {
        while let Some(command) = commands.recv().await {
            if !matches!(command, Command::Remote(ListenerEvent::Snapshot(_))) {
                self.restore();
            }

            match command {
                Command::Add { draft, reply } => self.start_add(draft, reply),
                Command::Resolved { item, reply } => {
                    debug!("Adding pending item {} ({})", item.id, item.name);
                    self.buffer.add_pending(item.clone());
                    self.phase = Phase::Ready;
                    let _ = reply.send(Ok(item));
                }
                Command::Delete { id, reply } => {
                    debug!("Marking {} for deletion", id);
                    self.buffer.mark_pending_delete(&id);
                    self.phase = Phase::Ready;
                    let _ = reply.send(Ok(()));
                }
                Command::Save { reply } => self.start_save(reply),
                Command::FlushFinished { result } => self.finish_save(result),
                Command::Remote(ListenerEvent::Snapshot(items)) => {
                    self.buffer.apply_snapshot(items);
                    self.restore();
                    if self.phase == Phase::Loading {
                        self.phase = Phase::Ready;
                    }
                }
                Command::Remote(ListenerEvent::Failed(message)) => {
                    warn!("Remote listener stopped: {}", message);
                    self.phase = Phase::LoadFailed(format!("Failed to load items: {}", message));
                }
                Command::Pending { reply } => {
                    let _ = reply.send(Ok(self.buffer.pending().clone()));
                }
                Command::Shutdown => break,
            }
            self.publish();
        }

        listener.stop();
        if let Some(reply) = self.save_reply.take() {
            let _ = reply.send(Err(ControllerError::Stopped));
        }
        debug!("List controller stopped");
    }

    /// Bring back edits from an earlier session once, after the first
    /// snapshot has been adopted or before the first local command
    fn restore(&mut self) {
        if let Some(pending) = self.restored.take() {
            if !pending.is_empty() {
                info!(
                    "Restoring {} unsaved addition(s) and {} deletion(s)",
                    pending.additions.len(),
                    pending.deletions.len()
                );
            }
            self.buffer.restore_pending(pending);
        }
    }

    /// Resolve the image off the owner task, then come back to add the item
    fn start_add(&self, draft: ItemDraft, reply: Reply<Item>) {
        if let Err(e) = draft.validate() {
            let _ = reply.send(Err(e.into()));
            return;
        }

        let images = self.images.clone();
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let image_url = images.find_image(draft.search_query()).await;
            let item = match draft.into_item(image_url) {
                Ok(item) => item,
                Err(e) => {
                    let _ = reply.send(Err(e.into()));
                    return;
                }
            };
            if let Err(mpsc::error::SendError(Command::Resolved { reply, .. })) =
                mailbox.send(Command::Resolved { item, reply })
            {
                let _ = reply.send(Err(ControllerError::Stopped));
            }
        });
    }

    fn start_save(&mut self, reply: Reply<FlushOutcome>) {
        let batch = match self.buffer.begin_flush() {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                debug!("Nothing to save");
                self.last_error = None;
                let _ = reply.send(Ok(FlushOutcome::default()));
                return;
            }
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };

        info!("Saving {} change(s) to {}", batch.len(), self.store.describe());
        self.last_error = None;
        self.save_reply = Some(reply);

        let store = self.store.clone();
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = store.commit(batch).await;
            let _ = mailbox.send(Command::FlushFinished { result });
        });
    }

    fn finish_save(&mut self, result: Result<(), StoreError>) {
        let outcome = self.buffer.complete_flush(result);
        match &outcome {
            Ok(outcome) => {
                info!(
                    "Saved {} item(s), deleted {} item(s)",
                    outcome.upserted, outcome.deleted
                );
                self.last_error = None;
            }
            Err(e) => {
                warn!("Save failed, keeping local changes: {}", e);
                self.last_error = Some(e.to_string());
            }
        }

        if let Some(reply) = self.save_reply.take() {
            let _ = reply.send(outcome.map_err(ControllerError::from));
        }
    }

    fn publish(&self) {
        let next = match &self.phase {
            Phase::Loading => ListState::Loading,
            Phase::LoadFailed(message) => ListState::LoadFailed(message.clone()),
            Phase::Ready => ListState::Ready(ListView {
                items: self.buffer.visible().to_vec(),
                has_pending_changes: self.buffer.is_dirty(),
                saving: self.buffer.is_flushing(),
                last_error: self.last_error.clone(),
            }),
        };

        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Handle to the task that owns the shopping list
///
/// Must be created inside a Tokio runtime.
pub struct ListController {
    mailbox: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ListState>,
    task: Option<JoinHandle<()>>,
}

impl ListController {
    /// Start the controller and its remote listener
    ///
    /// `pending` seeds the buffer with edits from an earlier session.
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        images: Arc<dyn ImageSearch>,
        pending: PendingEdits,
    ) -> Self {
        let (mailbox, commands) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ListState::Loading);

        let listener_mailbox = mailbox.clone();
        let listener = SyncListener::start(store.clone(), move |event| {
            listener_mailbox.send(Command::Remote(event)).is_ok()
        });

        let owner = Owner {
            buffer: EditBuffer::new(),
            restored: Some(pending),
            phase: Phase::Loading,
            last_error: None,
            save_reply: None,
            store,
            images,
            mailbox: mailbox.clone(),
            state: state_tx,
        };
        let task = tokio::spawn(owner.run(commands, listener));

        Self {
            mailbox,
            state: state_rx,
            task: Some(task),
        }
    }

    /// Create an item from a draft and add it to the pending edits
    ///
    /// The image lookup runs first; a failed lookup leaves the image empty.
    pub async fn add_item(&self, draft: ItemDraft) -> Result<Item, ControllerError> {
        self.request(|reply| Command::Add { draft, reply }).await
    }

    /// Mark an item for deletion
    pub async fn delete_item(&self, id: &ItemId) -> Result<(), ControllerError> {
        let id = id.clone();
        self.request(|reply| Command::Delete { id, reply }).await
    }

    /// Flush pending edits to the store
    ///
    /// Rejected with [`FlushError::InProgress`] while another save runs.
    pub async fn save(&self) -> Result<FlushOutcome, ControllerError> {
        self.request(|reply| Command::Save { reply }).await
    }

    /// Copy of the current pending edits
    pub async fn pending(&self) -> Result<PendingEdits, ControllerError> {
        self.request(|reply| Command::Pending { reply }).await
    }

    /// Current state
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state.clone()
    }

    /// Wait until the list has loaded (or failed to)
    pub async fn loaded(&self) -> ListState {
        let mut rx = self.state.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if !current.is_loading() {
                return current;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    /// Stop the listener and the owner task
    pub async fn shutdown(mut self) {
        let _ = self.mailbox.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.mailbox
            .send(command(reply))
            .map_err(|_| ControllerError::Stopped)?;
        response.await.map_err(|_| ControllerError::Stopped)?
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.mailbox.send(Command::Shutdown);
        }
    }
}
