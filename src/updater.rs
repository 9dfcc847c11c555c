//! Background flight info updater
//!
//! The updater seeds the store once from a full snapshot (overwrite), then
//! periodically copies fresh positions onto the stored records (refresh).
//! Cycles run one at a time on a single task. A stop request is honoured
//! between cycles, never in the middle of one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    config::UpdaterConfig,
    database::{PositionUpdate, RecordStore},
    errors::FlightTrackerError,
    feed::FeedSource,
    models::{FlightInfo, RawAircraft},
};

/// Notification published by the updater task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    /// Store content was replaced with this many records
    Added(usize),
    /// This many stored records had their position changed
    Refreshed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    Idle,
    Running,
    Stopped,
    /// Overwrite failed, no further cycles run
    Faulted,
}

pub struct FlightInfoUpdater<F, S> {
    source: Arc<F>,
    store: Arc<S>,
    limit: usize,
    interval: Duration,
}

/// Handle to a running updater task
///
/// Dropping the handle requests a stop, like [`UpdaterHandle::stop`].
pub struct UpdaterHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<UpdaterState>,
    events: mpsc::UnboundedReceiver<UpdateEvent>,
    handle: JoinHandle<Result<(), FlightTrackerError>>,
}

impl<F, S> FlightInfoUpdater<F, S>
where
    F: FeedSource + 'static,
    S: RecordStore + 'static,
{
    pub fn new(source: Arc<F>, store: Arc<S>, config: &UpdaterConfig) -> Self {
        Self {
            source,
            store,
            limit: config.limit,
            interval: config.interval,
        }
    }

    /// Replace all stored records with the first `limit` records of a fresh
    /// snapshot. Nothing is written unless every record passes validation.
    pub async fn overwrite(&self) -> Result<usize, FlightTrackerError> {
        let snapshot = self.source.fetch_snapshot().await?;

        let infos = snapshot
            .iter()
            .take(self.limit)
            .map(|raw| FlightInfo::from(raw).admit())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.store.replace_all(infos).await?)
    }

    /// Copy latitude and longitude from a fresh snapshot onto every stored
    /// record with a matching id. Other fields are left untouched, stored
    /// records missing from the snapshot are kept and new aircraft are not
    /// added.
    pub async fn refresh(&self) -> Result<usize, FlightTrackerError> {
        let snapshot = self.source.fetch_snapshot().await?;
        let fresh = index_by_id(&snapshot);

        let updates: Vec<PositionUpdate> = self
            .store
            .all_records()
            .await?
            .iter()
            .filter_map(|info| {
                fresh
                    .get(info.id.as_str())
                    .map(|raw| PositionUpdate::new(info.id.clone(), raw.lat, raw.long))
            })
            .collect();

        Ok(self.store.commit_positions(updates).await?)
    }

    /// Admit a single record and add it to the store
    pub async fn insert(&self, info: FlightInfo) -> Result<(), FlightTrackerError> {
        let info = info.admit()?;
        self.store.insert(info).await?;
        Ok(())
    }

    /// Launch the update loop on a background task
    pub fn start(self) -> UpdaterHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(UpdaterState::Idle);
        let (events_tx, events) = mpsc::unbounded_channel();

        let handle = tokio::spawn(self.run(stop_rx, state_tx, events_tx));

        UpdaterHandle {
            stop_tx,
            state_rx,
            events,
            handle,
        }
    }

    async fn run(
        self,
        mut stop_rx: watch::Receiver<bool>,
        state_tx: watch::Sender<UpdaterState>,
        events: mpsc::UnboundedSender<UpdateEvent>,
    ) -> Result<(), FlightTrackerError> {
        state_tx.send_replace(UpdaterState::Running);

        match self.overwrite().await {
            Ok(count) => publish(&events, UpdateEvent::Added(count)),
            Err(e) => {
                error!("Overwrite failed, updater stopping: {}", e);
                state_tx.send_replace(UpdaterState::Faulted);
                return Err(e);
            }
        }

        loop {
            if stop_requested(&stop_rx) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = stop_rx.changed() => {}
            }

            if stop_requested(&stop_rx) {
                break;
            }

            match self.refresh().await {
                Ok(changed) => publish(&events, UpdateEvent::Refreshed(changed)),
                Err(e) => warn!("Refresh failed, retrying next cycle: {}", e),
            }
        }

        info!("Updater stopped");
        state_tx.send_replace(UpdaterState::Stopped);
        Ok(())
    }
}

impl UpdaterHandle {
    /// Request a graceful stop after the current cycle
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn state(&self) -> UpdaterState {
        *self.state_rx.borrow()
    }

    /// Receive next event, None once the updater task has exited
    pub async fn recv(&mut self) -> Option<UpdateEvent> {
        self.events.recv().await
    }

    /// Wait for the updater task to exit, returning its fatal error if any
    pub async fn join(self) -> Result<(), FlightTrackerError> {
        self.handle.await?
    }
}

fn stop_requested(stop_rx: &watch::Receiver<bool>) -> bool {
    // A closed channel means the handle was dropped
    *stop_rx.borrow() || stop_rx.has_changed().is_err()
}

fn publish(events: &mpsc::UnboundedSender<UpdateEvent>, event: UpdateEvent) {
    if events.send(event).is_err() {
        debug!("No event receiver, dropping {:?}", event);
    }
}

/// Index a snapshot by id; on duplicate ids the last entry wins
fn index_by_id(snapshot: &[RawAircraft]) -> HashMap<&str, &RawAircraft> {
    snapshot.iter().map(|raw| (raw.icao.as_str(), raw)).collect()
}
