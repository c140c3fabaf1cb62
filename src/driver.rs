//! # Event Driver
//!
//! Provider callbacks (permission dialog, settings check, fix stream, tile
//! store) arrive on whatever thread the host uses. They are posted as tagged
//! events into one channel and applied strictly in order by a single loop
//! that owns the state machine, so no transition ever runs concurrently with
//! another.

use std::fmt::Debug;

use log::debug;
use tokio::sync::mpsc;

use crate::offline::{DownloadEvent, DownloadState, OfflineRegionDownloadSession, OfflineRegionStore};
use crate::session::{
    LocationAcquisitionSession, LocationConsumer, LocationPlatform, Notifier, SessionEvent,
    SessionState,
};

/// A state machine fed by tagged events.
pub trait StateMachine {
    type Event: Send + 'static;
    type State: Copy + Debug;

    /// Apply one event and return the resulting state.
    fn dispatch(&mut self, event: Self::Event) -> Self::State;
    fn current(&self) -> Self::State;
}

impl<P: LocationPlatform, C: LocationConsumer> StateMachine for LocationAcquisitionSession<P, C> {
    type Event = SessionEvent;
    type State = SessionState;

    fn dispatch(&mut self, event: SessionEvent) -> SessionState {
        self.handle(event)
    }

    fn current(&self) -> SessionState {
        self.state()
    }
}

impl<R: OfflineRegionStore, N: Notifier> StateMachine for OfflineRegionDownloadSession<R, N> {
    type Event = DownloadEvent;
    type State = DownloadState;

    fn dispatch(&mut self, event: DownloadEvent) -> DownloadState {
        self.handle(event)
    }

    fn current(&self) -> DownloadState {
        self.state()
    }
}

/// Cloneable handle for posting events from provider callbacks.
pub struct EventSender<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> EventSender<E> {
    /// Post an event. Returns `false` once the loop has been dropped.
    pub fn send(&self, event: E) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Owns a state machine and applies posted events one at a time.
pub struct EventLoop<M: StateMachine> {
    machine: M,
    rx: mpsc::UnboundedReceiver<M::Event>,
}

impl<M: StateMachine> EventLoop<M> {
    pub fn new(machine: M) -> (Self, EventSender<M::Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { machine, rx }, EventSender { tx })
    }

    /// Apply events until every sender is dropped, then hand the machine back.
    pub async fn run(mut self) -> M {
        while let Some(event) = self.rx.recv().await {
            self.machine.dispatch(event);
        }
        debug!(
            "[EventLoop] All senders dropped, final state {:?}",
            self.machine.current()
        );
        self.machine
    }

    /// Apply everything already queued without waiting. For hosts that pump
    /// the loop from their own main thread.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.machine.dispatch(event);
            applied += 1;
        }
        applied
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }
}
