//! Deferred publish/subscribe event bus.
//!
//! Producers (combat, pickups, leveling) either [`emit`](EventBus::emit) an
//! event for immediate synchronous delivery or
//! [`queue_event`](EventBus::queue_event) it for delivery at the next
//! [`process_events`](EventBus::process_events), which the tick driver calls
//! once per tick after all gameplay and collision work.
//!
//! All methods take `&self`. Listeners receive the bus itself, so they can
//! emit, queue, subscribe or unsubscribe from inside a callback. Two guards
//! keep that from running away:
//!
//! - nested `emit` calls deeper than `max_emit_depth` are dropped with a
//!   warning;
//! - a listener already running further up the stack is not re-entered.
//!
//! The bus is single-threaded (`!Sync`).

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// The kinds of event a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    EnemyKilled,
    PlayerLevelUp,
    PlayerDamaged,
    PlayerHealed,
    XpCollected,
    ProjectileFired,
    PowerUpCollected,
    BuffApplied,
    BuffExpired,
    WaveCompleted,
    BossSpawned,
}

/// An event with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An enemy died. `position` is where its drop should spawn.
    EnemyKilled { experience_value: f32, position: Vec2 },
    PlayerLevelUp { new_level: u32, previous_level: u32 },
    PlayerDamaged { amount: f32, remaining_health: f32 },
    PlayerHealed { amount: f32, current_health: f32 },
    /// `total_xp` is the player's XP progress after the gain.
    XpCollected { amount: f32, total_xp: f32 },
    ProjectileFired {
        position: Vec2,
        direction: Vec2,
        damage: f32,
    },
    PowerUpCollected { name: String, position: Vec2 },
    /// `duration` is negative for a permanent buff.
    BuffApplied { name: String, duration: f32 },
    BuffExpired { name: String },
    WaveCompleted { wave: u32 },
    BossSpawned { position: Vec2 },
}

impl GameEvent {
    /// The kind listeners subscribe to for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::EnemyKilled { .. } => EventKind::EnemyKilled,
            GameEvent::PlayerLevelUp { .. } => EventKind::PlayerLevelUp,
            GameEvent::PlayerDamaged { .. } => EventKind::PlayerDamaged,
            GameEvent::PlayerHealed { .. } => EventKind::PlayerHealed,
            GameEvent::XpCollected { .. } => EventKind::XpCollected,
            GameEvent::ProjectileFired { .. } => EventKind::ProjectileFired,
            GameEvent::PowerUpCollected { .. } => EventKind::PowerUpCollected,
            GameEvent::BuffApplied { .. } => EventKind::BuffApplied,
            GameEvent::BuffExpired { .. } => EventKind::BuffExpired,
            GameEvent::WaveCompleted { .. } => EventKind::WaveCompleted,
            GameEvent::BossSpawned { .. } => EventKind::BossSpawned,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Opaque handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<RefCell<dyn FnMut(&GameEvent, &EventBus)>>;

/// Counters for observing bus behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    /// Events handed to `emit` (directly or via the queue).
    pub emitted: u64,
    /// Listener invocations.
    pub delivered: u64,
    /// Emissions dropped by the depth guard.
    pub dropped: u64,
    /// Listener invocations skipped because the listener was already running.
    pub skipped_reentrant: u64,
}

/// Single-threaded event bus with immediate and deferred delivery.
pub struct EventBus {
    listeners: RefCell<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    queue: RefCell<VecDeque<GameEvent>>,
    next_listener: Cell<u64>,
    emit_depth: Cell<usize>,
    draining: Cell<bool>,
    max_emit_depth: usize,
    stats: Cell<EventStats>,
}

/// Restores the emit depth when a delivery pass ends, even by unwinding.
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// Clears the draining flag when a drain ends, even by unwinding.
struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventBus {
    /// Create a bus with the given nested-emit limit.
    pub fn new(max_emit_depth: usize) -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            queue: RefCell::new(VecDeque::new()),
            next_listener: Cell::new(0),
            emit_depth: Cell::new(0),
            draining: Cell::new(false),
            max_emit_depth,
            stats: Cell::new(EventStats::default()),
        }
    }

    // -- subscriptions ------------------------------------------------------

    /// Register `callback` for events of `kind`. Listeners of one kind are
    /// called in subscription order.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&GameEvent, &EventBus) + 'static,
    {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        let listener: Listener = Rc::new(RefCell::new(callback));
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove one listener. Returns `false` if it was not subscribed to
    /// `kind`.
    ///
    /// An `emit` already in progress still calls the listener if it comes
    /// later in that call's snapshot.
    pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        before != list.len()
    }

    /// Remove every listener of `kind`.
    pub fn clear_listeners(&self, kind: EventKind) {
        self.listeners.borrow_mut().remove(&kind);
    }

    /// Remove every listener and drop every pending event.
    pub fn clear_all(&self) {
        self.listeners.borrow_mut().clear();
        self.queue.borrow_mut().clear();
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    // -- delivery -----------------------------------------------------------

    /// Deliver `event` synchronously to the current listeners of its kind.
    ///
    /// Returns how many listeners were invoked.
    pub fn emit(&self, event: &GameEvent) -> usize {
        let depth = self.emit_depth.get();
        if depth >= self.max_emit_depth {
            warn!(
                kind = ?event.kind(),
                depth,
                max_depth = self.max_emit_depth,
                "dropping nested emit: depth limit reached"
            );
            self.bump(|s| s.dropped += 1);
            return 0;
        }

        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .borrow()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        self.bump(|s| s.emitted += 1);

        self.emit_depth.set(depth + 1);
        let _guard = DepthGuard(&self.emit_depth);

        let mut invoked = 0;
        for (id, listener) in snapshot {
            match listener.try_borrow_mut() {
                Ok(mut callback) => {
                    (&mut *callback)(event, self);
                    invoked += 1;
                }
                Err(_) => {
                    warn!(
                        kind = ?event.kind(),
                        listener = id.0,
                        "skipping listener that is already running"
                    );
                    self.bump(|s| s.skipped_reentrant += 1);
                }
            }
        }
        self.bump(|s| s.delivered += invoked as u64);
        invoked
    }

    /// Append `event` to the pending queue without delivering it.
    pub fn queue_event(&self, event: GameEvent) {
        self.queue.borrow_mut().push_back(event);
    }

    /// Deliver every pending event in FIFO order. Returns the number of
    /// events delivered.
    ///
    /// The queue is taken as a whole first; events queued by listeners during
    /// the drain wait for the next call. A nested call made from inside a
    /// listener is ignored.
    pub fn process_events(&self) -> usize {
        if self.draining.get() {
            warn!("process_events called re-entrantly; ignoring");
            return 0;
        }
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        if batch.is_empty() {
            return 0;
        }

        self.draining.set(true);
        {
            let _guard = DrainGuard(&self.draining);
            for event in &batch {
                self.emit(event);
            }
        }

        debug!(
            delivered = batch.len(),
            pending = self.pending_len(),
            "processed queued events"
        );
        batch.len()
    }

    /// Number of events waiting for the next `process_events`.
    pub fn pending_len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn stats(&self) -> EventStats {
        self.stats.get()
    }

    fn bump(&self, f: impl FnOnce(&mut EventStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(16)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: usize = self.listeners.borrow().values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("listeners", &listeners)
            .field("pending", &self.pending_len())
            .field("max_emit_depth", &self.max_emit_depth)
            .field("stats", &self.stats.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
