// (C) 2025 - Enzo Lombardi

//! Engine event bus - typed publish/subscribe with bounded history.
//!
//! Delivery is synchronous on the emitter's call stack. Handlers receive
//! the envelope plus an [`EmitQueue`]; events pushed into the queue
//! during delivery are drained FIFO after the outer delivery completes,
//! so re-entrant emission never recurses. A panicking handler is
//! isolated and does not prevent siblings from seeing the same event.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use super::geometry::{Point, Size};

/// Engine event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PatternBeforeChange,
    PatternChange,
    ThemeChange,
    FpsChange,
    FrameStart,
    FrameEnd,
    FrameDrop,
    Pause,
    Resume,
    Resize,
    MouseMove,
    MouseClick,
    ToastShow,
    Custom(String),
}

/// Payload carried alongside an event kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    None,
    Frame(u64),
    Fps(u32),
    Size(Size),
    Point(Point),
    Text(String),
    Millis(f64),
}

/// Delivered event: kind + monotonic timestamp + payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub data: EventData,
}

/// Token returned by `on`/`once`/`on_all`; pass to `off` to remove
/// exactly that handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

/// Collector for events emitted from inside a handler.
#[derive(Default)]
pub struct EmitQueue {
    queued: VecDeque<(EventKind, EventData)>,
}

impl EmitQueue {
    /// Queue a nested event; it is delivered after the current delivery
    /// round completes.
    pub fn emit(&mut self, kind: EventKind, data: EventData) {
        self.queued.push_back((kind, data));
    }
}

type HandlerFn = Box<dyn FnMut(&EventEnvelope, &mut EmitQueue)>;

struct Handler {
    id: u64,
    filter: Option<EventKind>, // None = on_all
    once: bool,
    f: HandlerFn,
}

const HISTORY_CAP: usize = 100;

/// Typed publish/subscribe bus over engine events.
pub struct EventBus {
    next_id: u64,
    handlers: Vec<Handler>,
    history: VecDeque<EventEnvelope>,
    epoch: Instant,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            handlers: Vec::new(),
            history: VecDeque::with_capacity(HISTORY_CAP),
            epoch: Instant::now(),
        }
    }

    /// Subscribe to one event kind.
    pub fn on(
        &mut self,
        kind: EventKind,
        f: impl FnMut(&EventEnvelope, &mut EmitQueue) + 'static,
    ) -> Subscription {
        self.subscribe(Some(kind), false, Box::new(f))
    }

    /// Subscribe to one event kind; auto-removed after first delivery.
    pub fn once(
        &mut self,
        kind: EventKind,
        f: impl FnMut(&EventEnvelope, &mut EmitQueue) + 'static,
    ) -> Subscription {
        self.subscribe(Some(kind), true, Box::new(f))
    }

    /// Subscribe to every event.
    pub fn on_all(
        &mut self,
        f: impl FnMut(&EventEnvelope, &mut EmitQueue) + 'static,
    ) -> Subscription {
        self.subscribe(None, false, Box::new(f))
    }

    fn subscribe(&mut self, filter: Option<EventKind>, once: bool, f: HandlerFn) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.push(Handler { id, filter, once, f });
        Subscription(id)
    }

    /// Remove exactly the handler behind `sub`. Returns whether a
    /// handler was removed.
    pub fn off(&mut self, sub: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| h.id != sub.0);
        before != self.handlers.len()
    }

    /// Emit an event, delivering to all matching handlers in
    /// subscription order, then drain any nested emissions FIFO.
    pub fn emit(&mut self, kind: EventKind, data: EventData) {
        let mut pending = VecDeque::new();
        pending.push_back((kind, data));

        while let Some((kind, data)) = pending.pop_front() {
            let envelope = EventEnvelope {
                kind,
                timestamp_ms: self.epoch.elapsed().as_millis() as u64,
                data,
            };

            if self.history.len() == HISTORY_CAP {
                self.history.pop_front();
            }
            self.history.push_back(envelope.clone());

            let mut queue = EmitQueue::default();
            let mut spent = Vec::new();
            for handler in &mut self.handlers {
                let matches = match &handler.filter {
                    Some(k) => *k == envelope.kind,
                    None => true,
                };
                if !matches {
                    continue;
                }
                // Isolate a panicking handler so siblings still run.
                let result = catch_unwind(AssertUnwindSafe(|| (handler.f)(&envelope, &mut queue)));
                if result.is_err() {
                    log::warn!("event handler panicked during {:?}", envelope.kind);
                }
                if handler.once {
                    spent.push(handler.id);
                }
            }
            self.handlers.retain(|h| !spent.contains(&h.id));
            pending.extend(queue.queued);
        }
    }

    /// The last (up to 100) emitted envelopes, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter() -> (Rc<RefCell<u32>>, Rc<RefCell<u32>>) {
        (Rc::new(RefCell::new(0)), Rc::new(RefCell::new(0)))
    }

    #[test]
    fn test_on_and_emit() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        bus.on(EventKind::Pause, move |_, _| *h.borrow_mut() += 1);

        bus.emit(EventKind::Pause, EventData::None);
        bus.emit(EventKind::Resume, EventData::None);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_off_stops_delivery() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let sub = bus.on(EventKind::FrameStart, move |_, _| *h.borrow_mut() += 1);

        bus.emit(EventKind::FrameStart, EventData::Frame(1));
        assert!(bus.off(sub));
        bus.emit(EventKind::FrameStart, EventData::Frame(2));
        assert_eq!(*hits.borrow(), 1);
        assert!(!bus.off(sub));
    }

    #[test]
    fn test_once_auto_removes() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        bus.once(EventKind::Resize, move |_, _| *h.borrow_mut() += 1);

        bus.emit(EventKind::Resize, EventData::None);
        bus.emit(EventKind::Resize, EventData::None);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_on_all_sees_everything() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        bus.on_all(move |_, _| *h.borrow_mut() += 1);

        bus.emit(EventKind::Pause, EventData::None);
        bus.emit(EventKind::Custom("x".into()), EventData::None);
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_panicking_handler_isolated() {
        let mut bus = EventBus::new();
        let (first, second) = counter();
        let f = first.clone();
        let s = second.clone();
        bus.on(EventKind::Pause, move |_, _| {
            *f.borrow_mut() += 1;
            panic!("boom");
        });
        bus.on(EventKind::Pause, move |_, _| *s.borrow_mut() += 1);

        bus.emit(EventKind::Pause, EventData::None);
        assert_eq!(*first.borrow(), 1);
        assert_eq!(*second.borrow(), 1);
    }

    #[test]
    fn test_nested_emission_drains_after_outer() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        bus.on(EventKind::FrameStart, move |_, queue| {
            o.borrow_mut().push("start");
            queue.emit(EventKind::Custom("nested".into()), EventData::None);
            o.borrow_mut().push("start-done");
        });
        let o = order.clone();
        bus.on_all(move |env, _| {
            if let EventKind::Custom(name) = &env.kind {
                o.borrow_mut().push(if name == "nested" { "nested" } else { "?" });
            }
        });

        bus.emit(EventKind::FrameStart, EventData::Frame(1));
        assert_eq!(*order.borrow(), vec!["start", "start-done", "nested"]);
    }

    #[test]
    fn test_history_bounded_to_100() {
        let mut bus = EventBus::new();
        for i in 0..150u64 {
            bus.emit(EventKind::FrameStart, EventData::Frame(i));
        }
        assert_eq!(bus.history_len(), 100);
        // Oldest dropped first
        let first = bus.history().next().unwrap();
        assert_eq!(first.data, EventData::Frame(50));

        bus.clear_history();
        assert_eq!(bus.history_len(), 0);
    }
}
