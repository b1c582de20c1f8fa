//! Interaction state shared between the tracking thread and the UI.
//!
//! The tracking thread is the only writer. Each frame it builds a fresh
//! [`InteractionState`] and publishes it whole, so readers only ever see a
//! complete snapshot, never a mix of two frames.

use nalgebra::Point2;
use tokio::sync::watch;

/// Latest classified state of one controlling hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandInteraction {
    pub detected: bool,
    /// Raw wrist position, normalized to the camera frame.
    pub position: Point2<f64>,
    pub pinch_distance: f64,
    pub is_pinching: bool,
}

impl Default for HandInteraction {
    fn default() -> Self {
        Self {
            detected: false,
            position: Point2::origin(),
            pinch_distance: 0.0,
            is_pinching: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InteractionState {
    pub frame: u64,
    pub timestamp_ms: f64,
    pub globe_hand: HandInteraction,
    pub panel_hand: HandInteraction,
}

impl InteractionState {
    pub fn any_detected(&self) -> bool {
        self.globe_hand.detected || self.panel_hand.detected
    }
}

/// Writer half of the interaction store.
pub struct InteractionStore {
    tx: watch::Sender<InteractionState>,
}

/// Cheap, cloneable reader half.
#[derive(Clone)]
pub struct InteractionReader {
    rx: watch::Receiver<InteractionState>,
}

impl InteractionStore {
    pub fn new() -> (Self, InteractionReader) {
        let (tx, rx) = watch::channel(InteractionState::default());
        (Self { tx }, InteractionReader { rx })
    }

    /// Replace the whole snapshot. Succeeds even with no readers left.
    pub fn publish(&self, state: InteractionState) {
        self.tx.send_replace(state);
    }

    pub fn reader(&self) -> InteractionReader {
        InteractionReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl InteractionReader {
    pub fn snapshot(&self) -> InteractionState {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_nothing_detected() {
        let (_store, reader) = InteractionStore::new();
        let state = reader.snapshot();
        assert!(!state.globe_hand.detected);
        assert!(!state.panel_hand.detected);
        assert!(!state.any_detected());
    }

    #[test]
    fn readers_see_latest_whole_snapshot() {
        let (store, reader) = InteractionStore::new();
        let second = store.reader();

        let mut state = InteractionState {
            frame: 7,
            ..Default::default()
        };
        state.panel_hand = HandInteraction {
            detected: true,
            position: Point2::new(0.3, 0.4),
            pinch_distance: 0.02,
            is_pinching: true,
        };
        store.publish(state);

        assert_eq!(reader.snapshot(), state);
        assert_eq!(second.snapshot(), state);

        store.publish(InteractionState {
            frame: 8,
            ..Default::default()
        });
        let latest = reader.snapshot();
        assert_eq!(latest.frame, 8);
        assert!(!latest.panel_hand.detected);
    }

    #[test]
    fn publish_without_readers_is_fine() {
        let (store, reader) = InteractionStore::new();
        drop(reader);
        store.publish(InteractionState::default());
        assert_eq!(store.reader().snapshot().frame, 0);
    }
}
