//! # Action Queue
//!
//! Build/destroy events cross from the UI thread into the simulation
//! through a two-buffer queue: producers push into the front buffer under
//! a mutex; at the start of every tick the simulation swaps the buffers
//! under the same mutex and then drains the back buffer without holding
//! it. Coordinates are global cells; the drain rebases them against the
//! current window origin.

use std::collections::VecDeque;

use hexplanet_core::math::hex::Direction;
use parking_lot::Mutex;

use crate::block::BlockKind;

/// What an action does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Place a block. Ignored when the target cell is not air or out of
    /// the window.
    Build {
        /// Kind to place.
        block_kind: BlockKind,
        /// Facing for bisected forms.
        horizontal_direction: Direction,
        /// Facing for plate forms.
        vertical_direction: Direction,
    },
    /// Clear a cell.
    Destroy,
}

/// One queued build/destroy event, in global cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldAction {
    /// The operation.
    pub kind: ActionKind,
    /// Global x.
    pub x: i32,
    /// Global y.
    pub y: i32,
    /// z.
    pub z: i32,
}

/// Two-buffer producer/consumer queue for world actions.
#[derive(Debug, Default)]
pub struct ActionQueue {
    front: Mutex<VecDeque<WorldAction>>,
}

impl ActionQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a build event. Callable from any thread.
    pub fn push_build(
        &self,
        x: i32,
        y: i32,
        z: i32,
        block_kind: BlockKind,
        horizontal_direction: Direction,
        vertical_direction: Direction,
    ) {
        self.front.lock().push_back(WorldAction {
            kind: ActionKind::Build {
                block_kind,
                horizontal_direction,
                vertical_direction,
            },
            x,
            y,
            z,
        });
    }

    /// Enqueues a destroy event. Callable from any thread.
    pub fn push_destroy(&self, x: i32, y: i32, z: i32) {
        self.front.lock().push_back(WorldAction {
            kind: ActionKind::Destroy,
            x,
            y,
            z,
        });
    }

    /// Swaps the front buffer into `back` (which must be empty) so the
    /// caller can drain it without holding the producer lock.
    pub fn swap_into(&self, back: &mut VecDeque<WorldAction>) {
        debug_assert!(back.is_empty());
        std::mem::swap(&mut *self.front.lock(), back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_preserved() {
        let q = ActionQueue::new();
        q.push_destroy(1, 2, 3);
        q.push_build(4, 5, 6, BlockKind::Brick, Direction::Forward, Direction::Up);

        let mut back = VecDeque::new();
        q.swap_into(&mut back);
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].kind, ActionKind::Destroy);
        assert_eq!((back[0].x, back[0].y, back[0].z), (1, 2, 3));
        assert!(matches!(back[1].kind, ActionKind::Build { .. }));
    }

    #[test]
    fn test_swap_leaves_front_empty() {
        let q = ActionQueue::new();
        q.push_destroy(0, 0, 0);

        let mut back = VecDeque::new();
        q.swap_into(&mut back);
        assert_eq!(back.len(), 1);

        back.clear();
        q.swap_into(&mut back);
        assert!(back.is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        use std::sync::Arc;

        let q = Arc::new(ActionQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let q = Arc::clone(&q);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        q.push_destroy(t, i, 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut back = VecDeque::new();
        q.swap_into(&mut back);
        assert_eq!(back.len(), 400);
    }
}
