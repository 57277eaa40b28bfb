//! Blade trail and point hit queries

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::stage::{Handle, Stage};

/// Recent stroke samples, newest last
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceTracker {
    trail: VecDeque<Vec2>,
    capacity: usize,
}

impl SliceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            trail: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(2),
        }
    }

    /// Append a sample, dropping the oldest beyond capacity
    pub fn extend_trail(&mut self, point: Vec2) {
        self.trail.push_back(point);
        while self.trail.len() > self.capacity {
            self.trail.pop_front();
        }
    }

    /// Start a fresh stroke
    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }

    /// Trail points oldest to newest
    pub fn points(&self) -> Vec<Vec2> {
        self.trail.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every stage body whose hit region contains `point`.
    ///
    /// Point containment only: the stroke does not need to cross the body.
    pub fn hit_test<S: Stage + ?Sized>(&self, stage: &S, point: Vec2) -> Vec<Handle> {
        stage.hit_test_point(point)
    }
}
