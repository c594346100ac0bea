//! Cycle detection for depth-first walks over the interface graph.

use std::collections::HashSet;

/// The chain of interfaces currently being resolved, root first.
#[derive(Debug, Default)]
pub struct VisitedPath {
    stack: Vec<String>,
    members: HashSet<String>,
}

impl VisitedPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an interface onto the path. Returns `false` if it is already on it.
    pub fn enter(&mut self, interface: &str) -> bool {
        if !self.members.insert(interface.to_string()) {
            return false;
        }
        self.stack.push(interface.to_string());
        true
    }

    /// Pop the most recently entered interface.
    pub fn leave(&mut self) {
        if let Some(interface) = self.stack.pop() {
            self.members.remove(&interface);
        }
    }

    pub fn contains(&self, interface: &str) -> bool {
        self.members.contains(interface)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
