//! In-process buffer of pending write commands.
//!
//! The ingestor appends, the persistence worker drains; nothing else
//! touches it. FIFO order survives the drain, so commands are applied in
//! arrival order within a flush. No capacity bound: unbounded growth during
//! an outage is an accepted risk.

use std::mem;
use std::sync::{Arc, Mutex};

use crate::models::Command;

#[derive(Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<Vec<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, cmd: Command) {
        self.lock().push(cmd);
    }

    pub fn extend(&self, cmds: impl IntoIterator<Item = Command>) {
        self.lock().extend(cmds);
    }

    /// Atomic swap-and-clear: detach the whole current contents. Commands
    /// enqueued after the swap land in the next drain.
    pub fn drain(&self) -> Vec<Command> {
        mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Command>> {
        // A poisoned queue mutex means a panic mid-push/drain; the buffer
        // itself is still a valid Vec, so keep going with it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::command::{Command, UpsertVisitor};

    fn cmd(token: &str) -> Command {
        Command::UpsertVisitor(UpsertVisitor {
            token: token.to_string(),
            created_at: "2023-11-14 22:13:20".to_string(),
        })
    }

    #[test]
    fn drain_detaches_everything_in_order() {
        let q = CommandQueue::new();
        q.push(cmd("A"));
        q.push(cmd("B"));
        q.push(cmd("C"));

        let drained = q.drain();
        assert_eq!(
            drained.iter().map(|c| c.token()).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn commands_after_drain_wait_for_next_drain() {
        let q = CommandQueue::new();
        q.push(cmd("A"));
        let first = q.drain();
        q.push(cmd("B"));

        assert_eq!(first.len(), 1);
        let second = q.drain();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].token(), "B");
    }
}
