//! Bounded FIFO of recording commands with a single consumer

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::application::command::{Command, CommandKind};
use crate::domain::error::QueueError;

/// Result of a consumer wait
#[derive(Debug)]
pub enum Popped {
    Command(Command),
    TimedOut,
    /// Closed and drained
    Closed,
}

struct Inner {
    items: VecDeque<Command>,
    closed: bool,
}

pub struct CommandQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Non-blocking push. On failure the command is handed back untouched.
    pub fn push(&self, command: Command) -> Result<(), (QueueError, Command)> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err((QueueError::Closed, command));
        }
        if inner.items.len() >= self.capacity {
            return Err((QueueError::Full, command));
        }
        inner.items.push_back(command);
        drop(inner);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Push, waiting up to `timeout` for room
    pub fn push_blocking(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<(), (QueueError, Command)> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if inner.closed {
                return Err((QueueError::Closed, command));
            }
            if inner.items.len() < self.capacity {
                inner.items.push_back(command);
                drop(inner);
                self.not_empty.notify_one();
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err((QueueError::Full, command));
            }
            self.not_full.wait_for(&mut inner, deadline - now);
        }
    }

    /// Block until a command arrives or the queue is closed and empty
    pub fn pop(&self) -> Option<Command> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(command) = inner.items.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Some(command);
            }
            if inner.closed {
                return None;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Like [`pop`](Self::pop) but gives up after `timeout`
    pub fn pop_timeout(&self, timeout: Duration) -> Popped {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(command) = inner.items.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Popped::Command(command);
            }
            if inner.closed {
                return Popped::Closed;
            }
            let now = Instant::now();
            if now >= deadline {
                return Popped::TimedOut;
            }
            self.not_empty.wait_for(&mut inner, deadline - now);
        }
    }

    /// Refuse further pushes. Queued commands can still be popped.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Close and hand back everything still queued
    pub fn close_and_drain(&self) -> Vec<Command> {
        let drained = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            inner.items.drain(..).collect()
        };
        self.not_empty.notify_all();
        self.not_full.notify_all();
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queued commands in order, without their reply channels
    pub fn kinds(&self) -> Vec<CommandKind> {
        self.inner.lock().items.iter().map(Command::kind).collect()
    }
}
