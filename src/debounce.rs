//! Cancellable timer for settling bursts of input.
//!
//! `start` schedules an action after a delay and replaces whatever was pending,
//! so at most one action runs per burst. Superseded actions are dropped, never
//! queued. Actions run on a single worker thread.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;
use tracing::trace;

/// Settling delay between the last keystroke and the search
pub const DEFAULT_DELAY: Duration = Duration::from_millis(200);

type Action = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum DebounceError {
    #[error("failed to spawn debounce worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("debounce worker has stopped")]
    Closed,
}

/// Identifies one scheduled action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

enum Command {
    Start {
        ticket: Ticket,
        delay: Duration,
        action: Action,
    },
    /// Cancel the pending action; `Some` only if it is that ticket.
    Cancel(Option<Ticket>),
    /// Run the pending action now; replies whether one ran.
    Flush(Sender<bool>),
}

struct Pending {
    ticket: Ticket,
    deadline: Instant,
    action: Action,
}

pub struct Debouncer {
    tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    next_ticket: u64,
}

impl Debouncer {
    pub fn new() -> Result<Self, DebounceError> {
        let (tx, rx) = unbounded();
        let worker = thread::Builder::new()
            .name("debounce".to_string())
            .spawn(move || worker_loop(rx))?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            next_ticket: 0,
        })
    }

    /// Schedule `action` after `delay`, cancelling any pending action.
    pub fn start<F>(&mut self, delay: Duration, action: F) -> Result<Ticket, DebounceError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.send(Command::Start {
            ticket,
            delay,
            action: Box::new(action),
        })?;
        Ok(ticket)
    }

    /// Drop the pending action, if any.
    pub fn cancel(&self) -> Result<(), DebounceError> {
        self.send(Command::Cancel(None))
    }

    /// Drop the pending action only if it is still `ticket`.
    pub fn cancel_ticket(&self, ticket: Ticket) -> Result<(), DebounceError> {
        self.send(Command::Cancel(Some(ticket)))
    }

    /// Run the pending action immediately. Returns whether one was pending.
    pub fn flush(&self) -> Result<bool, DebounceError> {
        let (done_tx, done_rx) = bounded(1);
        self.send(Command::Flush(done_tx))?;
        done_rx.recv().map_err(|_| DebounceError::Closed)
    }

    fn send(&self, cmd: Command) -> Result<(), DebounceError> {
        self.tx
            .as_ref()
            .ok_or(DebounceError::Closed)?
            .send(cmd)
            .map_err(|_| DebounceError::Closed)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        // Disconnecting the channel discards the pending action
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(rx: Receiver<Command>) {
    let mut pending: Option<Pending> = None;

    loop {
        let msg = match &pending {
            Some(p) => rx.recv_timeout(p.deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match msg {
            Ok(Command::Start {
                ticket,
                delay,
                action,
            }) => {
                if let Some(old) = &pending {
                    trace!(superseded = old.ticket.0, by = ticket.0, "debounce restart");
                }
                pending = Some(Pending {
                    ticket,
                    deadline: Instant::now() + delay,
                    action,
                });
            }
            Ok(Command::Cancel(only)) => {
                if only.map_or(true, |t| pending.as_ref().is_some_and(|p| p.ticket == t)) {
                    pending = None;
                }
            }
            Ok(Command::Flush(done)) => {
                let ran = match pending.take() {
                    Some(p) => {
                        (p.action)();
                        true
                    }
                    None => false,
                };
                let _ = done.send(ran);
            }
            Err(RecvTimeoutError::Timeout) => {
                if let Some(p) = pending.take() {
                    trace!(ticket = p.ticket.0, "debounce fired");
                    (p.action)();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(200);

    #[test]
    fn test_burst_runs_only_last() {
        let (tx, rx) = unbounded();
        let mut debouncer = Debouncer::new().unwrap();

        for i in 0..5 {
            let tx = tx.clone();
            debouncer.start(DELAY, move || tx.send(i).unwrap()).unwrap();
        }

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 4);
        assert!(rx.recv_timeout(DELAY * 2).is_err());
    }

    #[test]
    fn test_waits_for_delay() {
        let (tx, rx) = unbounded();
        let mut debouncer = Debouncer::new().unwrap();

        let started = Instant::now();
        debouncer.start(DELAY, move || tx.send(()).unwrap()).unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(started.elapsed() >= DELAY);
    }

    #[test]
    fn test_cancel() {
        let (tx, rx) = unbounded();
        let mut debouncer = Debouncer::new().unwrap();

        debouncer.start(DELAY, move || tx.send(()).unwrap()).unwrap();
        debouncer.cancel().unwrap();
        assert!(rx.recv_timeout(DELAY * 2).is_err());
    }

    #[test]
    fn test_cancel_stale_ticket_is_ignored() {
        let (tx, rx) = unbounded();
        let mut debouncer = Debouncer::new().unwrap();

        let first = {
            let tx = tx.clone();
            debouncer.start(DELAY, move || tx.send(1).unwrap()).unwrap()
        };
        let second = debouncer.start(DELAY, move || tx.send(2).unwrap()).unwrap();
        assert_ne!(first, second);

        debouncer.cancel_ticket(first).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 2);
    }

    #[test]
    fn test_flush_runs_immediately() {
        let (tx, rx) = unbounded();
        let mut debouncer = Debouncer::new().unwrap();

        debouncer
            .start(Duration::from_secs(60), move || tx.send("now").unwrap())
            .unwrap();
        assert!(debouncer.flush().unwrap());
        assert_eq!(rx.try_recv().unwrap(), "now");
        assert!(!debouncer.flush().unwrap());
    }

    #[test]
    fn test_drop_discards_pending() {
        let (tx, rx) = unbounded();
        {
            let mut debouncer = Debouncer::new().unwrap();
            debouncer.start(DELAY, move || tx.send(()).unwrap()).unwrap();
        }
        // The action (and with it the only sender) was dropped unrun
        assert!(matches!(
            rx.recv_timeout(DELAY * 2),
            Err(RecvTimeoutError::Disconnected)
        ));
    }
}
