use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_utils::atomic::AtomicCell;
use log::debug;

use crate::command::{Command, Request, TransactionId};

struct Pending {
    command: Command,
    sent_at: Instant,
}

/// Transaction id allocation and the table of commands awaiting a response.
///
/// Ids are never reused within a session, so an id is held by at most one
/// outstanding command.
pub struct Transactions {
    next: AtomicU32,
    pending: Mutex<HashMap<TransactionId, Pending>>,
    last_requested_url: AtomicCell<Option<TransactionId>>,
}

impl Default for Transactions {
    fn default() -> Self {
        Self::new()
    }
}

impl Transactions {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
            pending: Mutex::new(HashMap::new()),
            last_requested_url: AtomicCell::new(None),
        }
    }

    /// Bind `request` to a fresh transaction id.
    pub fn begin(&self, request: Request) -> Command {
        let id = TransactionId(self.next.fetch_add(1, Ordering::SeqCst));
        if let Request::RequestedUrlEval = request {
            self.last_requested_url.store(Some(id));
        }
        Command::new(id, request)
    }

    /// Keep `command` until its response arrives.
    pub fn register(&self, command: Command) {
        let id = command.transaction_id();
        let previous = self.lock().insert(
            id,
            Pending {
                command,
                sent_at: Instant::now(),
            },
        );
        debug_assert!(previous.is_none(), "transaction {id} registered twice");
    }

    /// Remove and return the command sent under `id`.
    pub fn take(&self, id: TransactionId) -> Option<Command> {
        self.lock().remove(&id).map(|pending| pending.command)
    }

    /// Id of the most recent requested-URL eval.
    pub fn last_requested_url(&self) -> Option<TransactionId> {
        self.last_requested_url.load()
    }

    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    /// Drop and return commands that waited longer than `timeout`.
    pub fn expire(&self, timeout: Duration) -> Vec<Command> {
        let mut pending = self.lock();
        let now = Instant::now();
        let expired: Vec<TransactionId> = pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.sent_at) >= timeout)
            .map(|(id, _)| *id)
            .collect();
        let mut commands: Vec<Command> = expired
            .into_iter()
            .filter_map(|id| pending.remove(&id))
            .map(|p| p.command)
            .collect();
        commands.sort_by_key(Command::transaction_id);
        commands
    }

    /// Empty the table at teardown.
    pub fn drain(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = self.lock().drain().map(|(_, p)| p.command).collect();
        commands.sort_by_key(Command::transaction_id);
        if !commands.is_empty() {
            debug!("discarding {} unanswered commands", commands.len());
        }
        commands
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TransactionId, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::command::EvalCommand;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let transactions = Transactions::new();
        let a = transactions.begin(Request::Status);
        let b = transactions.begin(Request::Run);
        assert_eq!(a.transaction_id(), TransactionId(1));
        assert_eq!(b.transaction_id(), TransactionId(2));
    }

    #[test]
    fn take_removes_exactly_once() {
        let transactions = Transactions::new();
        let cmd = transactions.begin(Request::Status);
        let id = cmd.transaction_id();
        transactions.register(cmd);
        assert_eq!(transactions.outstanding(), 1);
        assert_eq!(transactions.take(id).map(|c| c.transaction_id()), Some(id));
        assert!(transactions.take(id).is_none());
        assert_eq!(transactions.outstanding(), 0);
    }

    #[test]
    fn remembers_last_requested_url_eval() {
        let transactions = Transactions::new();
        assert_eq!(transactions.last_requested_url(), None);
        transactions.begin(Request::Eval(EvalCommand::new("1")));
        let url = transactions.begin(Request::RequestedUrlEval);
        transactions.begin(Request::Run);
        assert_eq!(transactions.last_requested_url(), Some(url.transaction_id()));
    }

    #[test]
    fn expire_and_drain() {
        let transactions = Transactions::new();
        for _ in 0..3 {
            let cmd = transactions.begin(Request::Status);
            transactions.register(cmd);
        }
        assert!(transactions.expire(Duration::from_secs(60)).is_empty());
        let expired = transactions.expire(Duration::ZERO);
        assert_eq!(expired.len(), 3);
        assert_eq!(transactions.outstanding(), 0);

        let cmd = transactions.begin(Request::Run);
        transactions.register(cmd);
        assert_eq!(transactions.drain().len(), 1);
        assert_eq!(transactions.outstanding(), 0);
    }

    #[test]
    fn concurrent_register_and_take() {
        let transactions = Arc::new(Transactions::new());
        let senders: Vec<_> = (0..4)
            .map(|_| {
                let transactions = Arc::clone(&transactions);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            let cmd = transactions.begin(Request::Status);
                            let id = cmd.transaction_id();
                            transactions.register(cmd);
                            id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ids = Vec::new();
        for sender in senders {
            ids.extend(sender.join().unwrap());
        }
        assert_eq!(transactions.outstanding(), 200);
        for id in ids {
            assert!(transactions.take(id).is_some());
        }
        assert_eq!(transactions.outstanding(), 0);
    }
}
