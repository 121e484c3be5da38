//! A module for thread pool.
//!
//! Every engine connection is a long-running job: the session loop stays on
//! one worker until the engine disconnects. The pool therefore never lets a
//! job wait in the queue; when no worker is idle, `spawn` starts another.
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use log::{debug, error, info};

use crate::error::{DbgpError, Result};

/// A trait for thread pools.
pub trait ThreadPool: Sized {
    /// Create a new thread pool.
    fn new(threads: u32) -> Result<Self>;
    /// Spawn a new job on the thread pool.
    fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static;
}

type Job = Box<dyn FnOnce() + Send + 'static>;
type SharedReceiver = Arc<Mutex<mpsc::Receiver<Message>>>;

enum Message {
    NewJob(Job),
    Terminate,
}

/// Workers sharing one job queue, starting with `threads` of them.
///
/// `idle` counts workers that are free and not yet promised to a queued
/// job. Every queued job holds one such promise, so the queue never holds a
/// job no worker will pick up.
pub struct SharedQueueThreadPool {
    workers: Mutex<Vec<Worker>>,
    sender: mpsc::Sender<Message>,
    receiver: SharedReceiver,
    idle: Arc<AtomicUsize>,
}

impl SharedQueueThreadPool {
    /// Workers started so far, busy or not.
    pub fn size(&self) -> usize {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let threads = threads.max(1);
        let idle = Arc::new(AtomicUsize::new(threads as usize));
        let workers = (0..threads)
            .map(|id| Worker::new(id, Arc::clone(&receiver), Arc::clone(&idle)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            workers: Mutex::new(workers),
            sender,
            receiver,
            idle,
        })
    }

    fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let reserved = self
            .idle
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !reserved {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            let id = workers.len() as u32;
            info!("all {id} workers busy, starting another");
            // Starts busy: it is promised to this job.
            workers.push(Worker::new(id, Arc::clone(&self.receiver), Arc::clone(&self.idle))?);
        }
        self.sender
            .send(Message::NewJob(Box::new(job)))
            .map_err(|_| DbgpError::PoolClosed)
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        let workers = self.workers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for _ in workers.iter() {
            // Workers already gone have dropped their receiver.
            let _ = self.sender.send(Message::Terminate);
        }

        for worker in workers.iter_mut() {
            if let Some(thread) = worker.thread.take() {
                if let Err(e) = thread.join() {
                    error!("worker {} join failed: {:?}", worker.id, e);
                }
            }
        }
    }
}

struct Worker {
    id: u32,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: u32, receiver: SharedReceiver, idle: Arc<AtomicUsize>) -> Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("dbgp-worker-{id}"))
            .spawn(move || {
                loop {
                    let msg = {
                        let receiver = receiver.lock().unwrap_or_else(PoisonError::into_inner);
                        receiver.recv()
                    };
                    match msg {
                        Ok(Message::NewJob(job)) => {
                            if let Err(e) = catch_unwind(AssertUnwindSafe(job)) {
                                error!("worker {id} job panicked: {e:?}");
                            }
                            idle.fetch_add(1, Ordering::SeqCst);
                        }
                        Ok(Message::Terminate) | Err(_) => break,
                    }
                }
                debug!("worker {id} exiting");
            })?;
        Ok(Self {
            id,
            thread: Some(thread),
        })
    }
}
