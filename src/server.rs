//! Listener for engine connections.
//!
//! Engines connect to the debugger, not the other way round. Every accepted
//! connection becomes a [`Session`] running on the thread pool, seeded with
//! the breakpoints currently in the store. The pool starts with one worker
//! per CPU and grows while more engines are attached at once.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, error, info};

use crate::config::SessionOptions;
use crate::error::Result;
use crate::session::{DebuggerModel, Session, SessionHandle};
use crate::store::BreakpointStore;
use crate::thread_pool::{SharedQueueThreadPool, ThreadPool};

/// The most recently attached session, for front ends that drive it.
pub type LatestSession = Arc<Mutex<Option<SessionHandle>>>;

pub struct DbgpServer<S, F> {
    listener: TcpListener,
    thread_pool: SharedQueueThreadPool,
    store: S,
    options: SessionOptions,
    models: Arc<F>,
    shutdown: Arc<AtomicBool>,
    latest: LatestSession,
}

impl<S, F, M> DbgpServer<S, F>
where
    S: BreakpointStore,
    F: Fn() -> M + Send + Sync + 'static,
    M: DebuggerModel + 'static,
{
    /// Bind `addr`. `models` builds the model of each new session.
    pub fn new(addr: impl ToSocketAddrs, store: S, options: SessionOptions, models: F) -> Result<Self> {
        let cpus = num_cpus::get();
        let thread_pool = SharedQueueThreadPool::new(cpus as u32)?;
        let listener = TcpListener::bind(addr)?;
        // Nonblocking so the accept loop can observe the shutdown flag.
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            thread_pool,
            store,
            options,
            models: Arc::new(models),
            shutdown: Arc::new(AtomicBool::new(false)),
            latest: Arc::new(Mutex::new(None)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops [`DbgpServer::run`] once set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn latest_session(&self) -> LatestSession {
        Arc::clone(&self.latest)
    }

    /// Accept engine connections until shut down.
    pub fn run(&mut self) -> Result<()> {
        info!("listening on {}", self.local_addr()?);

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, no longer accepting engines");
                break;
            }

            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("engine connected from {peer}");
                    let store = self.store.clone();
                    let options = self.options.clone();
                    let models = Arc::clone(&self.models);
                    let latest = Arc::clone(&self.latest);
                    self.thread_pool.spawn(move || {
                        let model = (*models)();
                        if let Err(e) = handle_engine(stream, store, options, model, latest) {
                            error!("session with {peer} failed: {e}");
                        }
                    })?;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                    continue;
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        return Err(e.into());
                    }
                    break;
                }
            }
        }

        debug!("waiting for active sessions to finish");
        Ok(())
    }

    pub fn shutdown(&self) {
        info!("shutting down server");
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

fn handle_engine(
    stream: TcpStream,
    store: impl BreakpointStore,
    options: SessionOptions,
    model: impl DebuggerModel + 'static,
    latest: LatestSession,
) -> Result<()> {
    // Accepted sockets may inherit the listener's nonblocking mode.
    stream.set_nonblocking(false)?;
    let closer = stream.try_clone()?;
    let (session, handle) = Session::connect(stream, options, model)?;
    let mut session = session.with_breakpoints(store.list()?);
    *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

    let result = session.run();
    // Unblocks the reader thread if the engine keeps the socket open.
    if let Err(e) = closer.shutdown(Shutdown::Both) {
        debug!("engine socket already closed: {e}");
    }
    result
}
