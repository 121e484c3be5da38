//! A debugging session with one engine.
//!
//! The session thread owns the outbound half of the connection and runs
//! [`Session::run`]. A reader thread parses inbound frames and hands them
//! over through the same event channel other threads use (via
//! [`SessionHandle`]) to queue commands, so all correlation and response
//! processing happens on the session thread. Responses may send further
//! commands while they are processed.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info, warn};

use crate::charset::Charset;
use crate::command::{Breakpoint, Request, TransactionId};
use crate::config::SessionOptions;
use crate::error::{DbgpError, Result};
use crate::node::Node;
use crate::protocol::{FrameReader, decode_document};
use crate::response::{EngineInfo, MessageBuilder, Response, SessionStatus, transaction_id};

mod model;
mod transactions;

pub use model::{DebuggerModel, NoopModel};
pub use transactions::Transactions;

pub(crate) enum Event {
    Frame(Node),
    Send(Request),
    Closed,
}

/// Cloneable, thread-safe access to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: Sender<Event>,
    transactions: Arc<Transactions>,
}

impl SessionHandle {
    /// Queue `request`; the session thread sends it.
    pub fn send(&self, request: Request) -> Result<()> {
        self.events
            .send(Event::Send(request))
            .map_err(|_| DbgpError::SessionClosed)
    }

    /// Hand an inbound message to the session, as the reader thread does.
    pub fn deliver(&self, node: Node) -> Result<()> {
        self.events
            .send(Event::Frame(node))
            .map_err(|_| DbgpError::SessionClosed)
    }

    /// Tell the session the engine connection is gone.
    pub fn close(&self) {
        let _ = self.events.send(Event::Closed);
    }

    /// Commands still waiting for a response.
    pub fn outstanding(&self) -> usize {
        self.transactions.outstanding()
    }
}

/// One engine connection: the writer half, pending transactions and the
/// state built from the engine's answers.
pub struct Session {
    writer: Box<dyn Write + Send>,
    events: Receiver<Event>,
    handle: SessionHandle,
    transactions: Arc<Transactions>,
    options: SessionOptions,
    model: Box<dyn DebuggerModel>,
    breakpoints: Vec<(String, Breakpoint)>,
    remote_ids: HashMap<String, String>,
    watches: Vec<String>,
    deferred: VecDeque<Request>,
    status: Option<SessionStatus>,
    engine: Option<EngineInfo>,
    finished: bool,
    closed: bool,
}

impl Session {
    /// A session writing commands to `writer`. Inbound messages arrive
    /// through [`SessionHandle::deliver`] or [`spawn_reader`].
    pub fn new(
        writer: impl Write + Send + 'static,
        options: SessionOptions,
        model: impl DebuggerModel + 'static,
    ) -> (Session, SessionHandle) {
        let (sender, events) = mpsc::channel();
        let transactions = Arc::new(Transactions::new());
        let handle = SessionHandle {
            events: sender,
            transactions: Arc::clone(&transactions),
        };
        let watches = options.watches.clone();
        let session = Session {
            writer: Box::new(writer),
            events,
            handle: handle.clone(),
            transactions,
            options,
            model: Box::new(model),
            breakpoints: Vec::new(),
            remote_ids: HashMap::new(),
            watches,
            deferred: VecDeque::new(),
            status: None,
            engine: None,
            finished: false,
            closed: false,
        };
        (session, handle)
    }

    /// A session over an accepted engine connection, with its reader thread
    /// already running.
    pub fn connect(
        stream: TcpStream,
        options: SessionOptions,
        model: impl DebuggerModel + 'static,
    ) -> Result<(Session, SessionHandle)> {
        let reader = stream.try_clone()?;
        let (session, handle) = Session::new(stream, options, model);
        spawn_reader(reader, handle.clone())?;
        Ok((session, handle))
    }

    /// Breakpoints to install during the handshake, keyed locally.
    pub fn with_breakpoints(mut self, breakpoints: Vec<(String, Breakpoint)>) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    /// Evaluate `expression` on every break, after the variables.
    pub fn add_watch(&mut self, expression: impl Into<String>) {
        self.watches.push(expression.into());
    }

    /// Another handle to this session.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Options the session was created with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Charset of payloads and decoded values.
    pub fn charset(&self) -> Charset {
        self.options.encoding
    }

    /// The model receiving this session's events.
    pub fn model(&mut self) -> &mut dyn DebuggerModel {
        self.model.as_mut()
    }

    /// Last status the engine reported; `None` before the first one.
    pub fn status(&self) -> Option<SessionStatus> {
        self.status
    }

    /// What the engine announced in `init`.
    pub fn engine(&self) -> Option<&EngineInfo> {
        self.engine.as_ref()
    }

    /// Engine id of the breakpoint installed under `key`.
    pub fn remote_breakpoint_id(&self, key: &str) -> Option<&str> {
        self.remote_ids.get(key).map(String::as_str)
    }

    /// True once the engine stopped or detached, or the connection closed.
    pub fn is_finished(&self) -> bool {
        self.finished || self.closed
    }

    /// Process events until the engine stops or disconnects.
    pub fn run(&mut self) -> Result<()> {
        let result = self.event_loop();
        self.teardown();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        while !self.is_finished() {
            if let Some(request) = self.deferred.pop_front() {
                self.send(request)?;
                continue;
            }
            match self.next_event() {
                Some(Event::Frame(node)) => {
                    // Bad messages are dropped inside; only a dead connection surfaces.
                    self.dispatch(node)?;
                }
                Some(Event::Send(request)) => {
                    self.send(request)?;
                }
                Some(Event::Closed) => self.closed = true,
                None => {}
            }
        }
        Ok(())
    }

    fn next_event(&mut self) -> Option<Event> {
        let Some(timeout) = self.options.pending_timeout() else {
            return Some(self.events.recv().unwrap_or(Event::Closed));
        };
        for command in self.transactions.expire(timeout) {
            warn!(
                "no response to {} (transaction {}) within {timeout:?}",
                command.name(),
                command.transaction_id()
            );
        }
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Event::Closed),
        }
    }

    /// Send `request` without waiting for its response.
    pub fn send(&mut self, request: Request) -> Result<TransactionId> {
        if self.closed {
            return Err(DbgpError::SessionClosed);
        }
        let command = self.transactions.begin(request);
        let id = command.transaction_id();
        let frame = command.to_frame(self.charset());
        debug!("-> {}", String::from_utf8_lossy(&frame[..frame.len() - 1]));
        if command.want_acknowledgment() {
            self.transactions.register(command);
        }
        if let Err(e) = self.writer.write_all(&frame).and_then(|_| self.writer.flush()) {
            self.transactions.take(id);
            return Err(e.into());
        }
        Ok(id)
    }

    /// Send `request` and process inbound messages until its response has
    /// been applied. Requests queued meanwhile are sent afterwards.
    ///
    /// Returns `None` for fire-and-forget requests and when the engine went
    /// away first.
    pub fn send_synchronous(&mut self, request: Request) -> Result<Option<Response>> {
        let wait = request.want_acknowledgment();
        let id = self.send(request)?;
        if !wait {
            return Ok(None);
        }
        let deadline = self.options.pending_timeout().map(|t| Instant::now() + t);
        loop {
            let event = match deadline {
                None => self.events.recv().unwrap_or(Event::Closed),
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    match self.events.recv_timeout(left) {
                        Ok(event) => event,
                        Err(RecvTimeoutError::Timeout) => {
                            self.transactions.take(id);
                            return Err(DbgpError::Timeout(id));
                        }
                        Err(RecvTimeoutError::Disconnected) => Event::Closed,
                    }
                }
            };
            match event {
                Event::Frame(node) => {
                    let matched = transaction_id(&node) == Some(id);
                    let response = self.dispatch(node)?;
                    if matched {
                        return Ok(Some(response));
                    }
                    if self.is_finished() {
                        return Ok(None);
                    }
                }
                Event::Send(request) => self.deferred.push_back(request),
                Event::Closed => {
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Correlate an inbound message with its command and apply it.
    ///
    /// A message that cannot be applied (bad payload, a nested command that
    /// timed out) is logged and dropped; only a failed connection is an error.
    pub fn dispatch(&mut self, node: Node) -> Result<Response> {
        let id = transaction_id(&node);
        let response = MessageBuilder::create_response(node, self.transactions.last_requested_url());
        let command = id.and_then(|id| self.transactions.take(id));
        if let (Some(id), None) = (id, &command) {
            debug!("no pending command for transaction {id}");
        }
        if let Some(error) = response.error() {
            let name = response.node().attribute("command").unwrap_or("?").to_string();
            warn!("{name} failed: {} (code {})", error.message, error.code);
            self.model.command_failed(&name, &error);
            return Ok(response);
        }
        match response.process(self, command.as_ref()) {
            Ok(()) => {}
            // The connection is unusable; let the loop end.
            Err(e @ (DbgpError::IOError(_) | DbgpError::SessionClosed)) => return Err(e),
            Err(e) => warn!(
                "<{}> {} not applied: {e}",
                response.node().name(),
                response.node().attribute("command").unwrap_or_default()
            ),
        }
        Ok(response)
    }

    pub(crate) fn attach(&mut self, engine: EngineInfo) {
        self.model.engine_attached(&engine);
        self.engine = Some(engine);
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus, reason: Option<&str>) {
        debug!("status {status} ({})", reason.unwrap_or("ok"));
        self.status = Some(status);
        self.model.status_changed(status, reason);
    }

    pub(crate) fn persisted_breakpoints(&self) -> Vec<(String, Breakpoint)> {
        self.breakpoints.clone()
    }

    pub(crate) fn watches(&self) -> Vec<String> {
        self.watches.clone()
    }

    pub(crate) fn link_breakpoint(&mut self, key: &str, id: &str) {
        self.remote_ids.insert(key.to_string(), id.to_string());
    }

    pub(crate) fn unlink_breakpoint(&mut self, id: &str) {
        self.remote_ids.retain(|_, remote| remote != id);
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    fn teardown(&mut self) {
        for command in self.transactions.drain() {
            debug!(
                "discarded {} (transaction {})",
                command.name(),
                command.transaction_id()
            );
        }
        self.model.session_finished();
        info!("session finished");
    }
}

/// Read frames from `reader` and deliver them to the session until the
/// stream ends.
pub fn spawn_reader(reader: impl Read + Send + 'static, handle: SessionHandle) -> Result<JoinHandle<()>> {
    let thread = thread::Builder::new()
        .name("dbgp-reader".to_string())
        .spawn(move || {
            let mut reader = reader;
            let mut frames = FrameReader::new();
            loop {
                match frames.read_frame(&mut reader) {
                    Ok(Some(body)) => {
                        let xml = decode_document(&body);
                        debug!("<- {xml}");
                        match Node::parse(&xml) {
                            Ok(node) => {
                                if handle.deliver(node).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("dropping unparsable message: {e}"),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("engine connection failed: {e}");
                        break;
                    }
                }
            }
            handle.close();
        })?;
    Ok(thread)
}
