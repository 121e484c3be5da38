//! Client side of the DBGP debugger protocol.
//!
//! A [`Session`] drives one engine connection: it frames and sends
//! [`Request`]s, correlates responses by transaction id, applies them and
//! reports what it learns to a [`DebuggerModel`].

pub mod charset;

pub mod command;

pub mod config;

pub mod console;

pub mod error;

pub mod node;

pub mod protocol;

pub mod response;

pub mod server;

pub mod session;

pub mod store;

pub mod thread_pool;

pub use crate::charset::Charset;
pub use crate::command::{Breakpoint, Command, Request, TransactionId};
pub use crate::config::SessionOptions;
pub use crate::error::{DbgpError, Result};
pub use crate::node::Node;
pub use crate::response::{MessageBuilder, Response};
pub use crate::server::DbgpServer;
pub use crate::session::{DebuggerModel, NoopModel, Session, SessionHandle};
pub use crate::store::{BreakpointStore, MemoryStore, SledStore};
