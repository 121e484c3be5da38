//! Inbound DBGP messages.
//!
//! [`MessageBuilder`] turns a parsed [`Node`] into a typed [`Response`];
//! [`Response::process`] applies it to the session, possibly sending
//! follow-up commands.

use log::{debug, warn};

use crate::command::{Command, CommandName, TransactionId};
use crate::error::Result;
use crate::node::Node;
use crate::session::Session;

/// Declares typed views over a message node.
macro_rules! node_view {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $name(Node);

            impl $name {
                pub fn new(node: Node) -> Self {
                    Self(node)
                }

                pub fn node(&self) -> &Node {
                    &self.0
                }
            }
        )*
    };
}

mod breakpoint;
mod data;
mod execution;
mod messages;
mod property;
mod stack;
mod values;

pub use breakpoint::{BreakpointsResponse, BrkpntSetResponse};
pub use data::{
    FeatureGetResponse, PropertyResponse, PropertyValueResponse, SourceResponse,
    TypemapGetResponse,
};
pub use execution::{StatusResponse, SuccessResponse};
pub use messages::{InitMessage, NotifyMessage, StreamMessage};
pub use property::{Encoding, Property};
pub use stack::{ContextGetResponse, ContextNamesResponse, StackDepthResponse, StackGetResponse};
pub use values::{
    BreakpointInfo, Context, EngineInfo, ErrorInfo, SessionStatus, Stack, StreamKind,
    TypeMapEntry,
};

/// A typed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Init(InitMessage),
    Stream(StreamMessage),
    Notify(NotifyMessage),
    Status(StatusResponse),
    Run(StatusResponse),
    Step(StatusResponse),
    Stop(StatusResponse),
    Detach(StatusResponse),
    Break(SuccessResponse),
    FeatureGet(FeatureGetResponse),
    FeatureSet(SuccessResponse),
    BrkpntSet(BrkpntSetResponse),
    BrkpntUpdate(BreakpointsResponse),
    BrkpntRemove(BreakpointsResponse),
    BrkpntGet(BreakpointsResponse),
    BrkpntList(BreakpointsResponse),
    StackDepth(StackDepthResponse),
    StackGet(StackGetResponse),
    ContextNames(ContextNamesResponse),
    ContextGet(ContextGetResponse),
    TypemapGet(TypemapGetResponse),
    PropertyGet(PropertyResponse),
    PropertyValue(PropertyValueResponse),
    PropertySet(SuccessResponse),
    Source(SourceResponse),
    Eval(PropertyResponse),
    RequestedUrlEval(PropertyResponse),
    StdStream(SuccessResponse),
    /// Anything we do not recognize; processing it does nothing.
    Unknown(Node),
}

impl Response {
    pub fn node(&self) -> &Node {
        match self {
            Response::Init(r) => r.node(),
            Response::Stream(r) => r.node(),
            Response::Notify(r) => r.node(),
            Response::Status(r)
            | Response::Run(r)
            | Response::Step(r)
            | Response::Stop(r)
            | Response::Detach(r) => r.node(),
            Response::Break(r)
            | Response::FeatureSet(r)
            | Response::PropertySet(r)
            | Response::StdStream(r) => r.node(),
            Response::FeatureGet(r) => r.node(),
            Response::BrkpntSet(r) => r.node(),
            Response::BrkpntUpdate(r)
            | Response::BrkpntRemove(r)
            | Response::BrkpntGet(r)
            | Response::BrkpntList(r) => r.node(),
            Response::StackDepth(r) => r.node(),
            Response::StackGet(r) => r.node(),
            Response::ContextNames(r) => r.node(),
            Response::ContextGet(r) => r.node(),
            Response::TypemapGet(r) => r.node(),
            Response::PropertyGet(r) | Response::Eval(r) | Response::RequestedUrlEval(r) => {
                r.node()
            }
            Response::PropertyValue(r) => r.node(),
            Response::Source(r) => r.node(),
            Response::Unknown(node) => node,
        }
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        transaction_id(self.node())
    }

    /// The engine's error report, if the command failed.
    pub fn error(&self) -> Option<ErrorInfo> {
        self.node().child("error").map(ErrorInfo::from_node)
    }

    /// Apply the response to `session`.
    ///
    /// `command` is the pending command registered under the response's
    /// transaction id. A response paired with a command of the wrong kind is
    /// ignored.
    pub fn process(&self, session: &mut Session, command: Option<&Command>) -> Result<()> {
        let request = command.map(Command::request);
        match self {
            Response::Init(r) => r.process(session),
            Response::Stream(r) => r.process(session),
            Response::Notify(r) => r.process(session),
            Response::Status(r) => r.process_status(session, request),
            Response::Run(r) => r.process_run(session, request),
            Response::Step(r) => r.process_step(session, request),
            Response::Stop(r) => r.process_stop(session, request),
            Response::Detach(r) => r.process_detach(session, request),
            Response::Break(r) => r.process_break(),
            Response::FeatureGet(r) => r.process(session, request),
            Response::FeatureSet(r) => r.process_feature_set(request),
            Response::BrkpntSet(r) => r.process(session, request),
            Response::BrkpntUpdate(r) => r.process_update(session, request),
            Response::BrkpntRemove(r) => r.process_remove(session, request),
            Response::BrkpntGet(r) => r.process_get(session, request),
            Response::BrkpntList(r) => r.process_list(session, request),
            Response::StackDepth(r) => r.process(session, request),
            Response::StackGet(r) => r.process(session, request),
            Response::ContextNames(r) => r.process(session, request),
            Response::ContextGet(r) => r.process(session, request),
            Response::TypemapGet(r) => r.process(session, request),
            Response::PropertyGet(r) => r.process_property_get(session, request),
            Response::PropertyValue(r) => r.process(session, request),
            Response::PropertySet(r) => r.process_property_set(session, request),
            Response::Source(r) => r.process(session, request),
            Response::Eval(r) => r.process_eval(session, request),
            Response::RequestedUrlEval(r) => r.process_requested_url(session, request),
            Response::StdStream(r) => r.process_std_stream(),
            Response::Unknown(node) => {
                debug!("ignoring unknown message <{}>", node.name());
                Ok(())
            }
        }
    }
}

/// Transaction id carried by a message, if any.
pub fn transaction_id(node: &Node) -> Option<TransactionId> {
    node.attribute("transaction_id")?.parse().ok()
}

/// Maps raw inbound nodes to typed responses.
pub struct MessageBuilder;

impl MessageBuilder {
    /// Pick the response type for `node`.
    ///
    /// An `eval` response is indistinguishable on the wire from the answer to
    /// a requested-URL eval; it is treated as the latter when its transaction
    /// id equals `requested_url`, the id of the last such request.
    pub fn create_response(node: Node, requested_url: Option<TransactionId>) -> Response {
        let tag = node.name().to_string();
        match tag.as_str() {
            "init" => return Response::Init(InitMessage::new(node)),
            "stream" => return Response::Stream(StreamMessage::new(node)),
            "notify" => return Response::Notify(NotifyMessage::new(node)),
            "response" => {}
            other => {
                warn!("unexpected message <{other}>");
                return Response::Unknown(node);
            }
        }
        let name = match node.attribute("command").map(str::parse::<CommandName>) {
            Some(Ok(name)) => name,
            _ => {
                warn!(
                    "response for unknown command {:?}",
                    node.attribute("command").unwrap_or_default()
                );
                return Response::Unknown(node);
            }
        };
        match name {
            CommandName::Status => Response::Status(StatusResponse::new(node)),
            CommandName::Run => Response::Run(StatusResponse::new(node)),
            CommandName::StepInto | CommandName::StepOver | CommandName::StepOut => {
                Response::Step(StatusResponse::new(node))
            }
            CommandName::Stop => Response::Stop(StatusResponse::new(node)),
            CommandName::Detach => Response::Detach(StatusResponse::new(node)),
            CommandName::Break => Response::Break(SuccessResponse::new(node)),
            CommandName::FeatureGet => Response::FeatureGet(FeatureGetResponse::new(node)),
            CommandName::FeatureSet => Response::FeatureSet(SuccessResponse::new(node)),
            CommandName::BreakpointSet => Response::BrkpntSet(BrkpntSetResponse::new(node)),
            CommandName::BreakpointUpdate => Response::BrkpntUpdate(BreakpointsResponse::new(node)),
            CommandName::BreakpointRemove => Response::BrkpntRemove(BreakpointsResponse::new(node)),
            CommandName::BreakpointGet => Response::BrkpntGet(BreakpointsResponse::new(node)),
            CommandName::BreakpointList => Response::BrkpntList(BreakpointsResponse::new(node)),
            CommandName::StackDepth => Response::StackDepth(StackDepthResponse::new(node)),
            CommandName::StackGet => Response::StackGet(StackGetResponse::new(node)),
            CommandName::ContextNames => Response::ContextNames(ContextNamesResponse::new(node)),
            CommandName::ContextGet => Response::ContextGet(ContextGetResponse::new(node)),
            CommandName::TypemapGet => Response::TypemapGet(TypemapGetResponse::new(node)),
            CommandName::PropertyGet => Response::PropertyGet(PropertyResponse::new(node)),
            CommandName::PropertyValue => Response::PropertyValue(PropertyValueResponse::new(node)),
            CommandName::PropertySet => Response::PropertySet(SuccessResponse::new(node)),
            CommandName::Source => Response::Source(SourceResponse::new(node)),
            CommandName::Eval => {
                if requested_url.is_some() && transaction_id(&node) == requested_url {
                    Response::RequestedUrlEval(PropertyResponse::new(node))
                } else {
                    Response::Eval(PropertyResponse::new(node))
                }
            }
            CommandName::Stdout | CommandName::Stderr => {
                Response::StdStream(SuccessResponse::new(node))
            }
        }
    }
}
