//! Outbound DBGP commands.
//!
//! A [`Request`] describes what to ask the engine; a [`Command`] is a request
//! bound to the transaction id it was sent under.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::charset::Charset;
use crate::protocol::encode_frame;

mod breakpoint;
mod feature;
mod inspect;

pub use breakpoint::{
    Breakpoint, BrkpntSetCommand, BrkpntUpdateCommand, HitCondition, State, Target, Types,
};
pub use feature::{Feature, FeatureSetCommand, StreamMode};
pub use inspect::{
    ContextGetCommand, ContextNamesCommand, EvalCommand, PropertyCommand, PropertySetCommand,
    REQUESTED_URL_EXPRESSION, SourceCommand, StackGetCommand,
};

/// Correlates a response with the command that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u32);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TransactionId)
    }
}

/// Protocol command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CommandName {
    Status,
    Run,
    StepInto,
    StepOver,
    StepOut,
    Stop,
    Detach,
    Break,
    FeatureGet,
    FeatureSet,
    BreakpointSet,
    BreakpointUpdate,
    BreakpointRemove,
    BreakpointGet,
    BreakpointList,
    StackDepth,
    StackGet,
    ContextNames,
    ContextGet,
    TypemapGet,
    PropertyGet,
    PropertyValue,
    PropertySet,
    Source,
    Eval,
    Stdout,
    Stderr,
}

/// What to ask the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Status,
    Run,
    StepInto,
    StepOver,
    StepOut,
    Stop,
    Detach,
    Break,
    FeatureGet(Feature),
    FeatureSet(FeatureSetCommand),
    BrkpntSet(BrkpntSetCommand),
    BrkpntUpdate(BrkpntUpdateCommand),
    BrkpntRemove(String),
    BrkpntGet(String),
    BrkpntList,
    StackDepth,
    StackGet(StackGetCommand),
    ContextNames(ContextNamesCommand),
    ContextGet(ContextGetCommand),
    TypemapGet,
    PropertyGet(PropertyCommand),
    PropertyValue(PropertyCommand),
    PropertySet(PropertySetCommand),
    Source(SourceCommand),
    Eval(EvalCommand),
    /// `eval` of the URL the engine is serving; answered like any `eval`.
    RequestedUrlEval,
    Stdout(StreamMode),
    Stderr(StreamMode),
}

impl Request {
    pub fn name(&self) -> CommandName {
        match self {
            Request::Status => CommandName::Status,
            Request::Run => CommandName::Run,
            Request::StepInto => CommandName::StepInto,
            Request::StepOver => CommandName::StepOver,
            Request::StepOut => CommandName::StepOut,
            Request::Stop => CommandName::Stop,
            Request::Detach => CommandName::Detach,
            Request::Break => CommandName::Break,
            Request::FeatureGet(_) => CommandName::FeatureGet,
            Request::FeatureSet(_) => CommandName::FeatureSet,
            Request::BrkpntSet(_) => CommandName::BreakpointSet,
            Request::BrkpntUpdate(_) => CommandName::BreakpointUpdate,
            Request::BrkpntRemove(_) => CommandName::BreakpointRemove,
            Request::BrkpntGet(_) => CommandName::BreakpointGet,
            Request::BrkpntList => CommandName::BreakpointList,
            Request::StackDepth => CommandName::StackDepth,
            Request::StackGet(_) => CommandName::StackGet,
            Request::ContextNames(_) => CommandName::ContextNames,
            Request::ContextGet(_) => CommandName::ContextGet,
            Request::TypemapGet => CommandName::TypemapGet,
            Request::PropertyGet(_) => CommandName::PropertyGet,
            Request::PropertyValue(_) => CommandName::PropertyValue,
            Request::PropertySet(_) => CommandName::PropertySet,
            Request::Source(_) => CommandName::Source,
            Request::Eval(_) | Request::RequestedUrlEval => CommandName::Eval,
            Request::Stdout(_) => CommandName::Stdout,
            Request::Stderr(_) => CommandName::Stderr,
        }
    }

    /// Space-joined `-<flag> <value>` pairs, in the order the engine expects.
    pub fn arguments(&self) -> String {
        match self {
            Request::Status
            | Request::Run
            | Request::StepInto
            | Request::StepOver
            | Request::StepOut
            | Request::Stop
            | Request::Detach
            | Request::Break
            | Request::BrkpntList
            | Request::StackDepth
            | Request::TypemapGet
            | Request::RequestedUrlEval => String::new(),
            Request::FeatureGet(feature) => format!("-n {feature}"),
            Request::FeatureSet(cmd) => cmd.arguments(),
            Request::BrkpntSet(cmd) => cmd.arguments(),
            Request::BrkpntUpdate(cmd) => cmd.arguments(),
            Request::BrkpntRemove(id) | Request::BrkpntGet(id) => format!("-d {id}"),
            Request::StackGet(cmd) => cmd.arguments(),
            Request::ContextNames(cmd) => cmd.arguments(),
            Request::ContextGet(cmd) => cmd.arguments(),
            Request::PropertyGet(cmd) | Request::PropertyValue(cmd) => cmd.arguments(),
            Request::PropertySet(cmd) => cmd.arguments(),
            Request::Source(cmd) => cmd.arguments(),
            Request::Eval(_) => String::new(),
            Request::Stdout(mode) | Request::Stderr(mode) => format!("-c {}", mode.code()),
        }
    }

    /// Payload text, base64-encoded on the wire after ` -- `.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Request::BrkpntSet(cmd) => cmd.payload(),
            Request::PropertySet(cmd) => Some(cmd.value()),
            Request::Eval(cmd) => Some(cmd.expression()),
            Request::RequestedUrlEval => Some(REQUESTED_URL_EXPRESSION),
            _ => None,
        }
    }

    /// Whether the sender should expect a correlated response.
    pub fn want_acknowledgment(&self) -> bool {
        !matches!(self, Request::Break | Request::Stdout(_) | Request::Stderr(_))
    }
}

/// A request bound to its transaction id.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    transaction_id: TransactionId,
    request: Request,
}

impl Command {
    pub fn new(transaction_id: TransactionId, request: Request) -> Self {
        Self {
            transaction_id,
            request,
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn name(&self) -> CommandName {
        self.request.name()
    }

    pub fn want_acknowledgment(&self) -> bool {
        self.request.want_acknowledgment()
    }

    /// Serialize to a NUL-terminated frame, encoding the payload with `charset`.
    pub fn to_frame(&self, charset: Charset) -> Vec<u8> {
        let name: &'static str = self.request.name().into();
        let payload = self.request.payload().map(|text| charset.encode(text));
        encode_frame(
            name,
            &self.transaction_id.to_string(),
            &self.request.arguments(),
            payload.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_text(command: &Command) -> String {
        let frame = command.to_frame(Charset::UTF_8);
        assert_eq!(frame.last(), Some(&0));
        String::from_utf8(frame[..frame.len() - 1].to_vec()).unwrap()
    }

    #[test]
    fn simple_commands_have_no_arguments() {
        let command = Command::new(TransactionId(1), Request::Run);
        assert_eq!(frame_text(&command), "run -i 1");
        let command = Command::new(TransactionId(2), Request::StepInto);
        assert_eq!(frame_text(&command), "step_into -i 2");
    }

    #[test]
    fn feature_get_names_the_feature() {
        assert_eq!(Request::FeatureGet(Feature::MaxData).arguments(), "-n max_data");
    }

    #[test]
    fn eval_payload_is_base64_after_separator() {
        let command = Command::new(
            TransactionId(9),
            Request::Eval(EvalCommand::new("strlen('ab')")),
        );
        assert_eq!(frame_text(&command), "eval -i 9 -- c3RybGVuKCdhYicp");
    }

    #[test]
    fn payload_uses_the_given_charset() {
        let command = Command::new(TransactionId(4), Request::Eval(EvalCommand::new("\u{e9}")));
        let latin1 = command.to_frame(Charset::LATIN_1);
        let utf8 = command.to_frame(Charset::UTF_8);
        assert_eq!(latin1, b"eval -i 4 -- 6Q==\0".to_vec());
        assert_eq!(utf8, b"eval -i 4 -- w6k=\0".to_vec());
    }

    #[test]
    fn stream_commands_are_fire_and_forget() {
        assert!(!Request::Stdout(StreamMode::Copy).want_acknowledgment());
        assert!(!Request::Break.want_acknowledgment());
        assert!(Request::Detach.want_acknowledgment());
        assert!(Request::Status.want_acknowledgment());
        assert!(Request::Eval(EvalCommand::new("1")).want_acknowledgment());
        assert_eq!(Request::Stderr(StreamMode::Redirect).arguments(), "-c 2");
    }

    #[test]
    fn requested_url_eval_is_an_eval() {
        let request = Request::RequestedUrlEval;
        assert_eq!(request.name(), CommandName::Eval);
        assert_eq!(request.payload(), Some(REQUESTED_URL_EXPRESSION));
    }

    #[test]
    fn command_names_parse_back() {
        assert_eq!("breakpoint_set".parse::<CommandName>().unwrap(), CommandName::BreakpointSet);
        assert_eq!(CommandName::TypemapGet.to_string(), "typemap_get");
        assert!("frobnicate".parse::<CommandName>().is_err());
    }
}
