use crate::command::State;
use crate::response::{
    BreakpointInfo, Context, EngineInfo, ErrorInfo, Property, SessionStatus, Stack, StreamKind,
    TypeMapEntry,
};

/// Receives everything a session learns from the engine.
///
/// All methods default to doing nothing, so a front end implements only what
/// it displays. Calls happen on the session thread.
#[allow(unused_variables)]
pub trait DebuggerModel: Send {
    fn engine_attached(&mut self, engine: &EngineInfo) {}

    fn status_changed(&mut self, status: SessionStatus, reason: Option<&str>) {}

    /// Frames of the current stop, innermost first.
    fn stack_updated(&mut self, frames: &[Stack]) {}

    fn stack_depth(&mut self, depth: i64) {}

    fn contexts_updated(&mut self, depth: u32, contexts: &[Context]) {}

    fn variables_updated(&mut self, depth: u32, context: i64, variables: &[Property]) {}

    /// `value` is `None` when the engine returned nothing for the expression.
    fn watch_updated(&mut self, expression: &str, value: Option<&Property>) {}

    fn evaluated(&mut self, expression: &str, value: Option<&Property>) {}

    fn property_received(&mut self, name: &str, property: &Property) {}

    fn property_set(&mut self, name: &str, success: bool) {}

    /// `key` is the local key the breakpoint was installed under, if any.
    fn breakpoint_set(&mut self, key: Option<&str>, id: &str, state: Option<State>, resolved: bool) {}

    fn breakpoint_resolved(&mut self, breakpoint: &BreakpointInfo) {}

    fn breakpoint_removed(&mut self, id: &str) {}

    fn breakpoints_listed(&mut self, breakpoints: &[BreakpointInfo]) {}

    fn feature_received(&mut self, feature: &str, supported: bool, value: &str) {}

    fn source_received(&mut self, file: &str, text: &str) {}

    fn typemap_received(&mut self, types: &[TypeMapEntry]) {}

    fn requested_url(&mut self, url: &str) {}

    fn output(&mut self, stream: StreamKind, text: &str) {}

    fn command_failed(&mut self, command: &str, error: &ErrorInfo) {}

    fn session_finished(&mut self) {}
}

/// A model that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopModel;

impl DebuggerModel for NoopModel {}
