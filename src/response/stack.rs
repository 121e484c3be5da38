//! Stack and variable-context responses.

use log::debug;

use super::{Context, Property, Stack};
use crate::command::{ContextGetCommand, ContextNamesCommand, EvalCommand, Request};
use crate::error::Result;
use crate::node::Node;
use crate::session::Session;

node_view! {
    StackDepthResponse,
    StackGetResponse,
    ContextNamesResponse,
    ContextGetResponse,
}

impl StackDepthResponse {
    pub fn depth(&self) -> i64 {
        self.0.int_attribute("depth")
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::StackDepth) = request else {
            return Ok(());
        };
        session.model().stack_depth(self.depth());
        Ok(())
    }
}

impl StackGetResponse {
    pub fn frames(&self) -> Vec<Stack> {
        self.0.children_named("stack").map(Stack::from_node).collect()
    }

    /// Publish the frames, then ask for the top frame's contexts and refresh
    /// every watch.
    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::StackGet(_)) = request else {
            return Ok(());
        };
        let frames = self.frames();
        session.model().stack_updated(&frames);
        if frames.is_empty() {
            debug!("empty stack");
            return Ok(());
        }
        session.send(Request::ContextNames(ContextNamesCommand::new().depth(0)))?;
        for watch in session.watches() {
            session.send(Request::Eval(EvalCommand::watch(watch)))?;
        }
        Ok(())
    }
}

impl ContextNamesResponse {
    pub fn contexts(&self) -> Vec<Context> {
        self.0
            .children_named("context")
            .map(Context::from_node)
            .collect()
    }

    /// Request the variables of every context, at the same stack depth.
    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::ContextNames(cmd)) = request else {
            return Ok(());
        };
        let depth = cmd.stack_depth();
        let contexts = self.contexts();
        session.model().contexts_updated(depth.unwrap_or(0), &contexts);
        for context in &contexts {
            let Ok(id) = u32::try_from(context.id) else {
                debug!("skipping context {:?} with id {}", context.name, context.id);
                continue;
            };
            let mut get = ContextGetCommand::new(id);
            if let Some(depth) = depth {
                get = get.depth(depth);
            }
            session.send(Request::ContextGet(get))?;
        }
        Ok(())
    }
}

impl ContextGetResponse {
    pub fn context_id(&self) -> i64 {
        self.0.int_attribute("context")
    }

    pub fn properties(&self) -> Vec<Property> {
        self.0
            .children_named("property")
            .cloned()
            .map(Property::from_node)
            .collect()
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::ContextGet(cmd)) = request else {
            return Ok(());
        };
        let context = cmd
            .context_id()
            .map(i64::from)
            .unwrap_or_else(|| self.context_id());
        session
            .model()
            .variables_updated(cmd.stack_depth().unwrap_or(0), context, &self.properties());
        Ok(())
    }
}
