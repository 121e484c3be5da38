use log::debug;

use super::BreakpointInfo;
use crate::command::{Request, State};
use crate::error::Result;
use crate::node::Node;
use crate::session::Session;

node_view! {
    /// Answer to `breakpoint_set`: the engine-assigned id.
    BrkpntSetResponse,
    /// Answer to `breakpoint_get/list/update/remove`.
    BreakpointsResponse,
}

impl BrkpntSetResponse {
    pub fn id(&self) -> Option<&str> {
        self.0.attribute("id")
    }

    pub fn state(&self) -> Option<State> {
        self.0.attribute("state").and_then(|s| s.parse().ok())
    }

    pub fn resolved(&self) -> bool {
        self.0.attribute("resolved") == Some("resolved")
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::BrkpntSet(cmd)) = request else {
            return Ok(());
        };
        let Some(id) = self.id() else {
            debug!("breakpoint_set answered without an id");
            return Ok(());
        };
        if let Some(key) = cmd.breakpoint_key() {
            session.link_breakpoint(key, id);
        }
        session
            .model()
            .breakpoint_set(cmd.breakpoint_key(), id, self.state(), self.resolved());
        Ok(())
    }
}

impl BreakpointsResponse {
    pub fn breakpoints(&self) -> Vec<BreakpointInfo> {
        self.0
            .children_named("breakpoint")
            .map(BreakpointInfo::from_node)
            .collect()
    }

    pub(crate) fn process_get(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::BrkpntGet(_)) = request else {
            return Ok(());
        };
        session.model().breakpoints_listed(&self.breakpoints());
        Ok(())
    }

    pub(crate) fn process_list(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::BrkpntList) = request else {
            return Ok(());
        };
        session.model().breakpoints_listed(&self.breakpoints());
        Ok(())
    }

    pub(crate) fn process_update(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::BrkpntUpdate(cmd)) = request else {
            return Ok(());
        };
        debug!("breakpoint {} updated", cmd.id());
        let breakpoints = self.breakpoints();
        if !breakpoints.is_empty() {
            session.model().breakpoints_listed(&breakpoints);
        }
        Ok(())
    }

    pub(crate) fn process_remove(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::BrkpntRemove(id)) = request else {
            return Ok(());
        };
        session.unlink_breakpoint(id);
        session.model().breakpoint_removed(id);
        Ok(())
    }
}
