//! Continuation and status responses.

use log::{debug, info, warn};

use super::SessionStatus;
use crate::command::{Request, StackGetCommand};
use crate::error::Result;
use crate::node::Node;
use crate::session::Session;

node_view! {
    /// Answer to `status`, `run`, `step_*`, `stop` and `detach`.
    StatusResponse,
    /// Answer carrying only a `success` flag.
    SuccessResponse,
}

impl StatusResponse {
    pub fn status(&self) -> Option<SessionStatus> {
        self.0.attribute("status").and_then(|s| s.parse().ok())
    }

    pub fn reason(&self) -> Option<&str> {
        self.0.attribute("reason")
    }

    pub(crate) fn process_status(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::Status) = request else {
            return Ok(());
        };
        self.apply(session, false)
    }

    pub(crate) fn process_run(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::Run) = request else {
            return Ok(());
        };
        self.apply(session, false)
    }

    pub(crate) fn process_step(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::StepInto | Request::StepOver | Request::StepOut) = request else {
            return Ok(());
        };
        self.apply(session, false)
    }

    pub(crate) fn process_stop(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::Stop) = request else {
            return Ok(());
        };
        self.apply(session, true)
    }

    pub(crate) fn process_detach(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::Detach) = request else {
            return Ok(());
        };
        if let Some(status) = self.status() {
            session.set_status(status, self.reason());
        }
        info!("detached from engine");
        session.finish();
        Ok(())
    }

    fn apply(&self, session: &mut Session, stopping: bool) -> Result<()> {
        let Some(status) = self.status() else {
            warn!("{} response without a status", self.0.attribute("command").unwrap_or("?"));
            return Ok(());
        };
        session.set_status(status, self.reason());
        match status {
            SessionStatus::Break => {
                session.send(Request::StackGet(StackGetCommand::new()))?;
            }
            SessionStatus::Stopping if !stopping => {
                session.send(Request::Stop)?;
            }
            SessionStatus::Stopping | SessionStatus::Stopped => session.finish(),
            SessionStatus::Starting | SessionStatus::Running => {}
        }
        Ok(())
    }
}

impl SuccessResponse {
    pub fn success(&self) -> bool {
        self.0.bool_attribute("success")
    }

    // `break`, `stdout` and `stderr` are fire-and-forget, so there is no
    // pending command to check against.
    pub(crate) fn process_break(&self) -> Result<()> {
        debug!("break acknowledged: {}", self.success());
        Ok(())
    }

    pub(crate) fn process_feature_set(&self, request: Option<&Request>) -> Result<()> {
        let Some(Request::FeatureSet(cmd)) = request else {
            return Ok(());
        };
        if self.success() {
            debug!("feature {} = {}", cmd.feature(), cmd.value());
        } else {
            warn!("engine refused feature {} = {}", cmd.feature(), cmd.value());
        }
        Ok(())
    }

    pub(crate) fn process_property_set(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::PropertySet(cmd)) = request else {
            return Ok(());
        };
        session.model().property_set(cmd.name(), self.success());
        Ok(())
    }

    pub(crate) fn process_std_stream(&self) -> Result<()> {
        debug!(
            "{} forwarding acknowledged: {}",
            self.0.attribute("command").unwrap_or_default(),
            self.success()
        );
        Ok(())
    }
}
