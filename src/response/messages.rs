//! Messages the engine sends on its own: `init`, `stream` and `notify`.

use log::{debug, info, warn};

use super::{BreakpointInfo, EngineInfo, StreamKind};
use crate::command::{BrkpntSetCommand, Feature, FeatureSetCommand, Request, StreamMode};
use crate::error::{DbgpError, Result};
use crate::node::Node;
use crate::protocol::decode_base64;
use crate::session::Session;

node_view! {
    /// The handshake packet opening every session.
    InitMessage,
    /// Forwarded stdout/stderr output.
    StreamMessage,
    /// Asynchronous notification, e.g. `breakpoint_resolved`.
    NotifyMessage,
}

impl InitMessage {
    pub fn engine_info(&self) -> EngineInfo {
        let node = &self.0;
        let owned = |name: &str| node.attribute(name).map(str::to_string);
        let engine = node.child("engine");
        EngineInfo {
            app_id: owned("appid").unwrap_or_default(),
            ide_key: owned("idekey"),
            session: owned("session"),
            thread: owned("thread"),
            language: owned("language").unwrap_or_default(),
            protocol_version: owned("protocol_version").unwrap_or_default(),
            file_uri: owned("fileuri").unwrap_or_default(),
            engine: engine.map(|e| e.text().trim().to_string()),
            engine_version: engine.and_then(|e| e.attribute("version")).map(str::to_string),
        }
    }

    /// Negotiate features, install breakpoints, set up output forwarding
    /// and start the script.
    pub(crate) fn process(&self, session: &mut Session) -> Result<()> {
        let engine = self.engine_info();
        info!(
            "engine attached: {} {} ({})",
            engine.language, engine.file_uri, engine.app_id
        );
        session.attach(engine);

        let options = session.options().clone();
        let features = [
            (Feature::MaxDepth, options.max_depth.to_string()),
            (Feature::MaxChildren, options.max_children.to_string()),
            (Feature::MaxData, options.max_data.to_string()),
            (Feature::ShowHidden, u8::from(options.show_hidden).to_string()),
        ];
        for (feature, value) in features {
            let request = Request::FeatureSet(FeatureSetCommand::new(feature, value));
            match session.send_synchronous(request) {
                Ok(_) => {}
                Err(DbgpError::Timeout(id)) => {
                    warn!("no answer to feature_set {feature} (transaction {id}), continuing");
                }
                Err(e) => return Err(e),
            }
            if session.is_finished() {
                return Ok(());
            }
        }

        for (key, breakpoint) in session.persisted_breakpoints() {
            session.send(Request::BrkpntSet(BrkpntSetCommand::new(breakpoint).key(key)))?;
        }

        if options.redirect_output != StreamMode::Disable {
            session.send(Request::Stdout(options.redirect_output))?;
            session.send(Request::Stderr(options.redirect_output))?;
        }

        if options.resolve_requested_url {
            session.send(Request::RequestedUrlEval)?;
        }

        if options.stop_at_first_line {
            session.send(Request::StepInto)?;
        } else {
            session.send(Request::Run)?;
        }
        Ok(())
    }
}

impl StreamMessage {
    pub fn kind(&self) -> Option<StreamKind> {
        self.0.attribute("type").and_then(|t| t.parse().ok())
    }

    pub(crate) fn process(&self, session: &mut Session) -> Result<()> {
        let Some(kind) = self.kind() else {
            warn!("stream message of unknown type {:?}", self.0.attribute("type"));
            return Ok(());
        };
        let text = match self.0.attribute("encoding") {
            Some("base64") => match decode_base64(self.0.text()) {
                Ok(bytes) => session.charset().decode(&bytes),
                Err(e) => {
                    warn!("dropping {kind} output: {e}");
                    return Ok(());
                }
            },
            _ => self.0.text().to_string(),
        };
        session.model().output(kind, &text);
        Ok(())
    }
}

impl NotifyMessage {
    pub fn name(&self) -> &str {
        self.0.attribute("name").unwrap_or_default()
    }

    pub(crate) fn process(&self, session: &mut Session) -> Result<()> {
        match self.name() {
            "breakpoint_resolved" => {
                if let Some(node) = self.0.child("breakpoint") {
                    let breakpoint = BreakpointInfo::from_node(node);
                    debug!("breakpoint {} resolved", breakpoint.id);
                    session.model().breakpoint_resolved(&breakpoint);
                }
            }
            other => debug!("ignoring notification {other:?}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_info_from_init() {
        let xml = r#"<init xmlns="urn:debugger_protocol_v1" fileuri="file:///var/www/index.php" language="PHP" xdebug:language_version="8.3.0" protocol_version="1.0" appid="4711" idekey="netbeans-xdebug" xmlns:xdebug="https://xdebug.org/dbgp/xdebug"><engine version="3.3.1"><![CDATA[Xdebug]]></engine></init>"#;
        let init = InitMessage::new(Node::parse(xml).unwrap());
        let info = init.engine_info();
        assert_eq!(info.app_id, "4711");
        assert_eq!(info.ide_key.as_deref(), Some("netbeans-xdebug"));
        assert_eq!(info.language, "PHP");
        assert_eq!(info.file_uri, "file:///var/www/index.php");
        assert_eq!(info.engine.as_deref(), Some("Xdebug"));
        assert_eq!(info.engine_version.as_deref(), Some("3.3.1"));
    }

    #[test]
    fn stream_kind() {
        let msg = StreamMessage::new(Node::new("stream").with_attribute("type", "stderr"));
        assert_eq!(msg.kind(), Some(StreamKind::Stderr));
    }
}
