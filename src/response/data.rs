//! Responses carrying data: features, properties, evaluations, source and
//! the type map.

use log::warn;

use super::{Property, TypeMapEntry};
use crate::command::Request;
use crate::error::{DbgpError, Result};
use crate::node::Node;
use crate::protocol::decode_base64;
use crate::session::Session;

node_view! {
    FeatureGetResponse,
    /// Answer wrapping a single `<property>`: `property_get` and `eval`.
    PropertyResponse,
    /// `property_value`; the value is the response's own text.
    PropertyValueResponse,
    SourceResponse,
    TypemapGetResponse,
}

impl FeatureGetResponse {
    pub fn feature_name(&self) -> &str {
        self.0.attribute("feature_name").unwrap_or_default()
    }

    pub fn supported(&self) -> bool {
        self.0.bool_attribute("supported")
    }

    pub fn value(&self) -> &str {
        self.0.text().trim()
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::FeatureGet(_)) = request else {
            return Ok(());
        };
        session
            .model()
            .feature_received(self.feature_name(), self.supported(), self.value());
        Ok(())
    }
}

impl PropertyResponse {
    pub fn property(&self) -> Option<Property> {
        self.0.child("property").cloned().map(Property::from_node)
    }

    pub(crate) fn process_property_get(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::PropertyGet(cmd)) = request else {
            return Ok(());
        };
        if let Some(property) = self.property() {
            session.model().property_received(cmd.name(), &property);
        }
        Ok(())
    }

    pub(crate) fn process_eval(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::Eval(cmd)) = request else {
            return Ok(());
        };
        let property = self.property();
        if cmd.is_watch() {
            session.model().watch_updated(cmd.expression(), property.as_ref());
        } else {
            session.model().evaluated(cmd.expression(), property.as_ref());
        }
        Ok(())
    }

    pub(crate) fn process_requested_url(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::RequestedUrlEval) = request else {
            return Ok(());
        };
        let Some(property) = self.property() else {
            return Ok(());
        };
        match property.string_value(session.charset()) {
            Ok(url) => session.model().requested_url(&url),
            Err(e @ (DbgpError::UnsufficientValue { .. } | DbgpError::Base64Error(_))) => {
                warn!("requested url: {e}")
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl PropertyValueResponse {
    pub fn property(&self) -> Property {
        Property::from_node(self.0.clone())
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::PropertyValue(cmd)) = request else {
            return Ok(());
        };
        session.model().property_received(cmd.name(), &self.property());
        Ok(())
    }
}

impl SourceResponse {
    pub fn success(&self) -> bool {
        self.0.attribute("success") != Some("0")
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::Source(cmd)) = request else {
            return Ok(());
        };
        if !self.success() {
            warn!("engine has no source for {}", cmd.file());
            return Ok(());
        }
        let text = match self.0.attribute("encoding") {
            Some("base64") => match decode_base64(self.0.text()) {
                Ok(bytes) => session.charset().decode(&bytes),
                Err(e) => {
                    warn!("source of {} unreadable: {e}", cmd.file());
                    return Ok(());
                }
            },
            _ => self.0.text().to_string(),
        };
        session.model().source_received(cmd.file(), &text);
        Ok(())
    }
}

impl TypemapGetResponse {
    pub fn entries(&self) -> Vec<TypeMapEntry> {
        self.0.children_named("map").map(TypeMapEntry::from_node).collect()
    }

    pub(crate) fn process(&self, session: &mut Session, request: Option<&Request>) -> Result<()> {
        let Some(Request::TypemapGet) = request else {
            return Ok(());
        };
        session.model().typemap_received(&self.entries());
        Ok(())
    }
}
