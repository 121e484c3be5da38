use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Capability names for `feature_get` / `feature_set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    LanguageSupportsThreads,
    LanguageName,
    LanguageVersion,
    Encoding,
    ProtocolVersion,
    SupportsAsync,
    DataEncoding,
    BreakpointLanguages,
    BreakpointTypes,
    MultipleSessions,
    MaxChildren,
    MaxData,
    MaxDepth,
    ShowHidden,
    SupportsPostmortem,
    NotifyOk,
    ExtendedProperties,
    ResolvedBreakpoints,
    BreakpointDetails,
}

/// `feature_set -n <feature> -v <value>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSetCommand {
    feature: Feature,
    value: String,
}

impl FeatureSetCommand {
    pub fn new(feature: Feature, value: impl ToString) -> Self {
        Self {
            feature,
            value: value.to_string(),
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn arguments(&self) -> String {
        format!("-n {} -v {}", self.feature, self.value)
    }
}

/// What the engine does with the script's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Leave output alone.
    Disable,
    /// Write it normally and forward a copy.
    #[default]
    Copy,
    /// Forward it only.
    Redirect,
}

impl StreamMode {
    pub fn code(&self) -> u8 {
        match self {
            StreamMode::Disable => 0,
            StreamMode::Copy => 1,
            StreamMode::Redirect => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_set_arguments() {
        let cmd = FeatureSetCommand::new(Feature::MaxDepth, 3);
        assert_eq!(cmd.arguments(), "-n max_depth -v 3");
        assert_eq!(
            "resolved_breakpoints".parse::<Feature>().unwrap(),
            Feature::ResolvedBreakpoints
        );
    }
}
