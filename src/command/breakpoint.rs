use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Breakpoint kinds understood by `breakpoint_set -t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Types {
    Line,
    Call,
    Return,
    Exception,
    Conditional,
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum State {
    #[default]
    Enabled,
    Disabled,
}

/// How `hit_value` is compared against the hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum HitCondition {
    #[strum(to_string = ">=")]
    AtLeast,
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "%")]
    Multiple,
}

/// Where a breakpoint fires. Each kind carries exactly the fields the engine
/// needs for it; lines are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Line { file: String, line: u32 },
    Call { function: String },
    Return { function: String },
    Exception { exception: String },
    Conditional { file: String, line: u32, expression: String },
    Watch { expression: String },
}

impl Target {
    pub fn types(&self) -> Types {
        match self {
            Target::Line { .. } => Types::Line,
            Target::Call { .. } => Types::Call,
            Target::Return { .. } => Types::Return,
            Target::Exception { .. } => Types::Exception,
            Target::Conditional { .. } => Types::Conditional,
            Target::Watch { .. } => Types::Watch,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Line { file, line } => write!(f, "line:{file}:{}", line + 1),
            Target::Call { function } => write!(f, "call:{function}"),
            Target::Return { function } => write!(f, "return:{function}"),
            Target::Exception { exception } => write!(f, "exception:{exception}"),
            Target::Conditional { file, line, .. } => {
                write!(f, "conditional:{file}:{}", line + 1)
            }
            Target::Watch { expression } => write!(f, "watch:{expression}"),
        }
    }
}

/// A breakpoint as the user defined it; what the store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub target: Target,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub hit: Option<(u32, HitCondition)>,
}

impl Breakpoint {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            state: State::Enabled,
            temporary: false,
            hit: None,
        }
    }

    /// Key the breakpoint is stored under unless the caller picks one.
    pub fn default_key(&self) -> String {
        self.target.to_string()
    }
}

/// `breakpoint_set`.
#[derive(Debug, Clone, PartialEq)]
pub struct BrkpntSetCommand {
    breakpoint: Breakpoint,
    key: Option<String>,
}

impl BrkpntSetCommand {
    pub fn new(breakpoint: Breakpoint) -> Self {
        Self {
            breakpoint,
            key: None,
        }
    }

    /// Break at a 0-based line of `file`.
    pub fn line(file: impl Into<String>, line: u32) -> Self {
        Self::new(Breakpoint::new(Target::Line {
            file: file.into(),
            line,
        }))
    }

    pub fn call(function: impl Into<String>) -> Self {
        Self::new(Breakpoint::new(Target::Call {
            function: function.into(),
        }))
    }

    pub fn function_return(function: impl Into<String>) -> Self {
        Self::new(Breakpoint::new(Target::Return {
            function: function.into(),
        }))
    }

    pub fn exception(exception: impl Into<String>) -> Self {
        Self::new(Breakpoint::new(Target::Exception {
            exception: exception.into(),
        }))
    }

    pub fn conditional(file: impl Into<String>, line: u32, expression: impl Into<String>) -> Self {
        Self::new(Breakpoint::new(Target::Conditional {
            file: file.into(),
            line,
            expression: expression.into(),
        }))
    }

    pub fn watch(expression: impl Into<String>) -> Self {
        Self::new(Breakpoint::new(Target::Watch {
            expression: expression.into(),
        }))
    }

    pub fn state(mut self, state: State) -> Self {
        self.breakpoint.state = state;
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.breakpoint.temporary = temporary;
        self
    }

    pub fn hit(mut self, value: u32, condition: HitCondition) -> Self {
        self.breakpoint.hit = Some((value, condition));
        self
    }

    /// Local key the engine-assigned id gets linked to.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn breakpoint_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn breakpoint(&self) -> &Breakpoint {
        &self.breakpoint
    }

    pub fn types(&self) -> Types {
        self.breakpoint.target.types()
    }

    pub(crate) fn arguments(&self) -> String {
        let bp = &self.breakpoint;
        let mut args = vec![format!("-t {}", bp.target.types()), format!("-s {}", bp.state)];
        if bp.temporary {
            args.push("-r 1".to_string());
        }
        match &bp.target {
            Target::Line { file, line } | Target::Conditional { file, line, .. } => {
                args.push(format!("-f {file}"));
                args.push(format!("-n {}", line + 1));
            }
            Target::Call { function } | Target::Return { function } => {
                args.push(format!("-m {function}"));
            }
            Target::Exception { exception } => args.push(format!("-x {exception}")),
            Target::Watch { .. } => {}
        }
        if let Some((value, condition)) = bp.hit {
            args.push(format!("-h {value}"));
            args.push(format!("-o {condition}"));
        }
        args.join(" ")
    }

    pub(crate) fn payload(&self) -> Option<&str> {
        match &self.breakpoint.target {
            Target::Conditional { expression, .. } | Target::Watch { expression } => {
                Some(expression)
            }
            _ => None,
        }
    }
}

/// `breakpoint_update`; only the fields that are set are sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrkpntUpdateCommand {
    id: String,
    state: Option<State>,
    line: Option<u32>,
    hit: Option<(u32, HitCondition)>,
}

impl BrkpntUpdateCommand {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// New 0-based line.
    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn hit(mut self, value: u32, condition: HitCondition) -> Self {
        self.hit = Some((value, condition));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn arguments(&self) -> String {
        let mut args = vec![format!("-d {}", self.id)];
        if let Some(state) = self.state {
            args.push(format!("-s {state}"));
        }
        if let Some(line) = self.line {
            args.push(format!("-n {}", line + 1));
        }
        if let Some((value, condition)) = self.hit {
            args.push(format!("-h {value}"));
            args.push(format!("-o {condition}"));
        }
        args.join(" ")
    }
}
