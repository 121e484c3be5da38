//! Commands that read the engine's state: stack, contexts, properties,
//! source and evaluation.

/// Builds the URL the engine is currently serving.
pub const REQUESTED_URL_EXPRESSION: &str = "(isset($_SERVER['HTTPS']) && $_SERVER['HTTPS'] !== 'off' ? 'https' : 'http') . '://' . $_SERVER['HTTP_HOST'] . $_SERVER['REQUEST_URI']";

/// `stack_get [-d <depth>]`; all frames unless a depth is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackGetCommand {
    depth: Option<u32>,
}

impl StackGetCommand {
    /// The whole stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the frame at `depth`.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub(crate) fn arguments(&self) -> String {
        self.depth.map(|d| format!("-d {d}")).unwrap_or_default()
    }
}

/// `context_names [-d <depth>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextNamesCommand {
    depth: Option<u32>,
}

impl ContextNamesCommand {
    /// Contexts of the current frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contexts of the frame at `depth`.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Frame the contexts were requested for; `None` means the current one.
    pub fn stack_depth(&self) -> Option<u32> {
        self.depth
    }

    pub(crate) fn arguments(&self) -> String {
        self.depth.map(|d| format!("-d {d}")).unwrap_or_default()
    }
}

/// `context_get -d <depth> -c <context id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextGetCommand {
    depth: Option<u32>,
    context: Option<u32>,
}

impl ContextGetCommand {
    /// Variables of context `context` in the current frame.
    pub fn new(context: u32) -> Self {
        Self {
            depth: None,
            context: Some(context),
        }
    }

    /// Read the frame at `depth` instead of the current one.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Context asked for.
    pub fn context_id(&self) -> Option<u32> {
        self.context
    }

    /// Frame asked for; `None` means the current one.
    pub fn stack_depth(&self) -> Option<u32> {
        self.depth
    }

    pub(crate) fn arguments(&self) -> String {
        let mut args = Vec::new();
        if let Some(depth) = self.depth {
            args.push(format!("-d {depth}"));
        }
        if let Some(context) = self.context {
            args.push(format!("-c {context}"));
        }
        args.join(" ")
    }
}

/// Shared by `property_get` and `property_value`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyCommand {
    name: String,
    depth: Option<u32>,
    context: Option<u32>,
    max_data: Option<u32>,
    page: Option<u32>,
    key: Option<String>,
}

impl PropertyCommand {
    /// `name` is the property's full name, e.g. `$user->roles[0]`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Stack frame the name is resolved in.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Context the name is resolved in.
    pub fn context(mut self, context: u32) -> Self {
        self.context = Some(context);
        self
    }

    /// Override the session's `max_data` for this value.
    pub fn max_data(mut self, max_data: u32) -> Self {
        self.max_data = Some(max_data);
        self
    }

    /// Page of children to return.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Address the property by the engine's key instead of its name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Full name of the property.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn arguments(&self) -> String {
        let mut args = vec![format!("-n {}", self.name)];
        if let Some(depth) = self.depth {
            args.push(format!("-d {depth}"));
        }
        if let Some(context) = self.context {
            args.push(format!("-c {context}"));
        }
        if let Some(max_data) = self.max_data {
            args.push(format!("-m {max_data}"));
        }
        if let Some(page) = self.page {
            args.push(format!("-p {page}"));
        }
        if let Some(key) = &self.key {
            args.push(format!("-k {key}"));
        }
        args.join(" ")
    }
}

/// `property_set -n <name> [...] -- <value>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertySetCommand {
    name: String,
    value: String,
    depth: Option<u32>,
    context: Option<u32>,
    data_type: Option<String>,
}

impl PropertySetCommand {
    /// Assign `value`, an expression in the engine's language, to `name`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Stack frame the name is resolved in.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Context the name is resolved in.
    pub fn context(mut self, context: u32) -> Self {
        self.context = Some(context);
        self
    }

    /// Type the engine should give the new value, e.g. `int`.
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Full name being assigned.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The new value as an expression.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn arguments(&self) -> String {
        let mut args = vec![format!("-n {}", self.name)];
        if let Some(depth) = self.depth {
            args.push(format!("-d {depth}"));
        }
        if let Some(context) = self.context {
            args.push(format!("-c {context}"));
        }
        if let Some(data_type) = &self.data_type {
            args.push(format!("-t {data_type}"));
        }
        args.join(" ")
    }
}

/// `source -f <file> [-b <begin>] [-e <end>]`; lines as the engine counts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCommand {
    file: String,
    begin: Option<u32>,
    end: Option<u32>,
}

impl SourceCommand {
    /// The whole of `file`, given as a URI.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            begin: None,
            end: None,
        }
    }

    /// First line to return.
    pub fn begin(mut self, line: u32) -> Self {
        self.begin = Some(line);
        self
    }

    /// Last line to return.
    pub fn end(mut self, line: u32) -> Self {
        self.end = Some(line);
        self
    }

    /// File URI asked for.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub(crate) fn arguments(&self) -> String {
        let mut args = vec![format!("-f {}", self.file)];
        if let Some(begin) = self.begin {
            args.push(format!("-b {begin}"));
        }
        if let Some(end) = self.end {
            args.push(format!("-e {end}"));
        }
        args.join(" ")
    }
}

/// `eval -- <expression>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalCommand {
    expression: String,
    watch: bool,
}

impl EvalCommand {
    /// A one-off evaluation.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            watch: false,
        }
    }

    /// Evaluation refreshing a watch expression rather than a one-off.
    pub fn watch(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            watch: true,
        }
    }

    /// Expression as sent, before base64 encoding.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Whether this refreshes a watch.
    pub fn is_watch(&self) -> bool {
        self.watch
    }
}
