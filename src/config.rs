//! Session configuration.
//!
//! Options are read from a JSON file; every field is optional.
//!
//! ```json
//! { "max_depth": 2, "encoding": "ISO-8859-1", "watches": ["$total"] }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::charset::Charset;
use crate::command::StreamMode;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Nesting depth the engine expands properties to.
    pub max_depth: u32,
    /// Children returned per property page.
    pub max_children: u32,
    /// Bytes of a value the engine sends before truncating.
    pub max_data: u32,
    pub show_hidden: bool,
    /// Step into the first line instead of running to the first breakpoint.
    pub stop_at_first_line: bool,
    pub redirect_output: StreamMode,
    /// Project encoding for payloads.
    pub encoding: Charset,
    /// Give up on a response after this many milliseconds; wait forever if unset.
    pub pending_timeout_ms: Option<u64>,
    pub resolve_requested_url: bool,
    /// Expressions re-evaluated on every break.
    pub watches: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_children: 30,
            max_data: 2048,
            show_hidden: true,
            stop_at_first_line: true,
            redirect_output: StreamMode::Copy,
            encoding: Charset::platform_default(),
            pending_timeout_ms: None,
            resolve_requested_url: false,
            watches: Vec::new(),
        }
    }
}

impl SessionOptions {
    /// Load options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn pending_timeout(&self) -> Option<Duration> {
        self.pending_timeout_ms.map(Duration::from_millis)
    }
}
