//! Operator console: one line of text per request.
//!
//! | line | request |
//! | --- | --- |
//! | `run`, `r` | `run` |
//! | `step`, `s` | `step_into` |
//! | `over`, `n` | `step_over` |
//! | `out` | `step_out` |
//! | `stop`, `detach`, `break`, `status` | same |
//! | `stack`, `bt` | `stack_get` |
//! | `depth` | `stack_depth` |
//! | `eval <expr>` | `eval` |
//! | `print <name>`, `p <name>` | `property_get` |
//! | `set <name> <value>` | `property_set` |
//! | `source <file> [<begin> <end>]` | `source` |
//! | `bp <file> <line>` | `breakpoint_set` (1-based line) |
//! | `bps` | `breakpoint_list` |
//! | `rm <id>` | `breakpoint_remove` |
//! | `feature <name>` | `feature_get` |
//! | `types` | `typemap_get` |
//! | `url` | requested-URL eval |

use crate::command::{
    BrkpntSetCommand, EvalCommand, Feature, PropertyCommand, PropertySetCommand, Request,
    SourceCommand, StackGetCommand,
};

/// Parse one console line; `None` if it is empty or not understood.
pub fn parse_line(line: &str) -> Option<Request> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let request = match (word, args.as_slice()) {
        ("run" | "r", []) => Request::Run,
        ("step" | "s", []) => Request::StepInto,
        ("over" | "n", []) => Request::StepOver,
        ("out", []) => Request::StepOut,
        ("stop", []) => Request::Stop,
        ("detach", []) => Request::Detach,
        ("break", []) => Request::Break,
        ("status", []) => Request::Status,
        ("stack" | "bt", []) => Request::StackGet(StackGetCommand::new()),
        ("depth", []) => Request::StackDepth,
        ("bps", []) => Request::BrkpntList,
        ("types", []) => Request::TypemapGet,
        ("url", []) => Request::RequestedUrlEval,
        // The expression keeps its own spacing.
        ("eval", [_, ..]) => Request::Eval(EvalCommand::new(rest)),
        ("print" | "p", [name]) => Request::PropertyGet(PropertyCommand::new(*name)),
        ("set", [name, _, ..]) => {
            let value = rest[name.len()..].trim();
            Request::PropertySet(PropertySetCommand::new(*name, value))
        }
        ("source", [file]) => Request::Source(SourceCommand::new(*file)),
        ("source", [file, begin, end]) => Request::Source(
            SourceCommand::new(*file)
                .begin(begin.parse().ok()?)
                .end(end.parse().ok()?),
        ),
        ("bp", [file, line]) => {
            let line: u32 = line.parse().ok()?;
            let cmd = BrkpntSetCommand::line(*file, line.checked_sub(1)?);
            // Keyed like the store so the engine's id is linked on reply.
            let key = cmd.breakpoint().default_key();
            Request::BrkpntSet(cmd.key(key))
        }
        ("rm", [id]) => Request::BrkpntRemove(id.to_string()),
        ("feature", [name]) => Request::FeatureGet(name.parse::<Feature>().ok()?),
        _ => return None,
    };
    Some(request)
}
