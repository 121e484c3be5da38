use std::{
    io::{self, BufRead},
    path::PathBuf,
    sync::PoisonError,
    thread,
};

use anyhow::{Context as _, Result};
use clap::Parser;
use dbgp::{
    BreakpointStore, Charset, DbgpServer, DebuggerModel, SessionOptions, SledStore,
    command::{Request, State},
    console,
    response::{
        BreakpointInfo, Context, EngineInfo, ErrorInfo, Property, SessionStatus, Stack,
        StreamKind, TypeMapEntry,
    },
    server::LatestSession,
};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version)]
struct Args {
    /// Address engines connect to.
    #[arg(short, long, default_value = "127.0.0.1:9000")]
    addr: String,
    /// Session options as JSON.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory of the breakpoint database.
    #[arg(short, long, default_value = "./")]
    store: PathBuf,
    /// Expression to evaluate on every break; repeatable.
    #[arg(short, long)]
    watch: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => SessionOptions::load(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => SessionOptions::default(),
    };
    options.watches.extend(args.watch);
    let charset = options.encoding;

    let store = SledStore::open(&args.store)?;
    let mut server = DbgpServer::new(args.addr.as_str(), store.clone(), options, move || {
        ConsoleModel { charset }
    })?;
    info!("version {}, waiting for engines on {}", env!("CARGO_PKG_VERSION"), server.local_addr()?);

    let latest = server.latest_session();
    thread::Builder::new()
        .name("dbgp-console".to_string())
        .spawn(move || read_console(latest, store))?;

    server.run()?;
    Ok(())
}

/// Forward console lines to the most recent session.
fn read_console(latest: LatestSession, store: SledStore) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let Some(request) = console::parse_line(&line) else {
            if !line.trim().is_empty() {
                println!("? {}", line.trim());
            }
            continue;
        };
        if let Request::BrkpntSet(cmd) = &request {
            let breakpoint = cmd.breakpoint().clone();
            let key = cmd
                .breakpoint_key()
                .map_or_else(|| breakpoint.default_key(), str::to_string);
            if let Err(e) = store.set(key, breakpoint) {
                warn!("breakpoint not saved: {e}");
            }
        }
        let handle = latest.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match handle {
            Some(handle) => {
                if let Err(e) = handle.send(request) {
                    println!("! {e}");
                }
            }
            None => println!("! no engine attached"),
        }
    }
}

/// Prints everything the session reports.
struct ConsoleModel {
    charset: Charset,
}

impl ConsoleModel {
    fn show(&self, property: &Property) -> String {
        let kind = property.type_name().unwrap_or("?");
        if property.has_children() {
            return format!("{} ({kind}, {} children)", property.full_name(), property.num_children());
        }
        match property.string_value(self.charset) {
            Ok(value) => format!("{} ({kind}) = {value}", property.full_name()),
            Err(e) => format!("{} ({kind}) <{e}>", property.full_name()),
        }
    }
}

fn location(file: &str, line: i64) -> String {
    if line < 0 {
        file.to_string()
    } else {
        format!("{file}:{}", line + 1)
    }
}

impl DebuggerModel for ConsoleModel {
    fn engine_attached(&mut self, engine: &EngineInfo) {
        println!(
            "engine {} {} attached, debugging {}",
            engine.language,
            engine.engine_version.as_deref().unwrap_or(""),
            engine.file_uri
        );
    }

    fn status_changed(&mut self, status: SessionStatus, reason: Option<&str>) {
        println!("[{status}] {}", reason.unwrap_or_default());
    }

    fn stack_updated(&mut self, frames: &[Stack]) {
        for frame in frames {
            println!("#{} {} at {}", frame.level, frame.function, location(&frame.file, frame.line));
        }
    }

    fn stack_depth(&mut self, depth: i64) {
        println!("stack depth {depth}");
    }

    fn contexts_updated(&mut self, _depth: u32, contexts: &[Context]) {
        let names: Vec<&str> = contexts.iter().map(|c| c.name.as_str()).collect();
        println!("contexts: {}", names.join(", "));
    }

    fn variables_updated(&mut self, depth: u32, context: i64, variables: &[Property]) {
        println!("context {context} at depth {depth}:");
        for variable in variables {
            println!("  {}", self.show(variable));
        }
    }

    fn watch_updated(&mut self, expression: &str, value: Option<&Property>) {
        match value {
            Some(value) => println!("watch {expression}: {}", self.show(value)),
            None => println!("watch {expression}: <none>"),
        }
    }

    fn evaluated(&mut self, expression: &str, value: Option<&Property>) {
        match value {
            Some(value) => println!("{expression} => {}", self.show(value)),
            None => println!("{expression} => <none>"),
        }
    }

    fn property_received(&mut self, _name: &str, property: &Property) {
        println!("{}", self.show(property));
        for child in property.children() {
            println!("  {}", self.show(&child));
        }
    }

    fn property_set(&mut self, name: &str, success: bool) {
        println!("set {name}: {}", if success { "ok" } else { "refused" });
    }

    fn breakpoint_set(&mut self, key: Option<&str>, id: &str, state: Option<State>, resolved: bool) {
        let resolved = if resolved { ", resolved" } else { "" };
        match state {
            Some(state) => println!("breakpoint {id} {}: {state}{resolved}", key.unwrap_or_default()),
            None => println!("breakpoint {id} {}{resolved}", key.unwrap_or_default()),
        }
    }

    fn breakpoint_resolved(&mut self, breakpoint: &BreakpointInfo) {
        let file = breakpoint.file.as_deref().unwrap_or_default();
        println!("breakpoint {} resolved at {}", breakpoint.id, location(file, breakpoint.line));
    }

    fn breakpoint_removed(&mut self, id: &str) {
        println!("breakpoint {id} removed");
    }

    fn breakpoints_listed(&mut self, breakpoints: &[BreakpointInfo]) {
        for bp in breakpoints {
            let types = bp.types.map(|t| t.to_string()).unwrap_or_default();
            let state = bp.state.map(|s| s.to_string()).unwrap_or_default();
            let file = bp.file.as_deref().unwrap_or_default();
            println!("{} {types} {state} {} hits={}", bp.id, location(file, bp.line), bp.hit_count);
        }
    }

    fn feature_received(&mut self, feature: &str, supported: bool, value: &str) {
        if supported {
            println!("{feature} = {value}");
        } else {
            println!("{feature} not supported");
        }
    }

    fn source_received(&mut self, file: &str, text: &str) {
        println!("--- {file}");
        println!("{text}");
    }

    fn typemap_received(&mut self, types: &[TypeMapEntry]) {
        for entry in types {
            println!("{} -> {}", entry.name, entry.common_type);
        }
    }

    fn requested_url(&mut self, url: &str) {
        println!("url {url}");
    }

    fn output(&mut self, stream: StreamKind, text: &str) {
        match stream {
            StreamKind::Stdout => print!("{text}"),
            StreamKind::Stderr => eprint!("{text}"),
        }
    }

    fn command_failed(&mut self, command: &str, error: &ErrorInfo) {
        println!("! {command}: {} ({})", error.message, error.code);
    }

    fn session_finished(&mut self) {
        println!("session finished");
    }
}
