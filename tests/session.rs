use std::{
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex, atomic::Ordering, mpsc},
    thread,
    time::{Duration, Instant},
};

use dbgp::{
    BreakpointStore, Charset, DbgpServer, DebuggerModel, MemoryStore, NoopModel, Request, Session,
    SessionOptions,
    command::{Breakpoint, State, Target},
    protocol::engine_frame,
    response::{EngineInfo, Property, Stack, StreamKind},
};

const INIT: &str = r#"<?xml version="1.0" encoding="iso-8859-1"?>
<init xmlns="urn:debugger_protocol_v1" appid="4242" idekey="dbgp" language="PHP" protocol_version="1.0" fileuri="file:///srv/index.php"><engine version="3.3.0"><![CDATA[Xdebug]]></engine></init>"#;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn wait_for(&self, event: &str) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !self.events().iter().any(|e| e == event) {
            assert!(Instant::now() < deadline, "no {event:?} in {:?}", self.events());
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl DebuggerModel for Recorder {
    fn engine_attached(&mut self, engine: &EngineInfo) {
        self.push(format!("attached {} {}", engine.language, engine.app_id));
    }

    fn stack_updated(&mut self, frames: &[Stack]) {
        let top = &frames[0];
        self.push(format!("stack {}:{}", top.file, top.line));
    }

    fn variables_updated(&mut self, _depth: u32, _context: i64, variables: &[Property]) {
        let rendered: Vec<String> = variables
            .iter()
            .map(|p| format!("{}={}", p.name(), p.string_value(Charset::UTF_8).unwrap()))
            .collect();
        self.push(format!("variables {}", rendered.join(",")));
    }

    fn watch_updated(&mut self, expression: &str, value: Option<&Property>) {
        let value = value.map(|p| p.string_value(Charset::UTF_8).unwrap());
        self.push(format!("watch {expression}={}", value.unwrap_or_default()));
    }

    fn breakpoint_set(&mut self, key: Option<&str>, id: &str, _state: Option<State>, _resolved: bool) {
        self.push(format!("bp {} {id}", key.unwrap_or("-")));
    }

    fn output(&mut self, stream: StreamKind, text: &str) {
        self.push(format!("{stream} {text}"));
    }

    fn session_finished(&mut self) {
        self.push("finished".to_string());
    }
}

fn reply(command: &str, tid: &str) -> Option<String> {
    let head = format!(r#"<response xmlns="urn:debugger_protocol_v1" command="{command}" transaction_id="{tid}""#);
    let xml = match command {
        "feature_set" | "stdout" | "stderr" => format!(r#"{head} success="1"/>"#),
        "breakpoint_set" => format!(r#"{head} id="7" state="enabled"/>"#),
        "step_into" => format!(r#"{head} status="break" reason="ok"/>"#),
        "run" => format!(r#"{head} status="stopping" reason="ok"/>"#),
        "stop" => format!(r#"{head} status="stopped" reason="ok"/>"#),
        "stack_get" => format!(
            r#"{head}><stack where="{{main}}" level="0" type="file" filename="file:///srv/index.php" lineno="3"/></response>"#
        ),
        "context_names" => format!(r#"{head}><context name="Locals" id="0"/></response>"#),
        "context_get" => format!(
            r#"{head} context="0"><property name="$x" fullname="$x" type="int" encoding="base64" size="2"><![CDATA[NDI=]]></property></response>"#
        ),
        "eval" => format!(
            r#"{head}><property type="int" encoding="base64" size="3"><![CDATA[MTAw]]></property></response>"#
        ),
        _ => return None,
    };
    Some(xml)
}

/// Answer every command from a canned table and record what arrived.
fn fake_engine(stream: TcpStream) -> Vec<String> {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    writer.write_all(&engine_frame(INIT)).unwrap();

    let mut received = Vec::new();
    loop {
        let mut frame = Vec::new();
        if reader.read_until(0, &mut frame).unwrap_or(0) == 0 {
            break;
        }
        frame.pop();
        let line = String::from_utf8(frame).unwrap();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (command, tid) = (tokens[0], tokens[2]);
        if let Some(xml) = reply(command, tid) {
            if writer.write_all(&engine_frame(&xml)).is_err() {
                break;
            }
        }
        if command == "step_into" {
            let stream = r#"<stream type="stdout" encoding="base64">aGVsbG8K</stream>"#;
            writer.write_all(&engine_frame(stream)).unwrap();
        }
        received.push(line);
    }
    received
}

#[test]
fn full_session_through_the_server() {
    let store = MemoryStore::new();
    let bp = Breakpoint::new(Target::Line {
        file: "index.php".to_string(),
        line: 2,
    });
    store.set(bp.default_key(), bp).unwrap();

    let options = SessionOptions {
        encoding: Charset::UTF_8,
        watches: vec!["$total".to_string()],
        ..SessionOptions::default()
    };
    let recorder = Recorder::default();
    let models = recorder.clone();
    let mut server = DbgpServer::new("127.0.0.1:0", store, options, move || models.clone()).unwrap();
    let addr = server.local_addr().unwrap();
    let latest = server.latest_session();
    let shutdown = server.shutdown_flag();
    let server_thread = thread::spawn(move || server.run());

    let engine = thread::spawn(move || fake_engine(TcpStream::connect(addr).unwrap()));

    recorder.wait_for("variables $x=42");
    let handle = latest.lock().unwrap().clone().expect("session published");
    handle.send(Request::Run).unwrap();
    recorder.wait_for("finished");

    let received = engine.join().unwrap();
    shutdown.store(true, Ordering::Relaxed);
    server_thread.join().unwrap().unwrap();

    assert_eq!(
        received,
        vec![
            "feature_set -i 1 -n max_depth -v 3",
            "feature_set -i 2 -n max_children -v 30",
            "feature_set -i 3 -n max_data -v 2048",
            "feature_set -i 4 -n show_hidden -v 1",
            "breakpoint_set -i 5 -t line -s enabled -f index.php -n 3",
            "stdout -i 6 -c 1",
            "stderr -i 7 -c 1",
            "step_into -i 8",
            "stack_get -i 9",
            "context_names -i 10 -d 0",
            "eval -i 11 -- JHRvdGFs",
            "context_get -i 12 -d 0 -c 0",
            "run -i 13",
            "stop -i 14",
        ]
    );

    let events = recorder.events();
    assert_eq!(events[0], "attached PHP 4242");
    for expected in [
        "bp line:index.php:3 7",
        "stack file:///srv/index.php:2",
        "stdout hello\n",
        "watch $total=100",
        "variables $x=42",
    ] {
        assert!(events.iter().any(|e| e == expected), "missing {expected:?} in {events:?}");
    }
    assert_eq!(events.last().map(String::as_str), Some("finished"));
}

#[test]
fn engine_hanging_up_during_handshake_ends_the_session() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let engine = thread::spawn(move || {
        let stream = TcpStream::connect(addr).unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        writer.write_all(&engine_frame(INIT)).unwrap();
        let mut frame = Vec::new();
        reader.read_until(0, &mut frame).unwrap();
        writer
            .write_all(&engine_frame(
                r#"<response command="feature_set" transaction_id="1" success="1"/>"#,
            ))
            .unwrap();
        frame.clear();
        reader.read_until(0, &mut frame).unwrap();
        String::from_utf8_lossy(&frame).into_owned()
    });

    let (stream, _) = listener.accept().unwrap();
    let recorder = Recorder::default();
    let (mut session, handle) =
        Session::connect(stream, SessionOptions::default(), recorder.clone()).unwrap();
    session.run().unwrap();
    let second = engine.join().unwrap();
    assert!(second.starts_with("feature_set -i 2"));
    assert!(session.is_finished());
    assert_eq!(handle.outstanding(), 0);
    assert_eq!(recorder.events(), vec!["attached PHP 4242", "finished"]);
}

#[test]
fn more_engines_than_cpus_are_all_served() {
    let engines = num_cpus::get() + 2;
    let mut server = DbgpServer::new(
        "127.0.0.1:0",
        MemoryStore::new(),
        SessionOptions::default(),
        || NoopModel,
    )
    .unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_flag();
    let server_thread = thread::spawn(move || server.run());

    let (greeted, greetings) = mpsc::channel();
    let connections: Vec<_> = (0..engines)
        .map(|_| {
            let greeted = greeted.clone();
            thread::spawn(move || {
                let stream = TcpStream::connect(addr).unwrap();
                stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
                let mut writer = stream.try_clone().unwrap();
                let mut reader = BufReader::new(stream);
                writer.write_all(&engine_frame(INIT)).unwrap();
                let mut frame = Vec::new();
                reader.read_until(0, &mut frame).unwrap();
                frame.pop();
                greeted.send(String::from_utf8(frame).unwrap()).unwrap();
                // Keep the connection open until every engine was answered.
                writer
            })
        })
        .collect();

    for _ in 0..engines {
        let first = greetings
            .recv_timeout(Duration::from_secs(10))
            .expect("an attached engine got no command");
        assert_eq!(first, "feature_set -i 1 -n max_depth -v 3");
    }
    let open: Vec<TcpStream> = connections.into_iter().map(|c| c.join().unwrap()).collect();
    drop(open);

    shutdown.store(true, Ordering::Relaxed);
    server_thread.join().unwrap().unwrap();
}
