//! Adapters that turn the simulation backend's `get_world_width` answer and
//! `update-world` pushes into [`BackendEvent`]s on the event loop.
//!
//! Messages are JSON lines tagged by name:
//!
//! ```text
//! {"get_world_width": 32}
//! {"update-world": {"cells": [["Alive", "Dead"], ["Dead", "Alive"]]}}
//! ```

pub mod demo;

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use winit::event_loop::EventLoopProxy;

use crate::config::Config;
use crate::error::{log_error, BackendError};
use crate::world::WorldSnapshot;

/// The query line written to a backend process on startup.
pub const WIDTH_QUERY: &str = "\"get_world_width\"";

#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    WorldWidth(usize),
    UpdateWorld(WorldSnapshot),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendMessage {
    #[serde(rename = "get_world_width")]
    WorldWidth(usize),
    #[serde(rename = "update-world")]
    UpdateWorld(WorldSnapshot),
}

impl From<BackendMessage> for BackendEvent {
    fn from(message: BackendMessage) -> Self {
        match message {
            BackendMessage::WorldWidth(width) => BackendEvent::WorldWidth(width),
            BackendMessage::UpdateWorld(snapshot) => BackendEvent::UpdateWorld(snapshot),
        }
    }
}

/// Where a feed thread delivers events. Returns `false` once nobody is
/// listening, which stops the feed.
pub trait EventSink: Send + 'static {
    fn deliver(&self, event: BackendEvent) -> bool;
}

impl EventSink for EventLoopProxy<BackendEvent> {
    fn deliver(&self, event: BackendEvent) -> bool {
        self.send_event(event).is_ok()
    }
}

impl EventSink for mpsc::Sender<BackendEvent> {
    fn deliver(&self, event: BackendEvent) -> bool {
        self.send(event).is_ok()
    }
}

/// Parse one line of backend output. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<BackendEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let message: BackendMessage = serde_json::from_str(line)?;
    Ok(Some(message.into()))
}

/// Forward every message read from `reader` to `sink`, then report
/// [`BackendEvent::Closed`]. Malformed lines, including ones that are not
/// UTF-8, are logged and skipped; only a failing read ends the feed early.
pub fn pump<R: BufRead, S: EventSink>(reader: R, sink: &S) -> Result<(), BackendError> {
    for (number, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = match std::str::from_utf8(&line) {
            Ok(line) => line,
            Err(err) => {
                warn!("skipping backend line {}: {err}", number + 1);
                continue;
            }
        };
        match parse_line(line) {
            Ok(Some(event)) => {
                if !sink.deliver(event) {
                    debug!("event loop gone, stopping backend feed");
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(err) => warn!("skipping backend line {}: {err}", number + 1),
        }
    }
    sink.deliver(BackendEvent::Closed);
    Ok(())
}

/// A running backend feed. Dropping it stops the backend process, if any.
pub struct Feed {
    child: Option<Child>,
    _stdin: Option<ChildStdin>,
    _thread: JoinHandle<()>,
}

impl Drop for Feed {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Ok(None) = child.try_wait() {
                info!("stopping backend process {}", child.id());
                if let Err(err) = child.kill() {
                    log_error("kill", err);
                }
            }
            if let Err(err) = child.wait() {
                log_error("wait", err);
            }
        }
    }
}

/// An external simulation process talking JSON lines over stdio.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
}

impl ProcessBackend {
    pub fn new(command: &[String]) -> Result<Self, BackendError> {
        let (program, args) = command.split_first().ok_or(BackendError::MissingProgram)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn spawn<S: EventSink>(self, sink: S) -> Result<Feed, BackendError> {
        info!("starting backend {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or(BackendError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(BackendError::MissingPipe("stdout"))?;

        writeln!(stdin, "{WIDTH_QUERY}")?;
        stdin.flush()?;

        let thread = thread::Builder::new()
            .name("backend-reader".into())
            .spawn(move || {
                if let Err(err) = pump(BufReader::new(stdout), &sink) {
                    log_error("pump", err);
                    sink.deliver(BackendEvent::Closed);
                }
            })?;

        Ok(Feed {
            child: Some(child),
            _stdin: Some(stdin),
            _thread: thread,
        })
    }
}

/// Start whichever backend `config` selects.
pub fn start<S: EventSink>(config: &Config, sink: S) -> Result<Feed, BackendError> {
    if config.demo {
        demo::DemoBackend::new(config.demo_width, config.tick()).spawn(sink)
    } else {
        ProcessBackend::new(&config.backend)?.spawn(sink)
    }
}
