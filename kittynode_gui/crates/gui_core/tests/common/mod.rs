#![allow(dead_code)]

use async_trait::async_trait;
use gui_core::bootstrap::{HostError, WindowHost};
use gui_core::protocol::{Command, Package};
use gui_core::rpc::{Backend, RpcError};
use gui_core::updates::{AppHost, DownloadEvent, UpdateChannel, UpdateError, UpdateInfo};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Scripted = Result<Value, String>;

/// Backend whose answers are scripted per command. Every invocation is recorded
/// before it is answered.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<(Command, Value)>>,
    queued: Mutex<HashMap<Command, VecDeque<Scripted>>>,
    defaults: Mutex<HashMap<Command, Scripted>>,
    delays: Mutex<HashMap<Command, Duration>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `command` with `value`.
    pub fn respond(&self, command: Command, value: Value) {
        self.defaults.lock().unwrap().insert(command, Ok(value));
    }

    /// Fail every call to `command`.
    pub fn fail(&self, command: Command, message: &str) {
        self.defaults
            .lock()
            .unwrap()
            .insert(command, Err(message.to_string()));
    }

    /// Answer only the next call to `command`, ahead of the default.
    pub fn respond_once(&self, command: Command, result: Scripted) {
        self.queued
            .lock()
            .unwrap()
            .entry(command)
            .or_default()
            .push_back(result);
    }

    pub fn delay(&self, command: Command, delay: Duration) {
        self.delays.lock().unwrap().insert(command, delay);
    }

    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn calls_to(&self, command: Command) -> usize {
        self.calls().into_iter().filter(|c| *c == command).count()
    }

    pub fn params_of(&self, command: Command) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == command)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn invoke(&self, command: Command, params: Value) -> Result<Value, RpcError> {
        self.calls.lock().unwrap().push((command, params));
        let delay = self.delays.lock().unwrap().get(&command).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&command)
            .and_then(VecDeque::pop_front);
        let scripted = queued.or_else(|| self.defaults.lock().unwrap().get(&command).cloned());
        match scripted {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(RpcError::Backend { command, message }),
            None => Err(RpcError::Backend {
                command,
                message: "no response scripted".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct MockWindow {
    pub shows: AtomicUsize,
}

#[async_trait]
impl WindowHost for MockWindow {
    async fn show_window(&self) -> Result<(), HostError> {
        self.shows.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockHost {
    pub relaunches: AtomicUsize,
}

#[async_trait]
impl AppHost for MockHost {
    async fn relaunch(&self) -> Result<(), HostError> {
        self.relaunches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Update channel with a scripted check result and a scripted download.
pub struct MockUpdateChannel {
    pub checks: AtomicUsize,
    pub installs: AtomicUsize,
    check_queue: Mutex<VecDeque<Result<Option<UpdateInfo>, String>>>,
    check_default: Mutex<Option<UpdateInfo>>,
    check_delay: Mutex<Duration>,
    install_result: Mutex<Result<(), String>>,
    install_delay: Mutex<Duration>,
    pub seen_events: Mutex<Vec<DownloadEvent>>,
}

impl MockUpdateChannel {
    pub fn new(available: Option<UpdateInfo>) -> Self {
        Self {
            checks: AtomicUsize::new(0),
            installs: AtomicUsize::new(0),
            check_queue: Mutex::new(VecDeque::new()),
            check_default: Mutex::new(available),
            check_delay: Mutex::new(Duration::ZERO),
            install_result: Mutex::new(Ok(())),
            install_delay: Mutex::new(Duration::ZERO),
            seen_events: Mutex::new(Vec::new()),
        }
    }

    pub fn check_once(&self, result: Result<Option<UpdateInfo>, String>) {
        self.check_queue.lock().unwrap().push_back(result);
    }

    pub fn set_check_delay(&self, delay: Duration) {
        *self.check_delay.lock().unwrap() = delay;
    }

    pub fn fail_install(&self, message: &str) {
        *self.install_result.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_install_delay(&self, delay: Duration) {
        *self.install_delay.lock().unwrap() = delay;
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateChannel for MockUpdateChannel {
    async fn check(&self) -> Result<Option<UpdateInfo>, UpdateError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let delay = *self.check_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let queued = self.check_queue.lock().unwrap().pop_front();
        match queued {
            Some(result) => result.map_err(UpdateError::Check),
            None => Ok(self.check_default.lock().unwrap().clone()),
        }
    }

    async fn download_and_install(
        &self,
        _update: &UpdateInfo,
        on_event: &mut (dyn FnMut(DownloadEvent) + Send),
    ) -> Result<(), UpdateError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        let events = [
            DownloadEvent::Started {
                content_length: Some(300),
            },
            DownloadEvent::Progress { chunk_length: 100 },
            DownloadEvent::Progress { chunk_length: 200 },
        ];
        for event in events {
            self.seen_events.lock().unwrap().push(event);
            on_event(event);
        }
        let delay = *self.install_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = self.install_result.lock().unwrap().clone();
        result.map_err(UpdateError::Install)?;
        self.seen_events.lock().unwrap().push(DownloadEvent::Finished);
        on_event(DownloadEvent::Finished);
        Ok(())
    }
}

pub fn package(name: &str) -> Package {
    Package {
        name: name.to_string(),
        description: format!("{name} node"),
        network_name: "kittynode-network".to_string(),
        containers: vec![],
    }
}

pub fn package_json(name: &str) -> Value {
    serde_json::to_value(package(name)).unwrap()
}

pub fn installed_json(names: &[&str]) -> Value {
    Value::Array(names.iter().map(|n| package_json(n)).collect())
}

pub fn catalog_json(names: &[&str]) -> Value {
    let mut map = serde_json::Map::new();
    for name in names {
        map.insert(name.to_string(), package_json(name));
    }
    Value::Object(map)
}

pub fn update_info(version: &str) -> UpdateInfo {
    UpdateInfo {
        version: version.to_string(),
        current_version: "0.1.0".to_string(),
        date: None,
        body: Some("bug fixes".to_string()),
    }
}

pub fn unit() -> Value {
    json!(null)
}
