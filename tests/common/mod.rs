//! In-memory `RemoteStore` used by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use rax_transfer::config::ConnectConfig;
use rax_transfer::error::{ConnectError, StoreError};
use rax_transfer::navigate::path;
use rax_transfer::protocol::{RawAttrs, RawEntry, RemoteStore};

pub type GetHook = Box<dyn FnMut(&str) + Send>;

enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Default)]
struct State {
    // Insertion order doubles as listing order
    nodes: Vec<(String, Node, u64)>,
    connected: bool,
    cwd: String,
    connects: usize,
    disconnects: usize,
    fail_connect: bool,
    fail_get: HashSet<String>,
    fail_list: HashSet<String>,
    misreport_types: bool,
    injected: Vec<(String, RawEntry)>,
    on_get: Option<GetHook>,
    calls: Vec<String>,
}

impl State {
    fn find(&self, p: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|(node_path, _, _)| node_path == p)
            .map(|(_, node, _)| node)
    }

    fn is_dir(&self, p: &str) -> bool {
        p == "/" || matches!(self.find(p), Some(Node::Dir))
    }

    fn children(&self, dir: &str) -> Vec<(String, &Node, u64)> {
        self.nodes
            .iter()
            .filter(|(node_path, _, _)| path::parent(node_path).as_deref() == Some(dir))
            .map(|(node_path, node, mtime)| {
                let name = path::file_name(node_path).unwrap_or_default().to_string();
                (name, node, *mtime)
            })
            .collect()
    }

    fn remove(&mut self, p: &str) {
        self.nodes.retain(|(node_path, _, _)| node_path != p);
    }

    fn insert(&mut self, p: String, node: Node) {
        let mtime = 1_700_000_000 + self.nodes.len() as u64;
        match self.nodes.iter_mut().find(|(node_path, _, _)| *node_path == p) {
            Some(existing) => existing.1 = node,
            None => self.nodes.push((p, node, mtime)),
        }
    }

    fn resolve(&self, p: &str) -> String {
        path::resolve(&self.cwd, p)
    }

    fn require_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::NotConnected)
        }
    }
}

/// Shared handle: clones observe and script the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        store.lock().cwd = "/".into();
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn dir(self, p: &str) -> Self {
        self.lock().insert(p.to_string(), Node::Dir);
        self
    }

    pub fn file(self, p: &str, contents: &[u8]) -> Self {
        self.lock().insert(p.to_string(), Node::File(contents.to_vec()));
        self
    }

    pub fn fail_connect(self) -> Self {
        self.lock().fail_connect = true;
        self
    }

    pub fn fail_get(self, p: &str) -> Self {
        self.lock().fail_get.insert(p.to_string());
        self
    }

    pub fn fail_list(self, p: &str) -> Self {
        self.lock().fail_list.insert(p.to_string());
        self
    }

    /// Listings report every entry with the wrong type flag
    pub fn misreport_types(self) -> Self {
        self.lock().misreport_types = true;
        self
    }

    /// Appends an extra raw record to the listing of `dir`
    pub fn inject_listing(self, dir: &str, name: &str, size: u64) -> Self {
        let entry = RawEntry::new(
            name,
            RawAttrs {
                is_dir: false,
                size,
                modified: 42,
            },
        );
        self.lock().injected.push((dir.to_string(), entry));
        self
    }

    pub fn on_get(self, hook: impl FnMut(&str) + Send + 'static) -> Self {
        self.lock().on_get = Some(Box::new(hook));
        self
    }

    pub fn contents(&self, p: &str) -> Option<Vec<u8>> {
        match self.lock().find(p) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, p: &str) -> bool {
        self.lock().find(p).is_some()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    pub fn disconnects(&self) -> usize {
        self.lock().disconnects
    }

    /// Number of stat calls made so far
    pub fn stats(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.starts_with("stat "))
            .count()
    }

    fn log(&self, call: String) {
        self.lock().calls.push(call);
    }
}

impl RemoteStore for MemoryStore {
    fn connect(&mut self, config: &ConnectConfig) -> Result<(), ConnectError> {
        self.log("connect".into());
        let mut state = self.lock();
        state.connects += 1;
        if state.fail_connect {
            return Err(ConnectError::Authentication(config.username.clone()));
        }
        state.connected = true;
        state.cwd = "/".into();
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        self.log("disconnect".into());
        let mut state = self.lock();
        state.disconnects += 1;
        state.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn list(&mut self, p: &str) -> Result<Vec<RawEntry>, StoreError> {
        self.log(format!("list {}", p));
        let state = self.lock();
        state.require_connected()?;
        let dir = state.resolve(p);
        if state.fail_list.contains(&dir) {
            return Err(StoreError::Protocol(format!("listing of {} failed", dir)));
        }
        if !state.is_dir(&dir) {
            return Err(StoreError::NotFound(dir));
        }

        let mut records = vec![
            RawEntry::new(".", RawAttrs { is_dir: true, ..RawAttrs::default() }),
            RawEntry::new("..", RawAttrs { is_dir: true, ..RawAttrs::default() }),
        ];
        for (name, node, mtime) in state.children(&dir) {
            let (is_dir, size) = match node {
                Node::Dir => (true, 0),
                Node::File(data) => (false, data.len() as u64),
            };
            records.push(RawEntry::new(
                name,
                RawAttrs {
                    is_dir: is_dir != state.misreport_types,
                    size,
                    modified: mtime,
                },
            ));
        }
        records.extend(
            state
                .injected
                .iter()
                .filter(|(injected_dir, _)| *injected_dir == dir)
                .map(|(_, entry)| entry.clone()),
        );
        Ok(records)
    }

    fn stat(&mut self, p: &str) -> Result<RawAttrs, StoreError> {
        self.log(format!("stat {}", p));
        let state = self.lock();
        state.require_connected()?;
        let target = state.resolve(p);
        if target == "/" {
            return Ok(RawAttrs { is_dir: true, ..RawAttrs::default() });
        }
        let (_, node, mtime) = state
            .nodes
            .iter()
            .find(|(node_path, _, _)| *node_path == target)
            .ok_or_else(|| StoreError::NotFound(target.clone()))?;
        Ok(match node {
            Node::Dir => RawAttrs { is_dir: true, size: 0, modified: *mtime },
            Node::File(data) => RawAttrs {
                is_dir: false,
                size: data.len() as u64,
                modified: *mtime,
            },
        })
    }

    fn get(&mut self, p: &str, sink: &mut dyn Write) -> Result<u64, StoreError> {
        self.log(format!("get {}", p));
        let (target, hook) = {
            let mut state = self.lock();
            state.require_connected()?;
            (state.resolve(p), state.on_get.take())
        };

        // Run the hook without holding the state lock
        if let Some(mut hook) = hook {
            hook(&target);
            self.lock().on_get = Some(hook);
        }

        let state = self.lock();
        let data = match state.find(&target) {
            Some(Node::File(data)) => data.clone(),
            _ => return Err(StoreError::NotFound(target)),
        };
        if state.fail_get.contains(&target) {
            sink.write_all(&data[..data.len() / 2]).map_err(StoreError::Local)?;
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset mid-transfer",
            )));
        }
        sink.write_all(&data).map_err(StoreError::Local)?;
        Ok(data.len() as u64)
    }

    fn put(&mut self, source: &mut dyn Read, p: &str) -> Result<u64, StoreError> {
        self.log(format!("put {}", p));
        let mut data = Vec::new();
        source.read_to_end(&mut data).map_err(StoreError::Local)?;

        let mut state = self.lock();
        state.require_connected()?;
        let target = state.resolve(p);
        let parent = path::parent(&target).unwrap_or_else(|| "/".into());
        if !state.is_dir(&parent) {
            return Err(StoreError::NotFound(parent));
        }
        if state.is_dir(&target) {
            return Err(StoreError::Rejected(format!("{} is a directory", target)));
        }
        let written = data.len() as u64;
        state.insert(target, Node::File(data));
        Ok(written)
    }

    fn mkdir(&mut self, p: &str) -> Result<(), StoreError> {
        self.log(format!("mkdir {}", p));
        let mut state = self.lock();
        state.require_connected()?;
        let target = state.resolve(p);
        if target == "/" || state.find(&target).is_some() {
            return Err(StoreError::Rejected(format!("{} exists", target)));
        }
        let parent = path::parent(&target).unwrap_or_else(|| "/".into());
        if !state.is_dir(&parent) {
            return Err(StoreError::NotFound(parent));
        }
        state.insert(target, Node::Dir);
        Ok(())
    }

    fn rmdir(&mut self, p: &str) -> Result<(), StoreError> {
        self.log(format!("rmdir {}", p));
        let mut state = self.lock();
        state.require_connected()?;
        let target = state.resolve(p);
        if !matches!(state.find(&target), Some(Node::Dir)) {
            return Err(StoreError::NotFound(target));
        }
        if !state.children(&target).is_empty() {
            return Err(StoreError::Rejected(format!("{} is not empty", target)));
        }
        state.remove(&target);
        Ok(())
    }

    fn rm(&mut self, p: &str) -> Result<(), StoreError> {
        self.log(format!("rm {}", p));
        let mut state = self.lock();
        state.require_connected()?;
        let target = state.resolve(p);
        if !matches!(state.find(&target), Some(Node::File(_))) {
            return Err(StoreError::NotFound(target));
        }
        state.remove(&target);
        Ok(())
    }

    fn cd(&mut self, p: &str) -> Result<(), StoreError> {
        self.log(format!("cd {}", p));
        let mut state = self.lock();
        state.require_connected()?;
        let target = state.resolve(p);
        if !state.is_dir(&target) {
            return Err(StoreError::NotFound(target));
        }
        state.cwd = target;
        Ok(())
    }

    fn pwd(&mut self) -> Result<String, StoreError> {
        self.log("pwd".into());
        let state = self.lock();
        state.require_connected()?;
        Ok(state.cwd.clone())
    }
}

pub fn config() -> ConnectConfig {
    ConnectConfig::sftp("h", "u", "p")
}

/// The `/a` tree: `/a/x` (10 bytes) and `/a/b/y` (5 bytes)
pub fn sample_tree() -> MemoryStore {
    MemoryStore::new()
        .dir("/a")
        .file("/a/x", b"0123456789")
        .dir("/a/b")
        .file("/a/b/y", b"hello")
}
