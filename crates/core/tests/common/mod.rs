//! Shared fixtures: an in-memory object store and deterministic test hooks

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use s3u_core::hooks::{FilterRule, HookOptions};
use s3u_core::multipart::Chunk;
use s3u_core::{
    CompletedPart, Direction, Error, Hook, HookContext, HookOutcome, HookRegistry,
    MultipartSession, ObjectStore, ProgressSink, RemotePath, Result, TransferMonitor,
};

#[derive(Default)]
struct State {
    buckets: HashSet<String>,
    objects: HashMap<(String, String), Vec<u8>>,
    uploads: HashMap<String, BTreeMap<u32, Vec<u8>>>,
    next_upload: u32,
    calls: Vec<String>,
    fail_part: Option<u32>,
    fail_complete: bool,
    fail_get: bool,
    deny_access: bool,
}

/// Object store backed by a hash map, recording every call
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().buckets.insert(bucket.to_string());
        store
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .objects
            .keys()
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn open_uploads(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    pub fn fail_part(&self, part_number: u32) {
        self.state.lock().unwrap().fail_part = Some(part_number);
    }

    pub fn fail_complete(&self) {
        self.state.lock().unwrap().fail_complete = true;
    }

    /// Downloads write part of the body, then fail
    pub fn fail_get(&self) {
        self.state.lock().unwrap().fail_get = true;
    }

    pub fn deny_access(&self) {
        self.state.lock().unwrap().deny_access = true;
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn read_range(local: &Path, offset: u64, length: u64) -> Result<Vec<u8>> {
    let mut file = std::fs::File::open(local)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut data = Vec::with_capacity(length as usize);
    file.take(length).read_to_end(&mut data)?;
    Ok(data)
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.record(format!("bucket_exists:{bucket}"));
        let state = self.state.lock().unwrap();
        if state.deny_access {
            return Err(Error::Auth("access denied".to_string()));
        }
        Ok(state.buckets.contains(bucket))
    }

    async fn object_exists(&self, path: &RemotePath) -> Result<bool> {
        self.record(format!("object_exists:{}", path.key));
        Ok(self.object(&path.bucket, &path.key).is_some())
    }

    async fn get_to_file(
        &self,
        path: &RemotePath,
        local: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        self.record(format!("get:{}", path.key));
        let data = self
            .object(&path.bucket, &path.key)
            .ok_or_else(|| Error::NotFound(path.key.clone()))?;
        if self.state.lock().unwrap().fail_get {
            std::fs::write(local, &data[..data.len() / 2])?;
            return Err(Error::Network("connection reset".to_string()));
        }
        std::fs::write(local, &data)?;
        let size = data.len() as u64;
        progress.update(size, size);
        Ok(size)
    }

    async fn put_from_file(
        &self,
        path: &RemotePath,
        local: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        self.record(format!("put:{}", path.key));
        let data = std::fs::read(local)?;
        let size = data.len() as u64;
        progress.update(0, size);
        self.insert(&path.bucket, &path.key, &data);
        progress.update(size, size);
        Ok(())
    }

    async fn create_multipart_upload(&self, path: &RemotePath) -> Result<MultipartSession> {
        self.record(format!("create:{}", path.key));
        let mut state = self.state.lock().unwrap();
        state.next_upload += 1;
        let upload_id = format!("upload-{}", state.next_upload);
        state.uploads.insert(upload_id.clone(), BTreeMap::new());
        Ok(MultipartSession {
            path: path.clone(),
            upload_id,
        })
    }

    async fn upload_part(
        &self,
        session: &MultipartSession,
        local: &Path,
        chunk: &Chunk,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedPart> {
        self.record(format!("part:{}", chunk.part_number));
        if self.state.lock().unwrap().fail_part == Some(chunk.part_number) {
            return Err(Error::Network("connection reset".to_string()));
        }
        let data = read_range(local, chunk.offset, chunk.length)?;
        progress.update(data.len() as u64, chunk.length);
        let mut state = self.state.lock().unwrap();
        let parts = state
            .uploads
            .get_mut(&session.upload_id)
            .ok_or_else(|| Error::NotFound(session.upload_id.clone()))?;
        parts.insert(chunk.part_number, data);
        Ok(CompletedPart {
            part_number: chunk.part_number,
            etag: Some(format!("etag-{}", chunk.part_number)),
        })
    }

    async fn complete_multipart_upload(
        &self,
        session: &MultipartSession,
        parts: Vec<CompletedPart>,
    ) -> Result<()> {
        self.record(format!("complete:{}", session.path.key));
        let mut state = self.state.lock().unwrap();
        if state.fail_complete {
            return Err(Error::General("InvalidPart".to_string()));
        }
        let uploaded = state
            .uploads
            .remove(&session.upload_id)
            .ok_or_else(|| Error::NotFound(session.upload_id.clone()))?;
        let mut data = Vec::new();
        for part in parts {
            let bytes = uploaded
                .get(&part.part_number)
                .ok_or_else(|| Error::General(format!("missing part {}", part.part_number)))?;
            data.extend_from_slice(bytes);
        }
        state
            .objects
            .insert((session.path.bucket.clone(), session.path.key.clone()), data);
        Ok(())
    }

    async fn abort_multipart_upload(&self, session: &MultipartSession) -> Result<()> {
        self.record(format!("abort:{}", session.path.key));
        self.state.lock().unwrap().uploads.remove(&session.upload_id);
        Ok(())
    }
}

/// Progress events, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Update(u64, u64),
    Rearm,
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn update(&self, bytes_transmitted: u64, bytes_total: u64) {
        self.events
            .lock()
            .unwrap()
            .push(ProgressEvent::Update(bytes_transmitted, bytes_total));
    }

    fn rearm(&self) {
        self.events.lock().unwrap().push(ProgressEvent::Rearm);
    }
}

/// Records `begin` and `finish` calls as `"<direction> <source> -> <destination>"`
#[derive(Default)]
pub struct RecordingMonitor {
    log: std::sync::Arc<Mutex<Vec<String>>>,
}

impl RecordingMonitor {
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

struct MonitoredSink {
    label: String,
    log: std::sync::Arc<Mutex<Vec<String>>>,
}

impl ProgressSink for MonitoredSink {
    fn update(&self, _bytes_transmitted: u64, _bytes_total: u64) {}

    fn finish(&self) {
        self.log.lock().unwrap().push(format!("finished {}", self.label));
    }
}

impl TransferMonitor for RecordingMonitor {
    fn begin(
        &self,
        direction: Direction,
        source: &str,
        destination: &str,
    ) -> Box<dyn ProgressSink> {
        let label = format!("{direction} {source} -> {destination}");
        self.log.lock().unwrap().push(label.clone());
        Box::new(MonitoredSink {
            label,
            log: self.log.clone(),
        })
    }
}

/// Writes an upper-cased copy to `<path>.up` and leaves the original alone
struct UpperHook {
    filter: Option<FilterRule>,
}

/// Renames the working file to `<path>.mv`
struct MoveHook {
    filter: Option<FilterRule>,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut target = path.as_os_str().to_owned();
    target.push(suffix);
    PathBuf::from(target)
}

#[async_trait]
impl Hook for UpperHook {
    fn filter(&self) -> Option<&FilterRule> {
        self.filter.as_ref()
    }

    fn dry_run(&self, ctx: &HookContext) -> Result<HookOutcome> {
        Ok(HookOutcome {
            key: format!("{}.up", ctx.key),
            path: Some(with_suffix(&ctx.path, ".up")),
            modified: false,
        })
    }

    async fn call(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let outcome = self.dry_run(ctx)?;
        let data = std::fs::read(&ctx.path)?;
        std::fs::write(with_suffix(&ctx.path, ".up"), data.to_ascii_uppercase())?;
        Ok(outcome)
    }
}

#[async_trait]
impl Hook for MoveHook {
    fn filter(&self) -> Option<&FilterRule> {
        self.filter.as_ref()
    }

    fn dry_run(&self, ctx: &HookContext) -> Result<HookOutcome> {
        Ok(HookOutcome {
            key: format!("{}.mv", ctx.key),
            path: Some(with_suffix(&ctx.path, ".mv")),
            modified: true,
        })
    }

    async fn call(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let outcome = self.dry_run(ctx)?;
        std::fs::rename(&ctx.path, with_suffix(&ctx.path, ".mv"))?;
        Ok(outcome)
    }
}

fn filter_option(options: &HookOptions) -> Result<Option<FilterRule>> {
    options
        .get("filter")
        .and_then(|v| v.as_str())
        .map(FilterRule::build)
        .transpose()
}

/// Built-in hooks plus `upper` and `move`
pub fn test_registry() -> HookRegistry {
    let mut registry = HookRegistry::with_builtin_hooks();
    registry.register("upper", |options: &HookOptions| {
        Ok(Box::new(UpperHook {
            filter: filter_option(options)?,
        }) as Box<dyn Hook>)
    });
    registry.register("move", |options: &HookOptions| {
        Ok(Box::new(MoveHook {
            filter: filter_option(options)?,
        }) as Box<dyn Hook>)
    });
    registry
}
