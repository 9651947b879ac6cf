//! Shared test utilities for integration tests.
//!
//! Provides [`ToyEngine`], an in-process engine that writes a tiny
//! checksummed container format through the real engine traits, so the
//! composition layer can be exercised end to end without a 7-Zip library.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use sevenlink::{
    ArchiveCreator, ArchiveFormat, Engine, EngineStatus, Error, InArchive, OperationResult,
    OutArchive, OutStream, OutputArchive, PropValue, PropertyId, ReadSeek, Result, Timestamp,
    UpdateCallbacks, UpdateItemInfo, UpdateMode,
};

const MAGIC: &[u8; 4] = b"TOY1";
const FLAG_ENCRYPTED: u8 = 0x01;

/// One item of a toy container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToyEntry {
    pub path: String,
    pub is_dir: bool,
    pub mtime: u64,
    pub data: Vec<u8>,
}

/// A parsed toy container.
#[derive(Debug, Clone, Default)]
pub struct ToyArchive {
    pub encrypted: bool,
    pub entries: Vec<ToyEntry>,
}

impl ToyArchive {
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn content(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.data.as_slice())
    }
}

/// Serializes a container.
pub fn encode(archive: &ToyArchive) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.push(if archive.encrypted { FLAG_ENCRYPTED } else { 0 });
    out.extend_from_slice(&(archive.entries.len() as u32).to_le_bytes());
    for entry in &archive.entries {
        out.extend_from_slice(&(entry.path.len() as u16).to_le_bytes());
        out.extend_from_slice(entry.path.as_bytes());
        out.push(entry.is_dir as u8);
        out.extend_from_slice(&entry.mtime.to_le_bytes());
        out.extend_from_slice(&(entry.data.len() as u64).to_le_bytes());
        out.extend_from_slice(&entry.data);
        out.extend_from_slice(&crc32fast::hash(&entry.data).to_le_bytes());
    }
    out
}

/// Parses a container, returning `None` if it is malformed or a checksum
/// does not match.
pub fn decode(bytes: &[u8]) -> Option<ToyArchive> {
    let mut reader = Reader { bytes, pos: 0 };
    if reader.take(4)? != MAGIC {
        return None;
    }
    let encrypted = reader.take(1)?[0] & FLAG_ENCRYPTED != 0;
    let count = u32::from_le_bytes(reader.take(4)?.try_into().ok()?);
    let mut entries = Vec::new();
    for _ in 0..count {
        let path_len = u16::from_le_bytes(reader.take(2)?.try_into().ok()?) as usize;
        let path = String::from_utf8(reader.take(path_len)?.to_vec()).ok()?;
        let is_dir = reader.take(1)?[0] != 0;
        let mtime = u64::from_le_bytes(reader.take(8)?.try_into().ok()?);
        let data_len = u64::from_le_bytes(reader.take(8)?.try_into().ok()?) as usize;
        let data = reader.take(data_len)?.to_vec();
        let crc = u32::from_le_bytes(reader.take(4)?.try_into().ok()?);
        if crc != crc32fast::hash(&data) {
            return None;
        }
        entries.push(ToyEntry {
            path,
            is_dir,
            mtime,
            data,
        });
    }
    if reader.pos != bytes.len() {
        return None;
    }
    Some(ToyArchive { encrypted, entries })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }
}

/// Everything the engine observed, for assertions.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub properties: Vec<(String, PropValue)>,
    pub password: Option<String>,
    pub infos: Vec<UpdateItemInfo>,
    /// Source indices copied without reading new data.
    pub copied: Vec<u32>,
    /// Paths of items whose stream was read.
    pub encoded: Vec<String>,
    pub totals: Vec<u64>,
    pub opened: u32,
    pub closed: u32,
}

#[derive(Debug, Clone, Default)]
struct ToyOptions {
    update_status: Option<EngineStatus>,
    properties_status: Option<EngineStatus>,
    strict: bool,
    bad_result: Option<(String, OperationResult)>,
}

/// An engine writing [`ToyArchive`] containers.
#[derive(Debug, Clone, Default)]
pub struct ToyEngine {
    log: Arc<Mutex<EngineLog>>,
    options: ToyOptions,
}

impl ToyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `update_items` returns `status` without doing anything.
    pub fn with_update_status(mut self, status: EngineStatus) -> Self {
        self.options.update_status = Some(status);
        self
    }

    /// `set_properties` returns `status`.
    pub fn with_properties_status(mut self, status: EngineStatus) -> Self {
        self.options.properties_status = Some(status);
        self
    }

    /// Abort with `E_FAIL` as soon as an item stream is unavailable.
    pub fn strict(mut self) -> Self {
        self.options.strict = true;
        self
    }

    /// Report `result` after reading the item stored at `path`.
    pub fn with_bad_result(mut self, path: &str, result: OperationResult) -> Self {
        self.options.bad_result = Some((path.to_string(), result));
        self
    }

    pub fn log(&self) -> MutexGuard<'_, EngineLog> {
        self.log.lock().unwrap()
    }

    pub fn reset_log(&self) {
        *self.log() = EngineLog::default();
    }

    fn out_archive(&self, source: Option<ToyArchive>) -> ToyOutArchive {
        ToyOutArchive {
            source,
            log: Arc::clone(&self.log),
            options: self.options.clone(),
        }
    }
}

impl Engine for ToyEngine {
    fn create_out_archive(&self, _format: &ArchiveFormat) -> Result<Box<dyn OutArchive>> {
        Ok(Box::new(self.out_archive(None)))
    }

    fn open_archive(
        &self,
        _format: &ArchiveFormat,
        mut stream: Box<dyn ReadSeek>,
    ) -> Result<Box<dyn InArchive>> {
        let mut bytes = Vec::new();
        stream.seek(SeekFrom::Start(0))?;
        stream.read_to_end(&mut bytes)?;
        let archive = decode(&bytes).ok_or(Error::OpenFailed {
            status: EngineStatus::FAIL,
        })?;
        self.log().opened += 1;
        Ok(Box::new(ToyInArchive {
            archive,
            engine: self.clone(),
            stream: Some(stream),
        }))
    }
}

struct ToyInArchive {
    archive: ToyArchive,
    engine: ToyEngine,
    stream: Option<Box<dyn ReadSeek>>,
}

impl InArchive for ToyInArchive {
    fn items_count(&self) -> u32 {
        self.archive.entries.len() as u32
    }

    fn item_property(&self, index: u32, prop: PropertyId) -> PropValue {
        let Some(entry) = self.archive.entries.get(index as usize) else {
            return PropValue::Empty;
        };
        match prop {
            PropertyId::Path => PropValue::from(entry.path.as_str()),
            PropertyId::Name => PropValue::from(entry.path.rsplit('/').next().unwrap_or("")),
            PropertyId::IsDir => PropValue::Bool(entry.is_dir),
            PropertyId::Size => PropValue::U64(entry.data.len() as u64),
            PropertyId::Crc => PropValue::U32(crc32fast::hash(&entry.data)),
            PropertyId::Encrypted => PropValue::Bool(self.archive.encrypted),
            PropertyId::MTime if entry.mtime != 0 => {
                PropValue::FileTime(Timestamp::from_filetime(entry.mtime))
            }
            _ => PropValue::Empty,
        }
    }

    fn archive_property(&self, prop: PropertyId) -> PropValue {
        match prop {
            PropertyId::Solid => PropValue::Bool(false),
            PropertyId::Encrypted => PropValue::Bool(self.archive.encrypted),
            _ => PropValue::Empty,
        }
    }

    fn updatable(&mut self) -> Result<Box<dyn OutArchive>> {
        Ok(Box::new(self.engine.out_archive(Some(self.archive.clone()))))
    }

    fn close(&mut self) -> Result<()> {
        self.stream = None;
        self.engine.log().closed += 1;
        Ok(())
    }
}

struct ToyOutArchive {
    source: Option<ToyArchive>,
    log: Arc<Mutex<EngineLog>>,
    options: ToyOptions,
}

impl ToyOutArchive {
    fn write(
        &mut self,
        out: &mut dyn OutStream,
        count: u32,
        callback: &mut dyn UpdateCallbacks,
    ) -> Result<EngineStatus> {
        let password = callback.crypto_get_text_password2()?;
        self.log.lock().unwrap().password = password.as_ref().map(|p| p.as_str().to_string());

        let mut total = 0u64;
        for index in 0..count {
            let info = callback.get_update_item_info(index)?;
            if info.new_data {
                total += callback.get_property(index, PropertyId::Size)?.as_u64().unwrap_or(0);
            }
        }
        callback.set_total(total)?;
        self.log.lock().unwrap().totals.push(total);

        let mut archive = ToyArchive {
            encrypted: password.is_some(),
            entries: Vec::new(),
        };
        let mut completed = 0u64;
        for index in 0..count {
            let info = callback.get_update_item_info(index)?;
            self.log.lock().unwrap().infos.push(info);

            if !info.new_data {
                let source = info
                    .index_in_archive
                    .and_then(|i| self.source.as_ref()?.entries.get(i as usize).cloned());
                let Some(entry) = source else {
                    return Ok(EngineStatus::InvalidArgument);
                };
                if let Some(i) = info.index_in_archive {
                    self.log.lock().unwrap().copied.push(i);
                }
                archive.entries.push(entry);
                continue;
            }

            let path = match callback.get_property(index, PropertyId::Path)? {
                PropValue::String(path) => path,
                _ => return Ok(EngineStatus::InvalidArgument),
            };
            let is_dir = callback
                .get_property(index, PropertyId::IsDir)?
                .as_bool()
                .unwrap_or(false);
            let mtime = callback
                .get_property(index, PropertyId::MTime)?
                .as_timestamp()
                .map_or(0, |t| t.as_filetime());

            let mut data = Vec::new();
            if !is_dir {
                match callback.get_stream(index) {
                    Ok(Some(mut stream)) => {
                        stream.read_to_end(&mut data)?;
                    }
                    Ok(None) => {}
                    Err(_) if self.options.strict => return Ok(EngineStatus::FAIL),
                    Err(_) => continue,
                }
                let result = match &self.options.bad_result {
                    Some((bad, result)) if *bad == path => *result,
                    _ => OperationResult::Ok,
                };
                callback.set_operation_result(result)?;
                self.log.lock().unwrap().encoded.push(path.clone());
            }

            completed += data.len() as u64;
            callback.set_completed(completed)?;
            archive.entries.push(ToyEntry {
                path,
                is_dir,
                mtime,
                data,
            });
        }

        let bytes = encode(&archive);
        out.seek(SeekFrom::Start(0))?;
        out.write_all(&bytes)?;
        callback.set_ratio_info(completed, bytes.len() as u64)?;
        Ok(EngineStatus::Ok)
    }
}

impl OutArchive for ToyOutArchive {
    fn set_properties(&mut self, props: &[(String, PropValue)]) -> EngineStatus {
        if let Some(status) = self.options.properties_status {
            return status;
        }
        self.log.lock().unwrap().properties = props.to_vec();
        EngineStatus::Ok
    }

    fn update_items(
        &mut self,
        out: &mut dyn OutStream,
        count: u32,
        callback: &mut dyn UpdateCallbacks,
    ) -> EngineStatus {
        if let Some(status) = self.options.update_status {
            return status;
        }
        self.write(out, count, callback)
            .unwrap_or(EngineStatus::FAIL)
    }
}

/// A 7z creator backed by `engine`.
pub fn creator(engine: &ToyEngine, mode: UpdateMode) -> ArchiveCreator {
    ArchiveCreator::new(Arc::new(engine.clone()), ArchiveFormat::SEVEN_ZIP).update_mode(mode)
}

/// Builds an archive from `(name, data)` pairs.
pub fn build_archive(engine: &ToyEngine, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let creator = creator(engine, UpdateMode::None);
    let mut output = OutputArchive::new(&creator);
    for (name, data) in entries {
        output.add_buffer(data.to_vec(), name).unwrap();
    }
    let mut buffer = Vec::new();
    output.compress_to_buffer(&mut buffer).unwrap();
    engine.reset_log();
    buffer
}

/// Writes an archive built from `(name, data)` pairs to `path`.
pub fn write_archive(engine: &ToyEngine, path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::write(path, build_archive(engine, entries)).unwrap();
}

/// Reads and parses the container at `path`.
pub fn read_archive(path: &Path) -> ToyArchive {
    decode(&std::fs::read(path).unwrap()).expect("valid toy archive")
}
