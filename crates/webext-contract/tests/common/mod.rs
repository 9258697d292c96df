//! Multi-file fixtures on disk.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use webext_contract::{FsImportResolver, SynthesizeOptions, WrapperConfig};

pub const WRAPPER_PACKAGE: &str = "@webext-core/proxy-service";

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn with(self, relative: &str, source: &str) -> Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, source).expect("write fixture file");
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn synthesize(&self, entry: &str, options: &SynthesizeOptions) -> Option<String> {
        webext_contract::synthesize(self.path(entry), options, &FsImportResolver::new())
            .expect("entry file should load")
    }

    pub fn contract(&self, entry: &str) -> Option<String> {
        self.synthesize(entry, &SynthesizeOptions::default())
    }
}

pub fn wrapped() -> SynthesizeOptions {
    SynthesizeOptions::default().with_wrappers(WrapperConfig::new(
        ["defineProxyService", "defineService"],
        WRAPPER_PACKAGE,
    ))
}

/// Shared buffer the test subscriber formats events into.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber and returns the formatted
/// warnings and errors it emitted.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}
