use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::trace;

/// Environment variable that forces a clipboard backend
pub const BACKEND_ENV: &str = "PWCLIP_CLIPBOARD";

/// Read and write access to the shared system clipboard
pub trait Clipboard: Send + Sync {
    /// Current clipboard contents
    fn read(&self) -> io::Result<Vec<u8>>;

    /// Replace the clipboard contents
    fn write(&self, data: &[u8]) -> io::Result<()>;
}

/// Clipboard reached through the platform's copy and paste tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClipboard {
    get: Vec<String>,
    set: Vec<String>,
}

impl CommandClipboard {
    /// `pbpaste` / `pbcopy`
    pub fn macos() -> Self {
        Self::new(&["pbpaste"], &["pbcopy"])
    }

    /// `wl-paste` / `wl-copy`
    pub fn wayland() -> Self {
        Self::new(&["wl-paste", "-n"], &["wl-copy"])
    }

    /// `xclip` on the CLIPBOARD selection
    pub fn xclip() -> Self {
        Self::new(
            &["xclip", "-selection", "clipboard", "-o"],
            &["xclip", "-selection", "clipboard", "-i"],
        )
    }

    /// Explicit read and write commands, program first
    pub fn new(get: &[&str], set: &[&str]) -> Self {
        Self {
            get: get.iter().map(|s| s.to_string()).collect(),
            set: set.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Tool pair registered under `name`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pbcopy" | "macos" => Some(Self::macos()),
            "wayland" | "wl-copy" => Some(Self::wayland()),
            "xclip" | "x11" => Some(Self::xclip()),
            _ => None,
        }
    }

    fn command(argv: &[String]) -> io::Result<Command> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty clipboard command"))?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd)
    }
}

impl Clipboard for CommandClipboard {
    fn read(&self) -> io::Result<Vec<u8>> {
        trace!(program = program(&self.get), "reading clipboard");
        let output = Self::command(&self.get)?
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            return Err(tool_failure(program(&self.get), output.status, &output.stderr));
        }
        Ok(output.stdout)
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        trace!(program = program(&self.set), bytes = data.len(), "writing clipboard");
        // xclip and wl-copy fork a selection owner that outlives the tool, so
        // no pipe may be left for it to inherit.
        let mut child = Self::command(&self.set)?
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(data) {
                drop(stdin);
                let _ = child.wait();
                return Err(e);
            }
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(tool_failure(program(&self.set), status, &[]));
        }
        Ok(())
    }
}

/// Clipboard kept in a plain file, for headless sessions and scripted use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClipboard {
    path: PathBuf,
}

impl FileClipboard {
    /// Clipboard stored at `path`; the file must exist before the first read
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Clipboard for FileClipboard {
    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        fs::write(&self.path, data)
    }
}

/// Pick a backend from [`BACKEND_ENV`], falling back to the platform default.
///
/// Besides the tool names accepted by [`CommandClipboard::from_name`], the
/// variable may hold `file:<path>` to select a [`FileClipboard`].
pub fn detect() -> io::Result<Box<dyn Clipboard>> {
    match env::var(BACKEND_ENV) {
        Ok(name) => from_name(&name),
        Err(_) if cfg!(target_os = "macos") => Ok(Box::new(CommandClipboard::macos())),
        Err(_) if env::var_os("WAYLAND_DISPLAY").is_some() && env::var_os("DISPLAY").is_none() => {
            Ok(Box::new(CommandClipboard::wayland()))
        }
        Err(_) => Ok(Box::new(CommandClipboard::xclip())),
    }
}

fn from_name(name: &str) -> io::Result<Box<dyn Clipboard>> {
    if let Some(path) = name.strip_prefix("file:").filter(|p| !p.is_empty()) {
        return Ok(Box::new(FileClipboard::new(path)));
    }
    match CommandClipboard::from_name(name) {
        Some(clipboard) => Ok(Box::new(clipboard)),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown clipboard backend {:?} in {}", name, BACKEND_ENV),
        )),
    }
}

/// In-process clipboard, used where no desktop session is available
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Vec<u8>>,
    writes: AtomicUsize,
}

impl MemoryClipboard {
    /// Clipboard that initially holds `initial`
    pub fn new(initial: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Mutex::new(initial.into()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Snapshot of what the clipboard holds right now
    pub fn contents(&self) -> Vec<u8> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self) -> io::Result<Vec<u8>> {
        let contents = self
            .contents
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "clipboard lock poisoned"))?;
        Ok(contents.clone())
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "clipboard lock poisoned"))?;
        contents.clear();
        contents.extend_from_slice(data);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn program(argv: &[String]) -> &str {
    argv.first().map(String::as_str).unwrap_or_default()
}

fn tool_failure(program: &str, status: std::process::ExitStatus, stderr: &[u8]) -> io::Error {
    let detail = String::from_utf8_lossy(stderr);
    let detail = detail.trim();
    if detail.is_empty() {
        io::Error::new(io::ErrorKind::Other, format!("{} exited with {}", program, status))
    } else {
        io::Error::new(
            io::ErrorKind::Other,
            format!("{} exited with {}: {}", program, status, detail),
        )
    }
}
