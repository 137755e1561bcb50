//! Shared fixtures for connector specs.
//!
//! A `Connector` owns a temp directory holding a config file, a JSON lines
//! feed, the archive root, the log file and the lock file.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::OnceLock;

use similar_asserts::assert_eq;
use tempfile::TempDir;

/// Container used by every fixture
pub const CONTAINER: &str = "orders";

pub struct Connector {
    dir: TempDir,
    stdin_feed: bool,
    supervisor: String,
    extra: String,
}

impl Connector {
    /// Connector reading `feed.jsonl`, with restarts disabled
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            stdin_feed: false,
            supervisor: "restart = \"never\"".to_string(),
            extra: String::new(),
        }
    }

    /// Read the feed from stdin instead of `feed.jsonl`
    pub fn from_stdin(mut self) -> Self {
        self.stdin_feed = true;
        self
    }

    /// Replace the `[supervisor]` table body
    pub fn with_supervisor(mut self, body: &str) -> Self {
        self.supervisor = body.to_string();
        self
    }

    /// Append raw TOML to the generated config
    pub fn with_config(mut self, extra: &str) -> Self {
        self.extra.push_str(extra);
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("changetail.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.path().join("ctd.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.path().join("ctd.lock")
    }

    /// Write the feed file, one change per line
    pub fn feed(&self, lines: &[&str]) -> &Self {
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(self.path().join("feed.jsonl"), content).unwrap();
        self
    }

    /// Write `changetail.toml` for the current settings
    pub fn write_config(&self) {
        let source = if self.stdin_feed {
            "\"stdin\"".to_string()
        } else {
            format!("{{ path = \"{}\" }}", self.path().join("feed.jsonl").display())
        };
        let config = format!(
            r#"
[feed]
collection = "orders"
source = {source}

[archive]
root = "{root}"
container = "{container}"

[supervisor]
{supervisor}

[daemon]
log_path = "{log}"
lock_path = "{lock}"
{extra}
"#,
            root = self.path().join("archive").display(),
            container = CONTAINER,
            log = self.log_path().display(),
            lock = self.lock_path().display(),
            supervisor = self.supervisor,
            extra = self.extra,
        );
        std::fs::write(self.config_path(), config).unwrap();
    }

    /// `ctd <config>` with a fresh config file
    pub fn ctd(&self) -> Run {
        self.write_config();
        let mut cmd = ctd();
        cmd.arg(self.config_path())
            .env_remove("CHANGETAIL_CONFIG")
            .env_remove("RUST_LOG");
        Run { cmd }
    }

    /// Contents of every archived object, sorted by key
    pub fn archived(&self) -> Vec<(String, String)> {
        let container = self.path().join("archive").join(CONTAINER);
        let Ok(entries) = std::fs::read_dir(container) else {
            return Vec::new();
        };
        let mut objects: Vec<(String, String)> = entries
            .map(|entry| {
                let path = entry.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, std::fs::read_to_string(&path).unwrap())
            })
            .collect();
        objects.sort();
        objects
    }

    pub fn log(&self) -> String {
        std::fs::read_to_string(self.log_path()).unwrap_or_default()
    }
}

/// The daemon binary
pub fn ctd() -> assert_cmd::Command {
    assert_cmd::Command::new(ctd_path())
}

/// Path to `ctd`, building it first when the test target ran on its own
fn ctd_path() -> &'static Path {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let path = assert_cmd::cargo::cargo_bin("ctd");
        if !path.exists() {
            let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
            let status = std::process::Command::new(cargo)
                .args(["build", "-p", "ct-daemon", "--bin", "ctd"])
                .current_dir(env!("CARGO_MANIFEST_DIR"))
                .status()
                .unwrap();
            assert!(status.success(), "building ctd failed: {:?}", status);
        }
        path
    })
}

pub struct Run {
    cmd: assert_cmd::Command,
}

impl Run {
    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    /// Run and expect a non-zero exit status
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.timeout(TIMEOUT).output().unwrap();
        assert!(!output.status.success(), "expected failure: {}", describe(&output));
        RunAssert { output }
    }
}

const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

fn describe(output: &Output) -> String {
    format!(
        "status {:?}\nstdout:\n{}\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn code(self, expected: i32) -> Self {
        assert_eq!(self.output.status.code(), Some(expected));
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr);
        assert!(stderr.contains(needle), "stderr missing {:?}:\n{}", needle, stderr);
        self
    }
}
