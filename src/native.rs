//! Hands generated C to an external compiler, then runs the result.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

/// How to invoke the system's C compiler.
#[derive(Debug, Clone)]
pub struct NativeBuild {
    /// Compiler executable, e.g. `cc` or `gcc`.
    pub cc: String,
    /// Optimization flag passed straight through, e.g. `-O1`.
    pub opt_level: String,
    /// Directory for the `.c` file and the executable.
    pub work_dir: PathBuf,
}

impl NativeBuild {
    /// Writes `c_source` to disk and compiles it. Returns the path of the executable.
    pub fn compile(&self, c_source: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.work_dir)
            .with_context(|| format!("could not create {}", self.work_dir.display()))?;

        let c_file = self.work_dir.join("program.c");
        let binary = self.work_dir.join("program");
        std::fs::write(&c_file, c_source)
            .with_context(|| format!("could not write {}", c_file.display()))?;

        let start = Instant::now();
        let status = Command::new(&self.cc)
            .arg(&c_file)
            .arg(&self.opt_level)
            .arg("-o")
            .arg(&binary)
            .status()
            .with_context(|| format!("could not start C compiler `{}`", self.cc))?;
        info!(elapsed = ?start.elapsed(), cc = %self.cc, "compiled C");

        if !status.success() {
            bail!("C compiler `{}` failed ({})", self.cc, status);
        }
        Ok(binary)
    }

    /// Runs a compiled program with this process's stdin and stdout.
    pub fn run(&self, binary: &Path) -> Result<ExitStatus> {
        debug!(binary = %binary.display(), "running native program");
        let start = Instant::now();
        let status = Command::new(binary)
            .status()
            .with_context(|| format!("could not run {}", binary.display()))?;
        info!(elapsed = ?start.elapsed(), "native program finished");
        Ok(status)
    }

    /// Removes the work directory and everything in it. Failure is only logged.
    pub fn clean_up(&self) {
        match std::fs::remove_dir_all(&self.work_dir) {
            Ok(()) => debug!(dir = %self.work_dir.display(), "removed work directory"),
            Err(e) => warn!(dir = %self.work_dir.display(), error = %e, "could not remove work directory"),
        }
    }
}
