//! Turning office binaries into HTML exports.
//!
//! The pipeline only needs "given a document and a working directory, write
//! an HTML export there and tell me where it is". [`SofficeConverter`] does
//! that with a headless LibreOffice; tests and embedders can pass a closure.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

use crate::error::BoxError;

/// Produces an HTML export from an office document.
pub trait Converter {
    /// Write an HTML export of `source` into `workdir` and return its path.
    fn convert(&self, source: &Path, workdir: &Path) -> Result<PathBuf, BoxError>;
}

impl<F> Converter for F
where
    F: Fn(&Path, &Path) -> Result<PathBuf, BoxError>,
{
    fn convert(&self, source: &Path, workdir: &Path) -> Result<PathBuf, BoxError> {
        self(source, workdir)
    }
}

/// Errors from running LibreOffice.
#[derive(Error, Debug)]
pub enum SofficeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no HTML export for {} found in {}", document.display(), workdir.display())]
    NoOutput { document: PathBuf, workdir: PathBuf },
}

/// Headless LibreOffice (`soffice --headless --convert-to html`).
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find an installed LibreOffice: `soffice` or `libreoffice` on `PATH`,
    /// then the macOS application bundle.
    pub fn locate() -> Option<Self> {
        let on_path = std::env::var_os("PATH").and_then(|paths| {
            std::env::split_paths(&paths).find_map(|dir| {
                ["soffice", "libreoffice", "soffice.exe"]
                    .iter()
                    .map(|name| dir.join(name))
                    .find(|candidate| candidate.is_file())
            })
        });
        let bundle = Path::new("/Applications/LibreOffice.app/Contents/MacOS/soffice");
        on_path
            .or_else(|| bundle.is_file().then(|| bundle.to_path_buf()))
            .map(Self::new)
    }
}

impl Converter for SofficeConverter {
    fn convert(&self, source: &Path, workdir: &Path) -> Result<PathBuf, BoxError> {
        let program = self.program.display().to_string();
        fs::create_dir_all(workdir)?;

        log::info!("converting {} with {program}", source.display());
        let output = Command::new(&self.program)
            .args(["--headless", "--convert-to", "html", "--outdir"])
            .arg(workdir)
            .arg(source)
            .output()
            .map_err(|source| SofficeError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SofficeError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        find_export(source, workdir).ok_or_else(|| {
            SofficeError::NoOutput {
                document: source.to_path_buf(),
                workdir: workdir.to_path_buf(),
            }
            .into()
        })
    }
}

/// Locate the export a converter wrote: `<stem>.html`, `<stem>.htm`, then
/// the first `<stem>*.htm*` by name.
pub fn find_export(source: &Path, workdir: &Path) -> Option<PathBuf> {
    let stem = source.file_stem()?.to_string_lossy().into_owned();
    for ext in ["html", "htm"] {
        let candidate = workdir.join(format!("{stem}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let mut matches: Vec<PathBuf> = fs::read_dir(workdir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name_ok = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(&stem));
            let ext_ok = path
                .extension()
                .is_some_and(|e| e.to_string_lossy().to_ascii_lowercase().starts_with("htm"));
            name_ok && ext_ok && path.is_file()
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}
