use anyhow::Context;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Opens a text input, transparently decompressing `.gz` files.
///
/// `stdin` (or `-`) reads from the standard input.
///
/// ```
/// use std::io::BufRead;
/// let reader = hicgraph::reader("tests/build/pairs.psl").unwrap();
/// assert!(reader.lines().count() > 5);
///
/// assert!(hicgraph::reader("tests/build/not_there.psl").is_err());
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" || input == "-" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// An output file that only appears at its final path after [`StagedFile::commit`].
///
/// Content goes to a temporary sibling of the destination. Dropping the value
/// without committing removes the temporary file and leaves the destination untouched.
pub struct StagedFile {
    path: PathBuf,
    inner: BufWriter<tempfile::NamedTempFile>,
}

impl StagedFile {
    pub fn create(output: &str) -> anyhow::Result<Self> {
        let path = PathBuf::from(output);
        if path.is_dir() {
            anyhow::bail!("could not create output {}: is a directory", path.display());
        }
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("could not create output {}", path.display()))?;

        Ok(Self {
            path,
            inner: BufWriter::new(tmp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the content and moves it to the destination path.
    pub fn commit(self) -> anyhow::Result<()> {
        let path = self.path;
        let tmp = self
            .inner
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("could not write {}", path.display()))?;
        tmp.persist(&path)
            .map_err(|e| e.error)
            .with_context(|| format!("could not write {}", path.display()))?;

        Ok(())
    }

    /// Commits every file, or none of them.
    ///
    /// When a commit fails, destinations already written by this call are removed again.
    pub fn commit_all(files: Vec<StagedFile>) -> anyhow::Result<()> {
        let mut done: Vec<PathBuf> = vec![];
        for file in files {
            let path = file.path.clone();
            log::info!("==> Writing {}", path.display());
            if let Err(e) = file.commit() {
                for p in &done {
                    if let Err(rm) = std::fs::remove_file(p) {
                        log::warn!("could not remove {}: {}", p.display(), rm);
                    }
                }
                return Err(e);
            }
            done.push(path);
        }

        Ok(())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
