//! Input locations for bulk commands.
//!
//! A location is a file, a directory (every non-directory entry is read, in
//! listing order), a `file://` URL or `-` for stdin.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::decoder::{Decoder, Format, KindDecoder};
use crate::scheme::Scheme;
use crate::{Error, Result};

/// One readable input.
pub struct Source {
    name: String,
    extension: Option<String>,
    reader: Box<dyn Read>,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

impl Source {
    /// Wrap an arbitrary reader.
    pub fn new(name: impl Into<String>, extension: Option<&str>, reader: Box<dyn Read>) -> Self {
        Self {
            name: name.into(),
            extension: extension.map(str::to_string),
            reader,
        }
    }

    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::SourceIo {
            location: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(
            path.display().to_string(),
            path.extension().and_then(|ext| ext.to_str()),
            Box::new(BufReader::new(file)),
        ))
    }

    fn stdin() -> Self {
        Self::new("-", None, Box::new(io::stdin()))
    }

    /// Display name: the path, or `-` for stdin.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Document format selected by the extension, if it names one.
    pub fn format(&self) -> Option<Format> {
        Format::from_extension(self.extension())
    }

    /// Consume the source into a document decoder.
    ///
    /// Without a known extension the format is detected from the content.
    pub fn into_decoder(self) -> Decoder<Box<dyn Read>> {
        match self.format() {
            Some(format) => Decoder::new(self.reader, format),
            None => Decoder::detect(self.reader),
        }
    }

    /// Consume the source into a stream of typed objects.
    pub fn objects(self, scheme: &Scheme) -> KindDecoder<'_, Box<dyn Read>> {
        KindDecoder::new(self.into_decoder(), scheme)
    }
}

/// Single-pass iterator over the sources named by a list of locations.
#[derive(Debug, Default)]
pub struct Sources {
    locations: VecDeque<String>,
    pending: VecDeque<PathBuf>,
    exhausted: bool,
}

impl Sources {
    /// Create an iterator over `locations`, in order.
    pub fn new<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locations: locations.into_iter().map(Into::into).collect(),
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Open the next source.
    ///
    /// Returns `None` once after the last source; calling again is an error.
    pub fn next_source(&mut self) -> Result<Option<Source>> {
        if self.exhausted {
            return Err(Error::SourcesExhausted);
        }

        loop {
            if let Some(path) = self.pending.pop_front() {
                return Source::open(&path).map(Some);
            }

            let Some(location) = self.locations.pop_front() else {
                self.exhausted = true;
                return Ok(None);
            };
            if location == "-" {
                return Ok(Some(Source::stdin()));
            }

            let path = location_path(&location)?;
            let metadata = fs::metadata(&path).map_err(|source| Error::SourceIo {
                location: location.clone(),
                source,
            })?;
            if !metadata.is_dir() {
                return Source::open(&path).map(Some);
            }

            self.expand_dir(&path).map_err(|source| Error::SourceIo {
                location: location.clone(),
                source,
            })?;
            debug!(dir = %location, files = self.pending.len(), "expanded directory");
        }
    }

    fn expand_dir(&mut self, dir: &Path) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !fs::metadata(&path)?.is_dir() {
                self.pending.push_back(path);
            }
        }
        Ok(())
    }
}

fn location_path(location: &str) -> Result<PathBuf> {
    if let Some(path) = location.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if location.contains("://") {
        return Err(Error::UnsupportedSource {
            location: location.to_string(),
        });
    }
    Ok(PathBuf::from(location))
}
