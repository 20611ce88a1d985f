use crate::{Document, codec, statics};
use anyhow::Context;
use flate2::{Compression, GzBuilder, read::GzDecoder};
use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xml,
    GzipXml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn newline(self) -> &'static str {
        match self {
            LineEnding::Lf => statics::NL_LF,
            LineEnding::CrLf => statics::NL_CRLF,
        }
    }
}

/// Represents a loaded sheet file, preserving its original bytes so that an
/// unmodified sheet saves back byte-for-byte.
#[derive(Debug)]
pub struct LoadedSheet {
    pub source_path: Option<PathBuf>,
    pub format: SheetFormat,
    pub line_ending: LineEnding,
    pub original_bytes: Vec<u8>,
    pub document: Document,
}

impl LoadedSheet {
    /// Wraps a document that has never been written anywhere.
    pub fn new(document: Document) -> Self {
        Self {
            source_path: None,
            format: SheetFormat::Xml,
            line_ending: LineEnding::Lf,
            original_bytes: Vec::new(),
            document,
        }
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let format = detect_format(path, &bytes);
        let text_bytes = match format {
            SheetFormat::Xml => bytes.clone(),
            SheetFormat::GzipXml => {
                let mut decoder = GzDecoder::new(&bytes[..]);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).context("gzip decompress")?;
                out
            }
        };

        let line_ending = detect_line_ending(&text_bytes);
        let document = codec::read_document(&text_bytes)
            .with_context(|| format!("parsing sheet {path:?}"))?;
        log::debug!("loaded {path:?} ({format:?}, {line_ending:?})");

        Ok(Self {
            source_path: Some(path.to_path_buf()),
            format,
            line_ending,
            original_bytes: bytes,
            document,
        })
    }

    pub fn is_modified(&self) -> bool {
        self.document.is_modified()
    }

    /// Recompute the modified flag by comparing the current serialized bytes to
    /// `original_bytes`, so that undoing every change reads as unmodified.
    pub fn refresh_modified(&mut self) {
        let Ok(current) = self.generate_bytes_for_format(self.format) else {
            self.document.set_modified(true);
            return;
        };
        self.document.set_modified(current != self.original_bytes);
    }

    /// Generate bytes for a format regardless of the current modified state.
    pub fn generate_bytes_for_format(&self, format: SheetFormat) -> anyhow::Result<Vec<u8>> {
        let text = codec::write_document(&self.document, self.line_ending.newline());
        let text_bytes = text.as_bytes();

        match format {
            SheetFormat::Xml => Ok(text_bytes.to_vec()),
            SheetFormat::GzipXml => {
                let mut encoder = GzBuilder::new()
                    .mtime(0)
                    .write(Vec::new(), Compression::default());
                encoder.write_all(text_bytes).context("gzip compress")?;
                let bytes = encoder.finish().context("gzip finish")?;
                Ok(bytes)
            }
        }
    }

    pub fn save_to_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let target_format = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            SheetFormat::GzipXml
        } else {
            SheetFormat::Xml
        };

        let bytes = self.save_bytes_for_format(target_format)?;
        fs::write(path, &bytes).with_context(|| format!("writing {path:?}"))?;
        log::debug!("saved {path:?} ({target_format:?})");

        self.source_path = Some(path.to_path_buf());
        self.format = target_format;
        self.original_bytes = bytes;
        self.document.mark_saved();
        Ok(())
    }

    pub fn save_bytes_for_format(&self, format: SheetFormat) -> anyhow::Result<Vec<u8>> {
        if !self.is_modified() && format == self.format && !self.original_bytes.is_empty() {
            return Ok(self.original_bytes.clone());
        }

        self.generate_bytes_for_format(format)
    }
}

fn detect_line_ending(text_bytes: &[u8]) -> LineEnding {
    // Count actual terminators; a stray CRLF inside a note must not flip the whole file.
    let mut lf_count = 0usize;
    let mut crlf_count = 0usize;

    for (i, b) in text_bytes.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        if i > 0 && text_bytes[i - 1] == b'\r' {
            crlf_count += 1;
        } else {
            lf_count += 1;
        }
    }

    if crlf_count > lf_count {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}

fn detect_format(path: &Path, bytes: &[u8]) -> SheetFormat {
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        return SheetFormat::GzipXml;
    }
    // Gzip magic: 1F 8B
    if bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B {
        return SheetFormat::GzipXml;
    }
    SheetFormat::Xml
}
