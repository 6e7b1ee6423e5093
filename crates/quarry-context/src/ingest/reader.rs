//! Document discovery and block-wise text reading.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str;

use glob::{Pattern, glob};
use quarry_core::{Error, Result};

/// Kind of document found in the documents directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Plain UTF-8 text
    Text,
    /// PDF; text extraction is not supported
    Pdf,
}

impl DocumentKind {
    /// Glob extension for the kind.
    const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
        }
    }
}

/// Document found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full path
    pub path: PathBuf,
    /// Kind by extension
    pub kind: DocumentKind,
}

impl Document {
    /// Source id recorded on passages: the file name.
    pub fn source(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// Find `*.pdf` and `*.txt` files directly inside `directory`, sorted by path.
///
/// # Errors
/// Returns an error if the directory path cannot form a glob pattern
pub fn discover_documents(directory: &Path) -> Result<Vec<Document>> {
    let escaped = Pattern::escape(&directory.to_string_lossy());
    let mut documents = Vec::default();

    for kind in [DocumentKind::Pdf, DocumentKind::Text] {
        let pattern = format!("{escaped}/*.{}", kind.extension());
        let paths = glob(&pattern)
            .map_err(|error| Error::Other(format!("Invalid document pattern {pattern}: {error}")))?;
        for entry in paths {
            if let Ok(path) = entry
                && path.is_file()
            {
                documents.push(Document { path, kind });
            }
        }
    }

    documents.sort_by(|first, second| first.path.cmp(&second.path));
    Ok(documents)
}

/// Iterator of UTF-8 text fragments read in fixed-size byte blocks.
///
/// A multi-byte character split across blocks is carried into the next
/// fragment; invalid bytes become U+FFFD.
pub struct TextFragments<R: Read> {
    reader: R,
    block: Vec<u8>,
    pending: Vec<u8>,
    finished: bool,
}

impl<R: Read> TextFragments<R> {
    /// Read `reader` in blocks of `block_bytes` (at least one byte).
    pub fn new(reader: R, block_bytes: usize) -> Self {
        Self {
            reader,
            block: vec![0; block_bytes.max(1)],
            pending: Vec::default(),
            finished: false,
        }
    }

    fn read_block(&mut self) -> io::Result<usize> {
        loop {
            match self.reader.read(&mut self.block) {
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                result => return result,
            }
        }
    }
}

/// Decode the complete prefix of `pending`, leaving an incomplete trailing
/// sequence in place unless `at_eof`.
fn decode_pending(pending: &mut Vec<u8>, at_eof: bool) -> String {
    let mut decoded = String::with_capacity(pending.len());
    let mut consumed = 0;

    loop {
        match str::from_utf8(&pending[consumed..]) {
            Ok(valid) => {
                decoded.push_str(valid);
                consumed = pending.len();
                break;
            }
            Err(error) => {
                let valid_end = consumed + error.valid_up_to();
                decoded.push_str(&String::from_utf8_lossy(&pending[consumed..valid_end]));
                match error.error_len() {
                    Some(invalid) => {
                        decoded.push(char::REPLACEMENT_CHARACTER);
                        consumed = valid_end + invalid;
                    }
                    None if at_eof => {
                        decoded.push(char::REPLACEMENT_CHARACTER);
                        consumed = pending.len();
                        break;
                    }
                    None => {
                        consumed = valid_end;
                        break;
                    }
                }
            }
        }
    }

    pending.drain(..consumed);
    decoded
}

impl<R: Read> Iterator for TextFragments<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let read = match self.read_block() {
                Ok(read) => read,
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            };

            let at_eof = read == 0;
            self.finished = at_eof;
            self.pending.extend_from_slice(&self.block[..read]);
            let fragment = decode_pending(&mut self.pending, at_eof);
            if !fragment.is_empty() {
                return Some(Ok(fragment));
            }
        }
        None
    }
}
