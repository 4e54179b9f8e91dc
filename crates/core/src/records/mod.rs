//! Decoded x64dbg annotation database.
//!
//! The debugger stores its per-module database as an lz4-compressed JSON
//! document. Decompression happens elsewhere; this module takes the plain JSON
//! and turns it into typed record collections:
//! - `comments`:  `{module, address, text}`
//! - `labels`:    `{address, text}` (optionally `module`)
//! - `bookmarks`: `{module, address}`
//! - `functions`: `{start, end}` (optionally `module`)
//!
//! Any section may be missing and is then treated as empty. Every address is
//! decoded up front, so a bad document is rejected before the importer touches
//! the target program.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{parse_hex, Rva};

/// The document could not be decoded as an annotation database.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Malformed database document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read database document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid {field} '{value}' in {section} record #{index}")]
    InvalidAddress { section: Section, index: usize, field: &'static str, value: String },
}

/// Named top-level collections of the database document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Comments,
    Labels,
    Bookmarks,
    Functions,
}

impl Section {
    pub const ALL: [Section; 4] =
        [Section::Comments, Section::Labels, Section::Bookmarks, Section::Functions];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Comments => "comments",
            Section::Labels => "labels",
            Section::Bookmarks => "bookmarks",
            Section::Functions => "functions",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Section::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// End-of-line comment attached to a module offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub module: String,
    pub address: Rva,
    pub text: String,
}

/// Bare location marker; the debugger keeps no label or note with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkRecord {
    pub module: String,
    pub address: Rva,
}

/// Named location that is not (necessarily) a function entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelRecord {
    pub module: Option<String>,
    pub address: Rva,
    pub text: String,
}

/// Contiguous function range. Only `start` is used for naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub module: Option<String>,
    pub start: Rva,
    pub end: Rva,
}

/// Borrowed view of one section's records.
#[derive(Debug, Clone, Copy)]
pub enum SectionRecords<'a> {
    Comments(&'a [CommentRecord]),
    Labels(&'a [LabelRecord]),
    Bookmarks(&'a [BookmarkRecord]),
    Functions(&'a [FunctionRecord]),
}

impl SectionRecords<'_> {
    pub fn len(&self) -> usize {
        match self {
            SectionRecords::Comments(r) => r.len(),
            SectionRecords::Labels(r) => r.len(),
            SectionRecords::Bookmarks(r) => r.len(),
            SectionRecords::Functions(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    #[serde(default)]
    comments: Vec<RawComment>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    bookmarks: Vec<RawBookmark>,
    #[serde(default)]
    functions: Vec<RawFunction>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    module: String,
    address: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    #[serde(default)]
    module: Option<String>,
    address: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawBookmark {
    module: String,
    address: String,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    #[serde(default)]
    module: Option<String>,
    start: String,
    end: String,
}

fn decode_rva(
    section: Section,
    index: usize,
    field: &'static str,
    value: &str,
) -> Result<Rva, FormatError> {
    parse_hex(value).map(Rva).ok_or_else(|| FormatError::InvalidAddress {
        section,
        index,
        field,
        value: value.to_string(),
    })
}

impl std::str::FromStr for RecordStore {
    type Err = FormatError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_slice(text.as_bytes())
    }
}

/// Read-only, fully decoded annotation database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    comments: Vec<CommentRecord>,
    labels: Vec<LabelRecord>,
    bookmarks: Vec<BookmarkRecord>,
    functions: Vec<FunctionRecord>,
}

impl RecordStore {
    /// Decode a JSON document held in memory.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FormatError> {
        let raw: RawDatabase = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FormatError> {
        let raw: RawDatabase = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    /// Read and decode a database file from disk.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
    }

    fn from_raw(raw: RawDatabase) -> Result<Self, FormatError> {
        let comments = raw
            .comments
            .into_iter()
            .enumerate()
            .map(|(idx, c)| {
                Ok(CommentRecord {
                    address: decode_rva(Section::Comments, idx, "address", &c.address)?,
                    module: c.module,
                    text: c.text,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        let labels = raw
            .labels
            .into_iter()
            .enumerate()
            .map(|(idx, l)| {
                Ok(LabelRecord {
                    address: decode_rva(Section::Labels, idx, "address", &l.address)?,
                    module: l.module,
                    text: l.text,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        let bookmarks = raw
            .bookmarks
            .into_iter()
            .enumerate()
            .map(|(idx, b)| {
                Ok(BookmarkRecord {
                    address: decode_rva(Section::Bookmarks, idx, "address", &b.address)?,
                    module: b.module,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        let functions = raw
            .functions
            .into_iter()
            .enumerate()
            .map(|(idx, f)| {
                Ok(FunctionRecord {
                    start: decode_rva(Section::Functions, idx, "start", &f.start)?,
                    end: decode_rva(Section::Functions, idx, "end", &f.end)?,
                    module: f.module,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;

        Ok(Self { comments, labels, bookmarks, functions })
    }

    /// Records for `section`; empty when the document had no such key.
    pub fn get(&self, section: Section) -> SectionRecords<'_> {
        match section {
            Section::Comments => SectionRecords::Comments(&self.comments),
            Section::Labels => SectionRecords::Labels(&self.labels),
            Section::Bookmarks => SectionRecords::Bookmarks(&self.bookmarks),
            Section::Functions => SectionRecords::Functions(&self.functions),
        }
    }

    /// Look up a section by its wire name. Unknown names yield `None`.
    pub fn get_named(&self, name: &str) -> Option<SectionRecords<'_>> {
        Section::parse(name).map(|s| self.get(s))
    }

    pub fn len(&self, section: Section) -> usize {
        self.get(section).len()
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn labels(&self) -> &[LabelRecord] {
        &self.labels
    }

    pub fn bookmarks(&self) -> &[BookmarkRecord] {
        &self.bookmarks
    }

    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }
}
