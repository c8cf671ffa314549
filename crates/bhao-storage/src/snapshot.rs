//! Collection files: one zstd-compressed JSON-lines file per collection,
//! `<database dir>/<collection>.jsonl.zst`.

use bhao_core::Document;
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

pub const COLLECTION_EXT: &str = ".jsonl.zst";

pub fn collection_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{}{}", collection, COLLECTION_EXT))
}

/// Collection names and file paths found in `dir`, sorted by name.
pub fn list_collection_files(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(coll) = name.strip_suffix(COLLECTION_EXT) {
            if !coll.is_empty() {
                out.push((coll.to_string(), path));
            }
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

pub struct CollectionWriter {
    enc: zstd::Encoder<'static, File>,
    tmp: PathBuf,
    pub path: PathBuf,
    pub written: usize,
}

impl CollectionWriter {
    /// Writes go to a sibling temp file; [`finish`](Self::finish) renames it into place.
    pub fn create(path: PathBuf) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("zst.tmp");
        let out = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        let enc = zstd::Encoder::new(out, 3)?;
        Ok(Self {
            enc,
            tmp,
            path,
            written: 0,
        })
    }

    pub fn write_doc(&mut self, doc: &Document) -> std::io::Result<()> {
        let s = serde_json::to_string(doc)?;
        self.enc.write_all(s.as_bytes())?;
        self.enc.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn finish(self) -> std::io::Result<usize> {
        let mut f = self.enc.finish()?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&self.tmp, &self.path)?;
        Ok(self.written)
    }
}

pub fn write_collection(path: PathBuf, docs: &[Document]) -> std::io::Result<usize> {
    let mut w = CollectionWriter::create(path)?;
    for d in docs {
        w.write_doc(d)?;
    }
    w.finish()
}

/// Documents read from a collection file, plus the number of lines that
/// did not parse.
#[derive(Debug, Default)]
pub struct LoadedCollection {
    pub docs: Vec<Document>,
    pub skipped: usize,
}

/// Reads every document in a collection file. Lines that do not parse are
/// skipped with a warning and counted.
pub fn read_collection(path: &Path) -> std::io::Result<LoadedCollection> {
    let fh = File::open(path)?;
    let dec = zstd::Decoder::new(fh)?;
    let br = BufReader::new(dec);
    let mut out = LoadedCollection::default();
    for (n, line) in br.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(&line) {
            Ok(d) => out.docs.push(d),
            Err(e) => {
                out.skipped += 1;
                tracing::warn!(
                    path = %path.display(),
                    line = n + 1,
                    "skipping unreadable document: {}",
                    e
                )
            }
        }
    }
    Ok(out)
}
