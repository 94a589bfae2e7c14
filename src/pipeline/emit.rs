//! Emission: write rendered bytes to a temporary file and stream them back
//! out, deleting the file once the stream ends.
//!
//! The temporary path is derived from the topic alone (`<dir>/<stem>.docx`),
//! so two concurrent requests for the same topic share one path and the
//! later write wins. Callers needing isolation should give each request its
//! own `output_dir`.

use crate::error::DocGenError;
use futures::stream::{self, Stream};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Read size for the download stream.
pub const CHUNK_SIZE: usize = 64 * 1024;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// File-system stem for `topic`: whitespace runs and path separators become
/// `_`.
pub fn file_stem(topic: &str) -> String {
    RE_WHITESPACE
        .replace_all(topic, "_")
        .replace(['/', '\\'], "_")
}

/// Temporary path the document for `topic` is written to.
pub fn temp_path_for(dir: &Path, topic: &str) -> PathBuf {
    dir.join(format!("{}.docx", file_stem(topic)))
}

/// Name offered to the downloading client: the topic as given.
pub fn download_name(topic: &str) -> String {
    format!("{topic}.docx")
}

/// `Content-Disposition` value for an attachment named `file_name`.
///
/// Carries an ASCII-only `filename` fallback and the exact UTF-8 name in
/// `filename*` (RFC 5987).
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// A document on disk that is removed when this value (or the stream made
/// from it) is dropped.
#[derive(Debug)]
pub struct EmittedDocument {
    path: TempPath,
    file_name: String,
    len: u64,
}

impl EmittedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name to present to the client, e.g. `My topic.docx`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stream the file in [`CHUNK_SIZE`] pieces.
    ///
    /// The file is deleted when the stream is exhausted, when a read fails,
    /// or when the stream is dropped early (client disconnect).
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Vec<u8>>> + Send + 'static {
        stream::try_unfold((None, self.path), |(file, path)| next_chunk(file, path))
    }
}

type StreamState = (Option<File>, TempPath);

async fn next_chunk(
    file: Option<File>,
    path: TempPath,
) -> io::Result<Option<(Vec<u8>, StreamState)>> {
    let mut file = match file {
        Some(f) => f,
        None => File::open(&path).await?,
    };

    let mut buf = vec![0u8; CHUNK_SIZE];
    let n = file.read(&mut buf).await?;
    if n == 0 {
        drop(file);
        let shown = path.to_path_buf();
        match path.close() {
            Ok(()) => debug!("Removed {}", shown.display()),
            Err(e) => warn!("Failed to remove {}: {}", shown.display(), e),
        }
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some((buf, (Some(file), path))))
}

/// Write `bytes` to the temporary path for `topic` inside `dir`.
///
/// # Errors
/// [`DocGenError::OutputWriteFailed`] if the directory cannot be created or
/// the file cannot be written.
pub async fn emit(bytes: &[u8], dir: &Path, topic: &str) -> Result<EmittedDocument, DocGenError> {
    let target = temp_path_for(dir, topic);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DocGenError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
    if let Err(e) = tokio::fs::write(&target, bytes).await {
        discard_partial(&target).await;
        return Err(DocGenError::OutputWriteFailed {
            path: target,
            source: e,
        });
    }

    debug!("Wrote {} bytes to {}", bytes.len(), target.display());

    let path =
        TempPath::try_from_path(target.clone()).map_err(|e| DocGenError::OutputWriteFailed {
            path: target.clone(),
            source: e,
        })?;

    Ok(EmittedDocument {
        path,
        file_name: download_name(topic),
        len: bytes.len() as u64,
    })
}

/// Best-effort removal of whatever a failed write left at `path`.
async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, TryStreamExt};

    #[test]
    fn stem_replaces_whitespace_runs() {
        assert_eq!(file_stem("Solar  energy\tin\nUzbekistan"), "Solar_energy_in_Uzbekistan");
    }

    #[test]
    fn stem_neutralises_path_separators() {
        assert_eq!(file_stem("../etc/passwd"), ".._etc_passwd");
        assert_eq!(file_stem(r"a\b"), "a_b");
    }

    #[test]
    fn download_name_keeps_topic_verbatim() {
        assert_eq!(download_name("Quyosh energiyasi"), "Quyosh energiyasi.docx");
    }

    #[test]
    fn same_topic_shares_temp_path() {
        let dir = Path::new("/tmp/out");
        assert_eq!(temp_path_for(dir, "A B"), temp_path_for(dir, "A  B"));
        assert_eq!(temp_path_for(dir, "A B"), dir.join("A_B.docx"));
    }

    #[test]
    fn content_disposition_ascii_name() {
        assert_eq!(
            content_disposition("My topic.docx"),
            "attachment; filename=\"My topic.docx\"; filename*=UTF-8''My%20topic.docx"
        );
    }

    #[test]
    fn content_disposition_non_ascii_name() {
        let value = content_disposition("Ўзбек \"tili\".docx");
        assert!(value.starts_with("attachment; filename=\"_____ _tili_.docx\";"));
        assert!(value.contains("filename*=UTF-8''%D0%8E%D0%B7%D0%B1%D0%B5%D0%BA%20%22tili%22.docx"));
        assert!(value.is_ascii());
    }

    #[test]
    fn content_disposition_encodes_reserved_ascii() {
        let value = content_disposition("A+B & C!.docx");
        assert!(value.contains("filename=\"A+B & C!.docx\""));
        assert!(value.ends_with("filename*=UTF-8''A%2BB%20%26%20C%21.docx"));
    }

    #[tokio::test]
    async fn discard_partial_removes_leftover_file() {
        let dir = tempfile::tempdir().unwrap();
        let leftover = dir.path().join("half.docx");
        std::fs::write(&leftover, b"PK\x03").unwrap();

        discard_partial(&leftover).await;
        assert!(!leftover.exists());

        // Nothing there: no panic, nothing created.
        discard_partial(&leftover).await;
        assert!(!leftover.exists());
    }

    #[tokio::test]
    async fn failed_write_reports_output_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the target path makes the write fail.
        std::fs::create_dir(dir.path().join("blocked.docx")).unwrap();

        let err = emit(b"PK", dir.path(), "blocked").await.unwrap_err();
        assert!(matches!(err, DocGenError::OutputWriteFailed { .. }));
        assert!(!dir.path().join("blocked.docx").is_file());
    }

    #[tokio::test]
    async fn emit_writes_file_and_stream_deletes_it() {
        let dir = tempfile::tempdir().unwrap();
        let bytes: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();

        let doc = emit(&bytes, dir.path(), "Big topic").await.unwrap();
        let path = doc.path().to_path_buf();
        assert_eq!(path, dir.path().join("Big_topic.docx"));
        assert_eq!(doc.file_name(), "Big topic.docx");
        assert_eq!(doc.len(), bytes.len() as u64);
        assert!(path.exists());

        let chunks: Vec<Vec<u8>> = doc.into_stream().try_collect().await.unwrap();
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= CHUNK_SIZE));
        assert_eq!(chunks.concat(), bytes);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropping_stream_early_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = vec![7u8; CHUNK_SIZE * 3];
        let doc = emit(&bytes, dir.path(), "partial").await.unwrap();
        let path = doc.path().to_path_buf();

        let mut stream = Box::pin(doc.into_stream());
        let first = stream.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        assert!(path.exists());
        drop(stream);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn dropping_unstreamed_document_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = emit(b"PK", dir.path(), "t").await.unwrap();
        let path = doc.path().to_path_buf();
        drop(doc);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn emit_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let doc = emit(b"PK", &nested, "t").await.unwrap();
        assert!(doc.path().starts_with(&nested));
    }
}
