use crate::digest::DigestDocument;
use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Upper bound on same-second name suffixes tried before giving up
const MAX_SUFFIX: u32 = 1000;

/// Writes each digest to a new file; existing files are never overwritten
pub struct DigestWriter {
    dir: PathBuf,
    slug: String,
}

impl DigestWriter {
    pub fn new(dir: impl Into<PathBuf>, slug: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            slug: slug.into(),
        }
    }

    /// `{date}-{slug}-{HH-MM-SS}` without extension
    pub fn file_stem(&self, doc: &DigestDocument) -> String {
        format!(
            "{}-{}-{}",
            doc.generated_at.format("%Y-%m-%d"),
            self.slug,
            doc.generated_at.format("%H-%M-%S")
        )
    }

    /// Write the document and return the path of the new file
    pub fn write(&self, doc: &DigestDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stem = self.file_stem(doc);
        let content = doc.to_markdown();

        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                format!("{}.md", stem)
            } else {
                format!("{}-{}.md", stem, attempt)
            };
            let path = self.dir.join(name);

            match create_new(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    info!(path = %path.display(), "Digest saved");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_SUFFIX => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn create_new(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestSource;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn doc(body: &str) -> DigestDocument {
        DigestDocument {
            title: "Pulse AI: 2024-01-15 - Daily Summary (14:30 UTC)".to_string(),
            body: body.to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 5).unwrap(),
            source: DigestSource::Generated,
        }
    }

    #[test]
    fn test_write_creates_dated_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = DigestWriter::new(temp_dir.path().join("digests"), "pulse-ai");

        let path = writer.write(&doc("# Dup\nHello")).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2024-01-15-pulse-ai-14-30-05.md"
        );
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "# Pulse AI: 2024-01-15 - Daily Summary (14:30 UTC)\n\nHello"
        );
    }

    #[test]
    fn test_same_second_runs_never_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let writer = DigestWriter::new(temp_dir.path(), "pulse-ai");

        let first = writer.write(&doc("first")).unwrap();
        let second = writer.write(&doc("second")).unwrap();

        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "2024-01-15-pulse-ai-14-30-05-2.md"
        );
        assert!(fs::read_to_string(&first).unwrap().ends_with("first"));
        assert!(fs::read_to_string(&second).unwrap().ends_with("second"));
    }

    #[test]
    fn test_runs_in_same_minute_get_distinct_names() {
        let temp_dir = TempDir::new().unwrap();
        let writer = DigestWriter::new(temp_dir.path(), "pulse-ai");

        let mut later = doc("later");
        later.generated_at = later.generated_at + chrono::Duration::seconds(20);

        let a = writer.write(&doc("early")).unwrap();
        let b = writer.write(&later).unwrap();
        assert_ne!(a, b);
        assert!(b.ends_with("2024-01-15-pulse-ai-14-30-25.md"));
    }
}
