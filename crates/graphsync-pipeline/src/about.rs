//! Static "about" page documents.
//!
//! An about file is a YAML sequence of page records. Each record must
//! carry a `page` field, which becomes the document id as `page<N>`.

use std::path::Path;

use serde_json::Value;
use tracing::warn;

use graphsync_types::Record;

use crate::error::PipelineError;

const PAGE_FIELD: &str = "page";

/// Read the about file and build its `(id, body)` document set.
///
/// Records without a `page` field are skipped with a warning; a missing
/// or malformed file fails the index.
pub fn load_about_documents(path: &str) -> Result<Vec<(String, Record)>, PipelineError> {
    if !Path::new(path).is_file() {
        return Err(PipelineError::AboutFile(format!(
            "about file does not exist: {path}"
        )));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::AboutFile(format!("cannot read {path}: {e}")))?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| PipelineError::AboutFile(format!("cannot parse {path}: {e}")))?;

    let pages = doc
        .as_sequence()
        .ok_or_else(|| PipelineError::AboutFile(format!("{path} is not a YAML sequence")))?;

    let mut documents = Vec::with_capacity(pages.len());
    for page in pages {
        let body: Value = serde_json::to_value(page)
            .map_err(|e| PipelineError::AboutFile(format!("invalid page record: {e}")))?;
        let Value::Object(body) = body else {
            warn!(file = %path, "About entry is not a mapping, skipping");
            continue;
        };
        let Some(page_value) = body.get(PAGE_FIELD).filter(|v| !v.is_null()) else {
            warn!(file = %path, "About entry missing 'page' field, skipping");
            continue;
        };
        let id = match page_value {
            Value::String(s) => format!("page{s}"),
            other => format!("page{other}"),
        };
        documents.push((id, body));
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_documents_get_page_ids() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- page: 1
  title: Welcome
- page: 2
  title: Help
  body: How it works
"#
        )
        .unwrap();

        let docs = load_about_documents(&file.path().to_string_lossy()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].0, "page1");
        assert_eq!(docs[0].1["title"], serde_json::json!("Welcome"));
        assert_eq!(docs[1].0, "page2");
    }

    #[test]
    fn test_entries_without_page_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "- title: orphan\n- page: 3\n  title: kept\n").unwrap();

        let docs = load_about_documents(&file.path().to_string_lossy()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, "page3");
    }

    #[test]
    fn test_missing_file() {
        let err = load_about_documents("/no/such/about.yaml").unwrap_err();
        assert!(matches!(err, PipelineError::AboutFile(_)));
    }

    #[test]
    fn test_non_sequence_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "page: 1\n").unwrap();
        let err = load_about_documents(&file.path().to_string_lossy()).unwrap_err();
        assert!(matches!(err, PipelineError::AboutFile(_)));
    }
}
