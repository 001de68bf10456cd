use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{collections::BTreeMap, fmt};

/// Fingerprint of a document's title and link, stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityHash(String);

impl IdentityHash {
    pub fn new(title: &str, web_link: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\n");
        hasher.update(web_link.as_bytes());
        IdentityHash(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub doc_type: Option<String>,
    pub tags: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub identity_hash: IdentityHash,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub body_text: Option<String>,
    pub web_link: String,
    pub local_link: Option<String>,
    pub metadata: Metadata,
    pub published_at: NaiveDateTime,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Document {
    /// A document as known from its listing entry, before the detail page is read.
    pub fn new(
        title: String,
        web_link: String,
        metadata: Metadata,
        published_at: NaiveDateTime,
    ) -> Self {
        Document {
            identity_hash: IdentityHash::new(&title, &web_link),
            title,
            abstract_text: None,
            body_text: None,
            web_link,
            local_link: None,
            metadata,
            published_at,
            fetched_at: None,
        }
    }

    pub fn attach_body(&mut self, body_text: String, fetched_at: DateTime<Utc>) {
        self.body_text = Some(body_text);
        self.fetched_at = Some(fetched_at);
    }

    pub fn summary(&self) -> String {
        format!(
            "Find document | name: {} | link to web: {} | publication date: {}",
            self.title, self.web_link, self.published_at
        )
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hash            : {}", self.identity_hash)?;
        writeln!(f, "Title           : {}", self.title)?;
        writeln!(f, "Link            : {}", self.web_link)?;
        writeln!(
            f,
            "Type            : {}",
            self.metadata.doc_type.as_deref().unwrap_or("None")
        )?;
        writeln!(
            f,
            "Tags            : {}",
            self.metadata.tags.as_deref().unwrap_or("None")
        )?;
        writeln!(f, "Published Date  : {}", self.published_at)?;

        if let Some(d) = self.fetched_at.as_ref() {
            writeln!(f, "Fetched At      : {}", d)?;
        } else {
            writeln!(f, "Fetched At      : None")?;
        };

        writeln!(f, "Body            : ")?;
        if let Some(body) = self.body_text.as_ref() {
            writeln!(f, "> {}", body.replace('\n', "\n  "))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::new(
            "SEPA Instant Credit Transfer rulebook".to_string(),
            "https://www.europeanpaymentscouncil.eu/document-library/rulebooks/sct-inst".to_string(),
            Metadata {
                doc_type: Some("Rulebook".to_string()),
                tags: None,
                extra: BTreeMap::new(),
            },
            date::sentinel(),
        )
    }

    #[test]
    fn identity_hash_depends_on_title_and_link_only() {
        let mut a = sample();
        let b = sample();
        a.attach_body("text".to_string(), Utc::now());
        a.metadata.tags = Some("SCT Inst".to_string());
        assert_eq!(a.identity_hash, b.identity_hash);

        let c = Document::new(
            a.title.clone(),
            "https://www.europeanpaymentscouncil.eu/other".to_string(),
            Metadata::default(),
            date::sentinel(),
        );
        assert_ne!(a.identity_hash, c.identity_hash);
    }

    #[test]
    fn identity_hash_is_hex_sha256() {
        let hash = IdentityHash::new("a", "b");
        assert_eq!(hash.as_str().len(), 64);
        assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        // The separator keeps ("ab", "c") apart from ("a", "bc").
        assert_ne!(IdentityHash::new("ab", "c"), IdentityHash::new("a", "bc"));
    }

    #[test]
    fn new_document_has_no_detail_fields() {
        let doc = sample();
        assert_eq!(doc.abstract_text, None);
        assert_eq!(doc.local_link, None);
        assert_eq!(doc.body_text, None);
        assert_eq!(doc.fetched_at, None);
    }

    #[test]
    fn display_lists_fields() {
        let mut doc = sample();
        doc.attach_body("First line\nSecond line".to_string(), Utc::now());
        let shown = doc.to_string();
        assert!(shown.contains("Title           : SEPA Instant Credit Transfer rulebook"));
        assert!(shown.contains("Tags            : None"));
        assert!(shown.contains("> First line\n  Second line"));
    }

    #[test]
    fn json_uses_abstract_key_and_flat_metadata() {
        let mut doc = sample();
        doc.metadata
            .extra
            .insert("category".to_string(), "kb".to_string());
        let value = serde_json::to_value(&doc).unwrap();

        assert!(value.get("abstract").is_some());
        assert_eq!(value["metadata"]["doc_type"], "Rulebook");
        assert_eq!(value["metadata"]["category"], "kb");
        assert_eq!(value["identity_hash"], doc.identity_hash.as_str());

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
