use crate::document::{Document, IdentityHash};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Reached the newest document of a previous run.
    Duplicate(IdentityHash),
    /// The batch holds the configured maximum.
    BatchLimit(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Halt(HaltReason),
}

/// Decides whether each newly assembled document is kept and whether the crawl stops.
#[derive(Debug, Clone, Default)]
pub struct StopPolicy {
    last_known: Option<IdentityHash>,
    max_documents: Option<usize>,
}

impl StopPolicy {
    pub fn new(last_known: Option<IdentityHash>, max_documents: Option<usize>) -> Self {
        StopPolicy {
            last_known,
            max_documents: max_documents.filter(|&max| max > 0),
        }
    }

    pub fn evaluate(&self, doc: Document, accepted: &mut Vec<Document>) -> Decision {
        if let Some(last_known) = self.last_known.as_ref() {
            if *last_known == doc.identity_hash {
                info!("Find already existing document ({})", doc.web_link);
                return Decision::Halt(HaltReason::Duplicate(doc.identity_hash));
            }
        }

        info!("{}", doc.summary());
        accepted.push(doc);

        match self.max_documents {
            Some(max) if accepted.len() >= max => {
                info!("Max count documents reached ({})", max);
                Decision::Halt(HaltReason::BatchLimit(max))
            }
            _ => Decision::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{date, document::Metadata};
    use pretty_assertions::assert_eq;

    fn doc(n: usize) -> Document {
        Document::new(
            format!("Document {}", n),
            format!("https://example.org/doc/{}", n),
            Metadata::default(),
            date::sentinel(),
        )
    }

    #[test]
    fn unbounded_policy_accepts_everything() {
        let policy = StopPolicy::default();
        let mut accepted = vec![];
        for n in 0..5 {
            assert_eq!(policy.evaluate(doc(n), &mut accepted), Decision::Continue);
        }
        assert_eq!(accepted.len(), 5);
    }

    #[test]
    fn duplicate_halts_without_accepting() {
        let policy = StopPolicy::new(Some(doc(2).identity_hash), None);
        let mut accepted = vec![];

        assert_eq!(policy.evaluate(doc(0), &mut accepted), Decision::Continue);
        assert_eq!(policy.evaluate(doc(1), &mut accepted), Decision::Continue);
        assert_eq!(
            policy.evaluate(doc(2), &mut accepted),
            Decision::Halt(HaltReason::Duplicate(doc(2).identity_hash))
        );
        assert_eq!(accepted, vec![doc(0), doc(1)]);
    }

    #[test]
    fn batch_limit_halts_after_accepting() {
        let policy = StopPolicy::new(None, Some(2));
        let mut accepted = vec![];

        assert_eq!(policy.evaluate(doc(0), &mut accepted), Decision::Continue);
        assert_eq!(
            policy.evaluate(doc(1), &mut accepted),
            Decision::Halt(HaltReason::BatchLimit(2))
        );
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn duplicate_wins_over_limit() {
        let policy = StopPolicy::new(Some(doc(0).identity_hash), Some(1));
        let mut accepted = vec![];
        assert!(matches!(
            policy.evaluate(doc(0), &mut accepted),
            Decision::Halt(HaltReason::Duplicate(_))
        ));
        assert!(accepted.is_empty());
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let policy = StopPolicy::new(None, Some(0));
        let mut accepted = vec![];
        for n in 0..3 {
            assert_eq!(policy.evaluate(doc(n), &mut accepted), Decision::Continue);
        }
    }
}
