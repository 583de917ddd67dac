//! Indexer message pages and cursor pagination.
//!
//! The indexer serves a transaction's messages as JSON:API pages. Each
//! record carries its attributes plus `from`/`to` relationships, and a page
//! signals continuation through `meta.hasMore` and a `links.next` URL
//! holding the cursor.

use crate::parser::call_trace::deserialize_quantity;
use crate::utils::config::CURSOR_PARAM_NAMES;
use crate::utils::error::{RpcError, TraceError};
use crate::utils::validation::validate_tx_hash;
use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One page of indexed messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerPage {
    #[serde(default)]
    pub data: Vec<IndexerRecord>,

    #[serde(default)]
    pub links: PageLinks,

    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, rename = "hasMore")]
    pub has_more: Option<bool>,
}

/// A single indexed message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerRecord {
    /// Message id, ordered like execution
    pub id: String,

    #[serde(rename = "type", default)]
    pub resource_type: String,

    pub attributes: MessageAttributes,

    #[serde(default)]
    pub relationships: MessageRelationships,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttributes {
    /// Tag such as `transaction`, `internal-call` or `internal-value`
    #[serde(default)]
    pub message_type: Option<String>,

    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub value: Option<String>,

    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub gas_limit: Option<String>,

    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub gas_used: Option<String>,

    #[serde(default)]
    pub input: Option<String>,

    #[serde(default)]
    pub output: Option<String>,

    #[serde(default)]
    pub call_depth: Option<usize>,

    #[serde(default)]
    pub status: Option<bool>,

    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageRelationships {
    #[serde(default)]
    pub from: Option<Relationship>,

    #[serde(default)]
    pub to: Option<Relationship>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<ResourceIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub id: String,

    #[serde(rename = "type", default)]
    pub resource_type: String,
}

impl Relationship {
    pub fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.id.as_str())
    }
}

impl IndexerPage {
    /// Whether the source says another page follows
    ///
    /// An explicit `hasMore` flag wins; without it a `next` link means more.
    pub fn has_more(&self) -> bool {
        self.meta.has_more.unwrap_or(self.links.next.is_some())
    }

    /// Cursor token carried by the `next` link
    pub fn next_cursor(&self) -> Option<String> {
        self.links.next.as_deref().and_then(extract_cursor)
    }
}

/// Pull the cursor query parameter out of a continuation link
///
/// Relative links are resolved against a placeholder base; only the query matters.
pub fn extract_cursor(link: &str) -> Option<String> {
    let base = Url::parse("http://indexer.invalid/").ok()?;
    let url = base.join(link).ok()?;

    url.query_pairs()
        .find(|(key, _)| CURSOR_PARAM_NAMES.iter().any(|name| key == name))
        .map(|(_, value)| value.into_owned())
        .filter(|cursor| !cursor.is_empty())
}

/// Producer of indexer pages for one transaction
///
/// Implemented over HTTP by `rpc::IndexerClient`; tests use in-memory pages.
pub trait MessagePageSource {
    /// Name used in error context
    fn name(&self) -> &str;

    fn first_page(&self, tx_hash: &str) -> Result<IndexerPage, RpcError>;

    fn page_after(&self, tx_hash: &str, cursor: &str) -> Result<IndexerPage, RpcError>;
}

/// Fetch every page of a transaction's messages in cursor order
///
/// **Public** - drives pagination for the indexer path
///
/// # Errors
/// * `TraceError::InvalidTxHash` - before the source is contacted
/// * `TraceError::MissingCursor` - a page signalled more but had no cursor
/// * `TraceError::RepeatedCursor` - the source looped back to a seen cursor
/// * `TraceError::Fetch` - the source failed
pub fn collect_pages<S>(tx_hash: &str, source: &S) -> Result<Vec<IndexerPage>, TraceError>
where
    S: MessagePageSource + ?Sized,
{
    validate_tx_hash(tx_hash)?;

    let fetch_error = |cause| TraceError::Fetch {
        tx_hash: tx_hash.to_string(),
        source_name: source.name().to_string(),
        cause,
    };

    let mut pages = vec![source.first_page(tx_hash).map_err(fetch_error)?];
    let mut seen_cursors = HashSet::new();

    while let Some(last) = pages.last().filter(|page| page.has_more()) {
        let cursor = last.next_cursor().ok_or_else(|| TraceError::MissingCursor {
            tx_hash: tx_hash.to_string(),
            source_name: source.name().to_string(),
            page: pages.len(),
        })?;

        if !seen_cursors.insert(cursor.clone()) {
            return Err(TraceError::RepeatedCursor {
                tx_hash: tx_hash.to_string(),
                source_name: source.name().to_string(),
                cursor,
            });
        }

        debug!("Fetching page {} of {} after cursor {}", pages.len() + 1, tx_hash, cursor);
        pages.push(source.page_after(tx_hash, &cursor).map_err(fetch_error)?);
    }

    debug!("Collected {} pages from {}", pages.len(), source.name());
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cursor_absolute() {
        assert_eq!(
            extract_cursor("https://api.example.org/v1/transactions/0xabc/messages?page%5Bcursor%5D=c2&page%5Bsize%5D=50"),
            Some("c2".to_string())
        );
    }

    #[test]
    fn test_extract_cursor_relative() {
        assert_eq!(
            extract_cursor("/transactions/0xabc/messages?cursor=xyz"),
            Some("xyz".to_string())
        );
        assert_eq!(extract_cursor("/transactions/0xabc/messages?page=2"), None);
    }

    #[test]
    fn test_has_more_prefers_flag() {
        let mut page = IndexerPage::default();
        assert!(!page.has_more());

        page.links.next = Some("?cursor=a".to_string());
        assert!(page.has_more());

        page.meta.has_more = Some(false);
        assert!(!page.has_more());
    }
}
