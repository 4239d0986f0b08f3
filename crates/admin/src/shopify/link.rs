//! `Link` header parsing for cursor pagination.
//!
//! Shopify answers paginated REST calls with a header such as
//!
//! ```text
//! Link: <https://shop.myshopify.com/admin/api/2024-10/events.json?limit=25&page_info=abc>; rel="previous",
//!       <https://shop.myshopify.com/admin/api/2024-10/events.json?limit=25&page_info=def>; rel="next"
//! ```

use std::collections::BTreeMap;

use url::Url;

use super::types::{PageCursor, PageInfo};

impl PageInfo {
    /// Extract next/previous cursors from a `Link` header value.
    ///
    /// Entries with an unparseable target or an unknown `rel` are skipped.
    #[must_use]
    pub fn from_link_header(header: &str) -> Self {
        let mut info = Self::default();

        for entry in header.split(',') {
            let Some((target, params)) = split_entry(entry) else {
                continue;
            };
            let Some(rel) = rel_of(params) else {
                continue;
            };
            let Ok(url) = Url::parse(target) else {
                tracing::debug!(target, "Skipping unparseable Link target");
                continue;
            };

            let query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
            if query.is_empty() {
                continue;
            }
            let cursor = PageCursor::new(query);

            match rel {
                "next" => info.next = Some(cursor),
                "previous" | "prev" => info.previous = Some(cursor),
                _ => {}
            }
        }

        info
    }
}

/// Split `<target>; params` into its two halves.
fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let (target, params) = rest.split_once('>')?;
    Some((target.trim(), params))
}

/// Find the `rel` parameter among `; key="value"` pairs.
fn rel_of(params: &str) -> Option<&str> {
    params.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        (key.trim().eq_ignore_ascii_case("rel")).then(|| value.trim().trim_matches('"'))
    })
}
