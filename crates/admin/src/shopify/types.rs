//! Wire types for the events resource.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use shoplog_core::{EventId, SubjectId};

use super::ShopifyError;

/// An event as returned by `events.json`.
///
/// Every field except `created_at` may be missing or `null` upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEvent {
    #[serde(default)]
    pub id: Option<EventId>,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub verb: Option<String>,
    #[serde(default)]
    pub arguments: serde_json::Value,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Response envelope of `events.json`.
#[derive(Debug, Deserialize)]
pub(crate) struct EventsEnvelope {
    #[serde(default)]
    pub events: Vec<RemoteEvent>,
}

/// Opaque pagination cursor: the query parameters of a `Link` header target.
///
/// The parameters are never interpreted, only replayed. The JSON form is what
/// travels through the explorer's `pageInfo` query parameter.
///
/// ```
/// use shoplog_admin::shopify::PageCursor;
///
/// let cursor = PageCursor::from_json(r#"{"limit":"25","page_info":"abc"}"#)
///     .unwrap()
///     .unwrap();
/// assert_eq!(cursor.get("page_info"), Some("abc"));
/// assert_eq!(cursor.to_json(), r#"{"limit":"25","page_info":"abc"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor(BTreeMap<String, String>);

impl PageCursor {
    /// Wrap a parameter map.
    #[must_use]
    pub const fn new(params: BTreeMap<String, String>) -> Self {
        Self(params)
    }

    /// Look up one parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate the parameters in key order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the cursor carries no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize to a compact JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse the JSON form produced by [`to_json`](Self::to_json).
    ///
    /// Blank input, `{}`, and `null` mean "no cursor". Scalar values that
    /// are not strings are kept in their JSON text form.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidCursor`] if the text is not a JSON object
    /// of scalars.
    pub fn from_json(text: &str) -> Result<Option<Self>, ShopifyError> {
        let text = text.trim();
        if text.is_empty() || text == "null" || text == "undefined" {
            return Ok(None);
        }

        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(text).map_err(|e| ShopifyError::InvalidCursor(e.to_string()))?;

        let mut params = BTreeMap::new();
        for (key, value) in raw {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => continue,
                other => {
                    return Err(ShopifyError::InvalidCursor(format!(
                        "parameter '{key}' is not a scalar: {other}"
                    )));
                }
            };
            params.insert(key, value);
        }

        Ok((!params.is_empty()).then_some(Self(params)))
    }
}

/// Cursors to the neighbouring pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub next: Option<PageCursor>,
    pub previous: Option<PageCursor>,
}

/// One page of events plus its cursors.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<RemoteEvent>,
    pub page_info: PageInfo,
}

/// Parameters of one `events.json` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub limit: u32,
    pub created_at_min: Option<DateTime<Utc>>,
    pub created_at_max: Option<DateTime<Utc>>,
    pub cursor: Option<PageCursor>,
}

impl EventQuery {
    /// First page of events created at or after `watermark`.
    #[must_use]
    pub const fn since(watermark: DateTime<Utc>, limit: u32) -> Self {
        Self {
            limit,
            created_at_min: Some(watermark),
            created_at_max: None,
            cursor: None,
        }
    }

    /// The page a cursor points at.
    #[must_use]
    pub const fn at_cursor(cursor: PageCursor, limit: u32) -> Self {
        Self {
            limit,
            created_at_min: None,
            created_at_max: None,
            cursor: Some(cursor),
        }
    }

    /// Query-string parameters for this request.
    ///
    /// With a cursor only the cursor's own parameters are sent (plus `limit`
    /// if the cursor lacks one); Shopify rejects filters next to `page_info`.
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        if let Some(cursor) = &self.cursor {
            let mut params: Vec<(String, String)> = cursor
                .params()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            if cursor.get("limit").is_none() {
                params.push(("limit".to_string(), self.limit.to_string()));
            }
            return params;
        }

        let mut params = vec![("limit".to_string(), self.limit.to_string())];
        if let Some(min) = self.created_at_min {
            params.push((
                "created_at_min".to_string(),
                min.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        if let Some(max) = self.created_at_max {
            params.push((
                "created_at_max".to_string(),
                max.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        params
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cursor(pairs: &[(&str, &str)]) -> PageCursor {
        PageCursor::new(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_remote_event_missing_fields() {
        let event: RemoteEvent =
            serde_json::from_str(r#"{"created_at":"2024-03-01T10:00:00-05:00","body":null}"#)
                .unwrap();
        assert!(event.id.is_none());
        assert!(event.body.is_none());
        assert!(event.arguments.is_null());
        assert_eq!(
            event.created_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_remote_event_full() {
        let json = r#"{
            "id": 164748010,
            "subject_id": 632910392,
            "created_at": "2024-03-01T10:00:00Z",
            "subject_type": "Product",
            "verb": "create",
            "arguments": ["IPod Nano - 8GB"],
            "body": null,
            "message": "Product was created: <a href=\"/admin/products/632910392\">IPod Nano - 8GB</a>.",
            "author": "Shopify",
            "description": "Product was created: IPod Nano - 8GB.",
            "path": "/admin/products/632910392"
        }"#;
        let event: RemoteEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, Some(EventId::new(164_748_010)));
        assert_eq!(event.subject_id, Some(SubjectId::new(632_910_392)));
        assert_eq!(event.verb.as_deref(), Some("create"));
        assert_eq!(event.arguments, serde_json::json!(["IPod Nano - 8GB"]));
    }

    #[test]
    fn test_cursor_json_round_trip() {
        let original = cursor(&[("limit", "25"), ("page_info", "eyJsYXN0X2lkIjo0fQ")]);
        let parsed = PageCursor::from_json(&original.to_json()).unwrap();
        assert_eq!(parsed, Some(original));
    }

    #[test]
    fn test_cursor_from_json_empty_forms() {
        assert_eq!(PageCursor::from_json("").unwrap(), None);
        assert_eq!(PageCursor::from_json("{}").unwrap(), None);
        assert_eq!(PageCursor::from_json("null").unwrap(), None);
    }

    #[test]
    fn test_cursor_from_json_numbers_become_text() {
        let parsed = PageCursor::from_json(r#"{"limit":25,"page_info":"x"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.get("limit"), Some("25"));
    }

    #[test]
    fn test_cursor_from_json_rejects_garbage() {
        assert!(matches!(
            PageCursor::from_json("not json"),
            Err(ShopifyError::InvalidCursor(_))
        ));
        assert!(matches!(
            PageCursor::from_json(r#"{"page_info":["a"]}"#),
            Err(ShopifyError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_query_params_with_filters() {
        let mut query = EventQuery::since(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(), 250);
        query.created_at_max = Some(Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap());
        assert_eq!(
            query.to_params(),
            vec![
                ("limit".to_string(), "250".to_string()),
                ("created_at_min".to_string(), "1970-01-01T00:00:00Z".to_string()),
                ("created_at_max".to_string(), "2024-03-01T23:59:59Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_with_cursor_drop_filters() {
        let mut query = EventQuery::at_cursor(cursor(&[("page_info", "abc")]), 25);
        query.created_at_min = Some(Utc::now());
        assert_eq!(
            query.to_params(),
            vec![
                ("page_info".to_string(), "abc".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }
}
