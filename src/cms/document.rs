//! Raw documents and responses of the Prismic REST API v2

use serde::{Deserialize, Deserializer, Serialize};

use crate::content::RichField;

/// API root response, used to discover the master ref
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

impl ApiInfo {
    /// The ref of the latest published revision
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

/// One page of a document query
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub results_per_page: usize,
    #[serde(default)]
    pub total_pages: usize,
    /// Cursor for the following page; `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Document>,
}

/// A raw CMS document of the post type
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: PostData,
}

/// Custom fields of a post document
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PostData {
    pub title: Option<RichField>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<Banner>,
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<Section>,
}

/// Image field; an empty image comes back as `{}`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Banner {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// Group item of the `content` field
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Section {
    pub heading: Option<String>,
    pub body: Option<RichField>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_master_ref() {
        let info: ApiInfo = serde_json::from_value(json!({
            "refs": [
                { "id": "preview", "ref": "Xabc", "label": "Draft", "isMasterRef": false },
                { "id": "master", "ref": "YJf0", "label": "Master", "isMasterRef": true }
            ],
            "bookmarks": {}
        }))
        .unwrap();
        assert_eq!(info.master_ref(), Some("YJf0"));
    }

    #[test]
    fn test_partial_document() {
        let response: QueryResponse = serde_json::from_value(json!({
            "page": 1,
            "next_page": null,
            "results": [{
                "uid": "hello",
                "type": "posts",
                "first_publication_date": null,
                "data": { "title": "Hello", "banner": {}, "content": null }
            }]
        }))
        .unwrap();

        assert!(response.next_page.is_none());
        let doc = &response.results[0];
        assert_eq!(doc.uid.as_deref(), Some("hello"));
        assert_eq!(doc.data.banner, Some(Banner::default()));
        assert!(doc.data.content.is_empty());
        assert!(doc.data.author.is_none());
    }
}
