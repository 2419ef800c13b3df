//! Template schema and validator.
//!
//! A template is the shared, versioned catalog of trackable collections and
//! items. Templates are fetched from untrusted URLs, so [`parse_template`]
//! validates the raw JSON completely before producing a typed [`Template`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Revision;
use crate::validation::{join_path, Issues, ValidationError};

/// Discriminator every template document must carry.
pub const TEMPLATE_MAGIC: &str = "my-ideals-template";

/// The only template format version understood by this crate.
pub const TEMPLATE_VERSION: u32 = 1;

const IMAGE_RESOURCE_TYPES: &[&str] = &["baseUrl", "itemUrl", "inline"];
const IMAGE_FORMATS: &[&str] = &["jpg", "png", "webp"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub magic: String,
    pub version: u32,
    pub revision: Revision,
    /// Stable across revisions.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    pub image_resource_type: ImageResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<ImageBaseUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    pub members: Vec<Member>,
    pub collections: Vec<TemplateCollection>,
}

/// How item image URLs are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageResourceType {
    /// `{imageBaseUrl.root}/{item.id}.{imageBaseUrl.format}`.
    #[serde(rename = "baseUrl")]
    BaseUrl,
    /// Each item carries its own `image` URL.
    #[serde(rename = "itemUrl", alias = "inline")]
    ItemUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBaseUrl {
    pub root: String,
    pub format: ImageFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ImageBaseUrl {
    pub fn url_for(&self, item_id: &str) -> String {
        format!(
            "{}/{}.{}",
            self.root.trim_end_matches('/'),
            item_id,
            self.format.extension()
        )
    }
}

/// Grid presentation hints. Tuples are `[width, height]` and
/// `[narrow, wide]` respectively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<(i64, i64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<(i64, i64)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCollection {
    /// Unique within a template and stable across revisions.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    pub items: Vec<TemplateItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    /// Unique within the owning collection and stable across revisions.
    pub id: String,
    pub name: String,
    pub member: ItemMember,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotated: Option<bool>,
}

/// Member attribution: a single member id or a non-empty list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemMember {
    One(String),
    Many(Vec<String>),
}

impl ItemMember {
    pub fn ids(&self) -> &[String] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }

    pub fn includes(&self, member_id: &str) -> bool {
        self.ids().iter().any(|id| id == member_id)
    }
}

// ---------------------------------------------------------------------------
// Constructors and lookups
// ---------------------------------------------------------------------------

impl Template {
    /// Minimal template with inline item images and no members.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        revision: Revision,
        collections: Vec<TemplateCollection>,
    ) -> Self {
        Self {
            magic: TEMPLATE_MAGIC.to_string(),
            version: TEMPLATE_VERSION,
            revision,
            id: id.into(),
            name: name.into(),
            description: None,
            author: None,
            link: None,
            categories: None,
            image_resource_type: ImageResourceType::ItemUrl,
            image_base_url: None,
            layout: None,
            members: Vec::new(),
            collections,
        }
    }

    pub fn collection(&self, collection_id: &str) -> Option<&TemplateCollection> {
        self.collections.iter().find(|c| c.id == collection_id)
    }

    /// Every `(collection id, item id)` pair in template order.
    pub fn item_keys(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.collections.iter().flat_map(|collection| {
            collection
                .items
                .iter()
                .map(move |item| (collection.id.as_str(), item.id.as_str()))
        })
    }

    pub fn item_count(&self) -> usize {
        self.collections.iter().map(|c| c.items.len()).sum()
    }

    /// Resolve the image URL of `item` according to the resource type.
    pub fn image_url(&self, item: &TemplateItem) -> Option<String> {
        match self.image_resource_type {
            ImageResourceType::BaseUrl => self
                .image_base_url
                .as_ref()
                .map(|base| base.url_for(&item.id)),
            ImageResourceType::ItemUrl => item.image.clone(),
        }
    }
}

impl TemplateCollection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, items: Vec<TemplateItem>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            layout: None,
            items,
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&TemplateItem> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

impl TemplateItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            member: ItemMember::One(member.into()),
            image: None,
            rotated: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Validate untrusted JSON and convert it into a [`Template`].
pub fn parse_template(raw: &Value) -> Result<Template, ValidationError> {
    validate_template(raw)?;
    serde_json::from_value(raw.clone()).map_err(|e| ValidationError::single("", e.to_string()))
}

/// Parse a template from a JSON string. Malformed JSON yields a single
/// issue at the document root.
pub fn parse_template_str(raw: &str) -> Result<Template, ValidationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ValidationError::single("", format!("Invalid JSON: {e}")))?;
    parse_template(&value)
}

/// Check the full template shape, collecting every issue.
pub fn validate_template(raw: &Value) -> Result<(), ValidationError> {
    let mut issues = Issues::new();
    let Some(root) = issues.object(raw, "") else {
        return issues.into_result();
    };

    issues.literal_str(root, "magic", TEMPLATE_MAGIC, "");
    issues.literal_u64(root, "version", u64::from(TEMPLATE_VERSION), "");
    issues.non_negative_int(root, "revision", "");
    issues.string(root, "id", "");
    issues.string(root, "name", "");
    issues.optional_string(root, "description", "");
    issues.optional_string(root, "author", "");
    issues.url(root, "link", "", false);
    issues.optional_string_array(root, "categories", "");

    let resource_type = issues.one_of(root, "imageResourceType", IMAGE_RESOURCE_TYPES, "");
    if let Some(base) = issues.optional_object_field(root, "imageBaseUrl", "") {
        validate_image_base_url(&mut issues, base, "imageBaseUrl");
    }
    if resource_type == Some("baseUrl") && !root.contains_key("imageBaseUrl") {
        issues.push(
            "imageBaseUrl",
            "Required when imageResourceType is \"baseUrl\"",
        );
    }

    if let Some(layout) = issues.optional_object_field(root, "layout", "") {
        validate_layout(&mut issues, layout, "layout");
    }

    if let Some(members) = issues.array(root, "members", "") {
        for (i, member) in members.iter().enumerate() {
            let path = join_path("members", i);
            if let Some(obj) = issues.object(member, &path) {
                issues.string(obj, "id", &path);
                issues.string(obj, "name", &path);
            }
        }
    }

    if let Some(collections) = issues.array(root, "collections", "") {
        validate_collections(&mut issues, collections);
    }

    issues.into_result()
}

fn validate_image_base_url(issues: &mut Issues, base: &Map<String, Value>, path: &str) {
    issues.url(base, "root", path, true);
    issues.one_of(base, "format", IMAGE_FORMATS, path);
    issues.url(base, "fallback", path, false);
}

fn validate_layout(issues: &mut Issues, layout: &Map<String, Value>, path: &str) {
    validate_int_pair(issues, layout, "aspectRatio", path, Some(1));
    validate_int_pair(issues, layout, "columns", path, None);
}

/// Optional `[int, int]` tuple; `min_second` bounds the second element.
fn validate_int_pair(
    issues: &mut Issues,
    layout: &Map<String, Value>,
    field: &str,
    path: &str,
    min_second: Option<i64>,
) {
    let Some(value) = layout.get(field) else {
        return;
    };
    let pair_path = join_path(path, field);
    let Some(items) = issues.as_array(value, &pair_path) else {
        return;
    };
    if items.len() != 2 {
        issues.push(
            pair_path,
            format!("Expected tuple of 2 integers, received {} elements", items.len()),
        );
        return;
    }
    for (i, item) in items.iter().enumerate() {
        match item.as_i64() {
            Some(n) => {
                if let Some(min) = min_second.filter(|_| i == 1) {
                    if n < min {
                        issues.push(join_path(&pair_path, i), format!("Must be at least {min}"));
                    }
                }
            }
            None => issues.push(join_path(&pair_path, i), "Expected integer"),
        }
    }
}

fn validate_collections(issues: &mut Issues, collections: &[Value]) {
    let mut seen = HashSet::new();
    for (i, collection) in collections.iter().enumerate() {
        let path = join_path("collections", i);
        let Some(obj) = issues.object(collection, &path) else {
            continue;
        };
        if let Some(id) = issues.string(obj, "id", &path) {
            if !seen.insert(id) {
                issues.push(
                    join_path(&path, "id"),
                    format!("Duplicate collection id '{id}'"),
                );
            }
        }
        issues.string(obj, "name", &path);
        issues.optional_string(obj, "category", &path);
        if let Some(layout) = issues.optional_object_field(obj, "layout", &path) {
            validate_layout(issues, layout, &join_path(&path, "layout"));
        }
        if let Some(items) = issues.array(obj, "items", &path) {
            validate_items(issues, items, &join_path(&path, "items"));
        }
    }
}

fn validate_items(issues: &mut Issues, items: &[Value], path: &str) {
    let mut seen = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        let item_path = join_path(path, i);
        let Some(obj) = issues.object(item, &item_path) else {
            continue;
        };
        if let Some(id) = issues.string(obj, "id", &item_path) {
            if !seen.insert(id) {
                issues.push(
                    join_path(&item_path, "id"),
                    format!("Duplicate item id '{id}'"),
                );
            }
        }
        issues.string(obj, "name", &item_path);
        validate_member(issues, obj, &item_path);
        issues.optional_string(obj, "image", &item_path);
        issues.optional_bool(obj, "rotated", &item_path);
    }
}

fn validate_member(issues: &mut Issues, item: &Map<String, Value>, path: &str) {
    let member_path = join_path(path, "member");
    match item.get("member") {
        None => issues.push(member_path, "Required"),
        Some(Value::String(_)) => {}
        Some(Value::Array(ids)) => {
            if ids.is_empty() {
                issues.push(member_path.clone(), "Expected at least 1 member");
            }
            for (i, id) in ids.iter().enumerate() {
                issues.as_string(id, &join_path(&member_path, i));
            }
        }
        Some(_) => issues.push(member_path, "Expected string or array of strings"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "magic": "my-ideals-template",
            "version": 1,
            "revision": 3,
            "id": "photo-sets",
            "name": "Photo sets",
            "link": "https://example.com/photo-sets.json",
            "categories": ["2024"],
            "imageResourceType": "baseUrl",
            "imageBaseUrl": { "root": "https://img.example.com/sets", "format": "webp" },
            "layout": { "aspectRatio": [3, 4], "columns": [2, 5] },
            "members": [
                { "id": "m1", "name": "Alice" },
                { "id": "m2", "name": "Bea" }
            ],
            "collections": [
                {
                    "id": "coll1",
                    "name": "Spring",
                    "category": "2024",
                    "items": [
                        { "id": "itemA", "name": "A", "member": "m1" },
                        { "id": "itemB", "name": "B", "member": ["m1", "m2"], "rotated": true }
                    ]
                },
                { "id": "coll2", "name": "Summer", "items": [] }
            ]
        })
    }

    #[test]
    fn parses_valid_template() {
        let template = parse_template(&sample()).unwrap();
        assert_eq!(template.id, "photo-sets");
        assert_eq!(template.revision, 3);
        assert_eq!(template.image_resource_type, ImageResourceType::BaseUrl);
        assert_eq!(template.collections.len(), 2);
        assert_eq!(template.collections[0].items[1].member.ids(), ["m1", "m2"]);
        assert_eq!(template.layout.as_ref().unwrap().aspect_ratio, Some((3, 4)));
        assert_eq!(template.item_count(), 2);
    }

    #[test]
    fn item_keys_follow_template_order() {
        let template = parse_template(&sample()).unwrap();
        let keys: Vec<_> = template.item_keys().collect();
        assert_eq!(keys, vec![("coll1", "itemA"), ("coll1", "itemB")]);
    }

    #[test]
    fn reports_nested_item_path() {
        let mut raw = sample();
        raw["collections"][0]["items"][1]
            .as_object_mut()
            .unwrap()
            .remove("id");
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("collections.0.items.1.id"), "{err}");
    }

    #[test]
    fn collects_every_issue() {
        let mut raw = sample();
        raw["magic"] = json!("something-else");
        raw["revision"] = json!("3");
        raw["members"][1]["name"] = json!(null);
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("magic"));
        assert!(err.has_issue_at("revision"));
        assert!(err.has_issue_at("members.1.name"));
        assert_eq!(err.issues.len(), 3);
    }

    #[test]
    fn rejects_non_object_root() {
        let err = parse_template(&json!([1, 2])).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "");
    }

    #[test]
    fn rejects_unknown_image_format() {
        let mut raw = sample();
        raw["imageBaseUrl"]["format"] = json!("gif");
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("imageBaseUrl.format"));
    }

    #[test]
    fn base_url_type_requires_base_url() {
        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("imageBaseUrl");
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("imageBaseUrl"));
    }

    #[test]
    fn inline_is_an_alias_for_item_url() {
        let mut raw = sample();
        raw["imageResourceType"] = json!("inline");
        let template = parse_template(&raw).unwrap();
        assert_eq!(template.image_resource_type, ImageResourceType::ItemUrl);
    }

    #[test]
    fn layout_tuples_are_checked() {
        let mut raw = sample();
        raw["layout"]["aspectRatio"] = json!([3, 0]);
        raw["collections"][0]["layout"] = json!({ "columns": [1, 2, 3] });
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("layout.aspectRatio.1"));
        assert!(err.has_issue_at("collections.0.layout.columns"));
    }

    #[test]
    fn empty_member_list_rejected() {
        let mut raw = sample();
        raw["collections"][0]["items"][0]["member"] = json!([]);
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("collections.0.items.0.member"));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut raw = sample();
        raw["collections"][1]["id"] = json!("coll1");
        raw["collections"][0]["items"][1]["id"] = json!("itemA");
        let err = parse_template(&raw).unwrap_err();
        assert!(err.has_issue_at("collections.1.id"));
        assert!(err.has_issue_at("collections.0.items.1.id"));
    }

    #[test]
    fn same_item_id_allowed_in_different_collections() {
        let mut raw = sample();
        raw["collections"][1]["items"] = json!([{ "id": "itemA", "name": "A2", "member": "m2" }]);
        assert!(parse_template(&raw).is_ok());
    }

    #[test]
    fn invalid_json_string_is_a_root_issue() {
        let err = parse_template_str("<html>oops</html>").unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].message.starts_with("Invalid JSON"));
    }

    #[test]
    fn base_url_images_resolve_from_item_id() {
        let template = parse_template(&sample()).unwrap();
        let item = &template.collections[0].items[0];
        assert_eq!(
            template.image_url(item).as_deref(),
            Some("https://img.example.com/sets/itemA.webp")
        );
    }

    #[test]
    fn item_url_images_use_item_field() {
        let mut template = Template::new(
            "t",
            "T",
            1,
            vec![TemplateCollection::new(
                "c",
                "C",
                vec![TemplateItem::new("i", "I", "m")],
            )],
        );
        assert_eq!(template.image_url(&template.collections[0].items[0]), None);
        template.collections[0].items[0].image = Some("https://x/i.png".into());
        let item = template.collections[0].items[0].clone();
        assert_eq!(template.image_url(&item).as_deref(), Some("https://x/i.png"));
    }

    #[test]
    fn serialized_template_parses_back() {
        let template = parse_template(&sample()).unwrap();
        let json = serde_json::to_value(&template).unwrap();
        assert_matches!(parse_template(&json), Ok(parsed) if parsed == template);
    }
}
