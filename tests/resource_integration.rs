//! Integration tests for resource trees and response envelopes.

use std::sync::Arc;

use apiresource::prelude::*;
use apiresource::resource::{Entry, ResourceNode};
use apiresource::response::ResourceResponse;
use apiresource::{ErrorCode, WrapRegistry};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

struct ProfileResource;

impl ResourceType<Record> for ProfileResource {}

struct UserResource;

impl ResourceType<Record> for UserResource {
    fn to_fields<'a>(
        &self,
        resource: &Resource<'a, Record>,
        _request: &Request,
    ) -> ResourceResult<Fields<'a, Record>> {
        Ok(Fields::new()
            .field("name", resource.attribute("name"))
            .merge(resource.merge_when_explicitly_loaded([
                RelationSpec::new("profile").resource(ProfileResource),
            ])?)
            .merge(resource.merge_context(Some("viewer.role"))))
    }
}

struct CommentResource;

impl ResourceType<Record> for CommentResource {
    fn to_fields<'a>(
        &self,
        resource: &Resource<'a, Record>,
        _request: &Request,
    ) -> ResourceResult<Fields<'a, Record>> {
        Ok(Fields::new()
            .field("body", resource.attribute("body"))
            .merge(resource.merge_when_explicitly_loaded([
                RelationSpec::new("author").resource(UserResource),
            ])?))
    }
}

struct PostResource;

impl ResourceType<Record> for PostResource {
    fn to_fields<'a>(
        &self,
        resource: &Resource<'a, Record>,
        _request: &Request,
    ) -> ResourceResult<Fields<'a, Record>> {
        Ok(Fields::new()
            .field("id", resource.attribute("id"))
            .merge(resource.merge_attributes(["published_at"])?)
            .merge(resource.merge_when_explicitly_loaded([
                RelationSpec::new("author").resource(UserResource),
                RelationSpec::new("comments").resource(CommentResource),
                RelationSpec::new("tags"),
            ])?))
    }

    fn with(&self, _request: &Request) -> Map<String, Value> {
        let mut with = Map::new();
        with.insert("meta".into(), json!({"version": 2}));
        with
    }
}

struct KeyedPostResource;

impl ResourceType<Record> for KeyedPostResource {
    fn to_fields<'a>(
        &self,
        resource: &Resource<'a, Record>,
        _request: &Request,
    ) -> ResourceResult<Fields<'a, Record>> {
        Ok(Fields::new().field("id", resource.attribute("id")))
    }

    fn preserve_keys(&self) -> bool {
        true
    }
}

fn user(name: &str) -> Record {
    Record::new("User")
        .with_attribute("name", name)
        .with_relation("profile", RelationKind::HasOne)
        .with_loaded("profile", Related::one(Record::new("Profile").with_attribute("bio", "hello")))
}

fn post() -> Record {
    let comments = ["Grace", "Linus"]
        .into_iter()
        .map(|author| {
            Record::new("Comment")
                .with_attribute("body", format!("by {author}"))
                .with_relation("author", RelationKind::BelongsTo)
                .with_loaded("author", Related::one(user(author)))
        })
        .collect();

    Record::new("Post")
        .with_attribute("id", 1)
        .with_attribute("published_at", "2024-03-05 10:20:30")
        .with_cast("published_at", "datetime:%Y-%m-%d")
        .with_relation("author", RelationKind::BelongsTo)
        .with_relation("comments", RelationKind::HasMany)
        .with_relation("tags", RelationKind::BelongsToMany)
        .with_loaded("author", Related::one(user("Ada")))
        .with_loaded("comments", Related::many(comments))
        .with_loaded("tags", Related::many(vec![Record::new("Tag").with_attribute("label", "rust")]))
}

fn paths(paths: &[&str]) -> Vec<RelationPath> {
    paths.iter().map(|p| RelationPath::parse(p).unwrap()).collect()
}

fn keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_top_level_and_nested_relations() {
    let post = post();
    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["a", "a.b"]));

    let top = resource.top_level_relations();
    assert_eq!(top.iter().map(|name| name.as_str()).collect::<Vec<_>>(), vec!["a", "a"]);
    let nested: Vec<String> = resource
        .nested_relations()
        .iter()
        .map(RelationPath::to_dotted)
        .collect();
    assert_eq!(nested, vec!["b"]);
}

#[test]
fn test_output_never_contains_ungranted_relation() {
    let post = post();
    let request = Request::default();
    let grants: [&[&str]; 5] = [
        &[],
        &["author"],
        &["tags"],
        &["comments", "comments.author"],
        &["author", "author.profile", "tags"],
    ];

    for granted in grants {
        let mut resource = PostResource.make(&post);
        resource.set_relations(paths(granted));
        let output = resource.resolve(&request).unwrap();

        for relation in ["author", "comments", "tags"] {
            assert_eq!(
                output.get(relation).is_some(),
                granted.contains(&relation),
                "relation {relation} with grants {granted:?}"
            );
        }
    }
}

#[test]
fn test_nested_grants_follow_each_branch() {
    let post = post();
    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["author", "comments", "comments.author", "comments.author.profile"]));

    let output = resource.resolve(&Request::default()).unwrap();

    assert_eq!(keys(&output["author"]), vec!["name"]);
    assert_eq!(
        output["comments"][0],
        json!({
            "body": "by Grace",
            "author": {"name": "Grace", "profile": {"bio": "hello"}},
        })
    );
}

#[test]
fn test_sibling_nested_grants_stay_on_their_branch() {
    let post = post();
    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["author", "comments", "comments.author", "comments.author.profile"]));

    let Entry::Node(author) = resource
        .when_loaded("author", Some(Arc::new(UserResource)))
        .unwrap()
    else {
        panic!("author should be a nested node");
    };
    assert!(author.relations().is_empty());

    let output = resource.resolve(&Request::default()).unwrap();
    assert_eq!(keys(&output["author"]), vec!["name"]);
    assert_eq!(keys(&output["comments"][1]["author"]), vec!["name", "profile"]);
}

#[test]
fn test_raw_relation_without_resource_type() {
    let post = post();
    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["tags"]));

    let output = resource.resolve(&Request::default()).unwrap();
    assert_eq!(output["tags"], json!([{"label": "rust"}]));
}

#[test]
fn test_date_cast_formats_attribute() {
    let post = post();
    let output = PostResource.make(&post).resolve(&Request::default()).unwrap();
    assert_eq!(output, json!({"id": 1, "published_at": "2024-03-05"}));
}

#[test]
fn test_context_is_shared_through_the_tree() {
    let post = post();
    let context = Context::new(json!({"viewer": {"role": "admin"}}));

    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["comments", "comments.author", "comments.author.profile"]));
    resource.set_context(Some(context.clone()));

    let Entry::Node(comments) = resource
        .when_loaded("comments", Some(Arc::new(CommentResource)))
        .unwrap()
    else {
        panic!("comments should be a nested node");
    };
    assert!(comments.context().unwrap().ptr_eq(&context));

    let collection = comments.as_many().unwrap();
    assert_eq!(collection.len(), 2);
    for (_, comment) in collection.items() {
        assert!(comment.context().context().unwrap().ptr_eq(&context));

        let Entry::Node(author) = comment
            .when_loaded("author", Some(Arc::new(UserResource)))
            .unwrap()
        else {
            panic!("author should be a nested node");
        };
        assert!(author.context().unwrap().ptr_eq(&context));

        let Some(author) = author.as_single() else {
            panic!("author is a to-one relation");
        };
        let Entry::Node(profile) = author
            .when_loaded("profile", Some(Arc::new(ProfileResource)))
            .unwrap()
        else {
            panic!("profile should be a nested node");
        };
        assert!(profile.context().unwrap().ptr_eq(&context));
        assert!(profile.relations().is_empty());
    }
}

#[test]
fn test_context_values_reach_nested_output() {
    let post = post();
    let mut subject = Resourceable::One(post);
    let body = Builder::new(&mut subject, PostResource)
        .with_relations(["author"])
        .unwrap()
        .with_context(json!({"viewer": {"role": "admin"}}))
        .to_array(&Request::default())
        .unwrap();

    assert_eq!(body["author"], json!({"name": "Ada", "role": "admin"}));
}

#[test]
fn test_cardinality_mismatch_is_reported() {
    let post = Record::new("Post")
        .with_relation("author", RelationKind::BelongsTo)
        .with_loaded("author", Related::many(vec![user("Ada")]));
    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["author"]));

    let err = resource.resolve(&Request::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::CardinalityMismatch);
}

#[test]
fn test_null_to_one_relation() {
    let post = Record::new("Post")
        .with_attribute("id", 3)
        .with_relation("author", RelationKind::BelongsTo)
        .with_loaded("author", Related::none());
    let mut resource = PostResource.make(&post);
    resource.set_relations(paths(&["author"]));

    let output = resource.resolve(&Request::default()).unwrap();
    assert_eq!(output, json!({"id": 3, "published_at": null, "author": null}));
}

#[test]
fn test_single_response_merges_with_payload() {
    let post = post();
    let node = ResourceNode::Single(PostResource.make(&post));
    let wraps = WrapRegistry::new();

    let response = ResourceResponse::new(&node, &wraps)
        .to_response(&Request::default())
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.body(),
        &json!({
            "data": {"id": 1, "published_at": "2024-03-05"},
            "meta": {"version": 2},
        })
    );
}

#[test]
fn test_wrap_registry_controls_envelope() {
    let posts = vec![post()];
    let wraps = WrapRegistry::new();
    let key = ResourceType::<Record>::type_key(&KeyedPostResource);
    let request = Request::default();

    let respond = |wraps: &WrapRegistry| {
        let node = ResourceNode::Many(KeyedPostResource.collection(posts.iter()));
        ResourceResponse::new(&node, wraps)
            .to_response(&request)
            .unwrap()
            .into_body()
    };

    assert_eq!(respond(&wraps), json!({"data": [{"id": 1}]}));

    wraps.wrap(key, "post");
    assert_eq!(respond(&wraps), json!({"post": [{"id": 1}]}));

    wraps.wrap_collection(key, "posts");
    assert_eq!(respond(&wraps), json!({"posts": [{"id": 1}]}));

    wraps.without_wrapping(key);
    assert_eq!(respond(&wraps), json!([{"id": 1}]));

    wraps.reset(key);
    assert_eq!(respond(&wraps), json!({"data": [{"id": 1}]}));
}

#[test]
fn test_builder_uses_given_wraps() {
    let wraps = WrapRegistry::new();
    wraps.wrap_for::<PostResource>("post");

    let mut subject = Resourceable::One(post());
    let response = Builder::new(&mut subject, PostResource)
        .with_wraps(&wraps)
        .to_response(&Request::default())
        .unwrap();

    assert_eq!(keys(response.body()), vec!["post", "meta"]);
}

#[test]
fn test_keyed_collection_preserves_keys() {
    let items: IndexMap<String, Record> = [("first", 10), ("second", 20)]
        .into_iter()
        .map(|(key, id)| (key.to_string(), Record::new("Post").with_attribute("id", id)))
        .collect();
    let mut subject = Resourceable::Keyed(items);

    let body = Builder::new(&mut subject, KeyedPostResource)
        .to_array(&Request::default())
        .unwrap();
    assert_eq!(body, json!({"first": {"id": 10}, "second": {"id": 20}}));

    let mut subject = Resourceable::Many(vec![Record::new("Post").with_attribute("id", 10)]);
    let body = Builder::new(&mut subject, KeyedPostResource)
        .to_array(&Request::default())
        .unwrap();
    assert_eq!(body, json!([{"id": 10}]));
}

#[test]
fn test_response_serializes_to_json_text() {
    let mut subject = Resourceable::One(Record::new("Post").with_attribute("id", 5));
    let response = Builder::new(&mut subject, PlainResource)
        .to_response(&Request::default())
        .unwrap();

    assert_eq!(response.to_json_string().unwrap(), r#"{"data":{"id":5}}"#);
}
