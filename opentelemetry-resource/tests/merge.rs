use opentelemetry::{Key, KeyValue, Value};
use opentelemetry_resource::{
    detect_resources, merge_entities, DetectError, DetectedEntity, DetectedResource, Entity,
    Resource, ResourceDetectionConfig, ResourceDetector,
};
use std::collections::HashMap;

fn attributes(pairs: &[(&'static str, Value)]) -> HashMap<Key, Value> {
    pairs
        .iter()
        .map(|(key, value)| (Key::from_static_str(key), value.clone()))
        .collect()
}

#[test]
fn receiver_wins_for_shared_keys_and_other_fills_the_rest() {
    let a = Resource::from_attributes([
        KeyValue::new("service.name", "a"),
        KeyValue::new("host.name", "a-host"),
    ]);
    let b = Resource::from_attributes([
        KeyValue::new("service.name", "b"),
        KeyValue::new("os.type", "linux"),
    ]);

    let merged = a.merge(&b);

    for (key, value) in a.attributes() {
        assert_eq!(merged.get(&key), Some(value));
    }
    assert_eq!(merged.get(&Key::new("os.type")), Some(Value::from("linux")));
}

#[test]
fn merging_numeric_resources() {
    let merged = Resource::from_attributes([KeyValue::new("a", 1), KeyValue::new("b", 2)])
        .merge(&Resource::from_attributes([KeyValue::new("b", 3), KeyValue::new("c", 4)]));

    assert_eq!(
        merged.attributes(),
        attributes(&[("a", 1.into()), ("b", 2.into()), ("c", 4.into())])
    );
}

#[test]
fn merging_with_nothing() {
    let a = Resource::from_attributes([KeyValue::new("a", true)]);

    assert_eq!(a.merge(&Resource::empty()).attributes(), a.attributes());
    assert_eq!(a.merge(None).attributes(), a.attributes());
}

#[test]
fn array_identifiers_are_compared_element_wise() {
    let ids = |values: [&'static str; 2]| {
        Value::Array(
            values
                .into_iter()
                .map(opentelemetry::StringValue::from)
                .collect::<Vec<_>>()
                .into(),
        )
    };
    let high = [Entity::builder("service")
        .with_identifier([KeyValue::new("ids", ids(["a", "b"]))])
        .build()];
    let same = [Entity::builder("service")
        .with_identifier([KeyValue::new("ids", ids(["a", "b"]))])
        .with_attributes([KeyValue::new("extra", 1)])
        .build()];
    let reordered = [Entity::builder("service")
        .with_identifier([KeyValue::new("ids", ids(["b", "a"]))])
        .build()];

    let merged = merge_entities([&high[..], &same[..], &reordered[..]]);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].identifier(), high[0].identifier());
    assert!(merged[0].attributes().is_empty());
}

#[test]
fn entities_of_the_same_type_in_separate_resources_survive_until_merged() {
    let pod = |uid: &'static str| {
        Resource::from_detected(DetectedResource::new().with_entity(
            DetectedEntity::new("k8s.pod").with_identifier([KeyValue::new("k8s.pod.uid", uid)]),
        ))
    };
    let first = pod("1");
    let second = pod("2");

    assert_eq!(first.get(&Key::new("k8s.pod.uid")), Some(Value::from("1")));
    assert_eq!(second.get(&Key::new("k8s.pod.uid")), Some(Value::from("2")));

    let merged = first.merge(&second);
    assert_eq!(merged.entities().len(), 1);
    assert_eq!(merged.get(&Key::new("k8s.pod.uid")), Some(Value::from("1")));
    assert_eq!(merged.entity_refs()[0].entity_type, "k8s.pod");
}

#[test]
fn same_identity_keeps_higher_priority_descriptive_attributes() {
    let high = [Entity::builder("host")
        .with_identifier([KeyValue::new("id", "a")])
        .with_attributes([KeyValue::new("region", "us")])
        .build()];
    let low = [Entity::builder("host")
        .with_identifier([KeyValue::new("id", "a")])
        .with_attributes([KeyValue::new("region", "eu"), KeyValue::new("zone", "z1")])
        .build()];

    let merged = merge_entities([&high[..], &low[..]]);

    assert_eq!(
        merged[0].attributes(),
        attributes(&[("region", "us".into())])
    );
}

struct Fixed(&'static str);

impl ResourceDetector for Fixed {
    fn detect(&self, _config: &ResourceDetectionConfig) -> Result<DetectedResource, DetectError> {
        Ok(DetectedResource::new().with_attribute(KeyValue::new("x", self.0)))
    }
}

#[test]
fn later_detector_wins() {
    let config = ResourceDetectionConfig::new()
        .with_detector(Fixed("1"))
        .with_detector(Fixed("2"));

    assert_eq!(
        detect_resources(&config).get(&Key::new("x")),
        Some(Value::from("2"))
    );
}

#[tokio::test]
async fn rejected_values_do_not_escape_settlement() {
    let resource = Resource::builder_empty()
        .with_attribute(KeyValue::new("sync", "a"))
        .with_async_attribute("async", async {
            Err::<Value, _>(DetectError::Unsupported("no metadata service"))
        })
        .build();

    resource.wait_for_async_attributes().await;

    assert!(!resource.async_attributes_pending());
    assert_eq!(resource.attributes(), attributes(&[("sync", "a".into())]));
}
