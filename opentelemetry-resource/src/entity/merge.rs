use super::Entity;
use opentelemetry::otel_debug;
use std::collections::HashMap;

/// Merges priority-ordered entity lists into one list with one entity per type.
///
/// `entity_lists` is ordered from highest to lowest priority, and each list
/// is itself ordered by descending priority. The first entity seen for a
/// type is kept. A later entity of the same type is dropped when its
/// identifier or schema url differs from the kept one. When both match, the
/// kept entity already holds the higher-priority value for each of its
/// descriptive keys, and keys it does not have are not taken from the
/// lower-priority entity, so it is returned unchanged.
///
/// The output keeps first-seen order. Inputs are not modified.
pub fn merge_entities<'a, I>(entity_lists: I) -> Vec<Entity>
where
    I: IntoIterator<Item = &'a [Entity]>,
{
    let mut merged: Vec<Entity> = Vec::new();
    let mut by_type: HashMap<&'a str, usize> = HashMap::new();

    for entity in entity_lists.into_iter().flatten() {
        let Some(&index) = by_type.get(entity.entity_type()) else {
            by_type.insert(entity.entity_type(), merged.len());
            merged.push(entity.clone());
            continue;
        };

        let kept = &merged[index];
        if !kept.has_same_identifier(entity) {
            otel_debug!(
                name: "Entity.MergeDropped",
                entity_type = entity.entity_type(),
                reason = "identifier differs from the higher-priority entity"
            );
        } else if kept.schema_url() != entity.schema_url() {
            otel_debug!(
                name: "Entity.MergeDropped",
                entity_type = entity.entity_type(),
                reason = "schema url differs from the higher-priority entity"
            );
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::{Key, KeyValue, Value};

    fn entity(entity_type: &'static str, id: &'static str) -> Entity {
        Entity::builder(entity_type)
            .with_identifier([KeyValue::new("id", id)])
            .build()
    }

    #[test]
    fn keeps_one_entity_per_type_in_first_seen_order() {
        let high = [entity("host", "h"), entity("process", "p")];
        let low = [entity("container", "c"), entity("host", "h")];

        let merged = merge_entities([&high[..], &low[..]]);

        let types: Vec<_> = merged.iter().map(Entity::entity_type).collect();
        assert_eq!(types, vec!["host", "process", "container"]);
    }

    #[test]
    fn different_identity_is_dropped() {
        let high = [Entity::builder("host")
            .with_identifier([KeyValue::new("id", "a")])
            .with_attributes([KeyValue::new("region", "us")])
            .build()];
        let low = [Entity::builder("host")
            .with_identifier([KeyValue::new("id", "b")])
            .with_attributes([KeyValue::new("region", "eu")])
            .build()];

        let merged = merge_entities([&high[..], &low[..]]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].identifier(), &[KeyValue::new("id", "a")]);
        assert_eq!(
            merged[0].attributes().get(&Key::new("region")),
            Some(&Value::from("us"))
        );
    }

    #[test]
    fn different_schema_is_dropped() {
        let high = [Entity::builder("host")
            .with_identifier([KeyValue::new("id", "a")])
            .with_schema_url("https://opentelemetry.io/schemas/1.26.0")
            .build()];
        let low = [Entity::builder("host")
            .with_identifier([KeyValue::new("id", "a")])
            .with_schema_url("https://opentelemetry.io/schemas/1.21.0")
            .with_attributes([KeyValue::new("zone", "z1")])
            .build()];

        let merged = merge_entities([&high[..], &low[..]]);

        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0].schema_url(),
            Some("https://opentelemetry.io/schemas/1.26.0")
        );
        assert!(merged[0].attributes().is_empty());
    }

    #[test]
    fn same_identity_does_not_take_values_or_new_keys_from_lower_priority() {
        let high = [Entity::builder("host")
            .with_identifier([KeyValue::new("id", "a")])
            .with_attributes([KeyValue::new("region", "us")])
            .build()];
        let low = [Entity::builder("host")
            .with_identifier([KeyValue::new("id", "a")])
            .with_attributes([KeyValue::new("region", "eu"), KeyValue::new("zone", "z1")])
            .build()];

        let merged = merge_entities([&high[..], &low[..]]);

        assert_eq!(merged.len(), 1);
        let attributes = merged[0].attributes();
        assert_eq!(attributes.get(&Key::new("region")), Some(&Value::from("us")));
        assert!(!attributes.contains_key(&Key::new("zone")));
    }

    #[test]
    fn priority_within_a_single_list_follows_list_order() {
        let only = [entity("host", "first"), entity("host", "second")];

        let merged = merge_entities([&only[..]]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].identifier(), &[KeyValue::new("id", "first")]);
    }

    #[test]
    fn empty_inputs_merge_to_nothing() {
        let merged = merge_entities(Vec::<&[Entity]>::new());
        assert!(merged.is_empty());
    }
}
