#[cfg(test)]
mod tests {
    use recfix::convert::{json_to_value, option_to_json, value_to_json};
    use recfix::value::pattern;
    use recfix::*;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash as _, Hasher};

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn hash_of(pairs: &[(&str, &str)]) -> Hash {
        pairs.iter().map(|(k, v)| (*k, s(v))).collect()
    }

    fn std_hash(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    // ========================================================================
    // Hash.add / put
    // ========================================================================

    #[test]
    fn test_add_preserves_order() {
        let mut hash = Hash::new();
        hash.add("title", s("v1")).unwrap();
        hash.add("title", s("v2")).unwrap();

        let titles = hash.get("title").unwrap();
        assert_eq!(titles.as_ref(), &Value::from(vec![s("v1"), s("v2")]));
    }

    #[test]
    fn test_add_rewrites_paths_on_promotion() {
        let mut hash = Hash::new();
        hash.add("title", s("v1")).unwrap();
        assert_eq!(hash.get_field("title").unwrap().path(), Some("title"));

        hash.add("title", s("v2")).unwrap();
        let titles = hash.get_field("title").unwrap().as_array().unwrap();
        assert_eq!(titles.path(), Some("title"));
        assert_eq!(titles.get(0).unwrap().path(), Some("title.1"));
        assert_eq!(titles.get(1).unwrap().path(), Some("title.2"));
    }

    #[test]
    fn test_add_array_splices_elements() {
        let mut hash = hash_of(&[("tags", "a")]);
        hash.add("tags", Value::from(vec![s("b"), s("c")])).unwrap();
        assert_eq!(
            hash.get_field("tags").unwrap(),
            &Value::from(vec![s("a"), s("b"), s("c")])
        );
    }

    #[test]
    fn test_add_nested_path() {
        let mut hash = Hash::new();
        hash.add("author.name", s("Goethe")).unwrap();
        hash.add("author.name", s("Schiller")).unwrap();

        let names = hash.find("author.name").unwrap();
        assert_eq!(names.as_ref(), &Value::from(vec![s("Goethe"), s("Schiller")]));
    }

    #[test]
    fn test_put_keeps_position() {
        let mut hash = hash_of(&[("a", "1"), ("b", "2"), ("c", "3")]);
        hash.put("b", s("two"));
        let keys: Vec<&String> = hash.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(hash.get_field("b").unwrap(), &s("two"));
    }

    #[test]
    fn test_null_absorption() {
        let mut hash = hash_of(&[("a", "1"), ("b", "2")]);
        hash.put("c", None::<Value>);
        hash.add("a", None::<Value>).unwrap();
        hash.add("d.e", None::<Value>).unwrap();
        assert_eq!(hash, hash_of(&[("a", "1"), ("b", "2")]));

        let mut array: Array = vec![s("x")].into_iter().collect();
        array.add(None::<Value>);
        assert_eq!(array.len(), 1);
        assert_eq!(array.get(0), Some(&s("x")));
    }

    // ========================================================================
    // Field Patterns
    // ========================================================================

    #[test]
    fn test_wildcard_find_fields_keeps_hash_order() {
        let hash = hash_of(&[("a2", "y"), ("b", "z"), ("a1", "x")]);
        for _ in 0..3 {
            assert_eq!(hash.find_fields("a*"), ["a2", "a1"]);
        }
    }

    #[test]
    fn test_wildcard_find_fields_spec_example() {
        let hash = hash_of(&[("a1", "x"), ("a2", "y"), ("b", "z")]);
        assert_eq!(hash.find_fields("a*"), ["a1", "a2"]);
        assert_eq!(hash.find_fields("a*"), ["a1", "a2"]);
    }

    #[test]
    fn test_alternation_uses_hash_order() {
        let hash = hash_of(&[("a1", "x"), ("b", "z")]);
        assert_eq!(hash.find_fields("b|a1"), ["a1", "b"]);
        assert_eq!(hash.find_fields("b|missing"), ["b"]);
    }

    #[test]
    fn test_question_mark_and_class() {
        let hash = hash_of(&[("t1", "a"), ("t22", "b"), ("tx", "c")]);
        assert_eq!(hash.find_fields("t?"), ["t1", "tx"]);
        assert_eq!(hash.find_fields("t[0-9]"), ["t1"]);
        assert_eq!(hash.find_fields("t[!0-9]"), ["tx"]);
    }

    #[test]
    fn test_array_marker_is_exact() {
        let mut hash = Hash::new();
        hash.put("author[]", Value::new_hash());
        assert!(hash.contains_field("author[]"));
        assert!(!hash.contains_field("author"));
    }

    #[test]
    fn test_get_single_and_aggregated() {
        let mut hash = hash_of(&[("a1", "x")]);
        hash.put("a2", Value::from(vec![s("y"), s("z")]));
        hash.put("b", s("w"));

        assert_eq!(hash.get("a1").unwrap().as_ref(), &s("x"));
        assert_eq!(
            hash.get("a*").unwrap().as_ref(),
            &Value::from(vec![s("x"), s("y"), s("z")])
        );
        assert!(hash.get("c*").is_none());
    }

    #[test]
    fn test_remove_by_pattern() {
        let mut hash = hash_of(&[("a1", "x"), ("b", "z"), ("a2", "y")]);
        hash.remove("a*");
        assert_eq!(hash, hash_of(&[("b", "z")]));
    }

    #[test]
    fn test_retain_fields() {
        let mut hash = hash_of(&[("a", "1"), ("b1", "2"), ("c", "3"), ("b2", "4")]);
        hash.retain_fields(&["a", "b*"]);
        assert_eq!(hash, hash_of(&[("a", "1"), ("b1", "2"), ("b2", "4")]));
    }

    #[test]
    fn test_pattern_cache_across_threads() {
        let fields: Vec<String> = (0..50).map(|i| format!("title-{}", i)).collect();
        let hash: Hash = fields.iter().map(|f| (f.as_str(), s(f))).collect();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        assert_eq!(hash.find_fields("title-?").len(), 10);
                        assert_eq!(hash.find_fields("title-4*").len(), 11);
                    }
                });
            }
        });
        assert!(pattern::cached_patterns() >= 2);
    }

    // ========================================================================
    // removeEmptyValues
    // ========================================================================

    fn tree_with_empties() -> Hash {
        let mut inner = Hash::new();
        inner.put("c", s(""));
        let b: Array = vec![s(""), Value::Hash(inner), s("x")].into_iter().collect();

        let mut d = Hash::new();
        d.put("e", Value::new_hash());

        let mut tree = Hash::new();
        tree.put("a", s(""));
        tree.put("b", Value::Array(b));
        tree.put("d", Value::Hash(d));
        tree.put("f", s("y"));
        tree
    }

    #[test]
    fn test_remove_empty_values() {
        let mut tree = tree_with_empties();
        tree.remove_empty_values();

        assert_eq!(tree.len(), 2);
        let b = tree.get_field("b").unwrap();
        assert_eq!(b, &Value::from(vec![s("x")]));
        assert_eq!(b.as_array().unwrap().get(0).unwrap().path(), Some("b.1"));
        assert_eq!(tree.get_field("f").unwrap(), &s("y"));
    }

    #[test]
    fn test_remove_empty_values_is_idempotent() {
        let mut tree = tree_with_empties();
        tree.remove_empty_values();
        let once = tree.clone();
        tree.remove_empty_values();
        assert_eq!(tree, once);
    }

    // ========================================================================
    // Array
    // ========================================================================

    #[test]
    fn test_array_remove_reindexes() {
        let mut hash = Hash::new();
        hash.put("a", Value::from(vec![s("x"), s("y"), s("z")]));
        let array = hash.get_field("a").unwrap().as_array().unwrap().clone();

        let mut array = array;
        assert_eq!(array.remove(0), Some(s("x")));
        assert_eq!(array.get(0).unwrap().path(), Some("a.1"));
        assert_eq!(array.get(1).unwrap().path(), Some("a.2"));
        assert_eq!(array.remove(5), None);
    }

    #[test]
    fn test_array_set_out_of_range() {
        let mut array: Array = vec![s("x")].into_iter().collect();
        assert_eq!(array.set(0, s("y")), Some(s("x")));
        assert_eq!(array.set(3, s("z")), None);
        assert_eq!(array.len(), 1);
    }

    // ========================================================================
    // Value
    // ========================================================================

    #[test]
    fn test_equality_and_hash_ignore_path() {
        let mut hash = Hash::new();
        hash.put("f", s("x"));
        let placed = hash.get_field("f").unwrap();

        assert_eq!(placed.path(), Some("f"));
        assert_eq!(placed, &s("x"));
        assert_eq!(std_hash(placed), std_hash(&s("x")));
    }

    #[test]
    fn test_hash_equality_is_ordered() {
        assert_ne!(hash_of(&[("a", "1"), ("b", "2")]), hash_of(&[("b", "2"), ("a", "1")]));
    }

    #[test]
    fn test_projection_mismatch() {
        let mut hash = Hash::new();
        hash.put("f", s("x"));
        let value = hash.get_field("f").unwrap();

        match value.as_array() {
            Err(FixError::TypeMismatch { expected, actual, path }) => {
                assert_eq!(expected, "Array");
                assert_eq!(actual, ValueType::Scalar);
                assert_eq!(path, "f");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(value.as_scalar().unwrap(), "x");
        assert!(Value::new_hash().as_hash().is_ok());
    }

    #[test]
    fn test_as_list() {
        assert_eq!(s("x").as_list().len(), 1);
        assert_eq!(Value::from(vec![s("x"), s("y")]).as_list().len(), 2);
        assert!(Value::new_array().as_list().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(s("x").to_string(), "x");
        let hash = hash_of(&[("a", "1")]);
        assert_eq!(Value::Hash(hash).to_string(), r#"{"a":"1"}"#);
    }

    // ========================================================================
    // JSON Projection
    // ========================================================================

    #[test]
    fn test_json_projection() {
        let mut hash = hash_of(&[("a", "1")]);
        hash.put("b", Value::from(vec![s("x"), Value::new_hash()]));

        assert_eq!(option_to_json(hash.get_field("missing")).unwrap(), json!(null));
        assert_eq!(option_to_json(hash.get_field("a")).unwrap(), json!("1"));
        assert_eq!(
            value_to_json(&Value::Hash(hash)).unwrap(),
            json!({"a": "1", "b": ["x", {}]})
        );
    }

    #[test]
    fn test_json_numbers_and_nulls() {
        let value = json_to_value(json!({"n": 7, "t": true, "gone": null, "l": [null, 1.5]})).unwrap();
        assert_eq!(value_to_json(&value).unwrap(), json!({"n": "7", "t": "true", "l": ["1.5"]}));
        assert!(json_to_value(json!(null)).is_none());
    }

    #[test]
    fn test_record_serializes_like_its_root() {
        let record = Record::from_literals([("a", "1"), ("b.c", "2")]).unwrap();
        assert_eq!(to_json(&record).unwrap(), r#"{"a":"1","b":{"c":"2"}}"#);
        assert_eq!(to_json_pretty(&record).unwrap(), "{\n  \"a\": \"1\",\n  \"b\": {\n    \"c\": \"2\"\n  }\n}");
    }
}
