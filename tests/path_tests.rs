#[cfg(test)]
mod tests {
    use recfix::convert::{hash_to_json, json_to_value};
    use recfix::*;
    use serde_json::json;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn tree(json: serde_json::Value) -> Hash {
        match json_to_value(json) {
            Some(Value::Hash(hash)) => hash,
            other => panic!("not an object: {:?}", other),
        }
    }

    fn list(values: &[&str]) -> Value {
        Value::from(values.iter().map(|v| s(v)).collect::<Vec<_>>())
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_parse_segments() {
        let path = FixPath::parse("a.*.2.$first.$last.$append.07");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("a".into()),
                PathSegment::Wildcard,
                PathSegment::Index(2),
                PathSegment::Reference(Reference::First),
                PathSegment::Reference(Reference::Last),
                PathSegment::Reference(Reference::Append),
                PathSegment::Field("07".into()),
            ]
        );
        assert_eq!(path.to_string(), "a.*.2.$first.$last.$append.07");
    }

    #[test]
    fn test_is_nested() {
        assert!(FixPath::is_nested("a.b"));
        assert!(!FixPath::is_nested("a"));
    }

    // ========================================================================
    // Find
    // ========================================================================

    #[test]
    fn test_path_round_trip() {
        let mut hash = Hash::new();
        hash.insert(InsertMode::Replace, "a.b.c", s("X")).unwrap();

        let found = hash.find("a.b.c").unwrap();
        assert_eq!(found.as_scalar().unwrap(), "X");
        assert_eq!(found.path(), Some("a.b.c"));
    }

    #[test]
    fn test_find_in_arrays() {
        let hash = tree(json!({"a": [{"b": "1"}, {"b": "2", "c": "3"}]}));

        assert_eq!(hash.find("a.*.b").unwrap().as_ref(), &list(&["1", "2"]));
        assert_eq!(hash.find("a.b").unwrap().as_ref(), &list(&["1", "2"]));
        assert_eq!(hash.find("a.2.b").unwrap().as_ref(), &s("2"));
        assert_eq!(hash.find("a.$first.b").unwrap().as_ref(), &s("1"));
        assert_eq!(hash.find("a.$last.c").unwrap().as_ref(), &s("3"));
        assert_eq!(hash.find("a.2.b").unwrap().path(), Some("a.2.b"));
    }

    #[test]
    fn test_find_tolerates_missing() {
        let hash = tree(json!({"a": [{"b": "1"}], "s": "x"}));

        assert!(hash.find("a.3.b").is_none());
        assert!(hash.find("a.0").is_none());
        assert!(hash.find("a.c").is_none());
        assert!(hash.find("s.t").is_none());
        assert!(hash.find("missing.b").is_none());
        assert!(hash.find("a.$append").is_none());
    }

    #[test]
    fn test_find_numeric_hash_keys() {
        let hash = tree(json!({"a": {"1": "x", "01": "y"}}));
        assert_eq!(hash.find("a.1").unwrap().as_ref(), &s("x"));
        assert_eq!(hash.find("a.01").unwrap().as_ref(), &s("y"));
        assert_eq!(hash.find("a.$first").unwrap().as_ref(), &s("x"));
    }

    #[test]
    fn test_find_with_field_pattern() {
        let hash = tree(json!({"a": {"t1": "x", "t2": "y", "u": "z"}}));
        assert_eq!(hash.find("a.t*").unwrap().as_ref(), &list(&["x", "y"]));
    }

    // ========================================================================
    // Insert
    // ========================================================================

    #[test]
    fn test_reference_append() {
        let mut hash = Hash::new();
        hash.put("list", Value::new_array());
        hash.insert(InsertMode::Append, "list.$append.name", s("A")).unwrap();
        hash.insert(InsertMode::Append, "list.$append.name", s("B")).unwrap();

        assert_eq!(hash_to_json(&hash).unwrap(), json!({"list": [{"name": "A"}, {"name": "B"}]}));
        assert_eq!(hash.find("list.2.name").unwrap().path(), Some("list.2.name"));
    }

    #[test]
    fn test_indexed_mode() {
        let mut hash = Hash::new();
        hash.insert(InsertMode::Append, "x[].name", s("A")).unwrap();
        hash.insert(InsertMode::Append, "x[].name", s("B")).unwrap();

        let indexed = hash.get_field("x[]").unwrap();
        assert!(indexed.is_hash());
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"x[]": {"1": {"name": "A"}, "2": {"name": "B"}}}));
    }

    #[test]
    fn test_indexed_mode_not_used_before_references() {
        let mut hash = Hash::new();
        hash.insert(InsertMode::Append, "x[].name", s("A")).unwrap();
        hash.insert(InsertMode::Replace, "x[].$first.name", s("C")).unwrap();
        hash.insert(InsertMode::Replace, "x[].1.note", s("D")).unwrap();

        assert_eq!(hash_to_json(&hash).unwrap(), json!({"x[]": {"1": {"name": "C", "note": "D"}}}));
    }

    #[test]
    fn test_insert_modes() {
        let mut hash = tree(json!({"a": "x"}));
        hash.insert(InsertMode::Append, "a", s("y")).unwrap();
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x", "y"]));

        hash.insert(InsertMode::Replace, "a", s("z")).unwrap();
        assert_eq!(hash.get_field("a").unwrap(), &s("z"));
    }

    #[test]
    fn test_insert_array_positions() {
        let mut hash = tree(json!({"a": ["x", "y"]}));

        hash.insert(InsertMode::Replace, "a.2", s("z")).unwrap();
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x", "z"]));

        hash.insert(InsertMode::Replace, "a.3", s("w")).unwrap();
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x", "z", "w"]));

        hash.insert(InsertMode::Replace, "a.$last", s("v")).unwrap();
        hash.insert(InsertMode::Append, "a.$append", s("u")).unwrap();
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x", "z", "v", "u"]));

        let err = hash.insert(InsertMode::Replace, "a.9", s("q")).unwrap_err();
        assert!(matches!(err, FixError::ReferenceResolution { .. }));
    }

    #[test]
    fn test_insert_through_array_elements() {
        let mut hash = tree(json!({"a": [{"b": "1"}, {"b": "2"}]}));
        hash.insert(InsertMode::Replace, "a.*.c", s("x")).unwrap();
        hash.insert(InsertMode::Replace, "a.$first.b", s("0")).unwrap();

        assert_eq!(
            hash_to_json(&hash).unwrap(),
            json!({"a": [{"b": "0", "c": "x"}, {"b": "2", "c": "x"}]})
        );
    }

    #[test]
    fn test_insert_unresolvable_references() {
        let mut hash = tree(json!({"a": [], "h": {}}));

        let err = hash.insert(InsertMode::Replace, "a.$last", s("x")).unwrap_err();
        assert!(matches!(err, FixError::ReferenceResolution { .. }));

        let err = hash.insert(InsertMode::Replace, "h.$first.x", s("x")).unwrap_err();
        match err {
            FixError::ReferenceResolution { field, .. } => assert_eq!(field, "$first"),
            other => panic!("unexpected: {:?}", other),
        }

        let err = hash.insert(InsertMode::Replace, "h.$last", s("x")).unwrap_err();
        assert!(matches!(err, FixError::ReferenceResolution { .. }));
    }

    #[test]
    fn test_insert_into_scalar_is_type_mismatch() {
        let mut hash = tree(json!({"a": "x"}));
        let err = hash.insert(InsertMode::Replace, "a.b", s("y")).unwrap_err();
        match err {
            FixError::TypeMismatch { actual, path, .. } => {
                assert_eq!(actual, ValueType::Scalar);
                assert_eq!(path, "a");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_insert_append_on_hash() {
        let mut hash = tree(json!({"h": {"1": "x"}}));
        hash.insert(InsertMode::Replace, "h.$append", s("y")).unwrap();
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"h": {"1": "x", "2": "y"}}));
    }

    #[test]
    fn test_insert_numeric_hash_keys() {
        let mut hash = Hash::new();
        hash.insert(InsertMode::Append, "a.1", s("x")).unwrap();
        hash.insert(InsertMode::Append, "a.1", s("y")).unwrap();
        hash.insert(InsertMode::Replace, "b.$append.c", s("z")).unwrap();
        hash.insert(InsertMode::Replace, "b.1.d", s("w")).unwrap();

        assert_eq!(
            hash_to_json(&hash).unwrap(),
            json!({"a": {"1": ["x", "y"]}, "b": {"1": {"c": "z", "d": "w"}}})
        );
    }

    #[test]
    fn test_insert_through_missing_numeric_key() {
        let mut hash = tree(json!({"a": {}}));

        let err = hash.insert(InsertMode::Replace, "a.5.b", s("x")).unwrap_err();
        match err {
            FixError::ReferenceResolution { field, .. } => assert_eq!(field, "5"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"a": {}}));
    }

    // ========================================================================
    // Remove
    // ========================================================================

    #[test]
    fn test_remove_paths() {
        let mut hash = tree(json!({"a": ["x", "y", "z"], "b": {"c": "1", "d": "2"}}));

        hash.remove_path("a.2");
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x", "z"]));
        assert_eq!(hash.find("a.2").unwrap().path(), Some("a.2"));

        hash.remove_path("b.c");
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"a": ["x", "z"], "b": {"d": "2"}}));

        hash.remove_path("a.*");
        assert!(hash.get_field("a").unwrap().is_empty());

        hash.remove_path("missing.path");
        hash.remove_path("a.7");
    }

    #[test]
    fn test_remove_through_array_elements() {
        let mut hash = tree(json!({"a": [{"b": "1", "c": "2"}, {"b": "3"}]}));
        hash.remove_path("a.b");
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"a": [{"c": "2"}, {}]}));
    }

    #[test]
    fn test_remove_last() {
        let mut hash = tree(json!({"a": ["x", "y"]}));
        hash.remove_path("a.$last");
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x"]));
    }

    // ========================================================================
    // Transform
    // ========================================================================

    #[test]
    fn test_transform_nested() {
        let mut hash = tree(json!({"a": [{"b": "x"}, {"b": ["y", "z"]}]}));
        hash.transform_fields("a.*.b", |v| Some(v.to_uppercase()));
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"a": [{"b": "X"}, {"b": ["Y", "Z"]}]}));
    }

    #[test]
    fn test_transform_deep_containers() {
        let mut hash = tree(json!({"a": {"b": "x", "c": ["y"]}}));
        hash.transform_fields("a", |v| Some(format!("<{}>", v)));
        assert_eq!(hash_to_json(&hash).unwrap(), json!({"a": {"b": "<x>", "c": ["<y>"]}}));
    }

    #[test]
    fn test_transform_removes_and_unwraps() {
        let mut hash = tree(json!({"tags": ["x", "y"], "only": "x"}));
        hash.transform_fields("tags", |v| (v != "x").then(|| v.to_uppercase()));
        hash.transform_fields("only", |v| (v != "x").then(|| v.to_string()));

        assert_eq!(hash_to_json(&hash).unwrap(), json!({"tags": "Y"}));
    }

    #[test]
    fn test_transform_array_element() {
        let mut hash = tree(json!({"a": ["x", "y"]}));
        hash.transform_fields("a.2", |v| Some(v.to_uppercase()));
        assert_eq!(hash.get_field("a").unwrap(), &list(&["x", "Y"]));

        hash.transform_fields("a.1", |_| None);
        assert_eq!(hash.get_field("a").unwrap(), &list(&["Y"]));
        assert_eq!(hash.find("a.1").unwrap().path(), Some("a.1"));
    }
}
