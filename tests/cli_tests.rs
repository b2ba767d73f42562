#![cfg(feature = "cli")]

#[cfg(test)]
mod tests {
    use recfix::cli::{self, CheckOptions, CliError, RunOptions, execute_check, execute_run};
    use recfix::{FixError, Vars};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn script_file(script: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(script.to_string().as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn run_options(script: &NamedTempFile, input: &str) -> RunOptions {
        RunOptions {
            fix: script.path().to_path_buf(),
            input: Some(input.to_string()),
            ..Default::default()
        }
    }

    // ========================================================================
    // Run
    // ========================================================================

    #[test]
    fn test_run_stream_of_records() {
        let script = script_file(json!([
            {"kind": "call", "name": "upcase", "params": ["title"]},
            {"kind": "unless", "name": "exists", "params": ["id"], "then": [{"kind": "call", "name": "reject"}]}
        ]));
        let input = r#"{"id": "1", "title": "faust"}
            {"title": "no id"}
            [{"id": "2", "title": "ulysses"}]"#;

        let report = execute_run(&run_options(&script, input)).unwrap();

        assert_eq!(report.emitted, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(
            report.output,
            [r#"{"id":"1","title":"FAUST"}"#, r#"{"id":"2","title":"ULYSSES"}"#]
        );
    }

    #[test]
    fn test_run_flat_output() {
        let script = script_file(json!([{"kind": "call", "name": "add_field", "params": ["tags", "b"]}]));
        let mut options = run_options(&script, r#"{"tags": "a", "author": {"name": "Goethe"}}"#);
        options.flat = true;

        let report = execute_run(&options).unwrap();
        assert_eq!(report.output, ["tags.1\ta\ntags.2\tb\nauthor.name\tGoethe"]);
    }

    #[test]
    fn test_run_pretty_output() {
        let script = script_file(json!([]));
        let mut options = run_options(&script, r#"{"a": "b"}"#);
        options.pretty = true;

        let report = execute_run(&options).unwrap();
        assert_eq!(report.output, ["{\n  \"a\": \"b\"\n}"]);
    }

    #[test]
    fn test_run_with_variables() {
        let script = script_file(json!([{"kind": "call", "name": "set_field", "params": ["source", "$[source]"]}]));
        let mut options = run_options(&script, "{}");
        options.vars = cli::parse_vars(&["source=test".to_string()], None).unwrap();

        let report = execute_run(&options).unwrap();
        assert_eq!(report.output, [r#"{"source":"test"}"#]);
    }

    #[test]
    fn test_run_without_input() {
        let script = script_file(json!([]));
        let options = RunOptions {
            fix: script.path().to_path_buf(),
            ..Default::default()
        };
        assert!(matches!(execute_run(&options), Err(CliError::NoInput)));
    }

    #[test]
    fn test_run_invalid_input() {
        let script = script_file(json!([]));
        assert!(matches!(
            execute_run(&run_options(&script, "{not json")),
            Err(CliError::Json(_))
        ));
        assert!(matches!(
            execute_run(&run_options(&script, r#""just a string""#)),
            Err(CliError::Fix(FixError::TypeMismatch { .. }))
        ));
    }

    // ========================================================================
    // Check
    // ========================================================================

    #[test]
    fn test_check_counts_nested_operations() {
        let script = script_file(json!([
            {"kind": "call", "name": "vacuum"},
            {"kind": "if", "name": "exists", "params": ["a"],
             "then": [{"kind": "call", "name": "reject"}],
             "else": [{"kind": "call", "name": "trim", "params": ["b"]}]}
        ]));
        let options = CheckOptions {
            fix: script.path().to_path_buf(),
            vars: Vars::new(),
        };
        assert_eq!(execute_check(&options).unwrap().operations, 4);
    }

    #[test]
    fn test_check_reports_configuration_errors() {
        let script = script_file(json!([{"kind": "if", "name": "matches", "params": ["a", "b"]}]));
        let options = CheckOptions {
            fix: script.path().to_path_buf(),
            vars: Vars::new(),
        };
        let err = execute_check(&options).unwrap_err();
        assert!(err.to_string().contains("Missing quantifier"));
    }

    // ========================================================================
    // Variables
    // ========================================================================

    #[test]
    fn test_parse_vars() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"a": "from file", "b": "kept"}"#).unwrap();
        file.flush().unwrap();

        let vars = cli::parse_vars(&["a=override".to_string(), "c=x=y".to_string()], Some(file.path())).unwrap();
        assert_eq!(vars.get("a").map(String::as_str), Some("override"));
        assert_eq!(vars.get("b").map(String::as_str), Some("kept"));
        assert_eq!(vars.get("c").map(String::as_str), Some("x=y"));
    }

    #[test]
    fn test_parse_vars_rejects_bare_names() {
        assert!(matches!(
            cli::parse_vars(&["oops".to_string()], None),
            Err(CliError::InvalidVar(_))
        ));
    }
}
