use migration_linter::{
    data_migration::{
        Callable, DataMigrationInspector, FunctionSource, MODEL_IMPORT, MODEL_VARIABLE_NAME,
        RUNPYTHON_ARGS_NAMING_CONVENTION, RUNPYTHON_REVERSIBLE, RUNSQL_REVERSIBLE, RunPython,
        RunSql, SqlSource, SqlStatement, classify_model_access
    },
    migration::Operation,
    rules::{self, AnalysisReport, ExcludeSet, Severity}
};
use serde_json::json;

fn function(name: &str, source: &str) -> FunctionSource {
    FunctionSource::new(name, ["apps", "schema_editor"], source)
}

fn inspect_python(run_python: &RunPython, exclude: &ExcludeSet) -> AnalysisReport {
    DataMigrationInspector::new(rules::postgresql(), exclude).lint_run_python(run_python)
}

fn inspect_sql(run_sql: &RunSql) -> AnalysisReport {
    DataMigrationInspector::new(rules::postgresql(), &ExcludeSet::new()).lint_run_sql(run_sql)
}

fn reversible(code: FunctionSource) -> RunPython {
    RunPython {
        code:         code.into(),
        reverse_code: Some(function("noop", "def noop(apps, schema_editor):\n    pass\n").into())
    }
}

#[test]
fn test_model_used_without_get_model() {
    let source = "def forwards(apps, schema_editor):\n    MyModel.objects.filter(pk=1).update(flag=True)\n";
    let findings = classify_model_access(&function("forwards", source));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Error);
    assert_eq!(findings[0].issue.code, MODEL_IMPORT);
    assert!(findings[0].issue.message.contains("'forwards'"));
    assert!(findings[0].issue.message.contains("MyModel"));
}

#[test]
fn test_model_used_after_get_model() {
    let source = "def forwards(apps, schema_editor):\n    MyModel = apps.get_model(\"app\", \"MyModel\")\n    MyModel.objects.filter(pk=1).update(flag=True)\n";
    assert!(classify_model_access(&function("forwards", source)).is_empty());
}

#[test]
fn test_get_model_after_first_use_is_flagged() {
    let source = "def forwards(apps, schema_editor):\n    MyModel.objects.all()\n    MyModel = apps.get_model(\"app\", \"MyModel\")\n";
    let findings = classify_model_access(&function("forwards", source));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].issue.code, MODEL_IMPORT);
}

#[test]
fn test_each_model_reported_once() {
    let source = "def forwards(apps, schema_editor):\n    Book.objects.all()\n    Book.objects.first()\n    Author.objects.all()\n";
    let findings = classify_model_access(&function("forwards", source));
    let codes: Vec<&str> = findings.iter().map(|f| f.issue.code.as_str()).collect();
    assert_eq!(codes, vec![MODEL_IMPORT, MODEL_IMPORT]);
    assert!(findings[0].issue.message.contains("Book"));
    assert!(findings[1].issue.message.contains("Author"));
}

#[test]
fn test_variable_named_unlike_model() {
    let source = "def forwards(apps, schema_editor):\n    Model = apps.get_model(\"app\", \"Book\")\n    Model.objects.all()\n";
    let findings = classify_model_access(&function("forwards", source));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(findings[0].issue.code, MODEL_VARIABLE_NAME);
}

#[test]
fn test_dotted_model_label() {
    let source = "def forwards(apps, schema_editor):\n    Book = apps.get_model(\"library.Book\")\n    Book.objects.all()\n";
    assert!(classify_model_access(&function("forwards", source)).is_empty());
}

#[test]
fn test_irreversible_run_python() {
    let source = "def forwards(apps, schema_editor):\n    pass\n";
    let run_python = RunPython {
        code:         function("forwards", source).into(),
        reverse_code: None
    };
    let report = inspect_python(&run_python, &ExcludeSet::new());
    assert_eq!(report.warning_codes(), vec![RUNPYTHON_REVERSIBLE]);
    assert!(report.errors.is_empty());
    assert!(report.warnings[0].message.contains("'forwards'"));
}

#[test]
fn test_args_naming_convention() {
    let run_python = reversible(FunctionSource::new(
        "forwards",
        ["registry", "editor"],
        "def forwards(registry, editor):\n    pass\n"
    ));
    let report = inspect_python(&run_python, &ExcludeSet::new());
    assert_eq!(report.warning_codes(), vec![RUNPYTHON_ARGS_NAMING_CONVENTION]);
}

#[test]
fn test_partial_unwraps_to_function() {
    let inner = FunctionSource::new(
        "forwards",
        ["value", "apps", "schema_editor"],
        "def forwards(value, apps, schema_editor):\n    Book.objects.update(flag=value)\n"
    );
    let run_python = RunPython {
        code:         Callable::Partial {
            func:     Box::new(inner.into()),
            args:     vec![json!(true)],
            keywords: Default::default()
        },
        reverse_code: None
    };
    assert_eq!(run_python.code.name(), "forwards");
    assert_eq!(run_python.code.effective_params(), vec!["apps", "schema_editor"]);

    let report = inspect_python(&run_python, &ExcludeSet::new());
    assert_eq!(report.warning_codes(), vec![RUNPYTHON_REVERSIBLE]);
    assert_eq!(report.error_codes(), vec![MODEL_IMPORT]);
}

#[test]
fn test_partial_keyword_binding() {
    let inner = FunctionSource::new(
        "forwards",
        ["apps", "schema_editor", "batch_size"],
        "def forwards(apps, schema_editor, batch_size):\n    pass\n"
    );
    let mut keywords = indexmap::IndexMap::new();
    keywords.insert("batch_size".to_string(), json!(500));
    let callable = Callable::Partial {
        func: Box::new(inner.into()),
        args: Vec::new(),
        keywords
    };
    assert_eq!(callable.effective_params(), vec!["apps", "schema_editor"]);
}

#[test]
fn test_reverse_callback_is_inspected() {
    let run_python = RunPython {
        code:         function(
            "forwards",
            "def forwards(apps, schema_editor):\n    Book = apps.get_model(\"library\", \"Book\")\n    Book.objects.all()\n"
        )
        .into(),
        reverse_code: Some(
            function(
                "backwards",
                "def backwards(apps, schema_editor):\n    Book.objects.all().delete()\n"
            )
            .into()
        )
    };
    let report = inspect_python(&run_python, &ExcludeSet::new());
    assert_eq!(report.error_codes(), vec![MODEL_IMPORT]);
    assert!(report.errors[0].message.contains("'backwards'"));
}

#[test]
fn test_excluded_inspector_codes_are_ignored() {
    let run_python = RunPython {
        code:         function(
            "forwards",
            "def forwards(apps, schema_editor):\n    Book.objects.all()\n"
        )
        .into(),
        reverse_code: None
    };
    let exclude: ExcludeSet = [RUNPYTHON_REVERSIBLE, MODEL_IMPORT]
        .iter()
        .map(|c| (*c).into())
        .collect();
    let report = inspect_python(&run_python, &exclude);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(report.ignored_codes(), vec![RUNPYTHON_REVERSIBLE, MODEL_IMPORT]);
}

#[test]
fn test_run_sql_without_reverse() {
    let run_sql = RunSql {
        sql:         SqlSource::Single(r#"UPDATE "library_book" SET "flag" = true;"#.to_string()),
        reverse_sql: None
    };
    let report = inspect_sql(&run_sql);
    assert_eq!(report.warning_codes(), vec![RUNSQL_REVERSIBLE]);
    assert!(report.errors.is_empty());
}

#[test]
fn test_run_sql_statements_go_through_rule_set() {
    let run_sql = RunSql {
        sql:         SqlSource::Single(r#"ALTER TABLE "library_book" DROP COLUMN "isbn";"#.to_string()),
        reverse_sql: Some(SqlSource::Single(
            r#"ALTER TABLE "library_book" RENAME COLUMN "a" TO "b";"#.to_string()
        ))
    };
    let report = inspect_sql(&run_sql);
    assert!(report.warnings.is_empty());
    assert_eq!(report.error_codes(), vec!["DROP_COLUMN", "RENAME_COLUMN"]);
}

#[test]
fn test_run_sql_noop_reverse_is_reversible() {
    let run_sql = RunSql {
        sql:         SqlSource::Single(r#"UPDATE "a" SET "f" = 1;"#.to_string()),
        reverse_sql: Some(SqlSource::Many(Vec::new()))
    };
    assert!(inspect_sql(&run_sql).is_empty());
}

#[test]
fn test_run_sql_params_are_substituted() {
    let run_sql = RunSql {
        sql:         SqlSource::Many(vec![SqlStatement::WithParams(
            "ALTER TABLE %s DROP COLUMN %s;".to_string(),
            vec![json!("\"library_book\""), json!("\"isbn\"")]
        )]),
        reverse_sql: None
    };
    let report = inspect_sql(&run_sql);
    assert_eq!(report.error_codes(), vec!["DROP_COLUMN"]);
    assert_eq!(report.errors[0].table.as_deref(), Some("library_book"));
    assert_eq!(report.errors[0].column.as_deref(), Some("isbn"));
}

#[test]
fn test_inspect_walks_operations_in_order() {
    let operations = vec![
        Operation::Schema {
            description: "Add field flag to book".to_string()
        },
        Operation::RunSql(RunSql {
            sql:         SqlSource::Single(r#"UPDATE "a" SET "f" = 1;"#.to_string()),
            reverse_sql: None
        }),
        Operation::RunPython(RunPython {
            code:         function("forwards", "def forwards(apps, schema_editor):\n    pass\n")
                .into(),
            reverse_code: None
        })
    ];
    let exclude = ExcludeSet::new();
    let report = DataMigrationInspector::new(rules::base(), &exclude).inspect(&operations);
    assert_eq!(report.warning_codes(), vec![RUNSQL_REVERSIBLE, RUNPYTHON_REVERSIBLE]);
}

#[test]
fn test_operations_deserialize_from_yaml() {
    let yaml = r#"
- kind: run_python
  code:
    partial:
      func:
        function:
          name: forwards
          params: [value, apps, schema_editor]
          source: "def forwards(value, apps, schema_editor): pass"
      args: [1]
  reverse_code:
    function:
      name: backwards
      params: [apps, schema_editor]
- kind: run_sql
  sql:
    - "UPDATE a SET f = 1;"
    - ["UPDATE a SET g = %s;", [2]]
  reverse_sql: ""
- kind: ignore_migration
"#;
    let operations: Vec<Operation> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(operations.len(), 3);
    match &operations[0] {
        Operation::RunPython(run_python) => {
            assert!(run_python.reversible());
            assert_eq!(run_python.code.effective_params(), vec!["apps", "schema_editor"]);
        }
        other => panic!("unexpected operation: {:?}", other)
    }
    match &operations[1] {
        Operation::RunSql(run_sql) => {
            assert!(run_sql.reversible());
            assert_eq!(
                run_sql.sql.statements(),
                vec!["UPDATE a SET f = 1;", "UPDATE a SET g = 2;"]
            );
            assert!(run_sql.reverse_sql.as_ref().is_some_and(SqlSource::is_noop));
        }
        other => panic!("unexpected operation: {:?}", other)
    }
    assert_eq!(operations[2], Operation::IgnoreMigration);
}
