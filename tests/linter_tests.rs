use migration_linter::{
    data_migration::{FunctionSource, RUNPYTHON_REVERSIBLE, RunPython},
    linter::{
        LintResult, LintStatus, LintSummary, LinterOptions, MigrationLinter,
        RUNPYTHON_MIXED_OPERATIONS
    },
    migration::{Migration, Operation},
    rules::{self, ExcludeSet}
};

fn linter(options: LinterOptions) -> MigrationLinter {
    MigrationLinter::new(rules::postgresql().clone(), options)
}

fn run_python(reversible: bool) -> Operation {
    let function = |name: &str| {
        FunctionSource::new(
            name,
            ["apps", "schema_editor"],
            format!("def {}(apps, schema_editor):\n    pass\n", name)
        )
    };
    Operation::RunPython(RunPython {
        code:         function("forwards").into(),
        reverse_code: reversible.then(|| function("backwards").into())
    })
}

fn schema(description: &str) -> Operation {
    Operation::Schema {
        description: description.to_string()
    }
}

fn drop_column() -> Migration {
    Migration::new("library", "0002_remove_book_isbn")
        .with_sql([r#"ALTER TABLE "library_book" DROP COLUMN "isbn" CASCADE;"#])
}

#[test]
fn test_clean_migration_is_ok() {
    let migration = Migration::new("library", "0001_initial")
        .with_sql([r#"CREATE TABLE "library_book" ("id" serial NOT NULL PRIMARY KEY);"#]);
    let result = linter(LinterOptions::default()).lint(&migration);
    assert_eq!(result.status, LintStatus::Ok);
    assert!(result.report.is_empty());
    assert!(!result.cached);
}

#[test]
fn test_erroneous_migration() {
    let result = linter(LinterOptions::default()).lint(&drop_column());
    assert_eq!(result.status, LintStatus::Error);
    assert!(result.has_errors());
    assert_eq!(result.report.error_codes(), vec!["DROP_COLUMN"]);
}

#[test]
fn test_excluded_code_gives_ok_ignored() {
    let mut exclude = ExcludeSet::new();
    exclude.insert("DROP_COLUMN".into());
    let options = LinterOptions {
        exclude_migration_tests: exclude,
        ..Default::default()
    };
    let result = linter(options).lint(&drop_column());
    assert_eq!(result.status, LintStatus::OkIgnored);
    assert!(result.status.is_valid());
    assert_eq!(result.report.ignored_codes(), vec!["DROP_COLUMN"]);
}

#[test]
fn test_warning_status() {
    let migration = Migration::new("library", "0003_book_title_idx")
        .with_sql([r#"CREATE INDEX "book_title_idx" ON "library_book" ("title");"#]);
    let result = linter(LinterOptions::default()).lint(&migration);
    assert_eq!(result.status, LintStatus::Warning);
    assert!(!result.status.is_valid());
}

#[test]
fn test_selected_warnings_promoted() {
    let migration = Migration::new("library", "0004_backfill")
        .with_sql([r#"CREATE INDEX "book_title_idx" ON "library_book" ("title");"#])
        .with_operations(vec![run_python(false)]);
    let options = LinterOptions {
        warnings_as_errors: vec![RUNPYTHON_REVERSIBLE.to_string()],
        ..Default::default()
    };
    let result = linter(options).lint(&migration);
    assert_eq!(result.status, LintStatus::Error);
    assert_eq!(result.report.error_codes(), vec![RUNPYTHON_REVERSIBLE]);
    assert_eq!(result.report.warning_codes(), vec!["CREATE_INDEX"]);
}

#[test]
fn test_all_warnings_promoted() {
    let migration = Migration::new("library", "0004_backfill")
        .with_sql([r#"CREATE INDEX "book_title_idx" ON "library_book" ("title");"#])
        .with_operations(vec![run_python(false)]);
    let options = LinterOptions {
        all_warnings_as_errors: true,
        ..Default::default()
    };
    let result = linter(options).lint(&migration);
    assert_eq!(result.status, LintStatus::Error);
    assert_eq!(result.report.error_codes(), vec!["CREATE_INDEX", RUNPYTHON_REVERSIBLE]);
    assert!(result.report.warnings.is_empty());
}

#[test]
fn test_ignored_issues_are_never_promoted() {
    let mut exclude = ExcludeSet::new();
    exclude.insert(RUNPYTHON_REVERSIBLE.into());
    let migration =
        Migration::new("library", "0004_backfill").with_operations(vec![run_python(false)]);
    let options = LinterOptions {
        exclude_migration_tests: exclude,
        all_warnings_as_errors: true,
        ..Default::default()
    };
    let result = linter(options).lint(&migration);
    assert_eq!(result.status, LintStatus::OkIgnored);
}

#[test]
fn test_mixed_operations() {
    let migration = Migration::new("library", "0005_mixed")
        .with_operations(vec![schema("Add field flag to book"), run_python(true)]);
    let result = linter(LinterOptions::default()).lint(&migration);
    assert_eq!(result.status, LintStatus::Error);
    assert_eq!(result.report.error_codes(), vec![RUNPYTHON_MIXED_OPERATIONS]);
}

#[test]
fn test_run_python_alone_is_not_mixed() {
    let migration =
        Migration::new("library", "0006_data").with_operations(vec![run_python(true)]);
    let result = linter(LinterOptions::default()).lint(&migration);
    assert_eq!(result.status, LintStatus::Ok);
}

#[test]
fn test_ignore_migration_operation() {
    let migration = drop_column().with_operations(vec![Operation::IgnoreMigration]);
    let linter = linter(LinterOptions::default());
    assert!(linter.should_ignore(&migration));
    let result = linter.lint(&migration);
    assert_eq!(result, LintResult::ignored("library", "0002_remove_book_isbn"));
    assert_eq!(result.status, LintStatus::Ignore);
}

#[test]
fn test_app_filters() {
    let migration = drop_column();
    let include_other = LinterOptions {
        include_apps: vec!["shop".to_string()],
        ..Default::default()
    };
    assert!(linter(include_other).should_ignore(&migration));

    let include_own = LinterOptions {
        include_apps: vec!["library".to_string()],
        ..Default::default()
    };
    assert!(!linter(include_own).should_ignore(&migration));

    let exclude_own = LinterOptions {
        exclude_apps: vec!["library".to_string()],
        ..Default::default()
    };
    assert!(linter(exclude_own).should_ignore(&migration));
}

#[test]
fn test_name_filters() {
    let migration = drop_column();
    let cases = [
        (
            LinterOptions {
                ignore_name: vec!["0002_remove_book_isbn".to_string()],
                ..Default::default()
            },
            true
        ),
        (
            LinterOptions {
                ignore_name_contains: Some("remove".to_string()),
                ..Default::default()
            },
            true
        ),
        (
            LinterOptions {
                include_name: vec!["0001_initial".to_string()],
                ..Default::default()
            },
            true
        ),
        (
            LinterOptions {
                include_name_contains: Some("isbn".to_string()),
                ..Default::default()
            },
            false
        ),
        (
            LinterOptions {
                include_name_contains: Some("squashed".to_string()),
                ..Default::default()
            },
            true
        )
    ];
    for (options, ignored) in cases {
        assert_eq!(linter(options.clone()).should_ignore(&migration), ignored, "{:?}", options);
    }
}

#[test]
fn test_summary_counts() {
    let linter = linter(LinterOptions::default());
    let results = vec![
        linter.lint(&Migration::new("library", "0001_initial")),
        linter.lint(&drop_column()),
        linter.lint(&drop_column().with_operations(vec![Operation::IgnoreMigration])),
        linter.lint(
            &Migration::new("library", "0003_idx")
                .with_sql([r#"CREATE INDEX "ix" ON "library_book" ("title");"#])
        )
    ];
    let summary = LintSummary::from_results(&results);
    assert_eq!(
        summary,
        LintSummary {
            valid:     1,
            erroneous: 1,
            warnings:  1,
            ignored:   1,
            total:     4
        }
    );
    assert!(summary.has_errors());
}

#[test]
fn test_status_display() {
    assert_eq!(LintStatus::Ok.to_string(), "OK");
    assert_eq!(LintStatus::OkIgnored.to_string(), "OK (ignored)");
    assert_eq!(LintStatus::Warning.to_string(), "WARNING");
    assert_eq!(LintStatus::Error.to_string(), "ERR");
    assert_eq!(LintStatus::Ignore.to_string(), "IGNORE");
}

#[test]
fn test_result_serializes_flat() {
    let result = linter(LinterOptions::default()).lint(&drop_column());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "ERROR");
    assert_eq!(json["errors"][0]["code"], "DROP_COLUMN");
    assert_eq!(json["errors"][0]["table"], "library_book");
    assert_eq!(json["cached"], false);
}
