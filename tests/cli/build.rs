use anyhow::Result;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

use crate::CliTest;

const IMPL: &str = r#"{
    "name": "com.acme.Impl",
    "interfaces": ["com.acme.Api", "scala.ScalaObject"],
    "members": [
        { "kind": "field", "name": "log", "signature": "Lcom/acme/Log;",
          "annotations": [{ "kind": "ServiceDependency", "attrs": { "filter": "(level=debug)" } }] },
        { "kind": "method", "name": "start", "signature": "()V",
          "annotations": [{ "kind": "Start" }] }
    ],
    "annotations": [{
        "kind": "dm.annotation.api.Component",
        "attrs": { "properties": [{ "name": "port", "intValue": ["8080"] }] }
    }]
}"#;

const BROKEN: &str = r#"{
    "name": "com.acme.Broken",
    "members": [
        { "kind": "field", "name": "log", "signature": "Lcom/acme/Log;",
          "annotations": [{ "kind": "ServiceDependency" }] }
    ]
}"#;

#[test]
fn test_build_prints_descriptors() -> Result<()> {
    let test = CliTest::with_file("classes/impl.json", IMPL)?;

    let output = test.build_command().arg("classes").output()?;
    assert!(output.status.success());
    assert_snapshot!(String::from_utf8(output.stdout)?, @r#"
    # com.acme.Impl
    Component start="start" impl="com.acme.Impl" properties="{\"port\":{\"type\":\"java.lang.Integer\",\"value\":\"8080\"}}" provides="com.acme.Api"
    ServiceDependency service="com.acme.Log" autoConfig="log" filter="(level=debug)"

    Import-Service: com.acme.Log
    Export-Service: com.acme.Api
    "#);

    Ok(())
}

#[test]
fn test_build_apply_writes_files() -> Result<()> {
    let test = CliTest::with_file("classes/impl.json", IMPL)?;

    let output = test
        .build_command()
        .args(["classes", "--apply"])
        .output()?;
    assert!(output.status.success());

    let descriptor = test.read_file("META-INF/dependencymanager/com.acme.Impl")?;
    assert!(descriptor.starts_with("Component start=\"start\" impl=\"com.acme.Impl\""));
    assert_eq!(descriptor.lines().count(), 2);

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Wrote 1 descriptor to META-INF/dependencymanager"));

    Ok(())
}

#[test]
fn test_build_output_dir_flag() -> Result<()> {
    let test = CliTest::with_file("impl.json", IMPL)?;

    let output = test
        .build_command()
        .args(["impl.json", "--apply", "--output-dir", "out"])
        .output()?;
    assert!(output.status.success());
    assert!(test.root().join("out").join("com.acme.Impl").exists());

    Ok(())
}

#[test]
fn test_build_failure_aborts() -> Result<()> {
    let test = CliTest::with_file("classes/a.json", IMPL)?;
    test.write_file("classes/b.json", BROKEN)?;

    let output = test
        .build_command()
        .args(["classes", "--apply"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8(output.stdout)?, "");
    assert!(!test.root().join("META-INF").exists());

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.starts_with("error[structural]: the class must be annotated"));
    assert!(stderr.contains("--> class com.acme.Broken"));
    assert!(stderr.contains("build aborted after com.acme.Broken failed"));

    Ok(())
}

#[test]
fn test_build_continue_on_error() -> Result<()> {
    let test = CliTest::with_file("classes/a.json", IMPL)?;
    test.write_file("classes/b.json", BROKEN)?;

    let output = test
        .build_command()
        .args(["classes", "--apply", "--continue-on-error"])
        .output()?;
    assert_eq!(output.status.code(), Some(1));
    assert!(
        test.root()
            .join("META-INF/dependencymanager/com.acme.Impl")
            .exists()
    );
    assert!(String::from_utf8(output.stderr)?.contains("1 of 2 classes failed"));

    Ok(())
}

#[test]
fn test_config_controls_build() -> Result<()> {
    let test = CliTest::with_file(
        ".dmdescrc.json",
        r#"{ "ignoredInterfaces": ["com.acme.*"], "verifyFilters": false }"#,
    )?;
    test.write_file(
        "impl.json",
        r#"{ "name": "x.Impl", "interfaces": ["com.acme.Api", "x.Public"],
             "members": [{ "kind": "field", "name": "log", "signature": "Lx/Log;",
                           "annotations": [{ "kind": "ServiceDependency", "attrs": { "filter": "bogus" } }] }],
             "annotations": [{ "kind": "Component" }] }"#,
    )?;

    let output = test.build_command().arg("impl.json").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("provides=\"x.Public\""));
    assert!(stdout.contains("filter=\"bogus\""));

    Ok(())
}

#[test]
fn test_invalid_filter_fails_class() -> Result<()> {
    let test = CliTest::with_file(
        "impl.json",
        r#"{ "name": "x.Impl",
             "members": [{ "kind": "field", "name": "log", "signature": "Lx/Log;",
                           "annotations": [{ "kind": "ServiceDependency", "attrs": { "filter": "(a=1" } }] }],
             "annotations": [{ "kind": "Component" }] }"#,
    )?;

    let output = test.build_command().arg("impl.json").output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.starts_with("error[signature]: invalid filter (a=1"));
    assert!(stderr.contains("--> class x.Impl, member log, @ServiceDependency"));

    Ok(())
}

#[test]
fn test_missing_input_is_internal_error() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.build_command().arg("nowhere").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.contains("Path does not exist"));

    Ok(())
}

#[test]
fn test_invalid_config_is_internal_error() -> Result<()> {
    let test = CliTest::with_file(".dmdescrc.json", r#"{ "ignoredInterfaces": ["[bad"] }"#)?;
    test.write_file("impl.json", IMPL)?;

    let output = test.build_command().arg("impl.json").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.contains("ignoredInterfaces"));

    Ok(())
}
