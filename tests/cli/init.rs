use anyhow::{Context, Result};
use serde_json::Value;

use crate::CliTest;

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("Created .dmdescrc.json"));

    let content = test.read_file(".dmdescrc.json")?;
    let parsed: Value = serde_json::from_str(&content).context("Config should be valid JSON")?;
    assert_eq!(parsed["outputDir"], "META-INF/dependencymanager");
    assert_eq!(parsed["continueOnError"], false);
    assert_eq!(parsed["verifyFilters"], true);
    assert_eq!(parsed["ignoredInterfaces"][0], "scala.ScalaObject");

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".dmdescrc.json", "{}")?;

    let output = test.command().arg("init").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.contains(".dmdescrc.json already exists"));
    assert_eq!(test.read_file(".dmdescrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;
    test.command().arg("init").output()?;
    test.write_file(
        "impl.json",
        r#"{ "name": "a.Impl", "annotations": [{ "kind": "Component" }] }"#,
    )?;

    let output = test.build_command().arg("impl.json").output()?;
    assert!(
        output.status.success(),
        "Build should work with initialized config. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(())
}
