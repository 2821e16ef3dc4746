//! Chart manifest patching.
//!
//! `values.yaml` is edited line by line so its comments survive; `Chart.yaml`
//! goes through a YAML mapping that keeps key order.

use std::fs;
use std::path::Path;

use serde_yml::{Mapping, Value};

use crate::error::{Error, Result};

const IMAGE_PREFIX: &str = "image:";

/// Point the values file at `image`.
///
/// Every line starting with `image:` becomes `image: <image>\n`; all other
/// lines are written back unchanged. Returns the number of replaced lines.
/// With no matching line the file is left as it was.
pub fn update_values(path: &Path, image: &str) -> Result<usize> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let (patched, replaced) = patch_values(&content, image);

    fs::write(path, patched).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })?;

    Ok(replaced)
}

fn patch_values(content: &str, image: &str) -> (String, usize) {
    let mut out = String::with_capacity(content.len() + image.len());
    let mut replaced = 0;

    for line in content.split_inclusive('\n') {
        if line.starts_with(IMAGE_PREFIX) {
            out.push_str(&format!("{} {}\n", IMAGE_PREFIX, image));
            replaced += 1;
        } else {
            out.push_str(line);
        }
    }

    (out, replaced)
}

/// Append `-<suffix>` to `version` and `appVersion` in a Chart.yaml.
pub fn update_chart(path: &Path, suffix: &str) -> Result<()> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", display))))?;

    let value: Value = serde_yml::from_str(&content)
        .map_err(|e| Error::chart_invalid(display.clone(), e.to_string()))?;
    let Value::Mapping(mut chart) = value else {
        return Err(Error::chart_invalid(display, "top level is not a mapping"));
    };

    for key in ["version", "appVersion"] {
        append_suffix(&mut chart, key, suffix, &display)?;
    }

    let rendered = serde_yml::to_string(&Value::Mapping(chart))
        .map_err(|e| Error::chart_invalid(display.clone(), e.to_string()))?;

    fs::write(path, rendered)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("write {}", display))))?;

    Ok(())
}

fn append_suffix(chart: &mut Mapping, key: &str, suffix: &str, display: &str) -> Result<()> {
    let entry = chart
        .get_mut(key)
        .ok_or_else(|| Error::chart_missing_key(key, display))?;

    match entry {
        Value::String(current) => {
            current.push('-');
            current.push_str(suffix);
            Ok(())
        }
        other => Err(Error::config_invalid_value(
            key,
            serde_yml::to_string(&*other).ok().map(|s| s.trim().to_string()),
            format!("{} in {} must be a string", key, display),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn values_replaces_only_image_line() {
        let dir = TempDir::new().unwrap();
        let original = "# Default values\nimage: old/repo:v0\n# keep me\nrbac:\n  install: true\n";
        let path = write(&dir, "values.yaml", original);

        let replaced = update_values(&path, "myrepo/tfjob:v1.2.3").unwrap();
        assert_eq!(replaced, 1);

        let updated = fs::read_to_string(&path).unwrap();
        let before: Vec<&str> = original.split_inclusive('\n').collect();
        let after: Vec<&str> = updated.split_inclusive('\n').collect();
        assert_eq!(before.len(), after.len());
        assert_eq!(after[1], "image: myrepo/tfjob:v1.2.3\n");
        for i in [0, 2, 3, 4] {
            assert_eq!(before[i], after[i]);
        }
    }

    #[test]
    fn values_ignores_indented_image_keys() {
        let (patched, replaced) = patch_values("sub:\n  image: x\n", "y");
        assert_eq!(replaced, 0);
        assert_eq!(patched, "sub:\n  image: x\n");
    }

    #[test]
    fn values_final_line_without_newline_gains_one() {
        let (patched, replaced) = patch_values("a: 1\nimage: old", "new:v2");
        assert_eq!(replaced, 1);
        assert_eq!(patched, "a: 1\nimage: new:v2\n");
    }

    // Known gap: with no `image:` line the new image is never applied.
    #[test]
    fn values_without_image_line_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let original = "# no image here\nreplicas: 1\n";
        let path = write(&dir, "values.yaml", original);

        let replaced = update_values(&path, "myrepo/tfjob:v1.2.3").unwrap();
        assert_eq!(replaced, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn chart_appends_suffix_to_both_versions() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Chart.yaml",
            "name: tf-job-operator-chart\nversion: \"1.0\"\nappVersion: \"1.0\"\nother: x\n",
        );

        update_chart(&path, "abc123").unwrap();

        let value: Value = serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["version"].as_str(), Some("1.0-abc123"));
        assert_eq!(value["appVersion"].as_str(), Some("1.0-abc123"));
        assert_eq!(value["other"].as_str(), Some("x"));
        assert_eq!(value["name"].as_str(), Some("tf-job-operator-chart"));
    }

    #[test]
    fn chart_keeps_key_order() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Chart.yaml",
            "name: c\ndescription: d\nversion: 0.1.0\nappVersion: 0.1.0\n",
        );

        update_chart(&path, "v1").unwrap();

        let value: Value = serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&str> = value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["name", "description", "version", "appVersion"]);
    }

    #[test]
    fn chart_missing_app_version_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Chart.yaml", "version: 0.1.0\n");

        let err = update_chart(&path, "v1").unwrap_err();
        assert_eq!(err.code, ErrorCode::ChartMissingKey);
        assert_eq!(err.details["key"], "appVersion");
    }

    #[test]
    fn chart_numeric_version_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Chart.yaml", "version: 1.0\nappVersion: \"1.0\"\n");

        let err = update_chart(&path, "v1").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn chart_not_a_mapping_fails() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Chart.yaml", "- a\n- b\n");

        let err = update_chart(&path, "v1").unwrap_err();
        assert_eq!(err.code, ErrorCode::ChartInvalid);
    }
}
