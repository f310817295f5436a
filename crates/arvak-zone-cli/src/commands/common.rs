//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use arvak_zone::{Operation, ResidencyPolicy, RouterOptions, TopologyDescription, ZoneTopology};

/// Device file contents: the zone description plus optional router settings.
///
/// ```yaml
/// max_qubits: 6
/// zones:
///   - { id: 0, max_occupancy: 2 }
///   - { id: 1, max_occupancy: 4, min_occupancy: 1 }
/// edges: [[0, 1]]
/// router:
///   residency: persistent
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(flatten)]
    pub topology: TopologyDescription,
    #[serde(default)]
    pub router: RouterOptions,
}

/// A loaded device, ready for routing.
#[derive(Debug)]
pub struct Device {
    pub topology: ZoneTopology,
    pub router: RouterOptions,
}

/// Read a YAML or JSON file, choosing the format by extension.
///
/// Unknown extensions are tried as YAML, which also accepts JSON.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let ext = path_obj.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse JSON: {path}")),
        _ => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse YAML: {path}")),
    }
}

/// Load a device file and build its topology.
pub fn load_device(path: &str) -> Result<Device> {
    let config: DeviceConfig = read_structured(path)?;
    let topology = ZoneTopology::from_description(&config.topology)
        .with_context(|| format!("Invalid device description: {path}"))?;
    Ok(Device {
        topology,
        router: config.router,
    })
}

/// Load an operation list.
pub fn load_operations(path: &str) -> Result<Vec<Operation>> {
    read_structured(path)
}

/// Apply a command-line residency override to the device's router options.
pub fn resolve_options(file: RouterOptions, residency: Option<ResidencyPolicy>) -> RouterOptions {
    match residency {
        Some(residency) => RouterOptions { residency },
        None => file,
    }
}

/// Write a serializable value as JSON or YAML, choosing by extension.
pub fn write_structured<T: serde::Serialize>(value: &T, path: &str) -> Result<()> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("json");

    let content = match ext.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml_ng::to_string(value).context("Failed to encode YAML")?,
        _ => serde_json::to_string_pretty(value).context("Failed to encode JSON")?,
    };

    fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_zone::ZoneId;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_load_yaml_device_with_router_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "device.yaml",
            "zones:\n  - { id: 0, max_occupancy: 2 }\n  - { id: 1, max_occupancy: 3 }\nedges: [[0, 1]]\nrouter:\n  residency: persistent\n",
        );

        let device = load_device(&path).unwrap();
        assert_eq!(device.topology.zone_count(), 2);
        assert!(device.topology.is_adjacent(ZoneId(0), ZoneId(1)));
        assert_eq!(device.router.residency, ResidencyPolicy::Persistent);
    }

    #[test]
    fn test_load_json_device_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "device.json",
            r#"{"zones": [{"id": 0, "max_occupancy": 4}]}"#,
        );

        let device = load_device(&path).unwrap();
        assert_eq!(device.topology.max_qubits(), 4);
        assert_eq!(device.router, RouterOptions::default());
    }

    #[test]
    fn test_disconnected_device_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "device.yaml",
            "zones:\n  - { id: 0, max_occupancy: 1 }\n  - { id: 1, max_occupancy: 1 }\n",
        );

        let err = load_device(&path).unwrap_err();
        assert!(format!("{err:#}").contains("disconnected"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_operations("/nonexistent/arvak_zone_ops.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_residency_override() {
        let file = RouterOptions {
            residency: ResidencyPolicy::Adjacent,
        };
        assert_eq!(resolve_options(file, None), file);
        assert_eq!(
            resolve_options(file, Some(ResidencyPolicy::Persistent)).residency,
            ResidencyPolicy::Persistent
        );
    }
}
