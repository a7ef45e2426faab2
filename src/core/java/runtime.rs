use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A Java runtime that answered `-version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
    pub is_64bit: bool,
    pub vendor: String,
}

fn java_executable_name() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Look for a usable runtime: `JAVA_HOME` first, then `java` on `PATH`.
pub fn find_java() -> Option<JavaInstallation> {
    let mut candidates = Vec::new();
    if let Some(home) = std::env::var_os("JAVA_HOME").filter(|h| !h.is_empty()) {
        candidates.push(PathBuf::from(home).join("bin").join(java_executable_name()));
    }
    candidates.push(PathBuf::from(java_executable_name()));

    let found = candidates.iter().find_map(|candidate| probe_java(candidate));
    match &found {
        Some(java) => info!("Using Java {} at {:?}", java.version, java.path),
        None => debug!("No Java runtime found in JAVA_HOME or PATH"),
    }
    found
}

#[instrument]
pub fn probe_java(path: &Path) -> Option<JavaInstallation> {
    let output = Command::new(path)
        .args(["-XshowSettings:properties", "-version"])
        .output()
        .ok()?;
    parse_output(path, &output)
}

fn parse_output(path: &Path, output: &std::process::Output) -> Option<JavaInstallation> {
    let version_output = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    debug!(
        "Probing {:?}: {}",
        path,
        version_output.lines().next().unwrap_or("")
    );
    parse_version_output(path, &version_output)
}

fn parse_version_output(path: &Path, version_output: &str) -> Option<JavaInstallation> {
    let version = parse_version_string(version_output)?;
    let major = parse_major_version(&version);
    let lower = version_output.to_ascii_lowercase();
    let is_64bit = lower.contains("sun.arch.data.model = 64")
        || lower.contains("os.arch = amd64")
        || lower.contains("os.arch = x86_64")
        || lower.contains("os.arch = aarch64");

    // Un binario relativo se deja tal cual, el PATH lo resuelve al ejecutar.
    let path = if path.components().count() > 1 {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    };

    Some(JavaInstallation {
        path,
        version,
        major,
        is_64bit,
        vendor: parse_vendor(version_output),
    })
}

fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let end = line[start + 1..].find('"')?;
        Some(line[start + 1..start + 1 + end].to_string())
    })
}

fn parse_vendor(output: &str) -> String {
    for line in output.lines() {
        if line.contains("Temurin") {
            return "Temurin".to_string();
        }
        if line.contains("OpenJDK") {
            return "OpenJDK".to_string();
        }
    }
    "unknown".to_string()
}

fn parse_major_version(version: &str) -> u32 {
    let first_part = version.split('.').next().unwrap_or("0");
    let major: u32 = first_part.parse().unwrap_or(0);

    if major == 1 {
        version
            .split('.')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(major)
    } else {
        major
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_and_modern_major_versions() {
        assert_eq!(parse_major_version("1.8.0_392"), 8);
        assert_eq!(parse_major_version("17.0.9"), 17);
        assert_eq!(parse_major_version("21"), 21);
    }

    #[test]
    fn parses_version_banner() {
        let banner = "Property settings:\n    os.arch = amd64\n\n\
            openjdk version \"17.0.9\" 2023-10-17\n\
            OpenJDK Runtime Environment Temurin-17.0.9+9 (build 17.0.9+9)\n";
        let java = parse_version_output(Path::new("java"), banner).unwrap();
        assert_eq!(java.path, PathBuf::from("java"));
        assert_eq!(java.version, "17.0.9");
        assert_eq!(java.major, 17);
        assert!(java.is_64bit);
        assert_eq!(java.vendor, "Temurin");
    }

    #[test]
    fn garbage_output_is_not_java() {
        assert!(parse_version_output(Path::new("java"), "command not found").is_none());
    }

    #[test]
    fn missing_binary_is_not_java() {
        assert!(probe_java(Path::new("/nonexistent/bin/java")).is_none());
    }
}
