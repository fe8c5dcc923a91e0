//! Writer configuration for the converter.
//!
//! Layers, lowest first: `WriterConfig` defaults, an optional YAML file
//! (with `${VAR}` and `${VAR:-default}` substitution), `CFRAD_*`
//! environment variables, then command-line flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cfradial_writer::{OutputFormat, WriterConfig};

/// Options the command line can force on top of file and environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub format: Option<OutputFormat>,
    pub write_individual_sweeps: bool,
    pub force_ragged: bool,
    pub no_compression: bool,
    pub append_day_dir: bool,
    pub append_year_dir: bool,
}

impl CliOverrides {
    fn apply(&self, config: &mut WriterConfig) {
        if let Some(format) = self.format {
            config.format = format;
        }
        // Flags only ever switch behavior on
        config.write_individual_sweeps |= self.write_individual_sweeps;
        config.force_ragged |= self.force_ragged;
        config.append_day_dir |= self.append_day_dir;
        config.append_year_dir |= self.append_year_dir;
        if self.no_compression {
            config.compressed = false;
        }
    }
}

/// Read a writer config YAML file, expanding environment references.
pub fn load_writer_config<P: AsRef<Path>>(path: P) -> Result<WriterConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read writer config from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;

    let config: WriterConfig =
        serde_yaml::from_str(&expanded).with_context(|| "Failed to parse writer config YAML")?;

    Ok(config)
}

/// Build the effective writer configuration.
pub fn resolve_writer_config(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<WriterConfig> {
    let mut config = match config_path {
        Some(path) => load_writer_config(path)?,
        None => WriterConfig::default(),
    };
    config.apply_env();
    overrides.apply(&mut config);
    config.validate().context("Invalid writer configuration")?;
    Ok(config)
}

/// Expand environment variables in text.
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("RADX_TEST_PREFIX", "spol.");
        let result = expand_env_vars("file_prefix: ${RADX_TEST_PREFIX}").unwrap();
        assert_eq!(result, "file_prefix: spol.");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("RADX_TEST_UNSET");
        let result = expand_env_vars("compression_level: ${RADX_TEST_UNSET:-6}").unwrap();
        assert_eq!(result, "compression_level: 6");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("RADX_TEST_REQUIRED");
        assert!(expand_env_vars("${RADX_TEST_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_load_yaml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.yaml");
        fs::write(
            &path,
            "format: json\nfile_prefix: ${RADX_TEST_NOT_SET:-spol.}\ninclude_site_name: true\n",
        )
        .unwrap();

        let config = load_writer_config(&path).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.file_prefix, "spol.");
        assert!(config.include_site_name);
        // untouched keys keep their defaults
        assert_eq!(config.compression_level, 4);
    }

    #[test]
    fn test_cli_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.yaml");
        fs::write(&path, "format: json\ncompressed: true\n").unwrap();

        let overrides = CliOverrides {
            format: Some(OutputFormat::Netcdf),
            write_individual_sweeps: true,
            no_compression: true,
            ..Default::default()
        };
        let config = resolve_writer_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.format, OutputFormat::Netcdf);
        assert!(config.write_individual_sweeps);
        assert!(!config.compressed);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.yaml");
        fs::write(&path, "compression_level: 12\n").unwrap();

        assert!(resolve_writer_config(Some(&path), &CliOverrides::default()).is_err());
    }
}
