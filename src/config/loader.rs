use crate::config::schema::{OutputConfig, ReportConfig};
use crate::error::{Error, Result};
use crate::output::{ReportRenderer, console::ConsoleOutput, json::JsonOutput};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ReportConfig> {
        let path = path.as_ref();
        let mut visited = HashSet::new();
        Self::load_with_inheritance(path, &mut visited, false)
    }

    fn load_with_inheritance(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        is_parent_load: bool,
    ) -> Result<ReportConfig> {
        let path = fs::canonicalize(path).map_err(|e| {
            Error::Config(format!("{}: {}", path.display(), e))
        })?;

        if visited.contains(&path) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }
        visited.insert(path.clone());

        let config = Self::load_file(&path)?;

        let final_config = if let Some(parent_path_str) = &config.extends {
            let parent_path = path.parent()
                .ok_or_else(|| Error::Config(format!(
                    "Cannot determine parent directory for {}",
                    path.display()
                )))?
                .join(parent_path_str);

            let parent_config = Self::load_with_inheritance(&parent_path, visited, true)?;
            Self::merge_configs(parent_config, config)
        } else {
            config
        };

        if !is_parent_load {
            final_config.validate().map_err(Error::Validation)?;
        }

        Ok(final_config)
    }

    fn load_file(path: &Path) -> Result<ReportConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn merge_configs(mut parent: ReportConfig, child: ReportConfig) -> ReportConfig {
        if !child.name.is_empty() {
            parent.name = child.name;
        }
        if !child.source.is_empty() {
            parent.source = child.source;
        }
        if child.max_null_fraction.is_some() {
            parent.max_null_fraction = child.max_null_fraction;
        }
        if child.output.is_some() {
            parent.output = child.output;
        }

        parent.extends = None;
        parent
    }

    /// Resolves `config.source` against the directory of `config_path`.
    pub fn source_path<P: AsRef<Path>>(config_path: P, config: &ReportConfig) -> PathBuf {
        let source = Path::new(&config.source);
        if source.is_absolute() {
            return source.to_path_buf();
        }
        config_path
            .as_ref()
            .parent()
            .map(|dir| dir.join(source))
            .unwrap_or_else(|| source.to_path_buf())
    }

    pub fn create_renderer(config: &ReportConfig) -> Box<dyn ReportRenderer> {
        match &config.output {
            Some(OutputConfig::Json { pretty }) => Box::new(JsonOutput::stdout(*pretty)),
            Some(OutputConfig::Console) | None => Box::new(ConsoleOutput::stdout(config.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::loader::DEFAULT_MAX_NULL_FRACTION;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_toml_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "report.toml", "name = \"Usage\"\nsource = \"jobs.csv\"\n");

        let cfg = ConfigLoader::load(&path).unwrap();
        assert_eq!(cfg.name, "Usage");
        assert_eq!(cfg.max_null_fraction, None);
        assert_eq!(cfg.max_null_fraction(), DEFAULT_MAX_NULL_FRACTION);
        assert_eq!(cfg.output, None);
        assert_eq!(ConfigLoader::source_path(&path, &cfg), dir.path().join("jobs.csv"));
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let yaml = write(
            &dir,
            "report.yaml",
            "name: Usage\nsource: /data/jobs.csv\noutput:\n  type: json\n",
        );
        let cfg = ConfigLoader::load(&yaml).unwrap();
        assert_eq!(cfg.output, Some(OutputConfig::Json { pretty: true }));
        assert_eq!(ConfigLoader::source_path(&yaml, &cfg), PathBuf::from("/data/jobs.csv"));

        let json = write(
            &dir,
            "report.json",
            r#"{"name": "Usage", "source": "jobs.csv", "max_null_fraction": 0.5, "output": {"type": "console"}}"#,
        );
        let cfg = ConfigLoader::load(&json).unwrap();
        assert_eq!(cfg.max_null_fraction(), 0.5);
        assert_eq!(cfg.output, Some(OutputConfig::Console));
    }

    #[test]
    fn child_overrides_parent() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "base.toml",
            "name = \"Base\"\nsource = \"jobs.csv\"\nmax_null_fraction = 0.6\n",
        );
        let child = write(
            &dir,
            "child.toml",
            "extends = \"base.toml\"\nname = \"Weekly\"\n[output]\ntype = \"json\"\npretty = false\n",
        );

        let cfg = ConfigLoader::load(&child).unwrap();
        assert_eq!(cfg.name, "Weekly");
        assert_eq!(cfg.source, "jobs.csv");
        assert_eq!(cfg.max_null_fraction(), 0.6);
        assert_eq!(cfg.output, Some(OutputConfig::Json { pretty: false }));
        assert_eq!(cfg.extends, None);
    }

    #[test]
    fn child_can_restore_default_threshold() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "base.toml",
            "name = \"Base\"\nsource = \"jobs.csv\"\nmax_null_fraction = 0.6\n",
        );
        let child = write(
            &dir,
            "child.toml",
            "extends = \"base.toml\"\nmax_null_fraction = 0.4\n",
        );

        let cfg = ConfigLoader::load(&child).unwrap();
        assert_eq!(cfg.max_null_fraction, Some(0.4));
        assert_eq!(cfg.max_null_fraction(), 0.4);
    }

    #[test]
    fn circular_inheritance_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.toml", "extends = \"b.toml\"\nname = \"A\"\nsource = \"x.csv\"\n");
        let b = write(&dir, "b.toml", "extends = \"a.toml\"\n");

        let err = ConfigLoader::load(&b).unwrap_err();
        assert!(err.to_string().contains("Circular inheritance"));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.toml", "name = \"\"\nsource = \"jobs.csv\"\nmax_null_fraction = 1.5\n");
        assert!(matches!(ConfigLoader::load(&path).unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "report.ini", "name=x");
        assert!(matches!(ConfigLoader::load(&path).unwrap_err(), Error::Config(_)));
    }
}
