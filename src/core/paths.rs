use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static BROADRUN_HOME: OnceLock<PathBuf> = OnceLock::new();

/// Get the broadrun home directory
/// Checks BROADRUN_HOME environment variable, falls back to ${HOME}/.broadrun
pub fn broadrun_home() -> PathBuf {
    BROADRUN_HOME
        .get_or_init(|| {
            if let Ok(path) = std::env::var("BROADRUN_HOME") {
                PathBuf::from(path)
            } else {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".broadrun")
            }
        })
        .clone()
}

/// Default location of the pipeline configuration file
pub fn default_config_path() -> PathBuf {
    broadrun_home().join("config.toml")
}

/// Expand a leading `~` and make the path absolute.
///
/// Relative paths are resolved against the current directory. The path does
/// not need to exist.
pub fn expand_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_keeps_absolute() {
        assert_eq!(expand_path("/opt/gatk"), PathBuf::from("/opt/gatk"));
    }

    #[test]
    fn test_expand_path_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/tools/picard"), home.join("tools/picard"));
        }
    }

    #[test]
    fn test_expand_path_relative_is_absolute() {
        let expanded = expand_path("jars");
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("jars"));
    }
}
