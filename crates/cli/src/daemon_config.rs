//! Turns `--module NAME=PATH` command-line pairs into a [`daemon::DaemonConfig`].

use std::path::PathBuf;

use daemon::{DaemonConfig, ModuleConfig};

#[derive(Debug, thiserror::Error)]
pub enum ModuleSpecError {
    #[error("module spec {0:?} is not in NAME=PATH form")]
    Malformed(String),
}

pub fn parse_modules(specs: &[String]) -> Result<DaemonConfig, ModuleSpecError> {
    let mut modules = Vec::with_capacity(specs.len());
    for spec in specs {
        let (name, path) = spec
            .split_once('=')
            .ok_or_else(|| ModuleSpecError::Malformed(spec.clone()))?;
        if name.is_empty() || path.is_empty() {
            return Err(ModuleSpecError::Malformed(spec.clone()));
        }
        modules.push(ModuleConfig::new(name, PathBuf::from(path)));
    }
    Ok(DaemonConfig::new(modules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_pairs() {
        let config = parse_modules(&["data=/srv/data".to_string(), "home=/srv/home".to_string()]).unwrap();
        assert!(config.find("data").is_some());
        assert!(config.find("home").is_some());
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(parse_modules(&["data".to_string()]).is_err());
    }

    #[test]
    fn rejects_empty_name_or_path() {
        assert!(parse_modules(&["=/srv/data".to_string()]).is_err());
        assert!(parse_modules(&["data=".to_string()]).is_err());
    }
}
