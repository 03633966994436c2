use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

pub const CONFIG_ENV: &str = "BIGE_GUARD_CONFIG";

pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self) -> Result<()>;
}

/// Resolves the config file: explicit path, then `$BIGE_GUARD_CONFIG`, then
/// `~/.config/bige-guard/guard.toml`.
pub fn config_path(path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home = env::var_os("HOME") // Unix/Linux/macOS
        .or_else(|| env::var_os("USERPROFILE")) // Windows
        .map(PathBuf::from);
    match home {
        Some(home) => Ok(home.join(".config").join("bige-guard").join("guard.toml")),
        None => bail!("could not determine home directory, please specify config path manually"),
    }
}

/// A completed config and where it was looked up.
pub struct LoadedConfig<T> {
    pub cfg: T,
    pub path: PathBuf,
    /// False when the file does not exist and defaults were used.
    pub found: bool,
}

/// Loads and completes a config. A missing file falls back to defaults, which
/// still go through `complete`, so required values (such as the token secret)
/// are enforced either way.
pub fn load_config<T>(path: Option<&Path>) -> Result<T>
where
    T: CommonConfig + DeserializeOwned,
{
    Ok(load_config_file(path)?.cfg)
}

/// Same as [`load_config`], but reports whether the file was found so the
/// caller can log it once logging is up.
pub fn load_config_file<T>(path: Option<&Path>) -> Result<LoadedConfig<T>>
where
    T: CommonConfig + DeserializeOwned,
{
    let path = config_path(path)?;
    let (mut cfg, found): (T, bool) = match fs::read_to_string(&path) {
        Ok(s) => {
            let cfg = toml::from_str(&s)
                .with_context(|| format!("parse config toml: {}", path.display()))?;
            (cfg, true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => (T::default(), false),
        Err(err) => {
            return Err(err).context(format!("read config file: {}", path.display()));
        }
    };

    cfg.complete().context("validate config")?;
    Ok(LoadedConfig { cfg, path, found })
}

/// Parses and completes a config from TOML text.
pub fn parse_config<T>(s: &str) -> Result<T>
where
    T: CommonConfig + DeserializeOwned,
{
    let mut cfg: T = toml::from_str(s).context("parse config toml")?;
    cfg.complete().context("validate config")?;
    Ok(cfg)
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct NameConfig {
        name: String,
    }

    impl CommonConfig for NameConfig {
        fn default() -> Self {
            Self {
                name: String::from("${BIGE_GUARD_TEST_NAME:-default}"),
            }
        }

        fn complete(&mut self) -> Result<()> {
            self.name = expandenv("name", &self.name)?;
            Ok(())
        }
    }

    #[test]
    fn test_load_config_file() {
        let loaded: LoadedConfig<NameConfig> =
            load_config_file(Some(Path::new("testdata/not-exists.toml"))).unwrap();
        assert!(!loaded.found);
        assert_eq!(loaded.path, Path::new("testdata/not-exists.toml"));
        assert_eq!(loaded.cfg.name, "default");

        let cfg: NameConfig = parse_config(r#"name = "guard""#).unwrap();
        assert_eq!(cfg.name, "guard");
    }
}
