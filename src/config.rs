use std::error::Error;
use std::fs;
use std::path::Path;

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = "covref.toml";

const KNOWN_KEYS: &[&str] = &[
    "test_command",
    "reference",
    "remote",
    "push_refspec",
    "message",
    "identity",
    "env",
];

/// Settings read from `covref.toml`. Every field is optional; CLI flags win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub test_command: Option<String>,
    pub reference: Option<String>,
    pub remote: Option<String>,
    pub push_refspec: Option<String>,
    pub message: Option<String>,
    pub identity_name: Option<String>,
    pub identity_email: Option<String>,
    pub env: Vec<(String, String)>,
}

/// Load `covref.toml` from `dir`. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<FileConfig, Box<dyn Error>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    log::debug!("Reading configuration from '{}'", path.display());
    let contents = fs::read_to_string(&path)?;
    parse_config(&contents).map_err(|e| format!("{}: {}", path.display(), e).into())
}

pub fn parse_config(contents: &str) -> Result<FileConfig, Box<dyn Error>> {
    let value: toml::Value = contents.parse::<toml::Value>()?;
    let table = value.as_table().ok_or("configuration must be a table")?;
    for key in table.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            log::debug!("ignoring unknown configuration key '{}'", key);
        }
    }

    let mut config = FileConfig {
        test_command: string_field(table, "test_command")?,
        reference: string_field(table, "reference")?,
        remote: string_field(table, "remote")?,
        push_refspec: string_field(table, "push_refspec")?,
        message: string_field(table, "message")?,
        ..FileConfig::default()
    };

    if let Some(identity) = table.get("identity") {
        let identity = identity.as_table().ok_or("'identity' must be a table")?;
        config.identity_name = string_field(identity, "name")?;
        config.identity_email = string_field(identity, "email")?;
    }

    if let Some(env) = table.get("env") {
        let env = env.as_table().ok_or("'env' must be a table")?;
        for (key, value) in env {
            let value = value
                .as_str()
                .ok_or_else(|| format!("env.{} must be a string", key))?;
            config.env.push((key.clone(), value.to_string()));
        }
    }
    Ok(config)
}

fn string_field(
    table: &toml::map::Map<String, toml::Value>,
    key: &str,
) -> Result<Option<String>, Box<dyn Error>> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| format!("'{}' must be a string", key).into()),
    }
}
