use std::{collections::HashMap, path::PathBuf};

pub const DEFAULT_PORT: u16 = 6380;

#[derive(Debug, Default)]
pub struct Config(pub HashMap<Parameter, String>);

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum Parameter {
    Dir,
    DbFilename,
    Port,
    Unknown,
}

impl Parameter {
    pub fn deserialize(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dir" => Ok(Parameter::Dir),
            "dbfilename" => Ok(Parameter::DbFilename),
            "port" => Ok(Parameter::Port),
            _ => Ok(Parameter::Unknown),
        }
    }
}

impl Config {
    /// Load config from `--name value` command line arguments, skipping the
    /// program name.
    pub fn from_args<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut current_key = None;
        for arg in args.into_iter().skip(1) {
            if let Some(current_key) = current_key.take() {
                config.0.insert(current_key, arg);
            } else if let Some(name) = arg.strip_prefix("--") {
                current_key = Some(Parameter::deserialize(name)?);
            } else {
                anyhow::bail!("invalid argument {:?}", arg)
            }
        }
        if let Some(key) = current_key {
            anyhow::bail!("missing value for {:?}", key)
        }
        config.0.remove(&Parameter::Unknown);
        Ok(config)
    }

    pub fn port(&self) -> anyhow::Result<u16> {
        match self.0.get(&Parameter::Port) {
            Some(port) => Ok(port.parse()?),
            None => Ok(DEFAULT_PORT),
        }
    }

    /// Where stories are persisted, if both `dir` and `dbfilename` are set.
    pub fn db_path(&self) -> Option<PathBuf> {
        let dir = self.0.get(&Parameter::Dir)?;
        let filename = self.0.get(&Parameter::DbFilename)?;
        Some(PathBuf::from(dir).join(filename))
    }
}
