pub mod config {
    use serde::Deserialize;
    use std::path::PathBuf;

    /// Which persistence backend the server stores tasks and projects in.
    #[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum StorageBackend {
        /// Two JSON array files under `data_dir`.
        #[default]
        File,
        /// A relational database reached through `db_url`.
        Database,
    }

    #[derive(Deserialize, Debug)]
    pub struct Config {
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default)]
        pub storage: StorageBackend,
        #[serde(default = "default_data_dir")]
        pub data_dir: PathBuf,
        #[serde(default)]
        pub db_url: Option<String>,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }

}
pub mod entities;
pub mod project;
pub mod store;
pub mod task;
pub mod web;
