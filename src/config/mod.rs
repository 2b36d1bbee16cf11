//! Configuration sources: the process environment and the per-user token store.

mod env;
mod user_config;

pub use env::{
    CLIENT_ID_ENV, CLIENT_SECRET_ENV, DEFAULT_HOSTNAME, EnvConfig, HOSTNAME_ENV, LOG_LEVEL_ENV,
    TOKEN_ENV,
};
pub use user_config::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, HostCredential, TokenStore, UserConfig};
