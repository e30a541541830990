use crate::controller::messenger::Messenger;
use crate::controller::{ControllerSettings, ConversationController};
use crate::image_ops::document::DocumentAssembler;
use crate::image_ops::image_types::PageEncoding;
use crate::image_ops::resize::{PercentRange, SizeLimit};
use crate::store::image_store::{ImageStore, MemoryImageStore};
use crate::store::pending_input::{MemoryPendingInputTracker, PendingInputTracker};
use envconfig::Envconfig;
use log::info;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envconfig::Error),
    #[error("percent range {min}..={max} is empty or starts at zero")]
    InvalidPercentRange { min: u32, max: u32 },
}

#[derive(Envconfig)]
pub struct EnvConfig {
    /// Chat platform credential
    #[envconfig(from = "BOT_TOKEN")]
    pub bot_token: String,

    // ------------------
    // Document settings
    /// Filename of delivered documents
    #[envconfig(from = "DOCUMENT_FILENAME", default = "converted.pdf")]
    pub document_filename: String,
    /// How pages are embedded: Jpeg (small, lossy) or Flate (lossless)
    #[envconfig(from = "PAGE_ENCODING", default = "Jpeg")]
    pub page_encoding: PageEncoding,
    #[envconfig(from = "JPEG_QUALITY", default = "90")]
    pub jpeg_quality: u8,

    // ------------------
    // Resize settings
    #[envconfig(from = "MIN_PERCENT", default = "1")]
    pub min_percent: u32,
    #[envconfig(from = "MAX_PERCENT", default = "200")]
    pub max_percent: u32,
    /// Max size of any resized page (width,height)
    #[envconfig(from = "MAX_TARGET_SIZE", default = "10000,10000")]
    pub max_target_size: SizeLimit,
    /// Keep waiting for a custom reply after an invalid one
    #[envconfig(from = "KEEP_WAITING_ON_INVALID_INPUT", default = "false")]
    pub keep_waiting_on_invalid_input: bool,
}

pub struct Config {
    pub bot_token: String,
    pub images: Arc<tokio::sync::RwLock<dyn ImageStore + Send + Sync>>,
    pub pending: Arc<tokio::sync::RwLock<dyn PendingInputTracker + Send + Sync>>,
    pub assembler: DocumentAssembler,
    pub settings: ControllerSettings,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_env_config(EnvConfig::init_from_env()?)
    }

    pub fn from_env_config(env_conf: EnvConfig) -> Result<Config, ConfigError> {
        if env_conf.min_percent == 0 || env_conf.min_percent > env_conf.max_percent {
            return Err(ConfigError::InvalidPercentRange {
                min: env_conf.min_percent,
                max: env_conf.max_percent,
            });
        }

        info!(
            "Using {} pages in {}",
            env_conf.page_encoding, env_conf.document_filename
        );
        let assembler = DocumentAssembler::new(
            env_conf.page_encoding,
            env_conf.jpeg_quality,
            Some(env_conf.document_filename),
        );

        let settings = ControllerSettings {
            percent_range: PercentRange {
                min: env_conf.min_percent,
                max: env_conf.max_percent,
            },
            size_limit: env_conf.max_target_size,
            keep_waiting_on_invalid_input: env_conf.keep_waiting_on_invalid_input,
        };

        Ok(Config {
            bot_token: env_conf.bot_token,
            images: Arc::new(tokio::sync::RwLock::new(MemoryImageStore::new())),
            pending: Arc::new(tokio::sync::RwLock::new(MemoryPendingInputTracker::new())),
            assembler,
            settings,
        })
    }

    pub fn into_controller(
        self,
        messenger: Arc<dyn Messenger + Send + Sync>,
    ) -> ConversationController {
        ConversationController::new(
            self.images,
            self.pending,
            self.assembler,
            messenger,
            self.settings,
        )
    }
}
