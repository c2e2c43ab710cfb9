//! Configuration for the challenge service.
//!
//! CLI arguments and environment variable handling using clap. The
//! embedding binary parses `Args` once at startup and passes the derived
//! `Limits` value to the components that need it; there is no global
//! configuration object.

use clap::Parser;

/// Gauntlet - challenge board content service
#[derive(Parser, Debug, Clone)]
#[command(name = "gauntlet")]
#[command(about = "Challenge board content service")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "gauntlet")]
    pub mongodb_db: String,

    /// Maximum number of content items per post (enforced on append)
    #[arg(long, env = "MAX_CONTENT_PER_POST", default_value = "8")]
    pub max_content_per_post: usize,

    /// Upper bound on requested page sizes
    #[arg(long, env = "MAX_PAGE_SIZE", default_value = "50")]
    pub max_page_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Limits handed to the mutation and pagination layers.
///
/// Constructed once from `Args` at process start.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Per-post content cap, checked on append only
    pub max_content_per_post: usize,

    /// Hard ceiling for `first` in pagination requests
    pub max_page_size: usize,
}

impl Args {
    /// Load a `.env` file if present, then parse arguments and
    /// environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    /// Derive the limits value passed to components
    pub fn limits(&self) -> Limits {
        Limits {
            max_content_per_post: self.max_content_per_post,
            max_page_size: self.max_page_size,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_content_per_post == 0 {
            return Err("MAX_CONTENT_PER_POST must be at least 1".to_string());
        }
        if self.max_page_size == 0 {
            return Err("MAX_PAGE_SIZE must be at least 1".to_string());
        }
        Ok(())
    }
}
