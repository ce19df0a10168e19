//! Configuration management for the media gateway.
//!
//! Every option is a command-line flag with an environment variable fallback
//! and, where it makes sense, a default. The parsed structs are immutable and
//! handed to components at startup; nothing reads the environment later.
//!
//! # Environment Variables
//!
//! - `HOST`, `PORT` - Bind address (default: 0.0.0.0:3000)
//! - `MONGO_DB_HOST`, `MONGO_DB_PORT`, `MONGO_DATABASE`, `MONGO_USER`, `MONGO_PASSWORD` - Database
//! - `SMTP_HOST`, `SEND_MAIL_AUTH_USER`, `SEND_MAIL_AUTH_PASSWORD` - Outbound mail
//! - `JWT_SECRET`, `JWT_EXPIRATION_IN_MINUTES` - Bearer tokens
//! - `OTP_EXPIRATION` - One-time code lifetime in minutes
//! - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`, `AWS_BUCKET_NAME`, `S3_ENDPOINT` - Object store
//! - `THUMBNAIL_FAILURE_POLICY` - `skip` or `fail`
//! - `CORS_ORIGINS` - Comma-separated allowed origins

use clap::{Args, Parser, Subcommand};

use crate::auth::{MAX_OTP_LIFETIME_MINUTES, MAX_TOKEN_LIFETIME_MINUTES};
use crate::storage::ThumbnailFailurePolicy;

// =============================================================================
// Default Values
// =============================================================================

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MONGO_HOST: &str = "127.0.0.1";
pub const DEFAULT_MONGO_PORT: u16 = 27017;
pub const DEFAULT_MONGO_DATABASE: &str = "dbname";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_JWT_SECRET: &str = "mysecretkey";

/// Access token lifetime (one day).
pub const DEFAULT_JWT_EXPIRATION_MINUTES: u64 = 1440;

/// One-time code lifetime.
pub const DEFAULT_OTP_EXPIRATION_MINUTES: u64 = 5;

// =============================================================================
// CLI
// =============================================================================

/// Media Gateway - authenticated image uploads to S3.
///
/// Validates multipart uploads, converts HEIC to JPEG, renders thumbnails
/// and stores everything in S3 or an S3-compatible service. Running without
/// a subcommand starts the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "media-gateway")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The selected subcommand; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeConfig),

    /// Print a signed bearer token
    Token(TokenConfig),

    /// Check bucket access and optionally presign a key
    Check(CheckConfig),
}

// =============================================================================
// Shared Sections
// =============================================================================

/// Object store connection.
#[derive(Args, Debug, Clone)]
pub struct S3Args {
    /// Bucket objects are written to.
    #[arg(long = "s3-bucket", env = "AWS_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// AWS region.
    #[arg(long = "s3-region", default_value = DEFAULT_REGION, env = "AWS_REGION")]
    pub region: String,

    /// Custom endpoint for S3-compatible services (MinIO, etc.).
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Access key id. The default AWS credential chain is used unless both
    /// key id and secret are set.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,
}

impl S3Args {
    /// Bucket name, empty when unset.
    pub fn bucket(&self) -> &str {
        self.bucket.as_deref().unwrap_or_default()
    }

    /// Explicit credentials, when both parts are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.bucket().is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or AWS_BUCKET_NAME".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Database Configuration
    // =========================================================================
    #[arg(long, default_value = DEFAULT_MONGO_HOST, env = "MONGO_DB_HOST")]
    pub mongo_host: String,

    #[arg(long, default_value_t = DEFAULT_MONGO_PORT, env = "MONGO_DB_PORT")]
    pub mongo_port: u16,

    #[arg(long, default_value = DEFAULT_MONGO_DATABASE, env = "MONGO_DATABASE")]
    pub mongo_database: String,

    #[arg(long, env = "MONGO_USER")]
    pub mongo_user: Option<String>,

    #[arg(long, env = "MONGO_PASSWORD", hide_env_values = true)]
    pub mongo_password: Option<String>,

    // =========================================================================
    // Mail Configuration
    // =========================================================================
    /// SMTP relay host.
    #[arg(long, default_value = DEFAULT_SMTP_HOST, env = "SMTP_HOST")]
    pub smtp_host: String,

    /// SMTP account, also used as the sender address.
    ///
    /// Mail is disabled unless both user and password are set.
    #[arg(long, env = "SEND_MAIL_AUTH_USER")]
    pub mail_user: Option<String>,

    #[arg(long, env = "SEND_MAIL_AUTH_PASSWORD", hide_env_values = true)]
    pub mail_password: Option<String>,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// HS256 secret for bearer tokens.
    #[arg(long, default_value = DEFAULT_JWT_SECRET, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime in minutes.
    #[arg(long, default_value_t = DEFAULT_JWT_EXPIRATION_MINUTES, env = "JWT_EXPIRATION_IN_MINUTES")]
    pub jwt_expiration_minutes: u64,

    /// One-time code lifetime in minutes.
    #[arg(long, default_value_t = DEFAULT_OTP_EXPIRATION_MINUTES, env = "OTP_EXPIRATION")]
    pub otp_expiration_minutes: u64,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    #[command(flatten)]
    pub s3: S3Args,

    /// What to do when a thumbnail cannot be rendered.
    #[arg(
        long,
        value_enum,
        default_value_t = ThumbnailFailurePolicy::Skip,
        env = "THUMBNAIL_FAILURE_POLICY"
    )]
    pub thumbnail_failure_policy: ThumbnailFailurePolicy,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.s3.validate()?;

        if self.jwt_secret.is_empty() {
            return Err("JWT secret must not be empty. Set --jwt-secret or JWT_SECRET".to_string());
        }
        check_lifetime(
            "jwt_expiration_minutes",
            self.jwt_expiration_minutes,
            MAX_TOKEN_LIFETIME_MINUTES,
        )?;
        check_lifetime(
            "otp_expiration_minutes",
            self.otp_expiration_minutes,
            MAX_OTP_LIFETIME_MINUTES,
        )?;

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// MongoDB connection string.
    pub fn database_uri(&self) -> String {
        self.format_database_uri(self.mongo_password.as_deref())
    }

    /// Connection string with the password masked, for logs.
    pub fn database_uri_redacted(&self) -> String {
        self.format_database_uri(self.mongo_password.as_ref().map(|_| "****"))
    }

    fn format_database_uri(&self, password: Option<&str>) -> String {
        let auth = match (self.mongo_user.as_deref(), password) {
            (Some(user), Some(password)) if !user.is_empty() => format!("{}:{}@", user, password),
            (Some(user), _) if !user.is_empty() => format!("{}@", user),
            _ => String::new(),
        };
        format!(
            "mongodb://{}{}:{}/{}",
            auth, self.mongo_host, self.mongo_port, self.mongo_database
        )
    }

    /// SMTP user and password, when both are present.
    pub fn mail_credentials(&self) -> Option<(&str, &str)> {
        match (&self.mail_user, &self.mail_password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Token
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct TokenConfig {
    /// Identity id placed in the token.
    #[arg(long)]
    pub id: String,

    /// Identity role placed in the token (e.g. "admin").
    #[arg(long)]
    pub role: String,

    /// HS256 secret; must match the server's.
    #[arg(long, default_value = DEFAULT_JWT_SECRET, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in minutes.
    #[arg(long, default_value_t = DEFAULT_JWT_EXPIRATION_MINUTES, env = "JWT_EXPIRATION_IN_MINUTES")]
    pub ttl_minutes: u64,

    /// Issue a refresh token (two minutes longer).
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.is_empty() {
            return Err("JWT secret must not be empty".to_string());
        }
        if self.id.is_empty() || self.role.is_empty() {
            return Err("--id and --role must not be empty".to_string());
        }
        check_lifetime("ttl_minutes", self.ttl_minutes, MAX_TOKEN_LIFETIME_MINUTES)
    }
}

fn check_lifetime(name: &str, minutes: u64, max: u64) -> Result<(), String> {
    if minutes == 0 {
        return Err(format!("{} must be greater than 0", name));
    }
    if minutes > max {
        return Err(format!("{} must be at most {}", name, max));
    }
    Ok(())
}

// =============================================================================
// Check
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub s3: S3Args,

    /// Presign this key after the bucket check.
    #[arg(long)]
    pub key: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.s3.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
