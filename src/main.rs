//! Media Gateway - authenticated image uploads to S3.
//!
//! Parses the CLI, wires storage, mail and auth together and serves the router.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_gateway::{
    auth::{Identity, TokenIssuer},
    config::{CheckConfig, Cli, Command, ServeConfig, TokenConfig},
    create_s3_client,
    mail::Mailer,
    server::{create_router, AppState, RouterConfig},
    storage::{BlobStore, ObjectStoreGateway, S3BlobStore, SIGNED_URL_TTL},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Token(config) => run_token(config),
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let bucket = config.s3.bucket();

    print_banner();

    info!("Configuration:");
    info!("  Bucket: {}", bucket);
    if let Some(ref endpoint) = config.s3.endpoint {
        info!("  Endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3.region);
    info!(
        "  S3 credentials: {}",
        if config.s3.credentials().is_some() { "explicit" } else { "default provider chain" }
    );
    info!("  Database: {}", config.database_uri_redacted());
    info!("  Token lifetime: {} min", config.jwt_expiration_minutes);
    info!("  Thumbnail failures: {:?}", config.thumbnail_failure_policy);

    let mailer = build_mailer(&config);

    let s3_client = create_s3_client(
        config.s3.endpoint.as_deref(),
        &config.s3.region,
        config.s3.credentials(),
    )
    .await;

    info!("");
    info!("Checking bucket access...");
    match s3_client.head_bucket().bucket(bucket).send().await {
        Ok(_) => info!("  Bucket reachable"),
        Err(e) => {
            error!(bucket = %bucket, error = %e, "Bucket is not reachable");
            error!("  Uploads need write access to '{}'. Verify AWS_BUCKET_NAME,", bucket);
            error!("  the access key pair (or provider chain) and S3_ENDPOINT for MinIO.");
            return ExitCode::FAILURE;
        }
    }

    let gateway = ObjectStoreGateway::new(S3BlobStore::new(s3_client, bucket))
        .with_thumbnail_policy(config.thumbnail_failure_policy);

    let state = AppState::new(gateway)
        .with_mailer(mailer)
        .with_otp_minutes(config.otp_expiration_minutes);

    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Gateway listening on http://{}", addr);
    info!("");
    info!("  Quick check:");
    info!("    curl http://{}/health", addr);
    info!("    curl -H \"Authorization: Bearer $(media-gateway token --id 1 --role admin)\" \\");
    info!("         http://{}/api/test/test", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(address = %addr, error = %e, "Could not bind listener");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!(error = %e, "Server stopped");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("╔╦╗╔═╗╔╦╗╦╔═╗  ╔═╗╔═╗╔╦╗╔═╗╦ ╦╔═╗╦ ╦");
    info!("║║║║╣  ║║║╠═╣  ║ ╦╠═╣ ║ ║╣ ║║║╠═╣╚╦╝");
    info!("╩ ╩╚═╝═╩╝╩╩ ╩  ╚═╝╩ ╩ ╩ ╚═╝╚╩╝╩ ╩ ╩ ");
    info!("                               v{}", version);
    info!("");
}

/// Install the global tracing subscriber.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "media_gateway=debug,tower_http=debug"
    } else {
        "media_gateway=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// SMTP client, or None when mail is not configured.
fn build_mailer(config: &ServeConfig) -> Option<Mailer> {
    let Some((user, password)) = config.mail_credentials() else {
        warn!("  Mail: DISABLED - set SEND_MAIL_AUTH_USER and SEND_MAIL_AUTH_PASSWORD");
        return None;
    };

    match Mailer::new(&config.smtp_host, user, password) {
        Ok(mailer) => {
            info!("  Mail: {} via {}", user, config.smtp_host);
            Some(mailer)
        }
        Err(e) => {
            warn!("  Mail: DISABLED - {}", e);
            None
        }
    }
}

/// Router settings derived from the serve flags.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(&config.jwt_secret);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Token Command
// =============================================================================

fn run_token(config: TokenConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let issuer = TokenIssuer::new(&config.jwt_secret, config.ttl_minutes);
    let identity = Identity::new(&config.id, &config.role);

    let token = if config.refresh {
        issuer.issue_refresh(&identity)
    } else {
        issuer.issue(&identity)
    };

    match token {
        Ok(token) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to sign token: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Media Gateway Configuration Check");
    println!("═════════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ {}", e);
        return ExitCode::FAILURE;
    }

    let bucket = config.s3.bucket();
    println!("✓ Bucket: {}", bucket);
    if let Some(ref endpoint) = config.s3.endpoint {
        println!("✓ Endpoint (path-style): {}", endpoint);
    }
    println!("✓ Region: {}", config.s3.region);
    println!();

    print!("Reaching bucket... ");

    let s3_client = create_s3_client(
        config.s3.endpoint.as_deref(),
        &config.s3.region,
        config.s3.credentials(),
    )
    .await;

    match s3_client.head_bucket().bucket(bucket).send().await {
        Ok(_) => println!("✓ success"),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Uploads need write access to '{}'.", bucket);
            if config.s3.endpoint.is_some() {
                println!("The custom endpoint must be reachable and use path-style addressing.");
            }
            return ExitCode::FAILURE;
        }
    }

    if let Some(ref key) = config.key {
        println!();
        print!("Presigning '{}'... ", key);

        let store = S3BlobStore::new(s3_client, bucket);
        match store.presign_get(key, SIGNED_URL_TTL).await {
            Ok(url) => {
                println!("✓ done");
                println!("  {}", url);
            }
            Err(e) => {
                println!("✗ failed");
                println!("  {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ Gateway storage is ready");

    ExitCode::SUCCESS
}
