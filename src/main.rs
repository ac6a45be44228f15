use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use vocab_sync::domain::model::ValidityStatus;
use vocab_sync::utils::logger;
use vocab_sync::utils::validation::validate_required_field;
use vocab_sync::{
    CliConfig, LogNotifier, ServerValidity, SyncConfig, SyncError, VocabForm, VocascanClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting vocab-sync");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    let address = config.server.address.clone().unwrap_or_default();
    let mut client = VocascanClient::new(&address, config.request_timeout())?;
    if let Some(token) = &config.server.auth_token {
        client = client.with_token(token.clone());
    }
    let client = Arc::new(client);

    if cli.watch {
        watch_addresses(Arc::clone(&client), &config).await;
        return Ok(());
    }

    let mut validity = ServerValidity::new(Arc::clone(&client), config.validity_settings());
    let status = validity.probe_once(&address).await?;

    if !validity.is_applicable() {
        eprintln!("❌ No server address given (use --server-address or [server].address)");
        std::process::exit(1);
    }

    print_status(&address, &status);
    if let Some(failure) = validity.failure() {
        eprintln!("❌ {}", failure.user_friendly_message());
        eprintln!("💡 建議: {}", failure.recovery_suggestion());
        std::process::exit(2);
    }

    if cli.list_packages {
        if let Err(e) = validate_required_field("server.auth_token", &config.server.auth_token) {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
        list_packages(client, &config).await?;
    }

    Ok(())
}

fn print_status(address: &str, status: &ValidityStatus) {
    if status.overall_valid() {
        println!(
            "✅ {} is a valid vocascan server (version {})",
            address,
            status.version.as_deref().unwrap_or("?")
        );
    }
    if status.is_locked == Some(true) {
        println!("🔒 Registration on this server is locked");
    }
}

async fn watch_addresses(client: Arc<VocascanClient>, config: &SyncConfig) {
    let validity = ServerValidity::new(client, config.validity_settings());
    let (tx, rx) = mpsc::channel(16);
    let (updates_tx, mut updates_rx) = watch::channel(ValidityStatus::default());
    // piped input ends right after its last line; that address still gets probed
    let driver = tokio::spawn(validity.run_to_end(rx, updates_tx));

    let reporter = tokio::spawn(async move {
        let mut last_reported: Option<ValidityStatus> = None;
        while updates_rx.changed().await.is_ok() {
            let status = updates_rx.borrow_and_update().clone();
            if status.loading || last_reported.as_ref() == Some(&status) {
                continue;
            }
            last_reported = Some(status.clone());
            match (status.is_reachable, status.overall_valid()) {
                (Some(false), _) => println!("❌ not responding"),
                (Some(true), true) => println!(
                    "✅ valid (version {})",
                    status.version.as_deref().unwrap_or("?")
                ),
                (Some(true), false) => println!(
                    "❌ not a compatible vocascan server (identity ok: {:?}, version ok: {:?})",
                    status.is_valid_server, status.is_valid_version
                ),
                (None, _) => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line.trim().to_string()).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    drop(tx);
    if let Err(e) = driver.await {
        tracing::error!("Validity loop failed: {}", e);
    }
    let _ = reporter.await;
}

async fn list_packages(
    client: Arc<VocascanClient>,
    config: &SyncConfig,
) -> Result<(), SyncError> {
    let mut form = VocabForm::from_config(client, Arc::new(LogNotifier), &config.form);
    form.refresh().await?;

    for package in form.packages() {
        println!(
            "📦 {} ({} → {})",
            package.name, package.foreign_language, package.translated_language
        );
        for group in &package.groups {
            println!("   • {}", group.name);
        }
    }
    Ok(())
}
