//! pos-sync - headless POS order agent
//!
//! Reads one command per stdin line:
//!
//! | Line | Effect |
//! |------|--------|
//! | `{"service":{"type":"dine_in"},"lines":[...]}` | register an order |
//! | `:status` | print queue / sync status |
//! | `:menu` | fetch today's menu from the backend |
//! | `:token <value>` | store the device token |
//! | `:clear-token` | forget the device token |
//!
//! Orders are queued durably and delivered in the background.

use pos_client::logger::init_logger;
use pos_client::{
    ClientConfig, Connectivity, HttpClient, OrderRequest, PosRuntime, RedbStorage, SlotStorage,
    TokenStore,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = ClientConfig::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger(&config.log_level, config.log_json, Some(&config.log_dir()))?;

    // 2. Durable storage and device token
    let storage: Arc<dyn SlotStorage> = Arc::new(RedbStorage::open(config.queue_db_path())?);
    let tokens = TokenStore::new(storage.clone());
    let client = HttpClient::new(&config)?;
    tracing::info!(endpoint = client.endpoint(), "POS sync agent starting");
    if client.token().is_none() {
        match tokens.load() {
            Some(token) => client.set_token(token),
            None => tracing::warn!(
                "No device token configured; orders stay queued until one is set with :token"
            ),
        }
    }

    // 3. Queue, engine, scheduler
    let connectivity = Connectivity::new(config.probe_interval.is_none());
    let mut runtime = PosRuntime::start(
        storage,
        Arc::new(client.clone()),
        connectivity,
        config.sync_interval,
    );
    if let Some(interval) = config.probe_interval {
        runtime = runtime.with_probe(Arc::new(client.clone()), interval);
    }

    // 4. Command loop
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    loop {
        tokio::select! {
            line = read_line_lossy(&mut stdin, &mut buf) => {
                match line {
                    Ok(Some(line)) => handle_line(line.trim(), &runtime, &client, &tokens).await,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin, stopping");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received");
                break;
            }
        }
    }

    // 5. Last delivery attempt, then stop
    let outcome = runtime.engine().process().await;
    tracing::info!(
        delivered = outcome.delivered(),
        outcome = ?outcome,
        pending = runtime.service().pending_orders(),
        "Final drain"
    );
    runtime.shutdown().await;

    Ok(())
}

/// Next input line, with invalid UTF-8 replaced instead of failing.
///
/// `None` at end of input.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

async fn handle_line(line: &str, runtime: &PosRuntime, client: &HttpClient, tokens: &TokenStore) {
    if line.is_empty() {
        return;
    }

    match line.split_once(' ').unwrap_or((line, "")) {
        (":status", _) => {
            let status = runtime.service().sync_status();
            println!(
                "state={} pending={} online={} failed_tasks={} last={:?}",
                status.state,
                status.pending,
                status.online,
                runtime.failed_tasks(),
                status.last_outcome
            );
        }
        (":menu", _) => match client.fetch_daily_data().await {
            Ok(data) => {
                for dish in data.todays_dishes() {
                    println!("{}\t{}", dish.name, dish.price);
                }
            }
            Err(e) => println!("error: {e}"),
        },
        (":token", value) => match tokens.set(value) {
            Ok(token) => {
                client.set_token(token);
                println!("token stored");
                runtime.engine().queue().sync_trigger().notify_one();
            }
            Err(e) => println!("error: {e}"),
        },
        (":clear-token", _) => match tokens.clear() {
            Ok(()) => {
                client.clear_token();
                println!("token cleared");
            }
            Err(e) => println!("error: {e}"),
        },
        _ => match serde_json::from_str::<OrderRequest>(line) {
            Ok(order) => {
                let total = order.total();
                match runtime.service().register_order(order) {
                    Ok(queued) => println!("queued {} total={}", queued.local_id, total),
                    Err(e) => println!("error: {e}"),
                }
            }
            Err(e) => println!("error: invalid order: {e}"),
        },
    }
}
