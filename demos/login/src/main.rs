//! Headless login flow driving a UniversalStore
//!
//! Demonstrates the full store surface without any UI:
//! 1. Construct the store from the fixed session field set
//! 2. Bind a whole-state session view and a single-field error binding
//! 3. Log in; the grant lands as one batch update
//! 4. Load mailbox folders with the bearer token read back out of state
//! 5. Print the result from the binding caches
//!
//! # Usage
//!
//! ```sh
//! cargo run -p login-demo -- --username kim --password secret
//!
//! # Against a different endpoint, with transition tracing
//! cargo run -p login-demo -- --endpoint http://localhost:9000/rpc \
//!     --username kim --password secret --trace
//! ```

mod session;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use unistore::{RemoteClient, Snapshot, StoreConfig, UniversalStore};

use crate::session::Value;

/// Summary a UI shell would render; recomputed whenever any field changes.
#[derive(Clone, Debug)]
struct SessionView {
    authenticated: bool,
    user: Option<String>,
    role: Option<String>,
    folders: Vec<String>,
}

fn session_view(snapshot: &Snapshot<Value>) -> SessionView {
    SessionView {
        authenticated: snapshot
            .get(session::AUTHENTICATED)
            .and_then(Value::as_flag)
            .unwrap_or(false),
        user: snapshot
            .get(session::USER)
            .and_then(Value::as_text)
            .map(str::to_string),
        role: snapshot
            .get(session::ROLE)
            .and_then(Value::as_text)
            .map(str::to_string),
        folders: snapshot
            .get(session::FOLDERS)
            .and_then(Value::as_list)
            .map(|folders| folders.to_vec())
            .unwrap_or_default(),
    }
}

/// Headless login flow built on unistore
#[derive(Parser, Debug)]
#[command(name = "login")]
#[command(about = "Log in, fetch mailbox folders, print the session view")]
struct Args {
    /// RPC endpoint of the session service
    #[arg(long, default_value = "http://localhost:8080/rpc")]
    endpoint: String,

    /// Account name
    #[arg(long, short)]
    username: String,

    /// Account password
    #[arg(long, short)]
    password: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Trace every store transition and dump the devtool log on exit
    #[arg(long)]
    trace: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(if args.trace { "debug" } else { "info" })
            }),
        )
        .init();

    let config = StoreConfig {
        trace_transitions: args.trace,
        devtool: args.trace,
        ..Default::default()
    };
    let mut store = UniversalStore::with_config(session::initial_state(), config);

    let view = store.bind_selector(session_view);
    let error = match store.bind_field(session::ERROR) {
        Ok(binding) => binding,
        Err(e) => {
            eprintln!("store misconfigured: {}", e);
            std::process::exit(1);
        }
    };

    let client = RemoteClient::new(args.endpoint.as_str())
        .with_timeout(Duration::from_secs(args.timeout));

    if session::login(&mut store, &client, &args.username, &args.password).await {
        session::load_folders(&mut store, &client).await;
    }

    let summary = view.get();
    if summary.authenticated {
        println!(
            "signed in as {} ({})",
            summary.user.as_deref().unwrap_or("?"),
            summary.role.as_deref().unwrap_or("?"),
        );
        if summary.folders.is_empty() {
            println!("no folders");
        } else {
            for folder in &summary.folders {
                println!("  {}", folder);
            }
        }
    } else {
        let reason = error
            .get()
            .as_text()
            .map(str::to_string)
            .unwrap_or_else(|| "unknown error".to_string());
        eprintln!("login failed: {}", reason);
    }

    if let Some(log) = store.devtool() {
        for record in log.records() {
            println!(
                "[{}] {}: {:?} -> {:?}",
                record.sequence, record.field, record.prev, record.next
            );
        }
    }

    error.dispose(&mut store);
    view.dispose(&mut store);
}
