//! Basic popup lifecycle.
//!
//! Demonstrates:
//! - Building a PopupManager over an in-memory document
//! - Opening a pre-rendered, hidden layer
//! - Sharing data through an inherited popup context
//! - Detecting dismissal when the layer is hidden again
//!
//! Usage:
//!   cargo run --example basic_popup
//!   cargo run --example basic_popup -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use layer_popup::launcher::RecordingLauncher;
use layer_popup::{Context, MemoryDocument, PopupManager, PopupOptions, Result};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|arg| arg == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "layer_popup=debug"
    } else {
        "layer_popup=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    println!("=== Basic Popup ===\n");

    // ========================================================================
    // Document
    // ========================================================================

    println!("[1] Rendering hidden login layer...");

    let document = Arc::new(MemoryDocument::new());
    let layer = document.create_element("div");
    let input = document.create_element("input");
    document.set_id(layer, "login");
    document.set_style(layer, "display", "none");
    document.append_child(document.body(), layer);
    document.append_child(layer, input);

    println!("    ✓ Layer {layer} ready\n");

    // ========================================================================
    // Manager
    // ========================================================================

    println!("[2] Building manager...");

    let popups = PopupManager::builder()
        .document(document.clone())
        .launcher(Arc::new(RecordingLauncher::revealing(Arc::clone(&document))))
        .options(PopupOptions::new().with_ready_timeout(Duration::from_secs(1)))
        .build()?;

    println!("    ✓ {popups:?}\n");

    // ========================================================================
    // Open
    // ========================================================================

    println!("[3] Opening popup...");

    let app = Context::new();
    app.set("locale", json!("en"));

    let opener = popups
        .opener("login", "/login.html")?
        .with_data(json!({ "redirect": "/home" }))
        .with_parent_context(app)
        .on_load(|element| println!("    ✓ Loaded at {}", element.node()))
        .on_close(|| println!("    ✓ Close handler fired"));

    let pending = opener.load();

    if let Some(context) = popups.get_context("login") {
        context.set("attempts", json!(0));
    }

    pending.await?;

    if let Some(context) = popups.get_context("login") {
        println!("    locale   = {:?}", context.get("locale"));
        println!("    attempts = {:?}\n", context.get("attempts"));
    }

    // ========================================================================
    // Close
    // ========================================================================

    println!("[4] Hiding layer...");

    document.set_style(layer, "display", "none");
    if let Some(observer) = opener.observer() {
        observer.closed().await;
    }

    println!("    State: {}\n", opener.state());
    println!("=== Done ===");
    Ok(())
}
