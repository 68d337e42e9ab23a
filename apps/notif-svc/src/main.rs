//! Binary entry point for the notification service.

#[tokio::main]
async fn main() {
    if let Err(e) = notif_svc::run().await {
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}
