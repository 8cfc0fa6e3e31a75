#[tokio::main]
async fn main() {
  // Minimal CLI: support --version/-V
  let mut args = std::env::args().skip(1);
  if let Some(arg) = args.next() {
    if arg == "--version" || arg == "-V" {
      println!("mailroom {}", env!("CARGO_PKG_VERSION"));
      return;
    }
    if arg == "--help" || arg == "-h" {
      eprintln!("Usage: mailroom [--version]");
      eprintln!();
      eprintln!("Environment:");
      eprintln!("  MAILROOM_DATABASE            sqlx url (default sqlite://mailroom.db)");
      eprintln!("  MAILROOM_ADDR                listen address (default 127.0.0.1:8080)");
      eprintln!("  MAILROOM_SMTP_TIMEOUT_SECS   smtp command timeout (default 30)");
      eprintln!("  MAILROOM_SESSION_TTL_HOURS   bearer session lifetime (default 168)");
      eprintln!("  RUST_LOG                     tracing filter (default info)");
      return;
    }
  }

  if let Err(e) = mailroom::app::run().await {
    eprintln!("error: {e}");
    std::process::exit(1);
  }
}
