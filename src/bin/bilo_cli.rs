//!
//! bilo CLI binary
//! ---------------
//! Operator tool for the pieces of the client core that work without a browser:
//! render a vendor page's JSON-LD, show the auth redirect URLs a host would use,
//! and push a welcome mail through the configured email API.

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use bilo::identity::{password_reset_settings, verification_settings};
use bilo::models::{Appointment, Service, UserSummary, Vendor};
use bilo::notify::{MailgunTransport, NotificationDispatcher};
use bilo::structured_data::vendor_structured_data;
use bilo::{AppConfig, HostEnvironment};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} structured-data <vendor.json> [services.json] [reviews.json]\n  {program} redirects [--host <hostname>] [--origin <origin>]\n  {program} send-welcome <email> [first name]\n\nEnvironment:\n  BILO_PRODUCTION_HOST, BILO_CANONICAL_ORIGIN, BILO_AUTH_DOMAIN_FALLBACK\n  MAILGUN_API_BASE, MAILGUN_DOMAIN, MAILGUN_API_KEY, BILO_MAIL_FROM, BILO_HTTP_TIMEOUT_SECS\n  RUST_LOG                 log filter (default: info)"
    );
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path))
}

fn read_json_list<T: DeserializeOwned>(path: Option<&String>) -> Result<Vec<T>> {
    match path {
        Some(p) => read_json(p),
        None => Ok(Vec::new()),
    }
}

fn flag_value(args: &[String], i: usize, flag: &str) -> Result<String> {
    args.get(i + 1).cloned().ok_or_else(|| anyhow!("{} requires a value", flag))
}

fn structured_data(config: &AppConfig, args: &[String]) -> Result<()> {
    let vendor_path = args.first().ok_or_else(|| anyhow!("structured-data requires a vendor file"))?;
    let vendor: Vendor = read_json(vendor_path)?;
    let services: Vec<Service> = read_json_list(args.get(1))?;
    let reviews: Vec<Appointment> = read_json_list(args.get(2))?;
    let doc = vendor_structured_data(&config.canonical_origin, &vendor, &services, &reviews);
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn redirects(config: &AppConfig, args: &[String]) -> Result<()> {
    let mut origin: Option<String> = None;
    let mut hostname: Option<String> = None;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--origin" => { origin = Some(flag_value(args, i, "--origin")?); i += 2; }
            "--host" => { hostname = Some(flag_value(args, i, "--host")?); i += 2; }
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
    }
    let mut host = match origin {
        Some(o) => HostEnvironment::from_origin(&o)?,
        None => HostEnvironment::production(config),
    };
    if let Some(h) = hostname { host.hostname = h; }
    let out = serde_json::json!({
        "hostname": host.hostname,
        "production": config.is_production(&host),
        "authDomain": config.auth_domain(&host),
        "verification": verification_settings(config, &host),
        "passwordReset": password_reset_settings(config, &host),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn send_welcome(config: &AppConfig, args: &[String]) -> Result<()> {
    let email = args.first().ok_or_else(|| anyhow!("send-welcome requires an email address"))?;
    let user = UserSummary { email: email.clone(), first_name: args.get(1).cloned() };
    let transport = MailgunTransport::from_config(config)?;
    info!(target: "bilo::app", endpoint = transport.endpoint(), "sending welcome mail");
    let dispatcher = NotificationDispatcher::new(Arc::new(transport), config.mail_from.clone());
    dispatcher.send_welcome(&user).await?;
    println!("sent welcome mail to {}", user.email);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = if args.is_empty() { "bilo_cli".to_string() } else { args.remove(0) };
    let Some(command) = args.first().cloned() else {
        print_usage(&program);
        std::process::exit(2);
    };
    let rest = &args[1..];
    let config = AppConfig::from_env();

    match command.as_str() {
        "structured-data" => structured_data(&config, rest),
        "redirects" => redirects(&config, rest),
        "send-welcome" => send_welcome(&config, rest).await,
        "-h" | "--help" | "help" => { print_usage(&program); Ok(()) }
        other => {
            eprintln!("unknown command: {}", other);
            print_usage(&program);
            std::process::exit(2);
        }
    }
}
