//! One-shot CGI entry point for the PDF Tools API.
//!
//! Reads a single request from the CGI environment (`REQUEST_METHOD`,
//! `PATH_INFO`, `CONTENT_TYPE`, `CONTENT_LENGTH`, `HTTP_DATE`) and stdin,
//! writes the response to stdout and exits. Logs go to stderr.

use std::env;

use anyhow::Context;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, DATE};
use http::Request;
use pdfconvert_handler::{handle, write_cgi_response, HandlerConfig};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pdfconvert_handler=info".parse()?),
        )
        .init();

    let config = HandlerConfig::from_env()?;
    let request = read_request().await?;
    info!(method = %request.method(), path = %request.uri(), "Received request");

    let response = handle(request, &config).await;
    info!(status = %response.status(), "Request complete");

    let stdout = std::io::stdout();
    write_cgi_response(&response, &mut stdout.lock()).context("Failed to write response")?;
    Ok(())
}

async fn read_request() -> anyhow::Result<Request<Bytes>> {
    let method = env::var("REQUEST_METHOD").unwrap_or_else(|_| "GET".to_string());
    let path = env::var("PATH_INFO")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "/".to_string());
    let content_length = env::var("CONTENT_LENGTH")
        .ok()
        .and_then(|len| len.trim().parse::<u64>().ok());

    let mut body = Vec::new();
    let stdin = tokio::io::stdin();
    match content_length {
        Some(len) => {
            stdin.take(len).read_to_end(&mut body).await?;
        }
        None => {
            let mut stdin = stdin;
            stdin.read_to_end(&mut body).await?;
        }
    }

    let mut builder = Request::builder().method(method.as_str()).uri(path);
    if let Ok(content_type) = env::var("CONTENT_TYPE") {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    if let Some(len) = content_length {
        builder = builder.header(CONTENT_LENGTH, len);
    }
    if let Ok(date) = env::var("HTTP_DATE") {
        builder = builder.header(DATE, date);
    }

    builder
        .body(Bytes::from(body))
        .context("Invalid CGI request")
}
