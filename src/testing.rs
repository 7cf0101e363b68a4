//! Fake HTTP peer for client tests.

use std::collections::HashMap;

use reqwest::Url;
use serde_json::Value;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

use crate::prelude::*;

/// Request as seen by the fake server.
pub struct CapturedRequest {
    pub request_line: String,

    /// Lowercase header names.
    pub headers: HashMap<String, String>,

    pub body: Option<Value>,
}

/// Serve exactly one HTTP request with the canned JSON body.
///
/// Returns the root URL of the server and the handle resolving to the captured request.
pub async fn serve_once(
    response_body: &'static str,
) -> Result<(Url, JoinHandle<Result<CapturedRequest>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = Url::parse(&format!("http://{}/", listener.local_addr()?))?;
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await?;
        respond(&mut stream, response_body).await
    });
    Ok((url, handle))
}

/// Serve the canned bodies in order, one connection per request.
pub async fn serve(
    response_bodies: Vec<&'static str>,
) -> Result<(Url, JoinHandle<Result<Vec<CapturedRequest>>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = Url::parse(&format!("http://{}/", listener.local_addr()?))?;
    let handle = tokio::spawn(async move {
        let mut requests = Vec::with_capacity(response_bodies.len());
        for response_body in response_bodies {
            let (mut stream, _) = listener.accept().await?;
            requests.push(respond(&mut stream, response_body).await?);
        }
        Ok(requests)
    });
    Ok((url, handle))
}

async fn respond(stream: &mut TcpStream, response_body: &str) -> Result<CapturedRequest> {
    let request = read_request(stream).await?;
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\r\n\
         {response_body}",
        response_body.len(),
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(request)
}

async fn read_request(stream: &mut TcpStream) -> Result<CapturedRequest> {
    let mut buffer = Vec::new();
    let header_end = loop {
        read_chunk(stream, &mut buffer).await?;
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8(buffer[..header_end].to_vec())?;
    let mut lines = head.lines();
    let request_line = lines.next().context("no request line")?.to_owned();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.to_owned()))
        .collect();

    let content_length: usize =
        headers.get("content-length").map(|value| value.parse()).transpose()?.unwrap_or(0);
    while buffer.len() < header_end + content_length {
        read_chunk(stream, &mut buffer).await?;
    }
    let body = (content_length != 0)
        .then(|| serde_json::from_slice(&buffer[header_end..header_end + content_length]))
        .transpose()?;

    Ok(CapturedRequest { request_line, headers, body })
}

async fn read_chunk(stream: &mut TcpStream, buffer: &mut Vec<u8>) -> Result {
    let mut chunk = [0; 4096];
    let n_read = stream.read(&mut chunk).await?;
    ensure!(n_read != 0, "connection closed before the request ended");
    buffer.extend_from_slice(&chunk[..n_read]);
    Ok(())
}
