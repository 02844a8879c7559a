//! Walk through the material API against a running server.
//!
//! Start the server first (`MONGODB_URI=... cargo run -p material-server`),
//! then `cargo run -p material-server --example api_client`.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};

const SERVER_URL: &str = "http://localhost:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    // Example 1: Health check
    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 2: Create from JSON with an external image URL
    println!("2. Create (JSON):");
    let resp = client
        .post(format!("{SERVER_URL}/materials"))
        .json(&json!({
            "name": "PLA Basic",
            "technology": "FDM",
            "colors": ["white", "black"],
            "pricePerGram": 0.03,
            "imageUrl": "https://example.com/pla.png"
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    let created: Value = resp.json().await?;
    println!("Body: {created}");
    println!();

    let id = created["_id"].as_str().unwrap_or_default().to_string();

    // Example 3: Create from a multipart form with an uploaded image
    println!("3. Create (multipart upload):");
    let form = Form::new()
        .text("name", "Tough Resin")
        .text("technology", "SLA")
        .text("colors", "grey, clear")
        .text("pricePerGram", "0.12")
        .part(
            "image",
            Part::bytes(b"\x89PNG\r\n\x1a\n".to_vec())
                .file_name("resin.png")
                .mime_str("image/png")?,
        );
    let resp = client
        .post(format!("{SERVER_URL}/materials"))
        .multipart(form)
        .send()
        .await?;
    println!("Status: {}", resp.status());
    let uploaded: Value = resp.json().await?;
    println!("Body: {uploaded}");
    if let Some(path) = uploaded["imageUrl"].as_str() {
        let resp = client.get(format!("{SERVER_URL}{path}")).send().await?;
        println!("Image fetch: {} ({} bytes)", resp.status(), resp.bytes().await?.len());
    }
    println!();

    // Example 4: List (no image references)
    println!("4. List:");
    let resp = client.get(format!("{SERVER_URL}/materials")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 5: Partial update
    println!("5. Update technology only:");
    let resp = client
        .put(format!("{SERVER_URL}/materials/{id}"))
        .json(&json!({ "technology": "FFF" }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 6: Delete twice
    println!("6. Delete:");
    for _ in 0..2 {
        let resp = client
            .delete(format!("{SERVER_URL}/materials/{id}"))
            .send()
            .await?;
        println!("Status: {}", resp.status());
        println!("Body: {}", resp.text().await?);
    }

    Ok(())
}
