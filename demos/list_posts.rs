//! Lists recent posts from a WordPress site and inspects the envelope.
//!
//! This example shows how to:
//! - Build a client, optionally negotiating a JWT token
//! - List a collection with query parameters
//! - Attach hooks to a raw request
//! - Read status, headers and timing from the envelope
//!
//! Run with: `cargo run --example list_posts -- https://example.com`
//!
//! Set `WP_USER` and `WP_PASSWORD` to exchange credentials for a token first
//! (requires the JWT authentication plugin on the site).

use wpcall::{AuthorizationScheme, Client, Error, RequestDescriptor};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("wpcall=debug,list_posts=info")
        .init();

    let site = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://wordpress.org/news".to_string());

    let mut builder = Client::builder().base_url(&site)?;
    if let (Ok(user), Ok(password)) = (std::env::var("WP_USER"), std::env::var("WP_PASSWORD")) {
        builder = builder.authorization(AuthorizationScheme::jwt(user, password));
    }
    let client = builder.connect().await?;
    println!("Authorization: {:?}", client.authorization_state());
    println!();

    println!("=== Typed listing ===");
    let posts = client.posts().list(&[("per_page", "5")]).await?;
    if posts.success() {
        for post in posts.payload().into_iter().flatten() {
            println!("#{} {}", post.id, post.title.rendered);
        }
        println!("Total posts: {}", posts.header("x-wp-total").unwrap_or("?"));
    } else {
        println!(
            "Listing failed: {:?} {}",
            posts.status(),
            posts.error_message().unwrap_or_default()
        );
    }
    println!("Latency: {:?}", posts.elapsed());
    println!();

    println!("=== Raw request with hooks ===");
    let descriptor = RequestDescriptor::builder()
        .get("categories")
        .query("per_page", "3")
        .on_success(|body| println!("Received {} bytes", body.len()))
        .validator(|body| body.trim_start().starts_with('['))
        .on_unhandled_error(|e| eprintln!("Request failed: {}", e))
        .build()?;

    let envelope = client.execute(&descriptor).await?;
    if envelope.success() {
        let categories = envelope.decode::<Vec<wpcall::Category>>()?;
        for category in categories.payload().into_iter().flatten() {
            println!("{} ({} posts)", category.name, category.count);
        }
    } else if envelope.is_hook_rejection() {
        println!("Rejected: {}", envelope.error_message().unwrap_or_default());
    } else {
        println!("Failed: {:?}", envelope.status());
    }

    Ok(())
}
