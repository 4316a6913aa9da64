//! Landing Admin - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    landing_admin::run().await;
}
