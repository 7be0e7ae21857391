//! stationsync main entrypoint.

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = stationsync::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
