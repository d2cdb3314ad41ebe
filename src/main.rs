#[tokio::main]
async fn main() {
    if let Err(e) = docta_lib::run().await {
        eprintln!("docta: {e}");
        std::process::exit(1);
    }
}
