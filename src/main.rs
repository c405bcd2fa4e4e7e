#[tokio::main]
async fn main() -> std::io::Result<()> {
    rps_server::run_with_config().await
}
