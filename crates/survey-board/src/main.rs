#[tokio::main]
async fn main() -> anyhow::Result<()> {
    survey_board::start_server().await
}
