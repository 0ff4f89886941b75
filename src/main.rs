use anyhow::Context;
use bookstore_app::Application;
use bookstore_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookstore settings")?;
    bookstore_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.address(),
        "bookstore-app bootstrap starting"
    );

    let app = Application::build(&settings).await?;
    app.run(&settings).await
}
