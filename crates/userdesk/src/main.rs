mod bootstrap;

use anyhow::Result;
use desk_core::settings::Settings;
use desk_data::facts::CatFactClient;
use desk_runtime::background::Background;
use desk_runtime::context::BackgroundContext;
use desk_ui::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, &settings.log_file_path())?;

    tracing::info!("userdesk v{} starting", env!("CARGO_PKG_VERSION"));
    let database = settings.database_path();
    tracing::info!(database = %database.display(), theme = %settings.theme, "configuration loaded");

    let store = bootstrap::open_store(&database)?;
    let ctx = BackgroundContext::new(store, CatFactClient::new());
    let (controller, handle) = Background::start(ctx);

    let app = App::new(&settings.theme, controller);

    // Raw mode delivers Ctrl+C as a key event; the loop quits on it.
    let result = app.run();

    handle.shutdown().await;
    tracing::info!("userdesk stopped");

    result?;
    Ok(())
}
