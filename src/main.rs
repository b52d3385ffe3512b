use dynagate::errors::Result;
use dynagate::{api, startup, APP_NAME, VERSION};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let application = match startup::bootstrap().await {
        Ok(application) => application,
        Err(error) => {
            eprintln!("failed to start {APP_NAME} {VERSION}: {error}");
            std::process::exit(1);
        }
    };

    info!(app_name = APP_NAME, version = VERSION, "gateway boot sequence complete");

    if let Err(error) = api::start_api_server(&application.config.server, application.state).await {
        error!(%error, "gateway server exited with an error");
        std::process::exit(1);
    }

    info!("gateway shut down");
    Ok(())
}
