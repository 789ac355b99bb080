use todo_list_api::{
    application::todo_item_service::TodoItemServiceImpl,
    config::Config,
    domain::repository::TodoItemRepository,
    http::{routes::todo_items, routing},
    infrastructure::sqlite_repo::SqliteTodoItemRepository,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let repo = SqliteTodoItemRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let service = TodoItemServiceImpl::new(repo);
    let router = routing::app(todo_items::router(todo_items::AppState { service }));

    let addr = config.bind_addr;
    tracing::info!(%addr, database_url = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
