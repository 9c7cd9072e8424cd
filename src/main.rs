use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use carwash_backend::config::database::DatabaseConfig;
use carwash_backend::config::environment::EnvironmentConfig;
use carwash_backend::create_app;
use carwash_backend::database;
use carwash_backend::repositories::Stores;
use carwash_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚿 Car Wash Dashboard - API");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️ Entorno: {}", config.environment);

    let stores = match DatabaseConfig::from_environment(&config) {
        Some(db_config) => {
            let pool = database::connect(&db_config).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                e
            })?;
            Stores::postgres(pool)
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida, usando store en memoria (los datos no persisten)");
            Stores::in_memory()
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_app(AppState::new(stores, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("👤 /api/customers - Clientes y sus vehículos");
    info!("🚗 /api/vehicles - Vehículos, historial por vehículo");
    info!("👷 /api/employees - Empleados y su estado");
    info!("🧽 /api/services - Catálogo de servicios y categorías");
    info!("🚿 /api/pending-services - Visitas: ingreso, asignación, finalización");
    info!("📦 /api/inventory - Existencias, ajustes y consumos");
    info!("🛠️ /api/work-orders - Órdenes de trabajo con líneas");
    info!("⭐ /api/service-rating-links, /api/service-ratings - Calificaciones");
    info!("📊 /api/reports, /api/dashboard/stats - Reportes");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
