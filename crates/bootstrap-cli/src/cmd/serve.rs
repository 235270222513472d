use bootstrap_core::env::ResolvedConfig;

/// `site-bootstrap serve`: run the status web server until Ctrl-C.
pub fn run(port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or_else(|| ResolvedConfig::resolve().web_port);

    println!("Starting De Bra Hostel Management System on port {port}");
    println!("System features:");
    println!("   Room booking and management");
    println!("   Motorcycle rental system");
    println!("   Volunteer management");
    println!("   Additional guest services");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        };
        bootstrap_server::serve(port, shutdown).await
    })
}
