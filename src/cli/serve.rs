use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use reqwest::Client;
use tokio::time::sleep;

use crate::{config, error, info, server, success, warning};

const READY_ATTEMPTS: u32 = 30;
const READY_INTERVAL: Duration = Duration::from_millis(500);

pub async fn serve(addr: Option<String>, open: bool) {
    let mut settings = config::Settings::from_env();
    if let Some(addr) = addr {
        settings.server_addr = addr;
    }

    let socket_addr = match settings.socket_addr() {
        Ok(addr) => addr,
        Err(e) => error!("{}", e),
    };

    if open {
        tokio::spawn(open_when_ready(health_url(socket_addr), config::ui_url()));
    }

    info!("Starting SoundNext on http://{}", socket_addr);
    if let Err(e) = server::start_api_server(settings).await {
        error!("Server stopped. Err: {}", e);
    }
}

/// The `/health` URL to poll. A wildcard bind address is polled on loopback.
fn health_url(addr: SocketAddr) -> String {
    let ip = match addr.ip() {
        ip if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}/health", SocketAddr::new(ip, addr.port()))
}

async fn open_when_ready(health_url: String, ui_url: String) {
    let client = Client::new();

    for _ in 0..READY_ATTEMPTS {
        let ready = client
            .get(&health_url)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success());

        if ready {
            success!("Server is ready");
            if webbrowser::open(&ui_url).is_err() {
                warning!(
                    "Failed to open browser. Please navigate to the following URL manually:\n{}",
                    ui_url
                );
            }
            return;
        }
        sleep(READY_INTERVAL).await;
    }

    warning!(
        "Server did not become ready in time, not opening {}",
        ui_url
    );
}
