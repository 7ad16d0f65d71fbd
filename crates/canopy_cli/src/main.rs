//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `canopy_client` linkage.
//! - Probe a live server when `CANOPY_URL` is set; stay offline otherwise.

use canopy_client::{CanopyClient, ClientConfig};

fn main() {
    println!("canopy_client ping={}", canopy_client::ping());
    println!("canopy_client version={}", canopy_client::client_version());

    if let Ok(log_dir) = std::env::var("CANOPY_LOG_DIR") {
        if let Err(err) = canopy_client::init_logging(canopy_client::default_log_level(), &log_dir)
        {
            eprintln!("canopy_cli logging_disabled reason={err}");
        }
    }

    let Ok(base_url) = std::env::var("CANOPY_URL") else {
        return;
    };
    let mut config = ClientConfig::new(base_url);
    if let Ok(api_key) = std::env::var("CANOPY_API_KEY") {
        config = config.with_api_key(api_key);
    }

    match CanopyClient::open(&config).and_then(|client| client.list_project_keys()) {
        Ok(project_keys) => {
            println!("canopy_client projects={}", project_keys.join(","));
        }
        Err(err) => {
            eprintln!("canopy_client error={err}");
            std::process::exit(1);
        }
    }
}
