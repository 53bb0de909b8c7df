//! Optional self-ping so hosted instances are not idled out.

use std::time::Duration;

use songbridge_core::api::KeepaliveConfig;
use tokio::task::JoinHandle;

/// Start the ping loop if `keepalive.url` is set. Results are only logged.
pub fn spawn_keepalive(cfg: &KeepaliveConfig) -> Option<JoinHandle<()>> {
    let url = cfg.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?.to_string();
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(target: "songbridge.keepalive", error = %e, "Keep-alive disabled");
            return None;
        }
    };
    let every = Duration::from_secs(cfg.interval_secs.max(1));

    tracing::info!(
        target: "songbridge.keepalive",
        url = %url,
        interval_secs = every.as_secs(),
        "Keep-alive enabled"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so startup is not pinged.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match ping_once(&client, &url).await {
                Ok(status) => tracing::debug!(target: "songbridge.keepalive", status, "Ping ok"),
                Err(e) => tracing::warn!(target: "songbridge.keepalive", error = %e, "Ping failed"),
            }
        }
    }))
}

pub async fn ping_once(client: &reqwest::Client, url: &str) -> Result<u16, reqwest::Error> {
    let resp = client.get(url).send().await?;
    Ok(resp.status().as_u16())
}
