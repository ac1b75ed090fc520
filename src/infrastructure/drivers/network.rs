use embassy_net::{IpAddress, Stack, StaticConfigV4, dns::DnsQueryType};
use embassy_time::{Duration, Timer};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait for the network link to become active
pub async fn wait_for_link(stack: Stack<'_>) {
    while !stack.is_link_up() {
        Timer::after(POLL_INTERVAL).await;
    }
}

/// Wait for the network stack to obtain an IPv4 address
pub async fn wait_for_ip(stack: Stack<'_>) -> StaticConfigV4 {
    loop {
        if let Some(config) = stack.config_v4() {
            return config;
        }
        Timer::after(POLL_INTERVAL).await;
    }
}

/// Resolve a hostname, accepting dotted IPv4 literals as is
pub(crate) async fn resolve_host(stack: Stack<'static>, host: &str) -> Option<IpAddress> {
    if let Ok(ip) = host.parse::<embassy_net::Ipv4Address>() {
        return Some(IpAddress::Ipv4(ip));
    }

    let addresses = stack.dns_query(host, DnsQueryType::A).await.ok()?;
    addresses.first().copied()
}
