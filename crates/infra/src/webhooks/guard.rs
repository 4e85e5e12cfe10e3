//! Delivery-target guard.
//!
//! Webhook URLs are attacker-controlled input, so every attempt re-checks
//! the target at send time: scheme must be http/https and no candidate
//! address may fall in a private, loopback, or link-local range. A host that
//! fails to resolve is rejected, not skipped.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};
use std::sync::Arc;

use slotwise_domain::{Result, SlotwiseError};
use tracing::debug;
use url::{Host, Url};

/// Host-to-address resolution seam, injectable so guard tests never touch
/// real DNS.
pub trait ResolveHost: Send + Sync {
    fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// System resolver used in production.
pub struct SystemResolver;

impl ResolveHost for SystemResolver {
    fn resolve(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        Ok((host, 0).to_socket_addrs()?.map(|addr| addr.ip()).collect())
    }
}

/// Validates webhook URLs before each delivery attempt.
pub struct TargetGuard {
    resolver: Arc<dyn ResolveHost>,
    allow_private: bool,
}

impl TargetGuard {
    pub fn new(resolver: Arc<dyn ResolveHost>) -> Self {
        Self { resolver, allow_private: false }
    }

    /// Guard that still validates scheme and resolution but admits private
    /// and loopback targets. For local development only.
    pub fn permissive(resolver: Arc<dyn ResolveHost>) -> Self {
        Self { resolver, allow_private: true }
    }

    /// Reject URLs that are malformed, non-HTTP, or that point at an
    /// internal address. Errors are terminal for the delivery.
    pub fn check(&self, raw_url: &str) -> Result<()> {
        let url = Url::parse(raw_url)
            .map_err(|e| SlotwiseError::Delivery(format!("invalid webhook URL: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(SlotwiseError::Delivery(format!(
                    "webhook URL scheme '{other}' is not allowed"
                )))
            }
        }

        let addresses = match url.host() {
            None => {
                return Err(SlotwiseError::Delivery("webhook URL has no host".into()));
            }
            Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
            Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
            Some(Host::Domain(domain)) => self.resolver.resolve(domain).map_err(|e| {
                SlotwiseError::Delivery(format!("webhook host '{domain}' did not resolve: {e}"))
            })?,
        };

        if addresses.is_empty() {
            return Err(SlotwiseError::Delivery(
                "webhook host resolved to no addresses".into(),
            ));
        }

        for address in addresses {
            if !self.allow_private && is_blocked(address) {
                debug!(%address, url = raw_url, "webhook target blocked");
                return Err(SlotwiseError::Delivery(format!(
                    "webhook target resolves to blocked address {address}"
                )));
            }
        }

        Ok(())
    }
}

fn is_blocked(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => is_blocked_v4(ip),
        IpAddr::V6(ip) => {
            // v4-mapped addresses are judged by their embedded v4 address.
            if let Some(mapped) = ip.to_ipv4_mapped() {
                return is_blocked_v4(mapped);
            }
            ip.is_loopback()
                || ip.is_unspecified()
                // fc00::/7 unique-local
                || (ip.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link-local
                || (ip.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}
