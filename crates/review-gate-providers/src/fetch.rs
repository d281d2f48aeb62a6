// crates/review-gate-providers/src/fetch.rs
// ============================================================================
// Module: Review Gate HTTP Fetcher
// Description: Policy-checked streaming HTTP fetcher for contributor URLs.
// Purpose: Open manifest, icon, screenshot, and payload URLs safely.
// Dependencies: review-gate-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpFetcher`] implements the core [`Fetcher`] interface for `https://`
//! (and optionally `http://`) URLs. Every URL it touches is contributor
//! supplied, so each hop is checked before a request is sent.
//! Invariants:
//! - Host resolution is pinned per request and private ranges are denied
//!   unless explicitly allowed.
//! - Redirects are followed manually up to `max_redirects`, re-running the
//!   scheme and address checks on every hop.
//! - URLs with embedded credentials are rejected.
//! - Non-success status codes fail closed.
//!
//! Byte limits are the caller's concern: the response body is returned as a
//! stream together with the declared `Content-Length`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use review_gate_core::FetchError;
use review_gate_core::FetchStream;
use review_gate_core::Fetcher;
use url::Host;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP fetcher.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` URLs on every hop.
/// - `allow_private_networks = false` blocks private/link-local/loopback targets.
/// - `timeout` applies to each request in a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFetcherConfig {
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Allow requests to private/link-local/loopback addresses.
    pub allow_private_networks: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum redirects followed per fetch.
    pub max_redirects: u32,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            allow_private_networks: false,
            timeout: Duration::from_secs(60),
            max_redirects: 5,
            user_agent: format!("review-gate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ============================================================================
// SECTION: HTTP Fetcher
// ============================================================================

/// HTTP-backed fetcher for contributor-supplied URLs.
///
/// # Invariants
/// - Automatic redirects are disabled on every client it builds.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Client used when the URL host is an IP literal.
    client: Client,
    /// Fetch policy.
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    /// Builds a fetcher with the provided policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the HTTP client cannot be constructed.
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = client_builder(&config)
            .build()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        Ok(Self {
            client,
            config,
        })
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }

    /// Parses a URL and checks its scheme and credentials.
    fn check_url(&self, raw: &str) -> Result<Url, FetchError> {
        let url = Url::parse(raw).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        self.check_parsed(url)
    }

    /// Checks scheme and credentials on an already parsed URL.
    fn check_parsed(&self, url: Url) -> Result<Url, FetchError> {
        match url.scheme() {
            "https" => {}
            "http" if self.config.allow_http => {}
            "http" => {
                return Err(FetchError::Policy("cleartext http is disabled".to_string()));
            }
            scheme => return Err(FetchError::InvalidUrl(format!("unsupported scheme: {scheme}"))),
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(FetchError::InvalidUrl("url must not embed credentials".to_string()));
        }
        Ok(url)
    }

    /// Resolves the URL host and enforces the address policy.
    fn resolve(&self, url: &Url) -> Result<ResolvedHost, FetchError> {
        let host = url.host().ok_or_else(|| FetchError::InvalidUrl("missing host".to_string()))?;
        let host_label = normalize_host_label(&host);
        let port = url
            .port_or_known_default()
            .ok_or_else(|| FetchError::InvalidUrl("missing port for host resolution".to_string()))?;
        let mut ips = resolve_host_ips(&host, port)?;
        if ips.is_empty() {
            return Err(FetchError::Policy(format!("host has no resolved IPs: {host_label}")));
        }
        for ip in &ips {
            self.enforce_ip_policy(&host_label, *ip)?;
        }
        dedupe_ips(&mut ips);
        Ok(ResolvedHost {
            host_label,
            host: owned_host(&host),
            port,
            ips,
        })
    }

    /// Validates a peer IP against the policy.
    fn enforce_ip_policy(&self, host_label: &str, ip: IpAddr) -> Result<(), FetchError> {
        if self.config.allow_private_networks {
            return Ok(());
        }
        if is_private_or_link_local(&ip) {
            return Err(FetchError::Policy(format!(
                "host resolves to private or link-local address: {host_label}"
            )));
        }
        Ok(())
    }

    /// Builds a client pinned to the provided IP when the host is a domain.
    fn client_for_ip(&self, resolved: &ResolvedHost, ip: IpAddr) -> Result<Client, FetchError> {
        match &resolved.host {
            Host::Domain(domain) => client_builder(&self.config)
                .resolve(domain.as_str(), SocketAddr::new(ip, resolved.port))
                .build()
                .map_err(|err| FetchError::Http(err.to_string())),
            Host::Ipv4(_) | Host::Ipv6(_) => Ok(self.client.clone()),
        }
    }

    /// Sends one GET for a checked URL, trying each resolved address in turn.
    fn send_once(&self, url: &Url) -> Result<Response, FetchError> {
        let resolved = self.resolve(url)?;
        let mut last_error = None;
        for ip in resolved.ips.iter().copied() {
            let client = match self.client_for_ip(&resolved, ip) {
                Ok(client) => client,
                Err(err) => {
                    last_error = Some(err);
                    continue;
                }
            };
            match client.get(url.as_str()).send() {
                Ok(response) => {
                    self.enforce_ip_policy(&resolved.host_label, ip)?;
                    return Ok(response);
                }
                Err(err) => last_error = Some(FetchError::Http(err.to_string())),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            FetchError::Http("request failed for all resolved IPs".to_string())
        }))
    }
}

impl Fetcher for HttpFetcher {
    fn open(&self, url: &str) -> Result<FetchStream, FetchError> {
        let mut current = self.check_url(url)?;
        let mut redirects = 0_u32;
        loop {
            let response = self.send_once(&current)?;
            let status = response.status();
            if status.is_redirection() && status != StatusCode::NOT_MODIFIED {
                if redirects >= self.config.max_redirects {
                    return Err(FetchError::Policy(format!(
                        "too many redirects (limit {})",
                        self.config.max_redirects
                    )));
                }
                redirects += 1;
                current = self.check_parsed(redirect_target(&current, &response)?)?;
                continue;
            }
            if !status.is_success() {
                return Err(FetchError::Http(format!("http status {status}")));
            }
            let content_length = response.content_length();
            return Ok(FetchStream::new(Box::new(response), content_length));
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a client builder with redirects disabled and policy settings applied.
fn client_builder(config: &HttpFetcherConfig) -> reqwest::blocking::ClientBuilder {
    Client::builder()
        .redirect(Policy::none())
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
}

/// Resolves the `Location` header of a redirect against the current URL.
fn redirect_target(current: &Url, response: &Response) -> Result<Url, FetchError> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| FetchError::Http("redirect without location".to_string()))?;
    current.join(location).map_err(|err| FetchError::InvalidUrl(err.to_string()))
}

/// Normalizes a host label into a lowercase string for reporting.
fn normalize_host_label(host: &Host<&str>) -> String {
    match host {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    }
}

/// Resolves hostnames to IP addresses for private-range validation.
fn resolve_host_ips(host: &Host<&str>, port: u16) -> Result<Vec<IpAddr>, FetchError> {
    match host {
        Host::Ipv4(ip) => Ok(vec![IpAddr::V4(*ip)]),
        Host::Ipv6(ip) => Ok(vec![IpAddr::V6(*ip)]),
        Host::Domain(domain) => (*domain, port)
            .to_socket_addrs()
            .map(|iter| iter.map(|addr| addr.ip()).collect::<Vec<IpAddr>>())
            .map_err(|err| FetchError::Http(format!("dns lookup failed: {err}"))),
    }
}

/// Converts a host reference into an owned host.
fn owned_host(host: &Host<&str>) -> Host<String> {
    match host {
        Host::Domain(domain) => Host::Domain((*domain).to_string()),
        Host::Ipv4(ip) => Host::Ipv4(*ip),
        Host::Ipv6(ip) => Host::Ipv6(*ip),
    }
}

/// Removes duplicate IPs while preserving order.
fn dedupe_ips(ips: &mut Vec<IpAddr>) {
    let mut unique = Vec::with_capacity(ips.len());
    for ip in ips.drain(..) {
        if !unique.contains(&ip) {
            unique.push(ip);
        }
    }
    *ips = unique;
}

/// Returns true if the IP is private, link-local, loopback, or unspecified.
#[allow(
    clippy::option_if_let_else,
    reason = "Option::map_or is not const-callable on current toolchain."
)]
const fn is_private_or_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => {
            addr.is_private()
                || addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_multicast()
                || addr.is_broadcast()
        }
        IpAddr::V6(addr) => {
            let mapped_private = if let Some(mapped) = addr.to_ipv4_mapped() {
                mapped.is_private()
                    || mapped.is_loopback()
                    || mapped.is_link_local()
                    || mapped.is_unspecified()
            } else {
                false
            };
            mapped_private
                || addr.is_loopback()
                || addr.is_unique_local()
                || addr.is_unicast_link_local()
                || addr.is_unspecified()
                || addr.is_multicast()
        }
    }
}

// ============================================================================
// SECTION: Resolved Host
// ============================================================================

/// Resolved host metadata for pinned HTTP requests.
///
/// # Invariants
/// - `ips` is non-empty and contains unique entries.
struct ResolvedHost {
    /// Normalized host label used for policy reporting.
    host_label: String,
    /// Resolved host for request construction.
    host: Host<String>,
    /// Effective port for the request.
    port: u16,
    /// Resolved IPs for the host.
    ips: Vec<IpAddr>,
}
