use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub mod handlers;

const IPV4_APIS: &[&str] = &[
    "https://api.ipify.org",
    "https://ipv4.icanhazip.com",
    "https://checkip.amazonaws.com",
    "https://api.my-ip.io/ip",
];

const IPV6_API: &str = "https://api6.ipify.org";
const IP_API_URL: &str = "http://ip-api.com/json/";
const IPINFO_URL: &str = "https://ipinfo.io/json";

const ADDRESS_TIMEOUT: Duration = Duration::from_secs(3);
const DETAIL_TIMEOUT: Duration = Duration::from_secs(5);

/// Collects public IP information from free third-party APIs.
///
/// Every lookup is best-effort with a bounded timeout; a failing upstream
/// just yields `None`. No caching, rate limiting, or retries.
#[derive(Clone)]
pub struct IpInfoCollector {
    client: Client,
}

/// Flattened ip-api.com payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    query: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    region: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    zip: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    timezone: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    #[serde(rename = "as")]
    as_description: Option<String>,
    #[serde(default)]
    mobile: bool,
    #[serde(default)]
    proxy: bool,
    #[serde(default)]
    hosting: bool,
}

#[derive(Debug, Clone)]
pub struct DetailedIpInfo {
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub asn: Option<String>,
    pub as_description: Option<String>,
    pub mobile: bool,
    pub proxy: bool,
    pub hosting: bool,
}

impl DetailedIpInfo {
    fn from_response(resp: IpApiResponse) -> Option<Self> {
        if resp.status != "success" {
            return None;
        }
        let asn = resp
            .as_description
            .as_ref()
            .and_then(|s| s.split(' ').next())
            .map(str::to_string);
        Some(Self {
            ip: resp.query,
            city: resp.city,
            region: resp.region_name,
            region_code: resp.region,
            country: resp.country,
            country_code: resp.country_code,
            postal_code: resp.zip,
            latitude: resp.lat,
            longitude: resp.lon,
            timezone: resp.timezone,
            isp: resp.isp,
            org: resp.org,
            asn,
            as_description: resp.as_description,
            mobile: resp.mobile,
            proxy: resp.proxy,
            hosting: resp.hosting,
        })
    }
}

impl IpInfoCollector {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    /// Public IPv4 address, trying each fallback API in order.
    pub async fn public_ipv4(&self) -> Option<Ipv4Addr> {
        for api in IPV4_APIS {
            if let Some(text) = self.fetch_text(api, ADDRESS_TIMEOUT).await {
                if let Ok(ip) = text.trim().parse::<Ipv4Addr>() {
                    return Some(ip);
                }
            }
            debug!(api, "ipv4 lookup failed, trying next");
        }
        None
    }

    pub async fn public_ipv6(&self) -> Option<Ipv6Addr> {
        let text = self.fetch_text(IPV6_API, ADDRESS_TIMEOUT).await?;
        text.trim().parse::<Ipv6Addr>().ok()
    }

    /// Detailed geolocation/network info for the caller's public IP from
    /// ip-api.com.
    pub async fn detailed_ip_info(&self) -> Option<DetailedIpInfo> {
        let resp = self
            .client
            .get(IP_API_URL)
            .timeout(DETAIL_TIMEOUT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let parsed: IpApiResponse = resp.json().await.ok()?;
        DetailedIpInfo::from_response(parsed)
    }

    /// Raw ipinfo.io payload, used to fill gaps left by ip-api.com.
    pub async fn ipinfo_data(&self) -> Option<Value> {
        let resp = self
            .client
            .get(IPINFO_URL)
            .timeout(DETAIL_TIMEOUT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        resp.json().await.ok()
    }

    async fn fetch_text(&self, url: &str, timeout: Duration) -> Option<String> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        resp.text().await.ok()
    }
}
