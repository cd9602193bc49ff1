use std::net::{Ipv4Addr, Ipv6Addr, UdpSocket};

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    collector::DetailedIpInfo,
    state::AppState,
    util::now_rfc3339,
};

pub fn collector_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ip_info", get(ip_info))
        .route("/api/local_info", get(local_info))
}

/// GET /api/ip_info
///
/// Compiles the collector lookups into the response shape the frontend
/// consumes. Missing upstream data leaves the affected section empty.
#[instrument(skip(state))]
pub async fn ip_info(State(state): State<AppState>) -> Json<Value> {
    let collector = &state.collector;
    let ipv4 = collector.public_ipv4().await;
    let ipv6 = collector.public_ipv6().await;
    let detailed = collector.detailed_ip_info().await;
    let ipinfo = collector.ipinfo_data().await;

    Json(compile_ip_info(ipv4, ipv6, detailed, ipinfo))
}

/// GET /api/local_info
#[instrument]
pub async fn local_info() -> Json<Value> {
    let hostname = gethostname::gethostname().to_string_lossy().into_owned();

    // A connected UDP socket reveals the outbound interface address
    // without sending any packet.
    let mut local_ips = Vec::new();
    if let Ok(socket) = UdpSocket::bind("0.0.0.0:0") {
        if socket.connect("8.8.8.8:80").is_ok() {
            if let Ok(addr) = socket.local_addr() {
                local_ips.push(addr.ip().to_string());
            }
        }
    }

    Json(json!({
        "hostname": hostname,
        "local_ips": local_ips,
        "timestamp": now_rfc3339(),
    }))
}

fn compile_ip_info(
    ipv4: Option<Ipv4Addr>,
    ipv6: Option<Ipv6Addr>,
    detailed: Option<DetailedIpInfo>,
    ipinfo: Option<Value>,
) -> Value {
    let mut response = json!({
        "timestamp": now_rfc3339(),
        "addresses": {
            "ipv4": ipv4.map(|ip| ip.to_string()),
            "ipv6": ipv6.map(|ip| ip.to_string()),
        },
        "geolocation": {},
        "network": {},
        "security": {},
        "additional": {},
    });

    if let Some(d) = detailed {
        response["geolocation"] = json!({
            "city": d.city,
            "region": d.region,
            "country": d.country,
            "country_code": d.country_code,
            "postal_code": d.postal_code,
            "latitude": d.latitude,
            "longitude": d.longitude,
            "timezone": d.timezone,
        });
        response["network"] = json!({
            "isp": d.isp,
            "organization": d.org,
            "as_number": d.asn,
            "as_description": d.as_description,
        });
        response["security"] = json!({
            "is_mobile": d.mobile,
            "is_proxy": d.proxy,
            "is_hosting": d.hosting,
        });
    }

    if let Some(info) = ipinfo {
        let geo = &mut response["geolocation"];
        for key in ["city", "region"] {
            if geo.get(key).map_or(true, Value::is_null) {
                geo[key] = info.get(key).cloned().unwrap_or(Value::Null);
            }
        }
        if let Some(loc) = info.get("loc").and_then(Value::as_str) {
            let parts: Vec<&str> = loc.split(',').collect();
            if parts.len() == 2 && geo.get("latitude").map_or(true, Value::is_null) {
                if let (Ok(lat), Ok(lon)) = (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
                    geo["latitude"] = json!(lat);
                    geo["longitude"] = json!(lon);
                }
            }
        }
        response["additional"]["hostname"] = info.get("hostname").cloned().unwrap_or(Value::Null);
    }

    response
}
