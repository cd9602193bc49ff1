use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{state::AppState, util::now_rfc3339};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/backlog", get(backlog))
}

#[derive(Debug, Clone, Serialize)]
struct BacklogItem {
    id: u32,
    title: &'static str,
    description: &'static str,
    priority: &'static str,
    category: &'static str,
    estimated_effort: &'static str,
}

fn backlog_items() -> Vec<BacklogItem> {
    vec![
        BacklogItem {
            id: 1,
            title: "IPv6 Geolocation Support",
            description: "Implement comprehensive IPv6 geolocation lookup and display",
            priority: "High",
            category: "Enhancement",
            estimated_effort: "3 days",
        },
        BacklogItem {
            id: 2,
            title: "VPN/Proxy Detection",
            description: "Enhanced detection and categorization of VPN, proxy, and Tor connections",
            priority: "Medium",
            category: "Security",
            estimated_effort: "2 days",
        },
        BacklogItem {
            id: 3,
            title: "Historical IP Tracking",
            description: "Store and display historical IP address changes with timestamps",
            priority: "Medium",
            category: "Feature",
            estimated_effort: "5 days",
        },
        BacklogItem {
            id: 4,
            title: "Speed Test Integration",
            description: "Integrate network speed testing capabilities",
            priority: "Low",
            category: "Enhancement",
            estimated_effort: "4 days",
        },
        BacklogItem {
            id: 5,
            title: "Interactive Map Display",
            description: "Show IP location on an interactive world map",
            priority: "Medium",
            category: "UI/UX",
            estimated_effort: "3 days",
        },
        BacklogItem {
            id: 6,
            title: "API Rate Limiting",
            description: "Implement rate limiting and caching to handle high traffic",
            priority: "High",
            category: "Performance",
            estimated_effort: "2 days",
        },
        BacklogItem {
            id: 7,
            title: "Multi-Language Support",
            description: "Add support for multiple languages in the UI",
            priority: "Low",
            category: "Internationalization",
            estimated_effort: "4 days",
        },
        BacklogItem {
            id: 8,
            title: "DNS Information",
            description: "Display DNS server information and reverse DNS lookup",
            priority: "Medium",
            category: "Network",
            estimated_effort: "2 days",
        },
        BacklogItem {
            id: 9,
            title: "Bulk IP Lookup",
            description: "Allow batch processing of multiple IP addresses",
            priority: "Medium",
            category: "Feature",
            estimated_effort: "3 days",
        },
        BacklogItem {
            id: 10,
            title: "Export Functionality",
            description: "Export IP information to JSON, CSV, or PDF formats",
            priority: "Low",
            category: "Feature",
            estimated_effort: "2 days",
        },
    ]
}

/// GET /api/backlog
pub async fn backlog() -> Json<Value> {
    let items = backlog_items();
    let total = items.len();
    Json(json!({
        "backlog_items": items,
        "total_items": total,
        "timestamp": now_rfc3339(),
    }))
}
