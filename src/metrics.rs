use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("hr_gateway_requests_total", "Total number of generate requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("hr_gateway_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref UPSTREAM_ERRORS_TOTAL: Counter =
        register_counter!("hr_gateway_upstream_errors_total", "Failed completion API calls").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "hr_gateway_generation_latency_seconds",
        "Time spent generating content in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_CLIENTS: Gauge =
        register_gauge!("hr_gateway_rate_limit_clients", "Client windows currently tracked").unwrap();
}
