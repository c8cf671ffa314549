use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

pub static SEARCH_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "search_requests_total",
        "Search requests by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static SEARCH_RESULTS_RETURNED: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "search_results_returned",
        "Documents returned per search",
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 40.0, 60.0]
    )
    .unwrap()
});

pub static DIAGNOSTIC_LIST_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "diagnostic_list_failures_total",
        "Collection listings that failed during /test"
    )
    .unwrap()
});
