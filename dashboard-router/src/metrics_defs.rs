use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Page request duration in seconds. Tagged with page, status.",
};

pub const UPSTREAM_FETCHES: MetricDef = MetricDef {
    name: "upstream.fetches",
    metric_type: MetricType::Counter,
    description: "Data API fetches dispatched to the worker pool",
};

pub const UPSTREAM_FETCH_DURATION: MetricDef = MetricDef {
    name: "upstream.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of a single Data API fetch in seconds",
};

pub const COALESCED_SUBMISSIONS: MetricDef = MetricDef {
    name: "coalescer.coalesced",
    metric_type: MetricType::Counter,
    description: "Submissions attached to an already in-flight fetch",
};

pub const PENDING_KEYS: MetricDef = MetricDef {
    name: "coalescer.pending_keys",
    metric_type: MetricType::Gauge,
    description: "Number of dispatch keys with an outstanding fetch",
};

pub const REJECTED_DISPATCHES: MetricDef = MetricDef {
    name: "workers.rejected",
    metric_type: MetricType::Counter,
    description: "Fetches rejected because the worker queue was full",
};

pub const FETCH_FAILURES: MetricDef = MetricDef {
    name: "aggregator.failures",
    metric_type: MetricType::Counter,
    description: "Data sources dropped from a page. Tagged with kind.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    UPSTREAM_FETCHES,
    UPSTREAM_FETCH_DURATION,
    COALESCED_SUBMISSIONS,
    PENDING_KEYS,
    REJECTED_DISPATCHES,
    FETCH_FAILURES,
];
