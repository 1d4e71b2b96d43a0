//! Prometheus metrics for the forecast engine
//!
//! All metrics use the `pricecast_` prefix and live in a private registry so
//! tests can build as many instances as they like.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Job runs by job id and outcome (`executed`, `error`, `missed`, `dropped`)
    pub job_runs_total: IntCounterVec,
    pub job_run_duration_seconds: HistogramVec,
    /// Per (coin, timeframe) units by outcome (`ok`, `failed`)
    pub sweep_units_total: IntCounterVec,
    pub store_failures_total: IntCounter,
    pub models_loaded: IntGauge,
    pub scheduler_running: IntGauge,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let job_runs_total = IntCounterVec::new(
            Opts::new("pricecast_job_runs_total", "Scheduled job runs by outcome"),
            &["job", "outcome"],
        )?;
        registry.register(Box::new(job_runs_total.clone()))?;

        let job_run_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pricecast_job_run_duration_seconds",
                "Wall time of scheduled job runs in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
            &["job"],
        )?;
        registry.register(Box::new(job_run_duration_seconds.clone()))?;

        let sweep_units_total = IntCounterVec::new(
            Opts::new(
                "pricecast_sweep_units_total",
                "Coin/timeframe prediction units by outcome",
            ),
            &["timeframe", "outcome"],
        )?;
        registry.register(Box::new(sweep_units_total.clone()))?;

        let store_failures_total = IntCounter::with_opts(Opts::new(
            "pricecast_store_failures_total",
            "Prediction writes that failed and were dropped",
        ))?;
        registry.register(Box::new(store_failures_total.clone()))?;

        let models_loaded = IntGauge::with_opts(Opts::new(
            "pricecast_models_loaded",
            "Timeframes with a registered model",
        ))?;
        registry.register(Box::new(models_loaded.clone()))?;

        let scheduler_running = IntGauge::with_opts(Opts::new(
            "pricecast_scheduler_running",
            "1 while the scheduler is running",
        ))?;
        registry.register(Box::new(scheduler_running.clone()))?;

        let http_requests_total = IntCounter::with_opts(Opts::new(
            "pricecast_http_requests_total",
            "Total HTTP requests",
        ))?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_requests_in_flight = IntGauge::with_opts(Opts::new(
            "pricecast_http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        let http_request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "pricecast_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            job_runs_total,
            job_run_duration_seconds,
            sweep_units_total,
            store_failures_total,
            models_loaded,
            scheduler_running,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
        })
    }

    pub fn record_job_run(&self, job: &str, outcome: &str) {
        self.job_runs_total.with_label_values(&[job, outcome]).inc();
    }

    pub fn job_runs(&self, job: &str, outcome: &str) -> u64 {
        self.job_runs_total.with_label_values(&[job, outcome]).get()
    }

    pub fn record_unit(&self, timeframe: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "failed" };
        self.sweep_units_total
            .with_label_values(&[timeframe, outcome])
            .inc();
    }

    /// Render the registry in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
