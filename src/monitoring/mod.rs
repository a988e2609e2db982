pub mod metrics_log;
