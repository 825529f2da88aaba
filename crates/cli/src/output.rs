use crate::error::CliError;
use engine_runtime::execution::runner::RunSummary;

pub fn print_summary(summary: &RunSummary, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", summary_json(summary)?);
        return Ok(());
    }

    let metrics = &summary.metrics;
    println!("Iterations:        {}", summary.iterations);
    println!("Cancelled:         {}", summary.cancelled);
    println!("Rows projected:    {}", metrics.rows_projected);
    println!("Batches committed: {}", metrics.batches_committed);
    println!("Failures:          {}", metrics.failure_count);
    println!("Retries:           {}", metrics.retry_count);
    Ok(())
}

fn summary_json(summary: &RunSummary) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::metrics::MetricsSnapshot;

    #[test]
    fn json_summary_includes_loop_outcome() {
        let summary = RunSummary {
            iterations: 4,
            cancelled: true,
            metrics: MetricsSnapshot {
                rows_projected: 3,
                batches_committed: 1,
                ..MetricsSnapshot::default()
            },
        };

        let json: serde_json::Value = serde_json::from_str(&summary_json(&summary).unwrap()).unwrap();

        assert_eq!(json["iterations"], 4);
        assert_eq!(json["cancelled"], true);
        assert_eq!(json["metrics"]["rows_projected"], 3);
        assert_eq!(json["metrics"]["batches_committed"], 1);
    }
}
