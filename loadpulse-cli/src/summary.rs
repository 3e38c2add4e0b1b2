//! Coloured terminal summaries of finished runs

use colored::{ColoredString, Colorize};
use loadpulse_engine::{LoadTestResult, StressTestResult};
use loadpulse_output::rate_class;

fn colored_rate(success_rate: f64) -> ColoredString {
    let text = format!("{:.1}%", success_rate);
    match rate_class(success_rate) {
        "good" => text.green(),
        "warning" => text.yellow(),
        _ => text.red(),
    }
}

pub fn format_load_summary(result: &LoadTestResult) -> String {
    let mut lines = vec![
        format!("{}", "Load test results".bold()),
        format!("  Target:      {}", result.target_url),
        format!(
            "  Users:       {} x {} requests",
            result.num_users, result.requests_per_user
        ),
        format!("  Duration:    {:.2}s", result.duration_seconds),
        format!(
            "  Requests:    {} total, {} ok, {} failed",
            result.total_requests, result.successful_requests, result.failed_requests
        ),
        format!("  Success:     {}", colored_rate(result.success_rate)),
        format!("  Throughput:  {:.2} req/s", result.throughput_rps),
        format!(
            "  Latency ms:  avg {:.2} | p50 {:.2} | p95 {:.2} | p99 {:.2} | max {:.2}",
            result.latency.avg_ms,
            result.latency.p50_ms,
            result.latency.p95_ms,
            result.latency.p99_ms,
            result.latency.max_ms
        ),
        format!(
            "  TTFB ms:     avg {:.2} | p95 {:.2}",
            result.ttfb.avg_ms, result.ttfb.p95_ms
        ),
    ];

    if !result.error_breakdown.is_empty() {
        lines.push("  Errors:".to_string());
        for (category, count) in &result.error_breakdown {
            lines.push(format!("    {:<16} {}", category, count.to_string().red()));
        }
    }

    lines.join("\n")
}

pub fn format_stress_summary(result: &StressTestResult) -> String {
    let mut lines = vec![
        format!("{}", "Stress test results".bold()),
        format!("  Target:      {}", result.target_url),
        format!(
            "  Sweep:       {} to {} users, break below {:.1}%",
            result.increment_users, result.max_users, result.break_threshold_percent
        ),
    ];

    for level in &result.levels {
        let marker = if level.is_breaking_point {
            " <- breaking point".red().bold().to_string()
        } else {
            String::new()
        };
        lines.push(format!(
            "  {:>5} users  success {}  p95 {:.2} ms  {:.2} req/s{}",
            level.user_count,
            colored_rate(level.result.success_rate),
            level.result.latency.p95_ms,
            level.result.throughput_rps,
            marker
        ));
    }

    let verdict = match result.breaking_point_user_count {
        Some(users) => format!("Breaking point: {} users", users).red().bold(),
        None if result.reached_max_users => {
            format!("No breaking point up to {} users", result.max_users).green().bold()
        }
        None => "Sweep stopped before reaching max users".yellow().bold(),
    };
    lines.push(format!("  {}", verdict));

    lines.join("\n")
}

pub fn print_load_summary(result: &LoadTestResult) {
    println!("{}", format_load_summary(result));
}

pub fn print_stress_summary(result: &StressTestResult) {
    println!("{}", format_stress_summary(result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use loadpulse_engine::{MetricsAggregator, RunWindow, StressLevel};
    use loadpulse_http::{RequestOutcome, RequestSample};
    use std::time::Duration;

    fn load_result(successes: usize, failures: usize) -> LoadTestResult {
        let now = Utc::now();
        let samples: Vec<_> = (0..successes + failures)
            .map(|i| {
                let outcome = if i < successes {
                    RequestOutcome::response(now, 200, Duration::from_millis(4), Duration::from_millis(12))
                } else {
                    RequestOutcome::timed_out(now, "timed out")
                };
                RequestSample::new(0, i, outcome)
            })
            .collect();
        MetricsAggregator::aggregate(&samples, &RunWindow::new(now, Duration::from_secs(1)))
            .with_run_info("http://target.test/", 1, successes + failures)
    }

    #[test]
    fn test_load_summary_lists_errors() {
        colored::control::set_override(false);
        let text = format_load_summary(&load_result(3, 1));

        assert!(text.contains("http://target.test/"));
        assert!(text.contains("4 total, 3 ok, 1 failed"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("Timeout"));
    }

    #[test]
    fn test_stress_summary_marks_breaking_level() {
        colored::control::set_override(false);
        let now = Utc::now();
        let result = StressTestResult {
            test_type: "stress".to_string(),
            target_url: "http://target.test/".to_string(),
            started_at: now,
            ended_at: now,
            max_users: 20,
            increment_users: 10,
            break_threshold_percent: 50.0,
            levels: vec![
                StressLevel {
                    user_count: 10,
                    result: load_result(4, 0),
                    is_breaking_point: false,
                },
                StressLevel {
                    user_count: 20,
                    result: load_result(1, 3),
                    is_breaking_point: true,
                },
            ],
            breaking_point_user_count: Some(20),
            reached_max_users: false,
        };

        let text = format_stress_summary(&result);
        let level_lines: Vec<_> = text.lines().filter(|l| l.contains(" users  success")).collect();

        assert_eq!(level_lines.len(), 2);
        assert!(!level_lines[0].contains("breaking point"));
        assert!(level_lines[1].contains("breaking point"));
        assert!(text.contains("Breaking point: 20 users"));
    }
}
