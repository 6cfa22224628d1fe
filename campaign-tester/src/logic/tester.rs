use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::checks::{CampaignCheck, CheckContext};
use super::playthrough::{CampaignSimulator, PlayStrategy, PlaythroughSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub strategy: PlayStrategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester<'a> {
    simulator: &'a CampaignSimulator,
    verbose: bool,
}

impl<'a> LogicTester<'a> {
    pub const fn new(simulator: &'a CampaignSimulator, verbose: bool) -> Self {
        Self { simulator, verbose }
    }

    pub fn run_check(
        &self,
        check: &CampaignCheck,
        strategy: PlayStrategy,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<CheckResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Checking: {} (strategy: {} seed: {})",
                    check.name.bright_white(),
                    strategy.label(),
                    seed
                );
            }

            results.push(self.run_single_check(check, strategy, seed, iterations));
        }

        results
    }

    fn run_single_check(
        &self,
        check: &CampaignCheck,
        strategy: PlayStrategy,
        seed: u64,
        iterations: usize,
    ) -> CheckResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = self
                .simulator
                .run(strategy, iteration_seed)
                .and_then(|summary| {
                    let ctx = CheckContext {
                        simulator: self.simulator,
                        summary: &summary,
                    };
                    check.evaluate(&ctx).map(|()| summary)
                });

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) path: {}",
                            i + 1,
                            iterations,
                            describe_path(&summary)
                        );
                    }
                }
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {}): {err:#}",
                        i + 1,
                        strategy.label(),
                        iteration_seed
                    ));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        CheckResult {
            check_name: check.name.to_string(),
            strategy,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

fn describe_path(summary: &PlaythroughSummary) -> String {
    summary
        .conquered_order()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|ms| Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
            .collect())
    }
}
