mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::split_csv;
use logic::{
    BUNDLED_CAMPAIGN, CampaignCheck, CampaignSimulator, CheckResult, LogicTester, PlayStrategy,
    catalog_checks, find_check, resolve_seed_inputs,
};

#[derive(Debug, Parser)]
#[command(name = "campaign-tester", version = "0.1.0")]
#[command(about = "Automated playthrough and save-format QA for campaign definitions")]
struct Args {
    /// Campaign document to test, or "bundled" for the sample campaign
    #[arg(long, default_value = BUNDLED_CAMPAIGN)]
    campaign: String,

    /// Checks to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    checks: String,

    /// List all available checks and exit
    #[arg(long)]
    list_checks: bool,

    /// Seeds to run (comma-separated integers, "daily", or "phrase:<text>")
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of playthroughs per check and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// How the simulated player picks scenarios and heroes
    #[arg(long, value_enum, default_value_t = PlayStrategy::Random)]
    strategy: PlayStrategy,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_checks(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let checks = expand_checks(&args.checks);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|info| info.seed).collect();
    if args.verbose {
        let labels: Vec<String> = seed_infos.iter().map(logic::SeedInfo::label).collect();
        println!("🌱 Seeds: {}", labels.join(", "));
    }

    let simulator = CampaignSimulator::new(&args.campaign, args.verbose)?;
    println!(
        "📜 {} ({} scenarios)",
        simulator.campaign_name().bright_white(),
        simulator.scenario_count()
    );

    let results = run_checks(&args, &checks, &seeds, &simulator);
    write_reports(&args, simulator.campaign_name(), &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_checks(args: &Args) -> Result<bool> {
    if !args.list_checks {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available checks:")?;
    for check in catalog_checks() {
        writeln!(
            output_target.writer(),
            "  {:16} - {}",
            check.key,
            check.description
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏰 Campaign Tester".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn expand_checks(checks_arg: &str) -> Vec<String> {
    let mut checks = split_csv(checks_arg);
    if checks.iter().any(|c| c == "all") {
        checks.retain(|c| c != "all");
        for check in catalog_checks() {
            if !checks.iter().any(|c| c == check.key) {
                checks.push(check.key.to_string());
            }
        }
    }
    checks
}

fn run_checks(
    args: &Args,
    checks: &[String],
    seeds: &[u64],
    simulator: &CampaignSimulator,
) -> Vec<CheckResult> {
    println!("{}", "🧠 Running Campaign Checks".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(simulator, args.verbose);
    let mut results = Vec::new();

    for key in checks {
        let Some(check) = find_check(key) else {
            eprintln!("⚠️  Unknown check: {}", key.yellow());
            continue;
        };
        results.extend(run_check(&tester, &check, args, seeds));
    }

    results
}

fn run_check(
    tester: &LogicTester<'_>,
    check: &CampaignCheck,
    args: &Args,
    seeds: &[u64],
) -> Vec<CheckResult> {
    let results = tester.run_check(check, args.strategy, seeds, args.iterations);
    for result in &results {
        log::debug!(
            "{} seed {}: {}/{} iterations passed",
            result.check_name,
            result.seed,
            result.successful_iterations,
            result.iterations_run
        );
    }
    results
}

fn write_reports(
    args: &Args,
    campaign: &str,
    results: &[CheckResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Campaign Check Results: {campaign}\n\n_No checks executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, campaign, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No checks executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    campaign,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            campaign: BUNDLED_CAMPAIGN.to_string(),
            checks: "completion".to_string(),
            list_checks: false,
            seeds: "1337".to_string(),
            iterations: 1,
            strategy: PlayStrategy::Random,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("campaign-tester-{}-{name}", std::process::id()))
    }

    fn sample_result(passed: bool) -> CheckResult {
        CheckResult {
            check_name: "Campaign Completion".to_string(),
            strategy: PlayStrategy::Random,
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_checks_keyword() {
        let expanded = expand_checks("restart,all");
        assert_eq!(expanded[0], "restart");
        assert_eq!(expanded.len(), catalog_checks().len());
        assert!(expanded.contains(&"save-roundtrip".to_string()));
    }

    #[test]
    fn expand_checks_without_all_preserves_order() {
        let expanded = expand_checks("determinism,completion");
        assert_eq!(
            expanded,
            vec!["determinism".to_string(), "completion".to_string()]
        );
    }

    #[test]
    fn run_checks_skips_unknown_keys() {
        let simulator = CampaignSimulator::new(BUNDLED_CAMPAIGN, false).unwrap();
        let args = base_args();
        let checks = vec!["nonexistent".to_string(), "completion".to_string()];
        let results = run_checks(&args, &checks, &[7], &simulator);
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
    }

    #[test]
    fn maybe_list_checks_writes_output() {
        let temp = temp_file("checks.txt");
        let args = Args {
            list_checks: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_checks(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available checks"));
        assert!(content.contains("legacy-format"));
    }

    #[test]
    fn maybe_list_checks_returns_false_when_disabled() {
        assert!(!maybe_list_checks(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_file("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, "Crown", &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("check_name"));
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_file("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, "Crown", &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No checks executed"));
    }

    #[test]
    fn write_reports_emits_console_report() {
        let temp = temp_file("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(
            &args,
            "Crown",
            &[sample_result(true), sample_result(false)],
            Instant::now(),
        )
        .unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Campaign Check Results"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
