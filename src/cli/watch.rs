//! Check and watch commands: a single implicit task driven from the terminal.

use std::time::{Duration, Instant};

use anyhow::Result;

use pagewatch::channels::{ConsoleNotifier, FanoutNotifier, Notifier, TelegramChannel};
use pagewatch::config::Config;
use pagewatch::fetch::{HttpFetcher, PageFetcher};
use pagewatch::matcher::Phrase;
use pagewatch::scheduler::{Scheduler, SweepPolicy, SweepReport, UrlState};
use pagewatch::utils::format_size;

/// Task id of the terminal's implicit watch.
const CLI_TASK: &str = "cli";

fn rule() -> String {
    "=".repeat(60)
}

fn fetcher_for(config: &Config) -> Result<HttpFetcher> {
    let fetcher = HttpFetcher::new(
        Duration::from_secs_f64(config.timeout_secs),
        &config.user_agent,
    )?;
    Ok(fetcher)
}

/// Console always; Telegram as well when both token and chat id are set.
fn detection_notifier(config: &Config) -> Result<FanoutNotifier> {
    let mut notifier = FanoutNotifier::new().push(Box::new(ConsoleNotifier));
    if let (Some(token), Some(chat_id)) = (config.telegram.token(), config.telegram.chat_id()) {
        notifier = notifier.push_to(Box::new(TelegramChannel::new(token)?), chat_id);
    }
    Ok(notifier)
}

fn cli_scheduler(config: &Config, urls: Vec<String>) -> Scheduler {
    let mut scheduler =
        Scheduler::new(Phrase::new(&config.find)).with_policy(SweepPolicy::StopAtFirstPresent);
    scheduler.start_watch(
        CLI_TASK,
        urls,
        Duration::from_secs_f64(config.interval_secs),
        Instant::now(),
    );
    scheduler
}

fn link_count(scheduler: &Scheduler) -> usize {
    scheduler.task(CLI_TASK).map_or(0, |t| t.urls().len())
}

fn print_checks(reports: &[SweepReport]) {
    for check in reports.iter().flat_map(|r| r.checks.iter()) {
        let label = match check.state {
            UrlState::Present => "✅ found",
            _ => "❌ not found",
        };
        match &check.error {
            Some(error) => println!("{}: {} ({})", check.url, label, error),
            None => println!("{}: {}", check.url, label),
        }
    }
}

/// First URL reported present in this tick, if any.
fn first_present(reports: &[SweepReport]) -> Option<String> {
    reports
        .iter()
        .flat_map(|r| r.checks.iter())
        .find(|c| c.state.is_present())
        .map(|c| c.url.clone())
}

/// One pass over the URLs, stopping at the first match.
pub(crate) async fn cmd_check(config: &Config, urls: Vec<String>) -> Result<()> {
    let fetcher = fetcher_for(config)?;
    let notifier = detection_notifier(config)?;
    let mut scheduler = cli_scheduler(config, urls);

    println!("🔍 Checking {} link(s)...", link_count(&scheduler));
    println!("🔎 Looking for: '{}'", config.find);
    println!("{}\n", rule());

    let reports = tokio::select! {
        reports = scheduler.tick(Instant::now(), &fetcher, &notifier) => reports,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n👋 Stopped manually");
            return Ok(());
        }
    };
    print_checks(&reports);

    println!("\n{}", rule());
    match first_present(&reports) {
        Some(url) => {
            println!("✅ Result: text found!");
            println!("🔗 Link: {}", url);
        }
        None => println!("❌ Result: text not found on any link"),
    }
    Ok(())
}

/// Repeat sweeps every interval until a URL reports present or Ctrl+C.
pub(crate) async fn cmd_watch(config: &Config, urls: Vec<String>) -> Result<()> {
    let fetcher = fetcher_for(config)?;
    let notifier = detection_notifier(config)?;
    let mut scheduler = cli_scheduler(config, urls);

    println!("👁️ Watching {} link(s)...", link_count(&scheduler));
    println!("🔎 Looking for: '{}'", config.find);
    println!("⏱️ Every {} seconds", config.interval_secs);
    println!("🛑 Stops automatically once the text is found");
    println!("Press Ctrl+C to stop manually\n");
    println!("{}", rule());

    tokio::select! {
        found = watch_until_found(&mut scheduler, &fetcher, &notifier) => {
            if let Some(url) = found {
                println!("\n🎉 Found '{}' on:", config.find);
                println!("🔗 {}", url);
                println!("\n✋ Stopping...");
            }
        }
        _ = tokio::signal::ctrl_c() => println!("\n\n👋 Stopped manually"),
    }

    println!("\n{}", rule());
    println!("✅ Done");
    Ok(())
}

/// Sleep until the task is due, sweep, and repeat. Returns the URL that
/// matched, or `None` if the scheduler has nothing left to run.
async fn watch_until_found(
    scheduler: &mut Scheduler,
    fetcher: &dyn PageFetcher,
    notifier: &dyn Notifier,
) -> Option<String> {
    let mut cycle: u64 = 1;
    loop {
        let due = scheduler.next_due()?;
        let now = Instant::now();
        if due > now {
            println!("\n⏳ Waiting {:.1} seconds...", (due - now).as_secs_f64());
            tokio::time::sleep_until(tokio::time::Instant::from_std(due)).await;
        }

        println!(
            "\n🔄 Cycle #{} - {}",
            cycle,
            chrono::Local::now().format("%H:%M:%S")
        );
        println!("{}", "-".repeat(60));

        let reports = scheduler.tick(Instant::now(), fetcher, notifier).await;
        print_checks(&reports);
        if let Some(url) = first_present(&reports) {
            return Some(url);
        }
        cycle += 1;
    }
}

/// Print each page's size.
pub(crate) async fn cmd_size(config: &Config, urls: &[String]) -> Result<()> {
    let fetcher = fetcher_for(config)?;
    for url in urls {
        match fetcher.page_size(url).await {
            Ok(bytes) => println!("{}: {}", url, format_size(bytes)),
            Err(e) => println!("{}: ❌ {}", url, e),
        }
    }
    Ok(())
}
