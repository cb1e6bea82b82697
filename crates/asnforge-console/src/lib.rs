//! Colorful console output for association generation.
//!
//! Provides a custom `tracing` layer that formats engine events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (registry built, generation start/end)
//! - **WARN**: Pool items that matched no rule
//! - **DEBUG**: Process lists and created associations

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static GENERATE_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Package version for banner display.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Module path prefix of engine events.
const ENGINE_TARGET: &str = "asnforge_engine";

/// Initializes console output.
///
/// Safe to call multiple times; only the first call has effect.
/// Prints the banner and installs the console layer, filtered by
/// `RUST_LOG` with `asnforge_engine=info` as the default.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let directive = format!("{}=info", ENGINE_TARGET)
            .parse::<Directive>()
            .unwrap_or_else(|_| LevelFilter::INFO.into());
        let filter = EnvFilter::builder()
            .with_default_directive(directive)
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(AsnConsoleLayer)
            .try_init();
    });
}

// Marks the start of generation for elapsed time tracking.
fn mark_generate_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    GENERATE_START_NANOS.store(nanos, Ordering::Relaxed);
}

fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = GENERATE_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
    _              _____
   / \   ___ _ __ |  ___|__  _ __ __ _  ___
  / _ \ / __| '_ \| |_ / _ \| '__/ _` |/ _ \
 / ___ \\__ \ | | |  _| (_) | | | (_| |  __/
/_/   \_\___/_| |_|_|  \___/|_|  \__, |\___|
                                 |___/
"#;

    let version_line = format!("             v{} - Association Generator\n", VERSION);

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats engine events with colors.
pub struct AsnConsoleLayer;

impl<S: Subscriber> Layer<S> for AsnConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(ENGINE_TARGET) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    rule: Option<String>,
    seed_scope: Option<String>,
    work_over: Option<String>,
    item_count: Option<u64>,
    rule_count: Option<u64>,
    finalizers: Option<u64>,
    associations: Option<u64>,
    orphans: Option<u64>,
    process_lists: Option<u64>,
    duration_ms: Option<u64>,
    count: Option<u64>,
    items: Option<u64>,
    pending: Option<u64>,
    sequence: Option<u64>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "rule" => self.rule = Some(s),
            "seed_scope" => self.seed_scope = Some(s),
            "work_over" => self.work_over = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "item_count" => self.item_count = Some(value),
            "rule_count" => self.rule_count = Some(value),
            "finalizers" => self.finalizers = Some(value),
            "associations" => self.associations = Some(value),
            "orphans" => self.orphans = Some(value),
            "process_lists" => self.process_lists = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "count" => self.count = Some(value),
            "items" => self.items = Some(value),
            "pending" => self.pending = Some(value),
            "sequence" => self.sequence = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "rule" => self.rule = Some(value.to_string()),
            "seed_scope" => self.seed_scope = Some(value.to_string()),
            "work_over" => self.work_over = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref().unwrap_or("") {
        "registry_built" => format_registry_built(v),
        "generate_start" => format_generate_start(v),
        "generate_end" => format_generate_end(v),
        "orphans" => format_orphans(v),
        "process_list" => format_process_list(v, level),
        "association_created" => format_association_created(v, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn count(value: Option<u64>) -> String {
    value.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_registry_built(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} Registry │ {} rules",
        format_elapsed(),
        "●".bright_blue().bold(),
        count(v.rule_count).bright_yellow()
    );
    if v.finalizers.unwrap_or(0) > 0 {
        output.push_str(&format!(
            " │ {} finalizers",
            count(v.finalizers).bright_yellow()
        ));
    }
    output
}

fn format_generate_start(v: &EventVisitor) -> String {
    mark_generate_start();
    format!(
        "{} {} Generating │ {} items │ {} rules │ seed over {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        count(v.item_count).bright_yellow(),
        count(v.rule_count).bright_yellow(),
        v.seed_scope.as_deref().unwrap_or("both").bright_magenta()
    )
}

fn format_generate_end(v: &EventVisitor) -> String {
    let orphans = v.orphans.unwrap_or(0);
    let status = if orphans == 0 {
        "ALL MATCHED".bright_green().bold().to_string()
    } else {
        "UNMATCHED ITEMS".bright_red().bold().to_string()
    };

    let mut output = format!(
        "{} {} Generation complete │ {} │ {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        status
    );

    output.push_str("\n\n");
    output.push_str(&summary_box(&[
        ("Associations:", count(v.associations)),
        ("Orphans:", count(v.orphans)),
        ("Process lists:", count(v.process_lists)),
    ]));
    output
}

fn summary_box(rows: &[(&str, String)]) -> String {
    const INNER_WIDTH: usize = 58;
    let rule = "═".repeat(INNER_WIDTH);

    let mut output = format!("{}\n", format!("╔{}╗", rule).bright_cyan());
    for (label, value) in rows {
        output.push_str(&format!(
            "{}  {:<18}{:>36}  {}\n",
            "║".bright_cyan(),
            label,
            value,
            "║".bright_cyan()
        ));
    }
    output.push_str(&format!("{}\n", format!("╚{}╝", rule).bright_cyan()));
    output
}

fn format_orphans(v: &EventVisitor) -> String {
    format!(
        "{} {} {} pool items matched no rule",
        format_elapsed(),
        "⚠".bright_yellow().bold(),
        count(v.count).bright_red()
    )
}

fn format_process_list(v: &EventVisitor, level: Level) -> String {
    if level < Level::DEBUG {
        return String::new();
    }
    format!(
        "{} {} {:>6} items over {:<8} │ {} pending",
        format_elapsed(),
        "→".bright_blue(),
        count(v.items).white(),
        v.work_over.as_deref().unwrap_or("both"),
        count(v.pending).bright_black()
    )
}

fn format_association_created(v: &EventVisitor, level: Level) -> String {
    if level < Level::DEBUG {
        return String::new();
    }
    format!(
        "{} {} {} #{}",
        format_elapsed(),
        "+".bright_green(),
        v.rule.as_deref().unwrap_or("?").white().bold(),
        count(v.sequence)
    )
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unknown_events_are_silent() {
        let v = EventVisitor {
            event: Some("rule_built".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
    }

    #[test]
    fn test_generate_end_summary() {
        let v = EventVisitor {
            event: Some("generate_end".to_string()),
            associations: Some(1234),
            orphans: Some(1),
            process_lists: Some(7),
            duration_ms: Some(42),
            ..EventVisitor::default()
        };
        let output = format_event(&v, Level::INFO);
        assert!(output.contains("1,234"));
        assert!(output.contains("UNMATCHED ITEMS"));
        assert!(output.contains("42ms"));
        assert!(output.contains("Process lists:"));
    }

    #[test]
    fn test_debug_events_hidden_at_info() {
        let v = EventVisitor {
            event: Some("process_list".to_string()),
            items: Some(3),
            ..EventVisitor::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
        assert!(format_event(&v, Level::DEBUG).contains("items over"));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(INIT.get().is_some());
    }
}
