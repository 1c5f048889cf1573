//! Logging configuration for the browser bridge
//!
//! Uses log4rs with appenders:
//! 1. ConsoleAppender - stderr output (stdout may carry the host wire)
//! 2. RollingFileAppender - log files with rotation
//! 3. RecentActivityAppender - keeps recent bridge records for the settings panel

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Maximum number of records kept for the activity view
const RECENT_CAPACITY: usize = 200;

// ============================================================================
// Recent Activity Buffer
// ============================================================================

static RECENT: OnceLock<Mutex<VecDeque<ActivityEntry>>> = OnceLock::new();

fn recent_buffer() -> &'static Mutex<VecDeque<ActivityEntry>> {
    RECENT.get_or_init(|| Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)))
}

/// One log line as shown in the activity list
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub level: String,
    pub target: String,
    pub message: String,
}

/// Snapshot of the most recent bridge activity, oldest first
pub fn recent_activity() -> Vec<ActivityEntry> {
    match recent_buffer().lock() {
        Ok(buf) => buf.iter().cloned().collect(),
        Err(_) => Vec::new(),
    }
}

fn push_activity(entry: ActivityEntry) {
    if let Ok(mut buf) = recent_buffer().lock() {
        if buf.len() == RECENT_CAPACITY {
            buf.pop_front();
        }
        buf.push_back(entry);
    }
}

// ============================================================================
// Recent Activity Appender
// ============================================================================

/// log4rs appender that records this crate's info/warn/error lines in memory
#[derive(Debug)]
pub struct RecentActivityAppender;

impl log4rs::append::Append for RecentActivityAppender {
    fn append(&self, record: &log::Record) -> anyhow::Result<()> {
        let target = record.target();
        if !target.starts_with(env!("CARGO_CRATE_NAME")) {
            return Ok(());
        }

        let level = match record.level() {
            log::Level::Error => "error",
            log::Level::Warn => "warn",
            log::Level::Info => "info",
            _ => return Ok(()),
        };

        push_activity(ActivityEntry {
            level: level.to_string(),
            target: target.to_string(),
            message: format!("{}", record.args()),
        });

        Ok(())
    }

    fn flush(&self) {}
}

// ============================================================================
// Logger Initialization
// ============================================================================

/// Initialize log4rs with console, rolling file and activity appenders
///
/// # Log File Configuration
/// - File: `{log_dir}/bridge.1.log`
/// - Max size: 10 MB per file
/// - Max count: 5 files (rotation)
/// - Pattern: `{timestamp} [{level}] {target} - {message}`
pub fn init_logger(log_dir: PathBuf, level: LevelFilter) -> anyhow::Result<log4rs::Handle> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build();

    std::fs::create_dir_all(&log_dir)?;

    let log_file = log_dir.join("bridge.1.log");
    let log_pattern = log_dir.join("bridge.{}.log");
    let log_pattern = log_pattern
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Log directory is not valid UTF-8: {:?}", log_dir))?;

    let roller = FixedWindowRoller::builder().base(1).build(log_pattern, 5)?;
    let trigger = SizeTrigger::new(10 * 1024 * 1024);
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(log_file, Box::new(policy))?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .appender(Appender::builder().build("activity", Box::new(RecentActivityAppender)))
        .build(
            Root::builder()
                .appender("console")
                .appender("logfile")
                .appender("activity")
                .build(level),
        )?;

    Ok(log4rs::init_config(config)?)
}
