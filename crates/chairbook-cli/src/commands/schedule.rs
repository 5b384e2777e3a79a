use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Subcommand)]
pub enum HoursCommands {
    /// Show the weekly schedule
    List {
        #[arg(long)]
        provider: Option<Uuid>,
    },
    /// Replace one weekday's window and intervals
    Set {
        #[arg(help = "Weekday, 0 = Sunday through 6 = Saturday")]
        weekday: u8,
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long, help = "Grid start, HH:MM")]
        start: String,
        #[arg(long, help = "Grid end, HH:MM")]
        end: String,
        #[arg(long = "interval", value_parser = parse_interval, help = "Bookable interval HH:MM-HH:MM (repeatable)")]
        intervals: Vec<Interval>,
        #[arg(long, help = "Mark the weekday as closed")]
        inactive: bool,
    },
}

#[derive(Subcommand)]
pub enum BlockCommands {
    /// Block a whole date
    Add {
        date: NaiveDate,
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List blocked dates
    List {
        #[arg(long)]
        provider: Option<Uuid>,
        #[arg(long, help = "Only dates on or after this one")]
        from: Option<NaiveDate>,
    },
    /// Unblock a date
    Remove {
        date: NaiveDate,
        #[arg(long)]
        provider: Option<Uuid>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    pub start: String,
    pub end: String,
}

fn parse_interval(raw: &str) -> Result<Interval, String> {
    match raw.split_once('-') {
        Some((start, end)) if !start.is_empty() && !end.is_empty() => Ok(Interval {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
        }),
        _ => Err(format!("expected HH:MM-HH:MM, got `{raw}`")),
    }
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    active: bool,
    start_time: String,
    end_time: String,
    intervals: Vec<Interval>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct WorkingHour {
    #[tabled(display_with = "display_weekday")]
    pub weekday: u8,
    pub active: bool,
    pub start_time: String,
    pub end_time: String,
    #[tabled(display_with = "display_intervals")]
    pub intervals: Vec<Interval>,
}

fn display_weekday(w: &u8) -> String {
    WEEKDAYS.get(*w as usize).copied().unwrap_or("?").to_string()
}

fn display_intervals(intervals: &[Interval]) -> String {
    if intervals.is_empty() {
        return "-".into();
    }
    intervals
        .iter()
        .map(|i| format!("{}-{}", i.start, i.end))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct BlockedDay {
    pub date: NaiveDate,
    #[tabled(display_with = "display_reason")]
    pub reason: Option<String>,
}

fn display_reason(r: &Option<String>) -> String {
    r.clone().unwrap_or_else(|| "-".into())
}

#[derive(Debug, Serialize)]
struct BlockRequest {
    date: NaiveDate,
    reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Availability {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub slots: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Summary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub scheduled_count: u64,
    pub completed_count: u64,
    pub cancelled_count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
}

pub async fn run_hours(cmd: HoursCommands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        HoursCommands::List { provider } => {
            let provider = config.provider(provider)?;
            let hours: Vec<WorkingHour> = client
                .get(&format!("/v1/providers/{}/working-hours", provider))
                .await?;
            output::print_items(hours, format);
        }
        HoursCommands::Set {
            weekday,
            provider,
            start,
            end,
            intervals,
            inactive,
        } => {
            if weekday > 6 {
                bail!("weekday must be between 0 (Sunday) and 6 (Saturday)");
            }
            let provider = config.provider(provider)?;
            let req = UpsertRequest {
                active: !inactive,
                start_time: start,
                end_time: end,
                intervals,
            };
            let hour: WorkingHour = client
                .put(&format!("/v1/providers/{}/working-hours/{}", provider, weekday), &req)
                .await?;
            output::print_item(hour, format);
        }
    }

    Ok(())
}

pub async fn run_block(cmd: BlockCommands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        BlockCommands::Add { date, provider, reason } => {
            let provider = config.provider(provider)?;
            let day: BlockedDay = client
                .post(
                    &format!("/v1/providers/{}/blocked-days", provider),
                    &BlockRequest { date, reason },
                )
                .await?;
            output::print_created(day, format);
        }
        BlockCommands::List { provider, from } => {
            let provider = config.provider(provider)?;
            let mut url = format!("/v1/providers/{}/blocked-days", provider);
            if let Some(from) = from {
                url.push_str(&format!("?from={}", from));
            }
            let days: Vec<BlockedDay> = client.get(&url).await?;
            output::print_items(days, format);
        }
        BlockCommands::Remove { date, provider } => {
            let provider = config.provider(provider)?;
            client
                .delete(&format!("/v1/providers/{}/blocked-days/{}", provider, date))
                .await?;
            output::print_success(&format!("Unblocked {}", date));
        }
    }

    Ok(())
}

pub async fn run_slots(
    provider: Option<Uuid>,
    date: NaiveDate,
    duration: Option<u32>,
    services: Vec<Uuid>,
    config: &Config,
    format: Format,
) -> Result<()> {
    let client = ApiClient::new(config);
    let provider = config.provider(provider)?;

    let mut url = format!("/v1/providers/{}/availability?date={}", provider, date);
    match (duration, services.is_empty()) {
        (Some(minutes), _) => url.push_str(&format!("&duration={}", minutes)),
        (None, false) => {
            let ids: Vec<String> = services.iter().map(Uuid::to_string).collect();
            url.push_str(&format!("&service_ids={}", ids.join(",")));
        }
        (None, true) => bail!("pass --duration or at least one --service"),
    }

    let availability: Availability = client.get(&url).await?;
    match format {
        Format::Json => output::print_json(&availability),
        Format::Table => output::print_slots(availability.date, availability.duration_minutes, &availability.slots),
    }

    Ok(())
}

pub async fn run_summary(
    provider: Option<Uuid>,
    from: NaiveDate,
    to: NaiveDate,
    config: &Config,
    format: Format,
) -> Result<()> {
    let client = ApiClient::new(config);
    let provider = config.provider(provider)?;

    let summary: Summary = client
        .get(&format!("/v1/providers/{}/summary?from={}&to={}", provider, from, to))
        .await?;
    output::print_item(summary, format);

    Ok(())
}
