//! Touchpoint commands for CLI.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Subcommand;
use std::io::{BufRead, Write};

use tchpnt_core::storage::TouchpointDefaults;
use tchpnt_core::{
    rank, ActionDispatcher, ActionFlow, CadencePreset, Category, Config, NoopDispatcher,
    PreferredAction, RankedTouchpoint, Severity, TouchpointDb, TouchpointDraft,
    TouchpointService, UrlDispatcher,
};

#[derive(Subcommand)]
pub enum TouchpointAction {
    /// Add a touchpoint
    Add {
        /// Display name
        name: String,
        /// Phone number or other address the action is sent to
        #[arg(long)]
        channel: String,
        /// daily, weekly, monthly or a number of days (default from config)
        #[arg(long)]
        cadence: Option<CadencePreset>,
        /// message, call or meetup (default from config)
        #[arg(long)]
        action: Option<PreferredAction>,
        /// personal or business
        #[arg(long)]
        category: Option<Category>,
        /// Date of the last contact, YYYY-MM-DD (default: today)
        #[arg(long)]
        last_contact: Option<NaiveDate>,
        /// Print the new record as JSON
        #[arg(long)]
        json: bool,
    },
    /// List touchpoints, most urgent first
    List {
        /// Only show this category
        #[arg(long)]
        category: Option<Category>,
        /// Rank as of this local date, YYYY-MM-DD
        #[arg(long)]
        at: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Show one touchpoint
    Show {
        /// Touchpoint ID or a unique prefix of it
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Run the preferred action, then offer to reset
    Contact {
        /// Touchpoint ID or a unique prefix of it
        id: String,
        /// Reset without asking
        #[arg(long, conflicts_with = "no_reset")]
        yes: bool,
        /// Never reset
        #[arg(long)]
        no_reset: bool,
        /// Skip opening the message/call handler
        #[arg(long)]
        no_dispatch: bool,
    },
    /// Mark contact as made today
    Reset {
        /// Touchpoint ID or a unique prefix of it
        id: String,
    },
    /// Delete a touchpoint
    Delete {
        /// Touchpoint ID or a unique prefix of it
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: TouchpointAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut service = TouchpointService::open(TouchpointDb::open()?)?;

    match action {
        TouchpointAction::Add {
            name,
            channel,
            cadence,
            action,
            category,
            last_contact,
            json,
        } => {
            let draft = build_draft(
                &config.touchpoints,
                name,
                channel,
                cadence,
                action,
                category,
                last_contact,
            )?;
            let record = service.create(draft, Utc::now())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Touchpoint created: {}", record.id);
            }
        }
        TouchpointAction::List { category, at, json } => {
            let now = match at {
                Some(date) => local_noon(date)?,
                None => Local::now(),
            };
            let ranked = service.ranked(&now, category);
            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                print_ranking(&ranked);
            }
        }
        TouchpointAction::Show { id, json } => {
            let record = service.resolve(&id)?;
            let ranked = rank([record], &Local::now(), None);
            if json {
                println!("{}", serde_json::to_string_pretty(&ranked[0])?);
            } else {
                print_details(&ranked[0]);
            }
        }
        TouchpointAction::Contact {
            id,
            yes,
            no_reset,
            no_dispatch,
        } => {
            let record = service.resolve(&id)?.clone();
            let dispatcher: Box<dyn ActionDispatcher> = if no_dispatch || !config.dispatch.enabled {
                Box::new(NoopDispatcher)
            } else {
                Box::new(UrlDispatcher)
            };
            let mut flow = ActionFlow::new(dispatcher)
                .with_prompt_after_dispatch(config.dispatch.prompt_reset_after_dispatch || yes);

            if record.preferred_action.dispatches() {
                println!("{} {} at {}", record.preferred_action, record.name, record.channel);
            } else {
                println!("Meet up with {}", record.name);
            }
            if !flow.invoke(&record)? {
                return Ok(());
            }

            let reset = if yes {
                true
            } else if no_reset {
                false
            } else {
                confirm(&format!("Reset {}?", record.name))?
            };
            if reset {
                let updated = flow.confirm_reset(&mut service, Utc::now())?;
                println!("Reset: {} (due in {} days)", updated.name, updated.cadence_days);
            } else {
                flow.cancel();
                println!("Not reset");
            }
        }
        TouchpointAction::Reset { id } => {
            let target = service.resolve(&id)?.id.clone();
            let updated = service.reset(&target, Utc::now())?;
            println!("Reset: {} (due in {} days)", updated.name, updated.cadence_days);
        }
        TouchpointAction::Delete { id, yes } => {
            let record = service.resolve(&id)?.clone();
            let mut flow = ActionFlow::new(NoopDispatcher);
            flow.request_delete(&record)?;
            if yes || confirm(&format!("Delete {}? This cannot be undone.", record.name))? {
                flow.confirm_delete(&mut service)?;
                println!("Deleted: {}", record.name);
            } else {
                flow.cancel();
                println!("Kept: {}", record.name);
            }
        }
    }
    Ok(())
}

fn build_draft(
    defaults: &TouchpointDefaults,
    name: String,
    channel: String,
    cadence: Option<CadencePreset>,
    action: Option<PreferredAction>,
    category: Option<Category>,
    last_contact: Option<NaiveDate>,
) -> Result<TouchpointDraft, Box<dyn std::error::Error>> {
    let cadence_days = cadence
        .map(|c| c.days())
        .unwrap_or(defaults.default_cadence_days);
    let mut draft = TouchpointDraft::new(
        name,
        channel,
        cadence_days,
        action.unwrap_or(defaults.default_action),
    );
    if let Some(category) = category {
        draft = draft.with_category(category);
    }
    if let Some(date) = last_contact {
        draft = draft.with_last_contact_at(local_noon(date)?.with_timezone(&Utc));
    }
    Ok(draft)
}

/// Noon keeps the date stable across DST shifts.
fn local_noon(date: NaiveDate) -> Result<DateTime<Local>, Box<dyn std::error::Error>> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).ok_or("invalid time")?;
    Local
        .from_local_datetime(&date.and_time(noon))
        .earliest()
        .ok_or_else(|| format!("{date} has no local noon").into())
}

fn confirm(question: &str) -> Result<bool, Box<dyn std::error::Error>> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Overdue => "!!",
        Severity::DueSoon => "! ",
        Severity::OnTrack => "  ",
    }
}

pub(crate) fn print_ranking(ranked: &[RankedTouchpoint<'_>]) {
    if ranked.is_empty() {
        println!("No touchpoints. Add one with `tchpnt add`.");
        return;
    }
    for item in ranked {
        let short_id: String = item.record.id.as_str().chars().take(8).collect();
        println!(
            "{} {}  {:<24} {:<20} {}",
            marker(item.severity),
            short_id,
            item.record.name,
            item.label,
            item.record.preferred_action,
        );
    }
}

fn print_details(item: &RankedTouchpoint<'_>) {
    let record = item.record;
    println!("ID:           {}", record.id);
    println!("Name:         {}", record.name);
    println!("Channel:      {}", record.channel);
    println!("Cadence:      every {} days", record.cadence_days);
    println!("Action:       {}", record.preferred_action);
    if let Some(category) = record.category {
        println!("Category:     {category}");
    }
    println!(
        "Last contact: {}",
        record.last_contact_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!("Status:       {} ({})", item.label, item.severity.as_str());
}
