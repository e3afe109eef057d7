//! Weather Skill Demo
//!
//! A small voice skill built from plain functions with `#[intent]`.
//!
//! # Intents
//!
//! ```text
//! WEATHER__CURRENT     async     location, date?            silent binding
//! WEATHER__FORECAST    blocking  location, period?          TimeRange slot
//! TEMPERATURE__CONVERT async     degrees (typed), unit?     strict binding
//! ALERT__SUBSCRIBE     async     enabled, interval          error handler
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Replays the bundled sample requests
//! cargo run --package weather-skill
//!
//! # Handles one request read from a JSON file
//! cargo run --package weather-skill -- request.json
//! ```

use anyhow::{Context as _, Result};
use serde_json::json;
use tracing::{error, info};
use vox::core::StepUnit;
use vox::prelude::*;

// ============================================================================
// Intent Handlers
// ============================================================================

/// Current conditions. A date the converter cannot read arrives as `Err`.
#[intent("WEATHER__CURRENT")]
async fn current(location: String, date: Option<Result<NaiveDate, ConversionError>>) -> Response {
    match date {
        None => Response::tell(format!("It is sunny in {location} right now.")),
        Some(Ok(date)) => Response::tell(format!("It will be sunny in {location} on {date}.")),
        Some(Err(_)) => Response::ask(format!("For which day do you want the weather in {location}?")),
    }
}

/// Day-by-day forecast over a period. Runs on the blocking pool.
#[intent("WEATHER__FORECAST")]
fn forecast(location: String, period: Option<TimeRange>) -> Result<String> {
    let Some(period) = period else {
        return Ok(format!("Sunny in {location} all week."));
    };

    let days = period
        .steps(StepUnit::Days)
        .take(7)
        .map(|day| day.map(|day| day.format("%a %d %b").to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("Forecast for {location}: sunny on {}.", days.join(", ")))
}

/// Converts a temperature; any unreadable slot is an error for the caller.
#[intent("TEMPERATURE__CONVERT", silent = false)]
async fn convert(degrees: AttributeV2<i64>, unit: Option<String>) -> String {
    match unit.as_deref() {
        Some("fahrenheit") => {
            let celsius = (degrees.value - 32) * 5 / 9;
            format!("{} degrees Fahrenheit is {celsius} degrees Celsius.", degrees.value)
        }
        _ => {
            let fahrenheit = degrees.value * 9 / 5 + 32;
            format!("{} degrees Celsius is {fahrenheit} degrees Fahrenheit.", degrees.value)
        }
    }
}

async fn ask_again(parameter: String, error: ConversionError) -> Response {
    info!(parameter = %parameter, raw = %error.raw(), "Asking the user to repeat a slot");
    Response::ask(format!("Sorry, I did not catch the {parameter}. Could you repeat it?"))
}

#[intent("ALERT__SUBSCRIBE", error_handler = ask_again)]
async fn subscribe(enabled: bool, interval: TimeDelta) -> String {
    if enabled {
        format!("You will get weather alerts every {} hours.", interval.num_hours())
    } else {
        "Weather alerts are off.".to_string()
    }
}

// ============================================================================
// Sample Requests
// ============================================================================

fn sample_requests() -> Result<Vec<InvokeRequest>> {
    let samples = json!([
        {
            "context": {
                "intent": "WEATHER__CURRENT",
                "locale": "en-US",
                "attributes": { "location": ["Berlin"], "date": ["2026-10-20"] }
            },
            "session": { "id": "demo", "new": true }
        },
        {
            "context": {
                "intent": "WEATHER__CURRENT",
                "locale": "en-US",
                "attributes": { "location": ["Berlin"], "date": ["the day after"] }
            }
        },
        {
            "context": {
                "intent": "WEATHER__FORECAST",
                "locale": "en-GB",
                "attributes": {
                    "location": ["London"],
                    "period": ["2026-10-19T00:00/2026-10-22T00:00"]
                }
            }
        },
        {
            "context": {
                "intent": "TEMPERATURE__CONVERT",
                "locale": "en-US",
                "attributesV2": { "degrees": [{ "id": 1, "value": "21" }] }
            }
        },
        {
            "context": {
                "intent": "TEMPERATURE__CONVERT",
                "locale": "en-US",
                "attributesV2": { "degrees": [{ "id": 1, "value": "warm" }] }
            }
        },
        {
            "context": {
                "intent": "ALERT__SUBSCRIBE",
                "locale": "en-US",
                "attributes": { "enabled": ["ON"], "interval": ["PT6H"] }
            }
        },
        {
            "context": {
                "intent": "ALERT__SUBSCRIBE",
                "locale": "de-DE",
                "attributes": { "enabled": ["maybe"], "interval": ["PT6H"] }
            }
        }
    ]);

    Ok(serde_json::from_value(samples)?)
}

fn read_request(path: &str) -> Result<InvokeRequest> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let skill = Skill::builder().collect_registered().build()?;
    info!(intents = ?skill.intent_names(), "Weather skill loaded");

    let requests = match std::env::args().nth(1) {
        Some(path) => vec![read_request(&path)?],
        None => sample_requests()?,
    };

    for request in requests {
        let intent = request.intent().to_string();
        match skill.handle(request).await {
            Ok(response) => println!("{intent}: {}", serde_json::to_string(&response)?),
            Err(e) => error!(intent = %intent, error = %e, "Request failed"),
        }
    }

    Ok(())
}
