//! Human-friendly output for every UI state.

use chrono::{DateTime, FixedOffset, Utc};
use skywatch_core::{
    AppState, ConditionGroup, CurrentWeather, DailyForecastSummary, ForecastEntry, UiState,
    WeatherSnapshot,
    forecast::{HOURLY_SAMPLES, hourly},
};

/// State listener: loading messages go to stderr as they happen.
pub fn on_change(state: &AppState) {
    if let UiState::Loading { message } = state.ui() {
        eprintln!("⏳ {message}");
    }
}

/// Print the screen for the current state.
pub fn print_state(state: &AppState, forecast_days: usize) {
    match state.ui() {
        UiState::Welcome { last_city } => println!("{}", welcome(last_city.as_deref())),
        UiState::Loading { message } => eprintln!("⏳ {message}"),
        UiState::Error { message } => eprintln!("⚠  {message}"),
        UiState::WeatherDisplay => {
            if let Some(snapshot) = state.snapshot() {
                println!("{}", weather(snapshot, &state.daily_forecast(forecast_days)));
            }
        }
    }
}

pub fn welcome(last_city: Option<&str>) -> String {
    let mut out = String::from("Welcome to SkyWatch. Search for a city or use your location.");
    if let Some(city) = last_city {
        out.push_str(&format!("\nLast searched: {city}"));
    }
    out
}

pub fn weather(snapshot: &WeatherSnapshot, daily: &[DailyForecastSummary]) -> String {
    let current = &snapshot.current;
    let offset = current.timezone_offset_secs;

    let mut lines = current_block(current);

    let next = hourly(&snapshot.forecast, HOURLY_SAMPLES);
    if !next.is_empty() {
        lines.push(String::new());
        lines.push("Next hours".to_string());
        lines.extend(next.iter().map(|entry| hourly_line(entry, offset)));
    }

    if !daily.is_empty() {
        lines.push(String::new());
        lines.push(format!("{}-day forecast", daily.len()));
        lines.extend(daily.iter().map(daily_line));
    }

    lines.join("\n")
}

fn current_block(current: &CurrentWeather) -> Vec<String> {
    let glyph = ConditionGroup::from_code(current.condition_code).glyph();
    let offset = current.timezone_offset_secs;

    vec![
        format!("{glyph} {}, {}", current.name, current.country),
        format!(
            "{}  {}  (feels like {})",
            temperature(current.temperature_c),
            capitalize(&current.description),
            temperature(current.feels_like_c)
        ),
        format!(
            "Humidity {}%   Wind {}   Visibility {}   Pressure {} hPa",
            current.humidity_pct,
            wind(current.wind_speed_mps),
            visibility(current.visibility_m),
            current.pressure_hpa
        ),
        format!(
            "Sunrise {}   Sunset {}   Updated {}",
            city_time(current.sunrise, offset),
            city_time(current.sunset, offset),
            city_time(current.observed_at, offset)
        ),
    ]
}

fn hourly_line(entry: &ForecastEntry, offset_secs: i32) -> String {
    format!(
        "  {}  {} {:>5}",
        city_time(entry.timestamp, offset_secs),
        ConditionGroup::from_code(entry.condition_code).glyph(),
        temperature(entry.temperature_c)
    )
}

fn daily_line(day: &DailyForecastSummary) -> String {
    format!(
        "  {}  {} {:>5}  {}",
        day.date.format("%a %d %b"),
        ConditionGroup::from_code(day.condition_code).glyph(),
        temperature(day.temperature_c),
        day.description
    )
}

/// Rounded to the nearest degree.
fn temperature(celsius: f64) -> String {
    format!("{:.0}°C", celsius)
}

/// m/s shown as km/h.
fn wind(mps: f64) -> String {
    format!("{:.0} km/h", mps * 3.6)
}

fn visibility(meters: Option<u32>) -> String {
    match meters {
        Some(m) => format!("{:.1} km", f64::from(m) / 1000.0),
        None => "n/a".to_string(),
    }
}

/// Wall-clock time at the reported location.
fn city_time(at: DateTime<Utc>, offset_secs: i32) -> String {
    match FixedOffset::east_opt(offset_secs) {
        Some(tz) => at.with_timezone(&tz).format("%H:%M").to_string(),
        None => at.format("%H:%M UTC").to_string(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            current: CurrentWeather {
                name: "Paris".into(),
                country: "FR".into(),
                observed_at: at("2026-06-01T10:00:00Z"),
                timezone_offset_secs: 7200,
                temperature_c: 21.6,
                feels_like_c: 20.2,
                humidity_pct: 55,
                wind_speed_mps: 5.0,
                visibility_m: Some(10_000),
                pressure_hpa: 1015,
                condition_code: 800,
                description: "clear sky".into(),
                sunrise: at("2026-06-01T03:50:00Z"),
                sunset: at("2026-06-01T19:45:00Z"),
            },
            forecast: (0..10)
                .map(|i| ForecastEntry {
                    timestamp: at("2026-06-01T12:00:00Z") + chrono::Duration::hours(3 * i),
                    temperature_c: 20.0,
                    condition_code: 500,
                    description: "light rain".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(temperature(21.6), "22°C");
        assert_eq!(wind(5.0), "18 km/h");
        assert_eq!(visibility(Some(10_000)), "10.0 km");
        assert_eq!(visibility(Some(2_500)), "2.5 km");
        assert_eq!(visibility(None), "n/a");
    }

    #[test]
    fn times_use_the_city_offset() {
        assert_eq!(city_time(at("2026-06-01T03:50:00Z"), 7200), "05:50");
        assert_eq!(city_time(at("2026-06-01T03:50:00Z"), -5 * 3600), "22:50");
    }

    #[test]
    fn capitalizes_description() {
        assert_eq!(capitalize("clear sky"), "Clear sky");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn welcome_mentions_last_city() {
        assert!(welcome(Some("Berlin")).contains("Last searched: Berlin"));
        assert!(!welcome(None).contains("Last searched"));
    }

    #[test]
    fn weather_screen_sections() {
        let daily = vec![DailyForecastSummary {
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            temperature_c: 31.0,
            condition_code: 800,
            description: "clear sky".into(),
            samples: 2,
        }];
        let text = weather(&snapshot(), &daily);

        assert!(text.starts_with("☀ Paris, FR"));
        assert!(text.contains("Clear sky"));
        assert!(text.contains("Sunrise 05:50"));
        assert!(text.contains("Sunset 21:45"));
        assert!(text.contains("Pressure 1015 hPa"));
        assert!(text.contains("1-day forecast"));
        assert!(text.contains("Mon 01 Jun"));

        let hourly_rows = text.lines().filter(|l| l.contains("🌧")).count();
        assert_eq!(hourly_rows, HOURLY_SAMPLES);
    }
}
