//! Lenient mapping of the upstream JSON document into [`WeatherResponse`].
//!
//! Every field is read through an accessor that falls back to a default when
//! the field is missing, null or of the wrong type. Only a body that is not a
//! JSON object at all is rejected.

use serde_json::{Map, Value};

use crate::error::WeatherError;
use crate::types::{SysInfo, TemperatureInfo, WeatherInfo, WeatherResponse, WindInfo};

type Object = Map<String, Value>;

fn object<'a>(parent: &'a Object, key: &str) -> Option<&'a Object> {
    parent.get(key).and_then(Value::as_object)
}

fn string_field(obj: Option<&Object>, key: &str) -> Option<String> {
    obj?.get(key)?.as_str().map(str::to_owned)
}

fn f64_field(obj: Option<&Object>, key: &str) -> f64 {
    obj.and_then(|o| o.get(key))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn i64_field(obj: Option<&Object>, key: &str) -> i64 {
    obj.and_then(|o| o.get(key))
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
}

fn i32_field(obj: Option<&Object>, key: &str) -> i32 {
    i32::try_from(i64_field(obj, key)).unwrap_or(0)
}

/// Map a success body into a response.
///
/// # Errors
/// Returns `WeatherError::Parsing` if the body is not valid JSON or is not a
/// JSON object.
pub fn parse_weather_response(body: &str) -> Result<WeatherResponse, WeatherError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| WeatherError::Parsing(e.to_string()))?;
    let root = document
        .as_object()
        .ok_or_else(|| WeatherError::Parsing("expected a JSON object".to_string()))?;

    // Only the first condition matters; an empty or missing list stays absent
    let weather = root
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(Value::as_object)
        .map(|first| WeatherInfo {
            main: string_field(Some(first), "main"),
            description: string_field(Some(first), "description"),
        });

    let main = object(root, "main");
    let wind = object(root, "wind");
    let sys = object(root, "sys");

    Ok(WeatherResponse {
        weather,
        temperature: TemperatureInfo {
            temp: f64_field(main, "temp"),
            feels_like: f64_field(main, "feels_like"),
        },
        visibility: i32_field(Some(root), "visibility"),
        wind: WindInfo {
            speed: f64_field(wind, "speed"),
        },
        datetime: i64_field(Some(root), "dt"),
        sys: SysInfo {
            sunrise: i64_field(sys, "sunrise"),
            sunset: i64_field(sys, "sunset"),
        },
        timezone: i32_field(Some(root), "timezone"),
        name: string_field(Some(root), "name"),
    })
}

/// Best-effort read of the `message` field of an upstream error body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let document: Value = serde_json::from_str(body).ok()?;
    match document.get("message")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: &str = r#"{
        "weather": [{"main": "Clear", "description": "clear sky"}],
        "main": {"temp": 15.0, "feels_like": 14.0},
        "visibility": 10000,
        "wind": {"speed": 3.1},
        "dt": 1700000000,
        "sys": {"sunrise": 1699990000, "sunset": 1700030000},
        "timezone": 3600,
        "name": "London"
    }"#;

    #[test]
    fn test_full_document() {
        let response = parse_weather_response(LONDON).unwrap();

        let weather = response.weather.unwrap();
        assert_eq!(weather.main.as_deref(), Some("Clear"));
        assert_eq!(weather.description.as_deref(), Some("clear sky"));
        assert_eq!(response.temperature.temp, 15.0);
        assert_eq!(response.temperature.feels_like, 14.0);
        assert_eq!(response.visibility, 10000);
        assert_eq!(response.wind.speed, 3.1);
        assert_eq!(response.datetime, 1_700_000_000);
        assert_eq!(response.sys.sunrise, 1_699_990_000);
        assert_eq!(response.sys.sunset, 1_700_030_000);
        assert_eq!(response.timezone, 3600);
        assert_eq!(response.name.as_deref(), Some("London"));
    }

    #[test]
    fn test_empty_weather_list_stays_absent() {
        let response = parse_weather_response(r#"{"weather": [], "name": "Oslo"}"#).unwrap();
        assert!(response.weather.is_none());
        assert_eq!(response.name.as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_weather_not_a_list() {
        let response = parse_weather_response(r#"{"weather": {"main": "Rain"}}"#).unwrap();
        assert!(response.weather.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let response = parse_weather_response("{}").unwrap();
        assert_eq!(response, WeatherResponse::default());
    }

    #[test]
    fn test_wrong_types_default() {
        let response = parse_weather_response(
            r#"{
                "weather": [{"main": 7, "description": null}],
                "main": "hot",
                "visibility": "far",
                "wind": {"speed": "fast"},
                "dt": null,
                "sys": [],
                "timezone": 7200.0,
                "name": 42
            }"#,
        )
        .unwrap();

        assert_eq!(response.weather, Some(WeatherInfo::default()));
        assert_eq!(response.temperature, TemperatureInfo::default());
        assert_eq!(response.visibility, 0);
        assert_eq!(response.wind.speed, 0.0);
        assert_eq!(response.datetime, 0);
        assert_eq!(response.sys, SysInfo::default());
        assert_eq!(response.timezone, 7200);
        assert!(response.name.is_none());
    }

    #[test]
    fn test_invalid_json_fails() {
        assert!(matches!(
            parse_weather_response("<html>bad gateway</html>"),
            Err(WeatherError::Parsing(_))
        ));
        assert!(matches!(
            parse_weather_response("[1, 2, 3]"),
            Err(WeatherError::Parsing(_))
        ));
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"cod":"404","message":"city not found"}"#).as_deref(),
            Some("city not found")
        );
        assert_eq!(extract_error_message(r#"{"message": null}"#), None);
        assert_eq!(extract_error_message(r#"{"cod": 500}"#), None);
        assert_eq!(extract_error_message("Internal Server Error"), None);
        assert_eq!(extract_error_message(""), None);
    }
}
