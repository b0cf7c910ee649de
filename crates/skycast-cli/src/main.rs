use anyhow::{Context, Result};
use skycast_weather::{create_client, destroy_client, Mode};

const API_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let api_key = std::env::var(API_KEY_VAR)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .with_context(|| format!("Set the {} environment variable", API_KEY_VAR))?;

    let city = std::env::args().nth(1).unwrap_or_else(|| "London".to_string());

    let client = create_client(&api_key, Mode::OnDemand)?;
    let result = client.get_current_weather(&city).await;

    // Destroy before reporting so the registry is clean on every path
    destroy_client(&api_key);
    let response = result.with_context(|| format!("Failed to fetch weather for '{}'", city))?;

    println!("City: {}", response.name.as_deref().unwrap_or(&city));
    if let Some(weather) = &response.weather {
        println!(
            "Weather: {} ({})",
            weather.main.as_deref().unwrap_or("-"),
            weather.description.as_deref().unwrap_or("-")
        );
    }
    println!("Temperature: {}", response.temperature.temp);
    println!("Feels like: {}", response.temperature.feels_like);
    println!("Wind speed: {}", response.wind.speed);

    tracing::debug!("Weather lookup finished");
    Ok(())
}
