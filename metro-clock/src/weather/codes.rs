//! WMO weather interpretation codes, as reported by Open-Meteo.

/// Human-readable form of a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub summary: &'static str,
    pub icon: &'static str,
}

const UNKNOWN: Condition = Condition {
    summary: "Weather",
    icon: "🌡️",
};

/// Look up the summary text and icon for a weather code.
pub fn condition(code: Option<i64>) -> Condition {
    let Some(code) = code else {
        return UNKNOWN;
    };

    let (summary, icon) = match code {
        0 => ("Clear", "☀️"),
        1 => ("Mainly clear", "🌤️"),
        2 => ("Partly cloudy", "⛅"),
        3 => ("Overcast", "☁️"),
        45 => ("Fog", "🌫️"),
        48 => ("Depositing rime fog", "🌫️"),
        51 => ("Light drizzle", "🌧️"),
        53 => ("Drizzle", "🌧️"),
        55 => ("Heavy drizzle", "🌧️"),
        61 => ("Light rain", "🌧️"),
        63 => ("Rain", "🌧️"),
        65 => ("Heavy rain", "🌧️"),
        71 => ("Light snow", "🌨️"),
        73 => ("Snow", "🌨️"),
        75 => ("Heavy snow", "🌨️"),
        95 => ("Thunderstorm", "⛈️"),
        96 => ("Thunderstorm w/ hail", "⛈️"),
        99 => ("Thunderstorm w/ heavy hail", "⛈️"),
        _ => return UNKNOWN,
    };

    Condition { summary, icon }
}
