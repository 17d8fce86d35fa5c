//! Templated alert message for emergency contacts.

use time::OffsetDateTime;
use time::macros::format_description;

/// Map link a recipient can open on any phone.
pub fn map_link(latitude: f64, longitude: f64) -> String {
    format!("https://www.google.com/maps?q={latitude},{longitude}")
}

/// Compose the SMS body for one contact.
///
/// Kept short and front-loaded: the name and the map link are what a
/// panicked recipient acts on; everything else is context.
pub fn compose_alert_message(
    user_name: &str,
    user_phone: Option<&str>,
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
    timestamp: OffsetDateTime,
    is_test: bool,
) -> String {
    let test_prefix = if is_test { "[TEST] " } else { "" };
    let phone = user_phone.unwrap_or("unknown number");
    let accuracy_text = match accuracy {
        Some(meters) => format!("{meters}m"),
        None => "Unknown".to_string(),
    };
    let time_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    let time_text = timestamp
        .format(&time_format)
        .unwrap_or_else(|_| timestamp.to_string());
    let kind = if is_test {
        "a TEST emergency alert"
    } else {
        "an emergency alert"
    };

    format!(
        "{test_prefix}EMERGENCY ALERT from {user_name} ({phone})!\n\n\
         Location: {}\n\
         Time: {time_text}\n\
         Accuracy: {accuracy_text}\n\n\
         This is {kind} sent through AquaLink.",
        map_link(latitude, longitude),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn message_contains_map_link_and_name() {
        let body = compose_alert_message(
            "Tendai",
            Some("+26377123456"),
            -17.82,
            31.05,
            Some(8.0),
            datetime!(2025-06-01 12:00:00 UTC),
            false,
        );
        assert!(body.contains("https://www.google.com/maps?q=-17.82,31.05"));
        assert!(body.contains("EMERGENCY ALERT from Tendai (+26377123456)"));
        assert!(body.contains("Accuracy: 8m"));
        assert!(!body.starts_with("[TEST]"));
    }

    #[test]
    fn test_alerts_are_prefixed() {
        let body = compose_alert_message(
            "Tendai",
            None,
            0.0,
            0.0,
            None,
            datetime!(2025-06-01 12:00:00 UTC),
            true,
        );
        assert!(body.starts_with("[TEST] "));
        assert!(body.contains("a TEST emergency alert"));
        assert!(body.contains("(unknown number)"));
        assert!(body.contains("Accuracy: Unknown"));
    }
}
