use chrono::{DateTime, Utc};

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a click count with thousands separators
pub fn format_clicks(clicks: u64) -> String {
    let digits = clicks.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Describe the time left on a session, e.g. "expires in 2h 05m"
pub fn format_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(exp) = expires_at else {
        return "no expiry".to_string();
    };
    let minutes = (exp - now).num_minutes();
    if exp <= now {
        "expired".to_string()
    } else if minutes < 1 {
        "expires in <1m".to_string()
    } else if minutes < 60 {
        format!("expires in {}m", minutes)
    } else {
        format!("expires in {}h {:02}m", minutes / 60, minutes % 60)
    }
}

/// Mask a password for display
pub fn mask(s: &str) -> String {
    "*".repeat(s.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("héllo wörld", 7), "héll...");
    }

    #[test]
    fn test_format_clicks() {
        assert_eq!(format_clicks(0), "0");
        assert_eq!(format_clicks(999), "999");
        assert_eq!(format_clicks(1000), "1,000");
        assert_eq!(format_clicks(1234567), "1,234,567");
    }

    #[test]
    fn test_format_expiry() {
        let now = Utc::now();
        assert_eq!(format_expiry(None, now), "no expiry");
        assert_eq!(format_expiry(Some(now - Duration::minutes(1)), now), "expired");
        assert_eq!(format_expiry(Some(now + Duration::seconds(30)), now), "expires in <1m");
        assert_eq!(format_expiry(Some(now + Duration::minutes(45)), now), "expires in 45m");
        assert_eq!(format_expiry(Some(now + Duration::minutes(125)), now), "expires in 2h 05m");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("pässword"), "********");
    }
}
