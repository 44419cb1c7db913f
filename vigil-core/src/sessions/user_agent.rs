/// Device, browser and OS names derived from a user-agent string.
/// Derived once at session creation and stored alongside the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device: String,
    pub browser: String,
    pub os: String,
}

/// Best-effort classification of a raw user-agent string. Unrecognized
/// agents come back as "unknown" rather than failing.
pub fn parse_user_agent(user_agent: &str) -> DeviceInfo {
    let ua = user_agent.to_ascii_lowercase();

    let device = if ua.contains("ipad") || ua.contains("tablet") {
        "tablet"
    } else if ua.contains("mobile") || ua.contains("iphone") || ua.contains("android") {
        "mobile"
    } else if ua.contains("curl") || ua.contains("wget") || ua.contains("python-requests") {
        "cli"
    } else {
        "desktop"
    };

    // Order matters: Chromium-based agents also advertise Safari
    let browser = if ua.contains("edg/") || ua.contains("edge/") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("firefox/") {
        "Firefox"
    } else if ua.contains("chrome/") || ua.contains("chromium/") {
        "Chrome"
    } else if ua.contains("safari/") {
        "Safari"
    } else if ua.contains("curl/") {
        "curl"
    } else {
        "unknown"
    };

    let os = if ua.contains("windows nt") {
        "Windows"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        "iOS"
    } else if ua.contains("mac os x") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "unknown"
    };

    DeviceInfo {
        device: device.to_owned(),
        browser: browser.to_owned(),
        os: os.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_chrome_on_windows() {
        let info = parse_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        );
        assert_eq!(info.device, "desktop");
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows");
    }

    #[test]
    fn test_mobile_safari_on_iphone() {
        let info = parse_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
        );
        assert_eq!(info.device, "mobile");
        assert_eq!(info.browser, "Safari");
        assert_eq!(info.os, "iOS");
    }

    #[test]
    fn test_edge_is_not_mistaken_for_chrome() {
        let info = parse_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
        );
        assert_eq!(info.browser, "Edge");
    }

    #[test]
    fn test_firefox_on_linux() {
        let info = parse_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
        );
        assert_eq!(info.device, "desktop");
        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.os, "Linux");
    }

    #[test]
    fn test_curl_is_a_cli_device() {
        let info = parse_user_agent("curl/8.4.0");
        assert_eq!(info.device, "cli");
        assert_eq!(info.browser, "curl");
        assert_eq!(info.os, "unknown");
    }

    #[test]
    fn test_empty_agent_falls_back_to_unknown() {
        let info = parse_user_agent("");
        assert_eq!(info.device, "desktop");
        assert_eq!(info.browser, "unknown");
        assert_eq!(info.os, "unknown");
    }
}
