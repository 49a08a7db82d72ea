use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

mod state;

pub use state::State;

/// Empty when nothing could be extracted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.zip.is_none()
    }
}

// <anything>[,] XX [99999] at the end of the string
static TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(.*?)(?:,\s*|\s+))?([a-z]{2})(?:\s+([0-9]{5}))?$").expect("hardcoded")
});

/// An unknown state code rejects the whole address. State codes come back
/// lowercase ("ar").
pub fn parse_address(text: &str) -> Location {
    let text = text.trim();
    if text.is_empty() {
        return Location::default();
    }

    let Some(captures) = TAIL.captures(text) else {
        return Location::default();
    };

    let code = captures[2].to_ascii_uppercase();
    let state = match code.parse::<State>() {
        Ok(x) => x,
        Err(_) => return Location::default(),
    };

    let before = captures.get(1).map(|x| x.as_str().trim()).unwrap_or_default();
    let city = if before.contains(',') {
        before
            .split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .last()
            .and_then(clean_city)
    } else {
        trailing_city(before)
    };

    Location {
        city,
        state: Some(state.code().to_lowercase()),
        zip: captures.get(3).map(|x| x.as_str().to_string()),
    }
}

/// City guess for addresses without commas, e.g. "19229 Colonel Glenn Rd
/// Little Rock": the last two words, or the only word.
///
/// Single-word cities after a street ("12 Oak St Dallas") come back as two
/// words ("St Dallas").
pub fn trailing_city(before: &str) -> Option<String> {
    let words: Vec<_> = before.split_whitespace().collect();
    let city = match words.len() {
        0 => return None,
        1 => words[0].to_string(),
        n => words[n - 2..].join(" "),
    };
    clean_city(&city)
}

/// Trims whitespace and surrounding punctuation, `None` if nothing is left.
pub fn clean_city(raw: &str) -> Option<String> {
    let city = raw.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
    if city.is_empty() {
        None
    } else {
        Some(city.to_string())
    }
}

/// First five digits of a ZIP or ZIP+4 ("72210-1234"), `None` otherwise.
pub fn five_digit_zip(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let (zip, plus4) = match raw.split_once('-') {
        Some((zip, plus4)) => (zip, Some(plus4)),
        None => (raw, None),
    };

    let digits = |x: &str, len: usize| x.len() == len && x.bytes().all(|b| b.is_ascii_digit());
    if !digits(zip, 5) || plus4.is_some_and(|x| !digits(x, 4)) {
        return None;
    }
    Some(zip.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(x: &Location) -> (Option<&str>, Option<&str>, Option<&str>) {
        (x.city.as_deref(), x.state.as_deref(), x.zip.as_deref())
    }

    #[test]
    fn comma_separated() {
        assert_eq!(
            triple(&parse_address("9 Apple Tree Cir, Little Rock, AR 72210")),
            (Some("Little Rock"), Some("ar"), Some("72210"))
        );
        assert_eq!(
            triple(&parse_address("123 Main St, Dallas, TX 75201")),
            (Some("Dallas"), Some("tx"), Some("75201"))
        );
        assert_eq!(
            triple(&parse_address("123 Main St, Dallas TX")),
            (Some("Dallas"), Some("tx"), None)
        );
    }

    #[test]
    fn space_separated() {
        assert_eq!(
            triple(&parse_address("19229 Colonel Glenn Rd Little Rock AR 72210")),
            (Some("Little Rock"), Some("ar"), Some("72210"))
        );
        assert_eq!(
            triple(&parse_address("Memphis TN 38103")),
            (Some("Memphis"), Some("tn"), Some("38103"))
        );
        // known limitation of the two-word guess
        assert_eq!(
            parse_address("12 Oak St Dallas TX 75201").city.as_deref(),
            Some("St Dallas")
        );
    }

    #[test]
    fn state_without_city() {
        assert_eq!(
            triple(&parse_address("TX 75201")),
            (None, Some("tx"), Some("75201"))
        );
        assert_eq!(triple(&parse_address(", TX")), (None, Some("tx"), None));
    }

    #[test]
    fn multiple_commas_take_last_segment() {
        assert_eq!(
            parse_address("Unit 4, 100 Main St, , Hot Springs,, AR 71901")
                .city
                .as_deref(),
            Some("Hot Springs")
        );
    }

    #[test]
    fn every_state_code() {
        for state in State::all() {
            let parsed = parse_address(&format!("1 Main St, Springfield, {} 12345", state.code()));
            assert_eq!(parsed.state, Some(state.code().to_lowercase()));
            assert_eq!(parsed.zip.as_deref(), Some("12345"));
        }
    }

    #[test]
    fn lowercase_code_accepted() {
        assert_eq!(
            triple(&parse_address("1 Elm St, Tulsa, ok 74103")),
            (Some("Tulsa"), Some("ok"), Some("74103"))
        );
    }

    #[test]
    fn invalid_state_rejects_everything() {
        assert!(parse_address("123 Main St, Dallas, ZZ 75201").is_empty());
        assert!(parse_address("123 Main St, Dallas, ZZ").is_empty());
        assert!(parse_address("19229 Colonel Glenn Rd Little Rock DC 20001").is_empty());
    }

    #[test]
    fn unparseable() {
        assert!(parse_address("").is_empty());
        assert!(parse_address("   ").is_empty());
        assert!(parse_address("123 Main St").is_empty());
        assert!(parse_address("123 Main St, Dallas, Texas 75201").is_empty());
        assert!(parse_address("123 Main St, Dallas, TX 7520").is_empty());
        assert!(parse_address("123 Main St, Dallas, TX 75201-1234").is_empty());
    }

    #[test]
    fn zip_must_be_ascii() {
        let location = parse_address("1 Main St, Dallas, TX \u{667}\u{665}\u{662}\u{660}\u{661}");
        assert!(location.is_empty());
    }

    #[test]
    fn city_punctuation_trimmed() {
        assert_eq!(
            parse_address("5 Pine Rd, Little Rock., AR 72210").city.as_deref(),
            Some("Little Rock")
        );
    }

    #[test]
    fn reparse_is_stable() {
        for text in [
            "9 Apple Tree Cir, Little Rock, AR 72210",
            "19229 Colonel Glenn Rd Little Rock AR 72210",
            "123 Main St, Dallas, TX 75201",
            "Memphis TN",
        ] {
            let first = parse_address(text);
            let state = first.state.as_deref().unwrap().to_uppercase();
            let rebuilt = match &first.zip {
                Some(zip) => format!("{}, {state} {zip}", first.city.as_deref().unwrap()),
                None => format!("{}, {state}", first.city.as_deref().unwrap()),
            };
            assert_eq!(parse_address(&rebuilt), first);
        }
    }

    #[test]
    fn zip_prefix() {
        assert_eq!(five_digit_zip("72210"), Some("72210".to_string()));
        assert_eq!(five_digit_zip(" 72210-1234 "), Some("72210".to_string()));
        assert_eq!(five_digit_zip("7221"), None);
        assert_eq!(five_digit_zip("72210-12"), None);
        assert_eq!(five_digit_zip("K1A 0B1"), None);
    }
}
