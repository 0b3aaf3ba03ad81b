// src/utils/id_generator.rs
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;

pub const DRIVER_ID_PREFIX: &str = "drv";

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a driver ID with format: drv-{YYMMDD}-{random_suffix}
    /// Where random_suffix is 5 characters: 3 hexchars + 2 alphanumeric or 3 alphanumeric + 2 hexchars
    pub fn generate() -> String {
        Self::generate_with_timestamp(Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string();
        let random_suffix = Self::generate_random_suffix();

        format!("{}-{}-{}", DRIVER_ID_PREFIX, date_part, random_suffix)
    }

    fn generate_random_suffix() -> String {
        if rand::random::<bool>() {
            format!(
                "{}{}",
                Self::generate_hex_chars(3),
                Self::generate_alphanumeric_chars(2)
            )
        } else {
            format!(
                "{}{}",
                Self::generate_alphanumeric_chars(3),
                Self::generate_hex_chars(2)
            )
        }
    }

    fn generate_hex_chars(n: usize) -> String {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        Self::generate_from_chars(HEX_CHARS, n)
    }

    fn generate_alphanumeric_chars(n: usize) -> String {
        const ALPHANUMERIC_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        Self::generate_from_chars(ALPHANUMERIC_CHARS, n)
    }

    fn generate_from_chars(charset: &[u8], n: usize) -> String {
        let mut rng = rand::rng();
        (0..n)
            .map(|_| charset[rng.random_range(0..charset.len())] as char)
            .collect()
    }

    /// Parse an ID to extract its components
    pub fn parse_id(id: &str) -> Option<ParsedId> {
        let mut parts = id.split('-');
        let (prefix, date_part, random_suffix) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || prefix != DRIVER_ID_PREFIX {
            return None;
        }
        if date_part.len() != 6 || random_suffix.len() != 5 {
            return None;
        }
        if !date_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !random_suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let year = 2000 + date_part[0..2].parse::<i32>().ok()?;
        let month = date_part[2..4].parse::<u32>().ok()?;
        let day = date_part[4..6].parse::<u32>().ok()?;

        let parsed = ParsedId {
            year,
            month,
            day,
            random_suffix: random_suffix.to_string(),
        };
        parsed.to_datetime()?;
        Some(parsed)
    }

    /// Whether `id` has the shape of a generated driver ID.
    pub fn validate_id(id: &str) -> bool {
        Self::parse_id(id).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedId {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub random_suffix: String,
}

impl ParsedId {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0).single()
    }
}
