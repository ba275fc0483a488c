//! FTP reply and listing parsers
//!
//! `LIST` output is not standardized. Lines are normalized from the three
//! formats seen in practice: Unix `ls -l`, MS-DOS/IIS, and the
//! `name|size|timestamp` format of rax-style servers (a trailing `/` on the
//! name marks a directory).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::error::StoreError;
use crate::protocol::store::{RawAttrs, RawEntry};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parses the address out of a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
pub fn parse_pasv(text: &str) -> Result<SocketAddr, StoreError> {
    let numbers = text
        .split(|c: char| !(c.is_ascii_digit() || c == ','))
        .find(|token| token.matches(',').count() == 5)
        .ok_or_else(|| StoreError::Protocol(format!("Malformed PASV reply: {}", text)))?;

    let parts = numbers
        .split(',')
        .map(str::parse::<u8>)
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|_| StoreError::Protocol(format!("Malformed PASV reply: {}", text)))?;

    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = u16::from(parts[4]) << 8 | u16::from(parts[5]);
    Ok(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

/// Extracts the quoted directory from a `257 "/path" ...` reply (`""` escapes a quote).
pub fn parse_quoted_path(text: &str) -> Option<String> {
    let start = text.find('"')? + 1;
    let mut path = String::new();
    let mut chars = text[start..].chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Some(path);
            }
        } else {
            path.push(c);
        }
    }
    None
}

/// Parses an `MDTM` timestamp (`YYYYMMDDHHMMSS[.sss]`, UTC) into epoch seconds.
pub fn parse_mdtm(text: &str) -> Option<u64> {
    let stamp = text.trim().get(..14)?;
    let datetime = NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S").ok()?;
    u64::try_from(datetime.and_utc().timestamp()).ok()
}

/// Normalizes one `LIST` line. Returns `None` for lines that carry no entry.
pub fn parse_list_line(line: &str, now: DateTime<Utc>) -> Option<RawEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with("total ") {
        return None;
    }

    parse_pipe_line(line)
        .or_else(|| parse_unix_line(line, now))
        .or_else(|| parse_dos_line(line))
}

/// Parses a whole `LIST` payload, skipping unrecognized lines.
pub fn parse_listing(payload: &str, now: DateTime<Utc>) -> Vec<RawEntry> {
    payload
        .lines()
        .filter_map(|line| parse_list_line(line, now))
        .collect()
}

/// `name|size|timestamp`
fn parse_pipe_line(line: &str) -> Option<RawEntry> {
    let mut parts = line.rsplitn(3, '|');
    let modified = parts.next()?.trim().parse::<u64>().ok()?;
    let size = parts.next()?.trim().parse::<u64>().ok()?;
    let name = parts.next()?;

    let (name, is_dir) = match name.strip_suffix('/') {
        Some(dir) => (dir, true),
        None => (name, false),
    };
    if name.is_empty() {
        return None;
    }

    Some(RawEntry::new(
        name,
        RawAttrs {
            is_dir,
            size,
            modified,
        },
    ))
}

/// Splits off the first `count` whitespace-separated fields and returns the
/// untouched remainder, so names keep their inner spaces.
fn split_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();

    for _ in 0..count {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest))
}

/// `drwxr-xr-x 2 owner group 4096 Jan 16 14:15 name`; the group column may be absent.
fn parse_unix_line(line: &str, now: DateTime<Utc>) -> Option<RawEntry> {
    let kind = line.chars().next()?;
    if !"-dlbcps".contains(kind) || line.len() < 10 {
        return None;
    }

    for fields_before_name in [8, 7] {
        let Some((fields, rest)) = split_fields(line, fields_before_name) else {
            continue;
        };
        let month_idx = fields_before_name - 3;
        let Some(month) = month_number(fields[month_idx]) else {
            continue;
        };
        let Ok(size) = fields[month_idx - 1].parse::<u64>() else {
            continue;
        };
        let Ok(day) = fields[month_idx + 1].parse::<u32>() else {
            continue;
        };
        if rest.is_empty() {
            return None;
        }

        let modified = unix_timestamp(month, day, fields[month_idx + 2], now).unwrap_or(0);
        let name = match (kind, rest.find(" -> ")) {
            ('l', Some(arrow)) => &rest[..arrow],
            _ => rest,
        };

        return Some(RawEntry::new(
            name,
            RawAttrs {
                is_dir: kind == 'd',
                size,
                modified,
            },
        ));
    }
    None
}

fn month_number(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// `time_or_year` is `HH:MM` (within the last half year) or `YYYY`.
fn unix_timestamp(month: u32, day: u32, time_or_year: &str, now: DateTime<Utc>) -> Option<u64> {
    let datetime = match time_or_year.split_once(':') {
        Some((hour, minute)) => {
            let (hour, minute) = (hour.parse().ok()?, minute.parse().ok()?);
            let this_year = NaiveDate::from_ymd_opt(now.year(), month, day)?
                .and_hms_opt(hour, minute, 0)?
                .and_utc();
            if this_year > now + Duration::days(1) {
                NaiveDate::from_ymd_opt(now.year() - 1, month, day)?
                    .and_hms_opt(hour, minute, 0)?
                    .and_utc()
            } else {
                this_year
            }
        }
        None => NaiveDate::from_ymd_opt(time_or_year.parse().ok()?, month, day)?
            .and_hms_opt(0, 0, 0)?
            .and_utc(),
    };
    u64::try_from(datetime.timestamp()).ok()
}

/// `01-16-24  02:15PM       <DIR>          name` or `... 1234 name`
fn parse_dos_line(line: &str) -> Option<RawEntry> {
    if !line.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let (fields, name) = split_fields(line, 3)?;
    if name.is_empty() {
        return None;
    }

    let stamp = format!("{} {}", fields[0], fields[1]);
    let modified = ["%m-%d-%y %I:%M%p", "%m-%d-%Y %I:%M%p", "%m-%d-%y %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&stamp, fmt).ok())
        .and_then(|dt| u64::try_from(dt.and_utc().timestamp()).ok())?;

    let (is_dir, size) = if fields[2].eq_ignore_ascii_case("<DIR>") {
        (true, 0)
    } else {
        (false, fields[2].parse::<u64>().ok()?)
    };

    Some(RawEntry::new(
        name,
        RawAttrs {
            is_dir,
            size,
            modified,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_pasv() {
        let addr = parse_pasv("Entering Passive Mode (127,0,0,1,195,80).").unwrap();
        assert_eq!(addr, "127.0.0.1:50000".parse().unwrap());
        assert!(parse_pasv("Entering Passive Mode").is_err());
        assert!(parse_pasv("(300,0,0,1,1,1)").is_err());
    }

    #[test]
    fn test_parse_quoted_path() {
        assert_eq!(parse_quoted_path("\"/home/u\" is current directory").as_deref(), Some("/home/u"));
        assert_eq!(parse_quoted_path("\"/a \"\"q\"\"\" created").as_deref(), Some("/a \"q\""));
        assert_eq!(parse_quoted_path("no quotes"), None);
    }

    #[test]
    fn test_parse_mdtm() {
        assert_eq!(parse_mdtm("20240116141500"), Some(1_705_414_500));
        assert_eq!(parse_mdtm("20240116141500.123"), Some(1_705_414_500));
        assert_eq!(parse_mdtm("garbage"), None);
    }

    #[test]
    fn test_unix_line_with_recent_time() {
        let entry =
            parse_list_line("-rw-r--r--   1 ftp  ftp   1024 Jan 16 14:15 my report.txt", now()).unwrap();
        assert_eq!(entry.name, "my report.txt");
        assert!(!entry.attrs.is_dir);
        assert_eq!(entry.attrs.size, 1024);
        assert_eq!(entry.attrs.modified, 1_705_414_500);
    }

    #[test]
    fn test_unix_line_from_last_year_and_without_group() {
        // "Dec 20 10:00" is in the future relative to March 1st, so it belongs to 2023
        let entry = parse_list_line("drwxr-xr-x 2 ftp 4096 Dec 20 10:00 pub", now()).unwrap();
        assert_eq!(entry.name, "pub");
        assert!(entry.attrs.is_dir);
        assert_eq!(entry.attrs.modified, 1_703_066_400);

        let old = parse_list_line("-rw-r--r-- 1 ftp ftp 5 Jun  1  2019 old.log", now()).unwrap();
        assert_eq!(old.attrs.modified, 1_559_347_200);
    }

    #[test]
    fn test_unix_symlink_strips_target() {
        let entry = parse_list_line("lrwxrwxrwx 1 ftp ftp 7 Jan 16 14:15 latest -> v1.2.3", now()).unwrap();
        assert_eq!(entry.name, "latest");
    }

    #[test]
    fn test_dos_lines() {
        let dir = parse_list_line("01-16-24  02:15PM       <DIR>          Reports", now()).unwrap();
        assert!(dir.attrs.is_dir);
        assert_eq!(dir.name, "Reports");
        assert_eq!(dir.attrs.modified, 1_705_414_500);

        let file = parse_list_line("01-16-2024  02:15PM   2048 data file.bin", now()).unwrap();
        assert!(!file.attrs.is_dir);
        assert_eq!(file.attrs.size, 2048);
        assert_eq!(file.name, "data file.bin");
    }

    #[test]
    fn test_pipe_lines() {
        let dir = parse_list_line("uploads/|0|1705414500", now()).unwrap();
        assert!(dir.attrs.is_dir);
        assert_eq!(dir.name, "uploads");

        let file = parse_list_line("notes.txt|42|1705414500", now()).unwrap();
        assert_eq!(file.attrs.size, 42);
        assert_eq!(file.attrs.modified, 1_705_414_500);
    }

    #[test]
    fn test_listing_skips_noise() {
        let payload = "total 8\r\n.|0|0\r\n-rw-r--r-- 1 ftp ftp 3 Jan 16 14:15 a\r\nnot a listing line\r\n\r\n";
        let entries = parse_listing(payload, now());
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".", "a"]);
    }
}
