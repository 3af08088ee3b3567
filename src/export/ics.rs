//! Calendar (ICS) export.
//!
//! One all-day VEVENT per schedulable part: `DTSTART` is the start date,
//! `DTEND` the exclusive end (`start + duration`), `SUMMARY` the kind label
//! plus title. Lines are CRLF-joined per RFC 5545.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Feature, Item, PartRef, Phase};

pub fn calendar_ics(
    phases: &[Phase],
    features: &[Feature],
    items: &[Item],
    stamp: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//Planboard//EN".to_string(),
    ];
    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();

    for ph in phases {
        push_event(&mut lines, &dtstamp, ph.part_ref(), &ph.title, ph.start_date, ph.end_date());
    }
    for ft in features {
        push_event(&mut lines, &dtstamp, ft.part_ref(), &ft.title, ft.start_date, ft.end_date());
    }
    for it in items {
        push_event(&mut lines, &dtstamp, it.part_ref(), &it.title, it.start_date, it.end_date());
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n")
}

fn push_event(
    lines: &mut Vec<String>,
    dtstamp: &str,
    sid: PartRef,
    title: &str,
    start: NaiveDate,
    end: NaiveDate,
) {
    let summary = format!("{}: {}", sid.kind.label(), title.replace('\n', " "));
    lines.push("BEGIN:VEVENT".to_string());
    lines.push(format!("UID:{sid}@planboard"));
    lines.push(format!("DTSTAMP:{dtstamp}"));
    lines.push(format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")));
    lines.push(format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
    lines.push(format!("SUMMARY:{summary}"));
    lines.push("END:VEVENT".to_string());
}
