use chrono::DateTime;
use seatline_shared::{EventDetails, EventSummary, SeatCounts, SeatState};
use std::fmt::Write;

const SEATS_PER_LINE: usize = 10;

/// RFC 3339 dates become `YYYY-MM-DD HH:MM UTC`; anything else is shown as sent.
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(date) => date.naive_utc().format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn write_summary(out: &mut String, event: &EventSummary) {
    let _ = write!(
        out,
        "\n  {}  {}  ({}, {} seats)",
        event.id,
        event.title,
        format_date(&event.date),
        event.total_seats
    );
}

pub fn event_list(events: &[EventSummary]) -> String {
    let mut out = String::from("Events:");
    for event in events {
        write_summary(&mut out, event);
    }
    out
}

/// Admin view: every event with its seat tally, or the plain line when its details were unavailable.
pub fn event_overview(entries: &[(EventSummary, Option<SeatCounts>)]) -> String {
    let mut out = String::from("Overview:");
    for (event, counts) in entries {
        write_summary(&mut out, event);
        if let Some(counts) = counts {
            let _ = write!(
                out,
                "  free {}, on hold {}, booked {}",
                counts.free, counts.reserving, counts.booked
            );
        }
    }
    out
}

fn seat_mark(state: SeatState) -> char {
    match state {
        SeatState::Free => ' ',
        SeatState::Reserving => '~',
        SeatState::Booked => 'x',
        SeatState::Unknown => '?',
    }
}

/// Header plus the seat map, ten seats per line.
pub fn event_details(details: &EventDetails) -> String {
    let counts = details.counts();
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", details.title, details.id);
    let _ = writeln!(
        out,
        "Date: {}  Seats: {}  (free {}, on hold {}, booked {})",
        format_date(&details.date),
        details.total_seats,
        counts.free,
        counts.reserving,
        counts.booked
    );

    for row in details.seats.chunks(SEATS_PER_LINE) {
        out.push(' ');
        for seat in row {
            let _ = write!(out, " {:>4}{}", seat.seat_number, seat_mark(seat.status));
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "Legend: '{}' {}, '{}' {}, '{}' {}",
        seat_mark(SeatState::Reserving),
        SeatState::Reserving.label(),
        seat_mark(SeatState::Booked),
        SeatState::Booked.label(),
        ' ',
        SeatState::Free.label()
    );
    out
}
