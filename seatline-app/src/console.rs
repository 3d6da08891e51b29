use chrono::{DateTime, Utc};
use seatline_shared::{CreateEventRequest, EventDraft, SeatLayout};
use std::str::FromStr;

const USAGE_CREATE: &str = "create <id> <date, RFC 3339> <rows> <seats_per_row> <start_number> <title...>";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login(String),
    Logout,
    Events,
    View(String),
    Book(u32),
    Confirm,
    Create(CreateEventRequest),
    Overview,
    Status,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

impl Command {
    pub fn help() -> &'static str {
        "Commands:
  login <user_id>      sign in and resume a saved reservation
  logout               sign out
  events               list events
  view <event_id>      show an event's seat map
  book <seat_number>   reserve a seat of the event being viewed
  confirm              confirm the pending reservation
  create <id> <date> <rows> <seats_per_row> <start_number> <title...>
  overview             every event with its free / on hold / booked seats
  status               show the current reservation
  help                 this text
  quit                 exit"
    }
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::Invalid {
        field,
        value: value.to_string(),
    })
}

fn parse_create(args: &[&str]) -> Result<CreateEventRequest, CommandError> {
    let [id, date, rows, seats_per_row, start_number, title @ ..] = args else {
        return Err(CommandError::Usage(USAGE_CREATE));
    };
    if title.is_empty() {
        return Err(CommandError::Usage(USAGE_CREATE));
    }

    let date = DateTime::parse_from_rfc3339(date)
        .map_err(|_| CommandError::Invalid {
            field: "date",
            value: date.to_string(),
        })?
        .with_timezone(&Utc);
    let layout = SeatLayout {
        rows: parse_number("rows", rows)?,
        seats_per_row: parse_number("seats_per_row", seats_per_row)?,
        start_number: parse_number("start_number", start_number)?,
    };
    let total_seats = layout.capacity().ok_or_else(|| CommandError::Invalid {
        field: "layout",
        value: format!("{} rows of {} from seat {}", rows, seats_per_row, start_number),
    })?;

    Ok(CreateEventRequest {
        event: EventDraft {
            id: id.to_string(),
            title: title.join(" "),
            date,
            total_seats,
        },
        layout,
    })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = words.split_first() else {
            return Err(CommandError::Usage("help"));
        };

        match (name.to_ascii_lowercase().as_str(), args) {
            ("login", [user_id]) => Ok(Command::Login(user_id.to_string())),
            ("login", _) => Err(CommandError::Usage("login <user_id>")),
            ("logout", []) => Ok(Command::Logout),
            ("events", []) => Ok(Command::Events),
            ("view", [event_id]) => Ok(Command::View(event_id.to_string())),
            ("view", _) => Err(CommandError::Usage("view <event_id>")),
            ("book", [seat]) => Ok(Command::Book(parse_number("seat_number", seat)?)),
            ("book", _) => Err(CommandError::Usage("book <seat_number>")),
            ("confirm", []) => Ok(Command::Confirm),
            ("create", args) => parse_create(args).map(Command::Create),
            ("overview", []) => Ok(Command::Overview),
            ("status", []) => Ok(Command::Status),
            ("help", _) => Ok(Command::Help),
            ("quit", []) | ("exit", []) => Ok(Command::Quit),
            (other, _) => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
