use std::io::Write;

use crate::error::PlanError;
use crate::types::EventRecord;

/// Header line expected by calendar CSV importers.
pub const CSV_HEADER: &str = "Subject,Start Date,Start Time,End Date,End Time,Description,Location";

/// Choice value meaning "not an elective group"; it is left out of the
/// description.
const NO_CHOICE: &str = "-";

/// Render one event as a CSV row, newline included.
///
/// The start and end values already hold `date, time`, so they fill the date
/// and time columns between them.
pub fn csv_row(event: &EventRecord) -> String {
    let choice = if event.choice != NO_CHOICE {
        format!(" - {}", event.choice)
    } else {
        String::new()
    };

    format!(
        "{} - {}, {}, {}, {}{}, {}\n",
        event.kind, event.name, event.start, event.end, event.owner, choice, event.room
    )
}

/// Serialize events to calendar CSV text.
pub fn to_csv(events: &[EventRecord]) -> String {
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + events.len() * 96);
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for event in events {
        csv.push_str(&csv_row(event));
    }
    csv
}

/// Stream events as calendar CSV into a writer.
pub fn write_csv<W: Write>(events: &[EventRecord], mut writer: W) -> Result<(), PlanError> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for event in events {
        writer.write_all(csv_row(event).as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matematyka() -> EventRecord {
        EventRecord {
            owner: "Kowalski".into(),
            start: "12/03/2024, 08:00".into(),
            end: "12/03/2024, 09:30".into(),
            room: "101".into(),
            name: "Matematyka".into(),
            choice: "-".into(),
            kind: "inne".into(),
        }
    }

    #[test]
    fn single_event_csv() {
        assert_eq!(
            to_csv(&[matematyka()]),
            "Subject,Start Date,Start Time,End Date,End Time,Description,Location\n\
             inne - Matematyka, 12/03/2024, 08:00, 12/03/2024, 09:30, Kowalski, 101\n"
        );
    }

    #[test]
    fn choice_is_appended_to_owner() {
        let event = EventRecord {
            choice: "grupa 2".into(),
            ..matematyka()
        };
        assert_eq!(
            csv_row(&event),
            "inne - Matematyka, 12/03/2024, 08:00, 12/03/2024, 09:30, Kowalski - grupa 2, 101\n"
        );
    }

    #[test]
    fn placeholders_are_written_as_is() {
        let row = csv_row(&EventRecord::default());
        assert_eq!(row, "inne - n/z, n/z, n/z, n/z - n/z, n/z\n");
    }

    #[test]
    fn empty_plan_is_header_only() {
        assert_eq!(to_csv(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn output_is_stable() {
        let events = vec![matematyka(), EventRecord::default()];
        assert_eq!(to_csv(&events), to_csv(&events));
    }

    #[test]
    fn writer_matches_string() {
        let events = vec![matematyka(), EventRecord::default()];
        let mut buf = Vec::new();
        write_csv(&events, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), to_csv(&events));
    }
}
